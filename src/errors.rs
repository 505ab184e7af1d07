use rocket::http::Status;
use rocket::request::Request;
use rocket::response::status::Custom;
use rocket::response::{self, Responder};
use rocket::serde::json::{json, Json, Value};
use std::collections::HashMap;
use validator::Validate;

/// Field name to ordered list of human readable messages, as rendered in
/// the `{"errors": {...}}` envelope of a 422 reply.
pub type FieldErrors = HashMap<String, Vec<String>>;

#[derive(Debug)]
pub enum Error {
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Validation(FieldErrors),
    Internal,
}

impl Error {
    pub fn unauthorized<S: Into<String>>(message: S) -> Error {
        Error::Unauthorized(message.into())
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Error {
        Error::Forbidden(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Error {
        Error::NotFound(message.into())
    }

    /// A 422 naming a single field, e.g. a uniqueness violation.
    pub fn validation<S: Into<String>>(field: S, message: S) -> Error {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        Error::Validation(errors)
    }
}

fn message_envelope(message: &str) -> Value {
    json!({ "errors": { "message": message } })
}

fn field_envelope(errors: &FieldErrors) -> Value {
    json!({ "errors": errors })
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let (status, body) = match self {
            Error::Unauthorized(message) => (Status::Unauthorized, message_envelope(&message)),
            Error::Forbidden(message) => (Status::Forbidden, message_envelope(&message)),
            Error::NotFound(message) => (Status::NotFound, message_envelope(&message)),
            Error::Validation(errors) => (Status::UnprocessableEntity, field_envelope(&errors)),
            Error::Internal => (Status::InternalServerError, message_envelope("Internal server error")),
        };
        Custom(status, Json(body)).respond_to(req)
    }
}

/// Store failures surface as 404 for missing rows, 422 for constraint
/// violations and 500 for anything else. Nothing is silently swallowed.
impl From<diesel::result::Error> for Error {
    fn from(error: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
        match error {
            DieselError::NotFound => Error::not_found("Not found"),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let field = info
                    .column_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "database".to_string());
                Error::validation(field, "has already been taken".to_string())
            }
            error => {
                log::error!("database error: {}", error);
                Error::Internal
            }
        }
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(error: bcrypt::BcryptError) -> Self {
        log::error!("bcrypt error: {}", error);
        Error::Internal
    }
}

/// Collects every failing field of a request body before the handler runs,
/// so one reply can name all of them at once.
#[derive(Default)]
pub struct FieldValidator {
    errors: FieldErrors,
}

impl FieldValidator {
    pub fn validate<T: Validate>(model: &T) -> FieldValidator {
        let mut validator = FieldValidator::default();
        if let Err(errors) = model.validate() {
            for (field, field_errors) in errors.field_errors() {
                let messages = validator.errors.entry(field.to_string()).or_default();
                for error in field_errors {
                    messages.push(
                        error
                            .message
                            .as_ref()
                            .map(|message| message.to_string())
                            .unwrap_or_else(|| error.code.to_string()),
                    );
                }
            }
        }
        validator
    }

    /// Pulls a required field out of the payload, recording a blank-field
    /// error when it is missing.
    pub fn extract<T>(&mut self, field: &str, value: Option<T>) -> T
    where
        T: Default,
    {
        value.unwrap_or_else(|| {
            self.errors
                .entry(field.to_string())
                .or_default()
                .push("can't be blank".to_string());
            T::default()
        })
    }

    pub fn check(self) -> Result<(), Error> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self.errors))
        }
    }
}
