use crate::auth::Auth;
use crate::config::AppConfig;
use crate::database::{users, Db};
use crate::errors::{Error, FieldValidator};
use crate::models::user::User;
use bcrypt::{hash, verify, DEFAULT_COST};
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::{json, Json, Value};
use rocket::State;
use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize)]
pub struct NewUser {
    user: NewUserData,
}

#[derive(Deserialize, Validate)]
struct NewUserData {
    #[validate(length(min = 3, max = 20, message = "must be between 3 and 20 characters"))]
    username: Option<String>,
    #[validate(email(message = "is invalid"))]
    email: Option<String>,
    #[validate(length(min = 6, message = "must be at least 6 characters long"))]
    password: Option<String>,
}

#[post("/users/register", data = "<new_user>")]
pub async fn register(
    new_user: Json<NewUser>,
    db: Db,
    config: &State<AppConfig>,
) -> Result<Custom<Value>, Error> {
    let new_user = new_user.into_inner().user;

    let mut extractor = FieldValidator::validate(&new_user);
    let username = extractor.extract("username", new_user.username);
    let email = extractor.extract("email", new_user.email);
    let password = extractor.extract("password", new_user.password);
    extractor.check()?;

    let user = db
        .run(move |conn| -> Result<User, Error> {
            // Email first, then username; the first taken field wins.
            if users::find_by_email(conn, &email)?.is_some() {
                return Err(Error::validation("email", "has already been taken"));
            }
            if users::find_by_username(conn, &username)?.is_some() {
                return Err(Error::validation("username", "has already been taken"));
            }
            let hash = hash(&password, DEFAULT_COST)?;
            Ok(users::create(
                conn,
                &users::NewUser {
                    username: &username,
                    email: &email,
                    hash: &hash,
                },
            )?)
        })
        .await?;

    Ok(Custom(Status::Created, json!({ "user": user.to_auth(config) })))
}

#[derive(Deserialize)]
pub struct LoginUser {
    user: LoginUserData,
}

#[derive(Deserialize, Validate)]
struct LoginUserData {
    #[validate(email(message = "is invalid"))]
    email: Option<String>,
    password: Option<String>,
}

#[post("/users/login", data = "<user>")]
pub async fn login(
    user: Json<LoginUser>,
    db: Db,
    config: &State<AppConfig>,
) -> Result<Value, Error> {
    let user = user.into_inner().user;

    let mut extractor = FieldValidator::validate(&user);
    let email = extractor.extract("email", user.email);
    let password = extractor.extract("password", user.password);
    extractor.check()?;

    // One message for both unknown email and wrong password; the reply
    // never says which side failed.
    let user = db
        .run(move |conn| -> Result<User, Error> {
            let user = users::find_by_email(conn, &email)?
                .ok_or_else(|| Error::unauthorized("Email or password is invalid"))?;
            if !verify(&password, &user.hash)? {
                return Err(Error::unauthorized("Email or password is invalid"));
            }
            Ok(user)
        })
        .await?;

    Ok(json!({ "user": user.to_auth(config) }))
}

#[get("/user")]
pub async fn read_user(auth: Auth, db: Db, config: &State<AppConfig>) -> Result<Value, Error> {
    let id = auth.id;
    let user = db
        .run(move |conn| users::find(conn, id))
        .await?
        .ok_or_else(|| Error::unauthorized("User not found"))?;
    Ok(json!({ "user": user.to_auth(config) }))
}

#[derive(Deserialize)]
pub struct UpdateUser {
    user: UpdateUserData,
}

#[derive(Deserialize, Validate, Default)]
struct UpdateUserData {
    #[validate(length(min = 3, max = 20, message = "must be between 3 and 20 characters"))]
    username: Option<String>,
    #[validate(email(message = "is invalid"))]
    email: Option<String>,
    #[validate(length(min = 6, message = "must be at least 6 characters long"))]
    password: Option<String>,
    // Presence, not truthiness: an explicit empty string clears the field.
    bio: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    image: Option<String>,
}

#[put("/user", data = "<user>")]
pub async fn update_user(
    user: Json<UpdateUser>,
    auth: Auth,
    db: Db,
    config: &State<AppConfig>,
) -> Result<Value, Error> {
    let data = user.into_inner().user;
    FieldValidator::validate(&data).check()?;
    let id = auth.id;

    let user = db
        .run(move |conn| -> Result<User, Error> {
            let current = users::find(conn, id)?
                .ok_or_else(|| Error::unauthorized("User not found"))?;

            // Uniqueness is only rechecked when the value actually changes.
            if let Some(email) = &data.email {
                if *email != current.email && users::find_by_email(conn, email)?.is_some() {
                    return Err(Error::validation("email", "has already been taken"));
                }
            }
            if let Some(username) = &data.username {
                if *username != current.username
                    && users::find_by_username(conn, username)?.is_some()
                {
                    return Err(Error::validation("username", "has already been taken"));
                }
            }

            let hash = match &data.password {
                Some(password) => Some(hash(password, DEFAULT_COST)?),
                None => None,
            };
            let changes = users::UserChanges {
                username: data.username,
                email: data.email,
                hash,
                bio: data.bio,
                image: data.image,
            };
            Ok(users::update(conn, id, &changes)?)
        })
        .await?;

    Ok(json!({ "user": user.to_auth(config) }))
}
