use crate::config::AppConfig;
use crate::database::{users, Db};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use serde::{Deserialize, Serialize};

const TOKEN_PREFIX: &str = "Token ";

/// Claims carried by the bearer token. Resolved by the `Auth` request
/// guard; routes with optional authentication take `Option<Auth>`, where
/// any verification failure degrades to `None` instead of a 401.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    /// Expiry, as seconds since the epoch.
    pub exp: i64,
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl Auth {
    pub fn token(&self, secret: &[u8]) -> String {
        jsonwebtoken::encode(&Header::default(), self, &EncodingKey::from_secret(secret))
            .expect("jwt encoding")
    }
}

/// Signature, expiry and shape failures all collapse to `None`; callers
/// never learn which check rejected the token.
pub fn decode_token(token: &str, secret: &[u8]) -> Option<Auth> {
    jsonwebtoken::decode(token, &DecodingKey::from_secret(secret), &Validation::default())
        .map_err(|err| {
            log::debug!("token decode failed: {}", err);
        })
        .map(|data| data.claims)
        .ok()
}

fn extract_token(header: &str) -> Option<&str> {
    header.strip_prefix(TOKEN_PREFIX)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Auth {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Auth, Self::Error> {
        let config = match request.guard::<&State<AppConfig>>().await {
            Outcome::Success(config) => config,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        let auth = request
            .headers()
            .get_one("Authorization")
            .and_then(extract_token)
            .and_then(|token| decode_token(token, &config.secret));
        let auth = match auth {
            Some(auth) => auth,
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        // A token can outlive its account; a claim naming a user that no
        // longer exists does not authenticate.
        let db = match request.guard::<Db>().await {
            Outcome::Success(db) => db,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };
        let id = auth.id;
        match db.run(move |conn| users::find(conn, id)).await {
            Ok(Some(_)) => Outcome::Success(auth),
            Ok(None) => Outcome::Error((Status::Unauthorized, ())),
            Err(err) => {
                log::error!("auth lookup failed: {}", err);
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}
