use crate::auth::Auth;
use crate::config::AppConfig;
use chrono::{Duration, NaiveDateTime, Utc};
use serde::Serialize;

/// A `users` row. Deliberately not `Serialize`: the password hash never
/// leaves the database layer, responses go through [`UserAuth`] and
/// [`Profile`].
#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub hash: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct UserAuth {
    pub email: String,
    pub token: String,
    pub username: String,
    pub bio: String,
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub username: String,
    pub bio: String,
    pub image: String,
    pub following: bool,
}

impl User {
    /// The caller's own representation, with a freshly issued token.
    pub fn to_auth(&self, config: &AppConfig) -> UserAuth {
        let exp = Utc::now() + Duration::seconds(config.token_expiry);
        let token = Auth {
            exp: exp.timestamp(),
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
        .token(&config.secret);

        UserAuth {
            email: self.email.clone(),
            token,
            username: self.username.clone(),
            bio: self.bio.clone().unwrap_or_default(),
            image: self.image.clone().unwrap_or_default(),
        }
    }

    pub fn to_profile(&self, following: bool) -> Profile {
        Profile {
            username: self.username.clone(),
            bio: self.bio.clone().unwrap_or_default(),
            image: self.image.clone().unwrap_or_default(),
            following,
        }
    }
}
