use std::env;

/// Format applied to `created_at`/`updated_at` in article and comment
/// responses. Timestamps are stored in UTC.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Token lifetime when `JWT_EXPIRES_IN` is not set: one day, in seconds.
pub const DEFAULT_TOKEN_EXPIRY: i64 = 86_400;

pub const DEFAULT_API_PREFIX: &str = "/api";

pub struct AppConfig {
    pub secret: Vec<u8>,
    pub token_expiry: i64,
    pub api_prefix: String,
}

impl AppConfig {
    pub fn from_env() -> AppConfig {
        AppConfig {
            secret: env::var("JWT_SECRET").map(String::into_bytes).unwrap_or_else(|_| {
                if cfg!(debug_assertions) {
                    b"secret".to_vec()
                } else {
                    panic!("JWT_SECRET must be set in release builds")
                }
            }),
            token_expiry: env::var("JWT_EXPIRES_IN")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_TOKEN_EXPIRY),
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| DEFAULT_API_PREFIX.to_string()),
        }
    }
}
