//! Shared application state handed to every route

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::TokenService;
use crate::config::Config;

/// Login code behaviour
#[derive(Debug, Clone, Copy)]
pub struct OtpSettings {
    pub ttl: chrono::Duration,
    /// Echo the code back to the caller (no SMS gateway)
    pub expose_in_response: bool,
}

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenService,
    pub otp: OtpSettings,
}

impl AppState {
    pub fn from_config(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            tokens: TokenService::new(&config.jwt_secret, config.jwt_expires_in_minutes),
            otp: OtpSettings {
                ttl: chrono::Duration::seconds(config.otp_ttl_seconds),
                expose_in_response: config.otp_expose_in_response,
            },
        }
    }
}
