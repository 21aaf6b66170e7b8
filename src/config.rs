//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Longest session a token may grant (one year)
const MAX_JWT_EXPIRES_IN_MINUTES: i64 = 365 * 24 * 60;

/// Longest a login code may stay valid (one day)
const MAX_OTP_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// HS256 signing secret for session tokens
    pub jwt_secret: String,

    /// Session token lifetime
    pub jwt_expires_in_minutes: i64,

    /// How long a login code stays valid
    pub otp_ttl_seconds: i64,

    /// Return the login code in the request-otp response (no SMS gateway)
    pub otp_expose_in_response: bool,

    /// How often expired login codes are purged
    pub otp_purge_interval_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_or(&lookup, "PORT", 5000)?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingEnv("JWT_SECRET"))?;

        let jwt_expires_in_minutes = parse_or(&lookup, "JWT_EXPIRES_IN_MINUTES", 7 * 24 * 60)?;
        if !(1..=MAX_JWT_EXPIRES_IN_MINUTES).contains(&jwt_expires_in_minutes) {
            return Err(ConfigError::InvalidValue("JWT_EXPIRES_IN_MINUTES"));
        }

        let otp_ttl_seconds = parse_or(&lookup, "OTP_TTL_SECONDS", 120)?;
        if !(1..=MAX_OTP_TTL_SECONDS).contains(&otp_ttl_seconds) {
            return Err(ConfigError::InvalidValue("OTP_TTL_SECONDS"));
        }

        let otp_expose_in_response = match lookup("OTP_EXPOSE_IN_RESPONSE") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue("OTP_EXPOSE_IN_RESPONSE"))?,
            None => environment != "production",
        };

        let otp_purge_interval_seconds = parse_or(&lookup, "OTP_PURGE_INTERVAL_SECONDS", 60)?;
        if otp_purge_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue("OTP_PURGE_INTERVAL_SECONDS"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            jwt_secret,
            jwt_expires_in_minutes,
            otp_ttl_seconds,
            otp_expose_in_response,
            otp_purge_interval_seconds,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("database_max_connections", &self.database_max_connections)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expires_in_minutes", &self.jwt_expires_in_minutes)
            .field("otp_ttl_seconds", &self.otp_ttl_seconds)
            .field("otp_expose_in_response", &self.otp_expose_in_response)
            .field("otp_purge_interval_seconds", &self.otp_purge_interval_seconds)
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/siisa"),
        ("JWT_SECRET", "s3cret"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.environment, "development");
        assert_eq!(config.jwt_expires_in_minutes, 10080);
        assert_eq!(config.otp_ttl_seconds, 120);
        assert!(config.otp_expose_in_response);
        assert_eq!(config.otp_purge_interval_seconds, 60);
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_required() {
        assert!(matches!(
            load(&[("JWT_SECRET", "x")]),
            Err(ConfigError::MissingEnv("DATABASE_URL"))
        ));
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "  ")]),
            Err(ConfigError::MissingEnv("JWT_SECRET"))
        ));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "eighty"));
        assert!(matches!(load(&vars), Err(ConfigError::InvalidValue("PORT"))));
    }

    #[test]
    fn test_production_hides_otp_by_default() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("ENVIRONMENT", "production"));
        let config = load(&vars).unwrap();

        assert!(config.is_production());
        assert!(!config.otp_expose_in_response);
    }

    #[test]
    fn test_explicit_otp_exposure() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("ENVIRONMENT", "production"));
        vars.push(("OTP_EXPOSE_IN_RESPONSE", "yes"));
        assert!(load(&vars).unwrap().otp_expose_in_response);

        let mut vars = REQUIRED.to_vec();
        vars.push(("OTP_EXPOSE_IN_RESPONSE", "maybe"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("OTP_TTL_SECONDS", "0"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidValue("OTP_TTL_SECONDS"))
        ));
    }

    #[test]
    fn test_lifetimes_are_bounded() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("JWT_EXPIRES_IN_MINUTES", "9223372036854775807"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidValue("JWT_EXPIRES_IN_MINUTES"))
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("OTP_TTL_SECONDS", "86401"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidValue("OTP_TTL_SECONDS"))
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("JWT_EXPIRES_IN_MINUTES", "525600"));
        vars.push(("OTP_TTL_SECONDS", "86400"));
        let config = load(&vars).unwrap();
        assert_eq!(config.jwt_expires_in_minutes, 525_600);
        assert_eq!(config.otp_ttl_seconds, 86_400);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", load(&REQUIRED).unwrap());
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("postgres://"));
    }
}
