use std::env;

use thiserror::Error;

use crate::auth::MIN_SECRET_BYTES;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub security: SecurityConfig,
    pub quota: QuotaConfig,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct QuotaConfig {
    pub free_note_limit: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("NOTES_JWT_SECRET is required")]
    MissingSecret,
    #[error("NOTES_JWT_SECRET must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

impl AppConfig {
    /// Load configuration from the process environment. Fails fast on a
    /// missing or weak signing secret rather than starting with one.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("NOTES_JWT_SECRET").ok_or(ConfigError::MissingSecret)?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::WeakSecret);
        }

        let token_ttl_secs = parse_or(&lookup, "NOTES_TOKEN_TTL_SECS", 24 * 60 * 60)?;
        let free_note_limit = parse_or(&lookup, "NOTES_FREE_NOTE_LIMIT", 3)?;
        let port = lookup("NOTES_PORT")
            .or_else(|| lookup("PORT"))
            .map(|v| {
                v.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                    var: "NOTES_PORT".to_string(),
                    value: v,
                })
            })
            .transpose()?
            .unwrap_or(3000);

        Ok(Self {
            port,
            database_url: lookup("DATABASE_URL"),
            security: SecurityConfig {
                jwt_secret,
                token_ttl_secs,
            },
            quota: QuotaConfig { free_note_limit },
        })
    }
}

fn parse_or(
    lookup: impl Fn(&str) -> Option<String>,
    var: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    match lookup(var) {
        Some(v) => v.parse::<i64>().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: v,
        }),
        None => Ok(default),
    }
}
