use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use rand::{distributions::Alphanumeric, Rng};
use thiserror::Error;

use crate::{
    constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    pagination::PageSettings,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_address: SocketAddr,
    pub jwt_secret: String,
    pub session_hours: i64,
    pub media_root: String,
    pub media_url: String,
    pub page_size: i64,
    pub max_page_size: i64,
}

impl Config {
    /// Reads the process environment, after loading `.env` when present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let config = Self {
            database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", "10")?,
            bind_address: try_load("BIND_ADDRESS", "0.0.0.0:8000")?,
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| {
                log::warn!("JWT_SECRET not set, sessions will not survive a restart");
                random_secret()
            }),
            session_hours: try_load("SESSION_HOURS", "24")?,
            media_root: try_load("MEDIA_ROOT", "media")?,
            media_url: try_load("MEDIA_URL", "/media/")?,
            page_size: try_load("PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())?,
            max_page_size: try_load("MAX_PAGE_SIZE", &MAX_PAGE_SIZE.to_string())?,
        };

        if config.page_size < 1 {
            return Err(ConfigError::Invalid {
                key: "PAGE_SIZE",
                reason: "must be positive".to_string(),
            });
        }
        if config.max_page_size < config.page_size {
            return Err(ConfigError::Invalid {
                key: "MAX_PAGE_SIZE",
                reason: "must not be smaller than PAGE_SIZE".to_string(),
            });
        }

        Ok(config)
    }

    pub fn page_settings(&self) -> PageSettings {
        PageSettings {
            default_limit: self.page_size,
            max_limit: self.max_page_size,
        }
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_hours)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let port: SocketAddr = try_load("FOODGRAM_TEST_UNSET_ADDRESS", "0.0.0.0:8000").unwrap();
        assert_eq!(port.port(), 8000);

        let hours: i64 = try_load("FOODGRAM_TEST_UNSET_HOURS", "24").unwrap();
        assert_eq!(hours, 24);
    }

    #[test]
    fn bad_value_names_the_key() {
        let result: Result<u32, _> = try_load("FOODGRAM_TEST_UNSET_NUMBER", "many");
        match result {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "FOODGRAM_TEST_UNSET_NUMBER"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn random_secrets_differ() {
        let secret = random_secret();
        assert_eq!(secret.len(), 64);
        assert_ne!(secret, random_secret());
    }
}
