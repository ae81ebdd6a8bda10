use crate::models::UserId;
use std::{env, path::PathBuf, time::Duration};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/habits.json";
const DEFAULT_CACHE_TTL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub cache_ttl: Duration,
    /// Identity used when a request carries no `x-user-id` header.
    pub default_user: Option<UserId>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            default_user: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(value) => value.parse::<u16>().unwrap_or_else(|_| {
                warn!("ignoring invalid PORT value {value:?}");
                defaults.port
            }),
            None => defaults.port,
        };

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);

        let cache_ttl = match lookup("APP_CACHE_TTL_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    warn!("ignoring invalid APP_CACHE_TTL_SECS value {value:?}");
                    defaults.cache_ttl
                }
            },
            None => defaults.cache_ttl,
        };

        let default_user = lookup("APP_DEFAULT_USER").and_then(|value| UserId::parse(&value).ok());

        Self {
            port,
            data_path,
            cache_ttl,
            default_user,
        }
    }
}
