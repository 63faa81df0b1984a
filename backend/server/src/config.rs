use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_REJECT_URL: &str = "https://tara-user-interface.vercel.app/";

/// Assets shipped with the crate, so `cargo run` works from any directory.
pub const DEFAULT_PUBLIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/public");

#[derive(Error, Debug)]
#[error("Invalid {key} value: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store_url: String,
    pub store_prefix: String,
    pub public_dir: PathBuf,
    pub reject_url: String,
    pub body_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("PORT", "3000")?,
            store_url: try_load("STORE_URL", "redis://127.0.0.1:6379")?,
            store_prefix: try_load("STORE_PREFIX", "attendance")?,
            public_dir: try_load("PUBLIC_DIR", DEFAULT_PUBLIC_DIR)?,
            reject_url: try_load("REJECT_REDIRECT_URL", DEFAULT_REJECT_URL)?,
            body_limit: try_load("BODY_LIMIT_BYTES", "10485760")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            store_url: crate::database::MEMORY_URL.to_string(),
            store_prefix: "attendance".to_string(),
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            reject_url: DEFAULT_REJECT_URL.to_string(),
            body_limit: 10 * 1024 * 1024,
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    parse(
        key,
        var(key).unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }),
    )
}

fn parse<T: FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError {
        key,
        reason: e.to_string(),
    })
}
