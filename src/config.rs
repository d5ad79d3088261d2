//! Process configuration, read from the environment (and an optional `.env`).

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5003;
pub const DEFAULT_DB_PATH: &str = "/var/lib/docverify/ledger.db";
pub const DEFAULT_BLOB_DIR: &str = "/var/lib/docverify/blobs";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    /// Whether error responses may carry diagnostic details.
    pub fn exposes_details(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub blob_dir: PathBuf,
    pub environment: Environment,
    pub log_format: LogFormat,
}

impl Config {
    /// Variables:
    /// - `HOST` (default `0.0.0.0`), `PORT` (default 5003)
    /// - `DOCVERIFY_DB_PATH` (default `/var/lib/docverify/ledger.db`)
    /// - `DOCVERIFY_BLOB_DIR` (default `/var/lib/docverify/blobs`)
    /// - `APP_ENV`: `production` (default) or `development`
    /// - `LOG_FORMAT`: `text` (default) or `json`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = parse_or(&lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let environment = match lookup("APP_ENV") {
            None => Environment::Production,
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: "APP_ENV",
                value,
            })?,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            db_path: lookup("DOCVERIFY_DB_PATH")
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
                .into(),
            blob_dir: lookup("DOCVERIFY_BLOB_DIR")
                .unwrap_or_else(|| DEFAULT_BLOB_DIR.to_string())
                .into(),
            environment,
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
