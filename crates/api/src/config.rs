use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Default upload size limit: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Runtime settings for the HTTP service.
///
/// Defaults suit local development; production overrides them through the
/// environment (or a `.env` file picked up by `dotenvy`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long background tasks get to drain after the server stops.
    pub shutdown_timeout_secs: u64,
    /// Directory attachments are written to and served from.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Read every setting from the environment.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `HOST`                  | `0.0.0.0`                |
    /// | `PORT`                  | `3000`                   |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                     |
    /// | `UPLOAD_DIR`            | `storage/uploads`        |
    /// | `MAX_UPLOAD_BYTES`      | `10485760`               |
    ///
    /// # Panics
    ///
    /// Panics on unparseable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_or("PORT", 3000u16),
            cors_origins: split_origins(&env_or::<String, _>(
                "CORS_ORIGINS",
                "http://localhost:5173",
            )),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30u64),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30u64),
            upload_dir: env_or("UPLOAD_DIR", "storage/uploads"),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            jwt: JwtConfig::from_env(),
        }
    }
}

/// `key` parsed as `T`, or `default` when unset.
fn env_or<T, D>(key: &str, default: D) -> T
where
    T: FromStr,
    T::Err: Display,
    D: Into<T>,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key}={raw:?} is not valid: {e}")),
        Err(_) => default.into(),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
