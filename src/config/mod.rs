use std::time::Duration;

use crate::errors::{NewsError, NewsResult};

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FEED_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_DIGEST_PERIOD_SECS: u64 = 24 * 60 * 60;
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub mail_relay_url: String,
    pub mail_relay_token: String,
    pub mail_from: String,
    pub db_path: String,
    pub fetch_timeout: Duration,
    pub feed_cache_ttl: Duration,
    pub digest_period: Duration,
    pub mail_timeout: Duration,
    pub log_level: String,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> NewsResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let mail_relay_url = std::env::var("MAIL_RELAY_URL")
            .map_err(|_| NewsError::MissingEnvVar("MAIL_RELAY_URL".to_string()))?;

        let mail_relay_token = std::env::var("MAIL_RELAY_TOKEN")
            .map_err(|_| NewsError::MissingEnvVar("MAIL_RELAY_TOKEN".to_string()))?;

        let mail_from =
            std::env::var("MAIL_FROM").unwrap_or_else(|_| "newsfetch@localhost".to_string());

        // Default db_path is relative to executable directory
        let db_path = std::env::var("NEWSFETCH_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("newsfetch.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./newsfetch.db".to_string())
        });

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            mail_relay_url,
            mail_relay_token,
            mail_from,
            db_path,
            fetch_timeout: secs_var("FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?,
            feed_cache_ttl: secs_var("FEED_CACHE_TTL_SECS", DEFAULT_FEED_CACHE_TTL_SECS)?,
            digest_period: secs_var("DIGEST_PERIOD_SECS", DEFAULT_DIGEST_PERIOD_SECS)?,
            mail_timeout: secs_var("MAIL_TIMEOUT_SECS", DEFAULT_MAIL_TIMEOUT_SECS)?,
            log_level,
        })
    }
}

fn secs_var(name: &str, default: u64) -> NewsResult<Duration> {
    match std::env::var(name) {
        Ok(raw) => parse_secs(name, &raw),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

fn parse_secs(name: &str, raw: &str) -> NewsResult<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| NewsError::Config(format!("{} must be a number of seconds, got '{}'", name, raw)))?;

    if secs == 0 {
        return Err(NewsError::Config(format!("{} must be greater than zero", name)));
    }

    Ok(Duration::from_secs(secs))
}
