//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use lead_store::stats::DEFAULT_WINDOW;
use lead_store::{BatchDuplicatePolicy, ImportColumns, ImportOptions};

/// Default cap on uploaded import files.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Lead API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Number of recent leads listed and used for statistics.
    pub stats_window: i64,
    /// CSV import settings.
    pub import: ImportOptions,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `LEADS_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:leads.db?mode=rwc` |
    /// | `LEADS_STATS_WINDOW` | Recent leads used for KPIs | `50` |
    /// | `LEADS_IMPORT_DELIMITER` | CSV field separator | `,` |
    /// | `LEADS_IMPORT_NAME_COLUMN` | Header holding the name | `name` |
    /// | `LEADS_IMPORT_EMAIL_COLUMN` | Header holding the email | `email` |
    /// | `LEADS_IMPORT_PHONE_COLUMN` | Header holding the phone | `phone` |
    /// | `LEADS_BATCH_DUPLICATES` | `keep_first`, `reject_all` or `insert` | `keep_first` |
    /// | `LEADS_MAX_UPLOAD_BYTES` | Request body limit | `10485760` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("LEADS_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            lookup("SQLITE_PATH").unwrap_or_else(|| "sqlite:leads.db?mode=rwc".to_string());

        let stats_window = match lookup("LEADS_STATS_WINDOW") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|w| *w > 0)
                .ok_or(ConfigError::InvalidWindow(raw))?,
            None => DEFAULT_WINDOW,
        };

        let delimiter = match lookup("LEADS_IMPORT_DELIMITER") {
            Some(raw) => parse_delimiter(&raw).ok_or(ConfigError::InvalidDelimiter(raw))?,
            None => b',',
        };

        let defaults = ImportColumns::default();
        let columns = ImportColumns {
            name: lookup("LEADS_IMPORT_NAME_COLUMN").unwrap_or(defaults.name),
            email: lookup("LEADS_IMPORT_EMAIL_COLUMN").unwrap_or(defaults.email),
            phone: lookup("LEADS_IMPORT_PHONE_COLUMN").unwrap_or(defaults.phone),
        };

        let policy = match lookup("LEADS_BATCH_DUPLICATES") {
            Some(raw) => raw
                .parse::<BatchDuplicatePolicy>()
                .map_err(ConfigError::InvalidPolicy)?,
            None => BatchDuplicatePolicy::default(),
        };

        let max_upload_bytes = match lookup("LEADS_MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidUploadLimit(raw))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            addr,
            database_url,
            stats_window,
            import: ImportOptions {
                columns,
                delimiter,
                policy,
            },
            max_upload_bytes,
        })
    }
}

/// Accepts a single ASCII character, or `tab`/`\t`.
fn parse_delimiter(raw: &str) -> Option<u8> {
    match raw {
        "tab" | "\\t" | "\t" => Some(b'\t'),
        _ => {
            let bytes = raw.as_bytes();
            (bytes.len() == 1 && bytes[0].is_ascii()).then(|| bytes[0])
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid LEADS_ADDR format")]
    InvalidAddr,

    #[error("LEADS_STATS_WINDOW must be a positive integer, got {0:?}")]
    InvalidWindow(String),

    #[error("LEADS_IMPORT_DELIMITER must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(String),

    #[error("Invalid LEADS_BATCH_DUPLICATES: {0}")]
    InvalidPolicy(String),

    #[error("LEADS_MAX_UPLOAD_BYTES must be a byte count, got {0:?}")]
    InvalidUploadLimit(String),
}
