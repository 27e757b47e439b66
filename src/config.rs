//! Runtime configuration
//!
//! A single `Config` value is built at startup and passed to every component.
//! Nothing reads configuration from globals.

use crate::cache::{CacheStore, CACHE_FILE_NAME};
use crate::prices::fetcher::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, USER_AGENT};
use crate::prices::parser::DEFAULT_DELIMITER;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default display and source timezone
pub const DEFAULT_TIMEZONE: &str = "Europe/Helsinki";

/// Default cache TTL in seconds (5 minutes)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default upstream field code (Finland area price)
pub const DEFAULT_FIELD_CODE: &str = "fi";

/// Errors in user-supplied configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The timezone is not a known IANA identifier
    #[error("Invalid timezone: '{0}'. Use an IANA name such as Europe/Helsinki")]
    InvalidTimezone(String),

    /// The delimiter is not a single ASCII character
    #[error("Invalid delimiter: '{0}'. Use a single ASCII character")]
    InvalidDelimiter(char),

    /// A required value was empty
    #[error("Empty value for {0}")]
    EmptyValue(&'static str),
}

/// Everything the pipeline needs to run
#[derive(Debug, Clone)]
pub struct Config {
    /// Zone used for labels and human-readable times
    pub display_tz: Tz,
    /// Zone the upstream timestamps are written in
    pub source_tz: Tz,
    /// How long a cached payload stays fresh
    pub cache_ttl_secs: u64,
    /// Upstream API base URL
    pub base_url: String,
    /// Upstream price area field code
    pub field_code: String,
    /// Hard timeout for the upstream request
    pub timeout: Duration,
    /// User-Agent sent upstream
    pub user_agent: String,
    /// Location of the cache slot
    pub cache_path: PathBuf,
    /// Field delimiter of the upstream table
    pub delimiter: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_tz: chrono_tz::Europe::Helsinki,
            source_tz: chrono_tz::Europe::Helsinki,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
            field_code: DEFAULT_FIELD_CODE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
            cache_path: CacheStore::default_path()
                .unwrap_or_else(|| PathBuf::from("cache").join(CACHE_FILE_NAME)),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// Parses an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::InvalidTimezone(name.to_string()))
}

/// Converts a delimiter character to the single byte the decoder expects
pub fn parse_delimiter(c: char) -> Result<u8, ConfigError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(ConfigError::InvalidDelimiter(c))
    }
}
