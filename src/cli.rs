//! Command-line interface parsing for the spot price CLI
//!
//! Every configuration value can be given as a flag or through a
//! `SPOTPRICE_*` environment variable; defaults match the Elering Finland feed.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    parse_delimiter, parse_timezone, Config, ConfigError, DEFAULT_CACHE_TTL_SECS,
    DEFAULT_FIELD_CODE, DEFAULT_TIMEZONE,
};
use crate::prices::fetcher::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, USER_AGENT};

/// Spot price CLI - Elering electricity prices in c/kWh
#[derive(Parser, Debug)]
#[command(name = "spotprice")]
#[command(about = "Fetch, cache and show Elering electricity spot prices in c/kWh")]
#[command(version)]
pub struct Cli {
    /// Timezone for labels and "last updated" times
    #[arg(long, value_name = "TZ", env = "SPOTPRICE_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,

    /// Timezone the upstream timestamps are written in
    #[arg(
        long,
        value_name = "TZ",
        env = "SPOTPRICE_SOURCE_TIMEZONE",
        default_value = DEFAULT_TIMEZONE
    )]
    pub source_timezone: String,

    /// Seconds a cached table stays fresh
    #[arg(
        long,
        value_name = "SECONDS",
        env = "SPOTPRICE_CACHE_TTL",
        default_value_t = DEFAULT_CACHE_TTL_SECS
    )]
    pub cache_ttl: u64,

    /// Upstream API base URL
    #[arg(long, value_name = "URL", env = "SPOTPRICE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Upstream price area field code
    #[arg(long, value_name = "CODE", env = "SPOTPRICE_FIELD", default_value = DEFAULT_FIELD_CODE)]
    pub field: String,

    /// Request timeout in seconds
    #[arg(
        long,
        value_name = "SECONDS",
        env = "SPOTPRICE_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub timeout: u64,

    /// User-Agent sent upstream
    #[arg(long, value_name = "AGENT", env = "SPOTPRICE_USER_AGENT", default_value = USER_AGENT)]
    pub user_agent: String,

    /// Cache file location (defaults to the XDG cache directory)
    #[arg(long, value_name = "PATH", env = "SPOTPRICE_CACHE_FILE")]
    pub cache_file: Option<PathBuf>,

    /// Field delimiter of the upstream table
    #[arg(long, value_name = "CHAR", env = "SPOTPRICE_DELIMITER", default_value_t = ';')]
    pub delimiter: char,

    /// Print the snapshot as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl Config {
    /// Creates a Config from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Config)` with every value validated
    /// * `Err(ConfigError)` for an unknown timezone, a non-ASCII delimiter or an empty value
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let base_url = cli.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::EmptyValue("base URL"));
        }
        let field_code = cli.field.trim();
        if field_code.is_empty() {
            return Err(ConfigError::EmptyValue("field code"));
        }
        if cli.cache_file.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(ConfigError::EmptyValue("cache file"));
        }

        let defaults = Config::default();
        Ok(Config {
            display_tz: parse_timezone(&cli.timezone)?,
            source_tz: parse_timezone(&cli.source_timezone)?,
            cache_ttl_secs: cli.cache_ttl,
            base_url: base_url.to_string(),
            field_code: field_code.to_string(),
            timeout: Duration::from_secs(cli.timeout),
            user_agent: cli.user_agent.clone(),
            cache_path: cli.cache_file.clone().unwrap_or(defaults.cache_path),
            delimiter: parse_delimiter(cli.delimiter)?,
        })
    }
}
