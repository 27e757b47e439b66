//! Core price acquisition pipeline
//!
//! This module contains the data types and components used to turn the
//! upstream semicolon-delimited price table into display-ready records:
//! fetching with a cache, decoding the table, normalizing rows and exporting
//! a snapshot.

pub mod fetcher;
pub mod normalizer;
pub mod parser;
pub mod snapshot;

pub use fetcher::{price_csv_url, FetchError, FetchResult, Fetched, PayloadSource, PriceFetcher};
pub use normalizer::Normalizer;
pub use parser::{parse, split_header};
pub use snapshot::{build_snapshot, ExportedSnapshot, Snapshot};

use chrono::DateTime;
use chrono_tz::Tz;

/// One decoded line of the upstream table
pub type RawRow = Vec<String>;

/// Display format of a normalized timestamp label
pub const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Outcome of decoding a single field
///
/// Keeps "parsed", "fell back to the raw text" and "missing" apart instead of
/// collapsing them into an `Option`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    /// The field decoded into a typed value
    Parsed(T),
    /// The field was present but could not be decoded
    Raw(String),
    /// The field was empty
    Absent,
}

impl<T> FieldValue<T> {
    /// Returns the decoded value, if any
    pub fn parsed(&self) -> Option<&T> {
        match self {
            FieldValue::Parsed(value) => Some(value),
            FieldValue::Raw(_) | FieldValue::Absent => None,
        }
    }

    /// True if the field decoded successfully
    pub fn is_parsed(&self) -> bool {
        matches!(self, FieldValue::Parsed(_))
    }
}

/// A single normalized price row
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    /// Start of the price interval in the display timezone
    pub timestamp: FieldValue<DateTime<Tz>>,
    /// Price in euro cents per kilowatt-hour
    pub price: FieldValue<f64>,
}

impl PriceRecord {
    /// Label for the timestamp: `YYYY-MM-DD HH:MM` when parsed, otherwise the
    /// raw source text unchanged
    pub fn timestamp_label(&self) -> String {
        match &self.timestamp {
            FieldValue::Parsed(dt) => dt.format(LABEL_FORMAT).to_string(),
            FieldValue::Raw(raw) => raw.clone(),
            FieldValue::Absent => String::new(),
        }
    }

    /// Price in c/kWh, or `None` when the source value was empty or not a number
    pub fn price_cents_per_kwh(&self) -> Option<f64> {
        self.price.parsed().copied()
    }
}
