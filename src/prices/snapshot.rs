//! Snapshot assembly for the presentation layer
//!
//! A snapshot bundles the normalized records with freshness metadata. It is
//! built fresh for every run and never persisted.

use super::{FetchError, PriceRecord, RawRow};
use crate::cache::CacheEntry;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Message shown when the upstream table could not be fetched
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch CSV from the source.";

/// Layout of the human-readable times, e.g. `15:05 pm 15/11/2025`
pub const DISPLAY_TIME_FORMAT: &str = "%H:%M %P %d/%m/%Y";

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Normalized records in source order
    pub records: Vec<PriceRecord>,
    /// Header row of the source table, if there was one
    pub columns: Option<RawRow>,
    /// When the cached payload was stored
    pub last_updated: Option<DateTime<Utc>>,
    /// When the cached payload goes stale
    pub next_refresh: DateTime<Utc>,
    /// Set when the fetch failed and there is nothing to show
    pub source_error: Option<String>,
}

/// Assembles a snapshot
///
/// `last_updated` mirrors the cache entry. `next_refresh` is the entry's
/// stored time (or `now` without an entry) plus the TTL. `source_error` is set
/// only for a failed fetch that left no records.
pub fn build_snapshot(
    cache_entry: Option<&CacheEntry>,
    records: Vec<PriceRecord>,
    fetch_error: Option<&FetchError>,
    ttl_seconds: u64,
    now: DateTime<Utc>,
) -> Snapshot {
    let last_updated = cache_entry.map(|entry| entry.stored_at);
    let base = last_updated.unwrap_or(now);
    let next_refresh = i64::try_from(ttl_seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| base.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let source_error = match fetch_error {
        Some(_) if records.is_empty() => Some(FETCH_FAILED_MESSAGE.to_string()),
        _ => None,
    };

    Snapshot {
        records,
        columns: None,
        last_updated,
        next_refresh,
        source_error,
    }
}

impl Snapshot {
    /// Attaches the source header row
    pub fn with_columns(mut self, columns: Option<RawRow>) -> Self {
        self.columns = columns;
        self
    }

    /// Number of records
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    /// True when there are no records to show
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Timestamp labels, index-aligned with [`prices`](Self::prices)
    pub fn labels(&self) -> Vec<String> {
        self.records.iter().map(PriceRecord::timestamp_label).collect()
    }

    /// Prices in c/kWh, index-aligned with [`labels`](Self::labels)
    pub fn prices(&self) -> Vec<Option<f64>> {
        self.records.iter().map(PriceRecord::price_cents_per_kwh).collect()
    }

    /// Flattens the snapshot into the shape handed to presentation, with
    /// times rendered in `display_tz`
    pub fn export(&self, display_tz: Tz) -> ExportedSnapshot {
        ExportedSnapshot {
            timezone: display_tz.name().to_string(),
            columns: self.columns.clone().unwrap_or_default(),
            labels: self.labels(),
            prices: self.prices(),
            row_count: self.row_count(),
            last_updated: self.last_updated.map(|t| format_display_time(t, display_tz)),
            next_refresh: format_display_time(self.next_refresh, display_tz),
            next_refresh_unix: self.next_refresh.timestamp(),
            error: self.source_error.clone(),
        }
    }
}

/// Presentation-ready view of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedSnapshot {
    /// IANA name of the display timezone
    pub timezone: String,
    /// Source column headings
    pub columns: Vec<String>,
    /// Timestamp labels
    pub labels: Vec<String>,
    /// Prices in c/kWh; `null` where the source had no number
    pub prices: Vec<Option<f64>>,
    /// Number of rows
    pub row_count: usize,
    /// When the data was last fetched
    pub last_updated: Option<String>,
    /// When the data will next be refreshed
    pub next_refresh: String,
    /// `next_refresh` as Unix seconds
    pub next_refresh_unix: i64,
    /// Fetch error, if any
    pub error: Option<String>,
}

/// Formats an instant as `HH:MM am DD/MM/YYYY` in `tz`
pub fn format_display_time(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(DISPLAY_TIME_FORMAT).to_string()
}
