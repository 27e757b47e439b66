//! Row normalization into typed price records
//!
//! Each usable row carries a local timestamp at index 1 (`DD.MM.YYYY HH:MM`)
//! and a price in EUR/MWh with a decimal comma at index 2. Bad fields never
//! fail the batch: timestamps fall back to their raw text and prices that are
//! not numbers become `Raw` or `Absent`.

use super::{FieldValue, PriceRecord, RawRow};
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Timestamp layout used by the upstream table
pub const SOURCE_TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";

/// EUR/MWh divided by this gives c/kWh (÷1000 for kWh, ×100 for cents)
pub const EUR_MWH_PER_CENT_KWH: f64 = 10.0;

/// Minimum number of fields for a row to be normalized
pub const MIN_FIELDS: usize = 3;

const TIMESTAMP_FIELD: usize = 1;
const PRICE_FIELD: usize = 2;

/// Converts raw rows into price records
///
/// Both zones are fixed at construction; nothing here reads the ambient
/// local timezone.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    source_tz: Tz,
    display_tz: Tz,
}

impl Normalizer {
    /// Creates a normalizer reading timestamps in `source_tz` and labelling
    /// them in `display_tz`
    pub fn new(source_tz: Tz, display_tz: Tz) -> Self {
        Self {
            source_tz,
            display_tz,
        }
    }

    /// Normalizes every row with at least three fields, preserving order
    pub fn normalize(&self, rows: &[RawRow]) -> Vec<PriceRecord> {
        let records: Vec<PriceRecord> = rows
            .iter()
            .filter_map(|row| self.normalize_row(row))
            .collect();

        let dropped = rows.len() - records.len();
        if dropped > 0 {
            tracing::debug!(dropped, "dropped rows with fewer than {} fields", MIN_FIELDS);
        }

        records
    }

    /// Normalizes a single row, or `None` if it is too short
    pub fn normalize_row(&self, row: &RawRow) -> Option<PriceRecord> {
        if row.len() < MIN_FIELDS {
            return None;
        }

        Some(PriceRecord {
            timestamp: self.parse_timestamp(&row[TIMESTAMP_FIELD]),
            price: parse_price(&row[PRICE_FIELD]),
        })
    }

    /// Parses a source timestamp and converts it to the display zone
    ///
    /// The text must match the source layout exactly, surrounding whitespace
    /// included; anything else comes back as `Raw` with the original string.
    /// Only an empty field is `Absent`. A local time skipped by a forward DST
    /// transition is moved forward by an hour; in the repeated hour of a
    /// backward transition the earlier instant wins.
    pub fn parse_timestamp(&self, raw: &str) -> FieldValue<DateTime<Tz>> {
        if raw.is_empty() {
            return FieldValue::Absent;
        }
        if raw.trim() != raw {
            return FieldValue::Raw(raw.to_string());
        }

        let naive = match NaiveDateTime::parse_from_str(raw, SOURCE_TIMESTAMP_FORMAT) {
            Ok(naive) => naive,
            Err(_) => return FieldValue::Raw(raw.to_string()),
        };

        let local = match self.source_tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt),
            LocalResult::None => self
                .source_tz
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest(),
        };

        match local {
            Some(dt) => FieldValue::Parsed(dt.with_timezone(&self.display_tz)),
            None => FieldValue::Raw(raw.to_string()),
        }
    }
}

/// Parses a EUR/MWh price with a decimal comma into c/kWh
///
/// Empty or whitespace-only input is `Absent`; anything that is not a finite
/// number is `Raw`. No rounding is applied.
pub fn parse_price(raw: &str) -> FieldValue<f64> {
    let normalized = raw.replace(',', ".");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return FieldValue::Absent;
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => FieldValue::Parsed(value / EUR_MWH_PER_CENT_KWH),
        _ => FieldValue::Raw(raw.to_string()),
    }
}
