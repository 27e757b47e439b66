//! Delimited table decoding
//!
//! Splits the upstream payload into rows of string fields, honoring standard
//! CSV quoting. Rows are not filtered by width here; the normalizer decides
//! which rows are usable.

use super::RawRow;

/// Delimiter used by the upstream price table
pub const DEFAULT_DELIMITER: u8 = b';';

/// Decodes `payload` into rows of fields
///
/// Blank lines (a record with a single empty or whitespace-only field) are
/// dropped. Every other record is kept, however short. Empty input yields an
/// empty vector.
pub fn parse(payload: &str, delimiter: u8) -> Vec<RawRow> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(payload.as_bytes());

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(record = index, error = %e, "skipping undecodable record");
                continue;
            }
        };

        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }

        rows.push(record.iter().map(str::to_string).collect());
    }

    rows
}

/// Splits off the leading header row
pub fn split_header(mut rows: Vec<RawRow>) -> (Option<RawRow>, Vec<RawRow>) {
    if rows.is_empty() {
        return (None, rows);
    }
    let header = rows.remove(0);
    (Some(header), rows)
}
