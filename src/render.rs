//! Plain-text rendering of an exported snapshot

use std::fmt;

use crate::prices::ExportedSnapshot;

const TIMESTAMP_HEADING: &str = "Timestamp";
const PRICE_HEADING: &str = "Price (c/kWh)";

/// Renders the snapshot as a metadata block followed by a two-column table
///
/// Absent prices show as `-`. With no rows an empty-state line is printed
/// instead of the table.
pub fn render_table(snapshot: &ExportedSnapshot) -> String {
    Table(snapshot).to_string()
}

/// Display adapter writing a snapshot as the plain-text table
pub struct Table<'a>(pub &'a ExportedSnapshot);

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_table(f, self.0)
    }
}

fn write_table(out: &mut impl fmt::Write, snapshot: &ExportedSnapshot) -> fmt::Result {
    if let Some(updated) = &snapshot.last_updated {
        writeln!(out, "Updated at: {}", updated)?;
    }
    writeln!(out, "Next update: {}", snapshot.next_refresh)?;

    if snapshot.row_count == 0 {
        return match &snapshot.error {
            Some(error) => writeln!(out, "No data available. {}", error),
            None => writeln!(out, "No data available."),
        };
    }

    if let Some(error) = &snapshot.error {
        writeln!(out, "({})", error)?;
    }
    writeln!(
        out,
        "Showing {} rows. Timestamps converted to {}.",
        snapshot.row_count, snapshot.timezone
    )?;
    writeln!(out)?;

    let width = snapshot
        .labels
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(TIMESTAMP_HEADING.len()))
        .max()
        .unwrap_or(TIMESTAMP_HEADING.len());

    writeln!(out, "{:<width$}  {:>13}", TIMESTAMP_HEADING, PRICE_HEADING, width = width)?;
    for (label, price) in snapshot.labels.iter().zip(&snapshot.prices) {
        let price = match price {
            Some(value) => format!("{:.2}", value),
            None => "-".to_string(),
        };
        writeln!(out, "{:<width$}  {:>13}", label, price, width = width)?;
    }

    Ok(())
}
