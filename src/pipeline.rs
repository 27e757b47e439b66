//! One sequential run: fetch, parse, normalize, export
//!
//! A fetch failure short-circuits to an error snapshot with no records. Bad
//! rows and fields are absorbed by the parser and normalizer.

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::prices::{
    build_snapshot, parse, price_csv_url, split_header, Normalizer, PriceFetcher, Snapshot,
};

/// Runs the pipeline at the current time
pub async fn run(config: &Config, fetcher: &PriceFetcher) -> Snapshot {
    run_at(config, fetcher, Utc::now()).await
}

/// Runs the pipeline as of `now`
pub async fn run_at(config: &Config, fetcher: &PriceFetcher, now: DateTime<Utc>) -> Snapshot {
    let url = price_csv_url(&config.base_url, &config.field_code, now, config.display_tz);
    let outcome = fetcher.fetch_at(&url, config.cache_ttl_secs, now).await;
    let cache_entry = fetcher.cache().read();

    match outcome {
        Ok(fetched) => {
            let (columns, rows) = split_header(parse(&fetched.payload, config.delimiter));
            let records = Normalizer::new(config.source_tz, config.display_tz).normalize(&rows);
            tracing::debug!(
                source = ?fetched.source,
                records = records.len(),
                "price table normalized"
            );

            build_snapshot(cache_entry.as_ref(), records, None, config.cache_ttl_secs, now)
                .with_columns(columns)
        }
        Err(e) => {
            tracing::warn!(error = %e, "price fetch failed");
            build_snapshot(cache_entry.as_ref(), Vec::new(), Some(&e), config.cache_ttl_secs, now)
        }
    }
}
