//! Cache module for storing the last price payload on disk
//!
//! This module provides a single-slot store holding the most recent successful
//! upstream response and the time it was stored. Freshness is decided by the
//! caller against a TTL; the store itself never expires or deletes the entry.

mod store;

pub use store::{CacheEntry, CacheStore, CACHE_FILE_NAME};
