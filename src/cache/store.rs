//! Single-slot cache store for the last successful price payload
//!
//! Provides a `CacheStore` that keeps one raw payload on disk together with the
//! instant it was stored. Writes go to a sibling temp file that is renamed over
//! the slot, so concurrent readers never see a half-written payload.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

/// File name of the cache slot inside the cache directory
pub const CACHE_FILE_NAME: &str = "elering_prices.json";

/// The cached payload and when it was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Raw response body exactly as received from upstream
    pub payload: String,
    /// When the payload was written
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Returns true if the entry is younger than `ttl_seconds` at `now`
    ///
    /// Age is counted in whole seconds. An entry stamped in the future (clock
    /// skew) counts as fresh.
    pub fn is_fresh_at(&self, ttl_seconds: u64, now: DateTime<Utc>) -> bool {
        let age = (now - self.stored_at).num_seconds();
        age < i64::try_from(ttl_seconds).unwrap_or(i64::MAX)
    }

    /// Returns true if the entry is younger than `ttl_seconds` right now
    pub fn is_fresh(&self, ttl_seconds: u64) -> bool {
        self.is_fresh_at(ttl_seconds, Utc::now())
    }
}

/// Reads and writes the cache slot on disk
///
/// By default the slot lives in the XDG cache directory
/// (`~/.cache/spotprice/elering_prices.json` on Linux). The entry is never
/// deleted by this type; it persists across runs.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Full path of the cache slot
    path: PathBuf,
}

impl CacheStore {
    /// Creates a CacheStore backed by a specific file
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a CacheStore using the default file name inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::at(dir.join(CACHE_FILE_NAME))
    }

    /// Default location of the cache slot, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "spotprice")?;
        Some(project_dirs.cache_dir().join(CACHE_FILE_NAME))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current entry
    ///
    /// Returns `None` if the slot doesn't exist or cannot be parsed.
    pub fn read(&self) -> Option<CacheEntry> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ignoring unreadable cache entry"
                );
                None
            }
        }
    }

    /// Overwrites the slot with `payload`, stamped with the current time
    pub fn write(&self, payload: &str) -> io::Result<CacheEntry> {
        self.write_at(payload, Utc::now())
    }

    /// Overwrites the slot with `payload`, stamped with `now`
    ///
    /// The stored time never moves backwards: if the existing entry carries a
    /// later stamp (another writer with a skewed clock), that stamp is kept.
    pub fn write_at(&self, payload: &str, now: DateTime<Utc>) -> io::Result<CacheEntry> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let stored_at = match self.read() {
            Some(previous) if previous.stored_at > now => previous.stored_at,
            _ => now,
        };
        let entry = CacheEntry {
            payload: payload.to_string(),
            stored_at,
        };

        let json = serde_json::to_string(&entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let tmp = self.temp_path();
        if let Err(e) = fs::write(&tmp, json).and_then(|_| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        Ok(entry)
    }

    /// Sibling temp path, unique per process and write
    fn temp_path(&self) -> PathBuf {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| CACHE_FILE_NAME.to_string());
        self.path
            .with_file_name(format!(".{}.{}.{}.tmp", name, process::id(), nanos))
    }
}
