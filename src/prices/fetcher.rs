//! Remote fetcher for the Elering price CSV
//!
//! Serves the cached payload while it is fresh and otherwise performs one GET
//! against the upstream API. A successful body replaces the cache entry. A
//! failed request is reported as a failure; the fetcher never falls back to a
//! stale entry.

use crate::cache::CacheStore;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Default upstream API base
pub const DEFAULT_BASE_URL: &str = "https://dashboard.elering.ee/api/nps";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Value of the Accept header sent upstream
pub const ACCEPT_CSV: &str = "text/csv, */*";

/// Client identifier sent as User-Agent
pub const USER_AGENT: &str = concat!("spotprice/", env!("CARGO_PKG_VERSION"));

const URL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Errors that can occur when fetching the price table
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Transport failure (timeout, DNS, TLS, connection)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with an error status
    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    /// The response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

/// Where a successful payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// Fresh from the upstream API
    Network,
    /// From a cache entry still inside its TTL
    Cache,
}

/// A successfully obtained payload
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    /// Raw response body
    pub payload: String,
    /// Whether the payload came from the network or the cache
    pub source: PayloadSource,
}

/// Outcome of one fetch
pub type FetchResult = Result<Fetched, FetchError>;

/// Fetches the price table, consulting and updating a cache store
#[derive(Debug, Clone)]
pub struct PriceFetcher {
    /// HTTP client with timeout and identity preconfigured
    http_client: Client,
    /// Cache slot for the last successful payload
    cache: CacheStore,
}

impl PriceFetcher {
    /// Creates a fetcher with the given request timeout and User-Agent
    ///
    /// TLS certificates are always verified.
    pub fn new(
        cache: CacheStore,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { http_client, cache })
    }

    /// The cache store this fetcher reads and writes
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Fetches the payload at `url`
    ///
    /// # Behavior
    /// - Returns the cached payload without a request if it is younger than `ttl_seconds`
    /// - Otherwise performs one GET; any status >= 400 is a failure and is not cached
    /// - A successful body is written to the cache before returning
    /// - Failures are returned as-is, even if an expired entry exists
    pub async fn fetch(&self, url: &str, ttl_seconds: u64) -> FetchResult {
        self.fetch_at(url, ttl_seconds, Utc::now()).await
    }

    /// Same as [`fetch`](Self::fetch) with an explicit current time
    pub async fn fetch_at(&self, url: &str, ttl_seconds: u64, now: DateTime<Utc>) -> FetchResult {
        if let Some(entry) = self.cache.read() {
            if entry.is_fresh_at(ttl_seconds, now) {
                tracing::debug!(stored_at = %entry.stored_at, "serving price table from cache");
                return Ok(Fetched {
                    payload: entry.payload,
                    source: PayloadSource::Cache,
                });
            }
        }

        let payload = self.fetch_from_api(url).await?;

        if let Err(e) = self.cache.write_at(&payload, now) {
            tracing::warn!(
                path = %self.cache.path().display(),
                error = %e,
                "failed to update price cache"
            );
        }

        Ok(Fetched {
            payload,
            source: PayloadSource::Network,
        })
    }

    /// Performs the upstream request
    async fn fetch_from_api(&self, url: &str) -> Result<String, FetchError> {
        tracing::info!(%url, "fetching price table");

        let response = self.http_client.get(url).header(ACCEPT, ACCEPT_CSV).send().await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            tracing::warn!(status = status.as_u16(), "upstream returned error status");
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(FetchError::Body)
    }
}

/// Builds the upstream CSV URL covering today so far
///
/// `start` is local midnight of the current day in `tz` and `end` is `now`,
/// both rendered in UTC.
pub fn price_csv_url(base_url: &str, field_code: &str, now: DateTime<Utc>, tz: Tz) -> String {
    let today = now.with_timezone(&tz).date_naive();
    let start = tz
        .from_local_datetime(&today.and_time(NaiveTime::MIN))
        .earliest()
        .or_else(|| {
            // Midnight skipped by DST; take the first valid hour of the day
            (1..24)
                .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
                .find_map(|t| tz.from_local_datetime(&today.and_time(t)).earliest())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);

    format!(
        "{}/price/csv?start={}&end={}&fields={}",
        base_url.trim_end_matches('/'),
        start.format(URL_TIME_FORMAT),
        now.format(URL_TIME_FORMAT),
        field_code
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use chrono_tz::Europe::Helsinki;
    use tempfile::TempDir;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_CSV: &str = "idx;ts;price\n1;15.11.2025 00:00;50,00\n";

    fn create_test_fetcher() -> (PriceFetcher, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheStore::in_dir(temp_dir.path());
        let fetcher = PriceFetcher::new(cache, Duration::from_secs(5), USER_AGENT).unwrap();
        (fetcher, temp_dir)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_price_csv_url_covers_local_day() {
        let url = price_csv_url(DEFAULT_BASE_URL, "fi", now(), Helsinki);
        assert_eq!(
            url,
            "https://dashboard.elering.ee/api/nps/price/csv\
             ?start=2025-11-14T22:00:00Z&end=2025-11-15T12:00:00Z&fields=fi"
        );
    }

    #[test]
    fn test_price_csv_url_uses_local_date_not_utc_date() {
        // 23:30 UTC is already the next day in Helsinki
        let late = Utc.with_ymd_and_hms(2025, 6, 1, 23, 30, 0).unwrap();
        let url = price_csv_url("http://localhost/api/", "ee", late, Helsinki);
        assert_eq!(
            url,
            "http://localhost/api/price/csv\
             ?start=2025-06-01T21:00:00Z&end=2025-06-01T23:30:00Z&fields=ee"
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_identity_and_caches_body() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/price/csv"))
            .and(query_param("fields", "fi"))
            .and(header_exists("accept"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_CSV))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = price_csv_url(&mock_server.uri(), "fi", now(), Helsinki);
        let fetched = fetcher.fetch_at(&url, 300, now()).await.unwrap();

        assert_eq!(fetched.payload, SAMPLE_CSV);
        assert_eq!(fetched.source, PayloadSource::Network);

        let entry = fetcher.cache().read().expect("Body should be cached");
        assert_eq!(entry.payload, SAMPLE_CSV);
        assert_eq!(entry.stored_at, now());
    }

    #[tokio::test]
    async fn test_second_fetch_within_ttl_uses_cache() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_CSV))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/price/csv", mock_server.uri());
        let first = fetcher.fetch_at(&url, 300, now()).await.unwrap();
        let second = fetcher
            .fetch_at(&url, 300, now() + ChronoDuration::seconds(299))
            .await
            .unwrap();

        assert_eq!(first.source, PayloadSource::Network);
        assert_eq!(second.source, PayloadSource::Cache);
        assert_eq!(second.payload, SAMPLE_CSV);
    }

    #[tokio::test]
    async fn test_expired_cache_triggers_refetch() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("new"))
            .expect(1)
            .mount(&mock_server)
            .await;

        fetcher.cache().write_at("old", now()).unwrap();

        let url = format!("{}/price/csv", mock_server.uri());
        let later = now() + ChronoDuration::seconds(300);
        let fetched = fetcher.fetch_at(&url, 300, later).await.unwrap();

        assert_eq!(fetched.payload, "new");
        assert_eq!(fetched.source, PayloadSource::Network);
        assert_eq!(fetcher.cache().read().unwrap().stored_at, later);
    }

    #[tokio::test]
    async fn test_error_status_is_failure_and_not_cached() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/price/csv", mock_server.uri());
        let result = fetcher.fetch_at(&url, 300, now()).await;

        assert!(matches!(result, Err(FetchError::Status(503))));
        assert!(fetcher.cache().read().is_none(), "Error bodies must not be cached");
    }

    #[tokio::test]
    async fn test_failure_does_not_fall_back_to_stale_cache() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        fetcher.cache().write_at(SAMPLE_CSV, now() - ChronoDuration::hours(1)).unwrap();

        let url = format!("{}/price/csv", mock_server.uri());
        let result = fetcher.fetch_at(&url, 300, now()).await;

        assert!(matches!(result, Err(FetchError::Status(404))));
        // Stale entry is left untouched
        assert_eq!(fetcher.cache().read().unwrap().payload, SAMPLE_CSV);
    }

    #[tokio::test]
    async fn test_no_content_status_is_success() {
        let (fetcher, _temp_dir) = create_test_fetcher();
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let url = format!("{}/price/csv", mock_server.uri());
        let fetched = fetcher.fetch_at(&url, 300, now()).await.unwrap();

        assert_eq!(fetched.payload, "");
        assert_eq!(fetched.source, PayloadSource::Network);
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = PriceFetcher::new(
            CacheStore::in_dir(temp_dir.path()),
            Duration::from_millis(100),
            USER_AGENT,
        )
        .unwrap();
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(SAMPLE_CSV)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let url = format!("{}/price/csv", mock_server.uri());
        let result = fetcher.fetch_at(&url, 300, now()).await;

        assert!(matches!(result, Err(FetchError::Request(_))));
        assert!(fetcher.cache().read().is_none());
    }

    #[tokio::test]
    async fn test_connection_refused_is_failure() {
        let (fetcher, _temp_dir) = create_test_fetcher();

        // Port 9 (discard) on localhost is not expected to accept HTTP
        let result = fetcher.fetch_at("http://127.0.0.1:9/price/csv", 300, now()).await;

        assert!(result.is_err());
    }
}
