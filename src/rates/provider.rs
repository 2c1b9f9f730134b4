//! Caching exchange rate provider
//!
//! Answers "how much of currency X does one USD buy today", serving from the
//! on-disk cache when today's table is present and fetching otherwise.

use chrono::Local;
use thiserror::Error;
use tracing::debug;

use super::{FetchError, RateCache, RateSource, BASE_CURRENCY};
use crate::cache::{CacheError, JsonCache};

/// Date format of the cache keys
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors that can occur when looking up a rate
#[derive(Debug, Error)]
pub enum RateError {
    /// The currency symbol was blank
    #[error("no currency specified")]
    NoCurrency,

    /// The symbol was not in a freshly fetched rate table
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    /// Fetching the rate table failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Returns the current local date as `YYYY-MM-DD`
pub fn todays_date() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// Exchange rate provider backed by a daily on-disk cache
///
/// Owns the rate cache and the source used to refill it.
#[derive(Debug)]
pub struct ExchangeRates<S> {
    cache: JsonCache<RateCache>,
    source: S,
}

impl<S: RateSource> ExchangeRates<S> {
    /// Creates a provider whose cache file lives at `cache_file`
    ///
    /// The cache starts empty; call `load` to read the file.
    pub fn new(cache_file: impl Into<std::path::PathBuf>, source: S) -> Self {
        Self {
            cache: JsonCache::new(RateCache::new(), cache_file),
            source,
        }
    }

    /// The cached rate tables
    pub fn cached(&self) -> &RateCache {
        self.cache.data()
    }

    /// Mutable access to the cached rate tables
    pub fn cached_mut(&mut self) -> &mut RateCache {
        self.cache.data_mut()
    }

    /// Reads the cache file, if there is one
    pub fn load(&mut self) -> Result<(), CacheError> {
        self.cache.load()
    }

    /// Writes the cache file if its contents changed
    ///
    /// Returns whether the file was written.
    pub fn save(&mut self) -> Result<bool, CacheError> {
        self.cache.save()
    }

    /// Returns the amount of `currency` that one USD buys at today's rates
    ///
    /// Today's cached table is used when it has the symbol, unless `force` is
    /// set. Otherwise the full table is fetched and replaces the entire cache,
    /// so earlier days are dropped. A failed fetch leaves the cache untouched.
    ///
    /// Surrounding whitespace is trimmed from `currency` before any check, so a
    /// whitespace-only symbol counts as blank and `" nzd "` looks up `NZD`.
    ///
    /// # Arguments
    /// * `currency` - Currency symbol, matched case-insensitively
    /// * `force` - Fetch today's rates even if they are already cached
    ///
    /// # Returns
    /// * `Ok(f64)` - The rate
    /// * `Err(RateError::NoCurrency)` - If `currency` is blank
    /// * `Err(RateError::UnknownCurrency)` - If the fetched table lacks it
    /// * `Err(RateError::Fetch)` - If fetching failed
    pub async fn get_rate(&mut self, currency: &str, force: bool) -> Result<f64, RateError> {
        let currency = currency.trim();
        if currency.is_empty() {
            return Err(RateError::NoCurrency);
        }
        if currency.eq_ignore_ascii_case(BASE_CURRENCY) {
            return Ok(1.00);
        }

        let symbol = currency.to_uppercase();
        let today = todays_date();

        if !force {
            if let Some(rate) = self.lookup(&today, &symbol) {
                debug!(%symbol, date = %today, "rate served from cache");
                return Ok(rate);
            }
        }

        debug!(%symbol, date = %today, force, "fetching today's rates");
        let rates = self.source.fetch_rates().await?;
        *self.cache.data_mut() = RateCache::from([(today.clone(), rates)]);

        self.lookup(&today, &symbol)
            .ok_or_else(|| RateError::UnknownCurrency(currency.to_string()))
    }

    fn lookup(&self, date: &str, symbol: &str) -> Option<f64> {
        self.cache.data().get(date)?.get(symbol).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{mock_rates, RateTable};
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Rate source that counts fetches and serves a fixed table
    struct MockSource {
        rates: RateTable,
        fetches: Cell<usize>,
        fail: bool,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                rates: mock_rates(),
                fetches: Cell::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    impl RateSource for MockSource {
        async fn fetch_rates(&self) -> Result<RateTable, FetchError> {
            self.fetches.set(self.fetches.get() + 1);
            if self.fail {
                return Err(FetchError::InvalidResponse {
                    url: "mock".to_string(),
                    payload: "{}".to_string(),
                });
            }
            Ok(self.rates.clone())
        }
    }

    fn create_provider(source: MockSource) -> (ExchangeRates<MockSource>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let provider = ExchangeRates::new(temp_dir.path().join("exchange-rates.json"), source);
        (provider, temp_dir)
    }

    fn with_today(provider: &mut ExchangeRates<MockSource>, symbol: &str, rate: f64) {
        provider
            .cached_mut()
            .entry(todays_date())
            .or_default()
            .insert(symbol.to_string(), rate);
    }

    #[test]
    fn test_todays_date_format() {
        let today = todays_date();
        assert_eq!(today.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&today, DATE_FORMAT).is_ok());
    }

    #[tokio::test]
    async fn test_usd_is_one_without_fetch() {
        let (mut provider, _temp_dir) = create_provider(MockSource::new());

        assert_eq!(provider.get_rate("USD", false).await.unwrap(), 1.00);
        assert_eq!(provider.get_rate("usd", true).await.unwrap(), 1.00);
        assert_eq!(provider.source.fetches.get(), 0);
    }

    #[tokio::test]
    async fn test_blank_currency_is_rejected() {
        let (mut provider, _temp_dir) = create_provider(MockSource::new());
        with_today(&mut provider, "NZD", 1.5);

        let err = provider.get_rate("", false).await.unwrap_err();
        assert!(matches!(err, RateError::NoCurrency));
        assert_eq!(err.to_string(), "no currency specified");

        assert!(matches!(
            provider.get_rate("   ", true).await,
            Err(RateError::NoCurrency)
        ));
        assert_eq!(provider.source.fetches.get(), 0);
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_is_trimmed() {
        let (mut provider, _temp_dir) = create_provider(MockSource::new());
        with_today(&mut provider, "NZD", 1.25);

        assert_eq!(provider.get_rate(" nzd ", false).await.unwrap(), 1.25);
        assert_eq!(provider.get_rate("\tusd\n", false).await.unwrap(), 1.00);
        assert_eq!(provider.source.fetches.get(), 0);

        let err = provider.get_rate(" foobar ", false).await.unwrap_err();
        assert_eq!(err.to_string(), "unknown currency: foobar");
    }

    #[tokio::test]
    async fn test_unknown_currency_after_fetch() {
        let (mut provider, _temp_dir) = create_provider(MockSource::new());

        let err = provider.get_rate("FOOBAR", false).await.unwrap_err();

        assert!(matches!(err, RateError::UnknownCurrency(_)));
        assert_eq!(err.to_string(), "unknown currency: FOOBAR");
        assert_eq!(provider.source.fetches.get(), 1);
        // The successful fetch is still cached.
        assert_eq!(provider.cached()[&todays_date()], mock_rates());
    }

    #[tokio::test]
    async fn test_cache_hit_is_case_insensitive() {
        let (mut provider, _temp_dir) = create_provider(MockSource::new());
        with_today(&mut provider, "NZD", 1.25);

        let rate = provider.get_rate("nzd", false).await.unwrap();

        assert_eq!(rate, 1.25);
        assert_eq!(provider.source.fetches.get(), 0);
    }

    #[tokio::test]
    async fn test_force_refresh_fetches_once() {
        let (mut provider, _temp_dir) = create_provider(MockSource::new());
        with_today(&mut provider, "NZD", 1.25);

        let rate = provider.get_rate("nzd", true).await.unwrap();

        assert_eq!(rate, 1.5);
        assert_eq!(provider.source.fetches.get(), 1);
    }

    #[tokio::test]
    async fn test_cache_miss_fetches_then_hits() {
        let (mut provider, _temp_dir) = create_provider(MockSource::new());

        assert_eq!(provider.get_rate("AUD", false).await.unwrap(), 1.6);
        assert_eq!(provider.get_rate("NZD", false).await.unwrap(), 1.5);

        assert_eq!(provider.source.fetches.get(), 1);
    }

    #[tokio::test]
    async fn test_fetch_replaces_previous_days() {
        let (mut provider, _temp_dir) = create_provider(MockSource::new());
        provider.cached_mut().insert(
            "2020-01-01".to_string(),
            RateTable::from([("NZD".to_string(), 1.4)]),
        );

        provider.get_rate("NZD", false).await.unwrap();

        let cached = provider.cached();
        assert_eq!(cached.len(), 1);
        assert!(cached.contains_key(&todays_date()));
        assert!(!cached.contains_key("2020-01-01"));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_untouched() {
        let (mut provider, _temp_dir) = create_provider(MockSource::failing());
        provider.cached_mut().insert(
            "2020-01-01".to_string(),
            RateTable::from([("NZD".to_string(), 1.4)]),
        );
        let before = provider.cached().clone();

        let err = provider.get_rate("NZD", false).await.unwrap_err();

        assert!(matches!(
            err,
            RateError::Fetch(FetchError::InvalidResponse { .. })
        ));
        assert_eq!(provider.cached(), &before);
    }

    #[tokio::test]
    async fn test_cache_persists_across_providers() {
        let (mut provider, temp_dir) = create_provider(MockSource::new());
        provider.get_rate("NZD", false).await.unwrap();
        assert!(provider.save().unwrap());

        let mut reloaded = ExchangeRates::new(
            temp_dir.path().join("exchange-rates.json"),
            MockSource::new(),
        );
        reloaded.load().unwrap();

        assert_eq!(reloaded.get_rate("aud", false).await.unwrap(), 1.6);
        assert_eq!(reloaded.source.fetches.get(), 0);
        assert!(!reloaded.save().unwrap(), "Unchanged cache should not be rewritten");
    }
}
