//! Exchange rate data types, sources, and the caching rate provider
//!
//! Rates are expressed against the US dollar: a rate of 1.5 for NZD means one
//! USD buys 1.5 NZD.

pub mod client;
pub mod provider;

pub use client::{FetchError, OpenExchangeRates};
pub use provider::{ExchangeRates, RateError};

use std::collections::BTreeMap;
use std::env;

/// One day's snapshot of rates, keyed by uppercase currency symbol
///
/// Ordered so the cache file serializes identically between runs.
pub type RateTable = BTreeMap<String, f64>;

/// Rate tables keyed by `YYYY-MM-DD` date string
pub type RateCache = BTreeMap<String, RateTable>;

/// The base currency that every rate is quoted against
pub const BASE_CURRENCY: &str = "USD";

/// Something that can produce today's full rate table
///
/// The production implementation is [`OpenExchangeRates`]; tests substitute
/// their own.
#[allow(async_fn_in_trait)]
pub trait RateSource {
    /// Fetches the latest rates for every available currency
    async fn fetch_rates(&self) -> Result<RateTable, FetchError>;
}

/// Fixed rates served instead of a network call when running in CI
pub fn mock_rates() -> RateTable {
    RateTable::from([
        ("USD".to_string(), 1.0),
        ("NZD".to_string(), 1.5),
        ("AUD".to_string(), 1.6),
    ])
}

/// Returns true when executing inside a GitHub Actions workflow
pub fn running_on_github_actions() -> bool {
    env::var_os("GITHUB_ACTION").is_some_and(|v| !v.is_empty())
}
