//! openexchangerates.org API client
//!
//! Fetches the latest USD-based rates and parses them into a `RateTable`.

use reqwest::Client;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use super::{mock_rates, running_on_github_actions, RateSource, RateTable};
use crate::config::{Config, ConfigError};

/// Latest rates endpoint of the openexchangerates.org API
const LATEST_RATES_URL: &str = "https://openexchangerates.org/api/latest.json";

/// Errors that can occur when fetching exchange rates
#[derive(Debug, Error)]
pub enum FetchError {
    /// The config file could not supply an application ID
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP request failed
    #[error("exchange rate request: {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body is not a JSON object
    #[error("exchange rate decode: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response is JSON but has no usable `rates` field
    #[error("invalid exchange rate response: {url}: {payload}")]
    InvalidResponse { url: String, payload: String },
}

/// Rate source backed by the openexchangerates.org API
///
/// The application ID is read from the config file on every fetch, so a
/// missing config only matters when a fetch is actually needed.
#[derive(Debug, Clone)]
pub struct OpenExchangeRates {
    client: Client,
    config_file: PathBuf,
    url: String,
}

impl OpenExchangeRates {
    /// Creates a client that reads its credentials from `config_file`
    pub fn new(config_file: impl Into<PathBuf>) -> Self {
        Self::with_url(config_file, LATEST_RATES_URL)
    }

    /// Creates a client that requests rates from a custom endpoint
    ///
    /// Useful for testing against a local server.
    pub fn with_url(config_file: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            config_file: config_file.into(),
            url: url.into(),
        }
    }

    /// Loads the application ID and fetches the latest rates
    async fn fetch_configured(&self) -> Result<RateTable, FetchError> {
        let config = Config::load(&self.config_file)?;
        self.fetch_latest(&config.xrates_appid).await
    }

    async fn fetch_latest(&self, app_id: &str) -> Result<RateTable, FetchError> {
        let request_error = |source: reqwest::Error| FetchError::Request {
            url: self.url.clone(),
            source,
        };

        debug!(url = %self.url, "requesting latest exchange rates");
        let response = self
            .client
            .get(&self.url)
            .query(&[("app_id", app_id)])
            .send()
            .await
            .map_err(request_error)?;
        let text = response.text().await.map_err(request_error)?;

        parse_rates(&self.url, &text)
    }
}

impl RateSource for OpenExchangeRates {
    async fn fetch_rates(&self) -> Result<RateTable, FetchError> {
        if running_on_github_actions() {
            // CI runs must never hit the network.
            debug!("running on GitHub Actions, serving mock rates");
            return Ok(mock_rates());
        }

        self.fetch_configured().await
    }
}

/// Parses a latest-rates response body from `url` into a `RateTable`
///
/// Currency symbols are upper-cased. A payload without a `rates` object of
/// numbers is reported along with its JSON text for diagnosis.
///
/// # Returns
/// * `Ok(RateTable)` - The parsed rates
/// * `Err(FetchError::Decode)` - If the body is not a JSON object
/// * `Err(FetchError::InvalidResponse)` - If `rates` is missing or malformed
pub fn parse_rates(url: &str, body: &str) -> Result<RateTable, FetchError> {
    let payload: Map<String, Value> = serde_json::from_str(body)?;
    let invalid = |payload: &Map<String, Value>| FetchError::InvalidResponse {
        url: url.to_string(),
        payload: Value::Object(payload.clone()).to_string(),
    };

    let rates = match payload.get("rates") {
        Some(Value::Object(rates)) => rates,
        _ => return Err(invalid(&payload)),
    };

    rates
        .iter()
        .map(|(symbol, value)| {
            value
                .as_f64()
                .map(|rate| (symbol.to_uppercase(), rate))
                .ok_or_else(|| invalid(&payload))
        })
        .collect()
}
