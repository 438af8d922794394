use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Exchange rates keyed by currency code, expressed as units per 1 USD.
pub type RateTable = HashMap<String, f64>;

/// Errors a rate source can produce. Fetch failures are logged and degrade
/// to cached rates in the catalog; they never surface to callers.
#[derive(Error, Debug)]
pub enum RateSourceError {
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate response is missing the rates table")]
    MissingRates,
}

/// Source of the daily USD-pivot exchange-rate table.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateTable, RateSourceError>;
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: Option<RateTable>,
}

/// HTTP [`RateSource`] for endpoints that answer `{"rates": {code: rate}}`.
///
/// The request timeout is mandatory: an unreachable endpoint must turn into
/// a fetch failure instead of hanging a refresh forever.
pub struct HttpRateSource {
    client: reqwest::Client,
    url: String,
}

impl HttpRateSource {
    /// Endpoint publishing the daily USD-based table in the expected shape.
    pub const DEFAULT_URL: &'static str = "https://api.exchangerate-api.com/v4/latest/USD";

    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RateSourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_rates(&self) -> Result<RateTable, RateSourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;
        let body: RatesResponse = response.json().await?;
        body.rates.ok_or(RateSourceError::MissingRates)
    }
}
