//! Where fresh exchange rates come from

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{BudgetError, BudgetResult};

/// Body of the rates endpoint: `{ "rates": { "USD": 0.25, ... } }`
#[derive(Debug, Clone, Deserialize)]
pub struct RatesResponse {
    pub rates: BTreeMap<String, f64>,
}

/// Something that can produce PLN-based rates
pub trait RateSource {
    fn fetch(&self) -> BudgetResult<RatesResponse>;
}

/// Fetch rates over HTTP
pub struct HttpRateSource {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpRateSource {
    pub fn new(endpoint: impl Into<String>) -> BudgetResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BudgetError::Currency(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RateSource for HttpRateSource {
    fn fetch(&self) -> BudgetResult<RatesResponse> {
        debug!(endpoint = %self.endpoint, "fetching exchange rates");
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .map_err(|e| BudgetError::Currency(format!("Rate request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BudgetError::Currency(format!(
                "Rate endpoint returned {}",
                status
            )));
        }

        response
            .json::<RatesResponse>()
            .map_err(|e| BudgetError::Currency(format!("Unexpected rate response: {}", e)))
    }
}

/// A source that never answers; used when rates must stay offline
pub struct OfflineRateSource;

impl RateSource for OfflineRateSource {
    fn fetch(&self) -> BudgetResult<RatesResponse> {
        Err(BudgetError::Currency("Offline".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let body = r#"{"base":"PLN","date":"2025-03-01","rates":{"USD":0.26,"EUR":0.24}}"#;
        let parsed: RatesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.rates.get("USD"), Some(&0.26));
    }

    #[test]
    fn test_offline_source_fails() {
        assert!(OfflineRateSource.fetch().is_err());
    }
}
