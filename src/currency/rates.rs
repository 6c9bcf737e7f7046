//! Exchange-rate table
//!
//! Rates are expressed as units of a currency per one PLN.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Currency;

/// Rates used when nothing better is known
pub const FALLBACK_RATES: [(Currency, f64); 4] = [
    (Currency::Pln, 1.0),
    (Currency::Usd, 0.25),
    (Currency::Uah, 10.5),
    (Currency::Eur, 0.23),
];

/// Where the rates in a table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateOrigin {
    #[default]
    Fallback,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    pub rates: BTreeMap<Currency, f64>,
    pub origin: RateOrigin,

    /// When the rates were fetched; `None` for the built-in table
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self::fallback()
    }
}

impl ExchangeRates {
    pub fn fallback() -> Self {
        Self {
            rates: FALLBACK_RATES.into_iter().collect(),
            origin: RateOrigin::Fallback,
            updated_at: None,
        }
    }

    /// Build a table from a remote response keyed by currency code
    ///
    /// Currencies missing from the response (or with a non-positive rate)
    /// keep their fallback rate. PLN is always 1.
    pub fn from_remote(remote: &BTreeMap<String, f64>, fetched_at: DateTime<Utc>) -> Self {
        let mut table = Self::fallback();
        for currency in Currency::ALL {
            if currency == Currency::Pln {
                continue;
            }
            if let Some(rate) = remote.get(currency.code()).copied() {
                if rate.is_finite() && rate > 0.0 {
                    table.rates.insert(currency, rate);
                }
            }
        }
        table.origin = RateOrigin::Remote;
        table.updated_at = Some(fetched_at);
        table
    }

    /// Units of `currency` per one PLN
    pub fn rate(&self, currency: Currency) -> f64 {
        self.rates
            .get(&currency)
            .copied()
            .or_else(|| {
                FALLBACK_RATES
                    .iter()
                    .find(|(c, _)| *c == currency)
                    .map(|(_, r)| *r)
            })
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_table() {
        let rates = ExchangeRates::fallback();
        assert_eq!(rates.rate(Currency::Pln), 1.0);
        assert_eq!(rates.rate(Currency::Usd), 0.25);
        assert_eq!(rates.rate(Currency::Uah), 10.5);
        assert_eq!(rates.rate(Currency::Eur), 0.23);
        assert_eq!(rates.origin, RateOrigin::Fallback);
    }

    #[test]
    fn test_remote_fills_gaps_with_fallback() {
        let mut remote = BTreeMap::new();
        remote.insert("USD".to_string(), 0.27);
        remote.insert("UAH".to_string(), -1.0);
        remote.insert("PLN".to_string(), 2.0);

        let rates = ExchangeRates::from_remote(&remote, Utc::now());
        assert_eq!(rates.rate(Currency::Usd), 0.27);
        assert_eq!(rates.rate(Currency::Uah), 10.5);
        assert_eq!(rates.rate(Currency::Pln), 1.0);
        assert_eq!(rates.origin, RateOrigin::Remote);
    }
}
