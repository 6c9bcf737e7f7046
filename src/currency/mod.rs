//! Exchange rates, conversion and money formatting

mod manager;
mod rates;
mod source;

pub use manager::{
    format_money, is_valid_amount, parse_amount, CurrencyInfo, CurrencyManager, RateUpdate,
    MAX_AMOUNT, RATES_CACHE_KEY,
};
pub use rates::{ExchangeRates, RateOrigin, FALLBACK_RATES};
pub use source::{HttpRateSource, OfflineRateSource, RateSource, RatesResponse};
