//! Supported currencies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A currency a budget can be kept or displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Polish zloty, the base of the rate table
    #[default]
    Pln,
    Usd,
    Uah,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Pln, Currency::Usd, Currency::Uah, Currency::Eur];

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Pln => "PLN",
            Currency::Usd => "USD",
            Currency::Uah => "UAH",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Pln => "zł",
            Currency::Usd => "$",
            Currency::Uah => "₴",
            Currency::Eur => "€",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Currency::Pln => "Polish zloty",
            Currency::Usd => "US dollar",
            Currency::Uah => "Ukrainian hryvnia",
            Currency::Eur => "Euro",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PLN" | "ZŁ" | "ZL" => Ok(Currency::Pln),
            "USD" | "$" => Ok(Currency::Usd),
            "UAH" | "₴" => Ok(Currency::Uah),
            "EUR" | "€" => Ok(Currency::Eur),
            other => Err(format!(
                "Unsupported currency '{}'. Use one of: PLN, USD, UAH, EUR",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_and_symbols() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("zł".parse::<Currency>().unwrap(), Currency::Pln);
        assert_eq!("€".parse::<Currency>().unwrap(), Currency::Eur);
        assert!("GBP".parse::<Currency>().is_err());
    }

    #[test]
    fn test_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Currency::Uah).unwrap(), "\"UAH\"");
        let c: Currency = serde_json::from_str("\"PLN\"").unwrap();
        assert_eq!(c, Currency::Pln);
    }
}
