//! Conversion and per-currency formatting
//!
//! Amounts are stored in the budget currency. Conversion is for display
//! only and always goes through PLN, rounding to whole cents.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::error::BudgetResult;
use crate::local::LocalStore;
use crate::models::{Budget, Currency, Goal, Money, Transaction};

use super::rates::{ExchangeRates, RateOrigin};
use super::source::RateSource;

/// Largest amount the currency helpers accept (minor units)
pub const MAX_AMOUNT: Money = Money::from_minor(99_999_999_999);

/// Local-store cache key of the last fetched rates
pub const RATES_CACHE_KEY: &str = "exchange_rates";

/// How long cached rates are trusted across restarts
const RATES_CACHE_TTL_HOURS: i64 = 24;

/// One row of [`CurrencyManager::available`]
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyInfo {
    pub currency: Currency,
    pub symbol: &'static str,
    pub rate: f64,
}

/// Result of a rate refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUpdate {
    Updated,
    /// The source failed; the built-in table is in use
    Fallback,
}

pub struct CurrencyManager {
    rates: ExchangeRates,
    current: Currency,
    refresh_interval: Duration,
}

impl CurrencyManager {
    pub fn new(current: Currency, refresh_interval: Duration) -> Self {
        Self {
            rates: ExchangeRates::fallback(),
            current,
            refresh_interval,
        }
    }

    /// Start from rates cached by an earlier run, if still fresh
    pub fn with_cached_rates(
        current: Currency,
        refresh_interval: Duration,
        store: &LocalStore,
    ) -> BudgetResult<Self> {
        let mut manager = Self::new(current, refresh_interval);
        if let Some(rates) = store.load_cache::<ExchangeRates>(RATES_CACHE_KEY)? {
            manager.rates = rates;
        }
        Ok(manager)
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    pub fn set_rates(&mut self, rates: ExchangeRates) {
        self.rates = rates;
    }

    pub fn currency(&self) -> Currency {
        self.current
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.current = currency;
    }

    pub fn symbol(&self, currency: Currency) -> &'static str {
        currency.symbol()
    }

    pub fn available(&self) -> Vec<CurrencyInfo> {
        Currency::ALL
            .iter()
            .map(|c| CurrencyInfo {
                currency: *c,
                symbol: c.symbol(),
                rate: self.rates.rate(*c),
            })
            .collect()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.rates.updated_at
    }

    /// Convert through PLN, rounded to cents
    pub fn convert(&self, amount: Money, from: Currency, to: Currency) -> Money {
        if from == to {
            return amount;
        }
        let in_pln = amount.minor() as f64 / self.rates.rate(from);
        Money::from_minor((in_pln * self.rates.rate(to)).round() as i64)
    }

    /// Convert to the display currency
    pub fn to_display(&self, amount: Money, from: Currency) -> Money {
        self.convert(amount, from, self.current)
    }

    /// Member totals of a budget shown in another currency
    pub fn convert_budget(&self, budget: &Budget, to: Currency) -> Budget {
        let from = budget.currency;
        let mut converted = budget.clone();
        for member in &mut converted.members {
            member.balance = self.convert(member.balance, from, to);
            member.income = self.convert(member.income, from, to);
            member.expenses = self.convert(member.expenses, from, to);
        }
        converted.total_balance = self.convert(budget.total_balance, from, to);
        converted.currency = to;
        converted
    }

    pub fn convert_transactions(
        &self,
        transactions: &[Transaction],
        from: Currency,
        to: Currency,
    ) -> Vec<Transaction> {
        transactions
            .iter()
            .cloned()
            .map(|mut t| {
                t.amount = self.convert(t.amount, from, to);
                t
            })
            .collect()
    }

    pub fn convert_goals(&self, goals: &[Goal], from: Currency, to: Currency) -> Vec<Goal> {
        goals
            .iter()
            .cloned()
            .map(|mut g| {
                g.target_amount = self.convert(g.target_amount, from, to);
                g.current_amount = self.convert(g.current_amount, from, to);
                g
            })
            .collect()
    }

    /// `$1,234.56`, `1 234,56 zł`, `1 234,56 ₴`, `1 234,56 €`
    pub fn format(&self, amount: Money, currency: Currency) -> String {
        format_money(amount, currency)
    }

    /// Format in the display currency
    pub fn format_current(&self, amount: Money) -> String {
        format_money(amount, self.current)
    }

    /// Convert from `from` and format in the display currency
    pub fn display(&self, amount: Money, from: Currency) -> String {
        format_money(self.to_display(amount, from), self.current)
    }

    pub fn should_update_rates(&self) -> bool {
        self.should_update_rates_at(Utc::now())
    }

    pub fn should_update_rates_at(&self, now: DateTime<Utc>) -> bool {
        match (self.rates.origin, self.rates.updated_at) {
            (RateOrigin::Remote, Some(updated)) => now - updated >= self.refresh_interval,
            _ => true,
        }
    }

    /// Fetch fresh rates; on failure fall back to the built-in table
    ///
    /// Never fails: a broken network must not break the budget.
    pub fn update_rates(&mut self, source: &dyn RateSource, store: Option<&LocalStore>) -> RateUpdate {
        match source.fetch() {
            Ok(response) => {
                self.rates = ExchangeRates::from_remote(&response.rates, Utc::now());
                if let Some(store) = store {
                    if let Err(e) = store.save_cache(
                        RATES_CACHE_KEY,
                        &self.rates,
                        Duration::hours(RATES_CACHE_TTL_HOURS),
                    ) {
                        warn!(error = %e, "failed to cache exchange rates");
                    }
                }
                info!("exchange rates updated");
                RateUpdate::Updated
            }
            Err(e) => {
                warn!(error = %e, "exchange rate refresh failed, using fallback rates");
                self.rates = ExchangeRates::fallback();
                RateUpdate::Fallback
            }
        }
    }

    /// Refresh only when the rates are stale
    pub fn auto_update_rates(
        &mut self,
        source: &dyn RateSource,
        store: Option<&LocalStore>,
    ) -> Option<RateUpdate> {
        if self.should_update_rates() {
            Some(self.update_rates(source, store))
        } else {
            None
        }
    }
}

/// Parse an amount with a currency symbol or code around it
///
/// `1 234,56 zł`, `$1,234.56`, `12.50 USD`. When both `,` and `.` occur the
/// last one is the decimal separator.
pub fn parse_amount(input: &str) -> Option<Money> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let decimal = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => Some(dot.max(comma)),
        (Some(pos), None) | (None, Some(pos)) => {
            let separators = cleaned.matches(['.', ',']).count();
            if separators > 1 {
                None
            } else {
                Some(pos)
            }
        }
        (None, None) => None,
    };

    let normalized: String = cleaned
        .char_indices()
        .filter_map(|(i, c)| match c {
            '.' | ',' if Some(i) == decimal => Some('.'),
            '.' | ',' => None,
            _ => Some(c),
        })
        .collect();

    Money::parse(&normalized).ok()
}

/// Non-negative and within [`MAX_AMOUNT`]
pub fn is_valid_amount(input: &str) -> bool {
    parse_amount(input).is_some_and(|m| !m.is_negative() && m <= MAX_AMOUNT)
}

pub fn format_money(amount: Money, currency: Currency) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let abs = amount.abs();
    let cents = abs.minor_part();
    match currency {
        Currency::Usd => format!(
            "{}{}{}.{:02}",
            sign,
            currency.symbol(),
            group_thousands(abs.major(), ','),
            cents
        ),
        _ => format!(
            "{}{},{:02} {}",
            sign,
            group_thousands(abs.major(), ' '),
            cents,
            currency.symbol()
        ),
    }
}

fn group_thousands(value: i64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::source::{OfflineRateSource, RatesResponse};
    use crate::error::BudgetResult;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct FixedSource(f64);

    impl RateSource for FixedSource {
        fn fetch(&self) -> BudgetResult<RatesResponse> {
            let mut rates = BTreeMap::new();
            rates.insert("USD".to_string(), self.0);
            Ok(RatesResponse { rates })
        }
    }

    fn manager() -> CurrencyManager {
        CurrencyManager::new(Currency::Pln, Duration::minutes(60))
    }

    #[test]
    fn test_convert_through_pln() {
        let m = manager();
        // 100 PLN -> 25 USD
        assert_eq!(
            m.convert(Money::from_minor(10_000), Currency::Pln, Currency::Usd),
            Money::from_minor(2_500)
        );
        // 10 USD -> 40 PLN -> 420 UAH
        assert_eq!(
            m.convert(Money::from_minor(1_000), Currency::Usd, Currency::Uah),
            Money::from_minor(42_000)
        );
        // rounded to cents
        assert_eq!(
            m.convert(Money::from_minor(1), Currency::Pln, Currency::Eur),
            Money::from_minor(0)
        );
        assert_eq!(
            m.convert(Money::from_minor(777), Currency::Eur, Currency::Eur),
            Money::from_minor(777)
        );
    }

    #[test]
    fn test_format_per_currency() {
        let amount = Money::from_minor(123_456);
        assert_eq!(format_money(amount, Currency::Usd), "$1,234.56");
        assert_eq!(format_money(amount, Currency::Pln), "1 234,56 zł");
        assert_eq!(format_money(amount, Currency::Uah), "1 234,56 ₴");
        assert_eq!(format_money(amount, Currency::Eur), "1 234,56 €");
        assert_eq!(format_money(Money::from_minor(-5), Currency::Usd), "-$0.05");
        assert_eq!(format_money(Money::from_minor(100_000_000), Currency::Pln), "1 000 000,00 zł");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1 234,56 zł"), Some(Money::from_minor(123_456)));
        assert_eq!(parse_amount("$1,234.56"), Some(Money::from_minor(123_456)));
        assert_eq!(parse_amount("12.5 USD"), Some(Money::from_minor(1_250)));
        assert_eq!(parse_amount("1.234.567"), Some(Money::from_minor(123_456_700)));
        assert_eq!(parse_amount("zł"), None);
    }

    #[test]
    fn test_is_valid_amount() {
        assert!(is_valid_amount("0"));
        assert!(is_valid_amount("999 999 999,99"));
        assert!(!is_valid_amount("1 000 000 000"));
        assert!(!is_valid_amount("-5"));
        assert!(!is_valid_amount("abc"));
    }

    #[test]
    fn test_update_rates_and_cache() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(dir.path().join("local.json")).unwrap();
        let mut m = manager();
        assert!(m.should_update_rates());

        assert_eq!(m.update_rates(&FixedSource(0.3), Some(&store)), RateUpdate::Updated);
        assert_eq!(m.rates().rate(Currency::Usd), 0.3);
        assert!(!m.should_update_rates());
        assert!(m.should_update_rates_at(Utc::now() + Duration::minutes(61)));

        let restored = CurrencyManager::with_cached_rates(Currency::Usd, Duration::minutes(60), &store).unwrap();
        assert_eq!(restored.rates().rate(Currency::Usd), 0.3);
        assert_eq!(restored.currency(), Currency::Usd);
    }

    #[test]
    fn test_failed_update_falls_back() {
        let mut m = manager();
        m.update_rates(&FixedSource(0.3), None);
        assert_eq!(m.update_rates(&OfflineRateSource, None), RateUpdate::Fallback);
        assert_eq!(m.rates().rate(Currency::Usd), 0.25);
        assert!(m.should_update_rates());
    }

    #[test]
    fn test_convert_budget_members() {
        let owner = crate::models::User::new("anna@example.com", "Anna", "h");
        let mut budget = Budget::new("Home", &owner, Currency::Pln);
        budget.apply_delta(
            owner.id,
            crate::models::MemberDelta::for_transaction(
                crate::models::TransactionKind::Income,
                Money::from_minor(40_000),
            ),
        );

        let shown = manager().convert_budget(&budget, Currency::Usd);
        assert_eq!(shown.currency, Currency::Usd);
        assert_eq!(shown.total_balance, Money::from_minor(10_000));
        assert_eq!(shown.members[0].income, Money::from_minor(10_000));
    }
}
