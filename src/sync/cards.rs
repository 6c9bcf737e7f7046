//! Member cards as the home page shows them

use crate::currency::CurrencyManager;
use crate::display::format::initials;
use crate::models::{Currency, MemberRole, Money, UserId};

use super::state::LiveState;

/// One member card, converted to the display currency
#[derive(Debug, Clone, PartialEq)]
pub struct MemberCard {
    pub user_id: UserId,
    pub name: String,
    pub initials: String,
    pub role: MemberRole,
    /// Converted balance, for coloring
    pub balance: Money,
    pub balance_text: String,
    pub income_text: String,
    pub expenses_text: String,
}

impl MemberCard {
    pub fn is_negative(&self) -> bool {
        self.balance.is_negative()
    }
}

impl LiveState {
    /// Cards for every member in the display currency
    pub fn member_cards(&self, currency: &CurrencyManager, display: Currency) -> Vec<MemberCard> {
        let Some(budget) = self.budget() else {
            return Vec::new();
        };
        let from = budget.currency;
        budget
            .members
            .iter()
            .map(|m| {
                let balance = currency.convert(m.balance, from, display);
                MemberCard {
                    user_id: m.user_id,
                    name: m.name.clone(),
                    initials: initials(&m.name),
                    role: m.role,
                    balance,
                    balance_text: currency.format(balance, display),
                    income_text: currency.format(currency.convert(m.income, from, display), display),
                    expenses_text: currency.format(currency.convert(m.expenses, from, display), display),
                }
            })
            .collect()
    }

    /// Budget total in the display currency
    pub fn total_balance_text(&self, currency: &CurrencyManager, display: Currency) -> String {
        let from = self.budget().map(|b| b.currency).unwrap_or(display);
        currency.format(currency.convert(self.total_balance(), from, display), display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Budget, MemberDelta, TransactionKind, User};
    use chrono::Duration;

    #[test]
    fn test_cards_are_converted_and_formatted() {
        let anna = User::new("anna@example.com", "Anna Nowak", "h");
        let mut budget = Budget::new("Home", &anna, Currency::Pln);
        budget.apply_delta(
            anna.id,
            MemberDelta::for_transaction(TransactionKind::Expense, Money::from_minor(40_000)),
        );

        let mut live = LiveState::new(budget.id);
        live.apply_budget(Some(budget));
        let manager = CurrencyManager::new(Currency::Usd, Duration::hours(1));

        let cards = live.member_cards(&manager, Currency::Usd);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].initials, "AN");
        assert_eq!(cards[0].balance_text, "-$100.00");
        assert_eq!(cards[0].expenses_text, "$100.00");
        assert!(cards[0].is_negative());

        assert_eq!(live.total_balance_text(&manager, Currency::Pln), "-400,00 zł");
    }
}
