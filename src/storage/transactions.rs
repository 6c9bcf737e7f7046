//! Transaction repository (transactions.json)
//!
//! Queries mirror what the pages ask for: equality filters on budget, member,
//! category and kind, newest first, optionally capped.

use chrono::NaiveDate;

use crate::error::BudgetError;
use crate::models::{BudgetId, DateRange, Transaction, TransactionKind, UserId};

use super::collection::Collection;

pub type TransactionRepository = Collection<Transaction>;

/// Equality query over a budget's transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub budget_id: Option<BudgetId>,
    pub user_id: Option<UserId>,
    pub category: Option<String>,
    pub kind: Option<TransactionKind>,
    pub range: Option<DateRange>,
    pub limit: Option<usize>,
}

impl TransactionQuery {
    pub fn for_budget(budget_id: BudgetId) -> Self {
        Self {
            budget_id: Some(budget_id),
            ..Self::default()
        }
    }

    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        self.budget_id.map_or(true, |b| txn.budget_id == b)
            && self.user_id.map_or(true, |u| txn.user_id == u)
            && self.kind.map_or(true, |k| txn.kind == k)
            && self
                .category
                .as_deref()
                .map_or(true, |c| txn.category.eq_ignore_ascii_case(c))
            && self.range.map_or(true, |r| r.contains(txn.date))
    }
}

impl Collection<Transaction> {
    /// Run a query; results are ordered by entry time, newest first
    pub fn query(&self, query: &TransactionQuery) -> Result<Vec<Transaction>, BudgetError> {
        let mut transactions = self.filter(|t| query.matches(t))?;
        if let Some(limit) = query.limit {
            transactions.truncate(limit);
        }
        Ok(transactions)
    }

    /// Transactions of a budget ordered by booking date, newest first
    pub fn by_date(&self, budget_id: BudgetId) -> Result<Vec<Transaction>, BudgetError> {
        let mut transactions = self.filter(|t| t.budget_id == budget_id)?;
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(transactions)
    }

    /// Number of transactions in a budget using a category
    pub fn count_for_category(
        &self,
        budget_id: BudgetId,
        category: &str,
    ) -> Result<usize, BudgetError> {
        Ok(self
            .query(&TransactionQuery::for_budget(budget_id).category(category))?
            .len())
    }

    /// Dates a budget has transactions on, newest first
    pub fn dates(&self, budget_id: BudgetId) -> Result<Vec<NaiveDate>, BudgetError> {
        let mut dates: Vec<_> = self
            .filter(|t| t.budget_id == budget_id)?
            .into_iter()
            .map(|t| t.date)
            .collect();
        dates.sort_by(|a, b| b.cmp(a));
        dates.dedup();
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn txn(
        budget: BudgetId,
        user: UserId,
        kind: TransactionKind,
        category: &str,
        date: NaiveDate,
        age_minutes: i64,
    ) -> Transaction {
        let mut t = Transaction::new(
            budget,
            user,
            "Anna",
            kind,
            Money::from_minor(100),
            category,
            date,
            user,
        );
        t.created_at = Utc::now() - Duration::minutes(age_minutes);
        t
    }

    fn repo_with_data() -> (TempDir, TransactionRepository, BudgetId, UserId, UserId) {
        let temp_dir = TempDir::new().unwrap();
        let repo = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        let budget = BudgetId::new();
        let anna = UserId::new();
        let bob = UserId::new();

        use TransactionKind::*;
        repo.upsert(txn(budget, anna, Expense, "Groceries", day(1), 30)).unwrap();
        repo.upsert(txn(budget, bob, Expense, "Transport", day(2), 20)).unwrap();
        repo.upsert(txn(budget, anna, Income, "Salary", day(3), 10)).unwrap();
        repo.upsert(txn(BudgetId::new(), anna, Expense, "Groceries", day(3), 5))
            .unwrap();

        (temp_dir, repo, budget, anna, bob)
    }

    #[test]
    fn test_query_filters_and_orders() {
        let (_dir, repo, budget, anna, bob) = repo_with_data();

        let all = repo.query(&TransactionQuery::for_budget(budget)).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].category, "Salary");

        let annas = repo
            .query(&TransactionQuery::for_budget(budget).user(anna))
            .unwrap();
        assert_eq!(annas.len(), 2);

        let bobs_expenses = repo
            .query(
                &TransactionQuery::for_budget(budget)
                    .user(bob)
                    .kind(TransactionKind::Expense),
            )
            .unwrap();
        assert_eq!(bobs_expenses.len(), 1);

        let groceries = repo
            .query(&TransactionQuery::for_budget(budget).category("groceries"))
            .unwrap();
        assert_eq!(groceries.len(), 1);
    }

    #[test]
    fn test_query_limit_and_range() {
        let (_dir, repo, budget, _, _) = repo_with_data();

        let latest = repo
            .query(&TransactionQuery::for_budget(budget).limit(1))
            .unwrap();
        assert_eq!(latest.len(), 1);

        let early = repo
            .query(&TransactionQuery::for_budget(budget).range(DateRange::new(day(1), day(2))))
            .unwrap();
        assert_eq!(early.len(), 2);
    }

    #[test]
    fn test_category_count_and_dates() {
        let (_dir, repo, budget, _, _) = repo_with_data();
        assert_eq!(repo.count_for_category(budget, "Groceries").unwrap(), 1);
        assert_eq!(repo.dates(budget).unwrap(), vec![day(3), day(2), day(1)]);
        assert_eq!(repo.by_date(budget).unwrap()[0].date, day(3));
    }
}
