//! Transaction service
//!
//! Every write here touches two documents: the transaction itself and the
//! member card it belongs to. Both go into one batch so the member totals and
//! the budget total always match the transaction collection.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    Budget, BudgetId, LimitStatus, LimitUsage, Money, Transaction, TransactionId,
    TransactionKind, User, UserId,
};
use crate::storage::{Storage, TransactionQuery};
use crate::validation::{sanitize_input, validate_amount, validate_description, validate_transaction_date};

use super::limit::LimitService;
use super::{require_member, today};

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub user_id: Option<UserId>,
    pub category: Option<String>,
    pub kind: Option<TransactionKind>,
    /// Exact booking date
    pub date: Option<NaiveDate>,
    /// Text searched in description and category
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
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

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Input for recording a transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Member the money belongs to
    pub member: UserId,
    pub kind: TransactionKind,
    pub amount: Money,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
}

/// Fields of a transaction that can be edited
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub member: Option<UserId>,
    pub kind: Option<TransactionKind>,
    pub amount: Option<Money>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.member.is_none()
            && self.kind.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.date.is_none()
    }
}

/// A recorded transaction and the limits it pushed past a threshold
#[derive(Debug, Clone)]
pub struct RecordedTransaction {
    pub transaction: Transaction,
    pub alerts: Vec<LimitUsage>,
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a transaction and update the member's totals in one batch
    pub fn add_transaction(
        &self,
        budget_id: BudgetId,
        actor: &User,
        input: NewTransaction,
    ) -> BudgetResult<RecordedTransaction> {
        let budget = require_member(self.storage, budget_id, actor)?;
        let txn = self.build(&budget, actor, input)?;

        let mut batch = self.storage.batch();
        batch
            .set_transaction(txn.clone())
            .adjust_member(budget_id, txn.user_id, txn.delta())
            .audit(create_entry(&txn, actor));
        batch.commit()?;

        info!(
            budget = %budget_id,
            kind = %txn.kind,
            amount = %txn.amount,
            "transaction recorded"
        );

        let alerts = self.alerts_for(&[&txn])?;
        Ok(RecordedTransaction {
            transaction: txn,
            alerts,
        })
    }

    /// Record several transactions in one batch
    pub fn add_multiple(
        &self,
        budget_id: BudgetId,
        actor: &User,
        inputs: Vec<NewTransaction>,
    ) -> BudgetResult<Vec<Transaction>> {
        let budget = require_member(self.storage, budget_id, actor)?;
        let transactions = inputs
            .into_iter()
            .map(|input| self.build(&budget, actor, input))
            .collect::<BudgetResult<Vec<_>>>()?;

        let mut batch = self.storage.batch();
        for txn in &transactions {
            batch
                .set_transaction(txn.clone())
                .adjust_member(budget_id, txn.user_id, txn.delta())
                .audit(create_entry(txn, actor));
        }
        batch.commit()?;

        info!(budget = %budget_id, count = transactions.len(), "transactions recorded");
        Ok(transactions)
    }

    /// Edit a transaction; the old effect is reversed and the new one applied
    pub fn update_transaction(
        &self,
        id: TransactionId,
        actor: &User,
        update: TransactionUpdate,
    ) -> BudgetResult<Transaction> {
        self.storage.refresh_if_changed()?;
        let before = self.storage.transactions.require(id)?;
        let budget = require_member(self.storage, before.budget_id, actor)?;

        let recategorize = update.category.is_some() || update.kind.is_some();
        let mut txn = before.clone();
        if let Some(member) = update.member {
            let card = budget
                .member(member)
                .ok_or_else(|| BudgetError::member_not_found(member.to_string()))?;
            txn.user_id = member;
            txn.user_name = card.name.clone();
        }
        if let Some(kind) = update.kind {
            txn.kind = kind;
        }
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
            txn.amount = amount;
        }
        if let Some(category) = update.category {
            txn.category = category;
        }
        if let Some(description) = update.description {
            let description = sanitize_input(&description);
            validate_description(&description)?;
            txn.description = description;
        }
        if let Some(date) = update.date {
            validate_transaction_date(date, today())?;
            txn.date = date;
        }
        if recategorize {
            txn.category = self.resolve_category(&budget, &txn.category, txn.kind)?;
        }
        if !budget.is_member(txn.user_id) {
            return Err(BudgetError::Validation(format!(
                "{} is no longer a member; assign the transaction to a current member",
                txn.user_name
            )));
        }
        txn.updated_at = Utc::now();

        let mut batch = self.storage.batch();
        if budget.is_member(before.user_id) {
            batch.adjust_member(budget.id, before.user_id, before.delta().reversed());
        }
        batch
            .adjust_member(budget.id, txn.user_id, txn.delta())
            .set_transaction(txn.clone())
            .audit(
                AuditEntry::update(
                    EntityType::Transaction,
                    id.to_string(),
                    Some(txn.category.clone()),
                    &before,
                    &txn,
                )
                .by(&actor.display_name),
            );
        batch.commit()?;

        info!(transaction = %id, "transaction updated");
        Ok(txn)
    }

    /// Delete a transaction and take its effect off the member card
    pub fn delete_transaction(&self, id: TransactionId, actor: &User) -> BudgetResult<Transaction> {
        self.storage.refresh_if_changed()?;
        let txn = self.storage.transactions.require(id)?;
        let budget = require_member(self.storage, txn.budget_id, actor)?;

        let mut batch = self.storage.batch();
        batch.delete_transaction(id);
        if budget.is_member(txn.user_id) {
            batch.adjust_member(budget.id, txn.user_id, txn.delta().reversed());
        } else {
            // the member has left; their card is gone
            debug!(transaction = %id, "deleting transaction of a former member");
            batch.touch_budget(budget.id);
        }
        batch.audit(
            AuditEntry::delete(EntityType::Transaction, id.to_string(), Some(txn.category.clone()), &txn)
                .by(&actor.display_name),
        );
        batch.commit()?;

        info!(transaction = %id, "transaction deleted");
        Ok(txn)
    }

    pub fn get(&self, id: TransactionId) -> BudgetResult<Transaction> {
        self.storage.transactions.require(id)
    }

    /// Resolve a transaction of a budget from a typed id or id prefix
    pub fn find(&self, budget_id: BudgetId, input: &str) -> BudgetResult<Transaction> {
        self.storage
            .transactions
            .find_by_prefix(input, |t| t.budget_id == budget_id)?
            .ok_or_else(|| BudgetError::transaction_not_found(input))
    }

    /// List transactions of a budget, newest first
    pub fn list(&self, budget_id: BudgetId, filter: &TransactionFilter) -> BudgetResult<Vec<Transaction>> {
        let mut query = TransactionQuery::for_budget(budget_id);
        if let Some(user_id) = filter.user_id {
            query = query.user(user_id);
        }
        if let Some(category) = &filter.category {
            query = query.category(category.as_str());
        }
        if let Some(kind) = filter.kind {
            query = query.kind(kind);
        }

        let mut transactions: Vec<Transaction> = self
            .storage
            .transactions
            .query(&query)?
            .into_iter()
            .filter(|t| filter.date.map_or(true, |d| t.date == d))
            .filter(|t| {
                filter
                    .search
                    .as_deref()
                    .map_or(true, |q| t.matches_search(q))
            })
            .collect();

        if let Some(limit) = filter.limit {
            transactions.truncate(limit);
        }
        Ok(transactions)
    }

    /// Limits at or past their warning threshold after these expenses
    fn alerts_for(&self, transactions: &[&Transaction]) -> BudgetResult<Vec<LimitUsage>> {
        let limits = LimitService::new(self.storage);
        let today = today();
        let mut alerts: Vec<LimitUsage> = Vec::new();
        for txn in transactions.iter().filter(|t| t.is_expense()) {
            if alerts.iter().any(|a| a.limit.category.eq_ignore_ascii_case(&txn.category)) {
                continue;
            }
            if let Some(usage) = limits.check_category(txn.budget_id, &txn.category, today)? {
                if usage.status != LimitStatus::Ok {
                    alerts.push(usage);
                }
            }
        }
        Ok(alerts)
    }

    fn build(&self, budget: &Budget, actor: &User, input: NewTransaction) -> BudgetResult<Transaction> {
        validate_amount(input.amount)?;
        validate_transaction_date(input.date, today())?;
        let description = sanitize_input(&input.description);
        validate_description(&description)?;

        let member = budget
            .member(input.member)
            .ok_or_else(|| BudgetError::member_not_found(input.member.to_string()))?;
        let category = self.resolve_category(budget, &input.category, input.kind)?;

        let txn = Transaction::new(
            budget.id,
            member.user_id,
            &member.name,
            input.kind,
            input.amount,
            category,
            input.date,
            actor.id,
        )
        .with_description(description);
        txn.validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;
        Ok(txn)
    }

    /// The canonical name of a budget category matching the kind
    fn resolve_category(&self, budget: &Budget, name: &str, kind: TransactionKind) -> BudgetResult<String> {
        let category = self
            .storage
            .categories
            .find_by_name(budget.id, name)?
            .ok_or_else(|| BudgetError::category_not_found(name.trim()))?;
        if category.kind != kind {
            return Err(BudgetError::Validation(format!(
                "'{}' is an {} category",
                category.name, category.kind
            )));
        }
        Ok(category.name)
    }
}

fn create_entry(txn: &Transaction, actor: &User) -> AuditEntry {
    AuditEntry::create(
        EntityType::Transaction,
        txn.id.to_string(),
        Some(txn.category.clone()),
        txn,
    )
    .by(&actor.display_name)
    .with_summary(format!("{} {} for {}", txn.kind, txn.amount, txn.user_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetPaths;
    use crate::models::{Currency, LimitPeriod};
    use crate::services::BudgetService;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        storage: Storage,
        anna: User,
        bob: User,
        budget_id: BudgetId,
    }

    fn setup() -> Fixture {
        let dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        let anna = User::new("anna@example.com", "Anna", "hash");
        let bob = User::new("bob@example.com", "Bob", "hash");
        storage.users.upsert(anna.clone()).unwrap();
        storage.users.upsert(bob.clone()).unwrap();

        let budgets = BudgetService::new(&storage);
        let budget = budgets.create_budget(&anna, "Home", Currency::Pln).unwrap();
        budgets.join_budget(&bob, &budget.invite_code).unwrap();

        Fixture {
            _dir: dir,
            storage,
            anna,
            bob,
            budget_id: budget.id,
        }
    }

    fn input(member: UserId, kind: TransactionKind, minor: i64, category: &str) -> NewTransaction {
        NewTransaction {
            member,
            kind,
            amount: Money::from_minor(minor),
            category: category.into(),
            description: String::new(),
            date: today(),
        }
    }

    fn budget(f: &Fixture) -> Budget {
        f.storage.budgets.require(f.budget_id).unwrap()
    }

    #[test]
    fn test_add_updates_member_and_total() {
        let f = setup();
        let service = TransactionService::new(&f.storage);

        service
            .add_transaction(f.budget_id, &f.anna, input(f.anna.id, TransactionKind::Income, 500_000, "Salary"))
            .unwrap();
        service
            .add_transaction(f.budget_id, &f.anna, input(f.bob.id, TransactionKind::Expense, 12_000, "groceries"))
            .unwrap();

        let budget = budget(&f);
        let anna = budget.member(f.anna.id).unwrap();
        let bob = budget.member(f.bob.id).unwrap();
        assert_eq!(anna.balance, Money::from_minor(500_000));
        assert_eq!(bob.expenses, Money::from_minor(12_000));
        assert_eq!(bob.balance, Money::from_minor(-12_000));
        assert_eq!(budget.total_balance, Money::from_minor(488_000));
        assert!(budget.totals_consistent());

        let listed = service.list(f.budget_id, &TransactionFilter::new()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].category, "Groceries");
        assert_eq!(listed[0].created_by, f.anna.id);
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let f = setup();
        let service = TransactionService::new(&f.storage);

        let zero = input(f.anna.id, TransactionKind::Income, 0, "Salary");
        assert!(service.add_transaction(f.budget_id, &f.anna, zero).unwrap_err().is_validation());

        let wrong_kind = input(f.anna.id, TransactionKind::Income, 100, "Groceries");
        assert!(service.add_transaction(f.budget_id, &f.anna, wrong_kind).unwrap_err().is_validation());

        let mut future = input(f.anna.id, TransactionKind::Income, 100, "Salary");
        future.date = today() + chrono::Duration::days(2);
        assert!(service.add_transaction(f.budget_id, &f.anna, future).is_err());

        let stranger = input(UserId::new(), TransactionKind::Income, 100, "Salary");
        assert!(service.add_transaction(f.budget_id, &f.anna, stranger).unwrap_err().is_not_found());

        assert!(budget(&f).total_balance.is_zero());
    }

    #[test]
    fn test_delete_reverts_effect() {
        let f = setup();
        let service = TransactionService::new(&f.storage);
        let recorded = service
            .add_transaction(f.budget_id, &f.bob, input(f.bob.id, TransactionKind::Expense, 4_500, "Transport"))
            .unwrap();

        service.delete_transaction(recorded.transaction.id, &f.bob).unwrap();

        let budget = budget(&f);
        assert!(budget.total_balance.is_zero());
        assert!(budget.member(f.bob.id).unwrap().expenses.is_zero());
        assert!(service.get(recorded.transaction.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_kind_amount_and_member() {
        let f = setup();
        let service = TransactionService::new(&f.storage);
        let recorded = service
            .add_transaction(f.budget_id, &f.anna, input(f.anna.id, TransactionKind::Expense, 2_000, "Health"))
            .unwrap();

        let updated = service
            .update_transaction(
                recorded.transaction.id,
                &f.anna,
                TransactionUpdate {
                    member: Some(f.bob.id),
                    kind: Some(TransactionKind::Income),
                    amount: Some(Money::from_minor(3_000)),
                    category: Some("Salary".into()),
                    ..TransactionUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.user_name, "Bob");

        let budget = budget(&f);
        let anna = budget.member(f.anna.id).unwrap();
        let bob = budget.member(f.bob.id).unwrap();
        assert!(anna.expenses.is_zero());
        assert!(anna.balance.is_zero());
        assert_eq!(bob.income, Money::from_minor(3_000));
        assert_eq!(budget.total_balance, Money::from_minor(3_000));
        assert!(budget.totals_consistent());
    }

    #[test]
    fn test_update_with_kind_mismatch_changes_nothing() {
        let f = setup();
        let service = TransactionService::new(&f.storage);
        let recorded = service
            .add_transaction(f.budget_id, &f.anna, input(f.anna.id, TransactionKind::Expense, 2_000, "Health"))
            .unwrap();

        let err = service
            .update_transaction(
                recorded.transaction.id,
                &f.anna,
                TransactionUpdate {
                    kind: Some(TransactionKind::Income),
                    ..TransactionUpdate::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(budget(&f).total_balance, Money::from_minor(-2_000));
    }

    #[test]
    fn test_add_multiple_is_one_batch() {
        let f = setup();
        let service = TransactionService::new(&f.storage);
        let good = input(f.anna.id, TransactionKind::Income, 1_000, "Salary");
        let bad = input(f.anna.id, TransactionKind::Income, 1_000, "Nope");

        assert!(service.add_multiple(f.budget_id, &f.anna, vec![good.clone(), bad]).is_err());
        assert!(service.list(f.budget_id, &TransactionFilter::new()).unwrap().is_empty());

        let added = service
            .add_multiple(f.budget_id, &f.anna, vec![good.clone(), good])
            .unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(budget(&f).total_balance, Money::from_minor(2_000));
    }

    #[test]
    fn test_list_filters() {
        let f = setup();
        let service = TransactionService::new(&f.storage);
        let mut lunch = input(f.anna.id, TransactionKind::Expense, 3_000, "Groceries");
        lunch.description = "Lunch with <b>Bob</b>".into();
        service.add_transaction(f.budget_id, &f.anna, lunch).unwrap();
        service
            .add_transaction(f.budget_id, &f.bob, input(f.bob.id, TransactionKind::Expense, 900, "Transport"))
            .unwrap();
        service
            .add_transaction(f.budget_id, &f.bob, input(f.bob.id, TransactionKind::Income, 9_000, "Salary"))
            .unwrap();

        let by_bob = service.list(f.budget_id, &TransactionFilter::new().user(f.bob.id)).unwrap();
        assert_eq!(by_bob.len(), 2);

        let expenses = service
            .list(f.budget_id, &TransactionFilter::new().kind(TransactionKind::Expense).limit(1))
            .unwrap();
        assert_eq!(expenses.len(), 1);

        let found = service.list(f.budget_id, &TransactionFilter::new().search("LUNCH")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, "Lunch with bBob/b");

        let dated = service
            .list(f.budget_id, &TransactionFilter::new().date(today() - chrono::Duration::days(1)))
            .unwrap();
        assert!(dated.is_empty());
    }

    #[test]
    fn test_expense_returns_limit_alerts() {
        let f = setup();
        LimitService::new(&f.storage)
            .set(f.budget_id, &f.anna, "Entertainment", Money::from_minor(10_000), LimitPeriod::Daily)
            .unwrap();
        let service = TransactionService::new(&f.storage);

        let first = service
            .add_transaction(f.budget_id, &f.anna, input(f.anna.id, TransactionKind::Expense, 5_000, "Entertainment"))
            .unwrap();
        assert!(first.alerts.is_empty());

        let second = service
            .add_transaction(f.budget_id, &f.anna, input(f.anna.id, TransactionKind::Expense, 6_000, "Entertainment"))
            .unwrap();
        assert_eq!(second.alerts.len(), 1);
        assert_eq!(second.alerts[0].status, LimitStatus::Exceeded);
    }

    #[test]
    fn test_non_member_cannot_write() {
        let f = setup();
        let service = TransactionService::new(&f.storage);
        let zed = User::new("zed@example.com", "Zed", "hash");
        let err = service
            .add_transaction(f.budget_id, &zed, input(f.anna.id, TransactionKind::Income, 100, "Salary"))
            .unwrap_err();
        assert!(matches!(err, BudgetError::Forbidden(_)));
    }
}
