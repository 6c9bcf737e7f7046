//! Budget service
//!
//! Creating, joining and leaving shared budgets, plus repair of the member
//! totals when they drift from the transaction collection.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    budget::normalize_invite_code, Budget, BudgetId, Currency, DefaultCategory, MemberDelta,
    Money, User, UserId, MAX_MEMBERS,
};
use crate::storage::{Storage, TransactionQuery};
use crate::validation::validate_invite_code;

use super::require_member;

/// Name of the budget created for a user who has none
pub const DEFAULT_BUDGET_NAME: &str = "Family budget";

const BUDGET_NAME_MAX: usize = 100;

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
}

/// Fields of a budget a member may change
#[derive(Debug, Clone, Default)]
pub struct BudgetUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub currency: Option<Currency>,
}

/// What to tell someone you want to invite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteInfo {
    pub budget_name: String,
    pub invite_code: String,
    pub members: usize,
    pub open_slots: usize,
}

impl InviteInfo {
    pub fn can_invite(&self) -> bool {
        self.open_slots > 0
    }
}

/// Outcome of [`BudgetService::recalculate_balances`]
#[derive(Debug, Clone)]
pub struct RecalcReport {
    pub budget: Budget,
    /// Members whose stored totals did not match their transactions
    pub corrected: Vec<UserId>,
}

impl<'a> BudgetService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a budget owned by `owner`, seeded with the default categories
    pub fn create_budget(&self, owner: &User, name: &str, currency: Currency) -> BudgetResult<Budget> {
        let name = validate_budget_name(name)?;
        let budget = Budget::new(name, owner, currency);

        let mut batch = self.storage.batch();
        batch.set_budget(budget.clone());
        for default in DefaultCategory::all() {
            batch.set_category(default.to_category(budget.id).created_by(owner.id));
        }
        batch.audit(
            AuditEntry::create(EntityType::Budget, budget.id.to_string(), Some(budget.name.clone()), &budget)
                .by(&owner.display_name),
        );
        batch.commit()?;

        info!(budget = %budget.id, name = %budget.name, "budget created");
        Ok(budget)
    }

    pub fn get_budget(&self, id: BudgetId) -> BudgetResult<Budget> {
        self.storage.budgets.require(id)
    }

    /// A budget the user belongs to
    pub fn get_for_member(&self, id: BudgetId, user: &User) -> BudgetResult<Budget> {
        require_member(self.storage, id, user)
    }

    /// Budgets the user belongs to, most recently updated first
    pub fn get_user_budgets(&self, user_id: UserId) -> BudgetResult<Vec<Budget>> {
        self.storage.budgets.find_by_member(user_id)
    }

    /// Find one of the user's budgets by id prefix or name
    pub fn find_for_member(&self, user: &User, input: &str) -> BudgetResult<Budget> {
        if let Some(budget) = self
            .storage
            .budgets
            .find_by_prefix(input, |b| b.is_member(user.id))?
        {
            return Ok(budget);
        }
        self.get_user_budgets(user.id)?
            .into_iter()
            .find(|b| b.name.eq_ignore_ascii_case(input.trim()))
            .ok_or_else(|| BudgetError::budget_not_found(input))
    }

    /// The user's most recent budget, or a new one if they have none
    pub fn load_or_create(&self, user: &User) -> BudgetResult<Budget> {
        if let Some(budget) = self.get_user_budgets(user.id)?.into_iter().next() {
            return Ok(budget);
        }
        self.create_budget(user, DEFAULT_BUDGET_NAME, Currency::default())
    }

    pub fn update_budget(&self, id: BudgetId, user: &User, update: BudgetUpdate) -> BudgetResult<Budget> {
        self.storage.refresh_if_changed()?;
        let before = require_member(self.storage, id, user)?;

        let name = update.name.as_deref().map(validate_budget_name).transpose()?;
        let description = update.description.map(|d| d.trim().to_string());
        if let Some(currency) = update.currency {
            if currency != before.currency && !before.is_owner(user.id) {
                return Err(BudgetError::Forbidden(
                    "Only the owner can change the budget currency".into(),
                ));
            }
        }

        let mut batch = self.storage.batch();
        batch.update_budget(id, name, description, update.currency);
        batch.commit()?;

        let budget = self.storage.budgets.require(id)?;
        self.record(
            AuditEntry::update(
                EntityType::Budget,
                budget.id.to_string(),
                Some(budget.name.clone()),
                &before,
                &budget,
            )
            .by(&user.display_name),
        );
        Ok(budget)
    }

    /// Join a budget with its invite code
    ///
    /// Someone rejoining gets a card that already carries the transactions
    /// they booked before they left.
    pub fn join_budget(&self, user: &User, invite_code: &str) -> BudgetResult<Budget> {
        validate_invite_code(invite_code)?;
        self.storage.refresh_if_changed()?;

        let code = normalize_invite_code(invite_code);
        let found = self
            .storage
            .budgets
            .find_by_invite_code(&code)?
            .ok_or_else(|| BudgetError::budget_not_found(code.clone()))?;

        let opening = self.booked_by(found.id, user.id)?;

        let mut batch = self.storage.batch();
        batch.add_member(found.id, user.clone(), opening);
        batch.commit()?;

        let budget = self.storage.budgets.require(found.id)?;
        self.record(
            AuditEntry::create(
                EntityType::Member,
                user.id.to_string(),
                Some(user.display_name.clone()),
                &budget.member(user.id),
            )
            .by(&user.display_name)
            .with_summary(format!("joined '{}'", budget.name)),
        );

        info!(budget = %budget.id, user = %user.id, "member joined");
        Ok(budget)
    }

    /// Leave a budget; the owner cannot leave their own budget
    pub fn leave_budget(&self, id: BudgetId, user: &User) -> BudgetResult<Budget> {
        self.storage.refresh_if_changed()?;
        let before = require_member(self.storage, id, user)?;
        let member = before
            .clone()
            .remove_member(user.id)
            .map_err(|e| BudgetError::membership(&before.name, e))?;

        let mut batch = self.storage.batch();
        batch.remove_member(id, user.id);
        batch.commit()?;

        let budget = self.storage.budgets.require(id)?;
        self.record(
            AuditEntry::delete(
                EntityType::Member,
                user.id.to_string(),
                Some(member.name.clone()),
                &member,
            )
            .by(&user.display_name)
            .with_summary(format!("left '{}'", budget.name)),
        );

        info!(budget = %budget.id, user = %user.id, "member left");
        Ok(budget)
    }

    /// Combined effect of every transaction booked for `user_id` in a budget
    fn booked_by(&self, budget_id: BudgetId, user_id: UserId) -> BudgetResult<MemberDelta> {
        Ok(self
            .storage
            .transactions
            .query(&TransactionQuery::for_budget(budget_id).user(user_id))?
            .iter()
            .fold(MemberDelta::default(), |sum, txn| sum + txn.delta()))
    }

    fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.storage.audit().log(&entry) {
            warn!(error = %e, "failed to write operation history");
        }
    }

    pub fn invite_info(&self, id: BudgetId, user: &User) -> BudgetResult<InviteInfo> {
        let budget = require_member(self.storage, id, user)?;
        Ok(InviteInfo {
            budget_name: budget.name.clone(),
            invite_code: budget.invite_code.clone(),
            members: budget.members.len(),
            open_slots: budget.open_slots(),
        })
    }

    /// Rebuild member totals from the budget's transactions
    ///
    /// Only writes when something was off.
    pub fn recalculate_balances(&self, id: BudgetId) -> BudgetResult<RecalcReport> {
        self.storage.refresh_if_changed()?;
        let before = self.storage.budgets.require(id)?;

        let mut totals: HashMap<UserId, MemberDelta> = HashMap::new();
        for txn in self.storage.transactions.query(&TransactionQuery::for_budget(id))? {
            let entry = totals.entry(txn.user_id).or_default();
            *entry = *entry + txn.delta();
        }

        let mut budget = before.clone();
        let mut corrected = Vec::new();
        for member in &mut budget.members {
            let expected = totals.get(&member.user_id).copied().unwrap_or_default();
            let balance = expected.income - expected.expenses;
            if member.income != expected.income
                || member.expenses != expected.expenses
                || member.balance != balance
            {
                member.income = expected.income;
                member.expenses = expected.expenses;
                member.balance = balance;
                corrected.push(member.user_id);
            }
        }
        let total: Money = budget.members_balance();
        let total_drifted = budget.total_balance != total;
        budget.total_balance = total;

        if corrected.is_empty() && !total_drifted {
            return Ok(RecalcReport { budget, corrected });
        }

        warn!(budget = %id, members = corrected.len(), "member totals drifted, repairing");
        budget.touch();
        let mut batch = self.storage.batch();
        batch.set_budget(budget.clone()).audit(
            AuditEntry::update(EntityType::Budget, id.to_string(), Some(budget.name.clone()), &before, &budget)
                .with_summary("balances recalculated"),
        );
        batch.commit()?;

        Ok(RecalcReport { budget, corrected })
    }

    /// Number of members allowed per budget
    pub fn max_members(&self) -> usize {
        MAX_MEMBERS
    }
}

fn validate_budget_name(name: &str) -> BudgetResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BudgetError::Validation("Budget name cannot be empty".into()));
    }
    if name.chars().count() > BUDGET_NAME_MAX {
        return Err(BudgetError::Validation(format!(
            "Budget name cannot be longer than {} characters",
            BUDGET_NAME_MAX
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetPaths;
    use crate::models::{Transaction, TransactionKind};
    use crate::services::{NewTransaction, TransactionService};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn user(storage: &Storage, name: &str) -> User {
        let user = User::new(format!("{}@example.com", name.to_lowercase()), name, "hash");
        storage.users.upsert(user.clone()).unwrap();
        user
    }

    #[test]
    fn test_create_seeds_default_categories() {
        let (_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let anna = user(&storage, "Anna");

        let budget = service.create_budget(&anna, "  Home ", Currency::Eur).unwrap();
        assert_eq!(budget.name, "Home");
        assert_eq!(budget.members.len(), 1);
        assert!(budget.is_owner(anna.id));

        let categories = storage.categories.for_budget(budget.id).unwrap();
        assert_eq!(categories.len(), DefaultCategory::all().len());

        assert!(service.create_budget(&anna, "   ", Currency::Pln).unwrap_err().is_validation());
    }

    #[test]
    fn test_load_or_create() {
        let (_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let anna = user(&storage, "Anna");

        let first = service.load_or_create(&anna).unwrap();
        assert_eq!(first.name, DEFAULT_BUDGET_NAME);
        let again = service.load_or_create(&anna).unwrap();
        assert_eq!(first.id, again.id);
    }

    #[test]
    fn test_join_rules() {
        let (_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let anna = user(&storage, "Anna");
        let budget = service.create_budget(&anna, "Home", Currency::Pln).unwrap();

        let err = service.join_budget(&anna, &budget.invite_code).unwrap_err();
        assert!(matches!(err, BudgetError::AlreadyMember(_)));

        for name in ["Bob", "Cleo", "Dan"] {
            let member = user(&storage, name);
            let code = budget.invite_code.to_lowercase();
            let joined = service.join_budget(&member, &code).unwrap();
            assert!(joined.is_member(member.id));
        }

        let eve = user(&storage, "Eve");
        let err = service.join_budget(&eve, &budget.invite_code).unwrap_err();
        assert!(matches!(err, BudgetError::BudgetFull { max: 4, .. }));

        let err = service.join_budget(&eve, "ZZZZ9999").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_leave_and_owner_cannot_leave() {
        let (_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let anna = user(&storage, "Anna");
        let bob = user(&storage, "Bob");
        let budget = service.create_budget(&anna, "Home", Currency::Pln).unwrap();
        service.join_budget(&bob, &budget.invite_code).unwrap();

        let after = service.leave_budget(budget.id, &bob).unwrap();
        assert!(!after.is_member(bob.id));
        assert!(service.get_user_budgets(bob.id).unwrap().is_empty());

        let err = service.leave_budget(budget.id, &anna).unwrap_err();
        assert!(matches!(err, BudgetError::Forbidden(_)));
    }

    #[test]
    fn test_rejoin_restores_earlier_bookings() {
        let (_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let anna = user(&storage, "Anna");
        let bob = user(&storage, "Bob");
        let budget = service.create_budget(&anna, "Home", Currency::Pln).unwrap();
        service.join_budget(&bob, &budget.invite_code).unwrap();

        let recorded = TransactionService::new(&storage)
            .add_transaction(
                budget.id,
                &bob,
                NewTransaction {
                    member: bob.id,
                    kind: TransactionKind::Income,
                    amount: Money::from_minor(5_000),
                    category: "Salary".into(),
                    description: String::new(),
                    date: crate::services::today(),
                },
            )
            .unwrap();

        let left = service.leave_budget(budget.id, &bob).unwrap();
        assert!(left.total_balance.is_zero());

        let rejoined = service.join_budget(&bob, &budget.invite_code).unwrap();
        let card = rejoined.member(bob.id).unwrap();
        assert_eq!(card.income, Money::from_minor(5_000));
        assert_eq!(rejoined.total_balance, Money::from_minor(5_000));
        assert!(rejoined.totals_consistent());

        let report = service.recalculate_balances(budget.id).unwrap();
        assert!(report.corrected.is_empty());

        // reversing a booking from the first membership keeps the card at zero
        TransactionService::new(&storage)
            .delete_transaction(recorded.transaction.id, &bob)
            .unwrap();
        let after = service.get_budget(budget.id).unwrap();
        assert!(after.member(bob.id).unwrap().balance.is_zero());
    }

    #[test]
    fn test_only_owner_changes_currency() {
        let (_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let anna = user(&storage, "Anna");
        let bob = user(&storage, "Bob");
        let budget = service.create_budget(&anna, "Home", Currency::Pln).unwrap();
        service.join_budget(&bob, &budget.invite_code).unwrap();

        let renamed = service
            .update_budget(
                budget.id,
                &bob,
                BudgetUpdate {
                    name: Some("Our home".into()),
                    ..BudgetUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Our home");

        let err = service
            .update_budget(
                budget.id,
                &bob,
                BudgetUpdate {
                    currency: Some(Currency::Usd),
                    ..BudgetUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, BudgetError::Forbidden(_)));
    }

    #[test]
    fn test_recalculate_repairs_drift() {
        let (_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let anna = user(&storage, "Anna");
        let budget = service.create_budget(&anna, "Home", Currency::Pln).unwrap();

        // a transaction written without the member increment
        let txn = Transaction::new(
            budget.id,
            anna.id,
            "Anna",
            TransactionKind::Income,
            Money::from_minor(10_000),
            "Salary",
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            anna.id,
        );
        let mut batch = storage.batch();
        batch.set_transaction(txn);
        batch.commit().unwrap();

        let report = service.recalculate_balances(budget.id).unwrap();
        assert_eq!(report.corrected, vec![anna.id]);
        assert_eq!(report.budget.total_balance, Money::from_minor(10_000));
        assert!(report.budget.totals_consistent());

        let again = service.recalculate_balances(budget.id).unwrap();
        assert!(again.corrected.is_empty());
    }

    #[test]
    fn test_invite_info() {
        let (_dir, storage) = create_test_storage();
        let service = BudgetService::new(&storage);
        let anna = user(&storage, "Anna");
        let budget = service.create_budget(&anna, "Home", Currency::Pln).unwrap();

        let info = service.invite_info(budget.id, &anna).unwrap();
        assert_eq!(info.open_slots, 3);
        assert!(info.can_invite());

        let stranger = user(&storage, "Zed");
        assert!(service.invite_info(budget.id, &stranger).is_err());
    }
}
