//! Atomic multi-document writes
//!
//! A [`WriteBatch`] stages sets, deletes and member-total increments across
//! collections. [`WriteBatch::commit`] first picks up anything other family
//! members wrote, applies every operation in memory, and only then saves the
//! touched collections. If any operation or save fails, every touched
//! collection is put back the way it was. Subscribers hear about the result
//! after the commit succeeded.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::audit::AuditEntry;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    Budget, BudgetId, Category, CategoryId, Currency, Goal, GoalId, Limit, LimitId, MemberDelta,
    Money, Transaction, TransactionId, User, UserId,
};

use super::collection::{Collection, CollectionSnapshot, Document};
use super::feed::Topic;
use super::Storage;

/// One staged write
#[derive(Debug, Clone)]
pub enum BatchOp {
    SetUser(User),
    SetBudget(Budget),
    /// Change budget fields on the freshest copy, leaving member cards alone
    UpdateBudget {
        id: BudgetId,
        name: Option<String>,
        description: Option<String>,
        currency: Option<Currency>,
    },
    /// Add a member whose card opens with `opening`, the effect of
    /// transactions they booked during an earlier membership
    AddMember {
        budget_id: BudgetId,
        user: User,
        opening: MemberDelta,
    },
    RemoveMember {
        budget_id: BudgetId,
        user_id: UserId,
    },
    /// Change the name shown on a member card
    RenameMember {
        budget_id: BudgetId,
        user_id: UserId,
        name: String,
    },
    DeleteBudget(BudgetId),
    /// Bump a budget's `updated_at`
    TouchBudget(BudgetId),
    /// Increment a member's income/expense totals and the budget total
    AdjustMember {
        budget_id: BudgetId,
        user_id: UserId,
        delta: MemberDelta,
    },
    SetTransaction(Transaction),
    DeleteTransaction(TransactionId),
    SetCategory(Category),
    DeleteCategory(CategoryId),
    SetGoal(Goal),
    /// Raise a goal's saved amount, completing it at the target
    ContributeGoal {
        id: GoalId,
        amount: Money,
    },
    DeleteGoal(GoalId),
    SetLimit(Limit),
    DeleteLimit(LimitId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CollectionKind {
    Users,
    Budgets,
    Transactions,
    Categories,
    Goals,
    Limits,
}

impl BatchOp {
    fn collection(&self) -> CollectionKind {
        match self {
            BatchOp::SetUser(_) => CollectionKind::Users,
            BatchOp::SetBudget(_)
            | BatchOp::UpdateBudget { .. }
            | BatchOp::AddMember { .. }
            | BatchOp::RemoveMember { .. }
            | BatchOp::RenameMember { .. }
            | BatchOp::DeleteBudget(_)
            | BatchOp::TouchBudget(_)
            | BatchOp::AdjustMember { .. } => CollectionKind::Budgets,
            BatchOp::SetTransaction(_) | BatchOp::DeleteTransaction(_) => {
                CollectionKind::Transactions
            }
            BatchOp::SetCategory(_) | BatchOp::DeleteCategory(_) => CollectionKind::Categories,
            BatchOp::SetGoal(_) | BatchOp::ContributeGoal { .. } | BatchOp::DeleteGoal(_) => {
                CollectionKind::Goals
            }
            BatchOp::SetLimit(_) | BatchOp::DeleteLimit(_) => CollectionKind::Limits,
        }
    }
}

/// What a successful commit changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub operations: usize,
    pub topics: Vec<Topic>,
}

#[must_use = "a batch does nothing until committed"]
pub struct WriteBatch<'a> {
    storage: &'a Storage,
    ops: Vec<BatchOp>,
    audit: Vec<AuditEntry>,
}

impl<'a> WriteBatch<'a> {
    pub(super) fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            ops: Vec::new(),
            audit: Vec::new(),
        }
    }

    pub fn push(&mut self, op: BatchOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn set_user(&mut self, user: User) -> &mut Self {
        self.push(BatchOp::SetUser(user))
    }

    pub fn set_budget(&mut self, budget: Budget) -> &mut Self {
        self.push(BatchOp::SetBudget(budget))
    }

    pub fn update_budget(
        &mut self,
        id: BudgetId,
        name: Option<String>,
        description: Option<String>,
        currency: Option<Currency>,
    ) -> &mut Self {
        self.push(BatchOp::UpdateBudget {
            id,
            name,
            description,
            currency,
        })
    }

    pub fn add_member(&mut self, budget_id: BudgetId, user: User, opening: MemberDelta) -> &mut Self {
        self.push(BatchOp::AddMember {
            budget_id,
            user,
            opening,
        })
    }

    pub fn remove_member(&mut self, budget_id: BudgetId, user_id: UserId) -> &mut Self {
        self.push(BatchOp::RemoveMember { budget_id, user_id })
    }

    pub fn rename_member(&mut self, budget_id: BudgetId, user_id: UserId, name: impl Into<String>) -> &mut Self {
        self.push(BatchOp::RenameMember {
            budget_id,
            user_id,
            name: name.into(),
        })
    }

    pub fn delete_budget(&mut self, id: BudgetId) -> &mut Self {
        self.push(BatchOp::DeleteBudget(id))
    }

    pub fn touch_budget(&mut self, id: BudgetId) -> &mut Self {
        self.push(BatchOp::TouchBudget(id))
    }

    pub fn adjust_member(
        &mut self,
        budget_id: BudgetId,
        user_id: UserId,
        delta: MemberDelta,
    ) -> &mut Self {
        self.push(BatchOp::AdjustMember {
            budget_id,
            user_id,
            delta,
        })
    }

    pub fn set_transaction(&mut self, txn: Transaction) -> &mut Self {
        self.push(BatchOp::SetTransaction(txn))
    }

    pub fn delete_transaction(&mut self, id: TransactionId) -> &mut Self {
        self.push(BatchOp::DeleteTransaction(id))
    }

    pub fn set_category(&mut self, category: Category) -> &mut Self {
        self.push(BatchOp::SetCategory(category))
    }

    pub fn delete_category(&mut self, id: CategoryId) -> &mut Self {
        self.push(BatchOp::DeleteCategory(id))
    }

    pub fn set_goal(&mut self, goal: Goal) -> &mut Self {
        self.push(BatchOp::SetGoal(goal))
    }

    pub fn contribute_goal(&mut self, id: GoalId, amount: Money) -> &mut Self {
        self.push(BatchOp::ContributeGoal { id, amount })
    }

    pub fn delete_goal(&mut self, id: GoalId) -> &mut Self {
        self.push(BatchOp::DeleteGoal(id))
    }

    pub fn set_limit(&mut self, limit: Limit) -> &mut Self {
        self.push(BatchOp::SetLimit(limit))
    }

    pub fn delete_limit(&mut self, id: LimitId) -> &mut Self {
        self.push(BatchOp::DeleteLimit(id))
    }

    /// Record an operation-history entry written after a successful commit
    pub fn audit(&mut self, entry: AuditEntry) -> &mut Self {
        self.audit.push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply all staged operations atomically
    pub fn commit(self) -> BudgetResult<CommitSummary> {
        if self.ops.is_empty() {
            return Ok(CommitSummary::default());
        }

        let storage = self.storage;
        storage.refresh_if_changed()?;

        let touched: BTreeSet<CollectionKind> = self.ops.iter().map(BatchOp::collection).collect();
        let snapshots = Snapshots::take(storage, &touched)?;

        let mut topics = BTreeSet::new();
        for op in &self.ops {
            if let Err(e) = apply(storage, op, &mut topics) {
                snapshots.restore(storage)?;
                return Err(e);
            }
        }

        let mut saved = Vec::new();
        for kind in &touched {
            if let Err(e) = save(storage, *kind) {
                warn!(error = %e, "batch save failed, rolling back");
                snapshots.restore(storage)?;
                for kind in saved {
                    if let Err(e) = save(storage, kind) {
                        warn!(error = %e, "failed to restore collection on disk");
                    }
                }
                return Err(e);
            }
            saved.push(*kind);
        }

        if let Err(e) = storage.audit().log_batch(&self.audit) {
            warn!(error = %e, "failed to write operation history");
        }

        let topics: Vec<Topic> = topics.into_iter().map(|t: TopicKey| t.0).collect();
        for topic in &topics {
            // the write is already durable
            if let Err(e) = storage.publish(*topic) {
                warn!(error = %e, ?topic, "failed to publish change");
            }
        }

        info!(operations = self.ops.len(), topics = topics.len(), "batch committed");
        Ok(CommitSummary {
            operations: self.ops.len(),
            topics,
        })
    }
}

/// Ordered wrapper so topics are published deterministically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TopicKey(Topic);

impl TopicKey {
    fn rank(&self) -> (u8, uuid::Uuid) {
        match self.0 {
            Topic::Budget(id) => (0, *id.as_uuid()),
            Topic::Transactions(id) => (1, *id.as_uuid()),
            Topic::Categories(id) => (2, *id.as_uuid()),
        }
    }
}

impl PartialOrd for TopicKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TopicKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

fn apply(storage: &Storage, op: &BatchOp, topics: &mut BTreeSet<TopicKey>) -> BudgetResult<()> {
    match op {
        BatchOp::SetUser(user) => storage.users.upsert(user.clone()),
        BatchOp::SetBudget(budget) => {
            topics.insert(TopicKey(Topic::Budget(budget.id)));
            storage.budgets.upsert(budget.clone())
        }
        BatchOp::UpdateBudget {
            id,
            name,
            description,
            currency,
        } => {
            let mut budget = storage.budgets.require(*id)?;
            if let Some(name) = name {
                budget.name = name.clone();
            }
            if let Some(description) = description {
                budget.description = description.clone();
            }
            if let Some(currency) = currency {
                budget.currency = *currency;
            }
            budget.touch();
            topics.insert(TopicKey(Topic::Budget(*id)));
            storage.budgets.upsert(budget)
        }
        BatchOp::AddMember {
            budget_id,
            user,
            opening,
        } => {
            let mut budget = storage.budgets.require(*budget_id)?;
            budget
                .add_member(user)
                .map_err(|e| BudgetError::membership(&budget.name, e))?;
            budget.apply_delta(user.id, *opening);
            topics.insert(TopicKey(Topic::Budget(*budget_id)));
            storage.budgets.upsert(budget)
        }
        BatchOp::RemoveMember { budget_id, user_id } => {
            let mut budget = storage.budgets.require(*budget_id)?;
            budget
                .remove_member(*user_id)
                .map_err(|e| BudgetError::membership(&budget.name, e))?;
            topics.insert(TopicKey(Topic::Budget(*budget_id)));
            storage.budgets.upsert(budget)
        }
        BatchOp::RenameMember {
            budget_id,
            user_id,
            name,
        } => {
            let mut budget = storage.budgets.require(*budget_id)?;
            let member = budget
                .member_mut(*user_id)
                .ok_or_else(|| BudgetError::member_not_found(user_id.to_string()))?;
            member.name = name.clone();
            budget.touch();
            topics.insert(TopicKey(Topic::Budget(*budget_id)));
            storage.budgets.upsert(budget)
        }
        BatchOp::DeleteBudget(id) => {
            topics.insert(TopicKey(Topic::Budget(*id)));
            remove(&storage.budgets, *id).map(|_| ())
        }
        BatchOp::TouchBudget(id) => {
            let mut budget = storage.budgets.require(*id)?;
            budget.touch();
            topics.insert(TopicKey(Topic::Budget(*id)));
            storage.budgets.upsert(budget)
        }
        BatchOp::AdjustMember {
            budget_id,
            user_id,
            delta,
        } => {
            let mut budget = storage.budgets.require(*budget_id)?;
            if !budget.apply_delta(*user_id, *delta) {
                return Err(BudgetError::member_not_found(user_id.to_string()));
            }
            topics.insert(TopicKey(Topic::Budget(*budget_id)));
            storage.budgets.upsert(budget)
        }
        BatchOp::SetTransaction(txn) => {
            topics.insert(TopicKey(Topic::Transactions(txn.budget_id)));
            storage.transactions.upsert(txn.clone())
        }
        BatchOp::DeleteTransaction(id) => {
            let txn = remove(&storage.transactions, *id)?;
            topics.insert(TopicKey(Topic::Transactions(txn.budget_id)));
            Ok(())
        }
        BatchOp::SetCategory(category) => {
            topics.insert(TopicKey(Topic::Categories(category.budget_id)));
            storage.categories.upsert(category.clone())
        }
        BatchOp::DeleteCategory(id) => {
            let category = remove(&storage.categories, *id)?;
            topics.insert(TopicKey(Topic::Categories(category.budget_id)));
            Ok(())
        }
        BatchOp::SetGoal(goal) => storage.goals.upsert(goal.clone()),
        BatchOp::ContributeGoal { id, amount } => {
            let mut goal = storage.goals.require(*id)?;
            if goal.completed {
                return Err(BudgetError::Validation(format!(
                    "Goal '{}' is already completed",
                    goal.name
                )));
            }
            goal.contribute(*amount);
            storage.goals.upsert(goal)
        }
        BatchOp::DeleteGoal(id) => remove(&storage.goals, *id).map(|_| ()),
        BatchOp::SetLimit(limit) => storage.limits.upsert(limit.clone()),
        BatchOp::DeleteLimit(id) => remove(&storage.limits, *id).map(|_| ()),
    }
}

fn remove<T: Document>(collection: &Collection<T>, id: T::Id) -> BudgetResult<T> {
    collection.delete(id)?.ok_or_else(|| BudgetError::NotFound {
        entity_type: T::ENTITY,
        identifier: id.to_string(),
    })
}

fn save(storage: &Storage, kind: CollectionKind) -> BudgetResult<()> {
    match kind {
        CollectionKind::Users => storage.users.save(),
        CollectionKind::Budgets => storage.budgets.save(),
        CollectionKind::Transactions => storage.transactions.save(),
        CollectionKind::Categories => storage.categories.save(),
        CollectionKind::Goals => storage.goals.save(),
        CollectionKind::Limits => storage.limits.save(),
    }
}

#[derive(Default)]
struct Snapshots {
    users: Option<CollectionSnapshot<User>>,
    budgets: Option<CollectionSnapshot<Budget>>,
    transactions: Option<CollectionSnapshot<Transaction>>,
    categories: Option<CollectionSnapshot<Category>>,
    goals: Option<CollectionSnapshot<Goal>>,
    limits: Option<CollectionSnapshot<Limit>>,
}

impl Snapshots {
    fn take(storage: &Storage, touched: &BTreeSet<CollectionKind>) -> BudgetResult<Self> {
        let mut snapshots = Snapshots::default();
        for kind in touched {
            match kind {
                CollectionKind::Users => snapshots.users = Some(storage.users.snapshot()?),
                CollectionKind::Budgets => snapshots.budgets = Some(storage.budgets.snapshot()?),
                CollectionKind::Transactions => {
                    snapshots.transactions = Some(storage.transactions.snapshot()?)
                }
                CollectionKind::Categories => {
                    snapshots.categories = Some(storage.categories.snapshot()?)
                }
                CollectionKind::Goals => snapshots.goals = Some(storage.goals.snapshot()?),
                CollectionKind::Limits => snapshots.limits = Some(storage.limits.snapshot()?),
            }
        }
        Ok(snapshots)
    }

    fn restore(self, storage: &Storage) -> BudgetResult<()> {
        if let Some(s) = self.users {
            storage.users.restore(s)?;
        }
        if let Some(s) = self.budgets {
            storage.budgets.restore(s)?;
        }
        if let Some(s) = self.transactions {
            storage.transactions.restore(s)?;
        }
        if let Some(s) = self.categories {
            storage.categories.restore(s)?;
        }
        if let Some(s) = self.goals {
            storage.goals.restore(s)?;
        }
        if let Some(s) = self.limits {
            storage.limits.restore(s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetPaths;
    use crate::models::{Currency, Money, TransactionKind};
    use crate::storage::StoreEvent;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage, User, Budget) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        let user = User::new("anna@example.com", "Anna", "hash");
        let budget = Budget::new("Home", &user, Currency::Pln);
        let mut batch = storage.batch();
        batch.set_user(user.clone()).set_budget(budget.clone());
        batch.commit().unwrap();

        (temp_dir, storage, user, budget)
    }

    fn income(budget: &Budget, user: &User, minor: i64) -> Transaction {
        Transaction::new(
            budget.id,
            user.id,
            &user.display_name,
            TransactionKind::Income,
            Money::from_minor(minor),
            "Salary",
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            user.id,
        )
    }

    #[test]
    fn test_commit_applies_and_persists() {
        let (temp_dir, storage, user, budget) = setup();
        let txn = income(&budget, &user, 5000);

        let mut batch = storage.batch();
        batch
            .set_transaction(txn.clone())
            .adjust_member(budget.id, user.id, txn.delta());
        let summary = batch.commit().unwrap();
        assert_eq!(summary.operations, 2);

        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let fresh = Storage::new(paths).unwrap();
        fresh.load_all().unwrap();
        let stored = fresh.budgets.require(budget.id).unwrap();
        assert_eq!(stored.total_balance.minor(), 5000);
        assert!(fresh.transactions.get(txn.id).unwrap().is_some());
    }

    #[test]
    fn test_failed_operation_rolls_back_everything() {
        let (_dir, storage, user, budget) = setup();
        let txn = income(&budget, &user, 5000);

        let mut batch = storage.batch();
        batch
            .set_transaction(txn.clone())
            .adjust_member(budget.id, user.id, txn.delta())
            .adjust_member(budget.id, UserId::new(), txn.delta());
        let err = batch.commit().unwrap_err();
        assert!(err.is_not_found());

        assert!(storage.transactions.get(txn.id).unwrap().is_none());
        let stored = storage.budgets.require(budget.id).unwrap();
        assert!(stored.total_balance.is_zero());
    }

    #[test]
    fn test_delete_missing_document_fails() {
        let (_dir, storage, _, _) = setup();
        let mut batch = storage.batch();
        batch.delete_transaction(TransactionId::new());
        assert!(batch.commit().is_err());
    }

    #[test]
    fn test_subscribers_notified_after_commit() {
        let (_dir, storage, user, budget) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        storage
            .subscribe_budget(budget.id, move |event| {
                if let StoreEvent::Budget {
                    budget: Some(b), ..
                } = event
                {
                    sink.lock().unwrap().push(b.total_balance.minor());
                }
            })
            .unwrap();

        let txn = income(&budget, &user, 1200);
        let mut batch = storage.batch();
        batch
            .set_transaction(txn.clone())
            .adjust_member(budget.id, user.id, txn.delta());
        let summary = batch.commit().unwrap();

        assert!(summary.topics.contains(&Topic::Budget(budget.id)));
        assert!(summary.topics.contains(&Topic::Transactions(budget.id)));
        // initial snapshot, then the committed state
        assert_eq!(*seen.lock().unwrap(), vec![0, 1200]);
    }

    #[test]
    fn test_failed_publish_still_commits() {
        let (temp_dir, storage, user, budget) = setup();
        storage.feed.poison();

        let txn = income(&budget, &user, 800);
        let mut batch = storage.batch();
        batch
            .set_transaction(txn.clone())
            .adjust_member(budget.id, user.id, txn.delta());
        let summary = batch.commit().unwrap();
        assert_eq!(summary.operations, 2);

        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let fresh = Storage::new(paths).unwrap();
        fresh.load_all().unwrap();
        assert_eq!(fresh.budgets.require(budget.id).unwrap().total_balance.minor(), 800);
    }

    #[test]
    fn test_update_budget_keeps_member_totals() {
        let (_dir, storage, user, budget) = setup();
        let txn = income(&budget, &user, 4000);
        let mut batch = storage.batch();
        batch
            .set_transaction(txn.clone())
            .adjust_member(budget.id, user.id, txn.delta());
        batch.commit().unwrap();

        // `budget` is the copy from before the income was booked
        let mut batch = storage.batch();
        batch.update_budget(budget.id, Some("Flat".into()), None, None);
        batch.commit().unwrap();

        let stored = storage.budgets.require(budget.id).unwrap();
        assert_eq!(stored.name, "Flat");
        assert_eq!(stored.total_balance.minor(), 4000);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let (_dir, storage, _, _) = setup();
        let summary = storage.batch().commit().unwrap();
        assert_eq!(summary, CommitSummary::default());
    }
}
