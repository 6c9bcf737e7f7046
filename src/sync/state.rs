//! Live state of the budget a surface is showing
//!
//! Snapshots from the change feed replace the held state wholesale; the
//! last snapshot delivered wins. Each apply returns what changed so the
//! surface can raise notifications. Optimistic local transactions are
//! shown right away and dropped once a snapshot confirms them.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{Budget, BudgetId, Category, Member, Money, Transaction, TransactionId, UserId, MAX_MEMBERS};
use crate::storage::StoreEvent;

/// A member whose balance moved between two budget snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceChange {
    pub user_id: UserId,
    pub name: String,
    pub before: Money,
    pub after: Money,
}

impl BalanceChange {
    pub fn delta(&self) -> Money {
        self.after - self.before
    }
}

/// Difference between the held budget and a new snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetChanges {
    /// First snapshot since the state was created
    pub initial: bool,
    /// The budget document no longer exists
    pub removed: bool,
    pub joined: Vec<Member>,
    pub left: Vec<Member>,
    pub balances: Vec<BalanceChange>,
    pub total_delta: Money,
}

impl BudgetChanges {
    pub fn is_empty(&self) -> bool {
        !self.removed
            && self.joined.is_empty()
            && self.left.is_empty()
            && self.balances.is_empty()
            && self.total_delta.is_zero()
    }
}

/// Difference between the held transaction list and a new snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionChanges {
    pub initial: bool,
    pub added: Vec<TransactionId>,
    pub removed: Vec<TransactionId>,
    /// Growth of the list length (0 when it shrank)
    pub new_count: usize,
    /// Optimistic entries the snapshot confirmed
    pub confirmed: usize,
}

/// Outcome of applying a feed event
#[derive(Debug, Clone, PartialEq)]
pub enum LiveUpdate {
    Budget(BudgetChanges),
    Transactions(TransactionChanges),
    Categories(usize),
    /// The event was for another budget
    Ignored,
}

#[derive(Debug, Clone)]
pub struct LiveState {
    budget_id: BudgetId,
    budget: Option<Budget>,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    pending: Vec<Transaction>,
    budget_loaded: bool,
    transactions_loaded: bool,
}

impl LiveState {
    pub fn new(budget_id: BudgetId) -> Self {
        Self {
            budget_id,
            budget: None,
            transactions: Vec::new(),
            categories: Vec::new(),
            pending: Vec::new(),
            budget_loaded: false,
            transactions_loaded: false,
        }
    }

    pub fn budget_id(&self) -> BudgetId {
        self.budget_id
    }

    pub fn budget(&self) -> Option<&Budget> {
        self.budget.as_ref()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Pending optimistic entries first, then the latest snapshot
    pub fn transactions(&self) -> Vec<&Transaction> {
        self.pending.iter().chain(self.transactions.iter()).collect()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn is_pending(&self, id: TransactionId) -> bool {
        self.pending.iter().any(|t| t.id == id)
    }

    pub fn apply(&mut self, event: &StoreEvent) -> LiveUpdate {
        match event {
            StoreEvent::Budget { budget_id, budget } if *budget_id == self.budget_id => {
                LiveUpdate::Budget(self.apply_budget(budget.clone()))
            }
            StoreEvent::Transactions {
                budget_id,
                transactions,
            } if *budget_id == self.budget_id => {
                LiveUpdate::Transactions(self.apply_transactions(transactions.clone()))
            }
            StoreEvent::Categories {
                budget_id,
                categories,
            } if *budget_id == self.budget_id => {
                self.categories = categories.clone();
                LiveUpdate::Categories(self.categories.len())
            }
            _ => LiveUpdate::Ignored,
        }
    }

    /// Replace the budget and report what changed
    pub fn apply_budget(&mut self, snapshot: Option<Budget>) -> BudgetChanges {
        let initial = !self.budget_loaded;
        self.budget_loaded = true;

        let mut changes = BudgetChanges {
            initial,
            ..BudgetChanges::default()
        };

        match (&self.budget, &snapshot) {
            (Some(old), Some(new)) if !initial => {
                changes.joined = new
                    .members
                    .iter()
                    .filter(|m| !old.is_member(m.user_id))
                    .cloned()
                    .collect();
                changes.left = old
                    .members
                    .iter()
                    .filter(|m| !new.is_member(m.user_id))
                    .cloned()
                    .collect();
                changes.balances = new
                    .members
                    .iter()
                    .filter_map(|m| {
                        let before = old.member(m.user_id)?.balance;
                        (before != m.balance).then(|| BalanceChange {
                            user_id: m.user_id,
                            name: m.name.clone(),
                            before,
                            after: m.balance,
                        })
                    })
                    .collect();
                changes.total_delta = new.total_balance - old.total_balance;
            }
            (Some(_), None) => changes.removed = true,
            _ => {}
        }

        debug!(
            budget = %self.budget_id,
            joined = changes.joined.len(),
            left = changes.left.len(),
            "budget snapshot applied"
        );
        self.budget = snapshot;
        changes
    }

    /// Replace the transaction list and reconcile optimistic entries
    pub fn apply_transactions(&mut self, snapshot: Vec<Transaction>) -> TransactionChanges {
        let initial = !self.transactions_loaded;
        self.transactions_loaded = true;

        let old_ids: HashSet<TransactionId> = self.transactions.iter().map(|t| t.id).collect();
        let new_ids: HashSet<TransactionId> = snapshot.iter().map(|t| t.id).collect();

        let (added, removed) = if initial {
            (Vec::new(), Vec::new())
        } else {
            (
                snapshot
                    .iter()
                    .filter(|t| !old_ids.contains(&t.id))
                    .map(|t| t.id)
                    .collect(),
                self.transactions
                    .iter()
                    .filter(|t| !new_ids.contains(&t.id))
                    .map(|t| t.id)
                    .collect(),
            )
        };

        let before_pending = self.pending.len();
        self.pending.retain(|t| !new_ids.contains(&t.id));
        let confirmed = before_pending - self.pending.len();

        let new_count = if initial {
            0
        } else {
            snapshot.len().saturating_sub(self.transactions.len())
        };
        self.transactions = snapshot;

        TransactionChanges {
            initial,
            added,
            removed,
            new_count,
            confirmed,
        }
    }

    /// Show a just-recorded transaction before its snapshot arrives
    ///
    /// Adjusts the held member card and total. Returns false when the
    /// transaction is already known.
    pub fn apply_local_transaction(&mut self, txn: Transaction) -> bool {
        if txn.budget_id != self.budget_id
            || self.is_pending(txn.id)
            || self.transactions.iter().any(|t| t.id == txn.id)
        {
            return false;
        }
        if let Some(budget) = self.budget.as_mut() {
            budget.apply_delta(txn.user_id, txn.delta());
        }
        self.pending.insert(0, txn);
        true
    }

    /// Sum of member balances as currently shown
    pub fn total_balance(&self) -> Money {
        self.budget
            .as_ref()
            .map(|b| b.total_balance)
            .unwrap_or_default()
    }

    /// The "invite" card is shown while there is a free member slot
    pub fn invite_slot_visible(&self) -> bool {
        self.budget
            .as_ref()
            .is_some_and(|b| b.members.len() < MAX_MEMBERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, TransactionKind, User};
    use chrono::NaiveDate;

    fn users() -> (User, User) {
        (
            User::new("anna@example.com", "Anna", "h"),
            User::new("bob@example.com", "Bob", "h"),
        )
    }

    fn txn(budget: &Budget, user: &User, kind: TransactionKind, minor: i64) -> Transaction {
        Transaction::new(
            budget.id,
            user.id,
            &user.display_name,
            kind,
            Money::from_minor(minor),
            "Groceries",
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            user.id,
        )
    }

    #[test]
    fn test_first_budget_snapshot_is_initial() {
        let (anna, _) = users();
        let budget = Budget::new("Home", &anna, Currency::Pln);
        let mut live = LiveState::new(budget.id);

        let changes = live.apply_budget(Some(budget.clone()));
        assert!(changes.initial);
        assert!(changes.joined.is_empty());
        assert!(live.invite_slot_visible());
    }

    #[test]
    fn test_budget_diff_reports_members_and_balances() {
        let (anna, bob) = users();
        let budget = Budget::new("Home", &anna, Currency::Pln);
        let mut live = LiveState::new(budget.id);
        live.apply_budget(Some(budget.clone()));

        let mut next = budget.clone();
        next.add_member(&bob).unwrap();
        next.apply_delta(
            anna.id,
            crate::models::MemberDelta::for_transaction(TransactionKind::Income, Money::from_minor(700)),
        );

        let changes = live.apply_budget(Some(next.clone()));
        assert!(!changes.initial);
        assert_eq!(changes.joined.len(), 1);
        assert_eq!(changes.joined[0].user_id, bob.id);
        assert_eq!(changes.balances.len(), 1);
        assert_eq!(changes.balances[0].delta(), Money::from_minor(700));
        assert_eq!(changes.total_delta, Money::from_minor(700));

        let mut after = next.clone();
        after.remove_member(bob.id).unwrap();
        let changes = live.apply_budget(Some(after));
        assert_eq!(changes.left.len(), 1);

        let changes = live.apply_budget(None);
        assert!(changes.removed);
        assert!(!live.invite_slot_visible());
    }

    #[test]
    fn test_transaction_snapshot_diff() {
        let (anna, _) = users();
        let budget = Budget::new("Home", &anna, Currency::Pln);
        let mut live = LiveState::new(budget.id);

        let a = txn(&budget, &anna, TransactionKind::Expense, 100);
        let b = txn(&budget, &anna, TransactionKind::Expense, 200);
        let c = txn(&budget, &anna, TransactionKind::Income, 300);

        let first = live.apply_transactions(vec![a.clone(), b.clone()]);
        assert!(first.initial);
        assert_eq!(first.new_count, 0);

        let second = live.apply_transactions(vec![c.clone(), a.clone(), b.clone()]);
        assert_eq!(second.added, vec![c.id]);
        assert_eq!(second.new_count, 1);

        let third = live.apply_transactions(vec![c.clone(), a.clone()]);
        assert_eq!(third.removed, vec![b.id]);
        assert_eq!(third.new_count, 0);
    }

    #[test]
    fn test_optimistic_transaction_then_confirmation() {
        let (anna, _) = users();
        let budget = Budget::new("Home", &anna, Currency::Pln);
        let mut live = LiveState::new(budget.id);
        live.apply_budget(Some(budget.clone()));
        live.apply_transactions(Vec::new());

        let local = txn(&budget, &anna, TransactionKind::Income, 2_500);
        assert!(live.apply_local_transaction(local.clone()));
        assert!(!live.apply_local_transaction(local.clone()));
        assert_eq!(live.total_balance(), Money::from_minor(2_500));
        assert_eq!(live.transactions().len(), 1);
        assert!(live.is_pending(local.id));

        // the committed state arrives
        let mut confirmed = budget.clone();
        confirmed.apply_delta(anna.id, local.delta());
        live.apply_budget(Some(confirmed));
        let changes = live.apply_transactions(vec![local.clone()]);
        assert_eq!(changes.confirmed, 1);
        assert!(live.pending().is_empty());
        assert_eq!(live.transactions().len(), 1);
        assert_eq!(live.total_balance(), Money::from_minor(2_500));
    }

    #[test]
    fn test_events_for_other_budgets_are_ignored() {
        let (anna, _) = users();
        let budget = Budget::new("Home", &anna, Currency::Pln);
        let mut live = LiveState::new(budget.id);

        let other = StoreEvent::Categories {
            budget_id: BudgetId::new(),
            categories: Vec::new(),
        };
        assert_eq!(live.apply(&other), LiveUpdate::Ignored);

        let own = StoreEvent::Budget {
            budget_id: budget.id,
            budget: Some(budget.clone()),
        };
        assert!(matches!(live.apply(&own), LiveUpdate::Budget(_)));
    }
}
