//! Keeping a surface in step with the shared budget
//!
//! A surface subscribes to its budget, transactions and categories, and
//! feeds every delivered [`StoreEvent`](crate::storage::StoreEvent) into a
//! [`LiveState`]. The returned changes drive notifications.

mod cards;
mod state;

pub use cards::MemberCard;
pub use state::{BalanceChange, BudgetChanges, LiveState, LiveUpdate, TransactionChanges};

use crate::error::BudgetResult;
use crate::models::BudgetId;
use crate::storage::{Storage, StoreEvent, Subscription};

/// Subscribe `sink` to every topic of a budget
///
/// The current snapshots are delivered before this returns.
pub fn subscribe_all<F>(storage: &Storage, budget_id: BudgetId, sink: F) -> BudgetResult<Vec<Subscription>>
where
    F: Fn(&StoreEvent) + Clone + Send + Sync + 'static,
{
    Ok(vec![
        storage.subscribe_budget(budget_id, sink.clone())?,
        storage.subscribe_transactions(budget_id, sink.clone())?,
        storage.subscribe_categories(budget_id, sink)?,
    ])
}

/// Drop subscriptions made by [`subscribe_all`]
pub fn unsubscribe_all(storage: &Storage, subscriptions: Vec<Subscription>) -> BudgetResult<()> {
    for subscription in subscriptions {
        storage.unsubscribe(subscription)?;
    }
    Ok(())
}
