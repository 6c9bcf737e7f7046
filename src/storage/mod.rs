//! Storage layer: the shared document store
//!
//! Six JSON collections under the data directory, written atomically. All
//! multi-document writes go through [`WriteBatch`]; subscribers are told
//! about changes through the [`ChangeFeed`].

pub mod batch;
pub mod budgets;
pub mod categories;
pub mod collection;
pub mod feed;
pub mod file_io;
pub mod goals;
pub mod limits;
pub mod transactions;
pub mod users;

pub use batch::{BatchOp, CommitSummary, WriteBatch};
pub use budgets::BudgetRepository;
pub use categories::CategoryRepository;
pub use collection::{Collection, Document};
pub use feed::{ChangeFeed, StoreEvent, Subscription, Topic, LIVE_TRANSACTIONS_LIMIT};
pub use file_io::{read_json, write_json_atomic};
pub use goals::GoalRepository;
pub use limits::LimitRepository;
pub use transactions::{TransactionQuery, TransactionRepository};
pub use users::UserRepository;

use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::BudgetPaths;
use crate::error::BudgetError;
use crate::models::BudgetId;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: BudgetPaths,
    pub users: UserRepository,
    pub budgets: BudgetRepository,
    pub transactions: TransactionRepository,
    pub categories: CategoryRepository,
    pub goals: GoalRepository,
    pub limits: LimitRepository,
    audit: AuditLogger,
    feed: ChangeFeed,
}

impl Storage {
    pub fn new(paths: BudgetPaths) -> Result<Self, BudgetError> {
        paths.ensure_directories()?;

        Ok(Self {
            users: UserRepository::new(paths.users_file()),
            budgets: BudgetRepository::new(paths.budgets_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            goals: GoalRepository::new(paths.goals_file()),
            limits: LimitRepository::new(paths.limits_file()),
            audit: AuditLogger::new(paths.audit_log()),
            feed: ChangeFeed::new(),
            paths,
        })
    }

    pub fn paths(&self) -> &BudgetPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), BudgetError> {
        self.users.load()?;
        self.budgets.load()?;
        self.transactions.load()?;
        self.categories.load()?;
        self.goals.load()?;
        self.limits.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), BudgetError> {
        self.users.save()?;
        self.budgets.save()?;
        self.transactions.save()?;
        self.categories.save()?;
        self.goals.save()?;
        self.limits.save()?;
        Ok(())
    }

    /// Start a batched write
    pub fn batch(&self) -> WriteBatch<'_> {
        WriteBatch::new(self)
    }

    /// Append entries to the operation history
    pub fn log_entries(&self, entries: &[AuditEntry]) -> Result<(), BudgetError> {
        self.audit.log_batch(entries)
    }

    /// Reload collections another process changed and notify subscribers
    ///
    /// Returns the names of the collections that were reloaded.
    pub fn refresh_if_changed(&self) -> Result<Vec<&'static str>, BudgetError> {
        let mut reloaded = Vec::new();
        let mut topics = Vec::new();

        if self.users.changed_on_disk()? {
            self.users.load()?;
            reloaded.push("users");
        }
        if self.budgets.changed_on_disk()? {
            self.budgets.load()?;
            reloaded.push("budgets");
            topics.extend(self.subscribed_topics(|t| matches!(t, Topic::Budget(_)))?);
        }
        if self.transactions.changed_on_disk()? {
            self.transactions.load()?;
            reloaded.push("transactions");
            topics.extend(self.subscribed_topics(|t| matches!(t, Topic::Transactions(_)))?);
        }
        if self.categories.changed_on_disk()? {
            self.categories.load()?;
            reloaded.push("categories");
            topics.extend(self.subscribed_topics(|t| matches!(t, Topic::Categories(_)))?);
        }
        if self.goals.changed_on_disk()? {
            self.goals.load()?;
            reloaded.push("goals");
        }
        if self.limits.changed_on_disk()? {
            self.limits.load()?;
            reloaded.push("limits");
        }

        if !reloaded.is_empty() {
            info!(collections = ?reloaded, "reloaded changes from disk");
        }
        for topic in topics {
            if let Err(e) = self.publish(topic) {
                warn!(error = %e, ?topic, "failed to publish reloaded snapshot");
            }
        }
        Ok(reloaded)
    }

    /// Build the current snapshot for a topic
    pub fn snapshot_event(&self, topic: Topic) -> Result<StoreEvent, BudgetError> {
        let event = match topic {
            Topic::Budget(budget_id) => StoreEvent::Budget {
                budget_id,
                budget: self.budgets.get(budget_id)?,
            },
            Topic::Transactions(budget_id) => StoreEvent::Transactions {
                budget_id,
                transactions: self.transactions.query(
                    &TransactionQuery::for_budget(budget_id).limit(LIVE_TRANSACTIONS_LIMIT),
                )?,
            },
            Topic::Categories(budget_id) => StoreEvent::Categories {
                budget_id,
                categories: self.categories.for_budget(budget_id)?,
            },
        };
        Ok(event)
    }

    /// Send the current snapshot of a topic to its subscribers
    pub fn publish(&self, topic: Topic) -> Result<(), BudgetError> {
        if !self.feed.has_subscribers(topic)? {
            return Ok(());
        }
        let event = self.snapshot_event(topic)?;
        self.feed.publish(&event)?;
        Ok(())
    }

    /// Listen to a budget document; the current state is delivered right away
    pub fn subscribe_budget<F>(&self, budget_id: BudgetId, callback: F) -> Result<Subscription, BudgetError>
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.subscribe(Topic::Budget(budget_id), callback)
    }

    /// Listen to the latest transactions of a budget, newest first
    pub fn subscribe_transactions<F>(
        &self,
        budget_id: BudgetId,
        callback: F,
    ) -> Result<Subscription, BudgetError>
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.subscribe(Topic::Transactions(budget_id), callback)
    }

    /// Listen to a budget's categories, ordered by name
    pub fn subscribe_categories<F>(
        &self,
        budget_id: BudgetId,
        callback: F,
    ) -> Result<Subscription, BudgetError>
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.subscribe(Topic::Categories(budget_id), callback)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> Result<bool, BudgetError> {
        self.feed.unsubscribe(subscription)
    }

    fn subscribe<F>(&self, topic: Topic, callback: F) -> Result<Subscription, BudgetError>
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let subscription = self.feed.register(topic, callback)?;
        let event = self.snapshot_event(topic)?;
        self.feed.publish_to(subscription, &event)?;
        debug!(?topic, "subscribed");
        Ok(subscription)
    }

    fn subscribed_topics<F>(&self, select: F) -> Result<Vec<Topic>, BudgetError>
    where
        F: Fn(&Topic) -> bool,
    {
        Ok(self
            .feed
            .topics()?
            .into_iter()
            .filter(|t| select(t))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Budget, Category, Currency, TransactionKind, User};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> Storage {
        let paths = BudgetPaths::with_base_dir(dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        storage
    }

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let _storage = open(&temp_dir);

        assert!(temp_dir.path().join("data").exists());
        assert!(temp_dir.path().join("backups").exists());
    }

    #[test]
    fn test_subscribe_delivers_initial_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let storage = open(&temp_dir);
        let budget_id = BudgetId::new();
        storage
            .categories
            .upsert(Category::new(budget_id, "Groceries", TransactionKind::Expense))
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        storage
            .subscribe_categories(budget_id, move |event| {
                if let StoreEvent::Categories { categories, .. } = event {
                    sink.lock().unwrap().push(categories.len());
                }
            })
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_refresh_picks_up_other_process_writes() {
        let temp_dir = TempDir::new().unwrap();
        let ours = open(&temp_dir);
        let theirs = open(&temp_dir);

        let owner = User::new("anna@example.com", "Anna", "hash");
        let budget = Budget::new("Home", &owner, Currency::Pln);

        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        ours.subscribe_budget(budget.id, move |event| {
            if let StoreEvent::Budget { budget: Some(_), .. } = event {
                *sink.lock().unwrap() += 1;
            }
        })
        .unwrap();

        let mut batch = theirs.batch();
        batch.set_user(owner).set_budget(budget.clone());
        batch.commit().unwrap();

        let reloaded = ours.refresh_if_changed().unwrap();
        assert!(reloaded.contains(&"budgets"));
        assert!(reloaded.contains(&"users"));
        assert!(ours.budgets.get(budget.id).unwrap().is_some());
        assert_eq!(*seen.lock().unwrap(), 1);

        assert!(ours.refresh_if_changed().unwrap().is_empty());
    }
}
