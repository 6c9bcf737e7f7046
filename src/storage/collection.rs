//! Generic JSON-backed document collection
//!
//! Each collection lives in one JSON file under the data directory and is
//! held in memory behind an `RwLock`. The collection remembers the on-disk
//! stamp of the file it last loaded or saved so that changes written by
//! another process can be picked up with [`Collection::changed_on_disk`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::BudgetError;
use crate::models::{
    Budget, BudgetId, Category, CategoryId, EntityId, Goal, GoalId, Limit, LimitId, Transaction,
    TransactionId, User, UserId,
};

use super::file_io::{read_json, write_json_atomic};

/// A document stored in a [`Collection`]
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync {
    type Id: EntityId;

    /// Entity name used in error messages
    const ENTITY: &'static str;

    fn id(&self) -> Self::Id;

    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_document {
    ($doc:ty, $id:ty, $entity:literal) => {
        impl Document for $doc {
            type Id = $id;
            const ENTITY: &'static str = $entity;

            fn id(&self) -> $id {
                self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    };
}

impl_document!(User, UserId, "User");
impl_document!(Budget, BudgetId, "Budget");
impl_document!(Transaction, TransactionId, "Transaction");
impl_document!(Category, CategoryId, "Category");
impl_document!(Goal, GoalId, "Goal");
impl_document!(Limit, LimitId, "Limit");

/// On-disk file layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct CollectionFile<T> {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

impl<T> Default for CollectionFile<T> {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            documents: Vec::new(),
        }
    }
}

fn default_schema_version() -> u32 {
    1
}

/// Identity of a file version: modification time plus length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// In-memory state of a collection, used to roll back failed batches
pub type CollectionSnapshot<T> = HashMap<<T as Document>::Id, T>;

pub struct Collection<T: Document> {
    path: PathBuf,
    data: RwLock<HashMap<T::Id, T>>,
    stamp: RwLock<Option<FileStamp>>,
}

impl<T: Document> Collection<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            stamp: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load documents from disk, replacing what is in memory
    pub fn load(&self) -> Result<(), BudgetError> {
        let file: CollectionFile<T> = read_json(&self.path)?;

        let mut data = self.data.write().map_err(write_lock_error)?;
        data.clear();
        for doc in file.documents {
            data.insert(doc.id(), doc);
        }
        drop(data);

        self.remember_stamp()
    }

    /// Save documents to disk, oldest first
    pub fn save(&self) -> Result<(), BudgetError> {
        let data = self.data.read().map_err(read_lock_error)?;

        let mut documents: Vec<_> = data.values().cloned().collect();
        documents.sort_by_key(|d| d.created_at());

        let file = CollectionFile {
            schema_version: default_schema_version(),
            documents,
        };
        write_json_atomic(&self.path, &file)?;
        drop(data);

        self.remember_stamp()
    }

    /// Whether the file was written by someone else since we last loaded or saved it
    pub fn changed_on_disk(&self) -> Result<bool, BudgetError> {
        let stamp = self.stamp.read().map_err(read_lock_error)?;
        Ok(FileStamp::of(&self.path) != *stamp)
    }

    pub fn get(&self, id: T::Id) -> Result<Option<T>, BudgetError> {
        let data = self.data.read().map_err(read_lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// Get a document or a not-found error
    pub fn require(&self, id: T::Id) -> Result<T, BudgetError> {
        self.get(id)?.ok_or_else(|| BudgetError::NotFound {
            entity_type: T::ENTITY,
            identifier: id.to_string(),
        })
    }

    /// All documents, newest first
    pub fn get_all(&self) -> Result<Vec<T>, BudgetError> {
        let data = self.data.read().map_err(read_lock_error)?;
        let mut docs: Vec<_> = data.values().cloned().collect();
        docs.sort_by_key(|d| std::cmp::Reverse(d.created_at()));
        Ok(docs)
    }

    /// Documents matching a predicate, newest first
    pub fn filter<F>(&self, predicate: F) -> Result<Vec<T>, BudgetError>
    where
        F: Fn(&T) -> bool,
    {
        let data = self.data.read().map_err(read_lock_error)?;
        let mut docs: Vec<_> = data.values().filter(|d| predicate(d)).cloned().collect();
        docs.sort_by_key(|d| std::cmp::Reverse(d.created_at()));
        Ok(docs)
    }

    /// Resolve a user-typed id (full UUID, short display id or UUID prefix)
    ///
    /// Only documents accepted by `scope` are considered. An ambiguous prefix
    /// is a validation error.
    pub fn find_by_prefix<F>(&self, input: &str, scope: F) -> Result<Option<T>, BudgetError>
    where
        F: Fn(&T) -> bool,
    {
        let data = self.data.read().map_err(read_lock_error)?;
        let mut matches = data
            .values()
            .filter(|d| scope(d) && d.id().matches(input));

        let first = matches.next().cloned();
        if first.is_some() && matches.next().is_some() {
            return Err(BudgetError::Validation(format!(
                "'{}' matches more than one {}; type more characters",
                input,
                T::ENTITY.to_lowercase()
            )));
        }
        Ok(first)
    }

    /// Insert or replace a document
    pub fn upsert(&self, doc: T) -> Result<(), BudgetError> {
        let mut data = self.data.write().map_err(write_lock_error)?;
        data.insert(doc.id(), doc);
        Ok(())
    }

    /// Remove a document, returning it if it existed
    pub fn delete(&self, id: T::Id) -> Result<Option<T>, BudgetError> {
        let mut data = self.data.write().map_err(write_lock_error)?;
        Ok(data.remove(&id))
    }

    pub fn count(&self) -> Result<usize, BudgetError> {
        let data = self.data.read().map_err(read_lock_error)?;
        Ok(data.len())
    }

    /// Copy of the in-memory state
    pub fn snapshot(&self) -> Result<CollectionSnapshot<T>, BudgetError> {
        let data = self.data.read().map_err(read_lock_error)?;
        Ok(data.clone())
    }

    /// Put back a state taken with [`Collection::snapshot`]
    pub fn restore(&self, snapshot: CollectionSnapshot<T>) -> Result<(), BudgetError> {
        let mut data = self.data.write().map_err(write_lock_error)?;
        *data = snapshot;
        Ok(())
    }

    /// Replace every document (used by backup restore and data import)
    pub fn replace_all(&self, docs: Vec<T>) -> Result<(), BudgetError> {
        let mut data = self.data.write().map_err(write_lock_error)?;
        data.clear();
        for doc in docs {
            data.insert(doc.id(), doc);
        }
        Ok(())
    }

    fn remember_stamp(&self) -> Result<(), BudgetError> {
        let mut stamp = self.stamp.write().map_err(write_lock_error)?;
        *stamp = FileStamp::of(&self.path);
        Ok(())
    }
}

pub(crate) fn read_lock_error<E: std::fmt::Display>(e: E) -> BudgetError {
    BudgetError::Storage(format!("Failed to acquire read lock: {}", e))
}

pub(crate) fn write_lock_error<E: std::fmt::Display>(e: E) -> BudgetError {
    BudgetError::Storage(format!("Failed to acquire write lock: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, Money, TransactionKind};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn txn(budget: BudgetId, minor: i64) -> Transaction {
        let user = UserId::new();
        Transaction::new(
            budget,
            user,
            "Anna",
            TransactionKind::Expense,
            Money::from_minor(minor),
            "Groceries",
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            user,
        )
    }

    #[test]
    fn test_upsert_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("transactions.json");
        let collection: Collection<Transaction> = Collection::new(path.clone());

        let t = txn(BudgetId::new(), 100);
        collection.upsert(t.clone()).unwrap();
        collection.save().unwrap();

        let reloaded: Collection<Transaction> = Collection::new(path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.count().unwrap(), 1);
        assert_eq!(reloaded.get(t.id).unwrap().unwrap(), t);
    }

    #[test]
    fn test_require_reports_entity() {
        let temp_dir = TempDir::new().unwrap();
        let collection: Collection<Goal> = Collection::new(temp_dir.path().join("goals.json"));
        let err = collection.require(GoalId::new()).unwrap_err();
        assert!(err.to_string().starts_with("Goal not found"));
    }

    #[test]
    fn test_changed_on_disk_detects_other_writer() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("budgets.json");
        let ours: Collection<Budget> = Collection::new(path.clone());
        let theirs: Collection<Budget> = Collection::new(path);

        ours.load().unwrap();
        assert!(!ours.changed_on_disk().unwrap());

        let owner = User::new("a@example.com", "Anna", "hash");
        theirs
            .upsert(Budget::new("Home", &owner, Currency::Pln))
            .unwrap();
        theirs.save().unwrap();

        assert!(ours.changed_on_disk().unwrap());
        ours.load().unwrap();
        assert!(!ours.changed_on_disk().unwrap());
        assert_eq!(ours.count().unwrap(), 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let temp_dir = TempDir::new().unwrap();
        let collection: Collection<Transaction> =
            Collection::new(temp_dir.path().join("transactions.json"));
        let budget = BudgetId::new();
        collection.upsert(txn(budget, 100)).unwrap();

        let snapshot = collection.snapshot().unwrap();
        collection.upsert(txn(budget, 200)).unwrap();
        assert_eq!(collection.count().unwrap(), 2);

        collection.restore(snapshot).unwrap();
        assert_eq!(collection.count().unwrap(), 1);
    }

    #[test]
    fn test_find_by_prefix_scoped() {
        let temp_dir = TempDir::new().unwrap();
        let collection: Collection<Transaction> =
            Collection::new(temp_dir.path().join("transactions.json"));
        let budget = BudgetId::new();
        let t = txn(budget, 100);
        collection.upsert(t.clone()).unwrap();

        let found = collection
            .find_by_prefix(&t.id.to_string(), |d| d.budget_id == budget)
            .unwrap();
        assert_eq!(found.unwrap().id, t.id);

        let other_budget = collection
            .find_by_prefix(&t.id.to_string(), |d| d.budget_id != budget)
            .unwrap();
        assert!(other_budget.is_none());
    }
}
