//! Expiring values on top of the local store: TTL cache and form drafts

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::BudgetResult;

use super::store::LocalStore;

/// Default lifetime of a cache entry
pub const DEFAULT_CACHE_TTL_MINUTES: i64 = 60;

/// Drafts older than this are discarded
pub const DRAFT_MAX_AGE_HOURS: i64 = 24;

const CACHE_PREFIX: &str = "cache_";
const DRAFT_PREFIX: &str = "form_";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: Value,
    timestamp: DateTime<Utc>,
    ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Draft {
    data: Value,
    timestamp: DateTime<Utc>,
}

impl LocalStore {
    pub fn save_cache<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> BudgetResult<()> {
        self.save_cache_at(key, value, ttl, Utc::now())
    }

    pub fn save_cache_at<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> BudgetResult<()> {
        let entry = CacheEntry {
            data: serde_json::to_value(value)?,
            timestamp: now,
            ttl_seconds: ttl.num_seconds(),
        };
        self.save(&cache_key(key), &entry)
    }

    /// A cached value that has not expired; expired entries are removed
    pub fn load_cache<T: DeserializeOwned>(&self, key: &str) -> BudgetResult<Option<T>> {
        self.load_cache_at(key, Utc::now())
    }

    pub fn load_cache_at<T: DeserializeOwned>(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> BudgetResult<Option<T>> {
        let key = cache_key(key);
        let Some(entry) = self.load::<CacheEntry>(&key)? else {
            return Ok(None);
        };
        // a ttl too large to represent counts as expired
        let expired = Duration::try_seconds(entry.ttl_seconds)
            .map_or(true, |ttl| now - entry.timestamp > ttl);
        if expired {
            self.remove(&key)?;
            return Ok(None);
        }
        Ok(serde_json::from_value(entry.data).ok())
    }

    /// When a cache entry was written, expired or not
    pub fn cache_timestamp(&self, key: &str) -> BudgetResult<Option<DateTime<Utc>>> {
        Ok(self
            .load::<CacheEntry>(&cache_key(key))?
            .map(|entry| entry.timestamp))
    }

    /// Drop every cache entry. Returns how many were removed.
    pub fn clear_cache(&self) -> BudgetResult<usize> {
        let keys: Vec<String> = self
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(CACHE_PREFIX))
            .collect();
        for key in &keys {
            self.remove(key)?;
        }
        Ok(keys.len())
    }

    /// Keep unfinished form input
    pub fn save_draft<T: Serialize>(&self, form: &str, data: &T) -> BudgetResult<()> {
        self.save_draft_at(form, data, Utc::now())
    }

    pub fn save_draft_at<T: Serialize>(
        &self,
        form: &str,
        data: &T,
        now: DateTime<Utc>,
    ) -> BudgetResult<()> {
        let draft = Draft {
            data: serde_json::to_value(data)?,
            timestamp: now,
        };
        self.save(&draft_key(form), &draft)
    }

    pub fn load_draft<T: DeserializeOwned>(&self, form: &str) -> BudgetResult<Option<T>> {
        self.load_draft_at(form, Utc::now())
    }

    /// A draft saved less than a day ago; older drafts are removed
    pub fn load_draft_at<T: DeserializeOwned>(
        &self,
        form: &str,
        now: DateTime<Utc>,
    ) -> BudgetResult<Option<T>> {
        let key = draft_key(form);
        let Some(draft) = self.load::<Draft>(&key)? else {
            return Ok(None);
        };
        if now - draft.timestamp > Duration::hours(DRAFT_MAX_AGE_HOURS) {
            self.remove(&key)?;
            return Ok(None);
        }
        Ok(serde_json::from_value(draft.data).ok())
    }

    pub fn clear_draft(&self, form: &str) -> BudgetResult<bool> {
        self.remove(&draft_key(form))
    }
}

fn cache_key(key: &str) -> String {
    format!("{}{}", CACHE_PREFIX, key)
}

fn draft_key(form: &str) -> String {
    format!("{}{}", DRAFT_PREFIX, form)
}
