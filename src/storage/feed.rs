//! Change feed: live subscriptions to budget documents and queries
//!
//! Subscribers register a callback for a topic (one budget document, the
//! latest transactions of a budget, or a budget's categories). Whenever a
//! committed write or a reload from disk touches a topic, every subscriber
//! of that topic receives a full snapshot. Callbacks run on the thread that
//! published, after all locks are released, in subscription order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::BudgetError;
use crate::models::{Budget, BudgetId, Category, Transaction};

use super::collection::{read_lock_error, write_lock_error};

/// Number of transactions delivered in a transactions snapshot
pub const LIVE_TRANSACTIONS_LIMIT: usize = 50;

/// What a subscription listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Budget(BudgetId),
    Transactions(BudgetId),
    Categories(BudgetId),
}

impl Topic {
    pub fn budget_id(&self) -> BudgetId {
        match self {
            Topic::Budget(id) | Topic::Transactions(id) | Topic::Categories(id) => *id,
        }
    }
}

/// A snapshot delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// Current budget document, `None` once it has been deleted
    Budget {
        budget_id: BudgetId,
        budget: Option<Budget>,
    },
    /// Latest transactions of a budget, newest first
    Transactions {
        budget_id: BudgetId,
        transactions: Vec<Transaction>,
    },
    /// Categories of a budget ordered by name
    Categories {
        budget_id: BudgetId,
        categories: Vec<Category>,
    },
}

impl StoreEvent {
    pub fn topic(&self) -> Topic {
        match self {
            StoreEvent::Budget { budget_id, .. } => Topic::Budget(*budget_id),
            StoreEvent::Transactions { budget_id, .. } => Topic::Transactions(*budget_id),
            StoreEvent::Categories { budget_id, .. } => Topic::Categories(*budget_id),
        }
    }
}

pub type Callback = dyn Fn(&StoreEvent) + Send + Sync;

struct Subscriber {
    id: u64,
    topic: Topic,
    callback: Arc<Callback>,
}

/// Handle returned by a subscribe call; pass it back to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
    topic: Topic,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[derive(Default)]
pub struct ChangeFeed {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave the subscriber lock poisoned, as a panicking holder would
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.subscribers.write();
            panic!("subscriber lock poisoned on purpose");
        }));
    }

    /// Register a callback without delivering anything yet
    pub fn register<F>(&self, topic: Topic, callback: F) -> Result<Subscription, BudgetError>
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = self.subscribers.write().map_err(write_lock_error)?;
        subscribers.push(Subscriber {
            id,
            topic,
            callback: Arc::new(callback),
        });
        debug!(?topic, id, "subscriber registered");
        Ok(Subscription { id, topic })
    }

    /// Stop delivering to a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> Result<bool, BudgetError> {
        let mut subscribers = self.subscribers.write().map_err(write_lock_error)?;
        let before = subscribers.len();
        subscribers.retain(|s| s.id != subscription.id);
        Ok(subscribers.len() != before)
    }

    /// Drop every subscription (used on sign-out)
    pub fn unsubscribe_all(&self) -> Result<(), BudgetError> {
        let mut subscribers = self.subscribers.write().map_err(write_lock_error)?;
        subscribers.clear();
        Ok(())
    }

    /// Whether anyone listens to a topic
    pub fn has_subscribers(&self, topic: Topic) -> Result<bool, BudgetError> {
        let subscribers = self.subscribers.read().map_err(read_lock_error)?;
        Ok(subscribers.iter().any(|s| s.topic == topic))
    }

    /// Distinct topics with at least one subscriber
    pub fn topics(&self) -> Result<Vec<Topic>, BudgetError> {
        let subscribers = self.subscribers.read().map_err(read_lock_error)?;
        let mut topics: Vec<Topic> = Vec::new();
        for s in subscribers.iter() {
            if !topics.contains(&s.topic) {
                topics.push(s.topic);
            }
        }
        Ok(topics)
    }

    pub fn subscriber_count(&self) -> Result<usize, BudgetError> {
        let subscribers = self.subscribers.read().map_err(read_lock_error)?;
        Ok(subscribers.len())
    }

    /// Deliver an event to every subscriber of its topic
    pub fn publish(&self, event: &StoreEvent) -> Result<usize, BudgetError> {
        self.deliver(event, |_| true)
    }

    /// Deliver an event to a single subscription (the initial snapshot)
    pub fn publish_to(
        &self,
        subscription: Subscription,
        event: &StoreEvent,
    ) -> Result<usize, BudgetError> {
        self.deliver(event, |id| id == subscription.id)
    }

    fn deliver<F>(&self, event: &StoreEvent, select: F) -> Result<usize, BudgetError>
    where
        F: Fn(u64) -> bool,
    {
        let topic = event.topic();
        let callbacks: Vec<Arc<Callback>> = {
            let subscribers = self.subscribers.read().map_err(read_lock_error)?;
            subscribers
                .iter()
                .filter(|s| s.topic == topic && select(s.id))
                .map(|s| Arc::clone(&s.callback))
                .collect()
        };

        for callback in &callbacks {
            callback(event);
        }
        debug!(?topic, delivered = callbacks.len(), "snapshot published");
        Ok(callbacks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn categories_event(budget_id: BudgetId) -> StoreEvent {
        StoreEvent::Categories {
            budget_id,
            categories: Vec::new(),
        }
    }

    #[test]
    fn test_publish_reaches_only_topic_subscribers() {
        let feed = ChangeFeed::new();
        let budget = BudgetId::new();
        let other = BudgetId::new();
        let received = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&received);
        feed.register(Topic::Categories(budget), move |_| {
            *counter.lock().unwrap() += 1;
        })
        .unwrap();

        assert_eq!(feed.publish(&categories_event(budget)).unwrap(), 1);
        assert_eq!(feed.publish(&categories_event(other)).unwrap(), 0);
        assert_eq!(*received.lock().unwrap(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let feed = ChangeFeed::new();
        let budget = BudgetId::new();
        let received = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&received);
        let sub = feed
            .register(Topic::Categories(budget), move |_| {
                *counter.lock().unwrap() += 1;
            })
            .unwrap();

        assert!(feed.unsubscribe(sub).unwrap());
        assert!(!feed.unsubscribe(sub).unwrap());
        feed.publish(&categories_event(budget)).unwrap();
        assert_eq!(*received.lock().unwrap(), 0);
        assert!(!feed.has_subscribers(Topic::Categories(budget)).unwrap());
    }

    #[test]
    fn test_callback_may_subscribe_again_without_deadlock() {
        let feed = Arc::new(ChangeFeed::new());
        let budget = BudgetId::new();

        let inner = Arc::clone(&feed);
        feed.register(Topic::Categories(budget), move |_| {
            inner
                .register(Topic::Budget(budget), |_| {})
                .unwrap();
        })
        .unwrap();

        feed.publish(&categories_event(budget)).unwrap();
        assert_eq!(feed.subscriber_count().unwrap(), 2);
    }

    #[test]
    fn test_publish_to_single_subscription() {
        let feed = ChangeFeed::new();
        let budget = BudgetId::new();
        let first = feed.register(Topic::Categories(budget), |_| {}).unwrap();
        feed.register(Topic::Categories(budget), |_| {}).unwrap();

        assert_eq!(feed.publish_to(first, &categories_event(budget)).unwrap(), 1);
        assert_eq!(feed.publish(&categories_event(budget)).unwrap(), 2);
    }
}
