//! Strongly-typed ID wrappers for all document types
//!
//! Newtype wrappers keep ids of different collections from being mixed up at
//! compile time. Ids display as a short prefixed form (`txn-1a2b3c4d`) which
//! the CLI accepts back through [`EntityId::matches`].

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

/// Behaviour shared by every document id
pub trait EntityId:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync
{
    /// Whether a user-typed identifier refers to this id
    ///
    /// Accepts the full UUID, the short display form, or a UUID prefix of at
    /// least four characters (with or without the display prefix).
    fn matches(&self, input: &str) -> bool;
}

macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse an ID from a full UUID string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl EntityId for $name {
            fn matches(&self, input: &str) -> bool {
                let input = input.trim().to_lowercase();
                let bare = input.strip_prefix($display_prefix).unwrap_or(&input);
                let full = self.0.to_string();
                bare.len() >= 4 && full.starts_with(bare)
            }
        }
    };
}

define_id!(UserId, "usr-");
define_id!(BudgetId, "bud-");
define_id!(TransactionId, "txn-");
define_id!(CategoryId, "cat-");
define_id!(GoalId, "goal-");
define_id!(LimitId, "lim-");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = BudgetId::new();
        assert!(!id.as_uuid().is_nil());
        assert_ne!(BudgetId::new(), BudgetId::new());
    }

    #[test]
    fn test_id_display() {
        let id = TransactionId::new();
        let display = id.to_string();
        assert!(display.starts_with("txn-"));
        assert_eq!(display.len(), 12);
    }

    #[test]
    fn test_id_from_str_accepts_prefixed_uuid() {
        let id = GoalId::new();
        let prefixed = format!("goal-{}", id.as_uuid());
        assert_eq!(prefixed.parse::<GoalId>().unwrap(), id);
        assert_eq!(id.as_uuid().to_string().parse::<GoalId>().unwrap(), id);
    }

    #[test]
    fn test_matches_short_forms() {
        let id = CategoryId::new();
        let full = id.as_uuid().to_string();

        assert!(id.matches(&id.to_string()));
        assert!(id.matches(&full));
        assert!(id.matches(&full[..6]));
        assert!(id.matches(&full.to_uppercase()[..8]));
        assert!(!id.matches(&full[..3]));
        assert!(!id.matches("cat-zzzzzzzz"));
    }

    #[test]
    fn test_serialization_is_transparent() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
