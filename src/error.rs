//! Custom error types for the family budget
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

use crate::models::{MembershipError, MAX_MEMBERS};

/// The main error type for family budget operations
#[derive(Error, Debug)]
pub enum BudgetError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models and user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Sign-in and sign-up failures
    #[error("Authentication error: {0}")]
    Auth(String),

    /// An operation needs a signed-in user
    #[error("Not signed in. Run 'famb login' first.")]
    NotAuthenticated,

    /// The signed-in user may not touch this document
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// The user is already part of the budget they tried to join
    #[error("Already a member of budget '{0}'")]
    AlreadyMember(String),

    /// The budget has no free member slots
    #[error("Budget '{name}' is full ({max} members)")]
    BudgetFull { name: String, max: usize },

    /// Exchange rate and conversion errors
    #[error("Currency error: {0}")]
    Currency(String),

    /// Import errors
    #[error("Import error: {0}")]
    Import(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// TUI errors
    #[error("TUI error: {0}")]
    Tui(String),
}

impl BudgetError {
    /// Create a "not found" error for budgets
    pub fn budget_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Budget",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for users
    pub fn user_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "User",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for budget members
    pub fn member_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Member",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for goals
    pub fn goal_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Goal",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for limits
    pub fn limit_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Limit",
            identifier: identifier.into(),
        }
    }

    /// Turn a refused membership change on `budget_name` into an error
    pub fn membership(budget_name: &str, err: MembershipError) -> Self {
        match err {
            MembershipError::AlreadyMember => Self::AlreadyMember(budget_name.to_string()),
            MembershipError::Full => Self::BudgetFull {
                name: budget_name.to_string(),
                max: MAX_MEMBERS,
            },
            MembershipError::OwnerCannotLeave => {
                Self::Forbidden(format!("The owner cannot leave '{budget_name}'"))
            }
            MembershipError::NotMember => Self::member_not_found(budget_name),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error means the user has to sign in again
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::NotAuthenticated)
    }
}

impl From<std::io::Error> for BudgetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BudgetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for family budget operations
pub type BudgetResult<T> = Result<T, BudgetError>;
