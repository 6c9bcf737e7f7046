//! Transaction model
//!
//! A single income or expense booked against one member of a budget.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::budget::MemberDelta;
use super::ids::{BudgetId, TransactionId, UserId};
use super::money::Money;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn is_income(&self) -> bool {
        matches!(self, Self::Income)
    }

    /// Sign applied to the amount when summing balances
    pub fn sign(&self) -> i64 {
        match self {
            Self::Income => 1,
            Self::Expense => -1,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" | "+" => Ok(Self::Income),
            "expense" | "out" | "-" => Ok(Self::Expense),
            other => Err(format!("Unknown transaction type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub budget_id: BudgetId,

    /// Member whose card this transaction is booked on
    pub user_id: UserId,

    /// Member name at the time of booking
    pub user_name: String,

    pub kind: TransactionKind,

    /// Always positive; `kind` carries the direction
    pub amount: Money,

    /// Category name
    pub category: String,

    #[serde(default)]
    pub description: String,

    pub date: NaiveDate,

    /// User who entered the transaction (may differ from `user_id`)
    pub created_by: UserId,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        budget_id: BudgetId,
        user_id: UserId,
        user_name: impl Into<String>,
        kind: TransactionKind,
        amount: Money,
        category: impl Into<String>,
        date: NaiveDate,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            budget_id,
            user_id,
            user_name: user_name.into(),
            kind,
            amount,
            category: category.into().trim().to_string(),
            description: String::new(),
            date,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into().trim().to_string();
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind.is_income()
    }

    pub fn is_expense(&self) -> bool {
        !self.kind.is_income()
    }

    /// `+amount` for income, `-amount` for expense
    pub fn signed_amount(&self) -> Money {
        Money::from_minor(self.amount.minor() * self.kind.sign())
    }

    /// Effect of this transaction on its member's card
    pub fn delta(&self) -> MemberDelta {
        MemberDelta::for_transaction(self.kind, self.amount)
    }

    /// Case-insensitive match over description and category
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.description.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
    }

    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount(self.amount));
        }
        if self.category.is_empty() {
            return Err(TransactionValidationError::MissingCategory);
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.date.format("%Y-%m-%d"),
            self.category,
            self.signed_amount(),
            self.user_name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount(Money),
    MissingCategory,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "Amount must be greater than zero (got {})", amount)
            }
            Self::MissingCategory => write!(f, "Transaction needs a category"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}
