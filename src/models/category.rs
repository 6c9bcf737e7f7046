//! Category model
//!
//! Categories belong to a budget and are either for income or for expenses.
//! Transactions and limits refer to categories by name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, CategoryId, UserId};
use super::transaction::TransactionKind;

/// Icon used when none is chosen
pub const DEFAULT_ICON: &str = "🏷";

/// Category that goal transfers are booked under
pub const SAVINGS_CATEGORY: &str = "Savings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub budget_id: BudgetId,
    pub name: String,
    pub kind: TransactionKind,
    #[serde(default = "default_icon")]
    pub icon: String,
    /// `#RRGGBB`
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

impl Category {
    pub fn new(budget_id: BudgetId, name: impl Into<String>, kind: TransactionKind) -> Self {
        let now = Utc::now();
        let name = name.into().trim().to_string();
        let color = crate::display::format::category_color(&name);
        Self {
            id: CategoryId::new(),
            budget_id,
            name,
            kind,
            icon: default_icon(),
            color,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_style(mut self, icon: impl Into<String>, color: impl Into<String>) -> Self {
        self.icon = icon.into();
        self.color = color.into();
        self
    }

    pub fn created_by(mut self, user_id: UserId) -> Self {
        self.created_by = Some(user_id);
        self
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon, self.name)
    }
}

/// A category every new budget starts with
#[derive(Debug, Clone, Copy)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub kind: TransactionKind,
    pub icon: &'static str,
    pub color: &'static str,
}

impl DefaultCategory {
    pub fn all() -> &'static [DefaultCategory] {
        &DEFAULT_CATEGORIES
    }

    pub fn to_category(&self, budget_id: BudgetId) -> Category {
        Category::new(budget_id, self.name, self.kind).with_style(self.icon, self.color)
    }
}

const DEFAULT_CATEGORIES: [DefaultCategory; 8] = [
    DefaultCategory {
        name: "Groceries",
        kind: TransactionKind::Expense,
        icon: "🛒",
        color: "#4CAF50",
    },
    DefaultCategory {
        name: "Transport",
        kind: TransactionKind::Expense,
        icon: "🚗",
        color: "#2196F3",
    },
    DefaultCategory {
        name: "Utilities",
        kind: TransactionKind::Expense,
        icon: "🏠",
        color: "#FF9800",
    },
    DefaultCategory {
        name: "Entertainment",
        kind: TransactionKind::Expense,
        icon: "🎮",
        color: "#9C27B0",
    },
    DefaultCategory {
        name: "Health",
        kind: TransactionKind::Expense,
        icon: "💊",
        color: "#F44336",
    },
    DefaultCategory {
        name: SAVINGS_CATEGORY,
        kind: TransactionKind::Expense,
        icon: "🐷",
        color: "#00BCD4",
    },
    DefaultCategory {
        name: "Salary",
        kind: TransactionKind::Income,
        icon: "💰",
        color: "#4CAF50",
    },
    DefaultCategory {
        name: "Extra income",
        kind: TransactionKind::Income,
        icon: "➕",
        color: "#8BC34A",
    },
];
