//! Spending limits per category

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{BudgetId, LimitId, UserId};
use super::money::Money;
use super::period::{self, DateRange};

/// Spent share from which a limit shows a warning
pub const WARNING_PERCENT: f64 = 80.0;

/// Window a limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LimitPeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl LimitPeriod {
    pub const ALL: [LimitPeriod; 4] = [
        LimitPeriod::Daily,
        LimitPeriod::Weekly,
        LimitPeriod::Monthly,
        LimitPeriod::Yearly,
    ];

    /// The current window containing `today`
    pub fn range(&self, today: NaiveDate) -> DateRange {
        match self {
            LimitPeriod::Daily => DateRange::new(today, today),
            LimitPeriod::Weekly => period::week_of(today),
            LimitPeriod::Monthly => period::month_of(today),
            LimitPeriod::Yearly => period::year_of(today),
        }
    }
}

impl fmt::Display for LimitPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitPeriod::Daily => write!(f, "daily"),
            LimitPeriod::Weekly => write!(f, "weekly"),
            LimitPeriod::Monthly => write!(f, "monthly"),
            LimitPeriod::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for LimitPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            "yearly" | "year" => Ok(Self::Yearly),
            other => Err(format!(
                "Invalid limit period '{}'. Use daily, weekly, monthly or yearly.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub id: LimitId,
    pub budget_id: BudgetId,
    /// Category name the limit watches
    pub category: String,
    pub amount: Money,
    pub period: LimitPeriod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Limit {
    pub fn new(
        budget_id: BudgetId,
        category: impl Into<String>,
        amount: Money,
        period: LimitPeriod,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: LimitId::new(),
            budget_id,
            category: category.into().trim().to_string(),
            amount,
            period,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Evaluate the limit against the amount spent in its current window
    pub fn usage(&self, spent: Money, window: DateRange) -> LimitUsage {
        let percent = spent.percent_of(self.amount);
        let remaining = if spent >= self.amount {
            Money::zero()
        } else {
            self.amount - spent
        };
        LimitUsage {
            limit: self.clone(),
            window,
            spent,
            remaining,
            percent,
            status: LimitStatus::from_percent(percent),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.category, self.amount, self.period)
    }
}

/// How close spending is to a limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitStatus {
    Ok,
    Warning,
    Exceeded,
}

impl LimitStatus {
    /// `< 80%` ok, `80%..100%` warning, `>= 100%` exceeded
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 100.0 {
            LimitStatus::Exceeded
        } else if percent >= WARNING_PERCENT {
            LimitStatus::Warning
        } else {
            LimitStatus::Ok
        }
    }
}

impl fmt::Display for LimitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitStatus::Ok => write!(f, "ok"),
            LimitStatus::Warning => write!(f, "warning"),
            LimitStatus::Exceeded => write!(f, "exceeded"),
        }
    }
}

/// A limit together with what has been spent against it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitUsage {
    pub limit: Limit,
    pub window: DateRange,
    pub spent: Money,
    pub remaining: Money,
    pub percent: f64,
    pub status: LimitStatus,
}
