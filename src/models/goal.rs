//! Savings goals

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::ids::{BudgetId, GoalId, UserId};
use super::money::Money;

/// Share of the target from which a goal counts as "close"
pub const CLOSE_TO_TARGET_PERCENT: f64 = 80.0;

/// Colors handed out to new goals in turn
pub const GOAL_COLORS: [&str; 12] = [
    "#4CAF50", "#2196F3", "#FF9800", "#9C27B0", "#F44336", "#00BCD4", "#8BC34A", "#FFC107",
    "#E91E63", "#3F51B5", "#009688", "#795548",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub budget_id: BudgetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub target_amount: Money,
    pub current_amount: Money,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub color: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(
        budget_id: BudgetId,
        name: impl Into<String>,
        target_amount: Money,
        deadline: NaiveDate,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: GoalId::new(),
            budget_id,
            name: name.into().trim().to_string(),
            description: String::new(),
            target_amount,
            current_amount: Money::zero(),
            deadline,
            completed: false,
            completed_at: None,
            color: GOAL_COLORS[0].to_string(),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into().trim().to_string();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Progress toward the target, capped at 100
    pub fn progress_percent(&self) -> f64 {
        self.current_amount.percent_of(self.target_amount).clamp(0.0, 100.0)
    }

    /// Amount still missing (never negative)
    pub fn remaining(&self) -> Money {
        let left = self.target_amount - self.current_amount;
        if left.is_negative() {
            Money::zero()
        } else {
            left
        }
    }

    pub fn is_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.deadline < today
    }

    pub fn is_close(&self) -> bool {
        !self.completed && self.progress_percent() >= CLOSE_TO_TARGET_PERCENT
    }

    /// Days left until the deadline (negative when overdue)
    pub fn days_left(&self, today: NaiveDate) -> i64 {
        (self.deadline - today).num_days()
    }

    /// Add money to the goal. Returns true when this contribution completed it.
    pub fn contribute(&mut self, amount: Money) -> bool {
        let was_completed = self.completed;
        self.current_amount += amount;
        self.updated_at = Utc::now();
        if !was_completed && self.is_reached() {
            self.completed = true;
            self.completed_at = Some(self.updated_at);
            return true;
        }
        false
    }

    /// Re-derive the completion flag after the target or amount was edited
    pub fn refresh_completion(&mut self) {
        if self.is_reached() && !self.completed {
            self.completed = true;
            self.completed_at = Some(Utc::now());
        } else if !self.is_reached() && self.completed {
            self.completed = false;
            self.completed_at = None;
        }
    }

    /// Active goals first, then by nearest deadline
    pub fn display_order(a: &Goal, b: &Goal) -> Ordering {
        a.completed
            .cmp(&b.completed)
            .then(a.deadline.cmp(&b.deadline))
            .then(a.name.cmp(&b.name))
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} by {}",
            self.name,
            self.current_amount,
            self.target_amount,
            self.deadline.format("%Y-%m-%d")
        )
    }
}

/// Goal list filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoalFilter {
    #[default]
    All,
    Active,
    Completed,
    Overdue,
    /// At least 80% of the target saved but not completed
    Close,
}

impl GoalFilter {
    pub fn matches(&self, goal: &Goal) -> bool {
        let today = Local::now().date_naive();
        self.matches_on(goal, today)
    }

    pub fn matches_on(&self, goal: &Goal, today: NaiveDate) -> bool {
        match self {
            GoalFilter::All => true,
            GoalFilter::Active => !goal.completed,
            GoalFilter::Completed => goal.completed,
            GoalFilter::Overdue => goal.is_overdue(today),
            GoalFilter::Close => goal.is_close(),
        }
    }
}

impl FromStr for GoalFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            "overdue" => Ok(Self::Overdue),
            "close" => Ok(Self::Close),
            other => Err(format!("Unknown goal filter '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(target: i64, current: i64, deadline: NaiveDate) -> Goal {
        let mut g = Goal::new(
            BudgetId::new(),
            "Vacation",
            Money::from_minor(target),
            deadline,
            UserId::new(),
        );
        g.current_amount = Money::from_minor(current);
        g
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_progress_and_remaining() {
        let g = goal(10000, 2500, day(2030, 1, 1));
        assert!((g.progress_percent() - 25.0).abs() < 1e-9);
        assert_eq!(g.remaining().minor(), 7500);

        let over = goal(10000, 12000, day(2030, 1, 1));
        assert_eq!(over.progress_percent(), 100.0);
        assert!(over.remaining().is_zero());
    }

    #[test]
    fn test_contribute_completes_once() {
        let mut g = goal(10000, 9000, day(2030, 1, 1));
        assert!(g.contribute(Money::from_minor(1000)));
        assert!(g.completed);
        assert!(g.completed_at.is_some());
        assert!(!g.contribute(Money::from_minor(1)));
    }

    #[test]
    fn test_filters() {
        let today = day(2025, 6, 1);
        let overdue = goal(10000, 100, day(2025, 5, 1));
        let close = goal(10000, 8500, day(2026, 1, 1));
        let mut done = goal(100, 100, day(2025, 5, 1));
        done.refresh_completion();

        assert!(GoalFilter::Overdue.matches_on(&overdue, today));
        assert!(!GoalFilter::Overdue.matches_on(&done, today));
        assert!(GoalFilter::Close.matches_on(&close, today));
        assert!(!GoalFilter::Close.matches_on(&overdue, today));
        assert!(GoalFilter::Completed.matches_on(&done, today));
        assert!(GoalFilter::Active.matches_on(&close, today));
    }

    #[test]
    fn test_display_order_active_first_then_deadline() {
        let mut done = goal(100, 100, day(2025, 1, 1));
        done.refresh_completion();
        let later = goal(100, 0, day(2027, 1, 1));
        let sooner = goal(100, 0, day(2026, 1, 1));

        let mut goals = vec![done.clone(), later.clone(), sooner.clone()];
        goals.sort_by(Goal::display_order);
        assert_eq!(goals[0].id, sooner.id);
        assert_eq!(goals[1].id, later.id);
        assert_eq!(goals[2].id, done.id);
    }

    #[test]
    fn test_refresh_completion_reopens() {
        let mut g = goal(100, 100, day(2030, 1, 1));
        g.refresh_completion();
        assert!(g.completed);
        g.target_amount = Money::from_minor(200);
        g.refresh_completion();
        assert!(!g.completed);
        assert!(g.completed_at.is_none());
    }
}
