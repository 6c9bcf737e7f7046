//! Goal service
//!
//! Saving toward a goal is an expense: a transfer books a "Savings" expense
//! on the member's card and raises the goal's current amount in one batch.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    goal::GOAL_COLORS, BudgetId, DefaultCategory, Goal, GoalFilter, GoalId, Money, Transaction,
    TransactionKind, User, UserId, SAVINGS_CATEGORY,
};
use crate::storage::Storage;
use crate::validation::{sanitize_input, validate_amount, validate_goal, GoalInput};

use super::require_member;

/// Service for savings goals
pub struct GoalService<'a> {
    storage: &'a Storage,
}

/// Input for creating a goal
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: Money,
    pub deadline: NaiveDate,
    pub description: String,
    pub color: Option<String>,
}

/// Fields of a goal that can be edited
#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    pub name: Option<String>,
    pub target_amount: Option<Money>,
    pub deadline: Option<NaiveDate>,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Result of moving money into a goal
#[derive(Debug, Clone)]
pub struct GoalTransfer {
    pub goal: Goal,
    pub transaction: Transaction,
    /// This transfer reached the target
    pub completed: bool,
}

/// Summary over a budget's goals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoalStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub overdue: usize,
    pub target_total: Money,
    pub saved_total: Money,
    pub percent: f64,
}

impl<'a> GoalService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn add(&self, budget_id: BudgetId, user: &User, input: NewGoal, today: NaiveDate) -> BudgetResult<Goal> {
        require_member(self.storage, budget_id, user)?;
        let name = sanitize_input(&input.name);
        let description = sanitize_input(&input.description);
        validate_goal(
            &GoalInput {
                name: &name,
                target_amount: input.target_amount,
                deadline: Some(input.deadline),
                description: &description,
            },
            today,
        )?;

        let color = match input.color {
            Some(color) => color,
            None => {
                let index = self.storage.goals.for_budget(budget_id)?.len() % GOAL_COLORS.len();
                GOAL_COLORS[index].to_string()
            }
        };
        let goal = Goal::new(budget_id, name, input.target_amount, input.deadline, user.id)
            .with_description(description)
            .with_color(color);

        let mut batch = self.storage.batch();
        batch.set_goal(goal.clone()).audit(
            AuditEntry::create(EntityType::Goal, goal.id.to_string(), Some(goal.name.clone()), &goal)
                .by(&user.display_name),
        );
        batch.commit()?;

        info!(budget = %budget_id, goal = %goal.name, "goal added");
        Ok(goal)
    }

    pub fn update(&self, id: GoalId, user: &User, update: GoalUpdate, today: NaiveDate) -> BudgetResult<Goal> {
        self.storage.refresh_if_changed()?;
        let before = self.storage.goals.require(id)?;
        require_member(self.storage, before.budget_id, user)?;

        let mut goal = before.clone();
        if let Some(name) = update.name {
            goal.name = sanitize_input(&name);
        }
        if let Some(target) = update.target_amount {
            goal.target_amount = target;
        }
        if let Some(description) = update.description {
            goal.description = sanitize_input(&description);
        }
        if let Some(color) = update.color {
            goal.color = color;
        }
        // an unchanged deadline may already be in the past
        let deadline_changed = update.deadline.is_some_and(|d| d != before.deadline);
        if let Some(deadline) = update.deadline {
            goal.deadline = deadline;
        }
        validate_goal(
            &GoalInput {
                name: &goal.name,
                target_amount: goal.target_amount,
                deadline: deadline_changed.then_some(goal.deadline),
                description: &goal.description,
            },
            today,
        )?;
        goal.refresh_completion();
        goal.updated_at = Utc::now();

        let mut batch = self.storage.batch();
        batch.set_goal(goal.clone()).audit(
            AuditEntry::update(EntityType::Goal, id.to_string(), Some(goal.name.clone()), &before, &goal)
                .by(&user.display_name),
        );
        batch.commit()?;
        Ok(goal)
    }

    /// Delete a goal; money already transferred stays booked as savings
    pub fn delete(&self, id: GoalId, user: &User) -> BudgetResult<Goal> {
        self.storage.refresh_if_changed()?;
        let goal = self.storage.goals.require(id)?;
        require_member(self.storage, goal.budget_id, user)?;

        let mut batch = self.storage.batch();
        batch.delete_goal(id).audit(
            AuditEntry::delete(EntityType::Goal, id.to_string(), Some(goal.name.clone()), &goal)
                .by(&user.display_name),
        );
        batch.commit()?;
        Ok(goal)
    }

    /// Move money from a member into a goal
    pub fn transfer(
        &self,
        id: GoalId,
        user: &User,
        member: UserId,
        amount: Money,
        today: NaiveDate,
    ) -> BudgetResult<GoalTransfer> {
        validate_amount(amount)?;
        self.storage.refresh_if_changed()?;
        let before = self.storage.goals.require(id)?;
        let budget = require_member(self.storage, before.budget_id, user)?;
        if before.completed {
            return Err(BudgetError::Validation(format!(
                "Goal '{}' is already completed",
                before.name
            )));
        }
        let card = budget
            .member(member)
            .ok_or_else(|| BudgetError::member_not_found(member.to_string()))?;

        let mut batch = self.storage.batch();
        if self
            .storage
            .categories
            .find_by_name(budget.id, SAVINGS_CATEGORY)?
            .is_none()
        {
            if let Some(savings) = DefaultCategory::all().iter().find(|d| d.name == SAVINGS_CATEGORY) {
                batch.set_category(savings.to_category(budget.id));
            }
        }

        let transaction = Transaction::new(
            budget.id,
            member,
            &card.name,
            TransactionKind::Expense,
            amount,
            SAVINGS_CATEGORY,
            today,
            user.id,
        )
        .with_description(format!("Transfer to goal: {}", before.name));

        batch
            .set_transaction(transaction.clone())
            .adjust_member(budget.id, member, transaction.delta())
            .contribute_goal(id, amount);
        batch.commit()?;

        let goal = self.storage.goals.require(id)?;
        let completed = goal.completed && !before.completed;
        if let Err(e) = self.storage.audit().log(
            &AuditEntry::update(EntityType::Goal, id.to_string(), Some(goal.name.clone()), &before, &goal)
                .by(&user.display_name)
                .with_summary(format!("{} transferred by {}", amount, card.name)),
        ) {
            warn!(error = %e, "failed to write operation history");
        }

        info!(goal = %goal.name, amount = %amount, completed, "transfer to goal");
        Ok(GoalTransfer {
            goal,
            transaction,
            completed,
        })
    }

    pub fn get(&self, id: GoalId) -> BudgetResult<Goal> {
        self.storage.goals.require(id)
    }

    /// Resolve a goal by id prefix or name
    pub fn find(&self, budget_id: BudgetId, input: &str) -> BudgetResult<Goal> {
        if let Some(goal) = self
            .storage
            .goals
            .find_by_prefix(input, |g| g.budget_id == budget_id)?
        {
            return Ok(goal);
        }
        self.storage
            .goals
            .for_budget(budget_id)?
            .into_iter()
            .find(|g| g.name.eq_ignore_ascii_case(input.trim()))
            .ok_or_else(|| BudgetError::goal_not_found(input))
    }

    /// Active goals first, then by nearest deadline
    pub fn list(&self, budget_id: BudgetId) -> BudgetResult<Vec<Goal>> {
        let mut goals = self.storage.goals.for_budget(budget_id)?;
        goals.sort_by(Goal::display_order);
        Ok(goals)
    }

    pub fn filter(&self, budget_id: BudgetId, filter: GoalFilter, today: NaiveDate) -> BudgetResult<Vec<Goal>> {
        Ok(self
            .list(budget_id)?
            .into_iter()
            .filter(|g| filter.matches_on(g, today))
            .collect())
    }

    pub fn stats(&self, budget_id: BudgetId, today: NaiveDate) -> BudgetResult<GoalStats> {
        let goals = self.storage.goals.for_budget(budget_id)?;
        let target_total: Money = goals.iter().map(|g| g.target_amount).sum();
        let saved_total: Money = goals.iter().map(|g| g.current_amount).sum();
        Ok(GoalStats {
            total: goals.len(),
            active: goals.iter().filter(|g| !g.completed).count(),
            completed: goals.iter().filter(|g| g.completed).count(),
            overdue: goals.iter().filter(|g| g.is_overdue(today)).count(),
            target_total,
            saved_total,
            percent: saved_total.percent_of(target_total).clamp(0.0, 100.0),
        })
    }

    /// Goals as a pretty JSON array
    pub fn export_json(&self, budget_id: BudgetId) -> BudgetResult<String> {
        serde_json::to_string_pretty(&self.list(budget_id)?)
            .map_err(|e| BudgetError::Export(format!("Failed to serialize goals: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetPaths;
    use crate::models::Currency;
    use crate::services::BudgetService;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        crate::services::today()
    }

    fn setup() -> (TempDir, Storage, User, BudgetId) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        let anna = User::new("anna@example.com", "Anna", "hash");
        storage.users.upsert(anna.clone()).unwrap();
        let budget = BudgetService::new(&storage)
            .create_budget(&anna, "Home", Currency::Pln)
            .unwrap();
        (temp_dir, storage, anna, budget.id)
    }

    fn new_goal(name: &str, minor: i64, deadline: NaiveDate) -> NewGoal {
        NewGoal {
            name: name.into(),
            target_amount: Money::from_minor(minor),
            deadline,
            description: String::new(),
            color: None,
        }
    }

    #[test]
    fn test_add_validates_all_fields() {
        let (_dir, storage, anna, budget_id) = setup();
        let service = GoalService::new(&storage);

        let err = service
            .add(budget_id, &anna, new_goal("", 0, today()), today())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Goal name cannot be empty"));
        assert!(message.contains("; "));
        assert!(message.contains("Deadline must be in the future"));

        let goal = service
            .add(budget_id, &anna, new_goal("Bike", 100_000, today() + chrono::Duration::days(30)), today())
            .unwrap();
        assert_eq!(goal.color, GOAL_COLORS[0]);
        let second = service
            .add(budget_id, &anna, new_goal("Trip", 100_000, today() + chrono::Duration::days(30)), today())
            .unwrap();
        assert_eq!(second.color, GOAL_COLORS[1]);
    }

    #[test]
    fn test_transfer_books_savings_and_completes() {
        let (_dir, storage, anna, budget_id) = setup();
        let service = GoalService::new(&storage);
        let goal = service
            .add(budget_id, &anna, new_goal("Bike", 10_000, today() + chrono::Duration::days(30)), today())
            .unwrap();

        let first = service.transfer(goal.id, &anna, anna.id, Money::from_minor(6_000), today()).unwrap();
        assert!(!first.completed);
        assert_eq!(first.transaction.category, SAVINGS_CATEGORY);
        assert_eq!(first.transaction.kind, TransactionKind::Expense);

        let second = service.transfer(goal.id, &anna, anna.id, Money::from_minor(4_000), today()).unwrap();
        assert!(second.completed);
        assert!(second.goal.completed);
        assert!(second.goal.completed_at.is_some());

        let budget = storage.budgets.require(budget_id).unwrap();
        assert_eq!(budget.total_balance, Money::from_minor(-10_000));
        assert_eq!(budget.member(anna.id).unwrap().expenses, Money::from_minor(10_000));

        let err = service
            .transfer(goal.id, &anna, anna.id, Money::from_minor(1), today())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_transfer_recreates_missing_savings_category() {
        let (_dir, storage, anna, budget_id) = setup();
        let savings = storage.categories.find_by_name(budget_id, SAVINGS_CATEGORY).unwrap().unwrap();
        let mut batch = storage.batch();
        batch.delete_category(savings.id);
        batch.commit().unwrap();

        let service = GoalService::new(&storage);
        let goal = service
            .add(budget_id, &anna, new_goal("Bike", 10_000, today() + chrono::Duration::days(30)), today())
            .unwrap();
        service.transfer(goal.id, &anna, anna.id, Money::from_minor(500), today()).unwrap();
        assert!(storage.categories.find_by_name(budget_id, SAVINGS_CATEGORY).unwrap().is_some());
    }

    #[test]
    fn test_list_order_filters_and_stats() {
        let (_dir, storage, anna, budget_id) = setup();
        let service = GoalService::new(&storage);
        let created = day(2025, 1, 1);

        let far = service
            .add(budget_id, &anna, new_goal("Car", 100_000, day(2027, 1, 1)), created)
            .unwrap();
        let near = service
            .add(budget_id, &anna, new_goal("Phone", 10_000, day(2025, 6, 1)), created)
            .unwrap();
        let done = service
            .add(budget_id, &anna, new_goal("Gift", 1_000, day(2025, 2, 1)), created)
            .unwrap();
        service.transfer(done.id, &anna, anna.id, Money::from_minor(1_000), today()).unwrap();
        service.transfer(near.id, &anna, anna.id, Money::from_minor(8_500), today()).unwrap();

        let names: Vec<_> = service.list(budget_id).unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Phone", "Car", "Gift"]);

        let on = day(2025, 7, 1);
        let overdue = service.filter(budget_id, GoalFilter::Overdue, on).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, near.id);
        let close = service.filter(budget_id, GoalFilter::Close, on).unwrap();
        assert_eq!(close[0].id, near.id);
        assert_eq!(service.filter(budget_id, GoalFilter::Completed, on).unwrap().len(), 1);

        let stats = service.stats(budget_id, on).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.saved_total, Money::from_minor(9_500));
        assert_eq!(service.find(budget_id, "car").unwrap().id, far.id);
    }

    #[test]
    fn test_update_target_reopens_goal() {
        let (_dir, storage, anna, budget_id) = setup();
        let service = GoalService::new(&storage);
        let goal = service
            .add(budget_id, &anna, new_goal("Bike", 1_000, today() + chrono::Duration::days(5)), today())
            .unwrap();
        service.transfer(goal.id, &anna, anna.id, Money::from_minor(1_000), today()).unwrap();

        let raised = service
            .update(
                goal.id,
                &anna,
                GoalUpdate {
                    target_amount: Some(Money::from_minor(5_000)),
                    ..GoalUpdate::default()
                },
                today(),
            )
            .unwrap();
        assert!(!raised.completed);
        assert!(raised.completed_at.is_none());

        service.delete(goal.id, &anna).unwrap();
        assert!(service.get(goal.id).unwrap_err().is_not_found());
    }
}
