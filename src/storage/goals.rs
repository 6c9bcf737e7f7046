//! Goal repository (goals.json)

use crate::error::BudgetError;
use crate::models::{BudgetId, Goal};

use super::collection::Collection;

pub type GoalRepository = Collection<Goal>;

impl Collection<Goal> {
    /// Goals of a budget, newest first
    pub fn for_budget(&self, budget_id: BudgetId) -> Result<Vec<Goal>, BudgetError> {
        self.filter(|g| g.budget_id == budget_id)
    }
}
