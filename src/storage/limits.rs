//! Limit repository (limits.json)

use crate::error::BudgetError;
use crate::models::{BudgetId, Limit};

use super::collection::Collection;

pub type LimitRepository = Collection<Limit>;

impl Collection<Limit> {
    /// Limits of a budget ordered by category name
    pub fn for_budget(&self, budget_id: BudgetId) -> Result<Vec<Limit>, BudgetError> {
        let mut limits = self.filter(|l| l.budget_id == budget_id)?;
        limits.sort_by_key(|l| l.category.to_lowercase());
        Ok(limits)
    }

    /// The limit watching a category, if any
    pub fn find_by_category(
        &self,
        budget_id: BudgetId,
        category: &str,
    ) -> Result<Option<Limit>, BudgetError> {
        Ok(self
            .filter(|l| l.budget_id == budget_id && l.category.eq_ignore_ascii_case(category.trim()))?
            .into_iter()
            .next())
    }
}
