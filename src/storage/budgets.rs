//! Budget repository (budgets.json)

use crate::error::BudgetError;
use crate::models::{budget::normalize_invite_code, Budget, UserId};

use super::collection::Collection;

pub type BudgetRepository = Collection<Budget>;

impl Collection<Budget> {
    /// Budgets the user is a member of, most recently updated first
    pub fn find_by_member(&self, user_id: UserId) -> Result<Vec<Budget>, BudgetError> {
        let mut budgets = self.filter(|b| b.is_member(user_id))?;
        budgets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(budgets)
    }

    pub fn find_by_invite_code(&self, code: &str) -> Result<Option<Budget>, BudgetError> {
        let code = normalize_invite_code(code);
        if code.is_empty() {
            return Ok(None);
        }
        Ok(self
            .filter(|b| b.invite_code == code)?
            .into_iter()
            .next())
    }
}
