//! Service layer for the family budget
//!
//! Services sit on top of the storage layer. They validate input, keep the
//! member totals consistent by staging every related write in one
//! [`WriteBatch`](crate::storage::WriteBatch), and record operation history.

pub mod budget;
pub mod category;
pub mod goal;
pub mod limit;
pub mod stats;
pub mod transaction;

pub use budget::{BudgetService, BudgetUpdate, InviteInfo, RecalcReport};
pub use category::{CategoryExport, CategoryService, CategorySort, CategoryUpdate, CategoryUsage, ImportSummary};
pub use goal::{GoalService, GoalStats, GoalTransfer, GoalUpdate, NewGoal};
pub use limit::LimitService;
pub use stats::{BudgetStats, CategoryStats, MemberStats, StatsService};
pub use transaction::{
    NewTransaction, RecordedTransaction, TransactionFilter, TransactionService, TransactionUpdate,
};

use chrono::{Local, NaiveDate};

use crate::error::{BudgetError, BudgetResult};
use crate::models::{Budget, BudgetId, User};
use crate::storage::Storage;

/// Load a budget the user belongs to
pub(crate) fn require_member(storage: &Storage, budget_id: BudgetId, user: &User) -> BudgetResult<Budget> {
    let budget = storage.budgets.require(budget_id)?;
    if !budget.is_member(user.id) {
        return Err(BudgetError::Forbidden(format!(
            "{} is not a member of '{}'",
            user.display_name, budget.name
        )));
    }
    Ok(budget)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
