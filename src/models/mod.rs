//! Core data models
//!
//! The documents shared by a family: users, budgets with their member cards,
//! transactions, categories, savings goals and spending limits.

pub mod budget;
pub mod category;
pub mod currency;
pub mod goal;
pub mod ids;
pub mod limit;
pub mod money;
pub mod period;
pub mod transaction;
pub mod user;

pub use budget::{Budget, Member, MemberDelta, MemberRole, MembershipError, MAX_MEMBERS};
pub use category::{Category, DefaultCategory, SAVINGS_CATEGORY};
pub use currency::Currency;
pub use goal::{Goal, GoalFilter};
pub use ids::{BudgetId, CategoryId, EntityId, GoalId, LimitId, TransactionId, UserId};
pub use limit::{Limit, LimitPeriod, LimitStatus, LimitUsage};
pub use money::{Money, MoneyParseError};
pub use period::{DateRange, StatsPeriod};
pub use transaction::{Transaction, TransactionKind};
pub use user::User;
