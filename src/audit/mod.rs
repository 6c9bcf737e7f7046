//! Operation history
//!
//! Every committed create, update and delete is appended to `audit.log` as a
//! JSON line with the document before and after the change.
//!
//! ```rust,ignore
//! let entry = AuditEntry::update(EntityType::Goal, goal.id.to_string(), Some(goal.name.clone()), &before, &goal)
//!     .by(&user.display_name);
//! storage.batch().set_goal(goal).audit(entry).commit()?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
