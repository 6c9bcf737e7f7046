//! Local accounts
//!
//! Users live in the shared users collection with Argon2id password hashes.
//! The signed-in user of this machine is remembered in `session.json`.

mod manager;
pub mod password;
mod session;

pub use manager::{AuthListener, AuthManager};
pub use password::{hash_password, prompt_password, verify_password, Secret};
pub use session::Session;
