//! User accounts
//!
//! A user signs in with email and password and may belong to several budgets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Lower-cased email, unique across users
    pub email: String,

    /// Name shown on member cards
    pub display_name: String,

    /// Argon2id PHC string
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        display_name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let email = normalize_email(&email.into());
        let display_name = display_name.into().trim().to_string();
        let display_name = if display_name.is_empty() {
            default_display_name(&email)
        } else {
            display_name
        };

        Self {
            id: UserId::new(),
            email,
            display_name,
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Up to two upper-case initials of the display name
    pub fn initials(&self) -> String {
        crate::display::format::initials(&self.display_name)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.display_name, self.email)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Name used when a user registers without one: the local part of the email
pub fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_normalizes_email() {
        let user = User::new("  Anna@Example.COM ", "Anna", "hash");
        assert_eq!(user.email, "anna@example.com");
        assert_eq!(user.display_name, "Anna");
    }

    #[test]
    fn test_blank_display_name_falls_back_to_email() {
        let user = User::new("piotr@example.com", "  ", "hash");
        assert_eq!(user.display_name, "piotr");
    }

    #[test]
    fn test_display() {
        let user = User::new("ola@example.com", "Ola Nowak", "hash");
        assert_eq!(user.to_string(), "Ola Nowak <ola@example.com>");
        assert_eq!(user.initials(), "ON");
    }
}
