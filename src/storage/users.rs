//! User repository (users.json)

use crate::error::BudgetError;
use crate::models::{user::normalize_email, User};

use super::collection::Collection;

pub type UserRepository = Collection<User>;

impl Collection<User> {
    /// Look a user up by email, ignoring case and surrounding whitespace
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, BudgetError> {
        let email = normalize_email(email);
        Ok(self.filter(|u| u.email == email)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_by_email() {
        let temp_dir = TempDir::new().unwrap();
        let repo = UserRepository::new(temp_dir.path().join("users.json"));
        let user = User::new("anna@example.com", "Anna", "hash");
        repo.upsert(user.clone()).unwrap();

        let found = repo.find_by_email(" ANNA@example.com").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(repo.find_by_email("bob@example.com").unwrap().is_none());
    }
}
