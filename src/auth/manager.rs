//! Sign-up, sign-in and the current user

use std::sync::RwLock;

use tracing::{info, warn};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{user::normalize_email, BudgetId, User};
use crate::storage::collection::{read_lock_error, write_lock_error};
use crate::storage::Storage;
use crate::validation::{validate_email, validate_password, validate_username};

use super::password::{hash_password, verify_password};
use super::session::Session;

/// Called with the signed-in user, or `None` after sign-out
pub type AuthListener = Box<dyn Fn(Option<&User>) + Send + Sync>;

/// Tracks who is signed in on this machine
pub struct AuthManager<'a> {
    storage: &'a Storage,
    session: RwLock<Option<Session>>,
    listeners: RwLock<Vec<AuthListener>>,
}

impl<'a> AuthManager<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            session: RwLock::new(None),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Pick up the session saved by an earlier run
    ///
    /// A session pointing at a user that no longer exists is discarded.
    pub fn restore(&self) -> BudgetResult<Option<User>> {
        let path = self.storage.paths().session_file();
        let Some(session) = Session::load(&path)? else {
            return Ok(None);
        };

        match self.storage.users.get(session.user_id)? {
            Some(user) => {
                *self.session.write().map_err(write_lock_error)? = Some(session);
                self.notify(Some(&user))?;
                Ok(Some(user))
            }
            None => {
                warn!(user_id = %session.user_id, "discarding session for unknown user");
                Session::clear(&path)?;
                Ok(None)
            }
        }
    }

    /// Create an account and sign in
    pub fn register(&self, email: &str, password: &str, display_name: &str) -> BudgetResult<User> {
        validate_email(email)?;
        validate_password(password)?;
        if !display_name.trim().is_empty() {
            validate_username(display_name)?;
        }

        self.storage.refresh_if_changed()?;
        let email = normalize_email(email);
        if self.storage.users.find_by_email(&email)?.is_some() {
            return Err(BudgetError::Duplicate {
                entity_type: "User",
                identifier: email,
            });
        }

        let user = User::new(&email, display_name, hash_password(password)?);
        let mut batch = self.storage.batch();
        batch.set_user(user.clone()).audit(
            AuditEntry::create(
                EntityType::User,
                user.id.to_string(),
                Some(user.email.clone()),
                &PublicUser::from(&user),
            )
            .by(&user.display_name),
        );
        batch.commit()?;

        info!(user = %user.email, "registered");
        self.start_session(&user)?;
        Ok(user)
    }

    pub fn login(&self, email: &str, password: &str) -> BudgetResult<User> {
        self.storage.refresh_if_changed()?;
        let invalid = || BudgetError::Auth("Invalid email or password".into());

        let user = self
            .storage
            .users
            .find_by_email(email)?
            .ok_or_else(invalid)?;
        if !verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        info!(user = %user.email, "signed in");
        self.start_session(&user)?;
        Ok(user)
    }

    /// Sign out and drop every live subscription
    pub fn logout(&self) -> BudgetResult<()> {
        Session::clear(&self.storage.paths().session_file())?;
        *self.session.write().map_err(write_lock_error)? = None;
        self.storage.feed().unsubscribe_all()?;
        self.notify(None)?;
        info!("signed out");
        Ok(())
    }

    /// The signed-in user as currently stored
    pub fn current_user(&self) -> BudgetResult<Option<User>> {
        let Some(user_id) = self.session()?.map(|s| s.user_id) else {
            return Ok(None);
        };
        self.storage.users.get(user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.session(), Ok(Some(_)))
    }

    pub fn require_user(&self) -> BudgetResult<User> {
        self.current_user()?.ok_or(BudgetError::NotAuthenticated)
    }

    pub fn session(&self) -> BudgetResult<Option<Session>> {
        Ok(self.session.read().map_err(read_lock_error)?.clone())
    }

    /// Remember which budget the user works in
    pub fn set_active_budget(&self, budget_id: Option<BudgetId>) -> BudgetResult<()> {
        let mut guard = self.session.write().map_err(write_lock_error)?;
        let session = guard.as_mut().ok_or(BudgetError::NotAuthenticated)?;
        session.active_budget_id = budget_id;
        session.save(&self.storage.paths().session_file())
    }

    pub fn active_budget_id(&self) -> BudgetResult<Option<BudgetId>> {
        Ok(self.session()?.and_then(|s| s.active_budget_id))
    }

    /// Change the display name, here and on every member card
    pub fn update_profile(&self, display_name: &str) -> BudgetResult<User> {
        validate_username(display_name)?;
        let before = self.require_user()?;
        let mut user = before.clone();
        user.display_name = display_name.trim().to_string();
        user.updated_at = chrono::Utc::now();

        let mut batch = self.storage.batch();
        batch.set_user(user.clone()).audit(
            AuditEntry::update(
                EntityType::User,
                user.id.to_string(),
                Some(user.email.clone()),
                &PublicUser::from(&before),
                &PublicUser::from(&user),
            )
            .by(&user.display_name),
        );

        for budget in self.storage.budgets.find_by_member(user.id)? {
            batch.rename_member(budget.id, user.id, user.display_name.clone());
        }
        batch.commit()?;

        self.notify(Some(&user))?;
        Ok(user)
    }

    /// Replace the password after checking the old one
    pub fn change_password(&self, current: &str, new: &str) -> BudgetResult<()> {
        let mut user = self.require_user()?;
        if !verify_password(current, &user.password_hash)? {
            return Err(BudgetError::Auth("Current password is incorrect".into()));
        }
        validate_password(new)?;
        user.password_hash = hash_password(new)?;
        user.updated_at = chrono::Utc::now();

        let mut batch = self.storage.batch();
        batch.set_user(user.clone()).audit(
            AuditEntry::update(
                EntityType::User,
                user.id.to_string(),
                Some(user.email.clone()),
                &PublicUser::from(&user),
                &PublicUser::from(&user),
            )
            .with_summary("password changed")
            .by(&user.display_name),
        );
        batch.commit()?;
        Ok(())
    }

    /// Register a callback for sign-in and sign-out
    pub fn on_auth_state_change<F>(&self, listener: F) -> BudgetResult<()>
    where
        F: Fn(Option<&User>) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .map_err(write_lock_error)?
            .push(Box::new(listener));
        Ok(())
    }

    fn start_session(&self, user: &User) -> BudgetResult<()> {
        let session = Session::new(user.id);
        session.save(&self.storage.paths().session_file())?;
        *self.session.write().map_err(write_lock_error)? = Some(session);
        self.notify(Some(user))
    }

    fn notify(&self, user: Option<&User>) -> BudgetResult<()> {
        let listeners = self.listeners.read().map_err(read_lock_error)?;
        for listener in listeners.iter() {
            listener(user);
        }
        Ok(())
    }
}

/// User fields written to the operation history (no password hash)
#[derive(serde::Serialize)]
struct PublicUser<'u> {
    email: &'u str,
    display_name: &'u str,
}

impl<'u> From<&'u User> for PublicUser<'u> {
    fn from(user: &'u User) -> Self {
        Self {
            email: &user.email,
            display_name: &user.display_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetPaths;
    use crate::models::{Budget, Currency};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> Storage {
        let storage = Storage::new(BudgetPaths::with_base_dir(dir.path().to_path_buf())).unwrap();
        storage.load_all().unwrap();
        storage
    }

    #[test]
    fn test_register_signs_in() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let auth = AuthManager::new(&storage);

        let user = auth.register("Anna@Example.com", "secret123", "Anna").unwrap();
        assert_eq!(user.email, "anna@example.com");
        assert!(auth.is_authenticated());
        assert_eq!(auth.require_user().unwrap().id, user.id);
    }

    #[test]
    fn test_register_rejects_duplicates_and_weak_passwords() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let auth = AuthManager::new(&storage);

        auth.register("anna@example.com", "secret123", "Anna").unwrap();
        let dup = auth.register("ANNA@example.com", "secret123", "Anna");
        assert!(matches!(dup, Err(BudgetError::Duplicate { .. })));
        assert!(auth.register("bob@example.com", "short", "Bob").unwrap_err().is_validation());
    }

    #[test]
    fn test_login_and_logout() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let auth = AuthManager::new(&storage);
        auth.register("anna@example.com", "secret123", "Anna").unwrap();
        auth.logout().unwrap();
        assert!(!auth.is_authenticated());
        assert!(matches!(auth.require_user(), Err(BudgetError::NotAuthenticated)));

        assert!(auth.login("anna@example.com", "wrong123").unwrap_err().is_auth());
        assert!(auth.login("nobody@example.com", "secret123").unwrap_err().is_auth());
        let user = auth.login(" anna@example.com", "secret123").unwrap();
        assert_eq!(user.display_name, "Anna");
    }

    #[test]
    fn test_session_survives_restart() {
        let dir = TempDir::new().unwrap();
        let user_id = {
            let storage = storage(&dir);
            let auth = AuthManager::new(&storage);
            auth.register("anna@example.com", "secret123", "Anna").unwrap().id
        };

        let storage = storage(&dir);
        let auth = AuthManager::new(&storage);
        assert!(!auth.is_authenticated());
        let restored = auth.restore().unwrap().unwrap();
        assert_eq!(restored.id, user_id);
    }

    #[test]
    fn test_listeners_hear_sign_in_and_out() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let auth = AuthManager::new(&storage);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        auth.on_auth_state_change(move |user| {
            sink.lock().unwrap().push(user.map(|u| u.display_name.clone()));
        })
        .unwrap();

        auth.register("anna@example.com", "secret123", "Anna").unwrap();
        auth.logout().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Some("Anna".to_string()), None]);
    }

    #[test]
    fn test_update_profile_renames_member_cards() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let auth = AuthManager::new(&storage);
        let user = auth.register("anna@example.com", "secret123", "Anna").unwrap();

        let budget = Budget::new("Home", &user, Currency::Pln);
        let mut batch = storage.batch();
        batch.set_budget(budget.clone());
        batch.commit().unwrap();

        auth.update_profile("Anna Nowak").unwrap();
        let stored = storage.budgets.require(budget.id).unwrap();
        assert_eq!(stored.member(user.id).unwrap().name, "Anna Nowak");
        assert_eq!(auth.require_user().unwrap().display_name, "Anna Nowak");
    }

    #[test]
    fn test_active_budget_requires_session() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let auth = AuthManager::new(&storage);
        assert!(auth.set_active_budget(Some(BudgetId::new())).is_err());

        auth.register("anna@example.com", "secret123", "Anna").unwrap();
        let id = BudgetId::new();
        auth.set_active_budget(Some(id)).unwrap();
        assert_eq!(auth.active_budget_id().unwrap(), Some(id));
    }
}
