//! What every command handler needs: storage, settings and the signed-in user

use chrono::NaiveDate;
use tracing::debug;

use crate::auth::{prompt_password, AuthManager, Secret};
use crate::config::paths::BudgetPaths;
use crate::config::settings::Settings;
use crate::currency::CurrencyManager;
use crate::error::{BudgetError, BudgetResult};
use crate::local::LocalStore;
use crate::models::{Budget, User, UserId};
use crate::services::{self, BudgetService};
use crate::storage::Storage;

pub struct CliContext<'a> {
    storage: &'a Storage,
    settings: Settings,
    auth: AuthManager<'a>,
}

impl<'a> CliContext<'a> {
    /// Build the context and pick up a saved session
    pub fn new(storage: &'a Storage, settings: Settings) -> BudgetResult<Self> {
        let auth = AuthManager::new(storage);
        auth.restore()?;
        Ok(Self {
            storage,
            settings,
            auth,
        })
    }

    pub fn storage(&self) -> &'a Storage {
        self.storage
    }

    pub fn paths(&self) -> &BudgetPaths {
        self.storage.paths()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn save_settings(&self) -> BudgetResult<()> {
        self.settings.save(self.paths())
    }

    pub fn auth(&self) -> &AuthManager<'a> {
        &self.auth
    }

    /// The signed-in user, or `NotAuthenticated`
    pub fn user(&self) -> BudgetResult<User> {
        self.auth.require_user()
    }

    /// The budget commands act on
    ///
    /// This is the budget picked with `budget use` while the user is still a
    /// member of it, otherwise the user's first budget. A user without any
    /// budget gets a fresh one.
    pub fn active_budget(&self, user: &User) -> BudgetResult<Budget> {
        let service = BudgetService::new(self.storage);
        if let Some(id) = self.auth.active_budget_id()? {
            match service.get_budget(id) {
                Ok(budget) if budget.is_member(user.id) => return Ok(budget),
                Ok(_) => debug!(budget_id = %id, "no longer a member of active budget"),
                Err(e) if e.is_not_found() => debug!(budget_id = %id, "active budget is gone"),
                Err(e) => return Err(e),
            }
        }

        let budget = service.load_or_create(user)?;
        self.auth.set_active_budget(Some(budget.id))?;
        Ok(budget)
    }

    pub fn local_store(&self) -> BudgetResult<LocalStore> {
        LocalStore::open(self.paths().local_store_file())
    }

    /// Currency manager in the display currency with the cached rate table
    pub fn currency(&self) -> BudgetResult<CurrencyManager> {
        let store = self.local_store()?;
        CurrencyManager::with_cached_rates(
            self.settings.display_currency,
            self.settings.rates_refresh_interval(),
            &store,
        )
    }

    pub fn today(&self) -> NaiveDate {
        services::today()
    }
}

/// Use the given password or ask for it without echo
pub fn password_or_prompt(given: Option<String>, prompt: &str) -> BudgetResult<Secret> {
    match given {
        Some(password) => Ok(Secret::new(password)),
        None => prompt_password(prompt),
    }
}

/// Member of `budget` by name, email or name prefix
pub fn resolve_member(budget: &Budget, input: &str) -> BudgetResult<UserId> {
    let needle = input.trim().to_lowercase();
    let exact = budget
        .members
        .iter()
        .find(|m| m.name.to_lowercase() == needle || m.email == needle);
    if let Some(member) = exact {
        return Ok(member.user_id);
    }

    let mut prefixed = budget
        .members
        .iter()
        .filter(|m| m.name.to_lowercase().starts_with(&needle));
    match (prefixed.next(), prefixed.next()) {
        (Some(member), None) => Ok(member.user_id),
        (Some(_), Some(_)) => Err(BudgetError::Validation(format!(
            "'{}' matches more than one member",
            input
        ))),
        _ => Err(BudgetError::member_not_found(input)),
    }
}
