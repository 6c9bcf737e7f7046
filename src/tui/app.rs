//! Application state for the TUI
//!
//! `App` holds the live budget state, the page and dialog in front, and
//! runs the operations dialogs and shortcuts trigger. Store snapshots come
//! in through [`App::handle_store_event`]; writes go through the services
//! and come back as snapshots.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::Settings;
use crate::currency::{CurrencyManager, HttpRateSource, RateUpdate};
use crate::display::format_limit_alert;
use crate::error::{BudgetError, BudgetResult};
use crate::local::LocalStore;
use crate::models::{
    Budget, BudgetId, Category, CategoryId, Currency, Goal, GoalId, LimitId, LimitStatus,
    LimitUsage, Money, Transaction, TransactionId, TransactionKind, User,
};
use crate::services::{self, CategoryService, GoalService, LimitService, TransactionService};
use crate::storage::{Storage, StoreEvent};
use crate::sync::{BudgetChanges, LiveState, LiveUpdate, TransactionChanges};

use super::dialogs::category::CategoryForm;
use super::dialogs::goal::{GoalForm, TransferForm};
use super::dialogs::limit::LimitForm;
use super::dialogs::transaction::TransactionForm;
use super::theme::Palette;
use super::widgets::{Toast, ToastQueue};

/// Wait this long before retrying a failed rate refresh
const RATE_RETRY: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Home,
    Categories,
    Limits,
    Goals,
    Transactions,
    Settings,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Home,
        Page::Categories,
        Page::Limits,
        Page::Goals,
        Page::Transactions,
        Page::Settings,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Categories => "Categories",
            Page::Limits => "Limits",
            Page::Goals => "Goals",
            Page::Transactions => "Transactions",
            Page::Settings => "Settings",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Page::Home => "🏠",
            Page::Categories => "🏷",
            Page::Limits => "🚦",
            Page::Goals => "🎯",
            Page::Transactions => "💸",
            Page::Settings => "⚙",
        }
    }

    /// Page for a sidebar number key
    pub fn from_digit(c: char) -> Option<Page> {
        let n = c.to_digit(10)? as usize;
        n.checked_sub(1).and_then(|i| Page::ALL.get(i)).copied()
    }
}

/// Something the confirm dialog is about to delete
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Transaction { id: TransactionId, label: String },
    Category { id: CategoryId, name: String },
    Limit { id: LimitId, category: String },
    Goal { id: GoalId, name: String },
}

impl DeleteTarget {
    pub fn prompt(&self) -> String {
        match self {
            DeleteTarget::Transaction { label, .. } => format!("Delete {}?", label),
            DeleteTarget::Category { name, .. } => {
                format!("Delete category '{}'? Its transactions stay, its limit goes.", name)
            }
            DeleteTarget::Limit { category, .. } => format!("Remove the limit for {}?", category),
            DeleteTarget::Goal { name, .. } => format!("Delete goal '{}'?", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActiveDialog {
    #[default]
    None,
    Transaction,
    Category,
    Limit,
    Goal,
    Transfer,
    Confirm(DeleteTarget),
    Help,
}

pub struct App<'a> {
    pub storage: &'a Storage,
    pub settings: Settings,
    pub palette: Palette,
    pub user: User,
    pub live: LiveState,
    pub currency: CurrencyManager,
    rate_source: Option<HttpRateSource>,
    local: Option<LocalStore>,
    last_rate_attempt: Option<Instant>,

    pub page: Page,
    pub selected: usize,
    pub dialog: ActiveDialog,

    pub transaction_form: TransactionForm,
    pub category_form: CategoryForm,
    pub limit_form: LimitForm,
    pub goal_form: GoalForm,
    pub transfer_form: TransferForm,

    pub toasts: ToastQueue,
    /// Exceeded limits already announced
    alerted_limits: HashSet<LimitId>,
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(storage: &'a Storage, settings: Settings, user: User, budget_id: BudgetId) -> Self {
        let local = LocalStore::open(storage.paths().local_store_file())
            .map_err(|e| warn!(error = %e, "local store unavailable"))
            .ok();
        let interval = settings.rates_refresh_interval();
        let currency = local
            .as_ref()
            .and_then(|store| {
                CurrencyManager::with_cached_rates(settings.display_currency, interval, store)
                    .map_err(|e| warn!(error = %e, "cached rates unreadable"))
                    .ok()
            })
            .unwrap_or_else(|| CurrencyManager::new(settings.display_currency, interval));
        let rate_source = HttpRateSource::new(settings.rates_endpoint.clone())
            .map_err(|e| warn!(error = %e, "rate source unavailable"))
            .ok();

        let alerted_limits = LimitService::new(storage)
            .alerts(budget_id, services::today())
            .map(|usage| {
                usage
                    .into_iter()
                    .filter(|u| u.status == LimitStatus::Exceeded)
                    .map(|u| u.limit.id)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            storage,
            palette: Palette::for_theme(settings.theme),
            settings,
            user,
            live: LiveState::new(budget_id),
            currency,
            rate_source,
            local,
            last_rate_attempt: None,
            page: Page::default(),
            selected: 0,
            dialog: ActiveDialog::default(),
            transaction_form: TransactionForm::default(),
            category_form: CategoryForm::default(),
            limit_form: LimitForm::default(),
            goal_form: GoalForm::default(),
            transfer_form: TransferForm::default(),
            toasts: ToastQueue::new(),
            alerted_limits,
            should_quit: false,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn budget_id(&self) -> BudgetId {
        self.live.budget_id()
    }

    pub fn budget(&self) -> Option<&Budget> {
        self.live.budget()
    }

    pub fn budget_currency(&self) -> Currency {
        self.budget().map(|b| b.currency).unwrap_or_default()
    }

    pub fn today(&self) -> NaiveDate {
        services::today()
    }

    pub fn local_store(&self) -> Option<&LocalStore> {
        self.local.as_ref()
    }

    /// An amount of the budget currency, shown in the display currency
    pub fn money(&self, amount: Money) -> String {
        self.currency.display(amount, self.budget_currency())
    }

    pub fn categories(&self, kind: Option<TransactionKind>) -> Vec<&Category> {
        self.live
            .categories()
            .iter()
            .filter(|c| kind.map_or(true, |k| c.kind == k))
            .collect()
    }

    pub fn transactions(&self) -> Vec<&Transaction> {
        self.live.transactions()
    }

    pub fn limits(&self) -> Vec<LimitUsage> {
        LimitService::new(self.storage)
            .list_with_usage(self.budget_id(), self.today())
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to load limits");
                Vec::new()
            })
    }

    pub fn goals(&self) -> Vec<Goal> {
        GoalService::new(self.storage)
            .list(self.budget_id())
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to load goals");
                Vec::new()
            })
    }

    /// Rows the current page lets you select
    pub fn item_count(&self) -> usize {
        match self.page {
            Page::Categories => self.categories(None).len(),
            Page::Limits => self.limits().len(),
            Page::Goals => self.goals().len(),
            Page::Transactions => self.transactions().len(),
            Page::Home | Page::Settings => 0,
        }
    }

    pub fn switch_page(&mut self, page: Page) {
        self.page = page;
        self.selected = 0;
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.item_count() {
            self.selected += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.item_count();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }

    pub fn has_dialog(&self) -> bool {
        self.dialog != ActiveDialog::None
    }

    pub fn close_dialog(&mut self) {
        self.dialog = ActiveDialog::None;
    }

    /// Open the add income/expense dialog, picking up a saved draft
    pub fn open_transaction_dialog(&mut self, kind: TransactionKind) {
        self.transaction_form = TransactionForm::open(kind, self.local.as_ref());
        self.dialog = ActiveDialog::Transaction;
    }

    pub fn open_category_dialog(&mut self) {
        self.category_form = CategoryForm::default();
        self.dialog = ActiveDialog::Category;
    }

    pub fn open_limit_dialog(&mut self) {
        self.limit_form = LimitForm::default();
        self.dialog = ActiveDialog::Limit;
    }

    pub fn open_goal_dialog(&mut self) {
        self.goal_form = GoalForm::default();
        self.dialog = ActiveDialog::Goal;
    }

    /// Transfer into the selected goal
    pub fn open_transfer_dialog(&mut self) {
        let Some(goal) = self.goals().into_iter().nth(self.selected) else {
            return;
        };
        if goal.completed {
            self.toasts
                .push(Toast::info(format!("'{}' is already reached", goal.name)));
            return;
        }
        self.transfer_form = TransferForm::for_goal(&goal);
        self.dialog = ActiveDialog::Transfer;
    }

    /// Ask before deleting the selected row of the current page
    pub fn request_delete(&mut self) {
        let target = match self.page {
            Page::Transactions => self.transactions().get(self.selected).map(|t| {
                DeleteTarget::Transaction {
                    id: t.id,
                    label: format!("{} {} ({})", t.kind, self.money(t.amount), t.category),
                }
            }),
            Page::Categories => self
                .categories(None)
                .get(self.selected)
                .map(|c| DeleteTarget::Category {
                    id: c.id,
                    name: c.name.clone(),
                }),
            Page::Limits => self.limits().get(self.selected).map(|u| DeleteTarget::Limit {
                id: u.limit.id,
                category: u.limit.category.clone(),
            }),
            Page::Goals => self.goals().get(self.selected).map(|g| DeleteTarget::Goal {
                id: g.id,
                name: g.name.clone(),
            }),
            Page::Home | Page::Settings => None,
        };
        if let Some(target) = target {
            self.dialog = ActiveDialog::Confirm(target);
        }
    }

    /// Log a failure and show it as a toast
    pub fn report_error(&mut self, action: &str, err: &BudgetError) {
        warn!(error = %err, action, "tui action failed");
        self.toasts.push(Toast::error(err.to_string()));
    }

    /// Toast about something another member did
    fn notify(&mut self, toast: Toast) {
        if self.settings.notifications {
            self.toasts.push(toast);
        }
    }

    pub fn handle_store_event(&mut self, event: &StoreEvent) {
        match self.live.apply(event) {
            LiveUpdate::Budget(changes) => self.on_budget_changes(&changes),
            LiveUpdate::Transactions(changes) => self.on_transaction_changes(&changes),
            LiveUpdate::Categories(_) | LiveUpdate::Ignored => {}
        }
        self.clamp_selection();
    }

    fn on_budget_changes(&mut self, changes: &BudgetChanges) {
        if changes.initial {
            return;
        }
        if changes.removed {
            self.toasts.push(Toast::error("This budget was deleted"));
            return;
        }
        for member in &changes.joined {
            self.notify(Toast::info(format!("{} joined the budget", member.name)));
        }
        for member in &changes.left {
            self.notify(Toast::info(format!("{} left the budget", member.name)));
        }
    }

    fn on_transaction_changes(&mut self, changes: &TransactionChanges) {
        if changes.initial {
            return;
        }
        let messages: Vec<String> = self
            .transactions()
            .into_iter()
            .filter(|t| changes.added.contains(&t.id) && t.created_by != self.user.id)
            .map(|t| {
                format!(
                    "{} added {} {}: {}",
                    t.user_name,
                    if t.is_income() { "income" } else { "an expense" },
                    self.money(t.amount),
                    t.category
                )
            })
            .collect();
        for message in messages {
            self.notify(Toast::info(message));
        }
        if !changes.added.is_empty() || !changes.removed.is_empty() {
            self.check_limits();
        }
    }

    /// Announce limits that became exceeded since the last check
    fn check_limits(&mut self) {
        let usage = match LimitService::new(self.storage).alerts(self.budget_id(), self.today()) {
            Ok(usage) => usage,
            Err(e) => {
                warn!(error = %e, "limit check failed");
                return;
            }
        };
        let exceeded: Vec<LimitUsage> = usage
            .into_iter()
            .filter(|u| u.status == LimitStatus::Exceeded)
            .collect();
        let currency = self.budget_currency();
        let mut fresh = Vec::new();
        for u in &exceeded {
            if !self.alerted_limits.contains(&u.limit.id) {
                fresh.push(format_limit_alert(u, currency));
            }
        }
        self.alerted_limits = exceeded.iter().map(|u| u.limit.id).collect();
        for message in fresh {
            self.notify(Toast::warning(message));
        }
    }

    /// Housekeeping on every tick
    pub fn on_tick(&mut self) {
        self.toasts.remove_expired();

        if self.settings.auto_sync {
            if let Err(e) = self.storage.refresh_if_changed() {
                self.report_error("refresh", &e);
            }
        }

        let retry_due = self
            .last_rate_attempt
            .map_or(true, |at| at.elapsed() >= RATE_RETRY);
        if retry_due && self.currency.should_update_rates() {
            self.refresh_rates(false);
        }
    }

    /// Fetch exchange rates; `announce` reports success as well as failure
    pub fn refresh_rates(&mut self, announce: bool) {
        self.last_rate_attempt = Some(Instant::now());
        let Some(source) = self.rate_source.as_ref() else {
            return;
        };
        match self.currency.update_rates(source, self.local.as_ref()) {
            RateUpdate::Updated if announce => self.toasts.push(Toast::success("Exchange rates updated")),
            RateUpdate::Updated => {}
            RateUpdate::Fallback => self
                .toasts
                .push(Toast::warning("Could not fetch exchange rates, using built-in rates")),
        }
    }

    /// Pick up changes from other processes right away
    pub fn refresh_now(&mut self) {
        match self.storage.refresh_if_changed() {
            Ok(reloaded) if reloaded.is_empty() => self.toasts.push(Toast::info("Up to date")),
            Ok(_) => {}
            Err(e) => self.report_error("refresh", &e),
        }
    }

    pub fn submit_transaction(&mut self) -> BudgetResult<()> {
        let input = self.transaction_form.build(self.user.id, self.today(), &self.categories(None))?;
        let kind = input.kind;
        let recorded = TransactionService::new(self.storage).add_transaction(
            self.budget_id(),
            &self.user,
            input,
        )?;
        let amount = self.money(recorded.transaction.amount);
        self.live.apply_local_transaction(recorded.transaction.clone());

        if let Some(store) = &self.local {
            if let Err(e) = store.clear_draft(TransactionForm::DRAFT) {
                warn!(error = %e, "failed to clear transaction draft");
            }
        }
        self.close_dialog();
        self.toasts.push(Toast::success(format!(
            "{} of {} added",
            if kind.is_income() { "Income" } else { "Expense" },
            amount
        )));

        let currency = self.budget_currency();
        for alert in &recorded.alerts {
            if alert.status == LimitStatus::Exceeded {
                self.alerted_limits.insert(alert.limit.id);
            }
            self.notify(Toast::warning(format_limit_alert(alert, currency)));
        }
        Ok(())
    }

    pub fn submit_category(&mut self) -> BudgetResult<()> {
        let (name, kind, icon) = self.category_form.build()?;
        let category = CategoryService::new(self.storage).add(
            self.budget_id(),
            &self.user,
            &name,
            kind,
            icon.as_deref(),
            None,
        )?;
        self.close_dialog();
        self.toasts
            .push(Toast::success(format!("Category {} added", category.name)));
        Ok(())
    }

    pub fn submit_limit(&mut self) -> BudgetResult<()> {
        let (category, amount, period) = self.limit_form.build()?;
        let limit = LimitService::new(self.storage).set(
            self.budget_id(),
            &self.user,
            &category,
            amount,
            period,
        )?;
        self.close_dialog();
        self.toasts.push(Toast::success(format!(
            "{} limit for {}: {}",
            limit.period,
            limit.category,
            self.money(limit.amount)
        )));
        self.check_limits();
        Ok(())
    }

    pub fn submit_goal(&mut self) -> BudgetResult<()> {
        let today = self.today();
        let input = self.goal_form.build(today)?;
        let goal = GoalService::new(self.storage).add(self.budget_id(), &self.user, input, today)?;
        self.close_dialog();
        self.toasts
            .push(Toast::success(format!("Goal '{}' added", goal.name)));
        Ok(())
    }

    pub fn submit_transfer(&mut self) -> BudgetResult<()> {
        let (goal_id, amount) = self.transfer_form.build()?;
        let transfer = GoalService::new(self.storage).transfer(
            goal_id,
            &self.user,
            self.user.id,
            amount,
            self.today(),
        )?;
        self.close_dialog();
        self.toasts.push(Toast::success(format!(
            "Moved {} into '{}'",
            self.money(amount),
            transfer.goal.name
        )));
        if transfer.completed {
            self.toasts
                .push(Toast::success(format!("Goal '{}' reached!", transfer.goal.name)));
        }
        Ok(())
    }

    pub fn confirm_delete(&mut self, target: DeleteTarget) -> BudgetResult<()> {
        self.close_dialog();
        let message = match &target {
            DeleteTarget::Transaction { id, .. } => {
                TransactionService::new(self.storage).delete_transaction(*id, &self.user)?;
                "Transaction deleted".to_string()
            }
            DeleteTarget::Category { id, name } => {
                CategoryService::new(self.storage).delete(*id, &self.user, true)?;
                format!("Category '{}' deleted", name)
            }
            DeleteTarget::Limit { id, category } => {
                LimitService::new(self.storage).delete(*id, &self.user)?;
                self.alerted_limits.remove(id);
                format!("Limit for {} removed", category)
            }
            DeleteTarget::Goal { id, name } => {
                GoalService::new(self.storage).delete(*id, &self.user)?;
                format!("Goal '{}' deleted", name)
            }
        };
        self.toasts.push(Toast::success(message));
        self.clamp_selection();
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> BudgetResult<()> {
        self.settings.theme = self.settings.theme.toggled();
        self.palette = Palette::for_theme(self.settings.theme);
        self.save_settings()
    }

    /// Show amounts in the next supported currency
    pub fn cycle_display_currency(&mut self) -> BudgetResult<()> {
        let all = Currency::ALL;
        let current = all
            .iter()
            .position(|c| *c == self.settings.display_currency)
            .unwrap_or(0);
        let next = all[(current + 1) % all.len()];
        self.settings.display_currency = next;
        self.currency.set_currency(next);
        self.save_settings()
    }

    pub fn toggle_notifications(&mut self) -> BudgetResult<()> {
        self.settings.notifications = !self.settings.notifications;
        self.save_settings()
    }

    pub fn toggle_auto_sync(&mut self) -> BudgetResult<()> {
        self.settings.auto_sync = !self.settings.auto_sync;
        self.save_settings()
    }

    fn save_settings(&self) -> BudgetResult<()> {
        self.settings.save(self.storage.paths())?;
        info!("settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetPaths;
    use crate::services::{BudgetService, NewTransaction};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage, User, Budget) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(BudgetPaths::with_base_dir(dir.path().to_path_buf())).unwrap();
        storage.load_all().unwrap();
        let anna = User::new("anna@example.com", "Anna", "h");
        storage.users.upsert(anna.clone()).unwrap();
        let budget = BudgetService::new(&storage)
            .create_budget(&anna, "Home", Currency::Usd)
            .unwrap();
        (dir, storage, anna, budget)
    }

    fn offline_settings() -> Settings {
        Settings {
            rates_endpoint: "http://127.0.0.1:9/rates".into(),
            display_currency: Currency::Usd,
            ..Settings::default()
        }
    }

    fn feed(app: &mut App, storage: &Storage, budget_id: BudgetId) {
        for topic in [
            crate::storage::Topic::Budget(budget_id),
            crate::storage::Topic::Transactions(budget_id),
            crate::storage::Topic::Categories(budget_id),
        ] {
            let event = storage.snapshot_event(topic).unwrap();
            app.handle_store_event(&event);
        }
    }

    #[test]
    fn test_page_digits() {
        assert_eq!(Page::from_digit('1'), Some(Page::Home));
        assert_eq!(Page::from_digit('6'), Some(Page::Settings));
        assert_eq!(Page::from_digit('0'), None);
        assert_eq!(Page::from_digit('7'), None);
    }

    #[test]
    fn test_joined_member_raises_toast() {
        let (_dir, storage, anna, budget) = setup();
        let mut app = App::new(&storage, offline_settings(), anna, budget.id);
        feed(&mut app, &storage, budget.id);
        assert!(app.toasts.is_empty());

        let bob = User::new("bob@example.com", "Bob", "h");
        storage.users.upsert(bob.clone()).unwrap();
        BudgetService::new(&storage)
            .join_budget(&bob, &budget.invite_code)
            .unwrap();
        feed(&mut app, &storage, budget.id);

        assert_eq!(app.toasts.visible()[0].message, "Bob joined the budget");
    }

    #[test]
    fn test_other_members_transactions_are_announced() {
        let (_dir, storage, anna, budget) = setup();
        let bob = User::new("bob@example.com", "Bob", "h");
        storage.users.upsert(bob.clone()).unwrap();
        BudgetService::new(&storage)
            .join_budget(&bob, &budget.invite_code)
            .unwrap();

        let mut app = App::new(&storage, offline_settings(), anna, budget.id);
        feed(&mut app, &storage, budget.id);

        TransactionService::new(&storage)
            .add_transaction(
                budget.id,
                &bob,
                NewTransaction {
                    member: bob.id,
                    kind: TransactionKind::Expense,
                    amount: Money::from_minor(1_250),
                    category: "Groceries".into(),
                    description: String::new(),
                    date: services::today(),
                },
            )
            .unwrap();
        feed(&mut app, &storage, budget.id);

        let messages: Vec<&str> = app.toasts.visible().iter().map(|t| t.message.as_str()).collect();
        assert!(messages.contains(&"Bob added an expense $12.50: Groceries"));
    }

    #[test]
    fn test_notifications_off_silences_live_toasts() {
        let (_dir, storage, anna, budget) = setup();
        let settings = Settings {
            notifications: false,
            ..offline_settings()
        };
        let mut app = App::new(&storage, settings, anna, budget.id);
        feed(&mut app, &storage, budget.id);

        let bob = User::new("bob@example.com", "Bob", "h");
        storage.users.upsert(bob.clone()).unwrap();
        BudgetService::new(&storage)
            .join_budget(&bob, &budget.invite_code)
            .unwrap();
        feed(&mut app, &storage, budget.id);
        assert!(app.toasts.is_empty());
    }

    #[test]
    fn test_delete_prompt_for_selected_category() {
        let (_dir, storage, anna, budget) = setup();
        let mut app = App::new(&storage, offline_settings(), anna, budget.id);
        feed(&mut app, &storage, budget.id);

        app.switch_page(Page::Categories);
        app.request_delete();
        let ActiveDialog::Confirm(target) = app.dialog.clone() else {
            panic!("expected a confirm dialog");
        };
        assert!(target.prompt().starts_with("Delete category"));

        let before = app.categories(None).len();
        app.confirm_delete(target).unwrap();
        feed(&mut app, &storage, budget.id);
        assert_eq!(app.categories(None).len(), before - 1);
        assert!(!app.has_dialog());
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let (_dir, storage, anna, budget) = setup();
        let mut app = App::new(&storage, offline_settings(), anna, budget.id);
        feed(&mut app, &storage, budget.id);

        app.switch_page(Page::Transactions);
        app.move_down();
        assert_eq!(app.selected, 0);
        app.switch_page(Page::Categories);
        for _ in 0..100 {
            app.move_down();
        }
        assert_eq!(app.selected, app.item_count() - 1);
    }
}
