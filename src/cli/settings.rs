//! Settings CLI commands

use clap::Subcommand;

use crate::config::settings::Theme;
use crate::error::{BudgetError, BudgetResult};

use super::budget::parse_currency;
use super::context::CliContext;

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show all settings
    Show,

    /// Set the TUI theme: light, dark or toggle
    Theme { theme: String },

    /// Currency amounts are displayed in
    Currency { currency: String },

    /// Turn notifications on or off
    Notifications { state: String },

    /// Turn picking up other members' changes on or off
    #[command(name = "auto-sync")]
    AutoSync { state: String },
}

pub fn handle_settings_command(ctx: &mut CliContext, cmd: SettingsCommands) -> BudgetResult<()> {
    match cmd {
        SettingsCommands::Show => {
            let settings = ctx.settings();
            println!("Theme:            {}", settings.theme);
            println!(
                "Display currency: {} ({})",
                settings.display_currency,
                settings.display_currency.name()
            );
            println!("Notifications:    {}", on_off(settings.notifications));
            println!("Auto sync:        {}", on_off(settings.auto_sync));
            println!("Rates endpoint:   {}", settings.rates_endpoint);
            println!("Rates refresh:    every {} min", settings.rates_refresh_minutes);
            println!(
                "Backups kept:     {} daily, {} monthly",
                settings.backup_retention.daily_count, settings.backup_retention.monthly_count
            );
            return Ok(());
        }

        SettingsCommands::Theme { theme } => {
            let current = ctx.settings().theme;
            let theme = if theme.eq_ignore_ascii_case("toggle") {
                current.toggled()
            } else {
                theme.parse::<Theme>()?
            };
            ctx.settings_mut().theme = theme;
            println!("Theme set to {}", theme);
        }

        SettingsCommands::Currency { currency } => {
            let currency = parse_currency(&currency)?;
            ctx.settings_mut().display_currency = currency;
            println!("Amounts will be shown in {} ({})", currency, currency.name());
        }

        SettingsCommands::Notifications { state } => {
            let enabled = parse_switch(&state)?;
            ctx.settings_mut().notifications = enabled;
            println!("Notifications {}", on_off(enabled));
        }

        SettingsCommands::AutoSync { state } => {
            let enabled = parse_switch(&state)?;
            ctx.settings_mut().auto_sync = enabled;
            println!("Auto sync {}", on_off(enabled));
        }
    }

    ctx.save_settings()
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn parse_switch(input: &str) -> BudgetResult<bool> {
    match input.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(BudgetError::Validation(format!(
            "Expected on or off, got '{}'",
            other
        ))),
    }
}
