//! Spending limit CLI commands

use clap::Subcommand;

use crate::currency::format_money;
use crate::display::format_limit_list;
use crate::error::{BudgetError, BudgetResult};
use crate::models::LimitPeriod;
use crate::services::LimitService;
use crate::validation::parse_amount;

use super::context::CliContext;

#[derive(Subcommand)]
pub enum LimitCommands {
    /// Set (or replace) the limit of an expense category
    Set {
        category: String,
        amount: String,
        /// daily, weekly, monthly or yearly
        #[arg(short, long, default_value = "monthly")]
        period: String,
    },

    /// Limits with what was spent in the current period
    List,

    /// Remove a limit (category name or limit ID)
    Delete { limit: String },
}

pub fn handle_limit_command(ctx: &CliContext, cmd: LimitCommands) -> BudgetResult<()> {
    let user = ctx.user()?;
    let budget = ctx.active_budget(&user)?;
    let service = LimitService::new(ctx.storage());

    match cmd {
        LimitCommands::Set {
            category,
            amount,
            period,
        } => {
            let period: LimitPeriod = period.parse().map_err(BudgetError::Validation)?;
            let limit = service.set(budget.id, &user, &category, parse_amount(&amount)?, period)?;
            println!(
                "{} limit for {}: {}",
                limit.period,
                limit.category,
                format_money(limit.amount, budget.currency)
            );
        }

        LimitCommands::List => {
            let usage = service.list_with_usage(budget.id, ctx.today())?;
            println!("{}", format_limit_list(&usage, budget.currency));
        }

        LimitCommands::Delete { limit } => {
            let existing = service.find(budget.id, &limit)?;
            service.delete(existing.id, &user)?;
            println!("Removed the limit for {}", existing.category);
        }
    }

    Ok(())
}
