//! Budget CLI commands
//!
//! Creating, joining and leaving shared budgets, the invite code, and
//! picking the budget the other commands act on.

use clap::Subcommand;

use crate::display::{format_budget_details, format_budget_list, format_invite};
use crate::error::{BudgetError, BudgetResult};
use crate::models::Currency;
use crate::services::{BudgetService, BudgetUpdate};

use super::context::CliContext;

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Show the active budget with its member cards
    Show,

    /// List your budgets
    List,

    /// Create a new budget and switch to it
    Create {
        name: String,
        /// Currency the budget is kept in
        #[arg(short, long, default_value = "PLN")]
        currency: String,
    },

    /// Join a family budget with its invite code
    Join { code: String },

    /// Leave the active budget (or the named one)
    Leave {
        budget: Option<String>,
        /// Skip the confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Show the invite code to share
    Invite,

    /// Rename the active budget
    Rename {
        name: String,
        /// Also set the description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Change the currency the budget is kept in (owner only)
    Currency { currency: String },

    /// Switch the active budget (name, invite code or ID)
    Use { budget: String },

    /// Rebuild member totals from the transactions
    Recalc,
}

pub fn handle_budget_command(ctx: &CliContext, cmd: BudgetCommands) -> BudgetResult<()> {
    let user = ctx.user()?;
    let service = BudgetService::new(ctx.storage());

    match cmd {
        BudgetCommands::Show => {
            let budget = ctx.active_budget(&user)?;
            println!("{}", format_budget_details(&budget));

            let display = ctx.settings().display_currency;
            if display != budget.currency {
                let currency = ctx.currency()?;
                println!(
                    "\nTotal in {}: {}",
                    display,
                    currency.display(budget.total_balance, budget.currency)
                );
            }
        }

        BudgetCommands::List => {
            let budgets = service.get_user_budgets(user.id)?;
            let active = ctx.auth().active_budget_id()?;
            println!("{}", format_budget_list(&budgets, active));
        }

        BudgetCommands::Create { name, currency } => {
            let currency = parse_currency(&currency)?;
            let budget = service.create_budget(&user, &name, currency)?;
            ctx.auth().set_active_budget(Some(budget.id))?;
            println!("Created budget '{}' ({}).", budget.name, budget.currency);
            println!("Invite code: {}", budget.invite_code);
        }

        BudgetCommands::Join { code } => {
            let budget = service.join_budget(&user, &code)?;
            ctx.auth().set_active_budget(Some(budget.id))?;
            println!(
                "Joined '{}'. {} of {} members.",
                budget.name,
                budget.members.len(),
                service.max_members()
            );
        }

        BudgetCommands::Leave { budget, force } => {
            let target = match budget {
                Some(input) => service.find_for_member(&user, &input)?,
                None => ctx.active_budget(&user)?,
            };
            if !force {
                println!(
                    "Leaving '{}' removes your member card. Your transactions stay in the budget.",
                    target.name
                );
                println!("Run again with --force to confirm.");
                return Ok(());
            }
            let left = service.leave_budget(target.id, &user)?;
            if ctx.auth().active_budget_id()? == Some(left.id) {
                ctx.auth().set_active_budget(None)?;
            }
            println!("You left '{}'.", left.name);
        }

        BudgetCommands::Invite => {
            let budget = ctx.active_budget(&user)?;
            println!("{}", format_invite(&service.invite_info(budget.id, &user)?));
        }

        BudgetCommands::Rename { name, description } => {
            let budget = ctx.active_budget(&user)?;
            let updated = service.update_budget(
                budget.id,
                &user,
                BudgetUpdate {
                    name: Some(name),
                    description,
                    currency: None,
                },
            )?;
            println!("Budget renamed to '{}'.", updated.name);
        }

        BudgetCommands::Currency { currency } => {
            let currency = parse_currency(&currency)?;
            let budget = ctx.active_budget(&user)?;
            let updated = service.update_budget(
                budget.id,
                &user,
                BudgetUpdate {
                    currency: Some(currency),
                    ..Default::default()
                },
            )?;
            println!(
                "'{}' is now kept in {} ({}). Amounts were not converted.",
                updated.name,
                updated.currency,
                updated.currency.name()
            );
        }

        BudgetCommands::Use { budget } => {
            let budget = service.find_for_member(&user, &budget)?;
            ctx.auth().set_active_budget(Some(budget.id))?;
            println!("Now using '{}'.", budget.name);
        }

        BudgetCommands::Recalc => {
            let budget = ctx.active_budget(&user)?;
            let report = service.recalculate_balances(budget.id)?;
            if report.corrected.is_empty() {
                println!("All member balances are correct.");
            } else {
                println!(
                    "Corrected the balances of {} member(s).",
                    report.corrected.len()
                );
            }
            println!("{}", format_budget_details(&report.budget));
        }
    }

    Ok(())
}

pub(crate) fn parse_currency(input: &str) -> BudgetResult<Currency> {
    input.parse().map_err(BudgetError::Validation)
}
