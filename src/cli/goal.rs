//! Savings goal CLI commands

use std::fs;
use std::path::PathBuf;

use clap::Subcommand;

use crate::currency::format_money;
use crate::display::{format_goal_list, format_goal_stats};
use crate::error::{BudgetError, BudgetResult};
use crate::models::GoalFilter;
use crate::services::{GoalService, GoalUpdate, NewGoal};
use crate::validation::{parse_amount, parse_date};

use super::context::{resolve_member, CliContext};

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Add a savings goal
    Add {
        name: String,
        /// Target amount
        target: String,
        /// Deadline (YYYY-MM-DD)
        deadline: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Color as #RRGGBB
        #[arg(long)]
        color: Option<String>,
    },

    /// List goals
    List {
        /// all, active, completed, overdue or close
        #[arg(short, long, default_value = "all")]
        filter: String,
    },

    /// Edit a goal
    Edit {
        goal: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        target: Option<String>,
        #[arg(long)]
        deadline: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a goal
    Delete {
        goal: String,
        #[arg(short, long)]
        force: bool,
    },

    /// Move money from a member's balance into a goal
    Transfer {
        goal: String,
        amount: String,
        /// Member paying in (defaults to you)
        #[arg(short, long)]
        member: Option<String>,
    },

    /// Progress over all goals
    Stats,

    /// Write the goals as JSON (stdout when no file is given)
    Export { file: Option<PathBuf> },
}

pub fn handle_goal_command(ctx: &CliContext, cmd: GoalCommands) -> BudgetResult<()> {
    let user = ctx.user()?;
    let budget = ctx.active_budget(&user)?;
    let service = GoalService::new(ctx.storage());
    let today = ctx.today();

    match cmd {
        GoalCommands::Add {
            name,
            target,
            deadline,
            description,
            color,
        } => {
            let goal = service.add(
                budget.id,
                &user,
                NewGoal {
                    name,
                    target_amount: parse_amount(&target)?,
                    deadline: parse_date(&deadline, today)?,
                    description,
                    color,
                },
                today,
            )?;
            println!(
                "Added goal '{}': {} by {}",
                goal.name,
                format_money(goal.target_amount, budget.currency),
                goal.deadline
            );
        }

        GoalCommands::List { filter } => {
            let filter: GoalFilter = filter.parse().map_err(BudgetError::Validation)?;
            let goals = service.filter(budget.id, filter, today)?;
            println!("{}", format_goal_list(&goals, budget.currency, today));
        }

        GoalCommands::Edit {
            goal,
            name,
            target,
            deadline,
            description,
            color,
        } => {
            let existing = service.find(budget.id, &goal)?;
            let update = GoalUpdate {
                name,
                target_amount: target.map(|t| parse_amount(&t)).transpose()?,
                deadline: deadline.map(|d| parse_date(&d, today)).transpose()?,
                description,
                color,
            };
            let updated = service.update(existing.id, &user, update, today)?;
            println!("Updated goal '{}'", updated.name);
            if updated.completed && !existing.completed {
                println!("Goal reached!");
            }
        }

        GoalCommands::Delete { goal, force } => {
            let existing = service.find(budget.id, &goal)?;
            if !force {
                println!(
                    "Goal '{}' has {} saved. The transfers stay booked as Savings expenses.",
                    existing.name,
                    format_money(existing.current_amount, budget.currency)
                );
                println!("Run again with --force to delete it.");
                return Ok(());
            }
            service.delete(existing.id, &user)?;
            println!("Deleted goal '{}'", existing.name);
        }

        GoalCommands::Transfer { goal, amount, member } => {
            let existing = service.find(budget.id, &goal)?;
            let member = match member {
                Some(input) => resolve_member(&budget, &input)?,
                None => user.id,
            };
            let transfer = service.transfer(existing.id, &user, member, parse_amount(&amount)?, today)?;
            println!(
                "Moved {} into '{}'. Saved {} of {}.",
                format_money(transfer.transaction.amount, budget.currency),
                transfer.goal.name,
                format_money(transfer.goal.current_amount, budget.currency),
                format_money(transfer.goal.target_amount, budget.currency)
            );
            if transfer.completed {
                println!("Goal reached!");
            }
        }

        GoalCommands::Stats => {
            print!("{}", format_goal_stats(&service.stats(budget.id, today)?, budget.currency));
        }

        GoalCommands::Export { file } => {
            let json = service.export_json(budget.id)?;
            match file {
                Some(path) => {
                    fs::write(&path, json)
                        .map_err(|e| BudgetError::Export(format!("Failed to write {}: {}", path.display(), e)))?;
                    println!("Goals exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}
