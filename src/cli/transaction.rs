//! Transaction CLI commands

use clap::Subcommand;

use crate::currency::format_money;
use crate::display::{format_limit_alert, format_stats, format_transaction_details, format_transaction_list};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{StatsPeriod, TransactionKind};
use crate::services::{
    NewTransaction, StatsService, TransactionFilter, TransactionService, TransactionUpdate,
};
use crate::validation::{parse_amount, parse_date};

use super::context::{resolve_member, CliContext};

#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record income or an expense
    Add {
        /// "income" or "expense"
        kind: String,
        /// Amount, e.g. 45.20 or 45,20
        amount: String,
        /// Category name
        category: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Booking date (YYYY-MM-DD, "today", "yesterday")
        #[arg(long, default_value = "today")]
        date: String,
        /// Member the money belongs to (defaults to you)
        #[arg(short, long)]
        member: Option<String>,
    },

    /// List transactions, newest first
    List {
        #[arg(short, long)]
        member: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// "income" or "expense"
        #[arg(short, long)]
        kind: Option<String>,
        #[arg(long)]
        date: Option<String>,
        /// Text in the description or category
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show one transaction
    Show { id: String },

    /// Edit a transaction
    Edit {
        id: String,
        #[arg(long)]
        kind: Option<String>,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(short, long)]
        member: Option<String>,
    },

    /// Delete a transaction
    Delete {
        id: String,
        #[arg(short, long)]
        force: bool,
    },

    /// Income, expenses and balance for a period
    Stats {
        /// today, week, month, quarter, year, 7d, 30d or all
        #[arg(short, long, default_value = "month")]
        period: String,
    },
}

pub fn handle_transaction_command(ctx: &CliContext, cmd: TransactionCommands) -> BudgetResult<()> {
    let user = ctx.user()?;
    let budget = ctx.active_budget(&user)?;
    let service = TransactionService::new(ctx.storage());
    let today = ctx.today();

    match cmd {
        TransactionCommands::Add {
            kind,
            amount,
            category,
            description,
            date,
            member,
        } => {
            let member = match member {
                Some(input) => resolve_member(&budget, &input)?,
                None => user.id,
            };
            let recorded = service.add_transaction(
                budget.id,
                &user,
                NewTransaction {
                    member,
                    kind: parse_kind(&kind)?,
                    amount: parse_amount(&amount)?,
                    category,
                    description,
                    date: parse_date(&date, today)?,
                },
            )?;

            let txn = &recorded.transaction;
            println!(
                "Recorded {} {} in {} for {} ({})",
                txn.kind,
                format_money(txn.amount, budget.currency),
                txn.category,
                txn.user_name,
                txn.id
            );
            if ctx.settings().notifications {
                for alert in &recorded.alerts {
                    println!("{}", format_limit_alert(alert, budget.currency));
                }
            }
        }

        TransactionCommands::List {
            member,
            category,
            kind,
            date,
            search,
            limit,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(member) = member {
                filter = filter.user(resolve_member(&budget, &member)?);
            }
            if let Some(category) = category {
                filter = filter.category(category);
            }
            if let Some(kind) = kind {
                filter = filter.kind(parse_kind(&kind)?);
            }
            if let Some(date) = date {
                filter = filter.date(parse_date(&date, today)?);
            }
            if let Some(search) = search {
                filter = filter.search(search);
            }

            let transactions = service.list(budget.id, &filter)?;
            println!("{}", format_transaction_list(&transactions, budget.currency));
        }

        TransactionCommands::Show { id } => {
            let txn = service.find(budget.id, &id)?;
            print!("{}", format_transaction_details(&txn, budget.currency));
        }

        TransactionCommands::Edit {
            id,
            kind,
            amount,
            category,
            description,
            date,
            member,
        } => {
            let txn = service.find(budget.id, &id)?;
            let update = TransactionUpdate {
                member: member.map(|m| resolve_member(&budget, &m)).transpose()?,
                kind: kind.map(|k| parse_kind(&k)).transpose()?,
                amount: amount.map(|a| parse_amount(&a)).transpose()?,
                category,
                description,
                date: date.map(|d| parse_date(&d, today)).transpose()?,
            };
            if update.is_empty() {
                return Err(BudgetError::Validation("Nothing to change".into()));
            }
            let updated = service.update_transaction(txn.id, &user, update)?;
            println!("Updated transaction {}", updated.id);
            print!("{}", format_transaction_details(&updated, budget.currency));
        }

        TransactionCommands::Delete { id, force } => {
            let txn = service.find(budget.id, &id)?;
            if !force {
                print!("{}", format_transaction_details(&txn, budget.currency));
                println!("Run again with --force to delete this transaction.");
                return Ok(());
            }
            service.delete_transaction(txn.id, &user)?;
            println!("Deleted transaction {}", txn.id);
        }

        TransactionCommands::Stats { period } => {
            let period: StatsPeriod = period.parse().map_err(BudgetError::Validation)?;
            let stats = StatsService::new(ctx.storage());
            let totals = stats.budget_stats(budget.id, period, today)?;
            let members = stats.by_member(budget.id, period, today)?;
            let categories = stats.by_category(budget.id, TransactionKind::Expense, period, today)?;
            print!("{}", format_stats(&totals, &members, &categories, budget.currency));
            println!();
        }
    }

    Ok(())
}

pub(crate) fn parse_kind(input: &str) -> BudgetResult<TransactionKind> {
    input.parse().map_err(BudgetError::Validation)
}
