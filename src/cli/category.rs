//! Category CLI commands

use std::fs;
use std::path::PathBuf;

use clap::Subcommand;

use crate::display::{format_category_list, format_category_usage};
use crate::error::{BudgetError, BudgetResult};
use crate::services::{CategoryService, CategorySort, CategoryUpdate};

use super::context::CliContext;
use super::transaction::parse_kind;

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category
    Add {
        name: String,
        /// "income" or "expense"
        #[arg(short, long, default_value = "expense")]
        kind: String,
        #[arg(short, long)]
        icon: Option<String>,
        /// Color as #RRGGBB (derived from the name when omitted)
        #[arg(long)]
        color: Option<String>,
    },

    /// List categories
    List {
        /// Only "income" or "expense" categories
        #[arg(short, long)]
        kind: Option<String>,
        /// Name search
        #[arg(short, long)]
        search: Option<String>,
        /// "name" or "usage"
        #[arg(long, default_value = "name")]
        sort: String,
        /// Show how often each category was used
        #[arg(short, long)]
        usage: bool,
    },

    /// Edit a category; a rename also renames its transactions and limit
    Edit {
        category: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        kind: Option<String>,
        #[arg(short, long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a category
    Delete {
        category: String,
        /// Delete even when transactions use it
        #[arg(short, long)]
        force: bool,
    },

    /// Write the categories to a JSON file (stdout when no file is given)
    Export { file: Option<PathBuf> },

    /// Add categories from a JSON export; existing names are skipped
    Import { file: PathBuf },
}

pub fn handle_category_command(ctx: &CliContext, cmd: CategoryCommands) -> BudgetResult<()> {
    let user = ctx.user()?;
    let budget = ctx.active_budget(&user)?;
    let service = CategoryService::new(ctx.storage());

    match cmd {
        CategoryCommands::Add {
            name,
            kind,
            icon,
            color,
        } => {
            let category = service.add(
                budget.id,
                &user,
                &name,
                parse_kind(&kind)?,
                icon.as_deref(),
                color.as_deref(),
            )?;
            println!(
                "Added {} category {} {} ({})",
                category.kind, category.icon, category.name, category.color
            );
        }

        CategoryCommands::List {
            kind,
            search,
            sort,
            usage,
        } => {
            if usage {
                let stats = service.usage_stats(budget.id)?;
                println!("{}", format_category_usage(&stats, budget.currency));
                return Ok(());
            }

            let kind = kind.map(|k| parse_kind(&k)).transpose()?;
            let sort: CategorySort = sort.parse().map_err(BudgetError::Validation)?;
            let categories = match search {
                Some(query) => service.search(budget.id, &query)?,
                None => service.sorted(budget.id, sort)?,
            };
            let categories: Vec<_> = categories
                .into_iter()
                .filter(|c| kind.map_or(true, |k| c.kind == k))
                .collect();
            println!("{}", format_category_list(&categories));
        }

        CategoryCommands::Edit {
            category,
            name,
            kind,
            icon,
            color,
        } => {
            let existing = service.find(budget.id, &category)?;
            let update = CategoryUpdate {
                name,
                kind: kind.map(|k| parse_kind(&k)).transpose()?,
                icon,
                color,
            };
            let updated = service.update(existing.id, &user, update)?;
            println!("Updated category {} {}", updated.icon, updated.name);
        }

        CategoryCommands::Delete { category, force } => {
            let existing = service.find(budget.id, &category)?;
            let deleted = service.delete(existing.id, &user, force)?;
            println!("Deleted category '{}'", deleted.name);
        }

        CategoryCommands::Export { file } => {
            let json = service.export_json(budget.id)?;
            match file {
                Some(path) => {
                    fs::write(&path, json)
                        .map_err(|e| BudgetError::Export(format!("Failed to write {}: {}", path.display(), e)))?;
                    println!("Categories exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        CategoryCommands::Import { file } => {
            let json = fs::read_to_string(&file)
                .map_err(|e| BudgetError::Import(format!("Failed to read {}: {}", file.display(), e)))?;
            let summary = service.import_json(budget.id, &user, &json)?;
            println!("Imported {} categories.", summary.added);
            if !summary.skipped.is_empty() {
                println!("Skipped existing: {}", summary.skipped.join(", "));
            }
        }
    }

    Ok(())
}
