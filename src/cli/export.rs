//! Exporting the active budget

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::error::{BudgetError, BudgetResult};
use crate::export::{export_full_json, export_full_yaml, export_transactions_csv};
use crate::models::BudgetId;
use crate::storage::Storage;

use super::context::CliContext;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// Transactions only
    Csv,
    /// The whole budget with categories, goals and limits
    Json,
    /// Same as json, easier to read
    Yaml,
}

#[derive(Args)]
pub struct ExportArgs {
    #[arg(value_enum)]
    pub format: ExportFormat,
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn handle_export(ctx: &CliContext, args: ExportArgs) -> BudgetResult<()> {
    let user = ctx.user()?;
    let budget = ctx.active_budget(&user)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                BudgetError::Export(format!("Failed to create {}: {}", path.display(), e))
            })?;
            let mut writer = BufWriter::new(file);
            write_export(ctx.storage(), budget.id, args.format, &mut writer)?;
            writer.flush()?;
            println!("Exported '{}' to {}", budget.name, path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_export(ctx.storage(), budget.id, args.format, &mut lock)?;
            lock.flush()?;
        }
    }

    Ok(())
}

fn write_export<W: Write>(
    storage: &Storage,
    budget_id: BudgetId,
    format: ExportFormat,
    writer: W,
) -> BudgetResult<()> {
    match format {
        ExportFormat::Csv => export_transactions_csv(storage, budget_id, writer).map(|_| ()),
        ExportFormat::Json => export_full_json(storage, budget_id, writer),
        ExportFormat::Yaml => export_full_yaml(storage, budget_id, writer),
    }
}
