//! Machine-local data: preferences, cached rates and drafts

use std::fs;
use std::path::PathBuf;

use clap::Subcommand;

use crate::error::{BudgetError, BudgetResult};
use crate::local::AppDataExport;

use super::context::CliContext;

#[derive(Subcommand)]
pub enum LocalCommands {
    /// Write local data as JSON (stdout when no file is given)
    Export { file: Option<PathBuf> },

    /// Replace local data with an export; the old data is kept as a local backup
    Import { file: PathBuf },

    /// Drop cached exchange rates and other cached values
    ClearCache,
}

pub fn handle_local_command(ctx: &CliContext, cmd: LocalCommands) -> BudgetResult<()> {
    let store = ctx.local_store()?;

    match cmd {
        LocalCommands::Export { file } => {
            let export = store.export_app_data()?;
            let json = serde_json::to_string_pretty(&export)
                .map_err(|e| BudgetError::Export(e.to_string()))?;
            match file {
                Some(path) => {
                    fs::write(&path, json)
                        .map_err(|e| BudgetError::Export(format!("Failed to write {}: {}", path.display(), e)))?;
                    println!("Exported {} local entries to {}", export.data.len(), path.display());
                }
                None => println!("{}", json),
            }
        }

        LocalCommands::Import { file } => {
            let json = fs::read_to_string(&file)
                .map_err(|e| BudgetError::Import(format!("Failed to read {}: {}", file.display(), e)))?;
            let export: AppDataExport = serde_json::from_str(&json)
                .map_err(|e| BudgetError::Import(format!("Invalid local data file: {}", e)))?;
            let backup_key = store.create_backup()?;
            store.import_app_data(&export)?;
            println!("Imported {} local entries (previous data saved as {})", export.data.len(), backup_key);
        }

        LocalCommands::ClearCache => {
            let removed = store.clear_cache()?;
            println!("Removed {} cached entries", removed);
        }
    }

    Ok(())
}
