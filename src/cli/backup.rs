//! Backup CLI commands

use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::backup::{BackupInfo, BackupManager, RestoreManager};
use crate::display::format::{file_size, relative_time};
use crate::error::{BudgetError, BudgetResult};

use super::context::CliContext;

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Snapshot every collection into the backup directory
    Create,

    /// List backups, newest first
    List {
        #[arg(short, long)]
        verbose: bool,
    },

    /// Replace all data with a backup ("latest", a file name, a prefix or a path)
    Restore {
        backup: String,
        #[arg(short, long)]
        force: bool,
    },

    /// Check a backup and show what it contains
    Info { backup: String },

    /// Delete backups beyond the retention policy
    Prune {
        #[arg(short, long)]
        force: bool,
    },
}

pub fn handle_backup_command(ctx: &CliContext, cmd: BackupCommands) -> BudgetResult<()> {
    let paths = ctx.paths().clone();
    let retention = ctx.settings().backup_retention.clone();
    let manager = BackupManager::new(paths.clone(), retention.clone());
    let now = chrono::Utc::now();

    match cmd {
        BackupCommands::Create => {
            let (path, removed) = manager.create_backup_with_retention()?;
            println!("Backup created: {}", file_label(&path));
            if !removed.is_empty() {
                println!("Removed {} old backup(s)", removed.len());
            }
        }

        BackupCommands::List { verbose } => {
            let backups = manager.list_backups()?;
            if backups.is_empty() {
                println!("No backups yet. Create one with: famb backup create");
                return Ok(());
            }

            for (i, backup) in backups.iter().enumerate() {
                let monthly = if backup.is_monthly { " [monthly]" } else { "" };
                if verbose {
                    println!("{}. {}{}", i + 1, backup.filename, monthly);
                    println!("   Created: {}", backup.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
                    println!("   Size:    {}", file_size(backup.size_bytes));
                    println!("   Path:    {}", backup.path.display());
                } else {
                    println!(
                        "  {}. {} ({}, {}){}",
                        i + 1,
                        backup.filename,
                        relative_time(backup.created_at, now),
                        file_size(backup.size_bytes),
                        monthly
                    );
                }
            }
            println!("Total: {} backup(s)", backups.len());
        }

        BackupCommands::Restore { backup, force } => {
            let path = resolve_backup(&manager, &backup)?;
            let restore = RestoreManager::new(paths);
            let validation = restore.validate_backup(&path)?;

            println!("Backup:  {}", file_label(&path));
            println!("Created: {}", validation.backup_date.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("Status:  {}", validation.summary());

            if !force {
                println!();
                println!("This replaces ALL shared data on this machine.");
                println!("Run again with --force to restore.");
                return Ok(());
            }

            let safety = manager.create_backup()?;
            println!("Current data saved as {}", file_label(&safety));

            let result = restore.restore_from_file(&path)?;
            ctx.storage().load_all()?;
            println!("{}", result.summary());
            if !result.all_restored() {
                println!("Collections missing from the backup were left as they were.");
            }
        }

        BackupCommands::Info { backup } => {
            let path = resolve_backup(&manager, &backup)?;
            let validation = RestoreManager::new(paths).validate_backup(&path)?;
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

            println!("File:      {}", path.display());
            println!("Size:      {}", file_size(size));
            println!("Created:   {}", validation.backup_date.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("Schema:    v{}", validation.schema_version);
            println!("Documents: {}", validation.documents);
            println!("Contains:  {}", validation.present.join(", "));
            if !validation.missing.is_empty() {
                println!("Missing:   {}", validation.missing.join(", "));
            }
        }

        BackupCommands::Prune { force } => {
            let backups = manager.list_backups()?;
            let (monthly, daily): (Vec<&BackupInfo>, Vec<&BackupInfo>) =
                backups.iter().partition(|b| b.is_monthly);
            let excess = daily.len().saturating_sub(retention.daily_count as usize)
                + monthly.len().saturating_sub(retention.monthly_count as usize);

            println!(
                "Keeping {} daily and {} monthly; have {} daily and {} monthly",
                retention.daily_count,
                retention.monthly_count,
                daily.len(),
                monthly.len()
            );
            if excess == 0 {
                println!("Nothing to prune.");
                return Ok(());
            }
            if !force {
                println!("{} backup(s) would be deleted. Run again with --force.", excess);
                return Ok(());
            }

            let removed = manager.enforce_retention()?;
            println!("Deleted {} backup(s)", removed.len());
        }
    }

    Ok(())
}

fn resolve_backup(manager: &BackupManager, input: &str) -> BudgetResult<PathBuf> {
    if input == "latest" {
        return manager
            .get_latest_backup()?
            .map(|b| b.path)
            .ok_or_else(|| BudgetError::NotFound {
                entity_type: "Backup",
                identifier: "latest".into(),
            });
    }

    let path = PathBuf::from(input);
    if path.is_file() {
        return Ok(path);
    }

    manager
        .get_backup(input)?
        .map(|b| b.path)
        .ok_or_else(|| BudgetError::NotFound {
            entity_type: "Backup",
            identifier: input.to_string(),
        })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
