//! Operation history

use clap::Args;

use crate::error::BudgetResult;

use super::context::CliContext;

#[derive(Args)]
pub struct HistoryArgs {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    /// Trim the log to its newest entries
    #[arg(long)]
    pub compact: Option<usize>,
}

pub fn handle_history(ctx: &CliContext, args: HistoryArgs) -> BudgetResult<()> {
    let audit = ctx.storage().audit();

    if let Some(keep) = args.compact {
        let removed = audit.compact(keep)?;
        println!("Removed {} old history entries", removed);
        return Ok(());
    }

    let entries = audit.read_recent(args.limit)?;
    if entries.is_empty() {
        println!("No history yet.");
        return Ok(());
    }
    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
