//! YAML export: the JSON export in a form people can read and edit

use std::io::Write;

use crate::error::{BudgetError, BudgetResult};
use crate::export::json::BudgetExport;
use crate::models::BudgetId;
use crate::storage::Storage;

pub fn export_full_yaml<W: Write>(storage: &Storage, budget_id: BudgetId, mut writer: W) -> BudgetResult<()> {
    let export = BudgetExport::from_storage(storage, budget_id)?;
    let write_err = |e: std::io::Error| BudgetError::Export(e.to_string());

    writeln!(writer, "# Family budget export: {}", export.budget.name).map_err(write_err)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(write_err)?;
    writeln!(writer, "# App version: {}", export.app_version).map_err(write_err)?;
    writeln!(writer).map_err(write_err)?;

    serde_yaml::to_writer(writer, &export).map_err(|e| BudgetError::Export(e.to_string()))
}

/// Parse a YAML export; comment lines are ignored by the parser
pub fn read_export_yaml(yaml: &str) -> BudgetResult<BudgetExport> {
    let export: BudgetExport =
        serde_yaml::from_str(yaml).map_err(|e| BudgetError::Import(e.to_string()))?;
    export.validate().map_err(BudgetError::Import)?;
    Ok(export)
}
