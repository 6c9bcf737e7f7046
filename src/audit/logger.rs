//! Append-only operation history (JSONL)

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{BudgetError, BudgetResult};
use crate::storage::file_io::modified_time;

use super::entry::AuditEntry;

/// Writes history entries, one JSON object per line
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    pub fn log(&self, entry: &AuditEntry) -> BudgetResult<()> {
        self.log_batch(std::slice::from_ref(entry))
    }

    /// Append several entries with a single flush
    pub fn log_batch(&self, entries: &[AuditEntry]) -> BudgetResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BudgetError::Io(format!("Failed to open audit log: {}", e)))?;

        for entry in entries {
            let json = serde_json::to_string(entry)
                .map_err(|e| BudgetError::Json(format!("Failed to serialize audit entry: {}", e)))?;
            writeln!(file, "{}", json)
                .map_err(|e| BudgetError::Io(format!("Failed to write audit entry: {}", e)))?;
        }

        file.flush()
            .map_err(|e| BudgetError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// All entries, oldest first
    ///
    /// Lines that fail to parse (for example a line cut short by a crash)
    /// are skipped.
    pub fn read_all(&self) -> BudgetResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| BudgetError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                BudgetError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(line = line_num + 1, error = %e, "skipping bad audit line"),
            }
        }

        Ok(entries)
    }

    /// The `count` most recent entries, newest first
    pub fn read_recent(&self, count: usize) -> BudgetResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        entries.reverse();
        entries.truncate(count);
        Ok(entries)
    }

    pub fn entry_count(&self) -> BudgetResult<usize> {
        Ok(self.read_all()?.len())
    }

    /// Keep only the newest `keep` entries. Returns how many were removed.
    pub fn compact(&self, keep: usize) -> BudgetResult<usize> {
        let entries = self.read_all()?;
        if entries.len() <= keep {
            return Ok(0);
        }
        let removed = entries.len() - keep;

        let temp_path = self.log_path.with_extension("log.tmp");
        {
            let mut file = File::create(&temp_path)
                .map_err(|e| BudgetError::Io(format!("Failed to create audit log: {}", e)))?;
            for entry in &entries[removed..] {
                let json = serde_json::to_string(entry)?;
                writeln!(file, "{}", json)?;
            }
            file.sync_all()?;
        }
        std::fs::rename(&temp_path, &self.log_path)
            .map_err(|e| BudgetError::Io(format!("Failed to replace audit log: {}", e)))?;

        Ok(removed)
    }

    /// Time of the last write, if the log exists
    pub fn last_modified(&self) -> Option<std::time::SystemTime> {
        modified_time(&self.log_path)
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{EntityType, Operation};
    use serde_json::json;
    use tempfile::TempDir;

    fn logger() -> (AuditLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        (logger, temp_dir)
    }

    fn entry(i: usize) -> AuditEntry {
        AuditEntry::create(
            EntityType::Transaction,
            format!("txn-{}", i),
            Some(format!("Groceries {}", i)),
            &json!({"amount": i}),
        )
    }

    #[test]
    fn test_log_and_read() {
        let (logger, _temp) = logger();
        logger.log(&entry(1)).unwrap();

        let entries = logger.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Create);
        assert!(logger.last_modified().is_some());
    }

    #[test]
    fn test_read_recent_newest_first() {
        let (logger, _temp) = logger();
        let batch: Vec<_> = (0..5).map(entry).collect();
        logger.log_batch(&batch).unwrap();

        let recent = logger.read_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entity_id, "txn-4");
        assert_eq!(recent[1].entity_id, "txn-3");
    }

    #[test]
    fn test_missing_log_is_empty() {
        let (logger, _temp) = logger();
        assert_eq!(logger.entry_count().unwrap(), 0);
        assert!(logger.read_recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let (logger, _temp) = logger();
        logger.log(&entry(1)).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(logger.path())
            .and_then(|mut f| writeln!(f, "{{\"truncated"))
            .unwrap();
        logger.log(&entry(2)).unwrap();

        assert_eq!(logger.entry_count().unwrap(), 2);
    }

    #[test]
    fn test_compact_keeps_newest() {
        let (logger, _temp) = logger();
        let batch: Vec<_> = (0..10).map(entry).collect();
        logger.log_batch(&batch).unwrap();

        assert_eq!(logger.compact(3).unwrap(), 7);
        let remaining = logger.read_all().unwrap();
        assert_eq!(remaining.len(), 3);
        assert_eq!(remaining[0].entity_id, "txn-7");
        assert_eq!(logger.compact(3).unwrap(), 0);
    }
}
