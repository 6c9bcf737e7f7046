//! Persisted sign-in session (session.json)

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BudgetError, BudgetResult};
use crate::models::{BudgetId, UserId};
use crate::storage::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,

    /// Budget the user last worked in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_budget_id: Option<BudgetId>,

    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            active_budget_id: None,
            signed_in_at: Utc::now(),
        }
    }

    /// Read the session file; `None` when nobody is signed in
    pub fn load(path: &Path) -> BudgetResult<Option<Self>> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> BudgetResult<()> {
        write_json_atomic(path, self)
    }

    pub fn clear(path: &Path) -> BudgetResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BudgetError::Io(format!("Failed to remove session: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_clear() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        assert_eq!(Session::load(&path).unwrap(), None);

        let mut session = Session::new(UserId::new());
        session.active_budget_id = Some(BudgetId::new());
        session.save(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), Some(session));

        Session::clear(&path).unwrap();
        Session::clear(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), None);
    }
}
