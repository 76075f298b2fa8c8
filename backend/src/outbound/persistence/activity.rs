//! SQLite adapter for the append-only audit log.

use rusqlite::params;

use crate::domain::activity::ActivityEntry;
use crate::domain::ports::{ActivityLog, PersistenceError};

use super::{db_err, SqliteStore};

pub struct SqliteActivityLog {
    store: SqliteStore,
}

impl SqliteActivityLog {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

impl ActivityLog for SqliteActivityLog {
    fn record(&self, entry: &ActivityEntry) -> Result<(), PersistenceError> {
        let details = entry
            .details
            .as_ref()
            .map(serde_json::Value::to_string);
        let conn = self.store.lock()?;
        conn.execute(
            "INSERT INTO app_activity_logs (action, app_id, app_name, user_email, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.action.as_str(),
                entry.app_id,
                entry.app_name,
                entry.user_email,
                details,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }
}
