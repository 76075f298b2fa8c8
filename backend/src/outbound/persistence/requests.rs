//! SQLite adapter for staff app suggestions.

use rusqlite::params;

use crate::domain::ports::{AppRequestRepository, PersistenceError};
use crate::domain::requests::NewAppRequest;

use super::{db_err, SqliteStore};

pub struct SqliteAppRequestRepository {
    store: SqliteStore,
}

impl SqliteAppRequestRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

impl AppRequestRepository for SqliteAppRequestRepository {
    fn insert(&self, request: &NewAppRequest) -> Result<(), PersistenceError> {
        let conn = self.store.lock()?;
        conn.execute(
            "INSERT INTO app_requests
                 (district_slug, app_name, company, url, notes, requester_email)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                request.district_slug,
                request.app_name,
                request.company,
                request.url,
                request.notes,
                request.requester_email,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }
}
