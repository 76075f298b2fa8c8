//! SQLite adapter for the first-run setup state machine.

use rusqlite::{params, OptionalExtension};

use crate::domain::ports::{PersistenceError, SetupInit, SetupRepository, SetupState};
use crate::domain::users::DistrictRole;

use super::{db_err, map_sqlite, SqliteStore};

pub struct SqliteSetupRepository {
    store: SqliteStore,
}

impl SqliteSetupRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

impl SetupRepository for SqliteSetupRepository {
    fn state(&self) -> Result<SetupState, PersistenceError> {
        let conn = self.store.lock()?;
        let district_count: i64 = conn
            .query_row("SELECT COUNT(1) FROM districts", [], |row| row.get(0))
            .map_err(db_err)?;
        let user_count: i64 = conn
            .query_row("SELECT COUNT(1) FROM users", [], |row| row.get(0))
            .map_err(db_err)?;
        let first_slug: Option<String> = conn
            .query_row(
                "SELECT slug FROM districts ORDER BY id LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(SetupState {
            district_count,
            user_count,
            first_slug,
        })
    }

    fn initialize(&self, init: &SetupInit) -> Result<(), PersistenceError> {
        let conn = self.store.lock()?;
        let tx = conn.unchecked_transaction().map_err(db_err)?;

        // Re-check inside the transaction; two concurrent setup calls must
        // not both succeed.
        let existing: i64 = tx
            .query_row("SELECT COUNT(1) FROM districts", [], |row| row.get(0))
            .map_err(db_err)?;
        if existing > 0 {
            return Err(PersistenceError::conflict("Setup already complete"));
        }

        tx.execute(
            "INSERT INTO districts (name, slug, contact_email, created_by_email)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                init.district.name,
                init.district.slug,
                init.district.contact_email,
                init.district.created_by_email,
            ],
        )
        .map_err(|e| map_sqlite(e, "A district with this slug already exists"))?;
        let district_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO users (email, name, password_hash) VALUES (?1, ?2, ?3)
             ON CONFLICT (email) DO UPDATE
             SET name = excluded.name, password_hash = excluded.password_hash",
            params![init.admin_email, init.admin_name, init.admin_password_hash],
        )
        .map_err(db_err)?;

        tx.execute(
            "INSERT INTO district_users (district_id, email, name, role)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (district_id, email) DO UPDATE
             SET name = excluded.name, role = excluded.role",
            params![
                district_id,
                init.admin_email,
                init.admin_name,
                DistrictRole::Admin.as_str(),
            ],
        )
        .map_err(db_err)?;

        tx.commit().map_err(db_err)
    }
}
