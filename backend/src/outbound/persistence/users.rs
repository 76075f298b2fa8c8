//! SQLite adapter for user accounts.

use rusqlite::{params, OptionalExtension, Row};

use crate::domain::ports::{PersistenceError, UserRepository};
use crate::domain::users::{NewUser, UserRecord};

use super::{db_err, map_sqlite, SqliteStore};

pub struct SqliteUserRepository {
    store: SqliteStore,
}

impl SqliteUserRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

fn map_row(row: &Row<'_>) -> Result<UserRecord, rusqlite::Error> {
    Ok(UserRecord {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
    })
}

impl UserRepository for SqliteUserRepository {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, PersistenceError> {
        let conn = self.store.lock()?;
        conn.query_row(
            "SELECT id, email, name, password_hash FROM users WHERE email = ?1",
            params![email],
            map_row,
        )
        .optional()
        .map_err(db_err)
    }

    fn insert(&self, user: &NewUser) -> Result<i64, PersistenceError> {
        let conn = self.store.lock()?;
        conn.execute(
            "INSERT INTO users (email, name, password_hash) VALUES (?1, ?2, ?3)",
            params![user.email, user.name, user.password_hash],
        )
        .map_err(|e| map_sqlite(e, "Account already exists"))?;
        Ok(conn.last_insert_rowid())
    }

    fn upsert_oauth(&self, email: &str, name: &str) -> Result<(), PersistenceError> {
        let conn = self.store.lock()?;
        conn.execute(
            "INSERT INTO users (email, name) VALUES (?1, ?2)
             ON CONFLICT (email) DO UPDATE
             SET name = excluded.name, last_login = CURRENT_TIMESTAMP",
            params![email, name],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn count(&self) -> Result<i64, PersistenceError> {
        let conn = self.store.lock()?;
        conn.query_row("SELECT COUNT(1) FROM users", [], |row| row.get(0))
            .map_err(db_err)
    }
}
