//! SQLite adapter for vendor contacts.

use rusqlite::{params, OptionalExtension, Row};

use crate::domain::contacts::{ContactFields, VendorContact};
use crate::domain::ports::{ContactRepository, PersistenceError};

use super::{db_err, map_sqlite, parse_timestamp, SqliteStore};

pub struct SqliteContactRepository {
    store: SqliteStore,
}

impl SqliteContactRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

const CONTACT_COLUMNS: &str =
    "id, app_id, name, email, phone, role, notes, is_primary, tags, created_at, updated_at";

const CONTACT_CONFLICT: &str = "Contact already exists for this app";

fn map_contact(row: &Row<'_>) -> Result<VendorContact, rusqlite::Error> {
    let is_primary: i64 = row.get(7)?;
    Ok(VendorContact {
        id: row.get(0)?,
        app_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        role: row.get(5)?,
        notes: row.get(6)?,
        is_primary: is_primary != 0,
        tags: row.get(8)?,
        created_at: parse_timestamp(row.get(9)?),
        updated_at: parse_timestamp(row.get(10)?),
    })
}

impl ContactRepository for SqliteContactRepository {
    fn list_for_app(&self, app_id: i64) -> Result<Vec<VendorContact>, PersistenceError> {
        let conn = self.store.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CONTACT_COLUMNS} FROM vendor_contacts
                 WHERE app_id = ?1
                 ORDER BY is_primary DESC, name ASC"
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map(params![app_id], map_contact).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn find(&self, id: i64) -> Result<Option<VendorContact>, PersistenceError> {
        let conn = self.store.lock()?;
        conn.query_row(
            &format!("SELECT {CONTACT_COLUMNS} FROM vendor_contacts WHERE id = ?1"),
            params![id],
            map_contact,
        )
        .optional()
        .map_err(db_err)
    }

    fn insert(
        &self,
        app_id: i64,
        fields: &ContactFields,
    ) -> Result<VendorContact, PersistenceError> {
        let id = {
            let conn = self.store.lock()?;
            conn.execute(
                "INSERT INTO vendor_contacts
                     (app_id, name, email, phone, role, notes, is_primary, tags)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    app_id,
                    fields.name,
                    fields.email,
                    fields.phone,
                    fields.role,
                    fields.notes,
                    i64::from(fields.is_primary),
                    fields.tags,
                ],
            )
            .map_err(|e| map_sqlite(e, CONTACT_CONFLICT))?;
            conn.last_insert_rowid()
        };
        self.find(id)?
            .ok_or_else(|| PersistenceError::not_found("contact"))
    }

    fn update(&self, id: i64, fields: &ContactFields) -> Result<VendorContact, PersistenceError> {
        {
            let conn = self.store.lock()?;
            // Blank email keeps the stored address so edits cannot strip
            // the uniqueness key.
            let email = (!fields.email.is_empty()).then_some(fields.email.as_str());
            let updated = conn
                .execute(
                    "UPDATE vendor_contacts SET
                         name = ?2,
                         email = COALESCE(?3, email),
                         phone = ?4,
                         role = ?5,
                         notes = ?6,
                         is_primary = ?7,
                         tags = ?8,
                         updated_at = CURRENT_TIMESTAMP
                     WHERE id = ?1",
                    params![
                        id,
                        fields.name,
                        email,
                        fields.phone,
                        fields.role,
                        fields.notes,
                        i64::from(fields.is_primary),
                        fields.tags,
                    ],
                )
                .map_err(|e| map_sqlite(e, CONTACT_CONFLICT))?;
            if updated == 0 {
                return Err(PersistenceError::not_found("contact"));
            }
        }
        self.find(id)?
            .ok_or_else(|| PersistenceError::not_found("contact"))
    }

    fn delete(&self, id: i64) -> Result<(), PersistenceError> {
        let conn = self.store.lock()?;
        let deleted = conn
            .execute("DELETE FROM vendor_contacts WHERE id = ?1", params![id])
            .map_err(db_err)?;
        if deleted == 0 {
            return Err(PersistenceError::not_found("contact"));
        }
        Ok(())
    }
}
