//! SQLite adapters for districts and district memberships.

use rusqlite::{params, OptionalExtension, Row};

use crate::domain::district::{District, DistrictSettingsPatch, NewDistrict};
use crate::domain::ports::{DistrictRepository, DistrictUserRepository, PersistenceError};
use crate::domain::users::{DistrictMember, DistrictRole};

use super::{db_err, map_sqlite, parse_timestamp, SqliteStore};

pub struct SqliteDistrictRepository {
    store: SqliteStore,
}

impl SqliteDistrictRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

const DISTRICT_COLUMNS: &str = "id, name, slug, contact_email, created_at, logo_url, \
     primary_color, accent_color, allowed_domain, google_client_id, google_client_secret";

fn map_district(row: &Row<'_>) -> Result<District, rusqlite::Error> {
    Ok(District {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        contact_email: row.get(3)?,
        created_at: parse_timestamp(row.get(4)?),
        logo_url: row.get(5)?,
        primary_color: row.get(6)?,
        accent_color: row.get(7)?,
        allowed_domain: row.get(8)?,
        google_client_id: row.get(9)?,
        google_client_secret: row.get(10)?,
    })
}

impl DistrictRepository for SqliteDistrictRepository {
    fn count(&self) -> Result<i64, PersistenceError> {
        let conn = self.store.lock()?;
        conn.query_row("SELECT COUNT(1) FROM districts", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<District>, PersistenceError> {
        let conn = self.store.lock()?;
        conn.query_row(
            &format!("SELECT {DISTRICT_COLUMNS} FROM districts WHERE slug = ?1"),
            params![slug],
            map_district,
        )
        .optional()
        .map_err(db_err)
    }

    fn first(&self) -> Result<Option<District>, PersistenceError> {
        let conn = self.store.lock()?;
        conn.query_row(
            &format!("SELECT {DISTRICT_COLUMNS} FROM districts ORDER BY id LIMIT 1"),
            [],
            map_district,
        )
        .optional()
        .map_err(db_err)
    }

    fn insert(&self, district: &NewDistrict) -> Result<i64, PersistenceError> {
        let conn = self.store.lock()?;
        conn.execute(
            "INSERT INTO districts (name, slug, contact_email, created_by_email)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                district.name,
                district.slug,
                district.contact_email,
                district.created_by_email,
            ],
        )
        .map_err(|e| map_sqlite(e, "A district with this slug already exists"))?;
        Ok(conn.last_insert_rowid())
    }

    fn update_settings(
        &self,
        slug: &str,
        patch: &DistrictSettingsPatch,
    ) -> Result<(), PersistenceError> {
        let conn = self.store.lock()?;
        // Masked or empty secrets keep the stored value.
        let updated = match patch.secret_to_store() {
            Some(secret) => conn.execute(
                "UPDATE districts SET
                     name = COALESCE(?2, name),
                     primary_color = COALESCE(?3, primary_color),
                     accent_color = COALESCE(?4, accent_color),
                     allowed_domain = COALESCE(?5, allowed_domain),
                     google_client_id = COALESCE(?6, google_client_id),
                     google_client_secret = ?7
                 WHERE slug = ?1",
                params![
                    slug,
                    patch.name,
                    patch.primary_color,
                    patch.accent_color,
                    patch.allowed_domain,
                    patch.google_client_id,
                    secret,
                ],
            ),
            None => conn.execute(
                "UPDATE districts SET
                     name = COALESCE(?2, name),
                     primary_color = COALESCE(?3, primary_color),
                     accent_color = COALESCE(?4, accent_color),
                     allowed_domain = COALESCE(?5, allowed_domain),
                     google_client_id = COALESCE(?6, google_client_id)
                 WHERE slug = ?1",
                params![
                    slug,
                    patch.name,
                    patch.primary_color,
                    patch.accent_color,
                    patch.allowed_domain,
                    patch.google_client_id,
                ],
            ),
        }
        .map_err(db_err)?;
        if updated == 0 {
            return Err(PersistenceError::not_found("district"));
        }
        Ok(())
    }

    fn set_logo_url(&self, slug: &str, logo_url: &str) -> Result<(), PersistenceError> {
        let conn = self.store.lock()?;
        let updated = conn
            .execute(
                "UPDATE districts SET logo_url = ?2 WHERE slug = ?1",
                params![slug, logo_url],
            )
            .map_err(db_err)?;
        if updated == 0 {
            return Err(PersistenceError::not_found("district"));
        }
        Ok(())
    }
}

pub struct SqliteDistrictUserRepository {
    store: SqliteStore,
}

impl SqliteDistrictUserRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

impl DistrictUserRepository for SqliteDistrictUserRepository {
    fn list(&self, slug: &str) -> Result<Vec<DistrictMember>, PersistenceError> {
        let conn = self.store.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT du.email, COALESCE(u.name, du.name), du.role, du.created_at
                 FROM district_users du
                 JOIN districts d ON d.id = du.district_id
                 LEFT JOIN users u ON u.email = du.email
                 WHERE d.slug = ?1
                 ORDER BY LOWER(du.email)",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![slug], |row| {
                let role: String = row.get(2)?;
                Ok(DistrictMember {
                    email: row.get(0)?,
                    name: row.get(1)?,
                    role: DistrictRole::parse(&role).unwrap_or(DistrictRole::Staff),
                    created_at: parse_timestamp(row.get(3)?),
                })
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn upsert(
        &self,
        district_id: i64,
        email: &str,
        name: &str,
        role: DistrictRole,
    ) -> Result<(), PersistenceError> {
        let conn = self.store.lock()?;
        conn.execute(
            "INSERT INTO district_users (district_id, email, name, role)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (district_id, email) DO UPDATE
             SET name = excluded.name, role = excluded.role",
            params![district_id, email, name, role.as_str()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn has_admin_role(&self, email: &str) -> Result<bool, PersistenceError> {
        let conn = self.store.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(1) FROM district_users WHERE email = ?1 AND role = 'admin'",
                params![email],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(count > 0)
    }
}
