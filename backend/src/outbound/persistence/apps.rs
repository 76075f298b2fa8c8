//! SQLite adapter for the app catalog.

use rusqlite::{params, OptionalExtension, Row};

use crate::domain::catalog::{AppPatch, AppRecord, AppStatus, NewApp, SoppaStatus};
use crate::domain::ports::{AppRepository, PersistenceError};

use super::{db_err, map_sqlite, SqliteStore};

pub struct SqliteAppRepository {
    store: SqliteStore,
}

impl SqliteAppRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

const APP_COLUMNS: &str = "id, name, unique_id, notes, company, privacy_link, soppa_compliant, \
     otherdocs, invoices, status, tags, product_visibility, product_link";

fn map_app(row: &Row<'_>) -> Result<AppRecord, rusqlite::Error> {
    let soppa: Option<String> = row.get(6)?;
    let status: String = row.get(9)?;
    let visibility: i64 = row.get(11)?;
    Ok(AppRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        unique_id: row.get(2)?,
        notes: row.get(3)?,
        company: row.get(4)?,
        privacy_link: row.get(5)?,
        soppa_compliant: SoppaStatus::normalize(soppa.as_deref()),
        otherdocs: row.get(7)?,
        invoices: row.get(8)?,
        status: AppStatus::normalize(Some(&status)),
        tags: row.get(10)?,
        product_visibility: visibility != 0,
        product_link: row.get(12)?,
    })
}

impl AppRepository for SqliteAppRepository {
    fn list(&self) -> Result<Vec<AppRecord>, PersistenceError> {
        let conn = self.store.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {APP_COLUMNS} FROM apps ORDER BY name"))
            .map_err(db_err)?;
        let rows = stmt.query_map([], map_app).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn list_with_contact_counts(&self) -> Result<Vec<(AppRecord, i64)>, PersistenceError> {
        let conn = self.store.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT a.id, a.name, a.unique_id, a.notes, a.company, a.privacy_link,
                        a.soppa_compliant, a.otherdocs, a.invoices, a.status, a.tags,
                        a.product_visibility, a.product_link,
                        COUNT(vc.id) AS contact_count
                 FROM apps a
                 LEFT JOIN vendor_contacts vc ON vc.app_id = a.id
                 GROUP BY a.id
                 ORDER BY a.name",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| Ok((map_app(row)?, row.get(13)?)))
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn find(&self, id: i64) -> Result<Option<AppRecord>, PersistenceError> {
        let conn = self.store.lock()?;
        conn.query_row(
            &format!("SELECT {APP_COLUMNS} FROM apps WHERE id = ?1"),
            params![id],
            map_app,
        )
        .optional()
        .map_err(db_err)
    }

    fn insert(&self, app: &NewApp) -> Result<i64, PersistenceError> {
        let conn = self.store.lock()?;
        conn.execute(
            "INSERT INTO apps (name, unique_id, notes, company, privacy_link, soppa_compliant,
                               otherdocs, status, tags, product_visibility, product_link)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                app.name,
                app.unique_id,
                app.notes,
                app.company,
                app.privacy_link,
                app.soppa_compliant.map(SoppaStatus::as_str),
                app.otherdocs,
                app.status.as_str(),
                app.tags,
                i64::from(app.product_visibility),
                app.product_link,
            ],
        )
        .map_err(|e| map_sqlite(e, "An app with this identifier already exists"))?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, id: i64, patch: &AppPatch) -> Result<(), PersistenceError> {
        let conn = self.store.lock()?;
        let updated = conn
            .execute(
                "UPDATE apps SET
                     name = COALESCE(?2, name),
                     status = COALESCE(?3, status),
                     company = COALESCE(?4, company),
                     soppa_compliant = COALESCE(?5, soppa_compliant),
                     privacy_link = COALESCE(?6, privacy_link),
                     product_link = COALESCE(?7, product_link),
                     tags = COALESCE(?8, tags),
                     notes = COALESCE(?9, notes),
                     otherdocs = COALESCE(?10, otherdocs),
                     product_visibility = COALESCE(?11, product_visibility)
                 WHERE id = ?1",
                params![
                    id,
                    patch.name,
                    patch.status.map(AppStatus::as_str),
                    patch.company,
                    patch.soppa_compliant.map(SoppaStatus::as_str),
                    patch.privacy_link,
                    patch.product_link,
                    patch.tags,
                    patch.notes,
                    patch.otherdocs,
                    patch.product_visibility.map(i64::from),
                ],
            )
            .map_err(db_err)?;
        if updated == 0 {
            return Err(PersistenceError::not_found("app"));
        }
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<(), PersistenceError> {
        let conn = self.store.lock()?;
        let deleted = conn
            .execute("DELETE FROM apps WHERE id = ?1", params![id])
            .map_err(db_err)?;
        if deleted == 0 {
            return Err(PersistenceError::not_found("app"));
        }
        Ok(())
    }

    fn set_invoices(&self, id: i64, invoices: &str) -> Result<(), PersistenceError> {
        let conn = self.store.lock()?;
        // Empty string clears the column back to null.
        let stored = (!invoices.is_empty()).then_some(invoices);
        let updated = conn
            .execute(
                "UPDATE apps SET invoices = ?2 WHERE id = ?1",
                params![id, stored],
            )
            .map_err(db_err)?;
        if updated == 0 {
            return Err(PersistenceError::not_found("app"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contacts::ContactFields;
    use crate::domain::ports::ContactRepository;
    use crate::outbound::persistence::contacts::SqliteContactRepository;

    fn repo() -> SqliteAppRepository {
        SqliteAppRepository::new(SqliteStore::open_in_memory().expect("open"))
    }

    fn new_app(name: &str) -> NewApp {
        NewApp {
            name: name.into(),
            unique_id: uuid::Uuid::new_v4().to_string(),
            status: AppStatus::Approved,
            product_visibility: true,
            ..NewApp::default()
        }
    }

    #[test]
    fn insert_list_and_find() {
        let repo = repo();
        let id = repo.insert(&new_app("Zearn")).expect("insert");
        repo.insert(&new_app("Canva")).expect("insert");

        let listed = repo.list().expect("list");
        assert_eq!(
            listed.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            vec!["Canva", "Zearn"],
        );

        let found = repo.find(id).expect("query").expect("row");
        assert_eq!(found.status, AppStatus::Approved);
        assert!(found.product_visibility);
        assert!(found.invoices.is_none());
    }

    #[test]
    fn patch_merges_over_stored_values() {
        let repo = repo();
        let id = repo.insert(&new_app("Zearn")).expect("insert");
        repo.update(
            id,
            &AppPatch {
                status: Some(AppStatus::Denied),
                notes: Some("Vendor unresponsive".into()),
                product_visibility: Some(false),
                ..AppPatch::default()
            },
        )
        .expect("patch");

        let found = repo.find(id).expect("query").expect("row");
        assert_eq!(found.name, "Zearn");
        assert_eq!(found.status, AppStatus::Denied);
        assert_eq!(found.notes, "Vendor unresponsive");
        assert!(!found.product_visibility);
    }

    #[test]
    fn missing_rows_surface_not_found() {
        let repo = repo();
        assert!(matches!(
            repo.update(99, &AppPatch::default()),
            Err(PersistenceError::NotFound { .. })
        ));
        assert!(matches!(
            repo.delete(99),
            Err(PersistenceError::NotFound { .. })
        ));
    }

    #[test]
    fn invoices_column_clears_when_empty() {
        let repo = repo();
        let id = repo.insert(&new_app("Zearn")).expect("insert");
        repo.set_invoices(id, "static/documents/a.pdf").expect("set");
        let found = repo.find(id).expect("query").expect("row");
        assert_eq!(found.invoices.as_deref(), Some("static/documents/a.pdf"));

        repo.set_invoices(id, "").expect("clear");
        let found = repo.find(id).expect("query").expect("row");
        assert!(found.invoices.is_none());
    }

    #[test]
    fn contact_counts_ride_along_with_listings() {
        let store = SqliteStore::open_in_memory().expect("open");
        let apps = SqliteAppRepository::new(store.clone());
        let contacts = SqliteContactRepository::new(store);

        let with = apps.insert(&new_app("Canva")).expect("insert");
        apps.insert(&new_app("Zearn")).expect("insert");
        contacts
            .insert(
                with,
                &ContactFields {
                    name: "Sam Rivera".into(),
                    email: "sam@canva.com".into(),
                    ..ContactFields::default()
                },
            )
            .expect("contact");

        let listed = apps.list_with_contact_counts().expect("list");
        let counts: Vec<(&str, i64)> = listed
            .iter()
            .map(|(app, n)| (app.name.as_str(), *n))
            .collect();
        assert_eq!(counts, vec![("Canva", 1), ("Zearn", 0)]);
    }
}
