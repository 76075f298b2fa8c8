//! Database migrations.
//!
//! Schema version is stored in `PRAGMA user_version`. Migrations are an
//! explicit, ordered, forward-only list; reruns are no-ops because each step
//! bumps the version it is keyed on.

use rusqlite::Connection;
use tracing::info;

use super::StoreError;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_V1: &str = "
CREATE TABLE users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    email         TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL DEFAULT '',
    password_hash TEXT,
    created_at    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    last_login    TEXT
);

CREATE TABLE districts (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    name                 TEXT NOT NULL,
    slug                 TEXT NOT NULL UNIQUE,
    contact_email        TEXT NOT NULL DEFAULT '',
    created_by_email     TEXT NOT NULL DEFAULT '',
    created_at           TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    logo_url             TEXT,
    primary_color        TEXT,
    accent_color         TEXT,
    allowed_domain       TEXT,
    google_client_id     TEXT,
    google_client_secret TEXT
);

CREATE TABLE district_users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    district_id INTEGER NOT NULL REFERENCES districts(id) ON DELETE CASCADE,
    email       TEXT NOT NULL,
    role        TEXT NOT NULL DEFAULT 'staff' CHECK (role IN ('admin', 'staff')),
    name        TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (district_id, email)
);

CREATE TABLE apps (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    name               TEXT NOT NULL,
    unique_id          TEXT NOT NULL UNIQUE,
    notes              TEXT NOT NULL DEFAULT '',
    company            TEXT NOT NULL DEFAULT '',
    privacy_link       TEXT NOT NULL DEFAULT '',
    soppa_compliant    TEXT,
    otherdocs          TEXT NOT NULL DEFAULT '',
    invoices           TEXT,
    status             TEXT NOT NULL DEFAULT 'Pending',
    tags               TEXT NOT NULL DEFAULT '',
    product_visibility INTEGER NOT NULL DEFAULT 1,
    product_link       TEXT NOT NULL DEFAULT ''
);

CREATE TABLE vendor_contacts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    app_id     INTEGER NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
    name       TEXT NOT NULL DEFAULT '',
    email      TEXT NOT NULL DEFAULT '',
    phone      TEXT NOT NULL DEFAULT '',
    role       TEXT NOT NULL DEFAULT '',
    notes      TEXT NOT NULL DEFAULT '',
    is_primary INTEGER NOT NULL DEFAULT 0,
    tags       TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (app_id, email)
);

CREATE TABLE app_activity_logs (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    action     TEXT NOT NULL CHECK (action IN ('create', 'update', 'delete')),
    app_id     INTEGER,
    app_name   TEXT,
    user_email TEXT,
    details    TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE app_requests (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    district_slug   TEXT NOT NULL,
    app_name        TEXT NOT NULL,
    company         TEXT,
    url             TEXT,
    notes           TEXT,
    requester_email TEXT NOT NULL,
    created_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), StoreError> {
    let current_version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(StoreError::Sqlite)?;

    if current_version == 0 {
        info!("initializing database schema v{SCHEMA_VERSION}");
        conn.execute_batch(SCHEMA_V1).map_err(StoreError::Sqlite)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(StoreError::Sqlite)?;
    } else if current_version < SCHEMA_VERSION {
        for version in (current_version + 1)..=SCHEMA_VERSION {
            info!("running migration to v{version}");
            run_migration(conn, version)?;
            conn.pragma_update(None, "user_version", version)
                .map_err(StoreError::Sqlite)?;
        }
    } else if current_version > SCHEMA_VERSION {
        return Err(StoreError::Migration(format!(
            "database version {current_version} is newer than supported {SCHEMA_VERSION}"
        )));
    }

    Ok(())
}

fn run_migration(conn: &Connection, version: u32) -> Result<(), StoreError> {
    let _ = conn;
    match version {
        // Future migrations go here.
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {version}"
        ))),
    }
}
