//! Deployment configuration read from the environment.
//!
//! Every knob has a development default except `SECRET_KEY`, which must be
//! provided so session cookies survive restarts and cannot be forged with a
//! known key. Parsing is pure (`from_vars` takes a lookup closure) so tests
//! never touch the process environment.

use std::path::PathBuf;

use actix_web::cookie::Key;
use thiserror::Error as ThisError;

use crate::domain::users::fold_email;

const DEFAULT_FRONTEND_ORIGINS: &str = "http://127.0.0.1:5173,http://localhost:5173";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_DB_PATH: &str = "data/alexandria.db";
const DEFAULT_UPLOAD_DIR: &str = "static/documents";
const DEFAULT_INIT_ADMIN_EMAIL: &str = "admin";
const DEFAULT_DISTRICT_NAME: &str = "Default District";
const DEFAULT_DISTRICT_CONTACT: &str = "admin@example.com";
const MIN_SECRET_BYTES: usize = 32;

/// Configuration errors that abort startup.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ConfigError {
    #[error("SECRET_KEY must be set")]
    MissingSecret,
    #[error("SECRET_KEY must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,
    #[error("PORT is not a valid port number: {raw}")]
    InvalidPort { raw: String },
}

/// Resolved deployment settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Session-cookie signing secret, required.
    pub session_secret: String,
    /// Hardens cookies when serving over HTTPS (`PRODUCTION=1`).
    pub production: bool,
    /// Frontend origins allowed to call the API with credentials.
    pub frontend_origins: Vec<String>,
    /// Emails granted admin regardless of district membership.
    pub admin_emails: Vec<String>,
    /// Environment fallback for Google SSO when the district stores none.
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    /// External base URL; the OAuth redirect URI is derived from it.
    pub public_base_url: String,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// Seed admin account created at startup when a password is provided.
    pub init_admin_email: String,
    pub init_admin_password: Option<String>,
    /// Singleton district created on first start.
    pub district_name: String,
    pub district_contact_email: String,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

impl AppConfig {
    /// Resolve settings through a lookup closure.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the secret is absent or too short, or the
    /// port does not parse.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let session_secret = var("SECRET_KEY").ok_or(ConfigError::MissingSecret)?;
        if session_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::WeakSecret);
        }

        let init_admin_email = fold_email(
            &var("INIT_ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_INIT_ADMIN_EMAIL.to_owned()),
        );

        // The seed admin is always on the allow-list so a fresh deployment
        // has at least one admin.
        let mut admin_emails: Vec<String> = var("ADMIN_EMAILS")
            .map(|raw| split_list(&raw).iter().map(|e| fold_email(e)).collect())
            .unwrap_or_default();
        if !admin_emails.contains(&init_admin_email) {
            admin_emails.push(init_admin_email.clone());
        }

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { raw })?,
            None => 8080,
        };

        Ok(Self {
            session_secret,
            production: var("PRODUCTION").as_deref() == Some("1"),
            frontend_origins: split_list(
                &var("FRONTEND_ORIGINS").unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_owned()),
            ),
            admin_emails,
            google_client_id: var("GOOGLE_CLIENT_ID").filter(|v| !v.is_empty()),
            google_client_secret: var("GOOGLE_CLIENT_SECRET").filter(|v| !v.is_empty()),
            public_base_url: var("PUBLIC_DOMAIN")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_owned()),
            db_path: PathBuf::from(
                var("SQLITE_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_owned()),
            ),
            upload_dir: PathBuf::from(
                var("UPLOAD_FOLDER").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_owned()),
            ),
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port,
            init_admin_email,
            init_admin_password: var("INIT_ADMIN_PASSWORD").filter(|v| !v.is_empty()),
            district_name: var("DISTRICT_NAME").unwrap_or_else(|| DEFAULT_DISTRICT_NAME.to_owned()),
            district_contact_email: var("DISTRICT_CONTACT_EMAIL")
                .unwrap_or_else(|| DEFAULT_DISTRICT_CONTACT.to_owned()),
        })
    }

    /// Resolve settings from the process environment.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Cookie signing key derived from the secret.
    #[must_use]
    pub fn session_key(&self) -> Key {
        Key::derive_from(self.session_secret.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_vars(|name| map.get(name).cloned())
    }

    #[rstest]
    fn missing_secret_is_rejected() {
        let err = config(&[]).expect_err("missing secret");
        assert_eq!(err, ConfigError::MissingSecret);
    }

    #[rstest]
    fn defaults_apply_with_only_a_secret() {
        let cfg = config(&[("SECRET_KEY", SECRET)]).expect("config");
        assert!(!cfg.production);
        assert_eq!(
            cfg.frontend_origins,
            vec!["http://127.0.0.1:5173", "http://localhost:5173"]
        );
        assert_eq!(cfg.public_base_url, "http://localhost:8080");
        assert_eq!(cfg.db_path, PathBuf::from("data/alexandria.db"));
        assert_eq!(cfg.upload_dir, PathBuf::from("static/documents"));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.init_admin_email, "admin");
        assert_eq!(cfg.admin_emails, vec!["admin"]);
        assert!(cfg.init_admin_password.is_none());
    }

    #[rstest]
    fn short_secret_is_rejected() {
        let err = config(&[("SECRET_KEY", "short")]).expect_err("weak secret");
        assert_eq!(err, ConfigError::WeakSecret);
    }

    #[rstest]
    fn admin_list_is_folded_and_includes_seed_admin() {
        let cfg = config(&[
            ("SECRET_KEY", SECRET),
            ("ADMIN_EMAILS", " Lead@X.org, ops@x.org ,"),
            ("INIT_ADMIN_EMAIL", "Root@X.org"),
        ])
        .expect("config");
        assert_eq!(cfg.admin_emails, vec!["lead@x.org", "ops@x.org", "root@x.org"]);
        assert_eq!(cfg.init_admin_email, "root@x.org");
    }

    #[rstest]
    fn seed_admin_is_not_duplicated() {
        let cfg = config(&[
            ("SECRET_KEY", SECRET),
            ("ADMIN_EMAILS", "admin"),
        ])
        .expect("config");
        assert_eq!(cfg.admin_emails, vec!["admin"]);
    }

    #[rstest]
    #[case("1", true)]
    #[case("0", false)]
    #[case("true", false)]
    fn production_requires_exactly_one(#[case] raw: &str, #[case] expected: bool) {
        let cfg = config(&[("SECRET_KEY", SECRET), ("PRODUCTION", raw)]).expect("config");
        assert_eq!(cfg.production, expected);
    }

    #[rstest]
    fn invalid_port_is_rejected() {
        let err = config(&[("SECRET_KEY", SECRET), ("PORT", "eighty")]).expect_err("port");
        assert_eq!(
            err,
            ConfigError::InvalidPort {
                raw: "eighty".into()
            }
        );
    }

    #[rstest]
    fn blank_google_credentials_collapse_to_none() {
        let cfg = config(&[("SECRET_KEY", SECRET), ("GOOGLE_CLIENT_ID", "")]).expect("config");
        assert!(cfg.google_client_id.is_none());
    }
}
