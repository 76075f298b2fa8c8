//! Vendor contacts attached to catalog entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A vendor contact row; owned by its app and cascade-deleted with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorContact {
    pub id: i64,
    pub app_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub notes: String,
    pub is_primary: bool,
    pub tags: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validated contact fields shared by create and update.
#[derive(Debug, Clone, Default)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub notes: String,
    pub tags: String,
    pub is_primary: bool,
}

impl ContactFields {
    /// Trim raw payload fields and collect validation messages.
    ///
    /// `require_email` distinguishes create (email mandatory, the row is
    /// unique on it) from update (blank email keeps the stored one).
    pub fn validate(
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        role: Option<&str>,
        notes: Option<&str>,
        tags: Option<&str>,
        is_primary: bool,
        require_email: bool,
    ) -> Result<Self, Vec<String>> {
        let trim = |v: Option<&str>| v.unwrap_or_default().trim().to_owned();
        let fields = Self {
            name: trim(name),
            email: trim(email),
            phone: trim(phone),
            role: trim(role),
            notes: trim(notes),
            tags: trim(tags),
            is_primary,
        };
        let mut errors = Vec::new();
        if fields.name.is_empty() {
            errors.push("Name is required".to_owned());
        }
        if require_email && fields.email.is_empty() {
            errors.push("Email is required".to_owned());
        }
        if errors.is_empty() { Ok(fields) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_trims_and_requires_name() {
        let fields = ContactFields::validate(
            Some("  Ada  "),
            Some("ada@vendor.com"),
            None,
            None,
            None,
            None,
            true,
            true,
        )
        .expect("valid payload");
        assert_eq!(fields.name, "Ada");
        assert!(fields.is_primary);

        let errors = ContactFields::validate(None, Some("a@b.c"), None, None, None, None, false, true)
            .expect_err("missing name");
        assert_eq!(errors, vec!["Name is required".to_owned()]);
    }

    #[test]
    fn update_tolerates_missing_email() {
        let fields =
            ContactFields::validate(Some("Ada"), None, None, None, None, None, false, false)
                .expect("email optional on update");
        assert!(fields.email.is_empty());
    }
}
