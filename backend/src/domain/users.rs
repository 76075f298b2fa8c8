//! User accounts and district membership records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A local or OAuth-provisioned user account.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    /// Stored case-folded; uniqueness is enforced on this form.
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
}

/// Fields for inserting a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Membership role inside the district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistrictRole {
    Admin,
    Staff,
}

impl DistrictRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }

    /// Parse a role string; unknown values are rejected.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }
}

/// A district membership row as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictMember {
    pub email: String,
    pub name: String,
    pub role: DistrictRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Case-fold an identifier the way account lookups expect it.
#[must_use]
pub fn fold_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Default display name derived from the local part of an email address.
#[must_use]
pub fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_owned()
}
