//! Catalog entry aggregate and its closed vocabularies.
//!
//! `status` and `soppa_compliant` are validated against closed enumerations on
//! write. Invalid or empty values fall back silently (`Pending` for status,
//! absent for compliance) instead of failing the request; that leniency is the
//! documented contract, not an accident.

use serde::{Deserialize, Serialize};

/// Review status of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Not Supported by District")]
    NotSupported,
    #[serde(rename = "Approved for Use")]
    Approved,
    #[serde(rename = "Use Alternate")]
    UseAlternate,
    #[serde(rename = "Core Tool")]
    CoreTool,
    #[serde(rename = "Supplemental Tool")]
    SupplementalTool,
    #[serde(rename = "Reviewed & Denied")]
    Denied,
}

impl AppStatus {
    /// Canonical display string, as stored and serialised.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::NotSupported => "Not Supported by District",
            Self::Approved => "Approved for Use",
            Self::UseAlternate => "Use Alternate",
            Self::CoreTool => "Core Tool",
            Self::SupplementalTool => "Supplemental Tool",
            Self::Denied => "Reviewed & Denied",
        }
    }

    const ALL: [Self; 7] = [
        Self::Pending,
        Self::NotSupported,
        Self::Approved,
        Self::UseAlternate,
        Self::CoreTool,
        Self::SupplementalTool,
        Self::Denied,
    ];

    /// Parse a canonical status string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Lenient write-side normalisation: missing, empty, or out-of-enum
    /// values land as [`AppStatus::Pending`].
    #[must_use]
    pub fn normalize(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(Self::parse)
            .unwrap_or(Self::Pending)
    }
}

impl Default for AppStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// SOPPA compliance classification of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoppaStatus {
    #[serde(rename = "Compliant")]
    Compliant,
    #[serde(rename = "Staff use only")]
    StaffUseOnly,
    #[serde(rename = "Not applicable")]
    NotApplicable,
    #[serde(rename = "Unknown")]
    Unknown,
    #[serde(rename = "Policies are SOPPA compliant")]
    PoliciesCompliant,
    #[serde(rename = "Not fully SOPPA compliant")]
    NotFullyCompliant,
    #[serde(rename = "Noncompliant")]
    Noncompliant,
    #[serde(rename = "Parent consent required")]
    ParentConsentRequired,
}

impl SoppaStatus {
    /// Canonical display string, as stored and serialised.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "Compliant",
            Self::StaffUseOnly => "Staff use only",
            Self::NotApplicable => "Not applicable",
            Self::Unknown => "Unknown",
            Self::PoliciesCompliant => "Policies are SOPPA compliant",
            Self::NotFullyCompliant => "Not fully SOPPA compliant",
            Self::Noncompliant => "Noncompliant",
            Self::ParentConsentRequired => "Parent consent required",
        }
    }

    const ALL: [Self; 8] = [
        Self::Compliant,
        Self::StaffUseOnly,
        Self::NotApplicable,
        Self::Unknown,
        Self::PoliciesCompliant,
        Self::NotFullyCompliant,
        Self::Noncompliant,
        Self::ParentConsentRequired,
    ];

    /// Parse a canonical compliance string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Lenient write-side normalisation: missing, empty, or out-of-enum
    /// values land as `None` (stored null).
    #[must_use]
    pub fn normalize(value: Option<&str>) -> Option<Self> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(Self::parse)
    }
}

/// A vetted third-party software product as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppRecord {
    pub id: i64,
    pub name: String,
    pub unique_id: String,
    pub notes: String,
    pub company: String,
    pub privacy_link: String,
    pub soppa_compliant: Option<SoppaStatus>,
    pub otherdocs: String,
    /// Comma-joined stored invoice paths; absent when none uploaded.
    pub invoices: Option<String>,
    pub status: AppStatus,
    pub tags: String,
    pub product_visibility: bool,
    pub product_link: String,
}

/// Fields accepted when creating a catalog entry.
#[derive(Debug, Clone, Default)]
pub struct NewApp {
    pub name: String,
    /// Opaque identifier minted at creation (UUID v4).
    pub unique_id: String,
    pub notes: String,
    pub company: String,
    pub privacy_link: String,
    pub soppa_compliant: Option<SoppaStatus>,
    pub otherdocs: String,
    pub status: AppStatus,
    pub tags: String,
    pub product_visibility: bool,
    pub product_link: String,
}

/// Partial update of a catalog entry.
///
/// `None` fields keep the stored value (COALESCE merge); `Some` fields
/// replace it.
#[derive(Debug, Clone, Default)]
pub struct AppPatch {
    pub name: Option<String>,
    pub status: Option<AppStatus>,
    pub company: Option<String>,
    pub soppa_compliant: Option<SoppaStatus>,
    pub privacy_link: Option<String>,
    pub product_link: Option<String>,
    pub tags: Option<String>,
    pub notes: Option<String>,
    pub otherdocs: Option<String>,
    pub product_visibility: Option<bool>,
}

/// Split a comma-joined invoice column into trimmed, non-empty entries.
#[must_use]
pub fn split_invoices(stored: Option<&str>) -> Vec<String> {
    stored
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Join invoice entries back into the stored comma-joined form.
#[must_use]
pub fn join_invoices(entries: &[String]) -> String {
    entries.join(",")
}
