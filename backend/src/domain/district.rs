//! The singleton district: branding, contact details, and SSO credentials.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Placeholder shown to clients instead of a stored secret.
pub const SECRET_MASK: &str = "********";

/// Slug used for the bootstrap district in single-tenant deployments.
pub const DEFAULT_SLUG: &str = "local";

/// District row as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct District {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub contact_email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub accent_color: Option<String>,
    /// Comma-separated email domains allowed for OAuth sign-in; absent means
    /// no restriction.
    pub allowed_domain: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
}

/// District view returned to clients: identical to the row except the stored
/// secret is replaced with [`SECRET_MASK`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub contact_email: String,
    pub created_at: Option<DateTime<Utc>>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub accent_color: Option<String>,
    pub allowed_domain: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
}

impl From<District> for DistrictView {
    fn from(d: District) -> Self {
        let masked = d.google_client_secret.map(|_| SECRET_MASK.to_owned());
        Self {
            id: d.id,
            name: d.name,
            slug: d.slug,
            contact_email: d.contact_email,
            created_at: d.created_at,
            logo_url: d.logo_url,
            primary_color: d.primary_color,
            accent_color: d.accent_color,
            allowed_domain: d.allowed_domain,
            google_client_id: d.google_client_id,
            google_client_secret: masked,
        }
    }
}

/// Fields for creating the district row.
#[derive(Debug, Clone)]
pub struct NewDistrict {
    pub name: String,
    pub slug: String,
    pub contact_email: String,
    pub created_by_email: String,
}

/// Admin settings update.
///
/// `name` keeps the stored value when absent; the remaining branding fields
/// are written as provided. The secret is only written when present and not
/// the mask, so a round-tripped [`DistrictView`] never clobbers it.
#[derive(Debug, Clone, Default)]
pub struct DistrictSettingsPatch {
    pub name: Option<String>,
    pub primary_color: Option<String>,
    pub accent_color: Option<String>,
    pub allowed_domain: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
}

impl DistrictSettingsPatch {
    /// The secret to persist, if this patch should touch it at all.
    #[must_use]
    pub fn secret_to_store(&self) -> Option<&str> {
        self.google_client_secret
            .as_deref()
            .filter(|s| !s.is_empty() && *s != SECRET_MASK)
    }
}

/// Google SSO credentials resolved for the deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleSsoConfig {
    pub client_id: String,
    pub client_secret: String,
    pub allowed_domain: Option<String>,
}

impl GoogleSsoConfig {
    /// Check an email's domain against the comma-separated allow-list.
    /// No configured restriction admits every domain.
    #[must_use]
    pub fn domain_allowed(&self, email: &str) -> bool {
        let Some(ref setting) = self.allowed_domain else {
            return true;
        };
        if setting.trim().is_empty() {
            return true;
        }
        let user_domain = email.rsplit('@').next().unwrap_or("").to_lowercase();
        setting
            .split(',')
            .map(|d| d.trim().to_lowercase())
            .any(|d| d == user_domain)
    }
}

/// Validate a district slug: lowercase letters, digits, and dashes only.
#[must_use]
pub fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn district() -> District {
        District {
            id: 1,
            name: "X".into(),
            slug: "x".into(),
            contact_email: "admin@x.org".into(),
            created_at: None,
            logo_url: None,
            primary_color: None,
            accent_color: None,
            allowed_domain: None,
            google_client_id: Some("cid".into()),
            google_client_secret: Some("very-secret".into()),
        }
    }

    #[test]
    fn view_masks_stored_secret() {
        let view = DistrictView::from(district());
        assert_eq!(view.google_client_secret.as_deref(), Some(SECRET_MASK));
    }

    #[test]
    fn view_leaves_absent_secret_absent() {
        let mut d = district();
        d.google_client_secret = None;
        let view = DistrictView::from(d);
        assert_eq!(view.google_client_secret, None);
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(""), false)]
    #[case(Some(SECRET_MASK), false)]
    #[case(Some("fresh-secret"), true)]
    fn patch_only_stores_real_secrets(#[case] secret: Option<&str>, #[case] stored: bool) {
        let patch = DistrictSettingsPatch {
            google_client_secret: secret.map(ToOwned::to_owned),
            ..DistrictSettingsPatch::default()
        };
        assert_eq!(patch.secret_to_store().is_some(), stored);
    }

    #[rstest]
    #[case(None, "anyone@anywhere.net", true)]
    #[case(Some("x.org"), "staff@x.org", true)]
    #[case(Some("x.org"), "staff@X.ORG", true)]
    #[case(Some("x.org, y.org"), "staff@y.org", true)]
    #[case(Some("x.org"), "intruder@z.org", false)]
    fn domain_allow_list(
        #[case] setting: Option<&str>,
        #[case] email: &str,
        #[case] allowed: bool,
    ) {
        let cfg = GoogleSsoConfig {
            client_id: "cid".into(),
            client_secret: "cs".into(),
            allowed_domain: setting.map(ToOwned::to_owned),
        };
        assert_eq!(cfg.domain_allowed(email), allowed);
    }

    #[rstest]
    #[case("x", true)]
    #[case("my-district-7", true)]
    #[case("", false)]
    #[case("Has Caps", false)]
    #[case("under_score", false)]
    fn slug_validation(#[case] slug: &str, #[case] ok: bool) {
        assert_eq!(valid_slug(slug), ok);
    }
}
