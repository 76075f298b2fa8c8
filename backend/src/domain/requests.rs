//! Staff-submitted app suggestions. Write-only from the API's perspective.

/// A new app request as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppRequest {
    pub district_slug: String,
    pub app_name: String,
    pub company: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub requester_email: String,
}
