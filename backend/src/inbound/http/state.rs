//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::auth::AdminResolver;
use crate::domain::ports::{
    ActivityLog, AppRepository, AppRequestRepository, ContactRepository, DistrictRepository,
    DistrictUserRepository, DocumentStore, IdentityProvider, SetupRepository, UserRepository,
};
use crate::outbound::cache::ImageCache;

/// Deployment-wide settings the handlers consult directly.
#[derive(Clone, Default)]
pub struct SsoSettings {
    /// Environment fallback used when the district has no stored client id.
    pub env_client_id: Option<String>,
    pub env_client_secret: Option<String>,
    /// External base URL this deployment is reachable at; the OAuth redirect
    /// URI is derived from it.
    pub public_base_url: String,
}

impl SsoSettings {
    /// The redirect URI registered with the identity provider.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}/authorize", self.public_base_url.trim_end_matches('/'))
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserRepository>,
    pub districts: Arc<dyn DistrictRepository>,
    pub district_users: Arc<dyn DistrictUserRepository>,
    pub apps: Arc<dyn AppRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    pub activity: Arc<dyn ActivityLog>,
    pub requests: Arc<dyn AppRequestRepository>,
    pub setup: Arc<dyn SetupRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub images: Arc<ImageCache>,
    pub documents: Arc<dyn DocumentStore>,
    pub admin: AdminResolver,
    pub sso: SsoSettings,
}
