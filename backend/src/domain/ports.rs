//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (the SQLite store, the identity provider, the document root, remote image
//! origins). Each trait exposes strongly typed errors so adapters map their
//! failures into predictable variants instead of returning `anyhow::Result`.
//!
//! Persistence ports are synchronous: requests are handled end-to-end without
//! intra-request suspension, and the embedded store completes queries in
//! microseconds. Ports that talk to the network are async.

use async_trait::async_trait;
use thiserror::Error as ThisError;

use super::activity::ActivityEntry;
use super::catalog::{AppPatch, AppRecord, NewApp};
use super::contacts::{ContactFields, VendorContact};
use super::district::{District, DistrictSettingsPatch, GoogleSsoConfig, NewDistrict};
use super::error::Error;
use super::requests::NewAppRequest;
use super::users::{DistrictMember, DistrictRole, NewUser, UserRecord};

/// Errors surfaced by the persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PersistenceError {
    /// Query or transaction failed inside the store.
    #[error("database failure: {message}")]
    Database { message: String },
    /// A unique constraint rejected the write.
    #[error("{message}")]
    Conflict { message: String },
    /// A referenced row does not exist.
    #[error("{what} not found")]
    NotFound { what: String },
}

impl PersistenceError {
    /// Helper for store-level failures.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Helper for unique-constraint violations.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Helper for missing rows.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}

impl From<PersistenceError> for Error {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Database { message } => Error::internal(message),
            PersistenceError::Conflict { message } => Error::conflict(message),
            PersistenceError::NotFound { what } => Error::not_found(format!("{what} not found")),
        }
    }
}

/// Persistence port for user accounts.
pub trait UserRepository: Send + Sync {
    /// Fetch an account by case-folded email.
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, PersistenceError>;

    /// Insert a new account; duplicates surface as [`PersistenceError::Conflict`].
    fn insert(&self, user: &NewUser) -> Result<i64, PersistenceError>;

    /// Upsert an OAuth-provisioned account: refresh the display name and
    /// last-login timestamp if present, insert otherwise.
    fn upsert_oauth(&self, email: &str, name: &str) -> Result<(), PersistenceError>;

    /// Total number of accounts. Used by setup-status.
    fn count(&self) -> Result<i64, PersistenceError>;
}

/// Persistence port for the singleton district.
pub trait DistrictRepository: Send + Sync {
    fn count(&self) -> Result<i64, PersistenceError>;

    fn find_by_slug(&self, slug: &str) -> Result<Option<District>, PersistenceError>;

    /// The singleton row, whichever slug it carries.
    fn first(&self) -> Result<Option<District>, PersistenceError>;

    fn insert(&self, district: &NewDistrict) -> Result<i64, PersistenceError>;

    fn update_settings(
        &self,
        slug: &str,
        patch: &DistrictSettingsPatch,
    ) -> Result<(), PersistenceError>;

    /// Point the district at a freshly uploaded logo.
    fn set_logo_url(&self, slug: &str, logo_url: &str) -> Result<(), PersistenceError>;
}

/// Persistence port for district memberships.
pub trait DistrictUserRepository: Send + Sync {
    /// Memberships for the district identified by slug, ordered by email.
    fn list(&self, slug: &str) -> Result<Vec<DistrictMember>, PersistenceError>;

    /// Insert or update a membership keyed on (district, email).
    fn upsert(
        &self,
        district_id: i64,
        email: &str,
        name: &str,
        role: DistrictRole,
    ) -> Result<(), PersistenceError>;

    /// Whether any membership row grants `email` the admin role.
    fn has_admin_role(&self, email: &str) -> Result<bool, PersistenceError>;
}

/// Persistence port for catalog entries.
pub trait AppRepository: Send + Sync {
    /// All entries ordered by name.
    fn list(&self) -> Result<Vec<AppRecord>, PersistenceError>;

    /// All entries with their vendor-contact counts, ordered by name.
    fn list_with_contact_counts(&self) -> Result<Vec<(AppRecord, i64)>, PersistenceError>;

    fn find(&self, id: i64) -> Result<Option<AppRecord>, PersistenceError>;

    fn insert(&self, app: &NewApp) -> Result<i64, PersistenceError>;

    /// COALESCE-merge update; absent patch fields keep stored values.
    fn update(&self, id: i64, patch: &AppPatch) -> Result<(), PersistenceError>;

    fn delete(&self, id: i64) -> Result<(), PersistenceError>;

    /// Replace the comma-joined invoice column.
    fn set_invoices(&self, id: i64, invoices: &str) -> Result<(), PersistenceError>;
}

/// Persistence port for vendor contacts.
pub trait ContactRepository: Send + Sync {
    /// Contacts for an app, primary first then by name.
    fn list_for_app(&self, app_id: i64) -> Result<Vec<VendorContact>, PersistenceError>;

    fn find(&self, id: i64) -> Result<Option<VendorContact>, PersistenceError>;

    /// Insert a contact; (app, email) duplicates surface as
    /// [`PersistenceError::Conflict`].
    fn insert(&self, app_id: i64, fields: &ContactFields)
        -> Result<VendorContact, PersistenceError>;

    fn update(&self, id: i64, fields: &ContactFields) -> Result<VendorContact, PersistenceError>;

    fn delete(&self, id: i64) -> Result<(), PersistenceError>;
}

/// Append-only port for the audit log.
pub trait ActivityLog: Send + Sync {
    fn record(&self, entry: &ActivityEntry) -> Result<(), PersistenceError>;
}

/// Persistence port for staff app suggestions.
pub trait AppRequestRepository: Send + Sync {
    fn insert(&self, request: &NewAppRequest) -> Result<(), PersistenceError>;
}

/// Aggregate state consulted by first-run setup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupState {
    pub district_count: i64,
    pub user_count: i64,
    /// Slug of the singleton district once configured.
    pub first_slug: Option<String>,
}

/// Everything setup-init persists in one transaction.
#[derive(Debug, Clone)]
pub struct SetupInit {
    pub district: NewDistrict,
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password_hash: String,
}

/// Persistence port for the first-run state machine.
pub trait SetupRepository: Send + Sync {
    fn state(&self) -> Result<SetupState, PersistenceError>;

    /// Atomically create the district, the admin account, and the admin
    /// membership. Rejects with [`PersistenceError::Conflict`] if a district
    /// already exists when the transaction runs.
    fn initialize(&self, init: &SetupInit) -> Result<(), PersistenceError>;
}

/// Errors surfaced by the identity-provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum IdentityError {
    /// The token-exchange call failed or timed out.
    #[error("identity provider exchange failed: {message}")]
    Exchange { message: String },
    /// The returned ID token failed signature, issuer, or audience checks.
    #[error("identity token rejected: {message}")]
    InvalidToken { message: String },
}

impl IdentityError {
    pub fn exchange(message: impl Into<String>) -> Self {
        Self::Exchange {
            message: message.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }
}

impl From<IdentityError> for Error {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Exchange { message } => Error::upstream(message),
            IdentityError::InvalidToken { .. } => Error::unauthorized("Authentication failed"),
        }
    }
}

/// Identity proven by the external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: String,
}

/// Port to the external identity provider (Google).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the provider authorization URL for the front-channel redirect.
    fn authorization_url(&self, config: &GoogleSsoConfig, redirect_uri: &str, state: &str)
        -> String;

    /// Exchange an authorization code for tokens and verify the ID token
    /// against the configured client id.
    async fn exchange_code(
        &self,
        config: &GoogleSsoConfig,
        redirect_uri: &str,
        code: &str,
    ) -> Result<VerifiedIdentity, IdentityError>;
}

/// Fixture provider for handler tests: no network, returns the configured
/// identity for any code.
pub struct FixtureIdentityProvider {
    pub identity: VerifiedIdentity,
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    fn authorization_url(
        &self,
        _config: &GoogleSsoConfig,
        redirect_uri: &str,
        state: &str,
    ) -> String {
        format!("https://sso.invalid/auth?redirect_uri={redirect_uri}&state={state}")
    }

    async fn exchange_code(
        &self,
        _config: &GoogleSsoConfig,
        _redirect_uri: &str,
        _code: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        Ok(self.identity.clone())
    }
}

/// A fetched remote image with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Errors surfaced when fetching remote images.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ImageFetchError {
    /// The bounded fetch timeout expired.
    #[error("image fetch timed out: {url}")]
    Timeout { url: String },
    /// The origin refused or the transfer failed.
    #[error("image fetch failed: {message}")]
    Fetch { message: String },
}

impl From<ImageFetchError> for Error {
    fn from(err: ImageFetchError) -> Self {
        Error::upstream(err.to_string())
    }
}

/// Port to remote image origins, used by the image proxy.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageFetchError>;
}

/// Errors surfaced by the document store.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum DocumentStoreError {
    #[error("document not found: {name}")]
    NotFound { name: String },
    #[error("document store failure: {message}")]
    Io { message: String },
}

impl From<DocumentStoreError> for Error {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::NotFound { name } => {
                Error::not_found(format!("file {name} not found"))
            }
            DocumentStoreError::Io { message } => Error::internal(message),
        }
    }
}

/// Port to the upload root. Implementations must confine every operation to
/// that directory; names are already sanitised single path components.
pub trait DocumentStore: Send + Sync {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), DocumentStoreError>;

    fn read(&self, name: &str) -> Result<Vec<u8>, DocumentStoreError>;

    /// Remove a document. Deleting an absent file is not an error.
    fn delete(&self, name: &str) -> Result<(), DocumentStoreError>;
}
