//! Local credential authentication and admin-role resolution.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use super::district::{District, GoogleSsoConfig};
use super::error::Error;
use super::password::{hash_password, verify_password};
use super::ports::{DistrictUserRepository, UserRepository};
use super::users::{default_display_name, fold_email, NewUser};

/// Minimum accepted password length for registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Identity established for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

/// Register a local account and return the identity to put in the session.
pub fn register(
    users: &dyn UserRepository,
    identifier: &str,
    name: &str,
    password: &str,
) -> Result<AuthenticatedUser, Error> {
    let email = fold_email(identifier);
    if email.is_empty() {
        return Err(Error::invalid_request("Username is required"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::invalid_request(
            "Password must be at least 8 characters",
        ));
    }
    if users.find_by_email(&email)?.is_some() {
        return Err(Error::conflict("Account already exists"));
    }

    let display_name = match name.trim() {
        "" => default_display_name(&email),
        trimmed => trimmed.to_owned(),
    };
    let password_hash =
        hash_password(password).map_err(|e| Error::internal(format!("password hashing: {e}")))?;
    let id = users.insert(&NewUser {
        email: email.clone(),
        name: display_name.clone(),
        password_hash,
    })?;
    Ok(AuthenticatedUser {
        id,
        email,
        name: display_name,
    })
}

/// Authenticate a local account.
///
/// Both unknown identifiers and wrong passwords produce the same generic
/// error so the endpoint cannot be used to enumerate accounts.
pub fn login(
    users: &dyn UserRepository,
    identifier: &str,
    password: &str,
) -> Result<AuthenticatedUser, Error> {
    let email = fold_email(identifier);
    if email.is_empty() || password.is_empty() {
        return Err(Error::invalid_request("Username and password are required"));
    }

    let invalid = || Error::unauthorized("Invalid credentials");
    let user = users.find_by_email(&email)?.ok_or_else(invalid)?;
    let Some(hash) = user.password_hash.as_deref() else {
        return Err(invalid());
    };
    if !verify_password(hash, password) {
        return Err(invalid());
    }
    Ok(AuthenticatedUser {
        id: user.id,
        email: user.email,
        name: user.name,
    })
}

/// Answers `is_admin(email)`: the static allow-list first, the district role
/// table second. Pure query, no mutation.
#[derive(Clone)]
pub struct AdminResolver {
    allow_list: Arc<HashSet<String>>,
    roles: Arc<dyn DistrictUserRepository>,
}

impl AdminResolver {
    pub fn new(
        allow_list: impl IntoIterator<Item = String>,
        roles: Arc<dyn DistrictUserRepository>,
    ) -> Self {
        let allow_list = allow_list
            .into_iter()
            .map(|e| fold_email(&e))
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            allow_list: Arc::new(allow_list),
            roles,
        }
    }

    /// True if `email` is allow-listed or holds the admin role. Role-table
    /// failures degrade to non-admin, matching the closed-by-default posture.
    #[must_use]
    pub fn is_admin(&self, email: &str) -> bool {
        let email = fold_email(email);
        if email.is_empty() {
            return false;
        }
        if self.allow_list.contains(&email) {
            return true;
        }
        match self.roles.has_admin_role(&email) {
            Ok(found) => found,
            Err(err) => {
                warn!(error = %err, "admin role lookup failed; treating as non-admin");
                false
            }
        }
    }
}

/// Resolve Google SSO credentials: district-stored values take priority,
/// environment-configured values fill the gaps.
#[must_use]
pub fn resolve_sso_config(
    district: Option<&District>,
    env_client_id: Option<&str>,
    env_client_secret: Option<&str>,
) -> Option<GoogleSsoConfig> {
    let stored_id = district.and_then(|d| d.google_client_id.as_deref());
    let stored_secret = district.and_then(|d| d.google_client_secret.as_deref());
    let client_id = stored_id.or(env_client_id)?.to_owned();
    let client_secret = stored_secret.or(env_client_secret)?.to_owned();
    Some(GoogleSsoConfig {
        client_id,
        client_secret,
        allowed_domain: district.and_then(|d| d.allowed_domain.clone()),
    })
}
