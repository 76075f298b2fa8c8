//! First-run setup: `Unconfigured -> Configured`, one shot.

use serde::Serialize;

use super::district::{valid_slug, NewDistrict};
use super::error::Error;
use super::password::hash_password;
use super::ports::{SetupInit, SetupRepository};
use super::users::fold_email;

/// Setup status as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupStatus {
    pub is_setup: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_slug: Option<String>,
}

/// Validated setup-init request.
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub admin_email: String,
    pub admin_password: String,
    pub admin_name: String,
    pub district_name: String,
    pub district_slug: String,
}

/// Report whether the deployment is configured.
pub fn status(repo: &dyn SetupRepository) -> Result<SetupStatus, Error> {
    let state = repo.state()?;
    let is_setup = state.district_count > 0 && state.user_count > 0;
    Ok(SetupStatus {
        is_setup,
        redirect_slug: if is_setup { state.first_slug } else { None },
    })
}

/// Initialise the deployment: create the district, the admin account, and the
/// admin membership in one transaction. Rejected once any district exists.
pub fn initialize(repo: &dyn SetupRepository, request: &SetupRequest) -> Result<String, Error> {
    let admin_email = fold_email(&request.admin_email);
    let admin_password = request.admin_password.trim();
    let admin_name = request.admin_name.trim();
    let district_name = request.district_name.trim();
    let district_slug = request.district_slug.trim().to_lowercase();

    if admin_email.is_empty()
        || admin_password.is_empty()
        || district_name.is_empty()
        || district_slug.is_empty()
    {
        return Err(Error::invalid_request("All fields are required"));
    }
    if !valid_slug(&district_slug) {
        return Err(Error::invalid_request(
            "Invalid slug format. Use lowercase letters, numbers, and dashes.",
        ));
    }

    let already = || Error::forbidden("Setup already complete. Cannot re-initialize.");
    if repo.state()?.district_count > 0 {
        return Err(already());
    }

    let admin_password_hash = hash_password(admin_password)
        .map_err(|e| Error::internal(format!("password hashing: {e}")))?;
    let init = SetupInit {
        district: NewDistrict {
            name: district_name.to_owned(),
            slug: district_slug.clone(),
            contact_email: admin_email.clone(),
            created_by_email: admin_email.clone(),
        },
        admin_email,
        admin_name: admin_name.to_owned(),
        admin_password_hash,
    };
    // A concurrent init can still win between the check and the transaction;
    // the repository re-checks inside it and reports a conflict.
    repo.initialize(&init).map_err(|err| match err {
        super::ports::PersistenceError::Conflict { .. } => already(),
        other => Error::from(other),
    })?;
    Ok(district_slug)
}
