//! District membership handlers: roster listing and admin invites.

use actix_web::{HttpResponse, get, post, web};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde_json::{Value, json};

use crate::domain::Error;
use crate::domain::password::hash_password;
use crate::domain::users::{DistrictRole, NewUser, default_display_name, fold_email};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::{csrf_from_body, require_admin, require_csrf};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Unusable placeholder credential for invited accounts; the invitee signs
/// in through OAuth or resets it out of band.
fn placeholder_password_hash() -> Result<String, Error> {
    let mut bytes = [0_u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    hash_password(&URL_SAFE_NO_PAD.encode(bytes))
        .map_err(|e| Error::internal(format!("password hashing: {e}")))
}

/// Roster for the district; any signed-in user may read it. An unknown slug
/// yields an empty roster rather than an error.
#[get("/api/districts/{slug}/users")]
pub async fn list_district_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    slug: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_user()?;
    if state.districts.find_by_slug(&slug)?.is_none() {
        return Ok(HttpResponse::Ok().json(json!({ "users": [] })));
    }
    let users = state.district_users.list(&slug)?;
    Ok(HttpResponse::Ok().json(json!({ "users": users })))
}

/// Invite or re-role a member. Creates the backing account with a
/// placeholder credential when none exists yet.
#[post("/api/districts/{slug}/users")]
pub async fn invite_district_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    slug: web::Path<String>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    require_admin(&session, &state.admin)?;
    require_csrf(&session, csrf_from_body(&body))?;

    let email = fold_email(
        body.get("email")
            .and_then(Value::as_str)
            .unwrap_or_default(),
    );
    if email.is_empty() || !email.contains('@') {
        return Err(Error::invalid_request("Valid email is required"));
    }
    let role_raw = body
        .get("role")
        .and_then(Value::as_str)
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "staff".to_owned());
    let Some(role) = DistrictRole::parse(&role_raw) else {
        return Err(Error::invalid_request("Role must be admin or staff"));
    };
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_display_name(&email));

    let district = state
        .districts
        .find_by_slug(&slug)?
        .ok_or_else(|| Error::not_found("District not found"))?;

    if state.users.find_by_email(&email)?.is_none() {
        state.users.insert(&NewUser {
            email: email.clone(),
            name: name.clone(),
            password_hash: placeholder_password_hash()?,
        })?;
    }
    state
        .district_users
        .upsert(district.id, &email, &name, role)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
