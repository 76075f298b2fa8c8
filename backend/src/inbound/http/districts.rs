//! District handlers: creation, public branding fetch, and admin settings.

use actix_web::{HttpResponse, get, post, put, web};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::district::{DistrictSettingsPatch, DistrictView, NewDistrict, valid_slug};
use crate::domain::documents::{allowed_file, sanitize_filename};
use crate::domain::users::{DistrictRole, fold_email};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::{csrf_from_body, require_admin, require_csrf};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

fn field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str).map(str::trim)
}

/// Create the district and grant the creator the admin role.
#[post("/api/districts")]
pub async fn create_district(
    state: web::Data<HttpState>,
    session: SessionContext,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let Some(user) = session.current_user()? else {
        return Err(Error::unauthorized(
            "Please log in before creating a district",
        ));
    };
    require_csrf(&session, csrf_from_body(&body))?;

    let name = field(&body, "name").unwrap_or_default();
    let slug = field(&body, "slug").unwrap_or_default().to_lowercase();
    let contact_email = field(&body, "contact_email").unwrap_or_default();
    if name.is_empty() || slug.is_empty() || contact_email.is_empty() {
        return Err(Error::invalid_request("Missing required fields"));
    }
    if !valid_slug(&slug) {
        return Err(Error::invalid_request(
            "Slug can only contain letters, numbers, and hyphens",
        ));
    }
    if !contact_email.contains('@') || !user.email.contains('@') {
        return Err(Error::invalid_request("Invalid email format"));
    }

    let district_id = state.districts.insert(&NewDistrict {
        name: name.to_owned(),
        slug: slug.clone(),
        contact_email: fold_email(contact_email),
        created_by_email: user.email.clone(),
    })?;
    state
        .district_users
        .upsert(district_id, &user.email, &user.name, DistrictRole::Admin)?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "district_id": district_id,
        "slug": slug,
        "message": "District created successfully",
    })))
}

/// Public branding and settings view; the stored SSO secret is masked.
#[get("/api/districts/{slug}")]
pub async fn get_district(
    state: web::Data<HttpState>,
    slug: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let district = state
        .districts
        .find_by_slug(&slug)?
        .ok_or_else(|| Error::not_found("District not found"))?;
    Ok(HttpResponse::Ok().json(DistrictView::from(district)))
}

/// Update branding and SSO settings. A round-tripped masked secret keeps the
/// stored value.
#[put("/api/districts/{slug}")]
pub async fn update_district(
    state: web::Data<HttpState>,
    session: SessionContext,
    slug: web::Path<String>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    require_admin(&session, &state.admin)?;
    require_csrf(&session, csrf_from_body(&body))?;

    let name = field(&body, "display_name")
        .or_else(|| field(&body, "name"))
        .filter(|v| !v.is_empty());
    let patch = DistrictSettingsPatch {
        name: name.map(ToOwned::to_owned),
        primary_color: field(&body, "primary_color").map(ToOwned::to_owned),
        accent_color: field(&body, "accent_color").map(ToOwned::to_owned),
        allowed_domain: field(&body, "allowed_domain").map(ToOwned::to_owned),
        google_client_id: field(&body, "google_client_id").map(ToOwned::to_owned),
        google_client_secret: field(&body, "google_client_secret").map(ToOwned::to_owned),
    };
    state.districts.update_settings(&slug, &patch)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct LogoQuery {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    csrf_token: Option<String>,
}

/// Upload a district logo and point `logo_url` at it.
///
/// The request body is the raw file; the source filename and CSRF token
/// travel as query parameters. The stored name is regenerated per upload so
/// stale browser caches never show a replaced logo.
#[post("/api/districts/{slug}/logo")]
pub async fn upload_logo(
    state: web::Data<HttpState>,
    session: SessionContext,
    slug: web::Path<String>,
    query: web::Query<LogoQuery>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    require_admin(&session, &state.admin)?;
    require_csrf(&session, query.csrf_token.as_deref())?;

    if body.is_empty() {
        return Err(Error::invalid_request("No selected file"));
    }
    let Some(name) = sanitize_filename(&query.filename).filter(|n| allowed_file(n)) else {
        return Err(Error::invalid_request("Invalid file type"));
    };
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    state
        .districts
        .find_by_slug(&slug)?
        .ok_or_else(|| Error::not_found("District not found"))?;

    let unique_name = format!(
        "logo_{slug}_{}.{extension}",
        &Uuid::new_v4().simple().to_string()[..8]
    );
    state.documents.save(&unique_name, &body)?;

    let logo_url = format!("/static/documents/{unique_name}");
    state.districts.set_logo_url(&slug, &logo_url)?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "logo_path": logo_url })))
}
