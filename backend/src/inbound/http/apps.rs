//! Catalog entry handlers: public listing plus admin CRUD with audit trail.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::activity::{ActivityAction, ActivityEntry, record_activity};
use crate::domain::catalog::{AppPatch, AppRecord, AppStatus, NewApp, SoppaStatus};
use crate::domain::documents::normalize_doc_path;
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::{csrf_from_body, require_csrf};
use crate::inbound::http::session::{SessionContext, SessionUser};
use crate::inbound::http::state::HttpState;

fn field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str).map(str::trim)
}

/// Interpret a JSON boolean or its common string spellings.
fn bool_field(body: &Value, key: &str) -> Option<bool> {
    match body.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(matches!(
            s.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )),
        Value::Number(n) => Some(n.as_i64() != Some(0)),
        _ => None,
    }
}

/// 401 for anonymous callers, 403 for signed-in non-admins.
fn require_catalog_admin(
    session: &SessionContext,
    state: &HttpState,
) -> Result<SessionUser, Error> {
    let user = session.require_user()?;
    if !state.admin.is_admin(&user.email) {
        return Err(Error::forbidden("Admin privileges required"));
    }
    Ok(user)
}

fn public_view(app: &AppRecord) -> Value {
    json!({
        "id": app.id,
        "name": app.name,
        "company": app.company,
        "status": app.status.as_str(),
        "soppa_compliant": app.soppa_compliant.map(SoppaStatus::as_str).unwrap_or(""),
        "product_visibility": app.product_visibility,
        "product_link": app.product_link,
        "tags": app.tags,
        "ndpa_path": normalize_doc_path(&app.privacy_link),
        "exhibit_e_path": normalize_doc_path(&app.otherdocs),
    })
}

fn audit_view(app: &AppRecord) -> Value {
    json!({
        "name": app.name,
        "company": app.company,
        "status": app.status.as_str(),
        "soppa_compliant": app.soppa_compliant.map(SoppaStatus::as_str),
        "privacy_link": normalize_doc_path(&app.privacy_link),
        "product_link": app.product_link,
        "tags": app.tags,
        "notes": app.notes,
        "product_visibility": app.product_visibility,
        "otherdocs": normalize_doc_path(&app.otherdocs),
    })
}

/// Public catalog listing, ordered by name.
#[get("/api/districts/{slug}/apps")]
pub async fn list_public_apps(
    state: web::Data<HttpState>,
    _slug: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let apps = state.apps.list()?;
    let views: Vec<Value> = apps.iter().map(public_view).collect();
    Ok(HttpResponse::Ok().json(views))
}

/// Create a catalog entry and audit the creation.
#[post("/api/districts/{slug}/apps")]
pub async fn create_app(
    state: web::Data<HttpState>,
    session: SessionContext,
    _slug: web::Path<String>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let user = require_catalog_admin(&session, &state)?;
    require_csrf(&session, csrf_from_body(&body))?;

    let name = field(&body, "name").unwrap_or_default().to_owned();
    if name.is_empty() {
        return Err(Error::invalid_request("Name is required"));
    }
    let status = AppStatus::normalize(field(&body, "status"));
    let soppa = SoppaStatus::normalize(field(&body, "soppa_compliant"));
    let new_app = NewApp {
        name: name.clone(),
        unique_id: Uuid::new_v4().to_string(),
        notes: field(&body, "notes").unwrap_or_default().to_owned(),
        company: field(&body, "company").unwrap_or_default().to_owned(),
        privacy_link: field(&body, "privacy_link").unwrap_or_default().to_owned(),
        soppa_compliant: soppa,
        otherdocs: field(&body, "otherdocs").unwrap_or_default().to_owned(),
        status,
        tags: field(&body, "tags").unwrap_or_default().to_owned(),
        product_visibility: bool_field(&body, "product_visibility").unwrap_or(true),
        product_link: field(&body, "product_link").unwrap_or_default().to_owned(),
    };
    let app_id = state.apps.insert(&new_app)?;

    record_activity(
        state.activity.as_ref(),
        ActivityEntry {
            action: ActivityAction::Create,
            app_id: Some(app_id),
            app_name: name.clone(),
            user_email: user.email,
            details: Some(json!({
                "status": status.as_str(),
                "company": new_app.company,
            })),
        },
    );

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "app": {
            "id": app_id,
            "name": new_app.name,
            "company": new_app.company,
            "status": new_app.status.as_str(),
            "soppa_compliant": new_app.soppa_compliant.map(SoppaStatus::as_str),
            "product_visibility": new_app.product_visibility,
            "product_link": new_app.product_link,
            "tags": new_app.tags,
            "notes": new_app.notes,
        }
    })))
}

/// Partial update; absent or empty fields keep stored values. The audit
/// entry carries before and after snapshots.
#[put("/api/districts/{slug}/apps/{app_id}")]
pub async fn update_app(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, i64)>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let user = require_catalog_admin(&session, &state)?;
    require_csrf(&session, csrf_from_body(&body))?;
    let (_, app_id) = path.into_inner();

    let before = state
        .apps
        .find(app_id)?
        .ok_or_else(|| Error::not_found("App not found"))?;

    let non_empty = |key: &str| field(&body, key).filter(|v| !v.is_empty()).map(ToOwned::to_owned);
    let patch = AppPatch {
        name: non_empty("name"),
        status: field(&body, "status")
            .filter(|v| !v.is_empty())
            .map(|v| AppStatus::normalize(Some(v))),
        company: non_empty("company"),
        soppa_compliant: SoppaStatus::normalize(field(&body, "soppa_compliant")),
        privacy_link: non_empty("privacy_link"),
        product_link: non_empty("product_link"),
        tags: non_empty("tags"),
        notes: non_empty("notes"),
        otherdocs: non_empty("otherdocs"),
        product_visibility: bool_field(&body, "product_visibility"),
    };
    state.apps.update(app_id, &patch)?;

    let after = state
        .apps
        .find(app_id)?
        .ok_or_else(|| Error::not_found("App not found"))?;
    record_activity(
        state.activity.as_ref(),
        ActivityEntry {
            action: ActivityAction::Update,
            app_id: Some(app_id),
            app_name: after.name.clone(),
            user_email: user.email,
            details: Some(json!({
                "before": audit_view(&before),
                "after": audit_view(&after),
            })),
        },
    );
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Delete a catalog entry; contacts cascade with it.
#[delete("/api/districts/{slug}/apps/{app_id}")]
pub async fn delete_app(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, i64)>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let user = require_catalog_admin(&session, &state)?;
    require_csrf(&session, csrf_from_body(&body))?;
    let (_, app_id) = path.into_inner();

    let app = state
        .apps
        .find(app_id)?
        .ok_or_else(|| Error::not_found("App not found"))?;
    state.apps.delete(app_id)?;

    record_activity(
        state.activity.as_ref(),
        ActivityEntry {
            action: ActivityAction::Delete,
            app_id: Some(app_id),
            app_name: app.name.clone(),
            user_email: user.email,
            details: Some(json!({
                "status": app.status.as_str(),
                "company": app.company,
            })),
        },
    );
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Lightweight admin listing with vendor-contact counts.
#[get("/api/admin/apps")]
pub async fn list_admin_apps(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    require_catalog_admin(&session, &state)?;
    let apps = state.apps.list_with_contact_counts()?;
    let views: Vec<Value> = apps
        .iter()
        .map(|(app, contact_count)| {
            json!({
                "id": app.id,
                "name": app.name,
                "company": app.company,
                "status": app.status.as_str(),
                "soppa_compliant": app.soppa_compliant.map(SoppaStatus::as_str).unwrap_or(""),
                "product_visibility": app.product_visibility,
                "contact_count": contact_count,
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "apps": views })))
}
