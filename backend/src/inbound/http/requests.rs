//! Staff app-suggestion handler.

use actix_web::{HttpResponse, post, web};
use serde_json::{Value, json};

use crate::domain::Error;
use crate::domain::district::DEFAULT_SLUG;
use crate::domain::requests::NewAppRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::{csrf_from_body, require_csrf};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

fn field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Record a staff suggestion for a new catalog entry.
///
/// `phone_check` is a honeypot for form-filling bots: a non-empty value gets
/// a success response and no stored row.
#[post("/api/requests")]
pub async fn create_app_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let Some(user) = session.current_user()? else {
        return Err(Error::unauthorized("Please sign in to submit a request"));
    };
    require_csrf(&session, csrf_from_body(&body))?;

    if field(&body, "phone_check").is_some() {
        return Ok(HttpResponse::Ok().json(json!({ "success": true })));
    }

    let Some(app_name) = field(&body, "name") else {
        return Err(Error::invalid_request("App name is required"));
    };
    let district_slug = field(&body, "district_slug")
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_SLUG.to_owned());

    state.requests.insert(&NewAppRequest {
        district_slug,
        app_name: app_name.to_owned(),
        company: field(&body, "company").map(ToOwned::to_owned),
        url: field(&body, "url").map(ToOwned::to_owned),
        notes: field(&body, "notes").map(ToOwned::to_owned),
        requester_email: user.email,
    })?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
