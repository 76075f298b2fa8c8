//! First-run setup handlers.
//!
//! ```text
//! GET  /api/setup/status
//! POST /api/setup/init {"admin_email":..,"admin_password":..,"district_name":..,"district_slug":..}
//! ```
//!
//! Init is deliberately unauthenticated: it only works while the deployment
//! has no district, and it is what creates the first admin.

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use serde_json::json;

use crate::domain::setup::{self, SetupRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Deserialize)]
pub struct SetupInitRequest {
    #[serde(default)]
    pub admin_email: String,
    #[serde(default)]
    pub admin_password: String,
    #[serde(default)]
    pub admin_name: String,
    #[serde(default)]
    pub district_name: String,
    #[serde(default)]
    pub district_slug: String,
}

#[get("/api/setup/status")]
pub async fn status(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let status = setup::status(state.setup.as_ref())?;
    Ok(HttpResponse::Ok().json(json!({
        "is_setup": status.is_setup,
        "redirect_slug": status.redirect_slug,
    })))
}

#[post("/api/setup/init")]
pub async fn init(
    state: web::Data<HttpState>,
    payload: web::Json<SetupInitRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let slug = setup::initialize(
        state.setup.as_ref(),
        &SetupRequest {
            admin_email: payload.admin_email,
            admin_password: payload.admin_password,
            admin_name: payload.admin_name,
            district_name: payload.district_name,
            district_slug: payload.district_slug,
        },
    )?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "slug": slug })))
}
