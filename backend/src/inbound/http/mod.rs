//! Inbound HTTP adapter: handlers, session plumbing, and error mapping.
//!
//! Handlers depend only on [`state::HttpState`] ports and the session
//! wrapper, so each endpoint can be exercised against in-memory adapters.

use actix_web::{HttpResponse, web};

pub mod apps;
pub mod auth;
pub mod contacts;
pub mod districts;
pub mod error;
pub mod files;
pub mod guards;
pub mod image_proxy;
pub mod oauth;
pub mod requests;
pub mod session;
pub mod setup;
pub mod state;
pub mod test_utils;
pub mod users;

pub use crate::domain::ApiResult;

/// Preflight catch-all; the CORS middleware fills in the headers.
async fn api_preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Register every HTTP route on an application scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::me)
            .service(auth::logout),
    )
    .service(setup::status)
    .service(setup::init)
    .service(districts::create_district)
    .service(districts::get_district)
    .service(districts::update_district)
    .service(districts::upload_logo)
    .service(apps::list_public_apps)
    .service(apps::create_app)
    .service(apps::update_app)
    .service(apps::delete_app)
    .service(apps::list_admin_apps)
    .service(users::list_district_users)
    .service(users::invite_district_user)
    .service(contacts::list_contacts)
    .service(contacts::create_contact)
    .service(contacts::update_contact)
    .service(contacts::delete_contact)
    .service(requests::create_app_request)
    .service(files::serve_invoice)
    .service(files::upload_invoice)
    .service(files::delete_invoice)
    .service(oauth::google_auth)
    .service(oauth::authorize)
    .service(image_proxy::image_proxy)
    .route("/api/{tail:.*}", web::method(actix_web::http::Method::OPTIONS).to(api_preflight));
}
