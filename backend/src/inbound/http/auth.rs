//! Local authentication handlers.
//!
//! ```text
//! POST /api/auth/register {"username":"jo@x.org","password":"secret123"}
//! POST /api/auth/login    {"username":"jo@x.org","password":"secret123"}
//! GET  /api/auth/me
//! POST /api/auth/logout
//! ```
//!
//! Login and registration are CSRF-exempt: both require the credential
//! itself, and the frontend needs them before it has fetched a token.

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use serde_json::json;

use crate::domain::auth;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::{SessionContext, SessionUser};
use crate::inbound::http::state::HttpState;

/// Credential payload; `username` and `email` are interchangeable.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsRequest {
    fn identifier(&self) -> &str {
        self.username
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or_default()
    }
}

fn session_payload(user: &SessionUser) -> serde_json::Value {
    json!({ "success": true, "user": user })
}

/// Create a local account and start a session.
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    let authenticated = auth::register(
        state.users.as_ref(),
        payload.identifier(),
        payload.name.as_deref().unwrap_or_default(),
        payload.password.as_deref().unwrap_or_default(),
    )?;
    let user = SessionUser::from(authenticated);
    session.persist_user(&user)?;
    Ok(HttpResponse::Created().json(session_payload(&user)))
}

/// Authenticate a local account and start a session.
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    let authenticated = auth::login(
        state.users.as_ref(),
        payload.identifier(),
        payload.password.as_deref().unwrap_or_default(),
    )?;
    let user = SessionUser::from(authenticated);
    session.persist_user(&user)?;
    Ok(HttpResponse::Ok().json(session_payload(&user)))
}

/// Report the signed-in user, their resolved role, and the CSRF token the
/// frontend must echo on mutating requests.
#[get("/me")]
pub async fn me(state: web::Data<HttpState>, session: SessionContext) -> ApiResult<HttpResponse> {
    let Some(user) = session.current_user()? else {
        return Ok(HttpResponse::Ok().json(json!({ "authenticated": false })));
    };
    let role = if state.admin.is_admin(&user.email) {
        "admin"
    } else {
        "staff"
    };
    Ok(HttpResponse::Ok().json(json!({
        "authenticated": true,
        "user": {
            "email": user.email,
            "name": user.name,
            "role": role,
        },
        "csrf_token": session.csrf_token()?,
    })))
}

/// Drop the session.
#[post("/logout")]
pub async fn logout(session: SessionContext) -> ApiResult<HttpResponse> {
    session.clear();
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
