//! Google OAuth bridge: front-channel redirect out, callback in.
//!
//! The `state` nonce is minted per attempt, stored in the session, and must
//! match exactly on the callback before any network call happens.

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::Deserialize;
use tracing::info;

use crate::domain::Error;
use crate::domain::auth::resolve_sso_config;
use crate::domain::district::{DEFAULT_SLUG, GoogleSsoConfig};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::{SessionContext, SessionUser};
use crate::inbound::http::state::HttpState;

fn redirect_home() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .finish()
}

fn mint_state() -> String {
    let mut bytes = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// District-stored credentials first, environment fallback second.
fn sso_config(state: &HttpState) -> Result<GoogleSsoConfig, Error> {
    let district = state.districts.find_by_slug(DEFAULT_SLUG)?;
    resolve_sso_config(
        district.as_ref(),
        state.sso.env_client_id.as_deref(),
        state.sso.env_client_secret.as_deref(),
    )
    .ok_or_else(|| {
        Error::invalid_request("Google SSO is not configured. Please contact an administrator.")
    })
}

/// Start the OAuth flow. Signed-in users are sent straight home.
#[get("/auth/google")]
pub async fn google_auth(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    if session.current_user()?.is_some() {
        return Ok(redirect_home());
    }
    let config = sso_config(&state)?;
    let nonce = mint_state();
    session.store_oauth_state(&nonce)?;
    let url = state
        .identity
        .authorization_url(&config, &state.sso.redirect_uri(), &nonce);
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, url))
        .finish())
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// OAuth callback: state check, code exchange, domain gate, session start.
#[get("/authorize")]
pub async fn authorize(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<AuthorizeQuery>,
) -> ApiResult<HttpResponse> {
    let stored = session.take_oauth_state()?;
    match (stored.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(provided)) if expected == provided => {}
        _ => return Err(Error::invalid_request("Invalid state parameter")),
    }
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return Err(Error::invalid_request("Missing authorization code"));
    };

    let config = sso_config(&state)?;
    let identity = state
        .identity
        .exchange_code(&config, &state.sso.redirect_uri(), code)
        .await?;

    if !config.domain_allowed(&identity.email) {
        let setting = config.allowed_domain.unwrap_or_default();
        return Err(Error::forbidden(format!(
            "Access restricted. Please sign in with an account from: {setting}"
        )));
    }

    state.users.upsert_oauth(&identity.email, &identity.name)?;
    info!(email = %identity.email, "sso sign-in");
    session.persist_user(&SessionUser {
        id: None,
        email: identity.email,
        name: identity.name,
    })?;
    Ok(redirect_home())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    use crate::inbound::http::test_utils::{
        TestContext, csrf_token, register_and_login, test_app,
    };

    fn location(res: &actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>) -> String {
        res.headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .expect("location header")
            .to_owned()
    }

    fn state_param(url: &str) -> String {
        url.rsplit_once("state=")
            .map(|(_, s)| s.split('&').next().unwrap_or(s))
            .expect("state parameter")
            .to_owned()
    }

    #[actix_web::test]
    async fn signed_in_users_skip_the_flow() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;
        let cookie = register_and_login(&app, "staff@x.org", "secret123").await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/auth/google")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/");
    }

    #[actix_web::test]
    async fn initiation_stores_state_and_redirects_to_the_provider() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/auth/google").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        let url = location(&res);
        assert!(url.starts_with("https://sso.invalid/auth"));
        assert!(url.contains("redirect_uri=http://localhost:8080/authorize"));
        assert!(!state_param(&url).is_empty());
    }

    #[actix_web::test]
    async fn mismatched_state_is_rejected_before_exchange() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;

        let start = test::call_service(
            &app,
            test::TestRequest::get().uri("/auth/google").to_request(),
        )
        .await;
        let cookie = start
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned();

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/authorize?state=forged&code=abc")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "Invalid state parameter");
    }

    #[actix_web::test]
    async fn callback_without_code_is_rejected() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;

        let start = test::call_service(
            &app,
            test::TestRequest::get().uri("/auth/google").to_request(),
        )
        .await;
        let state = state_param(&location(&start));
        let cookie = start
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned();

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/authorize?state={state}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "Missing authorization code");
    }

    #[actix_web::test]
    async fn full_flow_signs_the_verified_identity_in() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;

        let start = test::call_service(
            &app,
            test::TestRequest::get().uri("/auth/google").to_request(),
        )
        .await;
        let state = state_param(&location(&start));
        let cookie = start
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned();

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/authorize?state={state}&code=auth-code"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/");
        let signed_in = res
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("refreshed session")
            .into_owned();

        let me = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/auth/me")
                .cookie(signed_in)
                .to_request(),
        )
        .await;
        let me: Value = test::read_body_json(me).await;
        assert_eq!(me["authenticated"], json!(true));
        assert_eq!(me["user"]["email"], "sso@x.org");
        assert_eq!(me["user"]["name"], "Single Sign-On");
    }

    #[actix_web::test]
    async fn domain_restriction_blocks_outside_accounts() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;

        // Store a restrictive allow-list on the bootstrap district.
        let admin = register_and_login(&app, "admin@x.org", "secret123").await;
        let token = csrf_token(&app, &admin).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/districts")
                .cookie(admin.clone())
                .set_json(json!({
                    "name": "Local",
                    "slug": "local",
                    "contact_email": "office@x.org",
                    "csrf_token": token,
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/districts/local")
                .cookie(admin)
                .set_json(json!({"allowed_domain": "other.org", "csrf_token": token}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let start = test::call_service(
            &app,
            test::TestRequest::get().uri("/auth/google").to_request(),
        )
        .await;
        let state = state_param(&location(&start));
        let cookie = start
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned();

        // The fixture identity is sso@x.org, outside other.org.
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/authorize?state={state}&code=auth-code"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(
            body["message"],
            "Access restricted. Please sign in with an account from: other.org"
        );
    }
}
