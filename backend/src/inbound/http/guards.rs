//! Request guards shared by protected handlers.
//!
//! Admin checks return 401 for anonymous callers and 403 for signed-in
//! non-admins so the frontend can distinguish "log in" from "not allowed".

use serde_json::Value;
use subtle::ConstantTimeEq;

use crate::domain::Error;
use crate::domain::auth::AdminResolver;

use super::session::{SessionContext, SessionUser};

/// Require a signed-in admin, yielding the session user.
pub fn require_admin(
    session: &SessionContext,
    admin: &AdminResolver,
) -> Result<SessionUser, Error> {
    let user = session.require_user()?;
    if !admin.is_admin(&user.email) {
        return Err(Error::forbidden("Admin access required"));
    }
    Ok(user)
}

/// Validate the CSRF token a mutating request carried against the session's.
///
/// The comparison is constant-time so the token cannot be recovered byte by
/// byte through timing.
pub fn require_csrf(session: &SessionContext, provided: Option<&str>) -> Result<(), Error> {
    let invalid = || Error::forbidden("Invalid CSRF token");
    let expected = session.csrf_token()?.ok_or_else(invalid)?;
    let provided = provided.ok_or_else(invalid)?;
    if expected.as_bytes().ct_eq(provided.as_bytes()).into() {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Pull the `csrf_token` field out of a JSON request body.
#[must_use]
pub fn csrf_from_body(body: &Value) -> Option<&str> {
    body.get("csrf_token").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use serde_json::json;

    use super::*;
    use crate::inbound::http::test_utils::test_session_middleware;
    use crate::middleware::CsrfProvision;

    #[core::prelude::v1::test]
    fn csrf_field_extraction() {
        assert_eq!(
            csrf_from_body(&json!({"csrf_token": "abc", "name": "x"})),
            Some("abc")
        );
        assert_eq!(csrf_from_body(&json!({"name": "x"})), None);
        assert_eq!(csrf_from_body(&json!({"csrf_token": 7})), None);
    }

    #[actix_web::test]
    async fn echoed_token_passes_and_wrong_token_fails() {
        let app = test::init_service(
            App::new()
                .wrap(CsrfProvision)
                .wrap(test_session_middleware())
                .route(
                    "/token",
                    web::get().to(|session: SessionContext| async move {
                        let token = session.csrf_token()?.unwrap_or_default();
                        Ok::<_, Error>(HttpResponse::Ok().body(token))
                    }),
                )
                .route(
                    "/check",
                    web::post().to(
                        |session: SessionContext, body: web::Json<serde_json::Value>| async move {
                            require_csrf(&session, csrf_from_body(&body))?;
                            Ok::<_, Error>(HttpResponse::Ok())
                        },
                    ),
                ),
        )
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/token").to_request()).await;
        let cookie = res
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned();
        let token = String::from_utf8(test::read_body(res).await.to_vec()).expect("utf8");
        assert!(!token.is_empty());

        let good = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/check")
                .cookie(cookie.clone())
                .set_json(json!({"csrf_token": token}))
                .to_request(),
        )
        .await;
        assert_eq!(good.status(), StatusCode::OK);

        let bad = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/check")
                .cookie(cookie)
                .set_json(json!({"csrf_token": "forged"}))
                .to_request(),
        )
        .await;
        assert_eq!(bad.status(), StatusCode::FORBIDDEN);
    }
}
