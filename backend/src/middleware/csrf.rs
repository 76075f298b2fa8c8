//! CSRF token provisioning.
//!
//! Every session carries a random token that mutating endpoints require the
//! client to echo back. This middleware mints the token on first contact so
//! `/api/auth/me` can always hand it to the frontend; validation lives with
//! the handlers because exemptions (login, logout, public submissions) are
//! route-level policy.

use std::task::{Context, Poll};

use actix_session::SessionExt;
use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use rand::RngCore;
use tracing::warn;

/// Session key holding the CSRF token.
pub const CSRF_SESSION_KEY: &str = "csrf_token";

/// Mint a fresh URL-safe CSRF token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Middleware ensuring the session holds a CSRF token.
#[derive(Clone)]
pub struct CsrfProvision;

impl<S, B> Transform<S, ServiceRequest> for CsrfProvision
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfProvisionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfProvisionMiddleware { service }))
    }
}

/// Service wrapper produced by [`CsrfProvision`].
pub struct CsrfProvisionMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for CsrfProvisionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let session = req.get_session();
        match session.get::<String>(CSRF_SESSION_KEY) {
            Ok(Some(_)) => {}
            Ok(None) => {
                if let Err(error) = session.insert(CSRF_SESSION_KEY, generate_token()) {
                    warn!(%error, "failed to provision csrf token");
                }
            }
            Err(error) => {
                warn!(%error, "failed to read csrf token from session");
            }
        }
        Box::pin(self.service.call(req))
    }
}
