//! Cross-origin response headers for the API surface.
//!
//! Applies to `/api/` paths only. The allow-origin value echoes the request's
//! `Origin` when it is on the configured allow-list and otherwise falls back
//! to the first configured origin, so a misconfigured frontend fails visibly
//! instead of silently working cross-site. Credentials are always allowed
//! because authentication rides on the session cookie.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};

const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

/// Middleware adding CORS response headers for `/api/` requests.
#[derive(Clone)]
pub struct Cors {
    origins: Rc<Vec<String>>,
}

impl Cors {
    /// Build from the configured frontend origin allow-list. An empty list
    /// disables the allow-origin header entirely.
    pub fn new(origins: Vec<String>) -> Self {
        Self {
            origins: Rc::new(origins),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CorsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsMiddleware {
            service,
            origins: Rc::clone(&self.origins),
        }))
    }
}

/// Service wrapper produced by [`Cors`].
pub struct CorsMiddleware<S> {
    service: S,
    origins: Rc<Vec<String>>,
}

fn allow_origin<'a>(origins: &'a [String], request_origin: Option<&'a str>) -> Option<&'a str> {
    match request_origin {
        Some(origin) if origins.iter().any(|o| o == origin) => Some(origin),
        _ => origins.first().map(String::as_str),
    }
}

impl<S, B> Service<ServiceRequest> for CorsMiddleware<S>
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
        let applies = req.path().starts_with("/api/");
        let request_origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        let origins = Rc::clone(&self.origins);
        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            if applies {
                let headers = res.response_mut().headers_mut();
                if let Some(origin) = allow_origin(&origins, request_origin.as_deref())
                    && let Ok(value) = HeaderValue::from_str(origin)
                {
                    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                }
                headers.insert(
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOW_HEADERS),
                );
                headers.insert(
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(ALLOW_METHODS),
                );
                headers.insert(
                    header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                    HeaderValue::from_static("true"),
                );
                headers.insert(header::VARY, HeaderValue::from_static("Origin"));
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, test, web};

    use super::*;

    fn origins() -> Vec<String> {
        vec![
            "https://catalog.example.org".into(),
            "http://localhost:5173".into(),
        ]
    }

    async fn request_with_origin(origin: Option<&str>, path: &str) -> ServiceResponse {
        let app = test::init_service(
            App::new()
                .wrap(Cors::new(origins()))
                .route("/api/apps", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route("/health", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let mut req = test::TestRequest::get().uri(path);
        if let Some(origin) = origin {
            req = req.insert_header((header::ORIGIN, origin));
        }
        test::call_service(&app, req.to_request()).await
    }

    #[actix_web::test]
    async fn allowed_origin_is_echoed() {
        let res = request_with_origin(Some("http://localhost:5173"), "/api/apps").await;
        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("http://localhost:5173")),
        );
        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some(&HeaderValue::from_static("true")),
        );
        assert_eq!(
            res.headers().get(header::VARY),
            Some(&HeaderValue::from_static("Origin")),
        );
    }

    #[actix_web::test]
    async fn unknown_origin_falls_back_to_first_configured() {
        let res = request_with_origin(Some("https://evil.example"), "/api/apps").await;
        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("https://catalog.example.org")),
        );
    }

    #[actix_web::test]
    async fn non_api_paths_are_untouched() {
        let res = request_with_origin(Some("http://localhost:5173"), "/health").await;
        assert!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
