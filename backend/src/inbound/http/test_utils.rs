//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

#[cfg(test)]
pub use harness::{TestContext, csrf_token, register_and_login, test_app};

#[cfg(test)]
mod harness {
    use std::sync::Arc;

    use actix_web::body::MessageBody;
    use actix_web::cookie::Cookie;
    use actix_web::dev::{Service, ServiceRequest, ServiceResponse};
    use actix_web::{App, test, web};
    use async_trait::async_trait;
    use serde_json::json;

    use super::test_session_middleware;
    use crate::domain::auth::AdminResolver;
    use crate::domain::ports::{
        FetchedImage, FixtureIdentityProvider, ImageFetchError, ImageSource, VerifiedIdentity,
    };
    use crate::inbound::http::configure;
    use crate::inbound::http::state::{HttpState, SsoSettings};
    use crate::middleware::CsrfProvision;
    use crate::outbound::cache::ImageCache;
    use crate::outbound::documents::DirDocumentStore;
    use crate::outbound::persistence::activity::SqliteActivityLog;
    use crate::outbound::persistence::apps::SqliteAppRepository;
    use crate::outbound::persistence::contacts::SqliteContactRepository;
    use crate::outbound::persistence::districts::{
        SqliteDistrictRepository, SqliteDistrictUserRepository,
    };
    use crate::outbound::persistence::requests::SqliteAppRequestRepository;
    use crate::outbound::persistence::setup::SqliteSetupRepository;
    use crate::outbound::persistence::users::SqliteUserRepository;
    use crate::outbound::persistence::SqliteStore;

    /// Image source stub yielding a fixed PNG payload for any URL.
    pub struct FixtureImageSource;

    #[async_trait]
    impl ImageSource for FixtureImageSource {
        async fn fetch(&self, _url: &str) -> Result<FetchedImage, ImageFetchError> {
            Ok(FetchedImage {
                content_type: "image/png".into(),
                bytes: b"\x89PNG fixture".to_vec(),
            })
        }
    }

    /// One in-memory deployment per test: SQLite store, upload dir, and an
    /// `HttpState` wired to them. `admin@x.org` is on the admin allow-list.
    pub struct TestContext {
        pub state: HttpState,
        pub store: SqliteStore,
        _upload_dir: tempfile::TempDir,
    }

    impl TestContext {
        pub fn new() -> Self {
            let store = SqliteStore::open_in_memory().expect("open sqlite");
            let upload_dir = tempfile::tempdir().expect("upload dir");
            let documents = DirDocumentStore::open(upload_dir.path()).expect("document store");
            let district_users = Arc::new(SqliteDistrictUserRepository::new(store.clone()));
            let state = HttpState {
                users: Arc::new(SqliteUserRepository::new(store.clone())),
                districts: Arc::new(SqliteDistrictRepository::new(store.clone())),
                district_users: district_users.clone(),
                apps: Arc::new(SqliteAppRepository::new(store.clone())),
                contacts: Arc::new(SqliteContactRepository::new(store.clone())),
                activity: Arc::new(SqliteActivityLog::new(store.clone())),
                requests: Arc::new(SqliteAppRequestRepository::new(store.clone())),
                setup: Arc::new(SqliteSetupRepository::new(store.clone())),
                identity: Arc::new(FixtureIdentityProvider {
                    identity: VerifiedIdentity {
                        email: "sso@x.org".into(),
                        name: "Single Sign-On".into(),
                    },
                }),
                images: Arc::new(ImageCache::new(Box::new(FixtureImageSource))),
                documents: Arc::new(documents),
                admin: AdminResolver::new(["admin@x.org".to_owned()], district_users),
                sso: SsoSettings {
                    env_client_id: Some("env-client-id".into()),
                    env_client_secret: Some("env-client-secret".into()),
                    public_base_url: "http://localhost:8080".into(),
                },
            };
            Self {
                state,
                store,
                _upload_dir: upload_dir,
            }
        }
    }

    /// Build the full application under the test session layer.
    ///
    /// The factory clones what it needs out of `ctx`, so the returned `impl`
    /// captures no lifetimes (`use<>`) and satisfies `init_service`'s
    /// `'static` bound.
    pub fn test_app(
        ctx: &TestContext,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(ctx.state.clone()))
            .wrap(CsrfProvision)
            .wrap(test_session_middleware())
            .configure(configure)
    }

    /// Register a fresh account and return its session cookie.
    pub async fn register_and_login<S, B>(app: &S, email: &str, password: &str) -> Cookie<'static>
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let res = test::call_service(
            app,
            test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(json!({ "username": email, "password": password }))
                .to_request(),
        )
        .await;
        assert!(
            res.status().is_success(),
            "registration failed: {}",
            res.status()
        );
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned()
    }

    /// Fetch the CSRF token provisioned for a signed-in session.
    pub async fn csrf_token<S, B>(app: &S, cookie: &Cookie<'static>) -> String
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let res = test::call_service(
            app,
            test::TestRequest::get()
                .uri("/api/auth/me")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        let body: serde_json::Value = test::read_body_json(res).await;
        body["csrf_token"]
            .as_str()
            .expect("csrf token in session")
            .to_owned()
    }
}
