//! Server construction and startup wiring.
//!
//! Builds the SQLite-backed adapter set, seeds the singleton district and the
//! optional initial admin, and runs the actix server with the session, CORS,
//! and tracing layers in place.

mod config;

pub use config::{AppConfig, ConfigError};

use std::sync::Arc;

use actix_session::config::PersistentSession;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
use tracing::{info, warn};

use crate::domain::auth::AdminResolver;
use crate::domain::district::{NewDistrict, DEFAULT_SLUG};
use crate::domain::password::hash_password;
use crate::domain::users::{DistrictRole, NewUser};
use crate::inbound::http::configure;
use crate::inbound::http::state::{HttpState, SsoSettings};
use crate::middleware::{Cors, CsrfProvision, Trace};
use crate::outbound::cache::{HttpImageSource, ImageCache};
use crate::outbound::documents::DirDocumentStore;
use crate::outbound::oauth::GoogleIdentityProvider;
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

/// Session cookies expire after an hour of inactivity.
const SESSION_TTL: Duration = Duration::hours(1);
const SEED_ADMIN_NAME: &str = "Super Admin";

fn io_other(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

/// Wire the adapter set for a deployment described by `config`.
///
/// Creates the database and upload directories when absent.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the store, the upload root, or the HTTP
/// clients cannot be opened.
pub fn build_state(config: &AppConfig) -> std::io::Result<HttpState> {
    if let Some(parent) = config.db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(&config.db_path).map_err(io_other)?;
    let documents = DirDocumentStore::open(&config.upload_dir).map_err(io_other)?;
    let identity = GoogleIdentityProvider::new().map_err(io_other)?;
    let images = ImageCache::new(Box::new(HttpImageSource::new().map_err(io_other)?));
    let district_users = Arc::new(SqliteDistrictUserRepository::new(store.clone()));

    Ok(HttpState {
        users: Arc::new(SqliteUserRepository::new(store.clone())),
        districts: Arc::new(SqliteDistrictRepository::new(store.clone())),
        district_users: district_users.clone(),
        apps: Arc::new(SqliteAppRepository::new(store.clone())),
        contacts: Arc::new(SqliteContactRepository::new(store.clone())),
        activity: Arc::new(SqliteActivityLog::new(store.clone())),
        requests: Arc::new(SqliteAppRequestRepository::new(store.clone())),
        setup: Arc::new(SqliteSetupRepository::new(store)),
        identity: Arc::new(identity),
        images: Arc::new(images),
        documents: Arc::new(documents),
        admin: AdminResolver::new(config.admin_emails.clone(), district_users),
        sso: SsoSettings {
            env_client_id: config.google_client_id.clone(),
            env_client_secret: config.google_client_secret.clone(),
            public_base_url: config.public_base_url.clone(),
        },
    })
}

/// Session layer matching the deployed cookie contract: `session`, HTTP-only,
/// `SameSite=Lax`, `Secure` in production, one-hour rolling lifetime.
#[must_use]
pub fn session_middleware(key: Key, cookie_secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_path("/".to_owned())
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .cookie_secure(cookie_secure)
        .session_lifecycle(PersistentSession::default().session_ttl(SESSION_TTL))
        .build()
}

/// Assemble the application with its middleware stack.
///
/// Wraps are registered innermost-first: CSRF provisioning sits inside the
/// session layer it reads from, CORS inside tracing so preflight responses
/// are traced too.
pub fn build_app(
    state: web::Data<HttpState>,
    session: SessionMiddleware<CookieSessionStore>,
    cors: Cors,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .configure(configure)
        .wrap(CsrfProvision)
        .wrap(session)
        .wrap(cors)
        .wrap(Trace)
}

/// Seed the singleton district and, when configured, the initial admin.
///
/// Runs on every start and is idempotent: existing rows are left alone and a
/// missing `INIT_ADMIN_PASSWORD` only skips the admin seed.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the store rejects a seed write.
pub fn bootstrap_defaults(state: &HttpState, config: &AppConfig) -> std::io::Result<()> {
    if state.districts.count().map_err(io_other)? == 0 {
        info!(name = %config.district_name, "creating default district");
        state
            .districts
            .insert(&NewDistrict {
                name: config.district_name.clone(),
                slug: DEFAULT_SLUG.to_owned(),
                contact_email: config.district_contact_email.clone(),
                created_by_email: "system".to_owned(),
            })
            .map_err(io_other)?;
    }

    if state
        .users
        .find_by_email(&config.init_admin_email)
        .map_err(io_other)?
        .is_some()
    {
        return Ok(());
    }
    let Some(password) = config.init_admin_password.as_deref() else {
        warn!("INIT_ADMIN_PASSWORD is not set; skipping default admin creation");
        return Ok(());
    };

    info!(email = %config.init_admin_email, "creating default admin");
    let password_hash = hash_password(password).map_err(io_other)?;
    state
        .users
        .insert(&NewUser {
            email: config.init_admin_email.clone(),
            name: SEED_ADMIN_NAME.to_owned(),
            password_hash,
        })
        .map_err(io_other)?;

    if let Some(district) = state.districts.first().map_err(io_other)? {
        state
            .district_users
            .upsert(
                district.id,
                &config.init_admin_email,
                SEED_ADMIN_NAME,
                DistrictRole::Admin,
            )
            .map_err(io_other)?;
    }
    Ok(())
}

/// Run the server until shutdown.
///
/// # Errors
///
/// Returns [`std::io::Error`] when wiring, seeding, or binding fails.
pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let state = build_state(&config)?;
    bootstrap_defaults(&state, &config)?;

    let data = web::Data::new(state);
    let key = config.session_key();
    let cookie_secure = config.production;
    let origins = config.frontend_origins.clone();

    info!(host = %config.host, port = config.port, "starting server");
    HttpServer::new(move || {
        build_app(
            data.clone(),
            session_middleware(key.clone(), cookie_secure),
            Cors::new(origins.clone()),
        )
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
