//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around Actix sessions so handlers only deal with
//! domain-friendly operations such as persisting or retrieving the signed-in
//! user.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::domain::Error;
use crate::domain::auth::AuthenticatedUser;
use crate::middleware::csrf::CSRF_SESSION_KEY;

pub(crate) const USER_KEY: &str = "user";
pub(crate) const OAUTH_STATE_KEY: &str = "oauth_state";

/// The signed-in user as stored in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Absent for accounts provisioned through OAuth before their first
    /// local lookup.
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
}

impl From<AuthenticatedUser> for SessionUser {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            id: Some(user.id),
            email: user.email,
            name: user.name,
        }
    }
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    fn read_error(error: impl std::fmt::Display) -> Error {
        Error::internal(format!("failed to read session: {error}"))
    }

    fn write_error(error: impl std::fmt::Display) -> Error {
        Error::internal(format!("failed to persist session: {error}"))
    }

    /// Persist the signed-in user in the session cookie.
    pub fn persist_user(&self, user: &SessionUser) -> Result<(), Error> {
        self.0.insert(USER_KEY, user).map_err(Self::write_error)
    }

    /// Fetch the signed-in user from the session, if present.
    pub fn current_user(&self) -> Result<Option<SessionUser>, Error> {
        self.0
            .get::<SessionUser>(USER_KEY)
            .map_err(Self::read_error)
    }

    /// Require a signed-in user or return `401 Unauthorized`.
    pub fn require_user(&self) -> Result<SessionUser, Error> {
        self.current_user()?
            .ok_or_else(|| Error::unauthorized("Authentication required"))
    }

    /// The CSRF token provisioned for this session, if any.
    pub fn csrf_token(&self) -> Result<Option<String>, Error> {
        self.0
            .get::<String>(CSRF_SESSION_KEY)
            .map_err(Self::read_error)
    }

    /// Stash the OAuth state nonce ahead of the provider redirect.
    pub fn store_oauth_state(&self, state: &str) -> Result<(), Error> {
        self.0
            .insert(OAUTH_STATE_KEY, state)
            .map_err(Self::write_error)
    }

    /// Take the OAuth state nonce, removing it so it is single-use.
    pub fn take_oauth_state(&self) -> Result<Option<String>, Error> {
        let state = self
            .0
            .get::<String>(OAUTH_STATE_KEY)
            .map_err(Self::read_error)?;
        self.0.remove(OAUTH_STATE_KEY);
        Ok(state)
    }

    /// Clear the whole session, signing the user out.
    pub fn clear(&self) {
        self.0.clear();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
