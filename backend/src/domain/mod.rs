//! Domain primitives, aggregates, and services.
//!
//! Purpose: define strongly typed entities for the catalog, the district,
//! accounts, and auditing, plus the auth and setup services that operate on
//! them. Everything here is transport agnostic; adapters live under
//! `inbound` and `outbound`.

pub mod activity;
pub mod auth;
pub mod catalog;
pub mod contacts;
pub mod district;
pub mod documents;
pub mod error;
pub mod password;
pub mod ports;
pub mod requests;
pub mod setup;
pub mod trace_id;
pub mod users;

pub use self::error::{Error, ErrorCode};
pub use self::trace_id::{TraceId, TRACE_ID_HEADER};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use alexandria_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
