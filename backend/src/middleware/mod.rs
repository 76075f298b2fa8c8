//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! tracing, cross-origin headers, and CSRF token provisioning.

pub mod cors;
pub mod csrf;
pub mod trace;

pub use cors::Cors;
pub use csrf::CsrfProvision;
pub use trace::Trace;
