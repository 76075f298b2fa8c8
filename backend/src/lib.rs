//! Single-tenant district app-catalog backend.
//!
//! Hexagonal layout: `domain` holds entities, policy, and ports; `inbound`
//! the HTTP adapter; `outbound` the SQLite, identity, image, and document
//! adapters; `server` the wiring that assembles a deployment.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use middleware::Trace;
