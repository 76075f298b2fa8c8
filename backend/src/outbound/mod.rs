//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits for various infrastructure concerns:
//!
//! - **persistence**: SQLite-backed repositories
//! - **oauth**: Google identity provider over HTTPS
//! - **cache**: TTL-cached remote image fetching for the proxy endpoint
//! - **documents**: capability-scoped upload storage
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod cache;
pub mod documents;
pub mod oauth;
pub mod persistence;
