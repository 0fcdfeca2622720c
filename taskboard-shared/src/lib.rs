//! # Taskboard Shared Library
//!
//! Domain types, persistence, and business logic shared by the Taskboard API
//! server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: PostgreSQL pool and migrations
//! - `store`: Persistence contract with PostgreSQL and in-memory backends
//! - `auth`: Password hashing, session tokens, invitation tokens, membership checks
//! - `services`: Identity, membership/invitations, task workflow, reporting
//! - `events`: Activity events, the in-process broadcaster, and the notifier
//! - `error`: Core error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod services;
pub mod store;

pub use error::{CoreError, CoreResult};

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
