//! Database layer
//!
//! Supports SQLite (default, single-binary deployment) and MySQL behind a
//! trait-based pool abstraction. Repositories dispatch per driver; tests run
//! against in-memory SQLite.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use migrations::run_migrations;
pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool};
