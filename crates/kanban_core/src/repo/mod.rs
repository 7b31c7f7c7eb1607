//! Repository contracts and SQLite implementations for the Kanban store.
//!
//! # Responsibility
//! - Expose keyed CRUD for users and tags, and the work item lifecycle.
//! - Keep SQL and transaction boundaries inside the persistence layer.
//!
//! # Invariants
//! - Expected business conditions come back as `Outcome`; only storage
//!   faults come back as `RepoError`.
//! - Every public write runs in exactly one `IMMEDIATE` transaction.
//! - Repositories only accept connections migrated to `latest_version()`.

pub mod error;
mod schema_guard;
pub mod tag_repo;
pub mod user_repo;
pub mod work_item_repo;

pub use error::{RepoError, RepoResult};
