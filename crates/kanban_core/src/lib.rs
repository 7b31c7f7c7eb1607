//! Persistence core for a Kanban board of users, tags and work items.
//! This crate owns the domain invariants; callers only see outcomes.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::outcome::Outcome;
pub use model::tag::{normalize_tag_names, TagCreate, TagId, TagRecord, TagUpdate};
pub use model::user::{UserCreate, UserId, UserRecord, UserUpdate};
pub use model::validation::ValidationError;
pub use model::work_item::{
    DeletionPolicy, WorkItemCreate, WorkItemDetails, WorkItemId, WorkItemState, WorkItemSummary,
    WorkItemUpdate,
};
pub use repo::tag_repo::{SqliteTagRepository, TagRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::work_item_repo::{SqliteWorkItemRepository, WorkItemFilter, WorkItemRepository};
pub use repo::{RepoError, RepoResult};

/// Minimal health-check API for wiring probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
