//! Kanban domain model.
//!
//! # Responsibility
//! - Define the records, payloads and read projections for users, tags and
//!   work items.
//! - Define the closed outcome vocabulary returned by repository writes.
//!
//! # Invariants
//! - Identities are storage-assigned integers and never reused.
//! - Payloads are validated before any storage mutation.

pub mod outcome;
pub mod tag;
pub mod user;
pub mod validation;
pub mod work_item;
