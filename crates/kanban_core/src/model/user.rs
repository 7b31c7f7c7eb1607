//! User records and payloads.
//!
//! `email` is the natural key. It is compared exactly as stored; no case
//! folding or trimming is applied.

use crate::model::validation::{require_email, require_non_blank, ValidationError};
use serde::{Deserialize, Serialize};

/// Storage-assigned user identity.
pub type UserId = i64;

/// Lightweight user projection. Assigned work items are not exposed here;
/// see `UserRepository::user_work_items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Payload for `UserRepository::create_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
}

impl UserCreate {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.name, ValidationError::EmptyUserName)?;
        require_email(&self.email)
    }
}

/// Payload for `UserRepository::update_user`. Overwrites both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl UserUpdate {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.name, ValidationError::EmptyUserName)?;
        require_email(&self.email)
    }
}
