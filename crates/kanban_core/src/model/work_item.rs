//! Work item records, lifecycle state and deletion policy.
//!
//! # Invariants
//! - A work item starts in `WorkItemState::New`.
//! - `Update` may assign any state; only deletion is state-gated.
//! - `state_updated_at` moves whenever the state is written.

use crate::model::tag::normalize_tag_names;
use crate::model::user::UserId;
use crate::model::validation::{require_non_blank, ValidationError};
use serde::{Deserialize, Serialize};

/// Storage-assigned work item identity.
pub type WorkItemId = i64;

/// Lifecycle state of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemState {
    New,
    Active,
    Resolved,
    Closed,
    /// Tombstone left behind when an active item is deleted.
    Removed,
}

/// What `delete_work_item` does to an item in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Row is physically removed.
    HardDelete,
    /// Row is kept and its state becomes `Removed`.
    Tombstone,
    /// Item is settled; deletion is refused with `Conflict`.
    Protected,
}

impl WorkItemState {
    pub const ALL: [WorkItemState; 5] = [
        Self::New,
        Self::Active,
        Self::Resolved,
        Self::Closed,
        Self::Removed,
    ];

    /// Deletion state machine.
    pub fn deletion_policy(self) -> DeletionPolicy {
        match self {
            Self::New => DeletionPolicy::HardDelete,
            Self::Active => DeletionPolicy::Tombstone,
            Self::Resolved | Self::Closed | Self::Removed => DeletionPolicy::Protected,
        }
    }

    /// Value stored in `work_items.state`.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Removed => "removed",
        }
    }

    /// Parses a stored `work_items.state` value.
    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "active" => Some(Self::Active),
            "resolved" => Some(Self::Resolved),
            "closed" => Some(Self::Closed),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }
}

/// Payload for `WorkItemRepository::create_work_item`.
///
/// `assigned_to_id` must name an existing user; `None` is rejected with
/// `BadRequest`. Unknown tag names are created on the fly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemCreate {
    pub title: String,
    pub assigned_to_id: Option<UserId>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl WorkItemCreate {
    pub fn new(title: impl Into<String>, assigned_to_id: Option<UserId>) -> Self {
        Self {
            title: title.into(),
            assigned_to_id,
            description: None,
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.title, ValidationError::EmptyTitle)
    }

    /// Tag names after trimming and de-duplication.
    pub fn normalized_tags(&self) -> Vec<String> {
        normalize_tag_names(&self.tags)
    }
}

/// Payload for `WorkItemRepository::update_work_item`.
///
/// Every field is overwritten, including the tag set and the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemUpdate {
    pub id: WorkItemId,
    pub title: String,
    pub assigned_to_id: Option<UserId>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub state: WorkItemState,
}

impl WorkItemUpdate {
    pub fn new(
        id: WorkItemId,
        title: impl Into<String>,
        assigned_to_id: Option<UserId>,
        state: WorkItemState,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            assigned_to_id,
            description: None,
            tags: Vec::new(),
            state,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.title, ValidationError::EmptyTitle)
    }

    pub fn normalized_tags(&self) -> Vec<String> {
        normalize_tag_names(&self.tags)
    }
}

/// List projection returned by the `read_work_items*` family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemSummary {
    pub id: WorkItemId,
    pub title: String,
    /// Assignee name, empty when unassigned.
    pub assigned_to: String,
    /// Tag names sorted by name.
    pub tags: Vec<String>,
    pub state: WorkItemState,
}

/// Detail projection returned by `find_work_item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItemDetails {
    pub id: WorkItemId,
    pub title: String,
    /// Empty when no description was given.
    pub description: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Assignee name, empty when unassigned.
    pub assigned_to: String,
    /// Tag names sorted by name.
    pub tags: Vec<String>,
    pub state: WorkItemState,
    /// Unix epoch milliseconds of the last state write.
    pub state_updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{DeletionPolicy, WorkItemState};

    #[test]
    fn deletion_policy_follows_lifecycle() {
        assert_eq!(
            WorkItemState::New.deletion_policy(),
            DeletionPolicy::HardDelete
        );
        assert_eq!(
            WorkItemState::Active.deletion_policy(),
            DeletionPolicy::Tombstone
        );
        for settled in [
            WorkItemState::Resolved,
            WorkItemState::Closed,
            WorkItemState::Removed,
        ] {
            assert_eq!(settled.deletion_policy(), DeletionPolicy::Protected);
        }
    }

    #[test]
    fn db_values_parse_back_and_unknown_is_rejected() {
        for state in WorkItemState::ALL {
            assert_eq!(WorkItemState::from_db_str(state.as_db_str()), Some(state));
        }
        assert_eq!(WorkItemState::from_db_str("archived"), None);
        assert_eq!(WorkItemState::from_db_str("New"), None);
    }
}
