//! Tag records, payloads and tag-name normalization.

use crate::model::validation::{require_non_blank, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Storage-assigned tag identity.
pub type TagId = i64;

/// Lightweight tag projection without relationship data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: TagId,
    pub name: String,
}

/// Payload for `TagRepository::create_tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCreate {
    pub name: String,
}

impl TagCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.name, ValidationError::EmptyTagName)
    }
}

/// Payload for `TagRepository::update_tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUpdate {
    pub id: TagId,
    pub name: String,
}

impl TagUpdate {
    pub fn new(id: TagId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.name, ValidationError::EmptyTagName)
    }
}

/// Normalizes tag names requested by a work item payload.
///
/// Names are trimmed, blank entries are dropped and exact duplicates are
/// collapsed keeping the first occurrence. Case is preserved.
pub fn normalize_tag_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::normalize_tag_names;

    #[test]
    fn normalize_trims_drops_blank_and_dedups_in_order() {
        let input = vec![
            " Easy ".to_string(),
            "Maths".to_string(),
            "   ".to_string(),
            "Easy".to_string(),
            "easy".to_string(),
        ];
        assert_eq!(
            normalize_tag_names(&input),
            vec!["Easy".to_string(), "Maths".to_string(), "easy".to_string()]
        );
    }

    #[test]
    fn normalize_empty_input_is_empty() {
        assert!(normalize_tag_names(&[]).is_empty());
    }
}
