//! Outcome vocabulary shared by every repository write.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Result code of one mutating repository operation.
///
/// Expected business conditions are reported through this enum. Storage
/// faults are reported separately as `RepoError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A new row was inserted.
    Created,
    /// An existing row was overwritten.
    Updated,
    /// A row was removed or tombstoned.
    Deleted,
    /// A uniqueness or deletion-eligibility rule blocked the write.
    Conflict,
    /// The target identity does not exist.
    NotFound,
    /// The payload is invalid or references a missing user.
    BadRequest,
}

impl Outcome {
    /// Stable lowercase code, used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
        }
    }

    /// Returns whether storage was mutated.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Deleted)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Outcome;

    #[test]
    fn only_mutations_count_as_success() {
        assert!(Outcome::Created.is_success());
        assert!(Outcome::Updated.is_success());
        assert!(Outcome::Deleted.is_success());
        assert!(!Outcome::Conflict.is_success());
        assert!(!Outcome::NotFound.is_success());
        assert!(!Outcome::BadRequest.is_success());
    }

    #[test]
    fn display_uses_log_code() {
        assert_eq!(Outcome::BadRequest.to_string(), "bad_request");
    }
}
