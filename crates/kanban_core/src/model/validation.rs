//! Payload validation rules.
//!
//! Repositories turn any `ValidationError` into `Outcome::BadRequest`
//! before touching storage.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Reason a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Work item title is blank.
    EmptyTitle,
    /// Tag name is blank.
    EmptyTagName,
    /// User name is blank.
    EmptyUserName,
    /// Email does not look like `local@domain`.
    InvalidEmail(String),
}

impl ValidationError {
    /// Stable code without user content, safe to log.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "empty_title",
            Self::EmptyTagName => "empty_tag_name",
            Self::EmptyUserName => "empty_user_name",
            Self::InvalidEmail(_) => "invalid_email",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "work item title cannot be empty"),
            Self::EmptyTagName => write!(f, "tag name cannot be empty"),
            Self::EmptyUserName => write!(f, "user name cannot be empty"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_non_blank(value: &str, err: ValidationError) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(err)
    } else {
        Ok(())
    }
}

pub(crate) fn require_email(value: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(value.to_string()))
    }
}
