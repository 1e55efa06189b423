//! Validation errors and shared field checks for domain entities.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

// Shape check only, not RFC 5322.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Entity invariant violation raised at construction or mutation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email does not match `local@domain.tld`.
    InvalidEmail(String),
    /// User name is empty after trimming.
    EmptyName,
    /// Flashcard front is empty after trimming.
    EmptyFront,
    /// Flashcard back is empty after trimming.
    EmptyBack,
    /// Difficulty is outside `easy|medium|hard`.
    InvalidDifficulty(String),
    /// Identifier is blank.
    EmptyId(&'static str),
    /// `updated_at` predates `created_at`.
    TimestampOrder { created_at: i64, updated_at: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::EmptyName => write!(f, "name cannot be empty"),
            Self::EmptyFront => write!(f, "flashcard front cannot be empty"),
            Self::EmptyBack => write!(f, "flashcard back cannot be empty"),
            Self::InvalidDifficulty(value) => {
                write!(
                    f,
                    "invalid difficulty `{value}`; expected easy|medium|hard"
                )
            }
            Self::EmptyId(entity) => write!(f, "{entity} id cannot be empty"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Returns whether `email` has the `local@domain.tld` shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn require_non_blank(
    value: &str,
    error: ValidationError,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error);
    }
    Ok(())
}

pub(crate) fn check_timestamp_order(
    created_at: i64,
    updated_at: Option<i64>,
) -> Result<(), ValidationError> {
    match updated_at {
        Some(updated_at) if updated_at < created_at => Err(ValidationError::TimestampOrder {
            created_at,
            updated_at,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::is_valid_email;

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email(""));
    }
}
