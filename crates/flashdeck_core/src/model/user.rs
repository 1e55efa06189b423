//! User domain entity.
//!
//! # Responsibility
//! - Hold account identity and contact data for flashcard owners.
//! - Enforce email shape and non-blank name on every write path.
//!
//! # Invariants
//! - `id` is a non-blank string and never changes.
//! - `email` always matches `local@domain.tld`.
//! - `name` is never blank.
//! - `updated_at` is `None` until the first mutation.
//!
//! Email uniqueness is not checked here; see `UserService`.

use crate::model::timestamp::{now_epoch_ms, EpochMillis};
use crate::model::validation::{
    check_timestamp_order, is_valid_email, require_non_blank, ValidationError,
};
use serde::Serialize;
use uuid::Uuid;

/// Stable user identifier (UUID v4 text for users created by this crate).
pub type UserId = String;

/// Registered user.
///
/// Fields are private so that every change goes through a validating method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: UserId,
    email: String,
    name: String,
    created_at: EpochMillis,
    updated_at: Option<EpochMillis>,
}

impl User {
    /// Creates a new user with a generated id and `created_at = now`.
    ///
    /// # Errors
    /// - `InvalidEmail` when `email` is malformed.
    /// - `EmptyName` when `name` is blank.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::restore(
            Uuid::new_v4().to_string(),
            email,
            name,
            now_epoch_ms(),
            None,
        )
    }

    /// Rebuilds a user from persisted state, re-checking every invariant.
    pub fn restore(
        id: impl Into<UserId>,
        email: impl Into<String>,
        name: impl Into<String>,
        created_at: EpochMillis,
        updated_at: Option<EpochMillis>,
    ) -> Result<Self, ValidationError> {
        let user = Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            created_at,
            updated_at,
        };
        user.validate()?;
        Ok(user)
    }

    /// Checks all field invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.id, ValidationError::EmptyId("user"))?;
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        require_non_blank(&self.name, ValidationError::EmptyName)?;
        check_timestamp_order(self.created_at, self.updated_at)
    }

    /// Replaces the display name.
    pub fn update_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        require_non_blank(&name, ValidationError::EmptyName)?;
        self.name = name;
        self.touch();
        Ok(())
    }

    /// Replaces the email address.
    pub fn update_email(&mut self, email: impl Into<String>) -> Result<(), ValidationError> {
        let email = email.into();
        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail(email));
        }
        self.email = email;
        self.touch();
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> EpochMillis {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<EpochMillis> {
        self.updated_at
    }

    fn touch(&mut self) {
        // Clock skew must not break the created/updated ordering.
        self.updated_at = Some(now_epoch_ms().max(self.created_at));
    }
}
