//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Translate absence and logical conflicts into typed `ServiceError`s.
//!
//! # Invariants
//! - One repository call per logical step; no multi-entity transactions.
//! - Services stay storage-agnostic and never see backend types.

pub mod flashcard_service;
pub mod generator;
pub mod user_service;

use crate::model::validation::ValidationError;
use crate::repo::PersistenceError;
use crate::service::generator::GenerationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a use-case call.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    UserNotFound(String),
    FlashcardNotFound(String),
    /// Create path: another user already owns the email.
    EmailAlreadyExists(String),
    /// Update path: the new email belongs to a different user.
    EmailInUse(String),
    Generation(GenerationError),
    /// Generated text did not contain the `FRONT: .. BACK: ..` shape.
    UnparseableGeneration,
    Persistence(PersistenceError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UserNotFound(_) => write!(f, "user not found"),
            Self::FlashcardNotFound(_) => write!(f, "flashcard not found"),
            Self::EmailAlreadyExists(_) => write!(f, "user with this email already exists"),
            Self::EmailInUse(_) => write!(f, "email already in use by another user"),
            Self::Generation(err) => write!(f, "content generation failed: {err}"),
            Self::UnparseableGeneration => write!(f, "failed to parse generated flashcard"),
            Self::Persistence(err) => write!(f, "storage operation failed: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Generation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::UserNotFound(_)
            | Self::FlashcardNotFound(_)
            | Self::EmailAlreadyExists(_)
            | Self::EmailInUse(_)
            | Self::UnparseableGeneration => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistenceError> for ServiceError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<GenerationError> for ServiceError {
    fn from(value: GenerationError) -> Self {
        Self::Generation(value)
    }
}
