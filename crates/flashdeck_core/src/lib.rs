//! Core domain logic for flashdeck.
//! This crate is the single source of truth for business invariants.

pub mod actions;
pub mod app;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use app::{AppServices, Backend};
pub use config::{AppConfig, BackendConfig, ConfigError};
pub use logging::{init_logging, logging_status, LogLevel, LogSettings, LoggingError};
pub use model::flashcard::{Difficulty, Flashcard, FlashcardId};
pub use model::user::{User, UserId};
pub use model::validation::ValidationError;
pub use repo::crud::{CrudRepository, FieldValue, Fields, PageQuery, Record, RecordId};
pub use repo::{PersistenceError, RepoResult};
pub use service::generator::{
    ContentGenerator, GenerationError, GenerationRequest, GenerationResponse,
};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
