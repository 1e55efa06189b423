//! Domain entities and their field-level invariants.
//!
//! # Responsibility
//! - Define the `User` and `Flashcard` entities used by use-case services.
//! - Validate every construction and mutation before state changes.
//!
//! # Invariants
//! - Entity identifiers never change after construction.
//! - A failed validation leaves the entity exactly as it was.
//! - `updated_at` is re-stamped by every successful mutation.

pub mod flashcard;
pub mod timestamp;
pub mod user;
pub mod validation;
