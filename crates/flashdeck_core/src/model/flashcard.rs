//! Flashcard domain entity.
//!
//! # Invariants
//! - `front` and `back` are never blank.
//! - `difficulty` is always one of the three enumerated levels.
//! - `user_id` is a plain reference; existence is checked by services only.

use crate::model::timestamp::{now_epoch_ms, EpochMillis};
use crate::model::user::UserId;
use crate::model::validation::{check_timestamp_order, require_non_blank, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable flashcard identifier.
pub type FlashcardId = String;

/// Closed set of flashcard difficulty levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(ValidationError::InvalidDifficulty(other.to_string())),
        }
    }
}

/// Question/answer card owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flashcard {
    id: FlashcardId,
    user_id: UserId,
    front: String,
    back: String,
    difficulty: Difficulty,
    created_at: EpochMillis,
    updated_at: Option<EpochMillis>,
}

impl Flashcard {
    /// Creates a new flashcard with a generated id and `created_at = now`.
    pub fn new(
        user_id: impl Into<UserId>,
        front: impl Into<String>,
        back: impl Into<String>,
        difficulty: Difficulty,
    ) -> Result<Self, ValidationError> {
        Self::restore(
            Uuid::new_v4().to_string(),
            user_id,
            front,
            back,
            difficulty,
            now_epoch_ms(),
            None,
        )
    }

    /// Rebuilds a flashcard from persisted state, re-checking every invariant.
    pub fn restore(
        id: impl Into<FlashcardId>,
        user_id: impl Into<UserId>,
        front: impl Into<String>,
        back: impl Into<String>,
        difficulty: Difficulty,
        created_at: EpochMillis,
        updated_at: Option<EpochMillis>,
    ) -> Result<Self, ValidationError> {
        let card = Self {
            id: id.into(),
            user_id: user_id.into(),
            front: front.into(),
            back: back.into(),
            difficulty,
            created_at,
            updated_at,
        };
        card.validate()?;
        Ok(card)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.id, ValidationError::EmptyId("flashcard"))?;
        require_non_blank(&self.user_id, ValidationError::EmptyId("user"))?;
        require_non_blank(&self.front, ValidationError::EmptyFront)?;
        require_non_blank(&self.back, ValidationError::EmptyBack)?;
        check_timestamp_order(self.created_at, self.updated_at)
    }

    /// Replaces both sides of the card at once.
    ///
    /// Neither side changes unless both are valid.
    pub fn update_content(
        &mut self,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let front = front.into();
        let back = back.into();
        require_non_blank(&front, ValidationError::EmptyFront)?;
        require_non_blank(&back, ValidationError::EmptyBack)?;
        self.front = front;
        self.back = back;
        self.touch();
        Ok(())
    }

    pub fn update_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.touch();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn created_at(&self) -> EpochMillis {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<EpochMillis> {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = Some(now_epoch_ms().max(self.created_at));
    }
}
