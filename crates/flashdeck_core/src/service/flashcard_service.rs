//! Flashcard use-case service.
//!
//! # Responsibility
//! - Create, read, mutate and delete flashcards owned by existing users.
//! - Draft flashcards through an injected `ContentGenerator`.
//!
//! # Invariants
//! - A card is only created for a user that exists at call time.
//! - Generated text is accepted only in the `FRONT: .. BACK: ..` shape.

use crate::model::flashcard::{Difficulty, Flashcard};
use crate::repo::flashcard_repo::FlashcardRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::generator::{ContentGenerator, GenerationRequest};
use crate::service::{ServiceError, ServiceResult};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

const GENERATION_MAX_TOKENS: u32 = 500;
const GENERATION_TEMPERATURE: f32 = 0.7;

static GENERATED_CARD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)FRONT: (.+?) BACK: (.+)").expect("valid generated card regex")
});

/// Use-case service wrapper for flashcard operations.
pub struct FlashcardService<U, F, G>
where
    U: UserRepository,
    F: FlashcardRepository,
    G: ContentGenerator,
{
    users: U,
    flashcards: F,
    generator: G,
}

impl<U, F, G> FlashcardService<U, F, G>
where
    U: UserRepository,
    F: FlashcardRepository,
    G: ContentGenerator,
{
    pub fn new(users: U, flashcards: F, generator: G) -> Self {
        Self {
            users,
            flashcards,
            generator,
        }
    }

    /// Creates a card with caller-supplied content.
    pub fn create_flashcard(
        &self,
        user_id: &str,
        front: &str,
        back: &str,
        difficulty: Difficulty,
    ) -> ServiceResult<Flashcard> {
        self.require_user(user_id)?;
        let card = Flashcard::new(user_id, front, back, difficulty)?;
        self.store_new(card)
    }

    /// Asks the generator for a card about `topic` and stores it.
    ///
    /// # Errors
    /// - `UserNotFound` when `user_id` does not exist.
    /// - `Generation` when the generator fails.
    /// - `UnparseableGeneration` when the reply lacks `FRONT:`/`BACK:`.
    pub fn generate_flashcard(
        &self,
        user_id: &str,
        topic: &str,
        difficulty: Difficulty,
    ) -> ServiceResult<Flashcard> {
        self.require_user(user_id)?;

        let request = GenerationRequest {
            prompt: build_prompt(topic, difficulty),
            max_tokens: Some(GENERATION_MAX_TOKENS),
            temperature: Some(GENERATION_TEMPERATURE),
        };
        let response = self.generator.generate(&request).map_err(|err| {
            warn!(
                "event=flashcard_generate module=service status=error model={} error={err}",
                self.generator.model_name()
            );
            err
        })?;

        let (front, back) =
            parse_generated(&response.text).ok_or(ServiceError::UnparseableGeneration)?;
        let card = Flashcard::new(user_id, front, back, difficulty)?;
        self.store_new(card)
    }

    pub fn get_flashcard(&self, id: &str) -> ServiceResult<Flashcard> {
        self.flashcards
            .find_by_id(id)?
            .ok_or_else(|| ServiceError::FlashcardNotFound(id.to_string()))
    }

    pub fn list_flashcards_for_user(&self, user_id: &str) -> ServiceResult<Vec<Flashcard>> {
        Ok(self.flashcards.find_by_user_id(user_id)?)
    }

    pub fn update_flashcard_content(
        &self,
        id: &str,
        front: &str,
        back: &str,
    ) -> ServiceResult<Flashcard> {
        let mut card = self.get_flashcard(id)?;
        card.update_content(front, back)?;
        Ok(self.flashcards.save(&card)?)
    }

    pub fn update_flashcard_difficulty(
        &self,
        id: &str,
        difficulty: Difficulty,
    ) -> ServiceResult<Flashcard> {
        let mut card = self.get_flashcard(id)?;
        card.update_difficulty(difficulty);
        Ok(self.flashcards.save(&card)?)
    }

    pub fn delete_flashcard(&self, id: &str) -> ServiceResult<()> {
        if !self.flashcards.delete(id)? {
            return Err(ServiceError::FlashcardNotFound(id.to_string()));
        }
        info!("event=flashcard_delete module=service status=ok flashcard_id={id}");
        Ok(())
    }

    pub fn count_flashcards(&self) -> ServiceResult<u64> {
        Ok(self.flashcards.count()?)
    }

    fn require_user(&self, user_id: &str) -> ServiceResult<()> {
        match self.users.find_by_id(user_id)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::UserNotFound(user_id.to_string())),
        }
    }

    fn store_new(&self, card: Flashcard) -> ServiceResult<Flashcard> {
        let saved = self.flashcards.save(&card)?;
        info!(
            "event=flashcard_create module=service status=ok flashcard_id={} user_id={}",
            saved.id(),
            saved.user_id()
        );
        Ok(saved)
    }
}

fn build_prompt(topic: &str, difficulty: Difficulty) -> String {
    format!(
        "Generate a flashcard about {topic} at {difficulty} difficulty level.\n\
         Format: FRONT: [front text] BACK: [back text]"
    )
}

/// Splits generated text into trimmed `(front, back)`.
fn parse_generated(text: &str) -> Option<(&str, &str)> {
    let captures = GENERATED_CARD_RE.captures(text)?;
    let front = captures.get(1)?.as_str().trim();
    let back = captures.get(2)?.as_str().trim();
    Some((front, back))
}

#[cfg(test)]
mod tests {
    use super::{build_prompt, parse_generated};
    use crate::model::flashcard::Difficulty;

    #[test]
    fn prompt_names_topic_difficulty_and_format() {
        let prompt = build_prompt("borrowing", Difficulty::Hard);
        assert!(prompt.starts_with("Generate a flashcard about borrowing at hard difficulty level."));
        assert!(prompt.ends_with("Format: FRONT: [front text] BACK: [back text]"));
    }

    #[test]
    fn parse_generated_trims_both_sides_across_lines() {
        let parsed = parse_generated("Sure!\nFRONT: What is 2+2?\n BACK: 4\nand more\n");
        assert_eq!(parsed, Some(("What is 2+2?", "4\nand more")));
    }

    #[test]
    fn parse_generated_rejects_missing_markers() {
        assert_eq!(parse_generated("FRONT: only a question"), None);
        assert_eq!(parse_generated("no markers at all"), None);
    }
}
