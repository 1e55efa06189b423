//! Presentation-facing actions.
//!
//! # Responsibility
//! - Expose named, plain-data entry points over the wired services.
//! - Wrap every outcome in the `{success, data, error}` envelope.
//!
//! # Invariants
//! - Actions never panic and never return raw errors; failures become
//!   `success = false` with the error's display message.
//! - DTOs serialize with camelCase keys and epoch-millisecond timestamps.

use crate::app::AppServices;
use crate::model::flashcard::{Difficulty, Flashcard};
use crate::model::timestamp::EpochMillis;
use crate::model::user::User;
use crate::repo::crud::PageQuery;
use crate::service::{ServiceError, ServiceResult};
use log::warn;
use serde::{Deserialize, Serialize};

/// Uniform action result envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable note for actions without a payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ActionResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: EpochMillis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<EpochMillis>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            name: user.name().to_string(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardDto {
    pub id: String,
    pub user_id: String,
    pub front: String,
    pub back: String,
    pub difficulty: Difficulty,
    pub created_at: EpochMillis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<EpochMillis>,
}

impl From<&Flashcard> for FlashcardDto {
    fn from(card: &Flashcard) -> Self {
        Self {
            id: card.id().to_string(),
            user_id: card.user_id().to_string(),
            front: card.front().to_string(),
            back: card.back().to_string(),
            difficulty: card.difficulty(),
            created_at: card.created_at(),
            updated_at: card.updated_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateUserInput {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlashcardInput {
    pub user_id: String,
    pub front: String,
    pub back: String,
    /// `easy|medium|hard`; parsed inside the action.
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFlashcardInput {
    pub user_id: String,
    pub topic: String,
    pub difficulty: String,
}

pub fn create_user(app: &AppServices<'_>, input: &CreateUserInput) -> ActionResponse<UserDto> {
    let outcome = app.users().create_user(&input.email, &input.name);
    respond("create_user", outcome.map(|user| UserDto::from(&user)))
}

pub fn get_user(app: &AppServices<'_>, id: &str) -> ActionResponse<UserDto> {
    let outcome = app.users().get_user(id);
    respond("get_user", outcome.map(|user| UserDto::from(&user)))
}

pub fn list_users(app: &AppServices<'_>, page: &PageQuery) -> ActionResponse<Vec<UserDto>> {
    let outcome = app.users().list_users(page);
    respond(
        "list_users",
        outcome.map(|users| users.iter().map(UserDto::from).collect()),
    )
}

pub fn update_user(app: &AppServices<'_>, input: &UpdateUserInput) -> ActionResponse<UserDto> {
    let outcome = app
        .users()
        .update_user(&input.id, &input.email, &input.name);
    respond("update_user", outcome.map(|user| UserDto::from(&user)))
}

/// Deletes a user; on success the envelope carries a message, no data.
pub fn delete_user(app: &AppServices<'_>, id: &str) -> ActionResponse<()> {
    match app.users().delete_user(id) {
        Ok(()) => ActionResponse {
            success: true,
            data: None,
            error: None,
            message: Some("user deleted".to_string()),
        },
        Err(err) => failed("delete_user", &err),
    }
}

pub fn create_flashcard(
    app: &AppServices<'_>,
    input: &CreateFlashcardInput,
) -> ActionResponse<FlashcardDto> {
    let outcome = parse_difficulty(&input.difficulty).and_then(|difficulty| {
        app.flashcards()
            .create_flashcard(&input.user_id, &input.front, &input.back, difficulty)
    });
    respond("create_flashcard", outcome.map(|card| FlashcardDto::from(&card)))
}

pub fn generate_flashcard(
    app: &AppServices<'_>,
    input: &GenerateFlashcardInput,
) -> ActionResponse<FlashcardDto> {
    let outcome = parse_difficulty(&input.difficulty).and_then(|difficulty| {
        app.flashcards()
            .generate_flashcard(&input.user_id, &input.topic, difficulty)
    });
    respond(
        "generate_flashcard",
        outcome.map(|card| FlashcardDto::from(&card)),
    )
}

pub fn list_flashcards(app: &AppServices<'_>, user_id: &str) -> ActionResponse<Vec<FlashcardDto>> {
    let outcome = app.flashcards().list_flashcards_for_user(user_id);
    respond(
        "list_flashcards",
        outcome.map(|cards| cards.iter().map(FlashcardDto::from).collect()),
    )
}

fn parse_difficulty(value: &str) -> ServiceResult<Difficulty> {
    Ok(value.parse::<Difficulty>()?)
}

fn respond<T>(action: &'static str, outcome: ServiceResult<T>) -> ActionResponse<T> {
    match outcome {
        Ok(data) => ActionResponse::success(data),
        Err(err) => failed(action, &err),
    }
}

fn failed<T>(action: &'static str, err: &ServiceError) -> ActionResponse<T> {
    warn!("event=action module=actions status=error action={action} error={err}");
    ActionResponse::failure(err.to_string())
}
