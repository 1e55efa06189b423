//! Content-generation seam used by flashcard generation.
//!
//! # Responsibility
//! - Define the request/response shapes exchanged with a text generator.
//! - Keep provider clients out of the core; callers inject an implementation.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Upper bound on generated tokens; provider default when `None`.
    pub max_tokens: Option<u32>,
    /// Sampling temperature in `0.0..=1.0`; provider default when `None`.
    pub temperature: Option<f32>,
}

/// Generated text returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    pub text: String,
}

impl GenerationResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Failure reported by a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// No generator is configured or it is not initialized.
    Unavailable(String),
    /// Provider call failed or returned no content.
    Provider(String),
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "generator unavailable: {message}"),
            Self::Provider(message) => write!(f, "provider error: {message}"),
        }
    }
}

impl Error for GenerationError {}

/// Text generator used to draft flashcards.
pub trait ContentGenerator {
    /// Provider model identifier, for diagnostics.
    fn model_name(&self) -> &str;

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GenerationError>;
}

impl<G: ContentGenerator + ?Sized> ContentGenerator for &G {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        (**self).generate(request)
    }
}

impl<G: ContentGenerator + ?Sized> ContentGenerator for Box<G> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        (**self).generate(request)
    }
}

/// Generator that always fails; wired when no provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableGenerator;

impl ContentGenerator for UnavailableGenerator {
    fn model_name(&self) -> &str {
        "none"
    }

    fn generate(&self, _request: &GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        Err(GenerationError::Unavailable(
            "no content generator configured".to_string(),
        ))
    }
}
