//! External collaborators: web search, street-level imagery, the local knowledge base,
//! and the text generator.
//!
//! Every collaborator result is wrapped here so workflows never see transport shapes:
//! search and imagery return `Collaboration<T>` (delivered or degraded, never an error),
//! while text generation is the one fatal path and returns `Result<_, LlmError>`.
//!
//! `AppState` carries each one as `Arc<dyn …>`, swapped for fakes in tests.

use async_trait::async_trait;

use crate::llm_client::{GeneratedNarrative, LlmClient, LlmError, PromptPayload};

pub mod knowledge;
pub mod search;
pub mod street_view;

pub use search::{render_search_digest, SearchHit};
pub use street_view::StreetImage;

/// Outcome of a non-fatal collaborator call.
#[derive(Debug)]
pub enum Collaboration<T> {
    Delivered(T),
    /// The service failed or is not configured; the pipeline continues without it.
    Degraded { reason: String },
}

impl<T> Collaboration<T> {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Collaboration::Degraded {
            reason: reason.into(),
        }
    }

    pub fn delivered(self) -> Option<T> {
        match self {
            Collaboration::Delivered(value) => Some(value),
            Collaboration::Degraded { .. } => None,
        }
    }
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Collaboration<Vec<SearchHit>>;
}

#[async_trait]
pub trait StreetImagery: Send + Sync {
    /// `size` is `"<width>x<height>"` in pixels.
    async fn fetch(&self, address: &str, size: &str) -> Collaboration<StreetImage>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, payload: &PromptPayload) -> Result<GeneratedNarrative, LlmError>;
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, payload: &PromptPayload) -> Result<GeneratedNarrative, LlmError> {
        self.generate_text(payload).await
    }
}
