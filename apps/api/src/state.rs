use std::sync::Arc;

use crate::collaborators::{StreetImagery, TextGenerator, WebSearch};
use crate::config::Config;
use crate::layout::PageConfig;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Fatal collaborator: failures surface as `LLM_ERROR`.
    pub llm: Arc<dyn TextGenerator>,
    pub search: Arc<dyn WebSearch>,
    pub imagery: Arc<dyn StreetImagery>,
    /// Page geometry for the strategy report (US letter).
    pub page_config: PageConfig,
}
