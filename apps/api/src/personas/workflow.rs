//! Persona workflows.
//!
//! Each workflow is straight-line: validate → collaborators → (metrics) → compose →
//! generate. Nothing is kept between calls. Search and imagery failures degrade to
//! placeholders; only the text generator can fail a request.

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collaborators::knowledge::load_knowledge_base;
use crate::collaborators::street_view::COVER_IMAGE_SIZE;
use crate::collaborators::{render_search_digest, Collaboration};
use crate::errors::AppError;
use crate::listings::{analyze_csv, MarketMetrics, MetricsOutcome};
use crate::personas::composer::{
    compose, AnalystRequest, CopywriterRequest, PersonaRequest, PromptContext, StrategistRequest,
};
use crate::personas::Persona;
use crate::report::{render_report_pdf, report_filename, ReportContent};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StrategyPlan {
    pub persona: Persona,
    pub address: String,
    pub metrics: MarketMetrics,
    pub web_intel: String,
    pub narrative: String,
}

#[derive(Debug, Serialize)]
pub struct VisualCritique {
    pub persona: Persona,
    pub narrative: String,
    pub image_attached: bool,
}

#[derive(Debug, Serialize)]
pub struct ListingCopy {
    pub persona: Persona,
    pub narrative: String,
}

/// Export request posted back by the client after a strategy plan.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub address: String,
    pub metrics: MarketMetrics,
    pub narrative: String,
    #[serde(default = "default_include_photo")]
    pub include_photo: bool,
}

fn default_include_photo() -> bool {
    true
}

#[derive(Debug)]
pub struct ReportExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

// ────────────────────────────────────────────────────────────────────────────
// Strategist
// ────────────────────────────────────────────────────────────────────────────

/// Metrics step alone. Input problems are errors; data-shape problems are a `Failed` outcome.
pub async fn run_strategist_metrics(
    request: StrategistRequest,
) -> Result<MetricsOutcome, AppError> {
    request.validate()?;
    compute_metrics(request.csv, request.address, request.lookback_months).await
}

pub async fn run_strategist_plan(state: &AppState, request: StrategistRequest) -> Result<StrategyPlan, AppError> {
    request.validate()?;
    let address = request.address.trim().to_string();
    info!("Strategist invoked for {address:?} ({} months)", request.lookback_months);

    let query = format!("{address} real estate market trends");
    let web_intel = render_search_digest(state.search.search(&query, state.config.search_max_results).await);

    let metrics = match compute_metrics(request.csv.clone(), address.clone(), request.lookback_months).await? {
        MetricsOutcome::Computed(metrics) => metrics,
        MetricsOutcome::Failed { error } => return Err(AppError::DataShape(error)),
    };

    let context = PromptContext {
        metrics: Some(metrics.clone()),
        web_intel: web_intel.clone(),
        ..Default::default()
    };
    let (narrative, _) = generate(state, PersonaRequest::Strategist(request), &context).await?;

    Ok(StrategyPlan {
        persona: Persona::Strategist,
        address,
        metrics,
        web_intel,
        narrative,
    })
}

async fn compute_metrics(csv: Bytes, address: String, lookback_months: u32) -> Result<MetricsOutcome, AppError> {
    let outcome = tokio::task::spawn_blocking(move || analyze_csv(&csv, &address, lookback_months))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed computing metrics: {e}")))?;
    if let MetricsOutcome::Failed { error } = &outcome {
        warn!("Metrics step failed: {error}");
    }
    Ok(outcome)
}

/// Renders the strategy PDF, fetching a street-level cover photo when asked.
pub async fn render_strategy_report(state: &AppState, request: ReportRequest) -> Result<ReportExport, AppError> {
    if request.address.trim().is_empty() {
        return Err(AppError::Validation("address is required".to_string()));
    }

    let photo = if request.include_photo {
        match state.imagery.fetch(request.address.trim(), COVER_IMAGE_SIZE).await {
            Collaboration::Delivered(image) => Some(image),
            Collaboration::Degraded { reason } => {
                warn!("No cover photo for {:?}: {reason}", request.address);
                None
            }
        }
    } else {
        None
    };

    let filename = report_filename(&request.address);
    let content = ReportContent {
        address: request.address,
        metrics: request.metrics,
        narrative: request.narrative,
        generated_on: Utc::now().date_naive(),
    };
    let page_config = state.page_config.clone();

    // The temp file behind `photo` must outlive the render, so it moves into the closure.
    let rendered = tokio::task::spawn_blocking(move || {
        render_report_pdf(&content, photo.as_ref().map(|p| p.path()), page_config)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed rendering report: {e}")))??;

    info!(
        "Strategy report {filename} ready ({} pages, photo embedded: {})",
        rendered.page_count, rendered.photo_embedded
    );

    Ok(ReportExport {
        filename,
        bytes: rendered.bytes,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Analyst
// ────────────────────────────────────────────────────────────────────────────

pub async fn run_analyst(state: &AppState, request: AnalystRequest) -> Result<VisualCritique, AppError> {
    request.validate()?;
    let location = request.location.trim().to_string();
    info!("Analyst invoked for location {location:?}");

    let search = if location.is_empty() {
        Collaboration::degraded("no location given")
    } else {
        let query = format!("{location} real estate market");
        state.search.search(&query, state.config.search_max_results).await
    };
    let web_intel = render_search_digest(search);

    let dir = state.config.knowledge_base_dir.clone();
    let knowledge_base = tokio::task::spawn_blocking(move || load_knowledge_base(&dir))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed reading knowledge base: {e}")))?;

    let context = PromptContext {
        web_intel,
        knowledge_base,
        ..Default::default()
    };
    let (narrative, image_attached) = generate(state, PersonaRequest::Analyst(request), &context).await?;

    Ok(VisualCritique {
        persona: Persona::Analyst,
        narrative,
        image_attached,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Copywriter
// ────────────────────────────────────────────────────────────────────────────

pub async fn run_copywriter(state: &AppState, request: CopywriterRequest) -> Result<ListingCopy, AppError> {
    request.validate()?;
    info!("Copywriter invoked");

    let (narrative, _) = generate(state, PersonaRequest::Copywriter(request), &PromptContext::default()).await?;

    Ok(ListingCopy {
        persona: Persona::Copywriter,
        narrative,
    })
}

/// Composes and calls the generator. Returns the text and whether a photo was sent.
async fn generate(
    state: &AppState,
    request: PersonaRequest,
    context: &PromptContext,
) -> Result<(String, bool), AppError> {
    let payload = compose(&request, context)?;
    let generated = state.llm.generate(&payload).await?;
    info!(
        "{} replied: {} paragraphs, {} output tokens",
        request.persona().name(),
        generated.paragraphs().len(),
        generated.output_tokens
    );
    Ok((generated.text, payload.has_image()))
}
