//! Axum route handlers for the persona API.

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;

use crate::errors::AppError;
use crate::listings::MetricsOutcome;
use crate::personas::composer::{AnalystRequest, CopywriterRequest, StrategistRequest, UploadedImage};
use crate::personas::workflow::{
    render_strategy_report, run_analyst, run_copywriter, run_strategist_metrics, run_strategist_plan,
    ListingCopy, ReportRequest, StrategyPlan, VisualCritique,
};
use crate::personas::{PersonaProfile, PERSONAS};
use crate::state::AppState;

/// Media types the vision model accepts.
const SUPPORTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Deserialize)]
pub struct CopywriterBody {
    #[serde(default)]
    pub specs: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/personas
pub async fn handle_list_personas() -> Json<Vec<PersonaProfile>> {
    Json(PERSONAS.iter().map(|p| p.profile()).collect())
}

/// POST /api/v1/strategist/metrics
///
/// Multipart: `csv` file, `address`, optional `lookback_months`.
/// A dataset the engine cannot read comes back as 422 with `{ "error": ... }`.
pub async fn handle_strategist_metrics(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MetricsOutcome>), AppError> {
    let request = read_strategist_form(&state, multipart).await?;
    let outcome = run_strategist_metrics(request).await?;
    let status = match outcome {
        MetricsOutcome::Computed(_) => StatusCode::OK,
        MetricsOutcome::Failed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    Ok((status, Json(outcome)))
}

/// POST /api/v1/strategist/plan
///
/// Search → metrics → prompt → narrative for one listing.
pub async fn handle_strategist_plan(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<StrategyPlan>, AppError> {
    let request = read_strategist_form(&state, multipart).await?;
    Ok(Json(run_strategist_plan(&state, request).await?))
}

/// POST /api/v1/strategist/report
///
/// Returns the strategy PDF as an attachment.
pub async fn handle_strategist_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Response, AppError> {
    let export = render_strategy_report(&state, request).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.bytes,
    )
        .into_response())
}

/// POST /api/v1/analyst/critique
///
/// Multipart: `image` file, optional `location` and `question`.
pub async fn handle_analyst_critique(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VisualCritique>, AppError> {
    let mut request = AnalystRequest {
        image: None,
        location: String::new(),
        question: String::new(),
    };

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let declared = field.content_type().map(str::to_lowercase);
                let data = field_bytes(field).await?;
                if data.is_empty() {
                    continue;
                }
                let media_type = match declared {
                    Some(t) if SUPPORTED_IMAGE_TYPES.contains(&t.as_str()) => t,
                    _ => sniff_image_type(&data)
                        .ok_or_else(|| {
                            AppError::Validation("image must be JPEG, PNG, GIF or WebP".to_string())
                        })?
                        .to_string(),
                };
                request.image = Some(UploadedImage { media_type, data });
            }
            "location" => request.location = field_text(field).await?,
            "question" => request.question = field_text(field).await?,
            _ => {}
        }
    }

    Ok(Json(run_analyst(&state, request).await?))
}

/// POST /api/v1/copywriter/listing
pub async fn handle_copywriter_listing(
    State(state): State<AppState>,
    Json(body): Json<CopywriterBody>,
) -> Result<Json<ListingCopy>, AppError> {
    let request = CopywriterRequest { specs: body.specs };
    Ok(Json(run_copywriter(&state, request).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_strategist_form(state: &AppState, mut multipart: Multipart) -> Result<StrategistRequest, AppError> {
    let mut request = StrategistRequest {
        address: String::new(),
        csv: Bytes::new(),
        lookback_months: state.config.default_lookback_months,
    };

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "csv" => request.csv = field_bytes(field).await?,
            "address" => request.address = field_text(field).await?,
            "lookback_months" => {
                let raw = field_text(field).await?;
                if !raw.trim().is_empty() {
                    request.lookback_months = parse_lookback(&raw)?;
                }
            }
            _ => {}
        }
    }
    Ok(request)
}

/// Identifies an upload by its magic bytes when the client sent no usable content type.
fn sniff_image_type(data: &[u8]) -> Option<&'static str> {
    match data {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

fn parse_lookback(raw: &str) -> Result<u32, AppError> {
    match raw.trim().parse::<u32>() {
        Ok(months) if months > 0 => Ok(months),
        _ => Err(AppError::Validation(
            "lookback_months must be a whole number greater than 0".to_string(),
        )),
    }
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))
}

async fn field_bytes(field: Field<'_>) -> Result<Bytes, AppError> {
    field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))
}

async fn field_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("could not read form field: {e}")))
}
