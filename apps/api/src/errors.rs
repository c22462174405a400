use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::personas::composer::{ComposeError, MissingInput};
use crate::report::ReportError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required user input is absent or malformed. Nothing downstream was called.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The uploaded dataset lacks structure the metrics step needs.
    #[error("Data shape error: {0}")]
    DataShape(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<MissingInput> for AppError {
    fn from(e: MissingInput) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<ComposeError> for AppError {
    fn from(e: ComposeError) -> Self {
        AppError::Internal(anyhow::anyhow!(e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::DataShape(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DATA_SHAPE_ERROR",
                msg.clone(),
            ),
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "The text generation service failed".to_string(),
                )
            }
            AppError::Report(e) => {
                tracing::error!("Report error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPORT_ERROR",
                    "The report could not be rendered".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation("address is required".into()), StatusCode::BAD_REQUEST),
            (AppError::DataShape("no status column".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Llm(LlmError::EmptyContent), StatusCode::BAD_GATEWAY),
            (AppError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_body_shape() {
        let response = AppError::from(MissingInput::Field("specs")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "specs is required");
    }
}
