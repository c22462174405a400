pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::personas::handlers;
use crate::state::AppState;

/// Uploads (listing exports, property photos) may exceed axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/personas", get(handlers::handle_list_personas))
        // Strategist (Rick)
        .route(
            "/api/v1/strategist/metrics",
            post(handlers::handle_strategist_metrics),
        )
        .route("/api/v1/strategist/plan", post(handlers::handle_strategist_plan))
        .route(
            "/api/v1/strategist/report",
            post(handlers::handle_strategist_report),
        )
        // Analyst (Sherlock)
        .route(
            "/api/v1/analyst/critique",
            post(handlers::handle_analyst_critique),
        )
        // Copywriter (Ava)
        .route(
            "/api/v1/copywriter/listing",
            post(handlers::handle_copywriter_listing),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::personas::workflow::tests::{fakes, LISTINGS_CSV};

    const BOUNDARY: &str = "listings-test-boundary";

    /// Builds a multipart body from `(name, filename, content_type, data)` parts.
    fn multipart(parts: &[(&str, Option<&str>, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, content_type, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{name}\"");
            if let Some(f) = filename {
                disposition.push_str(&format!("; filename=\"{f}\""));
            }
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            if let Some(ct) = content_type {
                body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(fakes(None, Ok("x".into())).state);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "listings-api");
    }

    #[tokio::test]
    async fn test_personas_listing() {
        let app = build_router(fakes(None, Ok("x".into())).state);
        let response = app
            .oneshot(Request::get("/api/v1/personas").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Rick", "Sherlock", "Ava"]);
        assert_eq!(body[0]["persona"], "strategist");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = build_router(fakes(None, Ok("x".into())).state);
        let body = multipart(&[
            ("csv", Some("listings.csv"), Some("text/csv"), LISTINGS_CSV.as_bytes()),
            ("address", None, None, &b"123 Oak Ave"[..]),
            ("lookback_months", None, None, &b"2"[..]),
        ]);
        let response = app
            .oneshot(multipart_request("/api/v1/strategist/metrics", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["sold_count"], 2);
        assert_eq!(body["subject_price_found"], "$725,000");
        assert_eq!(body["lookback_months"], 2);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_reports_missing_status_column() {
        let app = build_router(fakes(None, Ok("x".into())).state);
        let body = multipart(&[
            ("csv", Some("listings.csv"), Some("text/csv"), &b"Price,Beds\n100,3\n"[..]),
            ("address", None, None, &b"123 Oak Ave"[..]),
        ]);
        let response = app
            .oneshot(multipart_request("/api/v1/strategist/metrics", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(response).await["error"].as_str().unwrap().contains("status"));
    }

    #[tokio::test]
    async fn test_plan_without_csv_is_validation_error() {
        let app = build_router(fakes(None, Ok("x".into())).state);
        let body = multipart(&[("address", None, None, &b"123 Oak Ave"[..])]);
        let response = app
            .oneshot(multipart_request("/api/v1/strategist/plan", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "csv is required");
    }

    #[tokio::test]
    async fn test_plan_returns_narrative() {
        let app = build_router(fakes(None, Ok("Price at $725k and hold.".into())).state);
        let body = multipart(&[
            ("csv", Some("listings.csv"), Some("text/csv"), LISTINGS_CSV.as_bytes()),
            ("address", None, None, &b"123 Oak Ave"[..]),
        ]);
        let response = app
            .oneshot(multipart_request("/api/v1/strategist/plan", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["persona"], "strategist");
        assert_eq!(body["narrative"], "Price at $725k and hold.");
        assert_eq!(body["metrics"]["lookback_months"], 6);
    }

    #[tokio::test]
    async fn test_report_is_pdf_attachment() {
        let app = build_router(fakes(None, Ok("x".into())).state);
        let request = json_request(
            "/api/v1/strategist/report",
            serde_json::json!({
                "address": "123 Oak Ave",
                "metrics": {
                    "months_of_inventory": 3.0,
                    "absorption_rate": 1.67,
                    "success_ratio": 83.3,
                    "subject_price_found": "$725,000",
                    "avg_sold_price": "$445,000.00",
                    "sold_count": 10,
                    "active_count": 5,
                    "failed_count": 2,
                    "lookback_months": 6
                },
                "narrative": "Hold firm on price.",
                "include_photo": false
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Strategy_123_Oak_Ave.pdf\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_analyst_critique_with_photo() {
        let app = build_router(fakes(None, Ok("Good curb appeal.".into())).state);
        let body = multipart(&[
            ("image", Some("front.jpg"), Some("application/octet-stream"), &[0xFFu8, 0xD8, 0xFF, 0xE0, 0x00][..]),
            ("location", None, None, &b"Springfield"[..]),
            ("question", None, None, &b"How is the curb appeal?"[..]),
        ]);
        let response = app
            .oneshot(multipart_request("/api/v1/analyst/critique", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["persona"], "analyst");
        assert_eq!(body["image_attached"], true);
        assert_eq!(body["narrative"], "Good curb appeal.");
    }

    #[tokio::test]
    async fn test_analyst_rejects_non_image_upload() {
        let app = build_router(fakes(None, Ok("x".into())).state);
        let body = multipart(&[("image", Some("notes.txt"), Some("text/plain"), &b"hello"[..])]);
        let response = app
            .oneshot(multipart_request("/api/v1/analyst/critique", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_copywriter_llm_failure_is_bad_gateway() {
        let app = build_router(fakes(None, Err(())).state);
        let response = app
            .oneshot(json_request(
                "/api/v1/copywriter/listing",
                serde_json::json!({"specs": "3 bed craftsman"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"]["code"], "LLM_ERROR");
    }
}
