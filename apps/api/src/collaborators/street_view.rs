//! Street-level photo of the subject property for the report cover.
//!
//! The image bytes are written to a temporary file that lives as long as the
//! returned `StreetImage` (one request). Non-200 replies, transport errors, and a
//! missing `MAPS_API_KEY` all degrade to "no photo".

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use super::{Collaboration, StreetImagery};

pub const DEFAULT_STREET_VIEW_API_URL: &str = "https://maps.googleapis.com/maps/api/streetview";

/// Cover photo size requested from the imagery service.
pub const COVER_IMAGE_SIZE: &str = "600x400";

/// A fetched photo backed by a request-scoped temp file.
#[derive(Debug)]
pub struct StreetImage {
    file: NamedTempFile,
    pub media_type: String,
}

impl StreetImage {
    /// Persists `bytes` to a fresh temporary file.
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("street_view_")
            .suffix(extension_for(media_type))
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            file,
            media_type: media_type.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => ".png",
        "image/webp" => ".webp",
        _ => ".jpg",
    }
}

#[derive(Clone)]
pub struct HttpStreetView {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpStreetView {
    pub fn new(client: Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl StreetImagery for HttpStreetView {
    async fn fetch(&self, address: &str, size: &str) -> Collaboration<StreetImage> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Collaboration::degraded("MAPS_API_KEY not configured");
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("size", size), ("location", address), ("key", api_key)])
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!("Street view returned {} for {address:?}", r.status());
                return Collaboration::degraded(format!("status {}", r.status()));
            }
            Err(e) => {
                warn!("Street view request failed for {address:?}: {e}");
                return Collaboration::degraded(e.to_string());
            }
        };

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return Collaboration::degraded(e.to_string()),
        };

        match StreetImage::from_bytes(&bytes, &media_type) {
            Ok(image) => {
                info!("Street view photo fetched ({} bytes, {})", bytes.len(), image.media_type);
                Collaboration::Delivered(image)
            }
            Err(e) => {
                warn!("Could not persist street view photo: {e}");
                Collaboration::degraded(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_writes_temp_file() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/streetview")
                .query_param("size", "600x400")
                .query_param("location", "1 Main St, Springfield")
                .query_param("key", "maps-key");
            then.status(200)
                .header("content-type", "image/png")
                .body(b"fake-png-bytes".to_vec());
        });

        let imagery = HttpStreetView::new(
            Client::new(),
            server.url("/streetview"),
            Some("maps-key".to_string()),
        );
        let image = imagery
            .fetch("1 Main St, Springfield", COVER_IMAGE_SIZE)
            .await
            .delivered()
            .unwrap();

        mock.assert();
        assert_eq!(image.media_type, "image/png");
        assert_eq!(image.path().extension().unwrap(), "png");
        assert_eq!(std::fs::read(image.path()).unwrap(), b"fake-png-bytes");
    }

    #[tokio::test]
    async fn test_non_200_degrades() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/streetview");
            then.status(403);
        });

        let imagery = HttpStreetView::new(Client::new(), server.url("/streetview"), Some("k".into()));
        assert!(imagery.fetch("x", COVER_IMAGE_SIZE).await.delivered().is_none());
    }

    #[tokio::test]
    async fn test_missing_key_degrades() {
        let imagery = HttpStreetView::new(Client::new(), "http://127.0.0.1:9".into(), None);
        assert!(imagery.fetch("x", COVER_IMAGE_SIZE).await.delivered().is_none());
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let image = StreetImage::from_bytes(b"abc", "image/jpeg").unwrap();
        let path = image.path().to_path_buf();
        assert!(path.exists());
        drop(image);
        assert!(!path.exists());
    }
}
