//! Web search: market-intel snippets for the strategist and analyst prompts.
//!
//! Talks to a JSON web-search API (Brave schema: `web.results[].{title, description, url}`).
//! Any failure, including a missing API key, degrades to a placeholder digest.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Collaboration, WebSearch};

pub const DEFAULT_SEARCH_API_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// Digest used whenever search yields nothing usable.
pub const NO_SEARCH_DATA: &str = "No market data found (search unavailable).";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub body: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    web: Option<WebSection>,
}

#[derive(Debug, Deserialize)]
struct WebSection {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Debug, Deserialize)]
struct WebResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
}

#[derive(Clone)]
pub struct HttpWebSearch {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpWebSearch {
    pub fn new(client: Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    async fn fetch_hits(&self, api_key: &str, query: &str, max_results: usize) -> Result<Vec<SearchHit>, reqwest::Error> {
        let count = max_results.to_string();
        let response: SearchResponse = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                body: r.description,
                link: r.url,
            })
            .collect())
    }
}

#[async_trait]
impl WebSearch for HttpWebSearch {
    async fn search(&self, query: &str, max_results: usize) -> Collaboration<Vec<SearchHit>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Collaboration::degraded("SEARCH_API_KEY not configured");
        };

        match self.fetch_hits(api_key, query, max_results).await {
            Ok(hits) => Collaboration::Delivered(hits),
            Err(e) => {
                warn!("Web search failed for {query:?}: {e}");
                Collaboration::degraded(e.to_string())
            }
        }
    }
}

/// Renders hits as `- {title}: {body}` lines, or the fixed placeholder.
pub fn render_search_digest(outcome: Collaboration<Vec<SearchHit>>) -> String {
    match outcome.delivered() {
        Some(hits) if !hits.is_empty() => hits
            .iter()
            .map(|h| format!("- {}: {}", h.title.trim(), h.body.trim()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => NO_SEARCH_DATA.to_string(),
    }
}
