mod collaborators;
mod config;
mod errors;
mod layout;
mod listings;
mod llm_client;
mod personas;
mod report;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::collaborators::search::HttpWebSearch;
use crate::collaborators::street_view::HttpStreetView;
use crate::config::Config;
use crate::layout::default_page_config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

/// Timeout for the search and imagery services; the LLM client sets its own.
const COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(20);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; a missing API key aborts startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Listings API v{}", env!("CARGO_PKG_VERSION"));

    let http = reqwest::Client::builder()
        .timeout(COLLABORATOR_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let llm = LlmClient::new(config.anthropic_api_key.clone()).context("failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let search = HttpWebSearch::new(
        http.clone(),
        config.search_api_url.clone(),
        config.search_api_key.clone(),
    );
    let imagery = HttpStreetView::new(
        http,
        config.street_view_api_url.clone(),
        config.maps_api_key.clone(),
    );
    info!(
        "Collaborators: search={} street_view={} knowledge_base={}",
        if config.search_api_key.is_some() { "enabled" } else { "disabled" },
        if config.maps_api_key.is_some() { "enabled" } else { "disabled" },
        config.knowledge_base_dir.display()
    );

    let state = AppState {
        config: config.clone(),
        llm: Arc::new(llm),
        search: Arc::new(search),
        imagery: Arc::new(imagery),
        page_config: default_page_config(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
