//! Router assembly and server startup.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{chat, joke, misc, proxy, search};
use crate::agent::Agent;
use crate::config::{Config, ServiceMode};
use crate::tools::ToolRegistry;
use crate::upstream::UpstreamClient;

/// Shared, read-only state for all handlers.
pub struct AppState {
    pub config: Config,
    pub upstream: Arc<UpstreamClient>,
    pub agent: Agent,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let upstream = Arc::new(UpstreamClient::new(&config)?);
        let tools = Arc::new(ToolRegistry::new(upstream.clone()));
        let agent = Agent::new(config.clone(), upstream.clone(), tools);
        Ok(Self {
            config,
            upstream,
            agent,
        })
    }
}

/// Build the router for the configured service mode.
pub fn router(state: Arc<AppState>) -> Router {
    let router = Router::new().route("/health", get(misc::health));

    let router = match state.config.mode {
        ServiceMode::Agent => router
            .route("/hello", post(misc::hello))
            .route("/search", post(search::search))
            .route("/api/chat", post(chat::simple_chat))
            .route("/api/joke", get(joke::joke))
            .nest("/v1", chat::routes()),
        ServiceMode::Proxy => router.nest("/api/v1", proxy::routes()),
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `HOST:PORT` and serve until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config)?);

    tracing::info!(
        mode = state.config.mode.as_str(),
        base_url = %state.config.api_base_url,
        tools = ?state.agent.tools().list_tools().iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        "Service configured"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
