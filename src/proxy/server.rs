//! Gateway server: state, router, startup

use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handler::ask;
use crate::config::{AppConfig, CorsConfig};
use crate::trace::{BestEffortTracer, LangsmithRecorder};
use crate::upstream::{GeminiClient, UpstreamClient};

/// Shared state for the gateway.
///
/// Constructed once at startup and cloned per request; the upstream
/// client and tracer are injected rather than reached through globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub upstream: Arc<dyn UpstreamClient>,
    pub tracer: BestEffortTracer,
}

/// Build the shared HTTP client used for upstream and trace calls
fn build_http_client(config: &AppConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream.timeout_seconds))
        .pool_max_idle_per_host(10)
        .build()
}

/// Build the CORS layer from configured origins.
///
/// Any configured origin opens all methods and headers; `*` allows every
/// origin.
fn build_cors(cors: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if cors.allows_any() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Skipping unparseable CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.cors);

    Router::new()
        .route("/ask", post(ask))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the gateway server
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let http_client = build_http_client(&config)?;

    let upstream: Arc<dyn UpstreamClient> = Arc::new(GeminiClient::new(
        http_client.clone(),
        config.upstream.base_url(),
        config.upstream.api_key.clone(),
    ));

    let tracer = if config.trace.enabled {
        BestEffortTracer::new(Arc::new(LangsmithRecorder::new(
            http_client,
            config.trace.endpoint.clone(),
            config.trace.api_key.clone(),
            config.trace.project.clone(),
        )))
    } else {
        BestEffortTracer::disabled()
    };

    let state = AppState {
        config: Arc::new(config.clone()),
        upstream,
        tracer,
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("gemini-gateway listening on {}", addr);
    tracing::info!(
        "Forwarding questions to {} (model {})",
        config.upstream.base_url(),
        config.upstream.model
    );

    Ok(axum::serve(listener, app).await?)
}

/// Health check endpoint
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}
