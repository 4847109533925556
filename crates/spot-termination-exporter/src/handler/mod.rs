//! HTTP handler for the metrics endpoint
//!
//! `GET <metrics-path>` runs one scrape; `GET /` serves a landing page.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::collector::ExporterRegistry;

/// Application state
pub struct AppState {
    pub registry: ExporterRegistry,
    pub metrics_path: String,
}

impl AppState {
    pub fn new(registry: ExporterRegistry, metrics_path: impl Into<String>) -> Self {
        Self {
            registry,
            metrics_path: metrics_path.into(),
        }
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(&state.metrics_path, get(metrics))
        .route("/", get(root))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let registry = state.registry.clone();

    // Collector::collect blocks on the probe sequence
    match tokio::task::spawn_blocking(move || registry.encode_text()).await {
        Ok(Ok(body)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Scrape task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Scrape failed").into_response()
        }
    }
}

/// Landing page
async fn root(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(landing_page(&state.metrics_path))
}

fn landing_page(metrics_path: &str) -> String {
    format!(
        r#"<html>
<head><title>Spot Termination Exporter</title></head>
<body>
<h1>Spot Termination Exporter</h1>
<p><a href="{}">Metrics</a></p>
</body>
</html>"#,
        metrics_path
    )
}
