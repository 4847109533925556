//! Minimal fake metadata service for running the exporter locally
//!
//! Point the exporter at it with
//! `--metadata-endpoint http://localhost:9092/latest/meta-data/`.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

/// Prefix under which the stub serves metadata
pub const STUB_PREFIX: &str = "/latest/meta-data";

/// Canned answers served by the stub
#[derive(Debug, Clone)]
pub struct StubMetadata {
    pub instance_id: String,
    pub instance_type: String,
    pub action: String,
    /// How far in the future the interruption is scheduled
    pub lead_time: Duration,
}

impl Default for StubMetadata {
    fn default() -> Self {
        Self {
            instance_id: "i-0d2aab13057917887".to_string(),
            instance_type: "c5.9xlarge".to_string(),
            action: "stop".to_string(),
            lead_time: Duration::minutes(2),
        }
    }
}

/// Create the stub router
pub fn create_router(metadata: StubMetadata) -> Router {
    Router::new()
        .route(&format!("{}/instance-id", STUB_PREFIX), get(instance_id))
        .route(&format!("{}/instance-type", STUB_PREFIX), get(instance_type))
        .route(
            &format!("{}/spot/instance-action", STUB_PREFIX),
            get(instance_action),
        )
        .route(
            &format!("{}/events/recommendations/rebalance", STUB_PREFIX),
            get(rebalance),
        )
        .with_state(Arc::new(metadata))
}

async fn instance_id(State(metadata): State<Arc<StubMetadata>>) -> String {
    metadata.instance_id.clone()
}

async fn instance_type(State(metadata): State<Arc<StubMetadata>>) -> String {
    metadata.instance_type.clone()
}

async fn instance_action(State(metadata): State<Arc<StubMetadata>>) -> Json<Value> {
    let time = Utc::now() + metadata.lead_time;
    Json(json!({
        "action": metadata.action,
        "time": time.to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

async fn rebalance() -> Json<Value> {
    Json(json!({
        "noticeTime": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}
