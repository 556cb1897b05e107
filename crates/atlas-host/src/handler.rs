use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};

use crate::session::ViewerSession;

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn info_handler(State(session): State<Arc<ViewerSession>>) -> Json<Value> {
    let models = session.registry().len().unwrap_or_default();
    let queued = session.queue().len().unwrap_or_default();
    Json(json!({
        "name": "atlas-host",
        "version": env!("CARGO_PKG_VERSION"),
        "namespace": session.config().namespace,
        "models": models,
        "queued": queued,
    }))
}

/// Body is one envelope. Ignored envelopes get `204 No Content`.
pub async fn command_handler(
    State(session): State<Arc<ViewerSession>>,
    Json(body): Json<Value>,
) -> Response {
    match session.dispatcher().dispatch_value(body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
