use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::session::ViewerSession;

/// Build the axum router with all viewer endpoints.
pub fn build_router(session: Arc<ViewerSession>) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/command", post(handler::command_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::config::HostConfig;

    fn app() -> Router {
        build_router(ViewerSession::new(HostConfig::default()))
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/command")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let response = app()
            .oneshot(Request::builder().uri("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn info_endpoint() {
        let response = app()
            .oneshot(Request::builder().uri("/v1/info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["namespace"], "threejs");
        assert_eq!(body["models"], 0);
    }

    #[tokio::test]
    async fn command_endpoint_answers() {
        let response = app()
            .oneshot(post_json(json!({"type": "threejs_get_camera_state", "id": "c1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], "c1");
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["position"]["x"], 10.0);
    }

    #[tokio::test]
    async fn foreign_envelope_is_no_content() {
        let response = app()
            .oneshot(post_json(json!({"type": "elsewhere_ping", "id": 1})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn unknown_model_visibility_is_failed_response() {
        let response = app()
            .oneshot(post_json(json!({
                "type": "threejs_set_model_visibility",
                "id": 5,
                "payload": {"modelId": "missing", "visible": true}
            })))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "model not found: missing");
    }
}
