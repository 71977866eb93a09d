use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use cotiza_core::session::SessionStore;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    sessions: Arc<SessionStore>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
    pub checked_at: String,
}

pub fn router(sessions: Arc<SessionStore>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { sessions })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        active_sessions: state.sessions.len().await,
        checked_at: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{Request, StatusCode},
        Json,
    };
    use cotiza_core::session::{SessionKey, SessionStore};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::health::{health, router, HealthState};

    #[tokio::test]
    async fn health_reports_active_sessions() {
        let sessions = Arc::new(SessionStore::new());
        sessions.slot(&SessionKey::from_address("51999888777")).await;

        let (status, Json(payload)) = health(State(HealthState { sessions })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.active_sessions, 1);
    }

    #[tokio::test]
    async fn health_route_serves_json() {
        let response = router(Arc::new(SessionStore::new()))
            .oneshot(Request::get("/health").body(Body::empty()).expect("request builds"))
            .await
            .expect("router answers");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(payload["status"], "ready");
        assert_eq!(payload["active_sessions"], 0);
        assert!(payload["checked_at"].is_string());
    }
}
