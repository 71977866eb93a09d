use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use cotiza_agent::DialogueEngine;
use cotiza_whatsapp::decode_webhook;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct WebhookState {
    engine: Arc<DialogueEngine>,
    verify_token: SecretString,
}

impl WebhookState {
    pub fn new(engine: Arc<DialogueEngine>, verify_token: SecretString) -> Self {
        Self { engine, verify_token }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/webhook", get(verify).post(ingest)).with_state(state)
}

/// Subscription handshake: echoes the challenge when the token matches.
pub async fn verify(
    State(state): State<WebhookState>,
    Query(params): Query<VerifyParams>,
) -> (StatusCode, String) {
    let subscribing = params.mode.as_deref() == Some("subscribe");
    let token_matches =
        params.verify_token.as_deref() == Some(state.verify_token.expose_secret());

    if subscribing && token_matches {
        info!(
            event_name = "ingress.webhook.verified",
            correlation_id = "webhook",
            "webhook subscription verified"
        );
        return (StatusCode::OK, params.challenge.unwrap_or_default());
    }

    warn!(
        event_name = "ingress.webhook.verification_rejected",
        correlation_id = "webhook",
        mode = params.mode.as_deref().unwrap_or(""),
        "webhook verification rejected"
    );
    (StatusCode::FORBIDDEN, String::new())
}

/// Hands every message in the payload to the dialogue engine, in order.
pub async fn ingest(State(state): State<WebhookState>, body: Bytes) -> StatusCode {
    let messages = match decode_webhook(&body) {
        Ok(messages) => messages,
        Err(error) => {
            warn!(
                event_name = "ingress.webhook.decode_failed",
                correlation_id = "webhook",
                error = %error,
                "discarding undecodable webhook payload"
            );
            return StatusCode::BAD_REQUEST;
        }
    };

    if messages.is_empty() {
        debug!(
            event_name = "ingress.webhook.no_messages",
            correlation_id = "webhook",
            "webhook carried no messages"
        );
    }

    for message in &messages {
        state.engine.handle(message).await;
    }

    StatusCode::OK
}
