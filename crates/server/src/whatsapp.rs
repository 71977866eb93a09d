//! WhatsApp Cloud API messenger.

use async_trait::async_trait;
use cotiza_core::config::WhatsAppConfig;
use cotiza_whatsapp::{DeliveryError, Messenger, OutboundMessage};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

pub struct CloudMessenger {
    client: Client,
    graph_root: String,
    phone_number_id: String,
    api_token: SecretString,
}

#[derive(Deserialize)]
struct MediaLocation {
    url: Option<String>,
}

impl CloudMessenger {
    pub fn new(client: Client, config: &WhatsAppConfig) -> Self {
        Self {
            client,
            graph_root: format!(
                "{}/{}",
                config.graph_base_url.trim_end_matches('/'),
                config.api_version.trim_matches('/')
            ),
            phone_number_id: config.phone_number_id.trim().to_string(),
            api_token: config.api_token.clone(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.graph_root, self.phone_number_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.api_token.expose_secret()))
    }

    async fn post_message(&self, payload: &Value) -> Result<(), DeliveryError> {
        let response = self
            .authorized(self.client.post(self.messages_url()))
            .json(payload)
            .send()
            .await
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;
        ensure_accepted(response).await.map(|_| ())
    }
}

async fn ensure_accepted(response: Response) -> Result<Response, DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DeliveryError::Rejected { status: status.as_u16(), body })
}

#[async_trait]
impl Messenger for CloudMessenger {
    async fn send(&self, to: &str, message: &OutboundMessage) -> Result<(), DeliveryError> {
        self.post_message(&message.to_cloud_payload(to)).await
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), DeliveryError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id
        });
        self.post_message(&payload).await
    }

    async fn fetch_media(&self, media_id: &str) -> Result<Vec<u8>, DeliveryError> {
        let unavailable = |reason: String| {
            warn!(
                event_name = "integration.whatsapp.media_unavailable",
                media_id,
                error = %reason,
                "media download failed"
            );
            DeliveryError::MediaUnavailable(media_id.to_string())
        };

        let lookup = self
            .authorized(self.client.get(format!("{}/{}", self.graph_root, media_id)))
            .send()
            .await
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;
        let location: MediaLocation = ensure_accepted(lookup)
            .await
            .map_err(|error| unavailable(error.to_string()))?
            .json()
            .await
            .map_err(|error| unavailable(error.to_string()))?;
        let url = location.url.ok_or_else(|| unavailable("lookup returned no url".to_string()))?;

        let download = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;
        let bytes = ensure_accepted(download)
            .await
            .map_err(|error| unavailable(error.to_string()))?
            .bytes()
            .await
            .map_err(|error| unavailable(error.to_string()))?;
        Ok(bytes.to_vec())
    }
}
