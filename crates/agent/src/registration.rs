use tracing::{info, warn};

use crate::dialogue::{DialogueEngine, Turn};
use crate::render;

impl DialogueEngine {
    /// `registrar cliente ...`: registers a client outside any quotation.
    /// Session state is left untouched.
    pub(crate) async fn register_client_command(&self, turn: &Turn, text: &str) {
        let fields = self.ports.classifier.extract_client_fields(text).await.unwrap_or_default();
        let Some(new_client) = fields.into_new_client(turn.user.id) else {
            self.send(turn, render::registration_instructions()).await;
            return;
        };

        match self.ports.clients.find_by_ruc(&new_client.ruc).await {
            Ok(Some(existing)) => {
                self.send(turn, render::client_already_registered(&existing.client, existing.agent.as_ref()))
                    .await;
                return;
            }
            Ok(None) => {}
            Err(error) => {
                warn!(
                    event_name = "dialogue.registration.lookup_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "client lookup failed"
                );
                self.send_text(turn, render::REGISTRATION_ERROR).await;
                return;
            }
        }

        match self.ports.clients.register(&new_client).await {
            Ok(client) => {
                info!(
                    event_name = "dialogue.registration.completed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    client_id = client.id.0,
                    "client registered"
                );
                self.send(turn, render::client_registered(&client)).await;
            }
            Err(error) if error.status().is_some_and(|status| (400..500).contains(&status)) => {
                self.send(turn, render::registration_rejected(&error.upstream_message())).await;
            }
            Err(error) => {
                warn!(
                    event_name = "dialogue.registration.failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "client registration failed"
                );
                self.send_text(turn, render::REGISTRATION_ERROR).await;
            }
        }
    }
}
