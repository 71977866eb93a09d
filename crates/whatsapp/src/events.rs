use serde::Deserialize;
use thiserror::Error;

use cotiza_core::session::SessionKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub message_id: String,
    pub from: String,
    pub profile_name: Option<String>,
    pub kind: MessageKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Text(String),
    Audio { media_id: String },
    Interactive { option_id: String },
    Unsupported { message_type: String },
}

impl MessageKind {
    pub fn label(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Audio { .. } => "audio",
            Self::Interactive { .. } => "interactive",
            Self::Unsupported { message_type } => message_type,
        }
    }
}

impl InboundMessage {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::from_address(&self.from)
    }
}

#[derive(Debug, Error)]
pub enum WebhookDecodeError {
    #[error("webhook payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes a Cloud API webhook body into inbound messages, in delivery order.
/// Status callbacks and other non-message changes decode to nothing.
pub fn decode_webhook(body: &[u8]) -> Result<Vec<InboundMessage>, WebhookDecodeError> {
    let payload: WebhookPayload = serde_json::from_slice(body)?;
    let mut messages = Vec::new();

    for change in payload.entry.into_iter().flat_map(|entry| entry.changes) {
        let value = change.value;
        for raw in value.messages {
            let profile_name = value
                .contacts
                .iter()
                .find(|contact| contact.wa_id == raw.from)
                .or_else(|| value.contacts.first())
                .and_then(|contact| contact.profile.as_ref())
                .map(|profile| profile.name.clone());
            messages.push(raw.into_inbound(profile_name));
        }
    }

    Ok(messages)
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookEntry {
    #[serde(default)]
    changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookChange {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    contacts: Vec<Contact>,
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct Contact {
    #[serde(default)]
    wa_id: String,
    profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    from: String,
    #[serde(rename = "type")]
    message_type: String,
    text: Option<TextBody>,
    audio: Option<MediaRef>,
    voice: Option<MediaRef>,
    interactive: Option<RawInteractive>,
    button: Option<QuickReply>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    body: String,
}

#[derive(Debug, Deserialize)]
struct MediaRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawInteractive {
    button_reply: Option<ReplyRef>,
    list_reply: Option<ReplyRef>,
}

#[derive(Debug, Deserialize)]
struct ReplyRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct QuickReply {
    payload: String,
}

impl RawMessage {
    fn into_inbound(self, profile_name: Option<String>) -> InboundMessage {
        let kind = match self.message_type.as_str() {
            "text" => self.text.map(|text| MessageKind::Text(text.body)),
            "audio" | "voice" => self
                .audio
                .or(self.voice)
                .map(|media| MessageKind::Audio { media_id: media.id }),
            "interactive" => self
                .interactive
                .and_then(|interactive| interactive.button_reply.or(interactive.list_reply))
                .map(|reply| MessageKind::Interactive { option_id: reply.id }),
            "button" => self
                .button
                .map(|button| MessageKind::Interactive { option_id: button.payload }),
            _ => None,
        }
        .unwrap_or(MessageKind::Unsupported { message_type: self.message_type });

        InboundMessage { message_id: self.id, from: self.from, profile_name, kind }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode_webhook, MessageKind};

    fn envelope(messages: serde_json::Value) -> Vec<u8> {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "WABA",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "contacts": [{"profile": {"name": "Ana"}, "wa_id": "51999888777"}],
                        "messages": messages
                    }
                }]
            }]
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn decodes_text_message_with_profile_name() {
        let body = envelope(json!([{
            "from": "51999888777", "id": "wamid.1", "timestamp": "1700000000",
            "type": "text", "text": {"body": "compresor 20hp"}
        }]));

        let messages = decode_webhook(&body).expect("valid payload");

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_id, "wamid.1");
        assert_eq!(messages[0].profile_name.as_deref(), Some("Ana"));
        assert_eq!(messages[0].kind, MessageKind::Text("compresor 20hp".to_owned()));
        assert_eq!(messages[0].session_key().as_str(), "51999888777");
    }

    #[test]
    fn decodes_button_and_list_replies_as_interactive() {
        let body = envelope(json!([
            {"from": "51999888777", "id": "wamid.2", "type": "interactive",
             "interactive": {"type": "button_reply", "button_reply": {"id": "cotizar_42", "title": "Cotizar"}}},
            {"from": "51999888777", "id": "wamid.3", "type": "interactive",
             "interactive": {"type": "list_reply", "list_reply": {"id": "option_4", "title": "Cotizar"}}}
        ]));

        let messages = decode_webhook(&body).expect("valid payload");

        assert_eq!(messages[0].kind, MessageKind::Interactive { option_id: "cotizar_42".to_owned() });
        assert_eq!(messages[1].kind, MessageKind::Interactive { option_id: "option_4".to_owned() });
    }

    #[test]
    fn decodes_audio_and_voice_notes() {
        let body = envelope(json!([
            {"from": "51999888777", "id": "wamid.4", "type": "audio", "audio": {"id": "media-1", "mime_type": "audio/ogg"}},
            {"from": "51999888777", "id": "wamid.5", "type": "voice", "voice": {"id": "media-2"}}
        ]));

        let messages = decode_webhook(&body).expect("valid payload");

        assert_eq!(messages[0].kind, MessageKind::Audio { media_id: "media-1".to_owned() });
        assert_eq!(messages[1].kind, MessageKind::Audio { media_id: "media-2".to_owned() });
    }

    #[test]
    fn unknown_types_and_status_callbacks_are_tolerated() {
        let body = envelope(json!([
            {"from": "51999888777", "id": "wamid.6", "type": "sticker", "sticker": {"id": "s"}}
        ]));
        let messages = decode_webhook(&body).expect("valid payload");
        assert_eq!(messages[0].kind, MessageKind::Unsupported { message_type: "sticker".to_owned() });

        let statuses = json!({"entry": [{"changes": [{"value": {"statuses": [{"id": "wamid.7"}]}}]}]});
        assert!(decode_webhook(statuses.to_string().as_bytes()).expect("valid").is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(decode_webhook(b"not json").is_err());
    }
}
