use serde::Serialize;
use serde_json::{json, Value};

use crate::actions::Action;

/// Cloud API limit for reply buttons on one interactive message.
pub const MAX_BUTTONS: usize = 3;
/// Cloud API limit for a reply-button title.
pub const MAX_TITLE_CHARS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Document,
    Image,
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyButton {
    pub id: String,
    pub title: String,
}

impl ReplyButton {
    pub fn new(action: Action, title: impl Into<String>) -> Self {
        Self { id: action.id(), title: title.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text { body: String },
    Buttons { body: String, buttons: Vec<ReplyButton> },
    Media { kind: MediaKind, url: String, caption: Option<String> },
}

impl OutboundMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text { body: body.into() }
    }

    pub fn document(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self::Media { kind: MediaKind::Document, url: url.into(), caption: Some(caption.into()) }
    }

    /// Body or caption shown to the user.
    pub fn body(&self) -> &str {
        match self {
            Self::Text { body } | Self::Buttons { body, .. } => body,
            Self::Media { caption, .. } => caption.as_deref().unwrap_or_default(),
        }
    }

    pub fn button_ids(&self) -> Vec<&str> {
        match self {
            Self::Buttons { buttons, .. } => buttons.iter().map(|button| button.id.as_str()).collect(),
            Self::Text { .. } | Self::Media { .. } => Vec::new(),
        }
    }

    /// Request body for `POST /{phone_number_id}/messages`.
    pub fn to_cloud_payload(&self, to: &str) -> Value {
        match self {
            Self::Text { body } => json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": to,
                "type": "text",
                "text": { "preview_url": false, "body": body }
            }),
            Self::Buttons { body, buttons } => {
                let buttons: Vec<Value> = buttons
                    .iter()
                    .take(MAX_BUTTONS)
                    .map(|button| {
                        json!({
                            "type": "reply",
                            "reply": {
                                "id": button.id,
                                "title": truncate_title(&button.title)
                            }
                        })
                    })
                    .collect();
                json!({
                    "messaging_product": "whatsapp",
                    "recipient_type": "individual",
                    "to": to,
                    "type": "interactive",
                    "interactive": {
                        "type": "button",
                        "body": { "text": body },
                        "action": { "buttons": buttons }
                    }
                })
            }
            Self::Media { kind, url, caption } => {
                let mut media = json!({ "link": url });
                if let Some(caption) = caption {
                    media["caption"] = json!(caption);
                }
                if *kind == MediaKind::Document {
                    media["filename"] = json!(document_filename(url));
                }
                let mut payload = json!({
                    "messaging_product": "whatsapp",
                    "recipient_type": "individual",
                    "to": to,
                    "type": kind.as_str()
                });
                payload[kind.as_str()] = media;
                payload
            }
        }
    }
}

fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

fn document_filename(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or_default();
    if last.is_empty() {
        "cotizacion.pdf".to_owned()
    } else if last.ends_with(".pdf") {
        last.to_owned()
    } else {
        format!("cotizacion-{last}.pdf")
    }
}

/// Builds a text message, upgraded to reply buttons when any are added.
pub struct MessageBuilder {
    body: String,
    buttons: Vec<ReplyButton>,
}

impl MessageBuilder {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into(), buttons: Vec::new() }
    }

    pub fn button(mut self, action: Action, title: impl Into<String>) -> Self {
        self.buttons.push(ReplyButton::new(action, title));
        self
    }

    pub fn button_if(self, condition: bool, action: Action, title: impl Into<String>) -> Self {
        if condition {
            self.button(action, title)
        } else {
            self
        }
    }

    /// Buttons beyond [`MAX_BUTTONS`] are dropped.
    pub fn build(mut self) -> OutboundMessage {
        if self.buttons.is_empty() {
            return OutboundMessage::Text { body: self.body };
        }
        self.buttons.truncate(MAX_BUTTONS);
        OutboundMessage::Buttons { body: self.body, buttons: self.buttons }
    }
}

#[cfg(test)]
mod tests {
    use cotiza_core::domain::product::ProductId;

    use super::{MessageBuilder, OutboundMessage, MAX_BUTTONS};
    use crate::actions::Action;

    #[test]
    fn builder_without_buttons_yields_plain_text() {
        let message = MessageBuilder::new("hola").build();
        assert_eq!(message, OutboundMessage::text("hola"));
    }

    #[test]
    fn builder_caps_buttons_and_keeps_order() {
        let message = MessageBuilder::new("¿Qué deseas modificar?")
            .button(Action::EditPrice(0), "💰 Precio")
            .button(Action::EditQuantity(0), "✏️ Cantidad")
            .button(Action::EditDiscount(0), "🔻 Descuento")
            .button(Action::DeleteLine(0), "🗑️ Eliminar")
            .build();

        assert_eq!(message.button_ids().len(), MAX_BUTTONS);
        assert_eq!(
            message.button_ids(),
            vec!["editar_precio_0", "editar_cantidad_0", "editar_descuento_0"]
        );
    }

    #[test]
    fn conditional_buttons_are_skipped() {
        let message = MessageBuilder::new("Opciones adicionales:")
            .button_if(false, Action::PreviousLine, "⏮️ Anterior")
            .button_if(true, Action::NextLine, "⏭️ Siguiente")
            .build();
        assert_eq!(message.button_ids(), vec!["siguiente_producto"]);
    }

    #[test]
    fn cloud_payload_for_buttons_truncates_titles() {
        let message = MessageBuilder::new("¿Deseas cotizar este producto?")
            .button(Action::QuoteProduct(ProductId(9)), "🛒 Cotizar este producto ahora mismo")
            .build();

        let payload = message.to_cloud_payload("51999888777");

        assert_eq!(payload["type"], "interactive");
        assert_eq!(payload["interactive"]["action"]["buttons"][0]["reply"]["id"], "cotizar_9");
        let title = payload["interactive"]["action"]["buttons"][0]["reply"]["title"]
            .as_str()
            .unwrap_or_default();
        assert_eq!(title.chars().count(), 20);
    }

    #[test]
    fn cloud_payload_for_documents_carries_link_and_caption() {
        let message = OutboundMessage::document(
            "https://erp.example.com/api/pdf/quotation/55",
            "🧾 Cotización #55 para *ACME*.",
        );

        let payload = message.to_cloud_payload("51999888777");

        assert_eq!(payload["type"], "document");
        assert_eq!(payload["document"]["link"], "https://erp.example.com/api/pdf/quotation/55");
        assert_eq!(payload["document"]["caption"], "🧾 Cotización #55 para *ACME*.");
        assert_eq!(payload["document"]["filename"], "cotizacion-55.pdf");
    }
}
