//! WhatsApp integration for cotiza
//!
//! - **Events** (`events`) - Cloud API webhook payloads decoded into inbound messages
//! - **Actions** (`actions`) - the closed set of reply-button ids the assistant offers
//! - **Blocks** (`blocks`) - outbound text, reply-button and media messages
//! - **Messenger** (`messenger`) - delivery port plus in-memory implementations
//!
//! ```text
//! Cloud API webhook → decode_webhook → DialogueEngine → Messenger → Cloud API
//! ```

pub mod actions;
pub mod blocks;
pub mod events;
pub mod messenger;

pub use actions::{Action, ActionParseError};
pub use blocks::{MediaKind, MessageBuilder, OutboundMessage, ReplyButton};
pub use events::{decode_webhook, InboundMessage, MessageKind, WebhookDecodeError};
pub use messenger::{DeliveryError, Messenger, NoopMessenger, RecordingMessenger, SentMessage};
