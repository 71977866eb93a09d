use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::blocks::OutboundMessage;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("messenger transport failed: {0}")]
    Transport(String),
    #[error("messenger request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("media `{0}` could not be downloaded")]
    MediaUnavailable(String),
}

/// Outbound side of the messaging channel.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, to: &str, message: &OutboundMessage) -> Result<(), DeliveryError>;
    async fn mark_read(&self, message_id: &str) -> Result<(), DeliveryError>;
    async fn fetch_media(&self, media_id: &str) -> Result<Vec<u8>, DeliveryError>;
}

#[derive(Default)]
pub struct NoopMessenger;

#[async_trait]
impl Messenger for NoopMessenger {
    async fn send(&self, _to: &str, _message: &OutboundMessage) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn mark_read(&self, _message_id: &str) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn fetch_media(&self, media_id: &str) -> Result<Vec<u8>, DeliveryError> {
        Err(DeliveryError::MediaUnavailable(media_id.to_owned()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub message: OutboundMessage,
}

#[derive(Default)]
struct Recorded {
    sent: Vec<SentMessage>,
    read: Vec<String>,
    media: HashMap<String, Vec<u8>>,
}

/// Messenger that keeps everything in memory, for tests and dry runs.
#[derive(Clone, Default)]
pub struct RecordingMessenger {
    recorded: Arc<Mutex<Recorded>>,
    fail_sends: Arc<AtomicBool>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media(self, media_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.with_recorded(|recorded| {
            recorded.media.insert(media_id.into(), bytes);
        });
        self
    }

    /// Makes every subsequent `send` fail while still recording it.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.with_recorded(|recorded| recorded.sent.clone())
    }

    pub fn bodies(&self) -> Vec<String> {
        self.with_recorded(|recorded| {
            recorded.sent.iter().map(|sent| sent.message.body().to_owned()).collect()
        })
    }

    pub fn last(&self) -> Option<OutboundMessage> {
        self.with_recorded(|recorded| recorded.sent.last().map(|sent| sent.message.clone()))
    }

    pub fn read_receipts(&self) -> Vec<String> {
        self.with_recorded(|recorded| recorded.read.clone())
    }

    pub fn clear(&self) {
        self.with_recorded(|recorded| {
            recorded.sent.clear();
            recorded.read.clear();
        });
    }

    fn with_recorded<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        match self.recorded.lock() {
            Ok(mut recorded) => f(&mut recorded),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, to: &str, message: &OutboundMessage) -> Result<(), DeliveryError> {
        self.with_recorded(|recorded| {
            recorded.sent.push(SentMessage { to: to.to_owned(), message: message.clone() });
        });
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("recording messenger set to fail".to_owned()));
        }
        Ok(())
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), DeliveryError> {
        self.with_recorded(|recorded| recorded.read.push(message_id.to_owned()));
        Ok(())
    }

    async fn fetch_media(&self, media_id: &str) -> Result<Vec<u8>, DeliveryError> {
        self.with_recorded(|recorded| recorded.media.get(media_id).cloned())
            .ok_or_else(|| DeliveryError::MediaUnavailable(media_id.to_owned()))
    }
}
