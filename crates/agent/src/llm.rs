use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("audio transcription is not available with the configured provider")]
    Unsupported,
    #[error("transcription request failed: {0}")]
    Request(String),
}

/// Speech-to-text port used for voice notes.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Returns the transcript, possibly empty when nothing was understood.
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, TranscriptionError>;
}

/// Transcriber for deployments without a speech model.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedTranscriber;

#[async_trait]
impl Transcriber for UnsupportedTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>) -> Result<String, TranscriptionError> {
        Err(TranscriptionError::Unsupported)
    }
}

/// Cuts the outermost `open`..`close` span out of a model reply, which is
/// often wrapped in prose or a fenced block.
pub(crate) fn json_span(reply: &str, open: char, close: char) -> Option<&str> {
    let start = reply.find(open)?;
    let end = reply.rfind(close)?;
    (end > start).then(|| &reply[start..=end])
}

#[cfg(test)]
mod tests {
    use super::{json_span, Transcriber, TranscriptionError, UnsupportedTranscriber};

    #[test]
    fn json_span_strips_surrounding_prose() {
        assert_eq!(json_span("Claro:\n```json\n[1, 2]\n```", '[', ']'), Some("[1, 2]"));
        assert_eq!(json_span("{\"ruc\":\"1\"} listo", '{', '}'), Some("{\"ruc\":\"1\"}"));
        assert_eq!(json_span("sin datos", '[', ']'), None);
        assert_eq!(json_span("] al revés [", '[', ']'), None);
    }

    #[tokio::test]
    async fn unsupported_transcriber_refuses_audio() {
        let result = UnsupportedTranscriber.transcribe(vec![1, 2, 3]).await;
        assert_eq!(result, Err(TranscriptionError::Unsupported));
    }
}
