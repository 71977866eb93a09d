//! OpenAI-compatible chat and transcription clients.
//!
//! Ollama exposes the same `chat/completions` route, so one client serves
//! both providers; only the base url and the bearer token differ.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use cotiza_agent::{LlmClient, Transcriber, TranscriptionError};
use cotiza_core::config::{LlmConfig, LlmProvider};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
struct Endpoint {
    base_url: String,
    api_key: Option<SecretString>,
}

impl Endpoint {
    fn from_config(config: &LlmConfig) -> Self {
        let base_url = match (&config.base_url, config.provider) {
            (Some(url), _) => url.clone(),
            (None, LlmProvider::Ollama) => "http://localhost:11434/v1".to_string(),
            (None, _) => OPENAI_BASE_URL.to_string(),
        };
        Self { base_url: base_url.trim_end_matches('/').to_string(), api_key: config.api_key.clone() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key.expose_secret())),
            None => request,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct OpenAiChatClient {
    client: Client,
    endpoint: Endpoint,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(client: Client, config: &LlmConfig) -> Self {
        Self { client, endpoint: Endpoint::from_config(config), model: config.model.clone() }
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.0
        });

        let response = self
            .endpoint
            .authorized(self.client.post(self.endpoint.url("chat/completions")))
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("chat completion error ({status}): {error_text}");
        }

        let reply: ChatResponse =
            response.json().await.context("chat completion response was not valid JSON")?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("chat completion returned no content")
    }
}

pub struct OpenAiTranscriber {
    client: Client,
    endpoint: Endpoint,
    model: String,
}

impl OpenAiTranscriber {
    pub fn new(client: Client, config: &LlmConfig) -> Self {
        Self {
            client,
            endpoint: Endpoint::from_config(config),
            model: config.transcription_model.clone(),
        }
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, TranscriptionError> {
        // WhatsApp voice notes are opus in an ogg container.
        let part = Part::bytes(audio)
            .file_name("audio.ogg")
            .mime_str("audio/ogg")
            .map_err(|error| TranscriptionError::Request(error.to_string()))?;
        let form = Form::new().text("model", self.model.clone()).part("file", part);

        let response = self
            .endpoint
            .authorized(self.client.post(self.endpoint.url("audio/transcriptions")))
            .multipart(form)
            .send()
            .await
            .map_err(|error| TranscriptionError::Request(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Request(format!("transcription error ({status}): {error_text}")));
        }

        let transcription: TranscriptionResponse =
            response.json().await.map_err(|error| TranscriptionError::Request(error.to_string()))?;
        Ok(transcription.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use cotiza_agent::{LlmClient, Transcriber, TranscriptionError};
    use cotiza_core::config::{AppConfig, LlmConfig, LlmProvider};
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{Endpoint, OpenAiChatClient, OpenAiTranscriber, OPENAI_BASE_URL};

    fn llm_config(server: &MockServer) -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::OpenAi,
            api_key: Some("sk-test".to_string().into()),
            base_url: Some(format!("{}/v1/", server.uri())),
            ..AppConfig::default().llm
        }
    }

    #[test]
    fn base_url_defaults_per_provider() {
        let mut config = AppConfig::default().llm;
        config.provider = LlmProvider::OpenAi;
        assert_eq!(
            Endpoint::from_config(&config).url("chat/completions"),
            format!("{OPENAI_BASE_URL}/chat/completions")
        );

        config.provider = LlmProvider::Ollama;
        assert_eq!(
            Endpoint::from_config(&config).url("chat/completions"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn chat_completion_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "[3, 9]"}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new(Client::new(), &llm_config(&server));
        let reply = client.complete("ids?").await.expect("completion succeeds");
        assert_eq!(reply, "[3, 9]");
    }

    #[tokio::test]
    async fn chat_errors_surface_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = OpenAiChatClient::new(Client::new(), &llm_config(&server));
        let error = client.complete("ids?").await.expect_err("429 fails");
        assert!(error.to_string().contains("429"));
    }

    #[tokio::test]
    async fn transcription_trims_text_and_reports_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"text": " compresor de 20hp \n"})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transcriber = OpenAiTranscriber::new(Client::new(), &llm_config(&server));
        assert_eq!(
            transcriber.transcribe(vec![0_u8; 16]).await,
            Ok("compresor de 20hp".to_string())
        );
        assert!(matches!(
            transcriber.transcribe(vec![0_u8; 16]).await,
            Err(TranscriptionError::Request(_))
        ));
    }
}
