use std::sync::Arc;
use std::time::Duration;

use cotiza_agent::{
    Collaborators, DialogueEngine, IntentClassifier, KeywordIntentClassifier,
    KeywordProductMatcher, LlmClient, LlmIntentClassifier, LlmProductMatcher, ProductMatcher,
    Transcriber, UnsupportedTranscriber,
};
use cotiza_core::config::{AppConfig, ConfigError, LlmProvider};
use cotiza_core::session::SessionStore;
use cotiza_whatsapp::Messenger;
use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::appointments::JsonlAppointmentBook;
use crate::audit::TracingAuditSink;
use crate::backend::HttpBackend;
use crate::openai::{OpenAiChatClient, OpenAiTranscriber};
use crate::whatsapp::CloudMessenger;

const GRAPH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Application {
    pub config: AppConfig,
    pub engine: Arc<DialogueEngine>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client could not be built: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        provider = ?config.llm.provider,
        "starting application bootstrap"
    );

    let graph_client =
        Client::builder().timeout(GRAPH_TIMEOUT).build().map_err(BootstrapError::HttpClient)?;
    let messenger = Arc::new(CloudMessenger::new(graph_client, &config.whatsapp));
    let ports = collaborators(&config, messenger)?;
    let engine = Arc::new(DialogueEngine::new(ports, Arc::new(SessionStore::new())));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        backend = %config.backend.base_url,
        "dialogue engine wired"
    );

    Ok(Application { config, engine })
}

/// Wires every port except the messenger, which the caller supplies.
pub fn collaborators(
    config: &AppConfig,
    messenger: Arc<dyn Messenger>,
) -> Result<Collaborators, BootstrapError> {
    let backend = Arc::new(HttpBackend::new(&config.backend).map_err(BootstrapError::HttpClient)?);

    let (classifier, matcher, transcriber): (
        Arc<dyn IntentClassifier>,
        Arc<dyn ProductMatcher>,
        Arc<dyn Transcriber>,
    ) = match config.llm.provider {
        LlmProvider::Keyword => (
            Arc::new(KeywordIntentClassifier),
            Arc::new(KeywordProductMatcher),
            Arc::new(UnsupportedTranscriber),
        ),
        provider @ (LlmProvider::OpenAi | LlmProvider::Ollama) => {
            let llm_http = Client::builder()
                .timeout(Duration::from_secs(config.llm.timeout_secs))
                .build()
                .map_err(BootstrapError::HttpClient)?;
            let llm: Arc<dyn LlmClient> =
                Arc::new(OpenAiChatClient::new(llm_http.clone(), &config.llm));
            let transcriber: Arc<dyn Transcriber> = match provider {
                LlmProvider::OpenAi => Arc::new(OpenAiTranscriber::new(llm_http, &config.llm)),
                _ => Arc::new(UnsupportedTranscriber),
            };
            (
                Arc::new(LlmIntentClassifier::new(Arc::clone(&llm))),
                Arc::new(LlmProductMatcher::new(llm)),
                transcriber,
            )
        }
    };

    let appointments = Arc::new(JsonlAppointmentBook::new(config.appointments.ledger_path.clone()));
    info!(
        event_name = "system.bootstrap.appointment_ledger",
        correlation_id = "bootstrap",
        ledger_path = %appointments.path().display(),
        "appointments will be appended to ledger"
    );

    Ok(Collaborators {
        messenger,
        users: backend.clone(),
        catalog: backend.clone(),
        clients: backend.clone(),
        reference: backend.clone(),
        quotations: backend,
        classifier,
        matcher,
        transcriber,
        appointments,
        audit: Arc::new(TracingAuditSink),
    })
}

#[cfg(test)]
mod tests {
    use cotiza_core::config::{AppConfig, ConfigOverrides, LlmProvider, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?)
    }

    fn valid_overrides(provider: LlmProvider) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                whatsapp_api_token: Some("EAAG-test".to_string()),
                whatsapp_phone_number_id: Some("1234567890".to_string()),
                whatsapp_verify_token: Some("verify".to_string()),
                llm_provider: Some(provider),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn bootstrap_fails_fast_without_whatsapp_credentials() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                whatsapp_phone_number_id: Some("1234567890".to_string()),
                whatsapp_verify_token: Some("verify".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let error = result.err().expect("missing token is rejected");
        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(error.to_string().contains("whatsapp.api_token"));
    }

    #[tokio::test]
    async fn keyword_provider_boots_without_network() {
        let app = bootstrap(valid_overrides(LlmProvider::Keyword)).expect("bootstrap succeeds");

        assert_eq!(app.config.llm.provider, LlmProvider::Keyword);
        assert!(app.engine.sessions().is_empty().await);
    }

    #[test]
    fn openai_provider_requires_an_api_key() {
        let error = bootstrap(valid_overrides(LlmProvider::OpenAi))
            .err()
            .expect("openai without key is rejected");
        assert!(error.to_string().contains("llm.api_key"));
    }
}
