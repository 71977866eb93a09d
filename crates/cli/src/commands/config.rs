use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cotiza_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use super::CommandResult;

/// One reported setting: dotted key, rendered value and the env vars that can set it.
struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl Field {
    fn new(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.into(), env_keys }
    }
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::invalid_config("config", &error),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    CommandResult::report(lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field::new("backend.base_url", &config.backend.base_url, &["COTIZA_BACKEND_BASE_URL"]),
        Field::new(
            "backend.timeout_secs",
            config.backend.timeout_secs.to_string(),
            &["COTIZA_BACKEND_TIMEOUT_SECS"],
        ),
        Field::new(
            "whatsapp.api_token",
            redact_secret(&config.whatsapp.api_token),
            &["COTIZA_WHATSAPP_API_TOKEN"],
        ),
        Field::new(
            "whatsapp.phone_number_id",
            &config.whatsapp.phone_number_id,
            &["COTIZA_WHATSAPP_PHONE_NUMBER_ID"],
        ),
        Field::new(
            "whatsapp.api_version",
            &config.whatsapp.api_version,
            &["COTIZA_WHATSAPP_API_VERSION"],
        ),
        Field::new(
            "whatsapp.graph_base_url",
            &config.whatsapp.graph_base_url,
            &["COTIZA_WHATSAPP_GRAPH_BASE_URL"],
        ),
        Field::new(
            "whatsapp.verify_token",
            redact_secret(&config.whatsapp.verify_token),
            &["COTIZA_WHATSAPP_VERIFY_TOKEN"],
        ),
        Field::new(
            "llm.provider",
            format!("{:?}", config.llm.provider),
            &["COTIZA_LLM_PROVIDER"],
        ),
        Field::new(
            "llm.api_key",
            config.llm.api_key.as_ref().map(redact_secret).unwrap_or_else(|| "<unset>".to_string()),
            &["COTIZA_LLM_API_KEY"],
        ),
        Field::new(
            "llm.base_url",
            config.llm.base_url.as_deref().unwrap_or("<unset>"),
            &["COTIZA_LLM_BASE_URL"],
        ),
        Field::new("llm.model", &config.llm.model, &["COTIZA_LLM_MODEL"]),
        Field::new(
            "llm.transcription_model",
            &config.llm.transcription_model,
            &["COTIZA_LLM_TRANSCRIPTION_MODEL"],
        ),
        Field::new(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["COTIZA_LLM_TIMEOUT_SECS"],
        ),
        Field::new(
            "server.bind_address",
            &config.server.bind_address,
            &["COTIZA_SERVER_BIND_ADDRESS"],
        ),
        Field::new("server.port", config.server.port.to_string(), &["COTIZA_SERVER_PORT"]),
        Field::new(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["COTIZA_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        Field::new(
            "sessions.idle_ttl_secs",
            config.sessions.idle_ttl_secs.to_string(),
            &["COTIZA_SESSIONS_IDLE_TTL_SECS"],
        ),
        Field::new(
            "sessions.sweep_interval_secs",
            config.sessions.sweep_interval_secs.to_string(),
            &["COTIZA_SESSIONS_SWEEP_INTERVAL_SECS"],
        ),
        Field::new(
            "appointments.ledger_path",
            config.appointments.ledger_path.display().to_string(),
            &["COTIZA_APPOINTMENTS_LEDGER_PATH"],
        ),
        Field::new(
            "logging.level",
            &config.logging.level,
            &["COTIZA_LOGGING_LEVEL", "COTIZA_LOG_LEVEL"],
        ),
        Field::new(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["COTIZA_LOGGING_FORMAT", "COTIZA_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("cotiza.toml"), PathBuf::from("config/cotiza.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys.iter().find(|env_key| {
        env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false)
    });
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a short prefix so operators can tell tokens apart without leaking them.
fn redact_secret(secret: &SecretString) -> String {
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars = trimmed.chars().count();
    if chars <= 8 {
        return "<redacted>".to_string();
    }

    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use toml::Value;

    use super::{contains_path, redact_secret};

    #[test]
    fn redaction_never_reveals_short_tokens() {
        struct Case {
            secret: &'static str,
            expected: &'static str,
        }

        let cases = [
            Case { secret: "", expected: "<empty>" },
            Case { secret: "   ", expected: "<empty>" },
            Case { secret: "s3cret", expected: "<redacted>" },
            Case { secret: "EAAGm0PX4ZCpsBAKZB", expected: "EAAG***" },
        ];

        for case in cases {
            let secret = SecretString::from(case.secret.to_string());
            assert_eq!(redact_secret(&secret), case.expected, "secret `{}`", case.secret);
        }
    }

    #[test]
    fn nested_keys_are_found_in_toml_documents() {
        let doc: Value = "[whatsapp]\napi_version = \"v20.0\"\n".parse().expect("valid toml");
        assert!(contains_path(&doc, "whatsapp.api_version"));
        assert!(!contains_path(&doc, "whatsapp.phone_number_id"));
        assert!(!contains_path(&doc, "llm.model"));
    }
}
