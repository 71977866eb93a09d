pub mod config;
pub mod doctor;

use cotiza_core::config::ConfigError;
use serde_json::json;

/// Process exit code for an inspection that finished and found nothing wrong.
pub const EXIT_OK: u8 = 0;
/// At least one readiness check failed.
pub const EXIT_CHECKS_FAILED: u8 = 1;
/// Configuration could not be loaded, so nothing else was inspected.
pub const EXIT_INVALID_CONFIG: u8 = 2;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn report(output: String) -> Self {
        Self { exit_code: EXIT_OK, output }
    }

    pub fn readiness(all_passed: bool, output: String) -> Self {
        let exit_code = if all_passed { EXIT_OK } else { EXIT_CHECKS_FAILED };
        Self { exit_code, output }
    }

    /// JSON payload for a command that stopped because the config did not load.
    pub fn invalid_config(command: &str, error: &ConfigError) -> Self {
        let payload = json!({
            "command": command,
            "status": "error",
            "error_class": config_error_class(error),
            "message": format!("config could not be loaded: {error}"),
        });
        Self { exit_code: EXIT_INVALID_CONFIG, output: payload.to_string() }
    }
}

fn config_error_class(error: &ConfigError) -> &'static str {
    match error {
        ConfigError::ReadFile { .. }
        | ConfigError::ParseFile { .. }
        | ConfigError::MissingConfigFile(_) => "config_file",
        ConfigError::MissingEnvInterpolation { .. } | ConfigError::UnterminatedInterpolation => {
            "config_interpolation"
        }
        ConfigError::InvalidEnvOverride { .. } => "config_env_override",
        ConfigError::Validation(_) => "config_validation",
    }
}
