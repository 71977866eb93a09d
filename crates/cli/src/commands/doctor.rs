use std::time::Duration;

use cotiza_core::config::{AppConfig, LlmProvider, LoadOptions};
use serde::Serialize;

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let all_passed = report.overall_status == CheckStatus::Pass;

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult::readiness(all_passed, output)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.push(check_llm_provider(&config));
            checks.push(check_appointment_ledger(&config));
            checks.push(check_backend_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("llm_provider"));
            checks.push(DoctorCheck::skipped("appointment_ledger"));
            checks.push(DoctorCheck::skipped("backend_connectivity"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_llm_provider(config: &AppConfig) -> DoctorCheck {
    let details = match config.llm.provider {
        LlmProvider::Keyword => {
            "keyword matching without a model; voice notes will be refused".to_string()
        }
        LlmProvider::OpenAi => format!(
            "openai model `{}` with transcription model `{}`",
            config.llm.model, config.llm.transcription_model
        ),
        LlmProvider::Ollama => format!(
            "ollama model `{}` at `{}`; voice notes will be refused",
            config.llm.model,
            config.llm.base_url.as_deref().unwrap_or_default()
        ),
    };
    DoctorCheck::pass("llm_provider", details)
}

fn check_appointment_ledger(config: &AppConfig) -> DoctorCheck {
    let path = &config.appointments.ledger_path;
    if path.is_dir() {
        return DoctorCheck::fail(
            "appointment_ledger",
            format!("`{}` is a directory, expected a file", path.display()),
        );
    }
    if path.exists() {
        return DoctorCheck::pass("appointment_ledger", format!("appending to `{}`", path.display()));
    }
    DoctorCheck::pass(
        "appointment_ledger",
        format!("`{}` will be created on the first booking", path.display()),
    )
}

fn check_backend_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck::fail(
                "backend_connectivity",
                format!("failed to initialize async runtime: {error}"),
            );
        }
    };

    let url = format!("{}/currencies", config.backend.base_url.trim_end_matches('/'));
    let timeout = Duration::from_secs(config.backend.timeout_secs);
    let result = runtime.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| format!("failed to build http client: {error}"))?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|error| format!("failed to reach backend: {error}"))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("backend answered `{url}` with status {}", status.as_u16()))
        }
    });

    match result {
        Ok(()) => DoctorCheck::pass("backend_connectivity", format!("reached `{url}`")),
        Err(error) => DoctorCheck::fail("backend_connectivity", error),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
