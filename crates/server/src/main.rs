mod appointments;
mod audit;
mod backend;
mod bootstrap;
mod health;
mod openai;
mod sweeper;
mod webhook;
mod whatsapp;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use cotiza_core::config::{AppConfig, LoadOptions};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::webhook::WebhookState;

fn init_logging(config: &AppConfig) {
    use cotiza_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let sessions = Arc::clone(app.engine.sessions());

    if let Some(ttl) = app.config.session_ttl() {
        sweeper::spawn(
            Arc::clone(&sessions),
            ttl,
            Duration::from_secs(app.config.sessions.sweep_interval_secs),
        );
    }

    let router = health::router(sessions).merge(webhook::router(WebhookState::new(
        Arc::clone(&app.engine),
        app.config.whatsapp.verify_token.clone(),
    )));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "cotiza-server listening"
    );

    let shutdown = Arc::new(Notify::new());
    let serve = axum::serve(listener, router).with_graceful_shutdown({
        let shutdown = Arc::clone(&shutdown);
        async move { shutdown.notified().await }
    });
    let mut server = tokio::spawn(async move { serve.await });

    tokio::select! {
        finished = &mut server => {
            finished??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => signal?,
    }

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "cotiza-server draining in-flight requests"
    );
    shutdown.notify_one();

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(finished) => finished??,
        Err(_) => warn!(
            event_name = "system.server.drain_timeout",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "in-flight requests did not finish before the grace period"
        ),
    }

    info!(event_name = "system.server.stopped", correlation_id = "shutdown", "cotiza-server stopped");
    Ok(())
}
