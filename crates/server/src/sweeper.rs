use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cotiza_core::session::SessionStore;
use tokio::task::JoinHandle;
use tracing::info;

/// Periodically drops sessions idle for longer than `ttl`.
pub fn spawn(
    sessions: Arc<SessionStore>,
    ttl: chrono::Duration,
    every: Duration,
) -> JoinHandle<()> {
    info!(
        event_name = "system.sessions.sweeper_started",
        correlation_id = "bootstrap",
        ttl_secs = ttl.num_seconds(),
        interval_secs = every.as_secs(),
        "idle session sweeper started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let evicted = sessions.evict_idle(Utc::now(), ttl).await;
            if evicted > 0 {
                let remaining = sessions.len().await;
                info!(
                    event_name = "system.sessions.evicted",
                    correlation_id = "sweeper",
                    evicted,
                    remaining,
                    "idle sessions evicted"
                );
            }
        }
    })
}
