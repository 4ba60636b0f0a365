//! Agent command implementation.

use crossclip_agent::{AgentConfig, SyncAgent, SystemClipboard};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Agent timing overrides, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Clipboard poll interval.
    pub poll_ms: u64,
    /// Suppression window after a remote clip is applied.
    pub settle_ms: u64,
    /// Push-channel reconnect backoff.
    pub backoff_ms: u64,
}

/// Runs the sync agent against the system clipboard until Ctrl-C.
pub async fn run(
    server: &str,
    secret: &str,
    timing: Timing,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AgentConfig::new(server, secret)
        .with_poll_interval(Duration::from_millis(timing.poll_ms.max(1)))
        .with_settle_delay(Duration::from_millis(timing.settle_ms))
        .with_reconnect_backoff(Duration::from_millis(timing.backoff_ms));

    let clipboard = SystemClipboard::new()?;
    let agent = Arc::new(SyncAgent::connect(config, clipboard)?);
    info!(server, "Agent started");

    let handle = agent.spawn();
    tokio::signal::ctrl_c().await?;
    handle.abort();

    let stats = agent.stats();
    info!(
        uploads = stats.uploads_accepted,
        rejected = stats.uploads_rejected,
        applied = stats.clips_applied,
        reconnects = stats.reconnects,
        "Agent stopped"
    );
    Ok(())
}
