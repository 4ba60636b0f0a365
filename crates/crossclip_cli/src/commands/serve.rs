//! Serve command implementation.

use crossclip_server::{serve, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

/// Runs the relay until the process is stopped.
pub async fn run(
    secret: &str,
    bind: SocketAddr,
    upload_dir: PathBuf,
    history: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if history == 0 {
        return Err("History capacity must be at least 1".into());
    }

    let config = ServerConfig::new(secret)
        .with_bind_addr(bind)
        .with_upload_dir(upload_dir)
        .with_history_capacity(history);

    info!(
        upload_dir = %config.upload_dir.display(),
        history = config.history_capacity,
        "Starting relay"
    );
    serve(config).await?;
    Ok(())
}
