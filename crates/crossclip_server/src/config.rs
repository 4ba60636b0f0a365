//! Server configuration.

use crossclip_protocol::DEFAULT_HISTORY_CAPACITY;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Shortest accepted ping interval; a zero period would stall the timer.
pub(crate) const MIN_PING_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the relay server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Shared secret every request must present.
    pub secret: String,
    /// Directory holding uploaded image blobs.
    pub upload_dir: PathBuf,
    /// Maximum number of clips kept in history.
    pub history_capacity: usize,
    /// Number of undelivered events a push session may buffer before it is dropped.
    pub session_buffer: usize,
    /// Interval between liveness pings on each push session.
    pub ping_interval: Duration,
}

impl ServerConfig {
    /// Creates a new server configuration with the given shared secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            secret: secret.into(),
            upload_dir: PathBuf::from("uploads"),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            session_buffer: 32,
            ping_interval: Duration::from_secs(30),
        }
    }

    /// Sets the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Sets the blob directory.
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    /// Sets the history capacity.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Sets the per-session event buffer.
    pub fn with_session_buffer(mut self, size: usize) -> Self {
        self.session_buffer = size;
        self
    }

    /// Sets the push-session ping interval, at least one millisecond.
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval.max(MIN_PING_INTERVAL);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = ServerConfig::new("secret");
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new("secret")
            .with_bind_addr("127.0.0.1:9000".parse().unwrap())
            .with_upload_dir("/tmp/blobs")
            .with_history_capacity(5)
            .with_session_buffer(4);

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/blobs"));
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.session_buffer, 4);
        assert_eq!(config.secret, "secret");
    }

    #[test]
    fn zero_ping_interval_is_clamped() {
        let config = ServerConfig::new("secret").with_ping_interval(Duration::ZERO);
        assert_eq!(config.ping_interval, MIN_PING_INTERVAL);
    }
}
