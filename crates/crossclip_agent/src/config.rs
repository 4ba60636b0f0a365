//! Configuration for the sync agent.

use crate::error::{AgentError, AgentResult};
use crossclip_protocol::{PUSH_CHANNEL_PATH, TOKEN_QUERY_PARAM};
use std::time::Duration;
use url::Url;

/// Shortest accepted poll interval; a zero period would stall the timer.
pub(crate) const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for a sync agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the relay (`http://` or `https://`).
    pub server_url: String,
    /// Shared secret sent with every request.
    pub secret: String,
    /// Interval between clipboard samples.
    pub poll_interval: Duration,
    /// How long the poll unit stays suppressed after a remote clip is applied.
    pub settle_delay: Duration,
    /// Wait before reconnecting a lost push channel.
    pub reconnect_backoff: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl AgentConfig {
    /// Creates a new agent configuration.
    pub fn new(server_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            secret: secret.into(),
            poll_interval: Duration::from_secs(1),
            settle_delay: Duration::from_millis(500),
            reconnect_backoff: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the poll interval, at least one millisecond.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Sets the settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the reconnect backoff.
    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the relay base URL, normalized to end with `/`.
    pub fn base_url(&self) -> AgentResult<Url> {
        let mut url = Url::parse(&self.server_url)
            .map_err(|e| AgentError::InvalidConfig(format!("server url: {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AgentError::InvalidConfig(format!(
                    "unsupported server url scheme: {other}"
                )))
            }
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Returns the push-channel URL: `ws(s)://host/ws?token=<secret>`.
    pub fn push_url(&self) -> AgentResult<Url> {
        let base = self.base_url()?;
        let mut url = base
            .join(PUSH_CHANNEL_PATH.trim_start_matches('/'))
            .map_err(|e| AgentError::InvalidConfig(format!("push url: {e}")))?;

        let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| AgentError::InvalidConfig(format!("cannot use scheme {scheme}")))?;
        url.query_pairs_mut()
            .clear()
            .append_pair(TOKEN_QUERY_PARAM, &self.secret);
        Ok(url)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8000", "")
    }
}
