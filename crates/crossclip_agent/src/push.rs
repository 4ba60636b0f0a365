//! Push-channel client.

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use async_trait::async_trait;
use crossclip_protocol::{PushEvent, POLICY_VIOLATION_CLOSE_CODE};
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::debug;
use url::Url;

/// Events received on one push-channel connection. The stream ends when the
/// connection closes.
pub type EventStream = BoxStream<'static, AgentResult<PushEvent>>;

/// Source of push events from the relay.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Opens a new connection.
    async fn connect(&self) -> AgentResult<EventStream>;
}

/// Push channel over a WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketChannel {
    url: Url,
}

impl WebSocketChannel {
    /// Creates a channel for the relay in `config`.
    pub fn new(config: &AgentConfig) -> AgentResult<Self> {
        Ok(Self {
            url: config.push_url()?,
        })
    }

    /// Returns the push-channel URL, secret included.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl PushChannel for WebSocketChannel {
    async fn connect(&self) -> AgentResult<EventStream> {
        let (socket, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| AgentError::transport_retryable(format!("connect failed: {e}")))?;

        let events = socket.filter_map(|message| future::ready(decode_message(message)));
        Ok(events.boxed())
    }
}

fn decode_message(
    message: Result<Message, tungstenite::Error>,
) -> Option<AgentResult<PushEvent>> {
    match message {
        Ok(Message::Text(text)) => Some(PushEvent::from_json(&text).map_err(AgentError::from)),
        Ok(Message::Close(Some(frame))) if u16::from(frame.code) == POLICY_VIOLATION_CLOSE_CODE => {
            Some(Err(AgentError::Unauthorized(
                "push channel rejected the token".into(),
            )))
        }
        Ok(Message::Close(frame)) => {
            debug!(?frame, "Push channel closed by relay");
            None
        }
        Ok(_) => None,
        Err(e) => Some(Err(AgentError::transport_retryable(e.to_string()))),
    }
}

/// A scripted push channel for testing.
///
/// Each `connect` yields the next queued batch of events and then ends, as
/// if the relay dropped the connection. With no batch queued, `connect`
/// fails with `NotConnected`.
#[derive(Debug, Default)]
pub struct MockPushChannel {
    batches: Mutex<VecDeque<Vec<PushEvent>>>,
}

impl MockPushChannel {
    /// Creates a channel with no queued connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the events delivered by one future connection.
    pub fn push_connection(&self, events: Vec<PushEvent>) {
        self.batches.lock().push_back(events);
    }
}

#[async_trait]
impl PushChannel for MockPushChannel {
    async fn connect(&self) -> AgentResult<EventStream> {
        let batch = self
            .batches
            .lock()
            .pop_front()
            .ok_or(AgentError::NotConnected)?;
        Ok(stream::iter(batch.into_iter().map(Ok)).boxed())
    }
}
