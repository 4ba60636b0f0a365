//! Transport layer abstraction for relay requests.

use crate::error::{AgentError, AgentResult};
use crate::sampler::Snapshot;
use async_trait::async_trait;
use crossclip_protocol::{ClipItem, MessageResponse, StatusResponse};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// A relay transport handles request/response calls to the relay server.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-memory mock for testing, etc.). The push
/// channel is separate, see [`crate::PushChannel`].
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Fetches the relay status.
    async fn status(&self) -> AgentResult<StatusResponse>;

    /// Arms the relay.
    async fn arm(&self) -> AgentResult<MessageResponse>;

    /// Disarms the relay.
    async fn disarm(&self) -> AgentResult<MessageResponse>;

    /// Uploads clipboard content.
    async fn upload(&self, snapshot: &Snapshot) -> AgentResult<ClipItem>;

    /// Fetches the most recent clip.
    async fn latest(&self) -> AgentResult<ClipItem>;

    /// Downloads an image blob.
    async fn fetch_blob(&self, name: &str) -> AgentResult<Vec<u8>>;
}

#[derive(Debug, Default)]
struct MockRelay {
    armed: bool,
    history: Vec<ClipItem>,
    blobs: HashMap<String, Vec<u8>>,
    uploads: Vec<Snapshot>,
}

/// A mock transport for testing.
///
/// Behaves like a one-shot relay: uploads are rejected with `Forbidden`
/// unless armed, and an accepted upload disarms it.
#[derive(Debug)]
pub struct MockTransport {
    connected: AtomicBool,
    relay: Mutex<MockRelay>,
}

impl MockTransport {
    /// Creates a new disarmed mock transport.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            relay: Mutex::new(MockRelay::default()),
        }
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Sets the armed state.
    pub fn set_armed(&self, armed: bool) {
        self.relay.lock().armed = armed;
    }

    /// Returns true if armed.
    pub fn is_armed(&self) -> bool {
        self.relay.lock().armed
    }

    /// Stores a blob for later download.
    pub fn insert_blob(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.relay.lock().blobs.insert(name.into(), bytes.into());
    }

    /// Returns every upload attempt, accepted or not.
    pub fn uploads(&self) -> Vec<Snapshot> {
        self.relay.lock().uploads.clone()
    }

    fn check_connected(&self) -> AgentResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AgentError::NotConnected)
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayTransport for MockTransport {
    async fn status(&self) -> AgentResult<StatusResponse> {
        self.check_connected()?;
        let relay = self.relay.lock();
        Ok(StatusResponse {
            armed: relay.armed,
            item_count: relay.history.len(),
            connected_clients: 0,
        })
    }

    async fn arm(&self) -> AgentResult<MessageResponse> {
        self.check_connected()?;
        self.relay.lock().armed = true;
        Ok(MessageResponse::new("System ARMED."))
    }

    async fn disarm(&self) -> AgentResult<MessageResponse> {
        self.check_connected()?;
        self.relay.lock().armed = false;
        Ok(MessageResponse::new("System DISARMED."))
    }

    async fn upload(&self, snapshot: &Snapshot) -> AgentResult<ClipItem> {
        self.check_connected()?;
        let mut relay = self.relay.lock();
        relay.uploads.push(snapshot.clone());

        if !relay.armed {
            return Err(AgentError::Forbidden(
                "System is DISARMED. Please ARM to sync.".into(),
            ));
        }

        let item = match snapshot {
            Snapshot::Text(text) => ClipItem::text(text.clone()),
            Snapshot::Image(bytes) => {
                let id = Uuid::new_v4();
                let name = format!("{id}.png");
                relay.blobs.insert(name.clone(), bytes.clone());
                ClipItem::image(id, name)
            }
        };
        relay.history.push(item.clone());
        relay.armed = false;
        Ok(item)
    }

    async fn latest(&self) -> AgentResult<ClipItem> {
        self.check_connected()?;
        self.relay
            .lock()
            .history
            .last()
            .cloned()
            .ok_or_else(|| AgentError::NotFound("Empty history".into()))
    }

    async fn fetch_blob(&self, name: &str) -> AgentResult<Vec<u8>> {
        self.check_connected()?;
        self.relay
            .lock()
            .blobs
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::NotFound(format!("blob {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn one_shot_behaviour() {
        let transport = MockTransport::new();
        let snapshot = Snapshot::Text("hello".into());

        assert!(matches!(
            transport.upload(&snapshot).await,
            Err(AgentError::Forbidden(_))
        ));

        transport.arm().await.unwrap();
        let item = transport.upload(&snapshot).await.unwrap();
        assert_eq!(item.content, "hello");
        assert!(!transport.is_armed());
        assert_eq!(transport.latest().await.unwrap(), item);
        assert_eq!(transport.uploads().len(), 2);
    }

    #[tokio::test]
    async fn image_upload_is_downloadable() {
        let transport = MockTransport::new();
        transport.set_armed(true);

        let item = transport
            .upload(&Snapshot::Image(vec![1, 2, 3]))
            .await
            .unwrap();
        let name = item.blob_name().unwrap();
        assert_eq!(transport.fetch_blob(name).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn disconnected_transport() {
        let transport = MockTransport::new();
        transport.set_connected(false);
        assert!(matches!(
            transport.status().await,
            Err(AgentError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn missing_blob() {
        let transport = MockTransport::new();
        assert!(matches!(
            transport.fetch_blob("nope.png").await,
            Err(AgentError::NotFound(_))
        ));
    }
}
