//! The sync agent: poll unit and push-listener unit.

use crate::config::{AgentConfig, MIN_POLL_INTERVAL};
use crate::error::{AgentError, AgentResult};
use crate::http::HttpTransport;
use crate::push::{PushChannel, WebSocketChannel};
use crate::sampler::{ClipboardProvider, ClipboardSampler, Snapshot};
use crate::state::{AgentState, Change};
use crate::transport::RelayTransport;
use crossclip_protocol::{ClipItem, ClipKind, PushEvent, StatusResponse};
use futures_util::StreamExt;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Result of one poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A remote clip was being applied; nothing was sampled.
    Suppressed,
    /// No local change.
    Unchanged,
    /// The clipboard was cleared; clears are not uploaded.
    Cleared,
    /// A local change was uploaded and accepted.
    Uploaded(ClipItem),
    /// A local change was rejected because the relay is disarmed.
    Rejected,
    /// A local change could not be uploaded.
    Failed,
}

/// Statistics about agent activity.
#[derive(Debug, Clone, Default)]
pub struct AgentStats {
    /// Uploads accepted by the relay.
    pub uploads_accepted: u64,
    /// Uploads rejected because the relay was disarmed.
    pub uploads_rejected: u64,
    /// Uploads that failed for any other reason.
    pub uploads_failed: u64,
    /// Remote clips written to the local clipboard.
    pub clips_applied: u64,
    /// Remote clips that could not be fetched or written.
    pub apply_failures: u64,
    /// Push-channel reconnect attempts.
    pub reconnects: u64,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Handles to a spawned agent's two units.
#[derive(Debug)]
pub struct AgentHandle {
    poll: JoinHandle<()>,
    listener: JoinHandle<()>,
}

impl AgentHandle {
    /// Stops both units.
    pub fn abort(&self) {
        self.poll.abort();
        self.listener.abort();
    }

    /// Returns true once both units have stopped.
    pub fn is_finished(&self) -> bool {
        self.poll.is_finished() && self.listener.is_finished()
    }
}

/// Per-device clipboard sync agent.
///
/// Runs two independent units sharing one [`AgentState`]:
/// the poll unit samples the clipboard every `poll_interval` and uploads
/// local changes; the push-listener unit keeps a push-channel connection
/// and applies remote clips with echo suppression.
pub struct SyncAgent<T: RelayTransport, P: PushChannel, C: ClipboardProvider> {
    config: AgentConfig,
    transport: Arc<T>,
    push: Arc<P>,
    sampler: ClipboardSampler<C>,
    state: AgentState,
    armed: AtomicBool,
    connected: AtomicBool,
    stats: RwLock<AgentStats>,
}

impl<C: ClipboardProvider> SyncAgent<HttpTransport, WebSocketChannel, C> {
    /// Creates an agent talking to the relay in `config` over HTTP and WebSocket.
    pub fn connect(config: AgentConfig, provider: C) -> AgentResult<Self> {
        let transport = HttpTransport::new(&config)?;
        let push = WebSocketChannel::new(&config)?;
        Ok(Self::new(config, transport, push, provider))
    }
}

impl<T: RelayTransport, P: PushChannel, C: ClipboardProvider> SyncAgent<T, P, C> {
    /// Creates a new agent.
    ///
    /// The clipboard is sampled once here; content present at start-up is
    /// the baseline and is not uploaded.
    pub fn new(config: AgentConfig, transport: T, push: P, provider: C) -> Self {
        let sampler = ClipboardSampler::new(provider);
        let baseline = sampler.sample();
        debug!(
            baseline = ?baseline.as_ref().map(Snapshot::kind),
            "Clipboard baseline taken"
        );

        Self {
            config,
            transport: Arc::new(transport),
            push: Arc::new(push),
            sampler,
            state: AgentState::new(baseline),
            armed: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            stats: RwLock::new(AgentStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Returns the relay transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the shared change-detection state.
    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Returns the clipboard provider.
    pub fn provider(&self) -> &C {
        self.sampler.provider()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> AgentStats {
        self.stats.read().clone()
    }

    /// Returns the last armed indicator seen from the relay.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Returns true while the push channel is connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn record_error(&self, e: &AgentError) {
        self.stats.write().last_error = Some(e.to_string());
    }

    /// Runs one poll tick.
    ///
    /// Rejected and failed uploads are logged and dropped; the change is not
    /// retried.
    pub async fn poll_once(&self) -> PollOutcome {
        // Samples on this worker with the state lock held; the listener's
        // suppress() waits for it.
        let snapshot = match self.state.detect_change(|| self.sampler.sample()) {
            Change::Suppressed => return PollOutcome::Suppressed,
            Change::Unchanged => return PollOutcome::Unchanged,
            Change::Cleared => return PollOutcome::Cleared,
            Change::Changed(snapshot) => snapshot,
        };

        info!(kind = %snapshot.kind(), size = snapshot.len(), "Local change detected, uploading");

        match self.transport.upload(&snapshot).await {
            Ok(item) => {
                self.stats.write().uploads_accepted += 1;
                self.armed.store(false, Ordering::SeqCst);
                info!(clip_id = %item.id, "Upload accepted");
                PollOutcome::Uploaded(item)
            }
            Err(AgentError::Forbidden(detail)) => {
                self.stats.write().uploads_rejected += 1;
                info!(%detail, "Relay disarmed, upload ignored");
                PollOutcome::Rejected
            }
            Err(e) => {
                self.stats.write().uploads_failed += 1;
                self.record_error(&e);
                warn!(error = %e, "Upload failed");
                PollOutcome::Failed
            }
        }
    }

    /// Handles one push event.
    pub async fn handle_event(&self, event: PushEvent) {
        match event {
            PushEvent::NewClip(item) => self.apply_clip(item).await,
            other => {
                if let Some(armed) = other.armed_indicator() {
                    self.armed.store(armed, Ordering::SeqCst);
                    info!(armed, "Relay state changed");
                }
            }
        }
    }

    /// Applies a remote clip with the poll unit suppressed.
    ///
    /// Suppression is released after `settle_delay` even if the clip could
    /// not be fetched or written.
    async fn apply_clip(&self, item: ClipItem) {
        info!(clip_id = %item.id, kind = %item.kind, "Applying remote clip");
        self.state.suppress();

        let result = match self.resolve(&item).await {
            Ok(snapshot) => self.sampler.apply(&snapshot),
            Err(e) => Err(e),
        };

        match result {
            Ok(applied) => {
                self.state.record_applied(applied);
                self.stats.write().clips_applied += 1;
                debug!(clip_id = %item.id, "Remote clip applied");
            }
            Err(e) => {
                self.stats.write().apply_failures += 1;
                self.record_error(&e);
                warn!(clip_id = %item.id, error = %e, "Failed to apply remote clip, skipping");
            }
        }

        tokio::time::sleep(self.config.settle_delay).await;
        self.state.release();
    }

    /// Turns a clip into clipboard content, downloading image blobs.
    async fn resolve(&self, item: &ClipItem) -> AgentResult<Snapshot> {
        match item.kind {
            ClipKind::Text => Ok(Snapshot::Text(item.content.clone())),
            ClipKind::Image => {
                let name = item
                    .blob_name()
                    .ok_or_else(|| AgentError::Protocol("image clip without blob".into()))?;
                let png = self.transport.fetch_blob(name).await?;
                Ok(Snapshot::Image(png))
            }
        }
    }

    /// Fetches the relay status and refreshes the cached armed indicator.
    pub async fn refresh_status(&self) -> AgentResult<StatusResponse> {
        let status = self.transport.status().await?;
        self.armed.store(status.armed, Ordering::SeqCst);
        Ok(status)
    }

    /// Runs the poll unit forever.
    pub async fn run_poll_loop(&self) {
        let period = self.config.poll_interval.max(MIN_POLL_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        info!(interval = ?period, "Clipboard monitor started");
        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    /// Runs the push-listener unit forever, reconnecting after every loss.
    pub async fn run_listener(&self) {
        loop {
            match self.push.connect().await {
                Ok(mut events) => {
                    self.connected.store(true, Ordering::SeqCst);
                    info!("Push channel connected");

                    if let Err(e) = self.refresh_status().await {
                        debug!(error = %e, "Could not refresh relay status");
                    }

                    while let Some(event) = events.next().await {
                        match event {
                            Ok(event) => self.handle_event(event).await,
                            Err(AgentError::Protocol(e)) => {
                                warn!(error = %e, "Ignoring undecodable push event");
                            }
                            Err(e) => {
                                if matches!(e, AgentError::Unauthorized(_)) {
                                    error!(error = %e, "Relay rejected the shared secret");
                                } else {
                                    warn!(error = %e, "Push channel error");
                                }
                                self.record_error(&e);
                                break;
                            }
                        }
                    }

                    self.connected.store(false, Ordering::SeqCst);
                    info!("Push channel disconnected");
                }
                Err(e) => {
                    self.record_error(&e);
                    warn!(error = %e, "Push channel connect failed");
                }
            }

            self.stats.write().reconnects += 1;
            tokio::time::sleep(self.config.reconnect_backoff).await;
        }
    }

    /// Runs both units on the current task until cancelled.
    pub async fn run(&self) {
        tokio::join!(self.run_poll_loop(), self.run_listener());
    }
}

impl<T, P, C> SyncAgent<T, P, C>
where
    T: RelayTransport + 'static,
    P: PushChannel + 'static,
    C: ClipboardProvider + 'static,
{
    /// Spawns both units as separate tasks, so a slow call in one never
    /// delays the other.
    pub fn spawn(self: &Arc<Self>) -> AgentHandle {
        let poller = Arc::clone(self);
        let listener = Arc::clone(self);
        AgentHandle {
            poll: tokio::spawn(async move { poller.run_poll_loop().await }),
            listener: tokio::spawn(async move { listener.run_listener().await }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::MockPushChannel;
    use crate::sampler::MemoryClipboard;
    use crate::transport::MockTransport;
    use std::time::Duration;
    use uuid::Uuid;

    type TestAgent = SyncAgent<MockTransport, MockPushChannel, Arc<MemoryClipboard>>;

    fn create_agent(clipboard: &Arc<MemoryClipboard>) -> Arc<TestAgent> {
        let config = AgentConfig::new("http://relay.test", "secret");
        Arc::new(SyncAgent::new(
            config,
            MockTransport::new(),
            MockPushChannel::new(),
            Arc::clone(clipboard),
        ))
    }

    #[tokio::test]
    async fn baseline_is_not_uploaded() {
        let clipboard = Arc::new(MemoryClipboard::new());
        clipboard.set_text("already here");
        let agent = create_agent(&clipboard);

        assert_eq!(agent.poll_once().await, PollOutcome::Unchanged);
        assert!(agent.transport().uploads().is_empty());
    }

    #[tokio::test]
    async fn local_change_is_uploaded_when_armed() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let agent = create_agent(&clipboard);
        agent.transport().set_armed(true);

        clipboard.set_text("hello");
        let outcome = agent.poll_once().await;

        match outcome {
            PollOutcome::Uploaded(item) => assert_eq!(item.content, "hello"),
            other => panic!("expected upload, got {other:?}"),
        }
        assert_eq!(agent.stats().uploads_accepted, 1);
        assert_eq!(agent.poll_once().await, PollOutcome::Unchanged);
    }

    #[tokio::test]
    async fn rejected_upload_is_not_retried() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let agent = create_agent(&clipboard);

        clipboard.set_text("hello");
        assert_eq!(agent.poll_once().await, PollOutcome::Rejected);
        assert_eq!(agent.poll_once().await, PollOutcome::Unchanged);

        assert_eq!(agent.transport().uploads().len(), 1);
        assert_eq!(agent.stats().uploads_rejected, 1);
    }

    #[tokio::test]
    async fn failed_upload_keeps_polling() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let agent = create_agent(&clipboard);
        agent.transport().set_connected(false);

        clipboard.set_text("hello");
        assert_eq!(agent.poll_once().await, PollOutcome::Failed);
        assert_eq!(agent.stats().uploads_failed, 1);
        assert!(agent.stats().last_error.is_some());

        clipboard.set_text("again");
        agent.transport().set_connected(true);
        agent.transport().set_armed(true);
        assert!(matches!(agent.poll_once().await, PollOutcome::Uploaded(_)));
    }

    #[tokio::test]
    async fn clear_is_not_uploaded() {
        let clipboard = Arc::new(MemoryClipboard::new());
        clipboard.set_text("hello");
        let agent = create_agent(&clipboard);
        agent.transport().set_armed(true);

        clipboard.clear();
        assert_eq!(agent.poll_once().await, PollOutcome::Cleared);
        assert!(agent.transport().uploads().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn remote_clip_is_not_echoed() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let agent = create_agent(&clipboard);
        agent.transport().set_armed(true);

        let applier = Arc::clone(&agent);
        let apply = tokio::spawn(async move {
            applier
                .handle_event(PushEvent::NewClip(ClipItem::text("x")))
                .await;
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(clipboard.text().as_deref(), Some("x"));
        assert_eq!(agent.poll_once().await, PollOutcome::Suppressed);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(agent.poll_once().await, PollOutcome::Unchanged);
        assert_eq!(agent.state().last_known(), Some(Snapshot::Text("x".into())));

        apply.await.unwrap();
        assert!(agent.transport().uploads().is_empty());
        assert_eq!(agent.stats().clips_applied, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_image_is_downloaded_and_applied() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let agent = create_agent(&clipboard);

        let id = Uuid::new_v4();
        let name = format!("{id}.png");
        agent.transport().insert_blob(name.clone(), vec![7, 7, 7]);

        agent
            .handle_event(PushEvent::NewClip(ClipItem::image(id, name)))
            .await;

        assert_eq!(clipboard.image(), Some(vec![7, 7, 7]));
        assert!(!agent.state().is_suppressed());
        assert_eq!(agent.poll_once().await, PollOutcome::Unchanged);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_download_skips_clip_and_releases() {
        let clipboard = Arc::new(MemoryClipboard::new());
        clipboard.set_text("local");
        let agent = create_agent(&clipboard);

        let id = Uuid::new_v4();
        agent
            .handle_event(PushEvent::NewClip(ClipItem::image(id, format!("{id}.png"))))
            .await;

        assert_eq!(clipboard.text().as_deref(), Some("local"));
        assert!(!agent.state().is_suppressed());
        assert_eq!(agent.stats().apply_failures, 1);
        assert_eq!(agent.stats().clips_applied, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_poll_interval_still_polls() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let mut config = AgentConfig::new("http://relay.test", "secret");
        config.poll_interval = Duration::ZERO;
        let agent = Arc::new(SyncAgent::new(
            config,
            MockTransport::new(),
            MockPushChannel::new(),
            Arc::clone(&clipboard),
        ));
        agent.transport().set_armed(true);

        let poller = Arc::clone(&agent);
        let poll = tokio::spawn(async move { poller.run_poll_loop().await });

        clipboard.set_text("tick");
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!poll.is_finished());
        assert_eq!(agent.stats().uploads_accepted, 1);
        poll.abort();
    }

    #[tokio::test]
    async fn arm_events_update_indicator() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let agent = create_agent(&clipboard);
        assert!(!agent.is_armed());

        agent.handle_event(PushEvent::SystemArmed).await;
        assert!(agent.is_armed());
        assert!(clipboard.text().is_none());

        agent.handle_event(PushEvent::SystemDisarmed).await;
        assert!(!agent.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn listener_reconnects_after_loss() {
        let clipboard = Arc::new(MemoryClipboard::new());
        let push = MockPushChannel::new();
        push.push_connection(vec![PushEvent::SystemArmed]);
        push.push_connection(vec![PushEvent::NewClip(ClipItem::text("second"))]);
        let agent = Arc::new(SyncAgent::new(
            AgentConfig::new("http://relay.test", "secret"),
            MockTransport::new(),
            push,
            Arc::clone(&clipboard),
        ));

        let handle = agent.spawn();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(clipboard.text().as_deref(), Some("second"));
        assert!(agent.stats().reconnects >= 2);
        assert!(!agent.is_connected());
        handle.abort();
    }
}
