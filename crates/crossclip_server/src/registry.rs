//! Push-channel session registry and fan-out.

use crossclip_protocol::PushEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Identifier of one push-channel session.
pub type SessionId = u64;

/// The receiving half of a registered session.
///
/// The transport task owning the socket drains it. Dropping it makes the
/// next broadcast fail for this session, which removes it from the registry.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    events: mpsc::Receiver<PushEvent>,
}

impl Session {
    /// Returns the session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Waits for the next event. Returns `None` once the session was removed.
    pub async fn recv(&mut self) -> Option<PushEvent> {
        self.events.recv().await
    }

    /// Returns the next event if one is buffered.
    pub fn try_recv(&mut self) -> Option<PushEvent> {
        self.events.try_recv().ok()
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions that accepted every event.
    pub delivered: usize,
    /// Sessions removed because delivery failed.
    pub pruned: Vec<SessionId>,
}

/// Tracks live push-channel sessions and fans events out to them.
///
/// Delivery is best-effort: a session whose buffer is closed or full is
/// removed, and the remaining sessions still receive the event.
#[derive(Debug)]
pub struct ClientRegistry {
    sessions: RwLock<HashMap<SessionId, mpsc::Sender<PushEvent>>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl ClientRegistry {
    /// Creates an empty registry whose sessions buffer up to `buffer` events.
    pub fn new(buffer: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Registers a new session.
    pub fn register(&self) -> Session {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, events) = mpsc::channel(self.buffer);
        self.sessions.write().insert(id, sender);
        debug!(session_id = id, "Session registered");
        Session { id, events }
    }

    /// Removes a session. Returns `false` if it was already gone.
    pub fn unregister(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().remove(&id).is_some();
        if removed {
            debug!(session_id = id, "Session unregistered");
        }
        removed
    }

    /// Delivers one event to every session.
    pub fn broadcast(&self, event: &PushEvent) -> BroadcastReport {
        self.broadcast_all(std::slice::from_ref(event))
    }

    /// Delivers an ordered batch of events to every session.
    ///
    /// Each session receives the whole batch in order before the next session
    /// is served. Sessions that fail are pruned after the iteration.
    pub fn broadcast_all(&self, events: &[PushEvent]) -> BroadcastReport {
        let snapshot: Vec<(SessionId, mpsc::Sender<PushEvent>)> = self
            .sessions
            .read()
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect();

        let mut report = BroadcastReport::default();

        for (id, sender) in snapshot {
            let failure = events
                .iter()
                .find_map(|event| sender.try_send(event.clone()).err());

            match failure {
                None => report.delivered += 1,
                Some(TrySendError::Closed(_)) => {
                    debug!(session_id = id, "Session closed, pruning");
                    report.pruned.push(id);
                }
                Some(TrySendError::Full(_)) => {
                    warn!(session_id = id, "Session buffer full, pruning");
                    report.pruned.push(id);
                }
            }
        }

        if !report.pruned.is_empty() {
            let mut sessions = self.sessions.write();
            for id in &report.pruned {
                sessions.remove(id);
            }
        }

        report
    }

    /// Returns the number of live sessions.
    pub fn size(&self) -> usize {
        self.sessions.read().len()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(32)
    }
}
