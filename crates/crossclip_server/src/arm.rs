//! The arm/disarm security gate.

use crossclip_protocol::PushEvent;

/// Single-writer boolean gate with one-shot semantics.
///
/// The relay starts disarmed. Every transition returns the [`PushEvent`]
/// that must be broadcast to connected agents.
///
/// ```text
/// Disarmed --arm()--------------> Armed
/// Armed    --disarm()-----------> Disarmed
/// Armed    --consume_one_shot()-> Disarmed   (after an accepted upload)
/// ```
#[derive(Debug, Default)]
pub struct ArmState {
    armed: bool,
}

impl ArmState {
    /// Creates a disarmed gate.
    pub fn new() -> Self {
        Self { armed: false }
    }

    /// Returns true if the next upload will be accepted.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Arms the gate.
    pub fn arm(&mut self) -> PushEvent {
        self.armed = true;
        PushEvent::SystemArmed
    }

    /// Disarms the gate.
    pub fn disarm(&mut self) -> PushEvent {
        self.armed = false;
        PushEvent::SystemDisarmed
    }

    /// Disarms the gate after an accepted upload.
    ///
    /// Observers cannot distinguish this from an explicit [`ArmState::disarm`].
    pub fn consume_one_shot(&mut self) -> PushEvent {
        self.disarm()
    }
}
