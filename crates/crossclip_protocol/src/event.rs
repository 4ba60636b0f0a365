//! Events pushed from the relay to connected agents.

use crate::clip::ClipItem;
use crate::error::ProtocolResult;
use serde::{Deserialize, Serialize};

/// A push-channel event.
///
/// Serialized as `{"event": "new_clip", "data": {..}}`,
/// `{"event": "system_armed"}` or `{"event": "system_disarmed"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    /// A clip was accepted by the relay.
    NewClip(ClipItem),
    /// The relay was armed.
    SystemArmed,
    /// The relay was disarmed, explicitly or by the one-shot rule.
    SystemDisarmed,
}

impl PushEvent {
    /// Returns the armed indicator this event implies, if any.
    pub fn armed_indicator(&self) -> Option<bool> {
        match self {
            PushEvent::SystemArmed => Some(true),
            PushEvent::SystemDisarmed => Some(false),
            PushEvent::NewClip(_) => None,
        }
    }

    /// Returns the event name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::NewClip(_) => "new_clip",
            PushEvent::SystemArmed => "system_armed",
            PushEvent::SystemDisarmed => "system_disarmed",
        }
    }

    /// Encodes to JSON.
    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes from JSON.
    pub fn from_json(json: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_events_have_no_data() {
        assert_eq!(
            PushEvent::SystemArmed.to_json().unwrap(),
            r#"{"event":"system_armed"}"#
        );
        assert_eq!(
            PushEvent::SystemDisarmed.to_json().unwrap(),
            r#"{"event":"system_disarmed"}"#
        );
    }

    #[test]
    fn new_clip_carries_item() {
        let item = ClipItem::text("hello");
        let json = PushEvent::NewClip(item.clone()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["event"], "new_clip");
        assert_eq!(value["data"]["content"], "hello");
        assert_eq!(PushEvent::from_json(&json).unwrap(), PushEvent::NewClip(item));
    }

    #[test]
    fn decode_bare_event() {
        let event = PushEvent::from_json(r#"{"event":"system_disarmed"}"#).unwrap();
        assert_eq!(event, PushEvent::SystemDisarmed);
        assert_eq!(event.armed_indicator(), Some(false));
    }

    #[test]
    fn reject_unknown_event() {
        assert!(PushEvent::from_json(r#"{"event":"reboot"}"#).is_err());
    }
}
