//! Clip items exchanged between the relay and its agents.

use crate::error::{ProtocolError, ProtocolResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The kind of content a clip carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    /// UTF-8 text, carried inline.
    Text,
    /// Image bytes, carried by reference to a stored blob.
    Image,
}

impl ClipKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipKind::Text => "text",
            ClipKind::Image => "image",
        }
    }
}

impl fmt::Display for ClipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClipKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        match s {
            "text" => Ok(ClipKind::Text),
            "image" => Ok(ClipKind::Image),
            other => Err(ProtocolError::UnknownKind(other.to_string())),
        }
    }
}

/// One synchronized clipboard payload.
///
/// Immutable once created; identity is [`ClipItem::id`]. For [`ClipKind::Text`]
/// `content` is the text itself, for [`ClipKind::Image`] it is the name of the
/// stored blob (`<id>.<ext>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipItem {
    /// Unique identifier.
    pub id: Uuid,
    /// Content kind.
    #[serde(rename = "type")]
    pub kind: ClipKind,
    /// Text content or blob name.
    pub content: String,
    /// Creation time on the relay.
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl ClipItem {
    /// Creates a clip with the given id, stamped with the current time.
    pub fn new(id: Uuid, kind: ClipKind, content: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Creates a text clip with a fresh id.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4(), ClipKind::Text, content)
    }

    /// Creates an image clip referencing an already stored blob.
    pub fn image(id: Uuid, blob_name: impl Into<String>) -> Self {
        Self::new(id, ClipKind::Image, blob_name)
    }

    /// Returns the blob name if this clip is backed by a stored blob.
    pub fn blob_name(&self) -> Option<&str> {
        match self.kind {
            ClipKind::Image => Some(&self.content),
            ClipKind::Text => None,
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
    fn kind_parsing() {
        assert_eq!("text".parse::<ClipKind>().unwrap(), ClipKind::Text);
        assert_eq!("image".parse::<ClipKind>().unwrap(), ClipKind::Image);
        assert!(matches!(
            "video".parse::<ClipKind>(),
            Err(ProtocolError::UnknownKind(_))
        ));
    }

    #[test]
    fn wire_field_names() {
        let item = ClipItem::text("hello");
        let value: serde_json::Value = serde_json::from_str(&item.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "text");
        assert_eq!(value["content"], "hello");
        assert_eq!(value["id"], item.id.to_string());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn decode_from_relay_json() {
        let json = r#"{
            "id": "4b0c7d3e-9a55-4a0a-8f61-2f0e8f4f1c11",
            "type": "image",
            "content": "4b0c7d3e-9a55-4a0a-8f61-2f0e8f4f1c11.png",
            "timestamp": "2024-05-01T10:00:00Z"
        }"#;

        let item = ClipItem::from_json(json).unwrap();
        assert_eq!(item.kind, ClipKind::Image);
        assert_eq!(
            item.blob_name(),
            Some("4b0c7d3e-9a55-4a0a-8f61-2f0e8f4f1c11.png")
        );
    }

    #[test]
    fn text_has_no_blob() {
        assert_eq!(ClipItem::text("x").blob_name(), None);
    }
}
