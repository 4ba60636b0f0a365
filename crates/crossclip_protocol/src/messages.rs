//! Response bodies for the relay's HTTP surface.

use crate::clip::ClipItem;
use serde::{Deserialize, Serialize};

/// Body of `GET /status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whether the relay accepts the next upload.
    pub armed: bool,
    /// Number of clips in history.
    pub item_count: usize,
    /// Number of live push-channel sessions.
    pub connected_clients: usize,
}

/// Body of `POST /arm` and `POST /disarm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a successful `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Human-readable outcome.
    pub message: String,
    /// The created clip.
    pub item: ClipItem,
}

impl UploadResponse {
    /// Wraps a freshly created clip.
    pub fn new(item: ClipItem) -> Self {
        Self {
            message: "Upload successful".into(),
            item,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error description.
    pub detail: String,
}
