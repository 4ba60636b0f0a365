//! # CrossClip Protocol
//!
//! Wire types shared by the CrossClip relay server and its sync agents.
//!
//! This crate provides:
//! - [`ClipItem`] and [`ClipKind`], the unit of synchronized clipboard content
//! - [`PushEvent`], the tagged events pushed to every connected agent
//! - Response bodies for the HTTP surface
//! - JSON encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clip;
mod error;
mod event;
mod messages;

pub use clip::{ClipItem, ClipKind};
pub use error::{ProtocolError, ProtocolResult};
pub use event::PushEvent;
pub use messages::{ErrorResponse, MessageResponse, StatusResponse, UploadResponse};

/// Header carrying the shared secret on every HTTP request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter carrying the shared secret on the push-channel handshake.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Path of the push channel.
pub const PUSH_CHANNEL_PATH: &str = "/ws";

/// Close code sent when a push-channel handshake carries a bad secret (policy violation).
pub const POLICY_VIOLATION_CLOSE_CODE: u16 = 1008;

/// Default number of clips retained by the relay.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Extension used for image blobs when the uploader gives none.
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";
