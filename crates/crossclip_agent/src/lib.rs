//! # CrossClip Agent
//!
//! Per-device clipboard sync agent for the CrossClip relay.
//!
//! This crate provides:
//! - Clipboard sampling with image-over-text priority ([`ClipboardSampler`])
//! - Change detection and echo suppression ([`AgentState`])
//! - HTTP transport to the relay ([`HttpTransport`])
//! - Push-channel listener over WebSocket ([`WebSocketChannel`])
//! - The agent itself, running a poll unit and a push-listener unit ([`SyncAgent`])
//!
//! ## Echo suppression
//!
//! Applying a remote clip writes the local clipboard, which the poll unit
//! would otherwise pick up as a local change and upload again. While a clip
//! is being applied the poll unit is suppressed; once applied, the agent
//! records the clip as the last known content and keeps suppression for a
//! settle delay before releasing it.
//!
//! ## Key Invariants
//!
//! - Clipboard clears are never uploaded
//! - The last known content is updated before an upload is sent
//! - Rejected uploads are dropped, never retried or queued
//! - The push listener reconnects forever

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod agent;
mod config;
mod error;
mod http;
mod push;
mod sampler;
mod state;
#[cfg(feature = "system-clipboard")]
mod system;
mod transport;

pub use agent::{AgentHandle, AgentStats, PollOutcome, SyncAgent};
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use http::HttpTransport;
pub use push::{EventStream, MockPushChannel, PushChannel, WebSocketChannel};
pub use sampler::{ClipboardProvider, ClipboardSampler, MemoryClipboard, Snapshot};
pub use state::{AgentState, Change};
#[cfg(feature = "system-clipboard")]
pub use system::SystemClipboard;
pub use transport::{MockTransport, RelayTransport};
