//! # CrossClip Server
//!
//! Clipboard relay for CrossClip.
//!
//! This crate provides:
//! - The arm/disarm gate with one-shot auto-disarm ([`ArmState`])
//! - Bounded clip history with blob eviction ([`HistoryStore`], [`BlobStore`])
//! - Push-channel session registry and fan-out ([`ClientRegistry`])
//! - HTTP and WebSocket endpoints built on axum ([`router`], [`serve`])
//!
//! # Protocol
//!
//! A device arms the relay, uploads exactly one clip, and the relay:
//! 1. Stores the clip (evicting the oldest one past capacity)
//! 2. Disarms itself
//! 3. Pushes `system_disarmed` then `new_clip` to every connected agent
//!
//! Every further upload is rejected with `403` until the relay is armed again.
//!
//! # Example
//!
//! ```rust,ignore
//! use crossclip_server::{serve, ServerConfig};
//!
//! let config = ServerConfig::new("shared-secret").with_upload_dir("/tmp/crossclip");
//! serve(config).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod arm;
mod auth;
mod blobs;
mod config;
mod error;
mod handler;
mod history;
mod http;
mod registry;
mod server;

pub use arm::ArmState;
pub use auth::SecretValidator;
pub use blobs::{blob_file_name, BlobStore};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler, UploadRequest, UploadedFile};
pub use history::HistoryStore;
pub use http::{router, serve, serve_with_listener};
pub use registry::{BroadcastReport, ClientRegistry, Session, SessionId};
pub use server::SyncServer;
