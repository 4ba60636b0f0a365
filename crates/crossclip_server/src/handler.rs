//! Request handlers for relay operations.

use crate::arm::ArmState;
use crate::blobs::{blob_file_name, BlobStore};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::history::HistoryStore;
use crate::registry::ClientRegistry;
use bytes::Bytes;
use crossclip_protocol::{ClipItem, ClipKind, PushEvent, StatusResponse};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// An image file attached to an upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename given by the uploader, used for the blob extension.
    pub filename: Option<String>,
    /// Raw file bytes.
    pub bytes: Bytes,
}

/// A parsed upload request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Declared clip kind.
    pub kind: ClipKind,
    /// Text content, if any.
    pub content: Option<String>,
    /// Attached file, if any.
    pub file: Option<UploadedFile>,
}

impl UploadRequest {
    /// Creates a text upload.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: ClipKind::Text,
            content: Some(content.into()),
            file: None,
        }
    }

    /// Creates an image upload.
    pub fn image(filename: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            kind: ClipKind::Image,
            content: None,
            file: Some(UploadedFile {
                filename,
                bytes: bytes.into(),
            }),
        }
    }

    /// Builds a request from raw form fields.
    ///
    /// Only `type=image` selects the image path; any other or missing value
    /// is treated as text and left to the content check.
    pub fn from_parts(
        kind: Option<&str>,
        content: Option<String>,
        file: Option<UploadedFile>,
    ) -> Self {
        let kind = match kind {
            Some("image") => ClipKind::Image,
            _ => ClipKind::Text,
        };
        Self {
            kind,
            content,
            file,
        }
    }
}

/// State mutated by arm, disarm and upload; each operation holds the lock
/// for its whole duration.
#[derive(Debug)]
struct RelayState {
    arm: ArmState,
    history: HistoryStore,
}

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Blob storage for image clips.
    pub blobs: BlobStore,
    /// Live push-channel sessions.
    pub registry: ClientRegistry,
    relay: Mutex<RelayState>,
}

impl HandlerContext {
    /// Creates a new handler context, opening the blob directory.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let blobs = BlobStore::open(&config.upload_dir)?;
        let registry = ClientRegistry::new(config.session_buffer);
        let relay = Mutex::new(RelayState {
            arm: ArmState::new(),
            history: HistoryStore::new(config.history_capacity),
        });

        Ok(Self {
            config,
            blobs,
            registry,
            relay,
        })
    }
}

/// Handler for relay requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles a status request.
    pub fn handle_status(&self) -> StatusResponse {
        let relay = self.context.relay.lock();
        StatusResponse {
            armed: relay.arm.is_armed(),
            item_count: relay.history.count(),
            connected_clients: self.context.registry.size(),
        }
    }

    /// Handles an arm request.
    pub fn handle_arm(&self) {
        let mut relay = self.context.relay.lock();
        let event = relay.arm.arm();
        let report = self.context.registry.broadcast(&event);
        info!(notified = report.delivered, "Relay armed");
    }

    /// Handles a disarm request.
    pub fn handle_disarm(&self) {
        let mut relay = self.context.relay.lock();
        let event = relay.arm.disarm();
        let report = self.context.registry.broadcast(&event);
        info!(notified = report.delivered, "Relay disarmed");
    }

    /// Handles an upload request.
    ///
    /// Rejected with `Forbidden` while disarmed, leaving all state untouched.
    /// Otherwise the clip is stored, the oldest clip evicted past capacity,
    /// the relay disarmed, and `system_disarmed` + `new_clip` pushed to every
    /// session in that order.
    pub fn handle_upload(&self, request: UploadRequest) -> ServerResult<ClipItem> {
        let mut relay = self.context.relay.lock();

        if !relay.arm.is_armed() {
            return Err(ServerError::Forbidden(
                "System is DISARMED. Please ARM to sync.".into(),
            ));
        }

        let id = Uuid::new_v4();
        let item = match (request.kind, request.file, request.content) {
            (ClipKind::Image, Some(file), _) => {
                let name = blob_file_name(&id, file.filename.as_deref());
                self.context.blobs.put(&name, &file.bytes)?;
                ClipItem::image(id, name)
            }
            (_, _, Some(content)) if !content.is_empty() => {
                ClipItem::new(id, ClipKind::Text, content)
            }
            _ => return Err(ServerError::BadRequest("No content provided".into())),
        };

        if let Some(evicted) = relay.history.append(item.clone()) {
            self.delete_evicted_blob(&evicted);
        }

        let disarmed = relay.arm.consume_one_shot();
        let report = self
            .context
            .registry
            .broadcast_all(&[disarmed, PushEvent::NewClip(item.clone())]);

        info!(
            clip_id = %item.id,
            kind = %item.kind,
            notified = report.delivered,
            "Clip accepted, relay disarmed"
        );

        Ok(item)
    }

    /// Handles a latest-clip request.
    pub fn handle_latest(&self) -> ServerResult<ClipItem> {
        self.context
            .relay
            .lock()
            .history
            .latest()
            .cloned()
            .ok_or_else(|| ServerError::NotFound("Empty history".into()))
    }

    /// Handles a blob read.
    pub fn handle_blob(&self, name: &str) -> ServerResult<Bytes> {
        self.context.blobs.read(name).map(Bytes::from)
    }

    fn delete_evicted_blob(&self, evicted: &ClipItem) {
        let Some(name) = evicted.blob_name() else {
            return;
        };
        match self.context.blobs.delete(name) {
            Ok(_) => info!(clip_id = %evicted.id, blob = name, "Evicted blob deleted"),
            Err(e) => warn!(clip_id = %evicted.id, blob = name, error = %e, "Failed to delete evicted blob"),
        }
    }
}
