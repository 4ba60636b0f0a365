//! Main relay server.

use crate::auth::SecretValidator;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler, UploadRequest};
use crate::registry::{Session, SessionId};
use bytes::Bytes;
use crossclip_protocol::{ClipItem, StatusResponse};
use std::sync::Arc;
use tracing::info;

/// The relay server.
///
/// Owns the arm gate, the clip history, the blob directory and the push
/// session registry. Transport-agnostic: the axum layer in [`crate::router`]
/// authenticates requests and forwards them here.
///
/// # Example
///
/// ```
/// use crossclip_server::{ServerConfig, SyncServer, UploadRequest};
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = ServerConfig::new("secret").with_upload_dir(dir.path());
/// let server = SyncServer::new(config).unwrap();
///
/// server.arm();
/// let item = server.upload(UploadRequest::text("hello")).unwrap();
/// assert_eq!(server.latest().unwrap(), item);
/// assert!(!server.status().armed);
/// ```
pub struct SyncServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
    validator: SecretValidator,
}

impl SyncServer {
    /// Creates a new relay server.
    ///
    /// # Errors
    ///
    /// Returns `Config` if no secret is configured, or an I/O error if the
    /// blob directory cannot be created.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        if config.secret.is_empty() {
            return Err(ServerError::Config("a shared secret is required".into()));
        }

        let validator = SecretValidator::new(config.secret.clone());
        let context = Arc::new(HandlerContext::new(config)?);
        let handler = RequestHandler::new(Arc::clone(&context));

        info!(
            upload_dir = %context.blobs.path().display(),
            history_capacity = context.config.history_capacity,
            "Relay server initialized"
        );

        Ok(Self {
            handler,
            context,
            validator,
        })
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Checks a presented shared secret.
    pub fn authorize(&self, presented: Option<&str>) -> ServerResult<()> {
        self.validator.validate(presented)
    }

    /// Returns the arm state, history size and live session count.
    pub fn status(&self) -> StatusResponse {
        self.handler.handle_status()
    }

    /// Arms the relay and notifies every session.
    pub fn arm(&self) {
        self.handler.handle_arm();
    }

    /// Disarms the relay and notifies every session.
    pub fn disarm(&self) {
        self.handler.handle_disarm();
    }

    /// Accepts one clip if armed.
    pub fn upload(&self, request: UploadRequest) -> ServerResult<ClipItem> {
        self.handler.handle_upload(request)
    }

    /// Returns the most recent clip.
    pub fn latest(&self) -> ServerResult<ClipItem> {
        self.handler.handle_latest()
    }

    /// Reads an image blob by its stored name.
    pub fn blob(&self, name: &str) -> ServerResult<Bytes> {
        self.handler.handle_blob(name)
    }

    /// Registers a new push session.
    pub fn connect_session(&self) -> Session {
        let session = self.context.registry.register();
        info!(
            session_id = session.id(),
            connected = self.context.registry.size(),
            "Agent connected"
        );
        session
    }

    /// Removes a push session.
    pub fn disconnect_session(&self, id: SessionId) {
        if self.context.registry.unregister(id) {
            info!(
                session_id = id,
                connected = self.context.registry.size(),
                "Agent disconnected"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossclip_protocol::PushEvent;

    fn create_server(dir: &tempfile::TempDir) -> SyncServer {
        SyncServer::new(ServerConfig::new("secret").with_upload_dir(dir.path())).unwrap()
    }

    #[test]
    fn requires_secret() {
        let dir = tempfile::tempdir().unwrap();
        let result = SyncServer::new(ServerConfig::new("").with_upload_dir(dir.path()));
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[test]
    fn authorize_checks_secret() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_server(&dir);
        assert!(server.authorize(Some("secret")).is_ok());
        assert!(server.authorize(Some("nope")).is_err());
        assert!(server.authorize(None).is_err());
    }

    #[test]
    fn session_lifecycle_reflected_in_status() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_server(&dir);

        let mut session = server.connect_session();
        assert_eq!(server.status().connected_clients, 1);

        server.arm();
        assert_eq!(session.try_recv(), Some(PushEvent::SystemArmed));

        server.disconnect_session(session.id());
        assert_eq!(server.status().connected_clients, 0);
    }

    #[test]
    fn disarm_when_already_disarmed_still_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_server(&dir);
        let mut session = server.connect_session();

        server.disarm();
        assert_eq!(session.try_recv(), Some(PushEvent::SystemDisarmed));
        assert!(!server.status().armed);
    }

    #[test]
    fn full_relay_flow() {
        let dir = tempfile::tempdir().unwrap();
        let server = create_server(&dir);
        let mut first = server.connect_session();
        let mut second = server.connect_session();

        // 1. Upload while disarmed is rejected
        assert!(matches!(
            server.upload(UploadRequest::text("early")),
            Err(ServerError::Forbidden(_))
        ));

        // 2. Arm, upload one clip
        server.arm();
        let item = server.upload(UploadRequest::text("hello")).unwrap();

        // 3. Both sessions see armed, disarmed, then the clip
        for session in [&mut first, &mut second] {
            assert_eq!(session.try_recv(), Some(PushEvent::SystemArmed));
            assert_eq!(session.try_recv(), Some(PushEvent::SystemDisarmed));
            assert_eq!(session.try_recv(), Some(PushEvent::NewClip(item.clone())));
        }

        // 4. Relay is disarmed again
        let status = server.status();
        assert!(!status.armed);
        assert_eq!(status.item_count, 1);
    }
}
