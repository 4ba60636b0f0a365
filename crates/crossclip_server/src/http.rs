//! HTTP and push-channel endpoints.

use crate::config::{ServerConfig, MIN_PING_INTERVAL};
use crate::error::{ServerError, ServerResult};
use crate::handler::{UploadRequest, UploadedFile};
use crate::server::SyncServer;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use crossclip_protocol::{
    ClipItem, MessageResponse, StatusResponse, UploadResponse, API_KEY_HEADER,
    POLICY_VIOLATION_CLOSE_CODE, PUSH_CHANNEL_PATH,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

/// Largest accepted upload body.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

type SharedServer = Arc<SyncServer>;

/// Builds the relay router.
///
/// Every route except the push channel requires the `x-api-key` header; the
/// push channel takes the secret in its `token` query parameter instead.
pub fn router(server: SharedServer) -> Router {
    let api = Router::new()
        .route("/status", get(status))
        .route("/arm", post(arm))
        .route("/disarm", post(disarm))
        .route("/upload", post(upload))
        .route("/latest", get(latest))
        .route("/uploads/:name", get(blob))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&server),
            require_secret,
        ));

    Router::new()
        .merge(api)
        .route(PUSH_CHANNEL_PATH, get(push_channel))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(server)
}

/// Creates a relay from `config` and serves it on `config.bind_addr` until
/// the process exits.
pub async fn serve(config: ServerConfig) -> ServerResult<()> {
    let bind_addr = config.bind_addr;
    let server = Arc::new(SyncServer::new(config)?);
    let listener = TcpListener::bind(bind_addr).await?;
    serve_with_listener(listener, server).await
}

/// Serves an existing relay on an already bound listener.
pub async fn serve_with_listener(listener: TcpListener, server: SharedServer) -> ServerResult<()> {
    info!(addr = %listener.local_addr()?, "Relay listening");
    axum::serve(listener, router(server)).await?;
    Ok(())
}

async fn require_secret(
    State(server): State<SharedServer>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = server.authorize(presented) {
        debug!(path = %request.uri().path(), "Rejected request without valid secret");
        return Err(e);
    }

    Ok(next.run(request).await)
}

async fn status(State(server): State<SharedServer>) -> Json<StatusResponse> {
    Json(server.status())
}

async fn arm(State(server): State<SharedServer>) -> Json<MessageResponse> {
    server.arm();
    Json(MessageResponse::new("System ARMED."))
}

async fn disarm(State(server): State<SharedServer>) -> Json<MessageResponse> {
    server.disarm();
    Json(MessageResponse::new("System DISARMED."))
}

async fn upload(
    State(server): State<SharedServer>,
    request: Request,
) -> ServerResult<Json<UploadResponse>> {
    let upload = parse_upload(request).await?;
    let item = run_blocking(move || server.upload(upload)).await?;
    Ok(Json(UploadResponse::new(item)))
}

async fn latest(State(server): State<SharedServer>) -> ServerResult<Json<ClipItem>> {
    server.latest().map(Json)
}

async fn blob(
    State(server): State<SharedServer>,
    Path(name): Path<String>,
) -> ServerResult<Response> {
    let content_type = content_type_for(&name);
    let bytes = run_blocking(move || server.blob(&name)).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Form fields of an url-encoded upload.
#[derive(Debug, Deserialize)]
struct UploadForm {
    #[serde(rename = "type")]
    kind: Option<String>,
    content: Option<String>,
}

/// Reads the upload fields. A body that is neither multipart nor an
/// url-encoded form carries no fields; the handler decides what that means,
/// so the armed check still runs first.
async fn parse_upload(request: Request) -> ServerResult<UploadRequest> {
    let content_type = content_type(request.headers()).map(str::to_owned);
    match content_type.as_deref() {
        Some(value) if value.starts_with("multipart/form-data") => {
            let multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| ServerError::BadRequest(e.body_text()))?;
            parse_multipart(multipart).await
        }
        Some(value) if value.starts_with("application/x-www-form-urlencoded") => {
            let Form(form) = Form::<UploadForm>::from_request(request, &())
                .await
                .map_err(|e| ServerError::BadRequest(e.body_text()))?;
            Ok(UploadRequest::from_parts(
                form.kind.as_deref(),
                form.content,
                None,
            ))
        }
        other => {
            debug!(content_type = ?other, "Upload without form fields");
            Ok(UploadRequest::from_parts(None, None, None))
        }
    }
}

async fn parse_multipart(mut multipart: Multipart) -> ServerResult<UploadRequest> {
    let mut kind = None;
    let mut content = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "type" => kind = Some(field.text().await.map_err(bad_multipart)?),
            "content" => content = Some(field.text().await.map_err(bad_multipart)?),
            "file" => {
                let filename = field.file_name().map(str::to_owned);
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                file = Some(UploadedFile { filename, bytes });
            }
            other => debug!(field = other, "Ignoring unknown upload field"),
        }
    }

    Ok(UploadRequest::from_parts(kind.as_deref(), content, file))
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> ServerError {
    ServerError::BadRequest(e.body_text())
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Runs blocking filesystem work off the async workers.
async fn run_blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
}

#[derive(Debug, Deserialize)]
struct PushQuery {
    token: Option<String>,
}

async fn push_channel(
    ws: WebSocketUpgrade,
    State(server): State<SharedServer>,
    Query(query): Query<PushQuery>,
) -> Response {
    if let Err(e) = server.authorize(query.token.as_deref()) {
        warn!(error = %e, "Rejected push channel handshake");
        return ws.on_upgrade(reject_socket);
    }

    ws.on_upgrade(move |socket| run_session(socket, server))
}

async fn reject_socket(mut socket: WebSocket) {
    let frame = CloseFrame {
        code: POLICY_VIOLATION_CLOSE_CODE,
        reason: Cow::from("Invalid token"),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "Failed to send policy violation close");
    }
}

/// Forwards registry events to one socket until either side goes away.
async fn run_session(socket: WebSocket, server: SharedServer) {
    let mut session = server.connect_session();
    let session_id = session.id();
    let ping_interval = server.config().ping_interval.max(MIN_PING_INTERVAL);
    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                event = session.recv() => {
                    // None once the registry dropped this session
                    let Some(event) = event else { break };
                    let text = match event.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            error!(session_id, error = %e, "Failed to encode push event");
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        debug!(session_id, error = %e, "Push send failed");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if sink.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(session_id, error = %e, "Push channel read failed");
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    writer.abort();
    server.disconnect_session(session_id);
}
