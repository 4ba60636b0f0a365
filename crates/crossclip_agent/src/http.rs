//! HTTP transport implementation.
//!
//! Talks to the relay's request/response endpoints with `reqwest`. Every
//! request carries the shared secret in the `x-api-key` header. Non-success
//! statuses are mapped to [`AgentError`] variants using the relay's
//! `{"detail": ...}` error body.

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::sampler::Snapshot;
use crate::transport::RelayTransport;
use async_trait::async_trait;
use crossclip_protocol::{
    ClipItem, ErrorResponse, MessageResponse, StatusResponse, UploadResponse, API_KEY_HEADER,
};
use parking_lot::RwLock;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

/// Filename sent with image uploads.
const IMAGE_UPLOAD_NAME: &str = "clipboard.png";

/// HTTP-based relay transport.
pub struct HttpTransport {
    /// Base URL of the relay, ending with `/`.
    base_url: Url,
    /// Shared secret.
    secret: String,
    /// HTTP client.
    client: Client,
    /// Last error message.
    last_error: RwLock<Option<String>>,
}

impl HttpTransport {
    /// Creates a new HTTP transport.
    pub fn new(config: &AgentConfig) -> AgentResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AgentError::transport_fatal(format!("failed to build client: {e}")))?;

        Ok(Self {
            base_url: config.base_url()?,
            secret: config.secret.clone(),
            client,
            last_error: RwLock::new(None),
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn endpoint(&self, path: &str) -> AgentResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AgentError::InvalidConfig(format!("bad endpoint {path}: {e}")))
    }

    /// Sends a request with the secret attached and checks its status.
    async fn send(&self, request: RequestBuilder) -> AgentResult<Response> {
        let result = async {
            let response = request
                .header(API_KEY_HEADER, &self.secret)
                .send()
                .await
                .map_err(transport_error)?;
            check_status(response).await
        }
        .await;

        match &result {
            Ok(_) => *self.last_error.write() = None,
            Err(e) => *self.last_error.write() = Some(e.to_string()),
        }
        result
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AgentResult<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| AgentError::Protocol(format!("invalid response body: {e}")))
    }
}

fn transport_error(e: reqwest::Error) -> AgentError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        AgentError::transport_retryable(e.to_string())
    } else {
        AgentError::transport_fatal(e.to_string())
    }
}

async fn check_status(response: Response) -> AgentResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = match response.json::<ErrorResponse>().await {
        Ok(body) => body.detail,
        Err(_) => status.to_string(),
    };
    Err(AgentError::from_status(status.as_u16(), detail))
}

#[async_trait]
impl RelayTransport for HttpTransport {
    async fn status(&self) -> AgentResult<StatusResponse> {
        let url = self.endpoint("status")?;
        self.send_json(self.client.get(url)).await
    }

    async fn arm(&self) -> AgentResult<MessageResponse> {
        let url = self.endpoint("arm")?;
        self.send_json(self.client.post(url)).await
    }

    async fn disarm(&self) -> AgentResult<MessageResponse> {
        let url = self.endpoint("disarm")?;
        self.send_json(self.client.post(url)).await
    }

    async fn upload(&self, snapshot: &Snapshot) -> AgentResult<ClipItem> {
        let url = self.endpoint("upload")?;
        let request = match snapshot {
            Snapshot::Text(text) => self
                .client
                .post(url)
                .form(&[("type", "text"), ("content", text.as_str())]),
            Snapshot::Image(png) => {
                let part = Part::bytes(png.clone())
                    .file_name(IMAGE_UPLOAD_NAME)
                    .mime_str("image/png")
                    .map_err(|e| AgentError::Protocol(e.to_string()))?;
                let form = Form::new().text("type", "image").part("file", part);
                self.client.post(url).multipart(form)
            }
        };

        let response: UploadResponse = self.send_json(request).await?;
        Ok(response.item)
    }

    async fn latest(&self) -> AgentResult<ClipItem> {
        let url = self.endpoint("latest")?;
        self.send_json(self.client.get(url)).await
    }

    async fn fetch_blob(&self, name: &str) -> AgentResult<Vec<u8>> {
        let mut url = self.endpoint("uploads/")?;
        url.path_segments_mut()
            .map_err(|()| AgentError::InvalidConfig("base url cannot have a path".into()))?
            .pop_if_empty()
            .push(name);

        let bytes = self
            .send(self.client.get(url))
            .await?
            .bytes()
            .await
            .map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}
