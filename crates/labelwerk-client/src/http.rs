// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// reqwest-backed transport bound to a single label-server origin.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, error, instrument};

use labelwerk_core::config::ClientConfig;
use labelwerk_core::error::{LabelwerkError, Result};

use crate::transport::{FilePart, Transport, join_url};

/// HTTP transport built once at start-up from a [`ClientConfig`].
///
/// The underlying `reqwest::Client` pools connections, so one instance should
/// be shared (behind an `Arc`) by every entity in the session.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Validate the configuration and build the client.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| LabelwerkError::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.origin().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| request_error("GET", path, e))?;
        parse_json(ensure_success("GET", path, response).await?).await
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| request_error("GET", path, e))?;
        let response = ensure_success("GET", path, response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| request_error("GET", path, e))?;
        debug!(len = bytes.len(), "received binary body");
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self, body), fields(base = %self.base_url))]
    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| request_error("POST", path, e))?;
        parse_json(ensure_success("POST", path, response).await?).await
    }

    #[instrument(
        skip(self, file),
        fields(base = %self.base_url, file_name = %file.file_name, len = file.bytes.len())
    )]
    async fn post_file(&self, path: &str, file: FilePart) -> Result<Value> {
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime_type)
            .map_err(|e| {
                LabelwerkError::Request(format!("invalid MIME type '{}': {e}", file.mime_type))
            })?;
        // reqwest writes the multipart Content-Type (with boundary) itself.
        let form = Form::new().part(file.field, part);

        let response = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_error("POST", path, e))?;
        parse_json(ensure_success("POST", path, response).await?).await
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .map_err(|e| request_error("DELETE", path, e))?;
        ensure_success("DELETE", path, response).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

fn request_error(method: &str, path: &str, err: reqwest::Error) -> LabelwerkError {
    error!(method, path, error = %err, "request failed before a response arrived");
    LabelwerkError::Request(format!("{method} {path}: {err}"))
}

/// Turn a non-2xx response into `LabelwerkError::Transport`.
async fn ensure_success(method: &str, path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        debug!(method, path, status = status.as_u16(), "request succeeded");
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        body
    };

    error!(method, path, status = status.as_u16(), %message, "label server rejected request");
    Err(LabelwerkError::Transport {
        status: status.as_u16(),
        message,
    })
}

/// Parse a success body as JSON; an empty body is `Null`.
async fn parse_json(response: Response) -> Result<Value> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| LabelwerkError::Request(format!("reading body: {e}")))?;
    parse_body(&bytes)
}

fn parse_body(bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
        .map_err(|e| LabelwerkError::InvalidResponse(format!("body is not JSON: {e}")))
}
