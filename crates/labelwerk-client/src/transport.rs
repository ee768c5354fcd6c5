// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transport abstraction over the label server's HTTP surface.
//
// Entities only ever talk to a `dyn Transport`, so the real reqwest client and
// in-memory fakes are interchangeable.  Every path is relative to the one
// origin the transport was built for.

use async_trait::async_trait;
use serde_json::Value;

use labelwerk_core::error::Result;

/// A file sent as one part of a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name (the server expects `file`).
    pub field: String,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Request/response contract with the label server.
///
/// Non-2xx responses surface as `LabelwerkError::Transport` carrying the
/// status and body text.  Implementations never retry.  Empty success bodies
/// parse as `Value::Null`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The origin all paths are resolved against, without a trailing slash.
    fn base_url(&self) -> &str;

    async fn get(&self, path: &str) -> Result<Value>;

    /// `GET` returning the raw body, for PNG previews.
    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>>;

    /// `POST` with an optional JSON body.
    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value>;

    /// `POST` a single file as `multipart/form-data`.
    async fn post_file(&self, path: &str, file: FilePart) -> Result<Value>;

    async fn delete(&self, path: &str) -> Result<()>;
}

/// Join an origin and a request path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}
