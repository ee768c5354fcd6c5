// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted in-memory transport for unit tests.
//
// Replies are consumed in order; every call is recorded so tests can assert
// exactly which requests were (or were not) issued.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use labelwerk_core::error::{LabelwerkError, Result};

use crate::session::Session;
use crate::transport::{FilePart, Transport};

pub(crate) const BASE: &str = "http://labels.test";

enum Reply {
    Json(Value),
    Bytes(Vec<u8>),
    Fail { status: u16, message: String },
}

/// One recorded request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply_json(&self, value: Value) -> &Self {
        self.push(Reply::Json(value))
    }

    /// Success with an empty body.
    pub fn reply_ok(&self) -> &Self {
        self.push(Reply::Json(Value::Null))
    }

    pub fn reply_bytes(&self, bytes: &[u8]) -> &Self {
        self.push(Reply::Bytes(bytes.to_vec()))
    }

    pub fn reply_status(&self, status: u16, message: &str) -> &Self {
        self.push(Reply::Fail {
            status,
            message: message.to_string(),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn session(self: &Arc<Self>) -> Session {
        Session::with_transport(self.clone())
    }

    fn push(&self, reply: Reply) -> &Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    fn next(&self, method: &'static str, path: &str, body: Option<Value>) -> Result<Reply> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body,
        });
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Fail { status, message }) => {
                Err(LabelwerkError::Transport { status, message })
            }
            Some(reply) => Ok(reply),
            None => Err(LabelwerkError::Request(format!(
                "no scripted reply for {method} {path}"
            ))),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn base_url(&self) -> &str {
        BASE
    }

    async fn get(&self, path: &str) -> Result<Value> {
        into_json(self.next("GET", path, None)?)
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        match self.next("GET", path, None)? {
            Reply::Bytes(bytes) => Ok(bytes),
            Reply::Json(value) => Ok(serde_json::to_vec(&value)?),
            Reply::Fail { .. } => unreachable!("failures are returned by next()"),
        }
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
        into_json(self.next("POST", path, body)?)
    }

    async fn post_file(&self, path: &str, file: FilePart) -> Result<Value> {
        let summary = json!({
            "field": file.field,
            "file_name": file.file_name,
            "mime_type": file.mime_type,
            "len": file.bytes.len(),
        });
        into_json(self.next("POST", path, Some(summary))?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.next("DELETE", path, None).map(|_| ())
    }
}

fn into_json(reply: Reply) -> Result<Value> {
    match reply {
        Reply::Json(value) => Ok(value),
        Reply::Bytes(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| LabelwerkError::InvalidResponse(e.to_string())),
        Reply::Fail { .. } => unreachable!("failures are returned by next()"),
    }
}

/// The image record from the "label.png" upload scenario.
pub(crate) fn label_png_record() -> Value {
    json!({
        "id": "abc",
        "file_name": "label.png",
        "width": 200,
        "height": 50,
        "original_width": 200,
        "original_height": 50,
        "length_mm": 25.4,
        "threshold": 128,
        "inverted": false
    })
}

pub(crate) fn printer_record(dpi: u32, max_px: u32) -> Value {
    json!({
        "ty": "PT_P750W",
        "dpi": dpi,
        "max_px": max_px,
        "media_type": "LaminatedTape",
        "media_width": "W24",
        "tape_color": "White",
        "text_color": "Black"
    })
}
