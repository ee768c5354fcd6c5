// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Labelwerk.

use thiserror::Error;

/// Top-level error type for all Labelwerk operations.
#[derive(Debug, Error)]
pub enum LabelwerkError {
    // -- Transport errors --
    /// The service answered with a status outside the 2xx range.
    #[error("label server returned HTTP {status}: {message}")]
    Transport { status: u16, message: String },

    /// The request never produced a response (refused, DNS, timeout).
    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid response from label server: {0}")]
    InvalidResponse(String),

    // -- Entity errors --
    #[error("image upload failed: {reason}")]
    Upload {
        reason: String,
        #[source]
        source: Option<Box<LabelwerkError>>,
    },

    #[error("image {id} has already been deleted")]
    UseAfterDelete { id: String },

    #[error("no image with id {id}")]
    ImageNotFound { id: String },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LabelwerkError {
    /// Build an `Upload` error with no underlying cause.
    pub fn upload(reason: impl Into<String>) -> Self {
        Self::Upload {
            reason: reason.into(),
            source: None,
        }
    }

    /// Wrap a failure that happened while creating an image.
    pub fn upload_caused_by(cause: LabelwerkError) -> Self {
        Self::Upload {
            reason: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    /// HTTP status carried by this error, looking through upload wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Upload {
                source: Some(cause),
                ..
            } => cause.status(),
            _ => None,
        }
    }

    /// Whether the service reported the addressed resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ImageNotFound { .. }) || self.status() == Some(404)
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LabelwerkError>;
