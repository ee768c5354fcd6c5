// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LabelwerkError, Result};

/// Origin used when nothing else is configured (the service's default bind).
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Settings for the connection to the label-printer service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service origin every request path is resolved against.
    pub base_url: String,
    /// Per-request timeout in seconds. Refreshing the printer talks to the
    /// physical device, so keep this generous.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with each request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            user_agent: format!("labelwerk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with every other field defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Check that the origin is an absolute http(s) URL and the timeout is
    /// non-zero.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| LabelwerkError::Config(format!("base_url '{}': {e}", self.base_url)))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(LabelwerkError::Config(format!(
                    "base_url must use http or https, not '{other}'"
                )));
            }
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(LabelwerkError::Config(
                "base_url must not carry a query or fragment".into(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(LabelwerkError::Config("timeout_secs must be > 0".into()));
        }

        Ok(())
    }

    /// The origin without a trailing slash, ready for path concatenation.
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
