// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session: the transport and cache-bust counter shared by every entity.

use std::sync::Arc;

use tracing::{info, instrument};

use labelwerk_core::config::ClientConfig;
use labelwerk_core::error::Result;

use crate::cache_bust::CacheBust;
use crate::http::HttpTransport;
use crate::transport::{Transport, join_url};

/// Entry point for all remote operations.
///
/// Cheap to clone: the transport and the counter are reference counted, so
/// clones can be handed to UI components and background tasks freely.
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn Transport>,
    cache: CacheBust,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.transport.base_url())
            .field("cache", &self.cache.value())
            .finish()
    }
}

impl Session {
    /// Build an HTTP session from configuration.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        info!(base = %transport.base_url(), "label server session created");
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Build a session over any transport (tests, alternative backends).
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: CacheBust::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn cache(&self) -> &CacheBust {
        &self.cache
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// URL of the combined label preview, carrying the current cache key.
    pub fn preview_url(&self) -> String {
        self.cache.bust(&join_url(self.base_url(), "/preview"))
    }

    /// Fetch the PNG of all images joined as they would be printed.
    #[instrument(skip(self))]
    pub async fn fetch_preview(&self) -> Result<Vec<u8>> {
        self.transport.get_bytes("/preview").await
    }
}
