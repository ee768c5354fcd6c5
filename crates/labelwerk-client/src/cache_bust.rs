// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cache-bust counter for preview URLs.
//
// The server renders previews at stable URLs (`/images/{id}`, `/preview`), so
// any cache between the UI and the server would keep serving a stale PNG
// after a mutation.  Appending `cache=N` and bumping N after every
// invalidating call turns the next fetch into a cache miss.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{trace, warn};

/// Shared, observable, monotonically increasing counter.
///
/// Clones share the same value.  UI code can either read [`CacheBust::key`]
/// on every render or [`subscribe`](CacheBust::subscribe) and re-render when
/// the receiver reports a change.
#[derive(Debug, Clone)]
pub struct CacheBust {
    counter: Arc<watch::Sender<u64>>,
}

impl Default for CacheBust {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBust {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    fn starting_at(value: u64) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self {
            counter: Arc::new(tx),
        }
    }

    pub fn value(&self) -> u64 {
        *self.counter.borrow()
    }

    /// Query-string fragment derived from the current value, e.g. `cache=3`.
    pub fn key(&self) -> String {
        format!("cache={}", self.value())
    }

    /// Increment the counter, notify subscribers, and return the new value.
    ///
    /// Past `u64::MAX` the counter wraps to 0.  The key still differs from
    /// the previous one, which is all a cache miss needs, but the value is no
    /// longer larger than before.
    pub fn refresh(&self) -> u64 {
        let mut next = 0;
        self.counter.send_modify(|value| {
            *value = match value.checked_add(1) {
                Some(bumped) => bumped,
                None => {
                    warn!("cache bust counter overflowed, wrapping to 0");
                    0
                }
            };
            next = *value;
        });
        trace!(value = next, "cache bust counter advanced");
        next
    }

    /// Receiver that wakes on every [`refresh`](CacheBust::refresh).
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.counter.subscribe()
    }

    /// Append the current key to `url` as a query parameter.
    pub fn bust(&self, url: &str) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}{}", self.key())
    }
}
