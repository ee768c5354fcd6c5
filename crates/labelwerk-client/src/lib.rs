// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Labelwerk Client: the domain layer between a UI and the label-printer
// service.  Entities (`Image`, `Printer`) wrap transport calls and keep their
// local fields in step with the server; the cache-bust counter invalidates
// previews whenever a mutation changes what the server would render.

pub mod cache_bust;
pub mod http;
pub mod image;
pub mod printer;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use cache_bust::CacheBust;
pub use http::HttpTransport;
pub use image::{Image, SharedImage};
pub use printer::Printer;
pub use session::Session;
pub use transport::{FilePart, Transport};
