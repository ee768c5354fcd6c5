// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Labelwerk: Core types, wire records and error definitions shared by the
// client library and the command-line front end.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;
pub mod wire;

pub use config::ClientConfig;
pub use error::LabelwerkError;
pub use types::*;
