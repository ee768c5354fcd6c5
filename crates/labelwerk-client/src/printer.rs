// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer entity: a read-only snapshot of the one printer behind the service.
//
// There is no optimistic state here.  Every field mirrors the fetch that
// produced the snapshot; getting newer state means fetching again.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use labelwerk_core::error::{LabelwerkError, Result};
use labelwerk_core::wire::PrinterRecord;

use crate::session::Session;

const MM_PER_INCH: f64 = 25.4;

/// Printer state as last reported by the label server.
#[derive(Debug, Clone, PartialEq)]
pub struct Printer {
    ty: String,
    dpi: u32,
    max_pixels: u32,
    media_type: String,
    media_width: String,
    tape_color: String,
    text_color: String,
    fetched_at: DateTime<Utc>,
}

impl Printer {
    /// Current state as cached by the service.
    #[instrument(skip(session))]
    pub async fn get(session: &Session) -> Result<Printer> {
        Self::fetch(session, "/printer").await
    }

    /// Make the service re-query the physical device, then return the new
    /// state.  Slower than [`Printer::get`]; meant for explicit user action.
    #[instrument(skip(session))]
    pub async fn refresh(session: &Session) -> Result<Printer> {
        let printer = Self::fetch(session, "/printer/refresh").await?;
        info!(
            ty = %printer.ty,
            media_width = %printer.media_width,
            tape_color = %printer.tape_color,
            "printer state refreshed"
        );
        Ok(printer)
    }

    /// Print everything currently queued on the server.
    ///
    /// Returns once the service has accepted the job, not when the label is
    /// out.  The service clears its image set after accepting, so all preview
    /// URLs are invalidated.
    #[instrument(skip(session))]
    pub async fn print(session: &Session) -> Result<()> {
        session.transport().post("/print", None).await?;
        session.cache().refresh();
        info!("print job accepted");
        Ok(())
    }

    async fn fetch(session: &Session, path: &str) -> Result<Printer> {
        let value = session.transport().get(path).await?;
        let record: PrinterRecord = serde_json::from_value(value)
            .map_err(|e| LabelwerkError::InvalidResponse(format!("printer state: {e}")))?;
        record.validate().map_err(LabelwerkError::InvalidResponse)?;

        debug!(dpi = record.dpi, max_pixels = record.max_pixels, "received printer state");
        Ok(Self::from_record(record))
    }

    fn from_record(record: PrinterRecord) -> Self {
        Self {
            ty: record.ty,
            dpi: record.dpi,
            max_pixels: record.max_pixels,
            media_type: record.media_type,
            media_width: record.media_width,
            tape_color: record.tape_color,
            text_color: record.text_color,
            fetched_at: Utc::now(),
        }
    }

    /// Device model identifier.
    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Widest printable raster in pixels.
    pub fn max_pixels(&self) -> u32 {
        self.max_pixels
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn media_width(&self) -> &str {
        &self.media_width
    }

    pub fn tape_color(&self) -> &str {
        &self.tape_color
    }

    pub fn text_color(&self) -> &str {
        &self.text_color
    }

    /// When the snapshot was received.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Physical width of the print head in millimetres.
    pub fn max_width_mm(&self) -> f64 {
        f64::from(self.max_pixels) / f64::from(self.dpi) * MM_PER_INCH
    }
}
