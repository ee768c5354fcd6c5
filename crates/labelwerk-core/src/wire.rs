// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire records exchanged with the label server.
//
// The server speaks flat snake_case JSON (`original_width`, `max_px`, ...).
// These records mirror that shape exactly; the client entities translate them
// into the nested local model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::{Dimensions, ImageId};

/// One image as listed by `GET /images` or returned from an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
    pub length_mm: f64,
    pub threshold: u8,
    pub inverted: bool,
}

impl ImageRecord {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn original_dimensions(&self) -> Dimensions {
        Dimensions::new(self.original_width, self.original_height)
    }

    /// Reject records that cannot back a usable image.
    ///
    /// `length_mm` may be zero: the server truncates to whole millimetres, so
    /// very narrow images legitimately report 0.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("record has an empty id".into());
        }
        if !self.dimensions().is_valid() {
            return Err(format!("image {} has zero-sized dimensions", self.id));
        }
        if !self.original_dimensions().is_valid() {
            return Err(format!("image {} has zero-sized original dimensions", self.id));
        }
        if !self.length_mm.is_finite() || self.length_mm < 0.0 {
            return Err(format!("image {} has invalid length {}", self.id, self.length_mm));
        }
        Ok(())
    }
}

/// Body of `POST /images/{id}/invert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertRequest {
    pub invert: bool,
}

/// Body of `POST /images/{id}/threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRequest {
    pub threshold: u8,
}

/// Printer state as reported by `GET /printer` and `GET /printer/refresh`.
///
/// The device library serialises its enums either as bare strings or, for
/// unrecognised codes, as `{"Unknown": n}`; both are normalised to strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterRecord {
    #[serde(deserialize_with = "label")]
    pub ty: String,
    pub dpi: u32,
    #[serde(alias = "max_px")]
    pub max_pixels: u32,
    #[serde(deserialize_with = "label")]
    pub media_type: String,
    #[serde(deserialize_with = "label")]
    pub media_width: String,
    #[serde(deserialize_with = "label")]
    pub tape_color: String,
    #[serde(deserialize_with = "label")]
    pub text_color: String,
}

impl PrinterRecord {
    pub fn validate(&self) -> Result<(), String> {
        if self.dpi == 0 {
            return Err("printer reports 0 dpi".into());
        }
        if self.max_pixels == 0 {
            return Err("printer reports 0 printable pixels".into());
        }
        Ok(())
    }
}

/// Accept any JSON value and render it as a display label.
fn label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(render_label(&value))
}

fn render_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        // Externally tagged enum variant, e.g. {"Unknown": 7}.
        Value::Object(map) if map.len() == 1 => match map.iter().next() {
            Some((tag, inner)) => format!("{tag}({})", render_label(inner)),
            None => String::new(),
        },
        other => other.to_string(),
    }
}
