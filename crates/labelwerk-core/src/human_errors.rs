// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command-line and UI front ends.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Nothing here retries on its own; `retriable` only tells the user whether
// running the same command again can help.

use crate::error::LabelwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or busy server; trying again may succeed.
    Transient,
    /// User must do something (start the server, fix the address, pick a file).
    ActionRequired,
    /// Trying again will not help.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether repeating the action can succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `LabelwerkError` into a `HumanError`.
pub fn humanize_error(err: &LabelwerkError) -> HumanError {
    match err {
        LabelwerkError::Transport { status, message } => humanize_status(*status, message),

        LabelwerkError::Request(detail) => {
            let lower = detail.to_ascii_lowercase();
            if lower.contains("timed out") || lower.contains("timeout") {
                HumanError {
                    message: "The label server didn't answer in time.".into(),
                    suggestion: "The printer may be busy. Wait a moment and try again.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            } else {
                HumanError {
                    message: "We can't reach the label server.".into(),
                    suggestion: "Check that the server is running and that the address in your configuration is right.".into(),
                    retriable: true,
                    severity: Severity::ActionRequired,
                }
            }
        }

        LabelwerkError::InvalidResponse(_) => HumanError {
            message: "The label server sent something we didn't understand.".into(),
            suggestion: "The server and this tool may be different versions. Update both and try again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        LabelwerkError::Upload { reason, .. } => {
            if err.status() == Some(413) {
                HumanError {
                    message: "That image is too large to upload.".into(),
                    suggestion: "Scale the image down and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if reason.contains("unsupported") {
                HumanError {
                    message: "That file isn't an image the label server accepts.".into(),
                    suggestion: "Save it as a PNG or JPEG first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "The image couldn't be uploaded.".into(),
                    suggestion: format!("Try again. If this keeps happening, check the server log. ({reason})"),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        LabelwerkError::UseAfterDelete { .. } => HumanError {
            message: "That image has already been removed.".into(),
            suggestion: "List the images again to see what's still on the label.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        LabelwerkError::ImageNotFound { id } => HumanError {
            message: "There's no image with that id on the label server.".into(),
            suggestion: format!("Run `labelwerk list` to see the current ids. (Looked for: {id})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LabelwerkError::Config(detail) => HumanError {
            message: "The label server address looks wrong.".into(),
            suggestion: format!("It should look like http://localhost:3000. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LabelwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "Check the path and try again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "We don't have permission to use that file.".into(),
                suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        LabelwerkError::Serialization(_) => HumanError {
            message: "We had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_status(status: u16, detail: &str) -> HumanError {
    match status {
        404 => HumanError {
            message: "The label server doesn't know that image any more.".into(),
            suggestion: "Someone may have printed or cleared the label. List the images again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        400..=499 => HumanError {
            message: "The label server rejected the request.".into(),
            suggestion: format!("Check the values you passed. (HTTP {status}: {detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        _ => HumanError {
            message: "The label server had a problem.".into(),
            suggestion: "Check that the printer is switched on and connected, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
