//! Structured error types for the glyphflow layout engine.
//!
//! Only contract violations and outright service failures surface here.
//! Malformed data coming back from a shaping service is absorbed by the
//! pipeline (clamped, skipped or replaced with notdef glyphs) and counted in
//! [`LayoutStats`](crate::layout::LayoutStats) instead.

use thiserror::Error;

use crate::model::FontId;

/// The unified error type returned by all public glyphflow API functions.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A text position or range fell outside `[0, len]`.
    #[error("position {position} is out of range for text of length {len}")]
    OutOfRange { position: usize, len: usize },

    /// A format range referenced a font the shaping service does not know.
    #[error("font {0:?} is not known to the shaping service")]
    InvalidFont(FontId),

    /// The shaping service failed to analyze the text at all.
    #[error("shaping service failed: {0}")]
    Service(#[from] ServiceError),

    /// JSON input failed to parse as a valid layout request.
    #[error("failed to parse layout request: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A font file could not be loaded or parsed.
    #[error("font error: {0}")]
    Font(String),
}

/// Errors reported by a [`ShapingService`](crate::service::ShapingService).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("font {0:?} is not available")]
    UnknownFont(FontId),
    #[error("font {0:?} has no usable face data")]
    BadFace(FontId),
    #[error("{0}")]
    Other(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the layout request schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input; is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        LayoutError::Parse { source: e, hint }
    }
}
