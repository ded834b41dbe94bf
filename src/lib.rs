//! # glyphflow
//!
//! A run-based text layout engine.
//!
//! Most text APIs lay a paragraph out against one fixed width and leave the
//! caller to cut the result into pages or columns. glyphflow flows text
//! *into* areas instead: the caller hands out rectangles one line at a time,
//! and the engine fits, orders and places each line as it goes.
//!
//! Script detection, bidi resolution and OpenType shaping are not
//! reimplemented here. They come from a pluggable [`ShapingService`]; the
//! engine owns what happens around it: folding the service's analysis into
//! runs, merging caller formats, font fallback, line fitting, visual
//! reordering and justification.
//!
//! ## Architecture
//!
//! ```text
//! Input (API / JSON)
//!       ↓
//!   [service]  — Analysis + shaping capability (Unicode passes, fonts)
//!       ↓
//!   [text]     — Run table, format merge, fallback, shaping, fitting
//!       ↓
//!   [layout]   — Pagination loop: areas in, glyph runs out
//!       ↓
//!   [sink]     — Stored runs: render, hit-test, caret positions
//! ```

pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod service;
pub mod text;

use serde::Serialize;

pub use error::{LayoutError, ServiceError};
pub use font::FontService;
pub use layout::sink::{GlyphRunBuffer, GlyphSink};
pub use layout::source::{PaginationSource, StackedAreaSource};
pub use layout::{FlowOutcome, LayoutStats, TextLayout};
pub use model::LayoutConfig;
pub use service::{FixedPitchService, ShapingService};

/// Everything one layout request produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub outcome: FlowOutcome,
    pub glyphs: GlyphRunBuffer,
    pub stats: LayoutStats,
}

/// Lay out a declarative request on a single page.
///
/// The page is split into `config.columns` columns; lines stack top-down
/// in each column in turn.
pub fn layout<S: ShapingService + ?Sized>(
    config: &LayoutConfig,
    service: &S,
) -> Result<LayoutResult, LayoutError> {
    let mut layout = TextLayout::from_config(config);
    let mut source = StackedAreaSource::with_columns(config.columns, config.column_gap);
    let mut glyphs = GlyphRunBuffer::new();
    let outcome = layout.flow(service, &mut source, &mut glyphs)?;
    Ok(LayoutResult {
        outcome,
        glyphs,
        stats: layout.stats(),
    })
}

/// Lay out a request described as JSON.
pub fn layout_json<S: ShapingService + ?Sized>(
    json: &str,
    service: &S,
) -> Result<LayoutResult, LayoutError> {
    let config: LayoutConfig = serde_json::from_str(json)?;
    layout(&config, service)
}
