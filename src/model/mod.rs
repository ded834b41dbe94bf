//! # Layout Model
//!
//! The plain data that flows in and out of the engine: geometry, font
//! handles, per-range text formats, and the declarative [`LayoutConfig`]
//! used by the JSON entry point.
//!
//! Everything here is serde-friendly so a layout request can be described
//! as JSON and the produced glyph runs can be dumped back out.

use std::ops::Range;

use serde::{Deserialize, Serialize};

// ── Geometry ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in layout coordinates (y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }
}

// ── Fonts and formats ──────────────────────────────────────────

/// Handle to a font face owned by a shaping service.
///
/// The value is an index into the service's font table; it carries no
/// lifetime and is cheap to copy into every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontId(pub u32);

/// Paragraph / run reading direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl ReadingDirection {
    /// The base bidi embedding level for this direction.
    pub fn base_level(self) -> u8 {
        match self {
            ReadingDirection::LeftToRight => 0,
            ReadingDirection::RightToLeft => 1,
        }
    }

    pub fn is_rtl(self) -> bool {
        matches!(self, ReadingDirection::RightToLeft)
    }
}

/// How digits are substituted when a run is flagged as number-substituted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberSubstitution {
    /// Digits are shaped as written.
    #[default]
    None,
    /// Native digits only where the surrounding text is right-to-left.
    Contextual,
    /// Native digits for the locale everywhere.
    National,
}

/// Horizontal placement of each line inside its area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    /// Left for left-to-right paragraphs, right for right-to-left ones.
    #[default]
    Start,
    End,
    Center,
    /// Stretch whitespace so every line but the last fills the area.
    Justified,
}

/// Formatting applied to a range of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFormat {
    pub font: FontId,
    /// BCP 47 locale. `None` inherits the layout locale.
    #[serde(default)]
    pub locale: Option<String>,
    /// `None` inherits the layout's default reading direction.
    #[serde(default)]
    pub direction: Option<ReadingDirection>,
}

/// A caller-supplied format over `[start, start + len)` (char positions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatRange {
    pub start: usize,
    pub len: usize,
    pub format: TextFormat,
}

impl FormatRange {
    pub fn new(range: Range<usize>, format: TextFormat) -> Self {
        Self {
            start: range.start,
            len: range.end.saturating_sub(range.start),
            format,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.start.saturating_add(self.len)
    }
}

/// Stable index of a format in the layout's format table.
///
/// Index 0 is always the layout's default (ambient) format; caller ranges
/// follow in the order they were supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FormatIndex(pub usize);

impl FormatIndex {
    pub const DEFAULT: FormatIndex = FormatIndex(0);
}

/// What to do when a run's font lacks glyphs for some of its characters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Keep the requested font; missing characters shape as notdef.
    #[default]
    Disabled,
    /// Use the first font in the list that covers the character.
    FirstCovering(Vec<FontId>),
}

// ── Declarative configuration ──────────────────────────────────

/// A complete layout request.
///
/// This is the serde form of the [`TextLayout`](crate::layout::TextLayout)
/// setters, used by [`layout_json`](crate::layout_json) and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    pub text: String,
    #[serde(default)]
    pub formats: Vec<FormatRange>,
    #[serde(default)]
    pub default_format: TextFormat,
    #[serde(default)]
    pub direction: ReadingDirection,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    pub size: Size,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub number_substitution: NumberSubstitution,
    #[serde(default)]
    pub fallback: FallbackPolicy,
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,
    /// Number of columns the page is split into.
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default)]
    pub column_gap: f32,
    /// Cap on glyphs per line. `None` leaves lines limited by width only.
    #[serde(default)]
    pub max_line_glyphs: Option<usize>,
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_font_size() -> f32 {
    12.0
}

fn default_line_spacing() -> f32 {
    1.0
}

fn default_columns() -> usize {
    1
}
