//! # Shaping Service Contract
//!
//! The engine never runs the Unicode bidi algorithm, script itemization or
//! OpenType shaping itself. It consumes them through [`ShapingService`]:
//!
//! - `analyze` reports range annotations back through an [`AnalysisSink`],
//!   in any order and with any partitioning;
//! - `shape` turns one homogeneous run into glyphs in logical order, plus a
//!   per-char cluster map;
//! - `font_metrics` / `covers` / `notdef_advance` answer font questions for
//!   line height, fallback and failure recovery.
//!
//! Two services ship with the crate. [`FontService`](crate::font::FontService)
//! shapes real fonts with rustybuzz; [`FixedPitchService`] gives every glyph
//! the same advance, like a terminal grid. Both share the analysis pass in
//! [`unicode`].

pub mod fixed;
pub mod unicode;

pub use fixed::{FixedPitchFont, FixedPitchService};

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::model::{FontId, NumberSubstitution, ReadingDirection};
use crate::text::{Breakpoint, ScriptAnalysis};

/// Read-only input for an analysis pass.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisSource<'a> {
    pub text: &'a str,
    pub locale: &'a str,
    pub direction: ReadingDirection,
    pub number_substitution: NumberSubstitution,
}

/// Receiver of analysis reports. Ranges are `(start, len)` in chars.
///
/// Reports may arrive in any order, may overlap earlier reports, and may
/// even fall outside the text; implementations must cope with all three.
pub trait AnalysisSink {
    fn set_line_breakpoints(&mut self, start: usize, breakpoints: &[Breakpoint]);
    fn set_script_analysis(&mut self, start: usize, len: usize, script: ScriptAnalysis);
    fn set_bidi_level(&mut self, start: usize, len: usize, explicit_level: u8, resolved_level: u8);
    fn set_number_substitution(
        &mut self,
        start: usize,
        len: usize,
        substitution: Option<NumberSubstitution>,
    );
    fn set_glyph_orientation(&mut self, start: usize, len: usize, sideways: bool);
}

/// One run's worth of shaping input.
#[derive(Debug, Clone)]
pub struct ShapeRequest<'a> {
    pub text: &'a str,
    pub font: FontId,
    pub font_size: f32,
    pub locale: &'a str,
    pub bidi_level: u8,
    pub sideways: bool,
    pub script: ScriptAnalysis,
    pub number_substitution: Option<NumberSubstitution>,
}

impl ShapeRequest<'_> {
    pub fn is_rtl(&self) -> bool {
        self.bidi_level & 1 == 1
    }

    /// Whether digits in this run should be replaced by native digits.
    pub fn substitutes_digits(&self) -> bool {
        match self.number_substitution {
            Some(NumberSubstitution::National) => true,
            Some(NumberSubstitution::Contextual) => self.is_rtl(),
            _ => false,
        }
    }
}

/// Per-glyph positioning offset, in layout units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphOffset {
    /// Along the advance direction.
    pub advance_offset: f32,
    /// Perpendicular to it, positive up.
    pub ascender_offset: f32,
}

/// Shaping output for one run, glyphs in logical order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedGlyphs {
    pub glyph_indices: Vec<u16>,
    /// Advances already scaled to the requested font size.
    pub advances: Vec<f32>,
    pub offsets: Vec<GlyphOffset>,
    /// For each char of the run, the index of the first glyph of its cluster.
    pub cluster_map: Vec<u32>,
}

impl ShapedGlyphs {
    pub fn len(&self) -> usize {
        self.glyph_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyph_indices.is_empty()
    }
}

/// Font design metrics. `descent` is positive below the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascent: i16,
    pub descent: i16,
    pub line_gap: i16,
}

impl FontMetrics {
    fn scale(&self, font_size: f32) -> f32 {
        font_size / f32::from(self.units_per_em.max(1))
    }

    pub fn ascent_at(&self, font_size: f32) -> f32 {
        f32::from(self.ascent) * self.scale(font_size)
    }

    pub fn descent_at(&self, font_size: f32) -> f32 {
        f32::from(self.descent) * self.scale(font_size)
    }

    pub fn line_height_at(&self, font_size: f32) -> f32 {
        let units = f32::from(self.ascent) + f32::from(self.descent) + f32::from(self.line_gap);
        units * self.scale(font_size)
    }
}

/// The external shaping capability consumed by the layout.
pub trait ShapingService {
    /// Analyze `source` and report scripts, bidi levels, number
    /// substitution, orientation and line breakpoints to `sink`.
    fn analyze(
        &self,
        source: &AnalysisSource<'_>,
        sink: &mut dyn AnalysisSink,
    ) -> Result<(), ServiceError>;

    /// Shape one homogeneous run.
    fn shape(&self, request: &ShapeRequest<'_>) -> Result<ShapedGlyphs, ServiceError>;

    /// Metrics of `font`, or `None` if the font is unknown.
    fn font_metrics(&self, font: FontId) -> Option<FontMetrics>;

    /// Whether `font` has a glyph for `ch`.
    fn covers(&self, _font: FontId, _ch: char) -> bool {
        true
    }

    /// Advance of the notdef glyph, used when shaping a run fails.
    fn notdef_advance(&self, font: FontId, font_size: f32) -> f32 {
        match self.font_metrics(font) {
            Some(m) => f32::from(m.units_per_em / 2) * m.scale(font_size),
            None => font_size * 0.5,
        }
    }
}

/// Native zero for locales with their own digit shapes.
fn native_zero(locale: &str) -> Option<u32> {
    let primary = locale.split('-').next().unwrap_or(locale).to_lowercase();
    match primary.as_str() {
        "ar" => Some(0x0660),
        "fa" | "ur" => Some(0x06F0),
        "hi" | "mr" | "ne" => Some(0x0966),
        "bn" => Some(0x09E6),
        "th" => Some(0x0E50),
        _ => None,
    }
}

/// Replace ASCII digits by the locale's native digits.
pub fn substitute_digit(ch: char, locale: &str) -> char {
    if !ch.is_ascii_digit() {
        return ch;
    }
    native_zero(locale)
        .and_then(|zero| char::from_u32(zero + (ch as u32 - '0' as u32)))
        .unwrap_or(ch)
}

/// Build a byte-offset → char-index map for a string.
///
/// The map has `text.len() + 1` entries so the end offset is addressable.
pub(crate) fn byte_to_char_map(text: &str) -> Vec<usize> {
    let mut map = vec![0usize; text.len() + 1];
    let mut char_idx = 0;
    for (byte_idx, ch) in text.char_indices() {
        for slot in &mut map[byte_idx..byte_idx + ch.len_utf8()] {
            *slot = char_idx;
        }
        char_idx += 1;
    }
    map[text.len()] = char_idx;
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_follow_locale() {
        assert_eq!(substitute_digit('3', "ar-EG"), '\u{0663}');
        assert_eq!(substitute_digit('3', "fa"), '\u{06F3}');
        assert_eq!(substitute_digit('3', "en-US"), '3');
        assert_eq!(substitute_digit('x', "ar"), 'x');
    }

    #[test]
    fn byte_map_handles_multibyte() {
        let map = byte_to_char_map("aש b");
        // 'a' = 1 byte, 'ש' = 2 bytes
        assert_eq!(map, vec![0, 1, 1, 2, 3, 4]);
    }

    #[test]
    fn contextual_substitution_only_rtl() {
        let mut req = ShapeRequest {
            text: "12",
            font: FontId(0),
            font_size: 10.0,
            locale: "ar",
            bidi_level: 0,
            sideways: false,
            script: ScriptAnalysis::COMMON,
            number_substitution: Some(NumberSubstitution::Contextual),
        };
        assert!(!req.substitutes_digits());
        req.bidi_level = 1;
        assert!(req.substitutes_digits());
    }

    #[test]
    fn scaled_metrics() {
        let m = FontMetrics {
            units_per_em: 1000,
            ascent: 800,
            descent: 200,
            line_gap: 0,
        };
        assert!((m.line_height_at(10.0) - 10.0).abs() < 1e-6);
        assert!((m.descent_at(10.0) - 2.0).abs() < 1e-6);
    }
}
