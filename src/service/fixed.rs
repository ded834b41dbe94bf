//! # Fixed-Pitch Service
//!
//! A shaping service where every visible glyph has the same advance, the
//! way a terminal grid lays out text. Analysis is the shared Unicode pass;
//! shaping is a direct char → glyph mapping:
//!
//! - combining marks (inherited script) join the previous char's cluster
//!   as a zero-advance glyph;
//! - control characters produce a zero-advance glyph;
//! - characters outside the font's coverage map to notdef (glyph 0).
//!
//! It needs no font files, which makes it the service of choice for tests
//! and for the CLI when no font is given.

use std::ops::RangeInclusive;

use unicode_script::{Script, UnicodeScript};

use crate::error::ServiceError;
use crate::model::FontId;
use crate::service::{
    substitute_digit, unicode, AnalysisSink, AnalysisSource, FontMetrics, GlyphOffset,
    ShapeRequest, ShapedGlyphs, ShapingService,
};

/// One synthetic monospace face.
#[derive(Debug, Clone)]
pub struct FixedPitchFont {
    /// Advance of every visible glyph, in ems.
    pub advance: f32,
    pub metrics: FontMetrics,
    /// Covered characters; `None` covers everything.
    pub coverage: Option<Vec<RangeInclusive<char>>>,
}

impl Default for FixedPitchFont {
    fn default() -> Self {
        Self {
            advance: 0.5,
            metrics: FontMetrics {
                units_per_em: 1000,
                ascent: 800,
                descent: 200,
                line_gap: 0,
            },
            coverage: None,
        }
    }
}

impl FixedPitchFont {
    /// A face covering only the given character ranges.
    pub fn covering(ranges: Vec<RangeInclusive<char>>) -> Self {
        Self {
            coverage: Some(ranges),
            ..Default::default()
        }
    }

    pub fn with_advance(mut self, advance: f32) -> Self {
        self.advance = advance;
        self
    }

    fn covers(&self, ch: char) -> bool {
        match &self.coverage {
            None => true,
            Some(ranges) => ch.is_control() || ranges.iter().any(|r| r.contains(&ch)),
        }
    }
}

/// Service with a table of [`FixedPitchFont`]s, addressed by [`FontId`].
#[derive(Debug, Clone)]
pub struct FixedPitchService {
    fonts: Vec<FixedPitchFont>,
}

impl Default for FixedPitchService {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedPitchService {
    /// A service with a single full-coverage font at `FontId(0)`.
    pub fn new() -> Self {
        Self {
            fonts: vec![FixedPitchFont::default()],
        }
    }

    pub fn with_fonts(fonts: Vec<FixedPitchFont>) -> Self {
        Self { fonts }
    }

    pub fn add_font(&mut self, font: FixedPitchFont) -> FontId {
        self.fonts.push(font);
        FontId(self.fonts.len() as u32 - 1)
    }

    fn font(&self, id: FontId) -> Result<&FixedPitchFont, ServiceError> {
        self.fonts
            .get(id.0 as usize)
            .ok_or(ServiceError::UnknownFont(id))
    }
}

impl ShapingService for FixedPitchService {
    fn analyze(
        &self,
        source: &AnalysisSource<'_>,
        sink: &mut dyn AnalysisSink,
    ) -> Result<(), ServiceError> {
        unicode::analyze_text(source, sink);
        Ok(())
    }

    fn shape(&self, request: &ShapeRequest<'_>) -> Result<ShapedGlyphs, ServiceError> {
        let font = self.font(request.font)?;
        let advance = font.advance * request.font_size;
        let substitute = request.substitutes_digits();

        let mut shaped = ShapedGlyphs::default();
        for ch in request.text.chars() {
            let joins_previous = ch.script() == Script::Inherited && !shaped.is_empty();
            if joins_previous {
                // Same cluster as the base char before it.
                let base = *shaped.cluster_map.last().unwrap_or(&0);
                shaped.cluster_map.push(base);
            } else {
                shaped.cluster_map.push(shaped.glyph_indices.len() as u32);
            }

            let ch = if substitute {
                substitute_digit(ch, request.locale)
            } else {
                ch
            };
            let glyph = if font.covers(ch) {
                (ch as u32 % 0xFFFF).max(1) as u16
            } else {
                0
            };
            let glyph_advance = if joins_previous || ch.is_control() {
                0.0
            } else {
                advance
            };
            shaped.glyph_indices.push(glyph);
            shaped.advances.push(glyph_advance);
            shaped.offsets.push(GlyphOffset::default());
        }
        Ok(shaped)
    }

    fn font_metrics(&self, font: FontId) -> Option<FontMetrics> {
        self.fonts.get(font.0 as usize).map(|f| f.metrics)
    }

    fn covers(&self, font: FontId, ch: char) -> bool {
        self.fonts
            .get(font.0 as usize)
            .is_some_and(|f| f.covers(ch))
    }

    fn notdef_advance(&self, font: FontId, font_size: f32) -> f32 {
        self.fonts
            .get(font.0 as usize)
            .map(|f| f.advance * font_size)
            .unwrap_or(font_size * 0.5)
    }
}
