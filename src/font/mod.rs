//! # Font Service
//!
//! A [`ShapingService`] over real TrueType/OpenType data. Faces are parsed
//! with ttf-parser for metrics and coverage, and shaped with rustybuzz
//! (see [`shape`]). Analysis is the shared Unicode pass.

pub mod shape;

use std::collections::HashSet;
use std::path::Path;

use crate::error::{LayoutError, ServiceError};
use crate::model::FontId;
use crate::service::{
    unicode, AnalysisSink, AnalysisSource, FontMetrics, ShapeRequest, ShapedGlyphs,
    ShapingService,
};

/// A parsed font: raw data plus the metrics and coverage read from it.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub data: Vec<u8>,
    pub metrics: FontMetrics,
    /// Advance of glyph 0, in font units.
    pub notdef_advance: u16,
    /// Chars the Unicode cmap subtables map to a glyph.
    coverage: HashSet<char>,
}

impl LoadedFont {
    /// Parse `data` (face index 0) with ttf-parser.
    pub fn from_data(data: Vec<u8>) -> Result<Self, LayoutError> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| LayoutError::Font(format!("failed to parse font: {}", e)))?;
        let metrics = FontMetrics {
            units_per_em: face.units_per_em(),
            ascent: face.ascender(),
            descent: face.descender().saturating_neg(),
            line_gap: face.line_gap(),
        };
        let notdef_advance = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .unwrap_or(metrics.units_per_em / 2);
        let coverage = read_coverage(&face);
        Ok(Self {
            data,
            metrics,
            notdef_advance,
            coverage,
        })
    }

    pub fn covers(&self, ch: char) -> bool {
        self.coverage.contains(&ch)
    }
}

/// Every char the face's Unicode cmap subtables map to a glyph.
fn read_coverage(face: &ttf_parser::Face<'_>) -> HashSet<char> {
    let mut coverage = HashSet::new();
    let Some(cmap) = face.tables().cmap else {
        return coverage;
    };
    for subtable in cmap.subtables {
        if !subtable.is_unicode() {
            continue;
        }
        subtable.codepoints(|code| {
            if let Some(ch) = char::from_u32(code) {
                if face.glyph_index(ch).is_some() {
                    coverage.insert(ch);
                }
            }
        });
    }
    coverage
}

/// Font table addressed by [`FontId`], in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FontService {
    fonts: Vec<LoadedFont>,
}

impl FontService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_font(&mut self, data: Vec<u8>) -> Result<FontId, LayoutError> {
        let font = LoadedFont::from_data(data)?;
        self.fonts.push(font);
        log::debug!(target: "glyphflow::font", "loaded font {}", self.fonts.len() - 1);
        Ok(FontId(self.fonts.len() as u32 - 1))
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<FontId, LayoutError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| LayoutError::Font(format!("{}: {}", path.display(), e)))?;
        self.add_font(data)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    fn font(&self, id: FontId) -> Result<&LoadedFont, ServiceError> {
        self.fonts
            .get(id.0 as usize)
            .ok_or(ServiceError::UnknownFont(id))
    }
}

impl ShapingService for FontService {
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
        shape::shape_run(&font.data, font.metrics.units_per_em, request)
            .ok_or(ServiceError::BadFace(request.font))
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
        match self.fonts.get(font.0 as usize) {
            Some(f) => {
                f32::from(f.notdef_advance) * font_size / f32::from(f.metrics.units_per_em.max(1))
            }
            None => font_size * 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ScriptAnalysis;

    #[test]
    fn invalid_font_data_is_rejected() {
        let mut service = FontService::new();
        let err = service.add_font(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, LayoutError::Font(_)));
        assert!(service.is_empty());
    }

    #[test]
    fn missing_file_is_font_error() {
        let mut service = FontService::new();
        let err = service.load_file("/nonexistent/font.ttf").unwrap_err();
        assert!(matches!(err, LayoutError::Font(_)));
    }

    #[test]
    fn unknown_font_queries() {
        let service = FontService::new();
        assert!(service.font_metrics(FontId(0)).is_none());
        assert!(!service.covers(FontId(0), 'a'));
        assert_eq!(service.notdef_advance(FontId(0), 10.0), 5.0);
        let request = ShapeRequest {
            text: "a",
            font: FontId(0),
            font_size: 10.0,
            locale: "en",
            bidi_level: 0,
            sideways: false,
            script: ScriptAnalysis::COMMON,
            number_substitution: None,
        };
        assert_eq!(
            service.shape(&request),
            Err(ServiceError::UnknownFont(FontId(0)))
        );
    }
}
