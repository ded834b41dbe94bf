//! # Run Shaping
//!
//! Shapes every merged run through the service and appends the glyphs to
//! one set of shared arrays. Each run records its `[glyph_start,
//! glyph_start + glyph_count)` slice; the per-char cluster array stays
//! relative to the owning run's first glyph.
//!
//! A run the service cannot shape, or shapes into something inconsistent,
//! degrades to one notdef glyph per char instead of failing the layout.

use crate::model::{FontId, NumberSubstitution, TextFormat};
use crate::service::{GlyphOffset, ShapeRequest, ShapedGlyphs, ShapingService};
use crate::text::runs::Run;

/// Glyph attribute arrays shared by all runs of a layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphBuffers {
    pub indices: Vec<u16>,
    pub advances: Vec<f32>,
    pub offsets: Vec<GlyphOffset>,
    /// Per text position: first glyph of its cluster, relative to the run.
    pub clusters: Vec<u32>,
}

impl GlyphBuffers {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Layout-level defaults the shaper needs alongside each run.
#[derive(Debug, Clone, Copy)]
pub struct ShapingContext<'a> {
    pub text: &'a [char],
    pub formats: &'a [TextFormat],
    pub locale: &'a str,
    pub font_size: f32,
    pub number_substitution: NumberSubstitution,
}

impl ShapingContext<'_> {
    /// The font a run is actually shaped with.
    pub fn run_font(&self, run: &Run) -> FontId {
        run.font_substitute.unwrap_or_else(|| {
            self.formats
                .get(run.format.0)
                .map(|f| f.font)
                .unwrap_or_default()
        })
    }

    fn run_locale(&self, run: &Run) -> &str {
        self.formats
            .get(run.format.0)
            .and_then(|f| f.locale.as_deref())
            .unwrap_or(self.locale)
    }
}

/// Shape every run, filling in its glyph slice.
///
/// Returns the shared buffers and the number of runs that fell back to
/// notdef glyphs.
pub fn shape_runs<S: ShapingService + ?Sized>(
    service: &S,
    ctx: &ShapingContext<'_>,
    runs: &mut [Run],
) -> (GlyphBuffers, usize) {
    let mut buffers = GlyphBuffers {
        clusters: vec![0; ctx.text.len()],
        ..Default::default()
    };
    let mut failures = 0;

    for run in runs.iter_mut() {
        let run_text: String = ctx.text[run.text_range()].iter().collect();
        let font = ctx.run_font(run);
        let request = ShapeRequest {
            text: &run_text,
            font,
            font_size: ctx.font_size,
            locale: ctx.run_locale(run),
            bidi_level: run.bidi_level,
            sideways: run.sideways,
            script: run.script,
            number_substitution: run.number_substituted.then_some(ctx.number_substitution),
        };

        let shaped = match service.shape(&request) {
            Ok(shaped) if is_consistent(&shaped, run.text_len) => shaped,
            Ok(_) => {
                log::warn!(
                    target: "glyphflow::shaping",
                    "inconsistent shaping result for {:?} with font {:?}; using notdef",
                    run.text_range(),
                    font
                );
                failures += 1;
                notdef_glyphs(service.notdef_advance(font, ctx.font_size), run.text_len)
            }
            Err(e) => {
                log::warn!(
                    target: "glyphflow::shaping",
                    "shaping {:?} with font {:?} failed: {}; using notdef",
                    run.text_range(),
                    font,
                    e
                );
                failures += 1;
                notdef_glyphs(service.notdef_advance(font, ctx.font_size), run.text_len)
            }
        };

        run.glyph_start = buffers.len();
        run.glyph_count = shaped.len();
        buffers.clusters[run.text_range()].copy_from_slice(&shaped.cluster_map);
        buffers.indices.extend_from_slice(&shaped.glyph_indices);
        buffers.advances.extend_from_slice(&shaped.advances);
        buffers.offsets.extend_from_slice(&shaped.offsets);
    }

    log::debug!(
        target: "glyphflow::shaping",
        "shaped {} runs into {} glyphs",
        runs.len(),
        buffers.len()
    );
    (buffers, failures)
}

/// Array lengths agree and the cluster map is a monotone map into the
/// glyphs that starts at glyph 0.
fn is_consistent(shaped: &ShapedGlyphs, char_count: usize) -> bool {
    let glyph_count = shaped.glyph_indices.len();
    if shaped.advances.len() != glyph_count
        || shaped.offsets.len() != glyph_count
        || shaped.cluster_map.len() != char_count
        || glyph_count == 0
        || glyph_count > u32::MAX as usize
    {
        return false;
    }
    if shaped.cluster_map.first() != Some(&0) {
        return false;
    }
    let in_bounds = shaped
        .cluster_map
        .iter()
        .all(|&c| (c as usize) < glyph_count);
    let monotone = shaped.cluster_map.windows(2).all(|w| w[0] <= w[1]);
    let finite = shaped.advances.iter().all(|a| a.is_finite());
    in_bounds && monotone && finite
}

/// One notdef glyph (id 0) per char.
fn notdef_glyphs(advance: f32, char_count: usize) -> ShapedGlyphs {
    ShapedGlyphs {
        glyph_indices: vec![0; char_count],
        advances: vec![advance; char_count],
        offsets: vec![GlyphOffset::default(); char_count],
        cluster_map: (0..char_count as u32).collect(),
    }
}
