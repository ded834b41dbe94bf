//! # Glyph Sink
//!
//! The flow loop hands every positioned glyph run to a [`GlyphSink`].
//! [`GlyphRunBuffer`] is the sink shipped with the crate: it keeps the runs
//! so they can be drawn later through a [`GlyphRenderer`], hit-tested, and
//! queried for caret positions.
//!
//! Glyphs arrive in logical order. A run with an odd bidi level is laid out
//! right-to-left: its first glyph sits at the run's right edge.

use std::ops::Range;

use serde::Serialize;

use crate::model::{FontId, Point, Rect};
use crate::service::GlyphOffset;

/// One positioned glyph run, borrowed from the layout's buffers.
#[derive(Debug, Clone)]
pub struct GlyphRunRef<'a> {
    pub text_range: Range<usize>,
    pub glyph_indices: &'a [u16],
    pub advances: &'a [f32],
    pub offsets: &'a [GlyphOffset],
    /// Per char of `text_range`: first glyph of its cluster in this slice.
    pub cluster_map: &'a [u32],
    pub font: FontId,
    pub font_size: f32,
    /// Left end of the run on the baseline.
    pub baseline_origin: Point,
    /// The area of the line this run belongs to.
    pub line_rect: Rect,
    pub bidi_level: u8,
    pub sideways: bool,
}

/// Receiver of the flow loop's output.
pub trait GlyphSink {
    /// Called once per flow with the total glyph count of the text.
    fn prepare(&mut self, expected_glyph_count: usize);

    fn add_glyph_run(&mut self, run: GlyphRunRef<'_>);
}

/// Drawing backend for [`GlyphRunBuffer::render`].
pub trait GlyphRenderer {
    type Brush;

    fn draw_glyph_run(&mut self, baseline_origin: Point, run: GlyphRunView<'_>, brush: &Self::Brush);
}

/// A stored run as seen by a renderer.
#[derive(Debug, Clone, Copy)]
pub struct GlyphRunView<'a> {
    pub glyph_indices: &'a [u16],
    pub advances: &'a [f32],
    pub offsets: &'a [GlyphOffset],
    pub font: FontId,
    pub font_size: f32,
    pub bidi_level: u8,
    pub sideways: bool,
}

/// A run kept by [`GlyphRunBuffer`]; ranges index the buffer's arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphRun {
    pub text_range: Range<usize>,
    pub glyph_range: Range<usize>,
    #[serde(skip)]
    pub cluster_start: usize,
    pub font: FontId,
    pub font_size: f32,
    pub baseline_origin: Point,
    pub line_rect: Rect,
    pub width: f32,
    pub bidi_level: u8,
    pub sideways: bool,
}

impl GlyphRun {
    pub fn is_rtl(&self) -> bool {
        self.bidi_level & 1 == 1
    }
}

/// Result of [`GlyphRunBuffer::hit_test`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTest {
    pub text_position: usize,
    /// The point is on the trailing half of the cluster.
    pub is_trailing: bool,
}

/// Result of [`GlyphRunBuffer::text_position_to_point`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaretPosition {
    /// Caret position on the baseline.
    pub point: Point,
    pub font: FontId,
    pub font_size: f32,
}

/// A sink that stores everything it receives.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphRunBuffer {
    runs: Vec<GlyphRun>,
    glyph_indices: Vec<u16>,
    advances: Vec<f32>,
    offsets: Vec<GlyphOffset>,
    #[serde(skip)]
    clusters: Vec<u32>,
}

impl GlyphRunBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.runs.clear();
        self.glyph_indices.clear();
        self.advances.clear();
        self.offsets.clear();
        self.clusters.clear();
    }

    pub fn runs(&self) -> &[GlyphRun] {
        &self.runs
    }

    pub fn glyph_indices(&self, run: &GlyphRun) -> &[u16] {
        &self.glyph_indices[run.glyph_range.clone()]
    }

    pub fn advances(&self, run: &GlyphRun) -> &[f32] {
        &self.advances[run.glyph_range.clone()]
    }

    fn cluster_map(&self, run: &GlyphRun) -> &[u32] {
        &self.clusters[run.cluster_start..run.cluster_start + run.text_range.len()]
    }

    /// Draw every run, offset by `origin`.
    pub fn render<R: GlyphRenderer>(&self, renderer: &mut R, origin: Point, brush: &R::Brush) {
        for run in &self.runs {
            let view = GlyphRunView {
                glyph_indices: &self.glyph_indices[run.glyph_range.clone()],
                advances: &self.advances[run.glyph_range.clone()],
                offsets: &self.offsets[run.glyph_range.clone()],
                font: run.font,
                font_size: run.font_size,
                bidi_level: run.bidi_level,
                sideways: run.sideways,
            };
            let at = Point::new(
                origin.x + run.baseline_origin.x,
                origin.y + run.baseline_origin.y,
            );
            renderer.draw_glyph_run(at, view, brush);
        }
    }

    /// Clusters of `run` as `(first char, x start, x end)` in layout
    /// coordinates, in logical order.
    fn cluster_spans(&self, run: &GlyphRun) -> Vec<(usize, f32, f32)> {
        let map = self.cluster_map(run);
        let advances = self.advances(run);
        let mut spans = Vec::new();
        let mut pen = 0.0;
        let mut i = 0;
        while i < map.len() {
            let first_glyph = map[i] as usize;
            let start_char = i;
            while i < map.len() && map[i] == map[start_char] {
                i += 1;
            }
            let end_glyph = map.get(i).map(|&g| g as usize).unwrap_or(advances.len());
            let width: f32 = advances[first_glyph.min(end_glyph)..end_glyph].iter().sum();
            let (x0, x1) = if run.is_rtl() {
                let right = run.baseline_origin.x + run.width - pen;
                (right - width, right)
            } else {
                let left = run.baseline_origin.x + pen;
                (left, left + width)
            };
            spans.push((run.text_range.start + start_char, x0, x1));
            pen += width;
        }
        spans
    }

    /// Text position under `point`, snapping to the nearest run of the line
    /// the point falls in. `None` when no line contains the point.
    pub fn hit_test(&self, point: Point) -> Option<HitTest> {
        let on_line = self
            .runs
            .iter()
            .filter(|r| point.y >= r.line_rect.top && point.y < r.line_rect.bottom);

        let distance = |r: &GlyphRun| {
            let left = r.baseline_origin.x;
            let right = left + r.width;
            if point.x < left {
                left - point.x
            } else if point.x >= right {
                point.x - right
            } else {
                0.0
            }
        };
        let run = on_line.min_by(|a, b| distance(*a).total_cmp(&distance(*b)))?;

        let spans = self.cluster_spans(run);
        let (pos, x0, x1) = spans
            .iter()
            .copied()
            .min_by(|a, b| {
                let da = span_distance(point.x, a.1, a.2);
                let db = span_distance(point.x, b.1, b.2);
                da.total_cmp(&db)
            })?;
        let past_middle = point.x >= (x0 + x1) / 2.0;
        Some(HitTest {
            text_position: pos,
            is_trailing: past_middle != run.is_rtl(),
        })
    }

    /// Caret point for the leading (or trailing) edge of the cluster at
    /// `text_position`.
    pub fn text_position_to_point(
        &self,
        text_position: usize,
        is_trailing: bool,
    ) -> Option<CaretPosition> {
        let run = self
            .runs
            .iter()
            .find(|r| r.text_range.contains(&text_position))?;
        let spans = self.cluster_spans(run);
        let &(_, x0, x1) = spans
            .iter()
            .take_while(|s| s.0 <= text_position)
            .last()?;
        let leading_is_left = !run.is_rtl();
        let x = if is_trailing == leading_is_left { x1 } else { x0 };
        Some(CaretPosition {
            point: Point::new(x, run.baseline_origin.y),
            font: run.font,
            font_size: run.font_size,
        })
    }
}

fn span_distance(x: f32, x0: f32, x1: f32) -> f32 {
    if x < x0 {
        x0 - x
    } else if x >= x1 {
        x - x1
    } else {
        0.0
    }
}

impl GlyphSink for GlyphRunBuffer {
    fn prepare(&mut self, expected_glyph_count: usize) {
        self.clear();
        self.glyph_indices.reserve(expected_glyph_count);
        self.advances.reserve(expected_glyph_count);
        self.offsets.reserve(expected_glyph_count);
    }

    fn add_glyph_run(&mut self, run: GlyphRunRef<'_>) {
        let glyph_start = self.glyph_indices.len();
        let cluster_start = self.clusters.len();
        self.glyph_indices.extend_from_slice(run.glyph_indices);
        self.advances.extend_from_slice(run.advances);
        self.offsets.extend_from_slice(run.offsets);
        self.clusters.extend_from_slice(run.cluster_map);
        self.runs.push(GlyphRun {
            text_range: run.text_range,
            glyph_range: glyph_start..self.glyph_indices.len(),
            cluster_start,
            font: run.font,
            font_size: run.font_size,
            baseline_origin: run.baseline_origin,
            line_rect: run.line_rect,
            width: run.advances.iter().sum(),
            bidi_level: run.bidi_level,
            sideways: run.sideways,
        });
    }
}
