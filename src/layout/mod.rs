//! # Text Layout
//!
//! [`TextLayout`] owns one piece of formatted text and flows it into the
//! areas a [`PaginationSource`] hands out, one line per area.
//!
//! ## Pipeline
//!
//! Analysis runs once per configuration change:
//!
//! 1. The shaping service reports scripts, bidi levels, digits and
//!    breakpoints, folded into a run table ([`TextAnalysis`]).
//! 2. Caller format ranges split the table further ([`merge_formats`]).
//! 3. Runs the format's font can't render get a substitute font
//!    ([`substitute_fonts`]).
//! 4. Every run is shaped into the shared glyph arrays ([`shape_runs`]).
//!
//! Flowing then repeats, per line: ask the source for an area, fit as many
//! clusters as the area is wide, order the line's runs visually, justify
//! if asked to, and hand each run slice to the [`GlyphSink`].
//!
//! The layout never asks for the same area twice. If the source runs out
//! before the text does, the flow stops and reports how much is left; the
//! caller decides whether that is an error.

pub mod sink;
pub mod source;

use std::ops::Range;

use serde::Serialize;

use crate::error::LayoutError;
use crate::model::{
    Alignment, FallbackPolicy, FontId, FormatRange, LayoutConfig, NumberSubstitution, Point,
    ReadingDirection, Rect, Size, TextFormat,
};
use crate::service::{AnalysisSource, ShapingService};
use crate::text::analysis::TextAnalysis;
use crate::text::bidi::bidi_ordering;
use crate::text::cluster::ClusterMap;
use crate::text::fallback::substitute_fonts;
use crate::text::fit::fit_text;
use crate::text::format::{embed_directions, merge_formats};
use crate::text::justify::justified_advances;
use crate::text::runs::{find_run, Run};
use crate::text::shaping::{shape_runs, GlyphBuffers, ShapingContext};
use crate::text::{break_condition_at, BreakCondition, Breakpoint, ScriptShapes};

use sink::{GlyphRunRef, GlyphSink};
use source::PaginationSource;

/// Counters for anomalies the pipeline absorbed during the last analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutStats {
    /// Analysis reports that were clamped or dropped.
    pub analysis_anomalies: usize,
    /// Format ranges that were clamped or skipped.
    pub format_anomalies: usize,
    /// Text segments that got a fallback font.
    pub font_substitutions: usize,
    /// Runs shaped as notdef glyphs.
    pub shaping_failures: usize,
    pub runs: usize,
    pub glyphs: usize,
}

/// One placed line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMetrics {
    /// Text consumed by the line, hanging whitespace included.
    pub text_range: Range<usize>,
    pub rect: Rect,
    /// Visible width after justification.
    pub width: f32,
    pub baseline: f32,
    pub glyph_runs: usize,
}

/// What a call to [`TextLayout::flow`] produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOutcome {
    pub lines: Vec<LineMetrics>,
    /// Glyph runs handed to the sink.
    pub glyph_runs: usize,
    /// Chars left over because the source ran out of areas.
    pub text_remaining: usize,
}

impl FlowOutcome {
    pub fn is_complete(&self) -> bool {
        self.text_remaining == 0
    }
}

/// A run slice on one line.
#[derive(Debug, Clone)]
struct LineSlice {
    run_index: usize,
    text_range: Range<usize>,
    glyph_range: Range<usize>,
    /// Offset of the slice's advances in the line's advance array.
    line_start: usize,
}

/// Formatted text plus everything derived from it.
#[derive(Debug, Clone)]
pub struct TextLayout {
    invalidated: bool,

    text: Vec<char>,
    formats: Vec<FormatRange>,
    default_format: TextFormat,
    direction: ReadingDirection,
    locale: String,
    font_size: f32,
    size: Size,
    alignment: Alignment,
    number_substitution: NumberSubstitution,
    fallback: FallbackPolicy,
    line_spacing: f32,
    max_line_glyphs: usize,

    // Analysis results
    format_table: Vec<TextFormat>,
    runs: Vec<Run>,
    breakpoints: Vec<Breakpoint>,
    glyphs: GlyphBuffers,
    line_height: f32,
    max_descent: f32,
    stats: LayoutStats,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayout {
    pub fn new() -> Self {
        Self {
            invalidated: true,
            text: Vec::new(),
            formats: Vec::new(),
            default_format: TextFormat::default(),
            direction: ReadingDirection::LeftToRight,
            locale: "en-US".to_string(),
            font_size: 12.0,
            size: Size::default(),
            alignment: Alignment::Start,
            number_substitution: NumberSubstitution::None,
            fallback: FallbackPolicy::Disabled,
            line_spacing: 1.0,
            max_line_glyphs: usize::MAX,
            format_table: Vec::new(),
            runs: Vec::new(),
            breakpoints: Vec::new(),
            glyphs: GlyphBuffers::default(),
            line_height: 0.0,
            max_descent: 0.0,
            stats: LayoutStats::default(),
        }
    }

    /// Build a layout from its declarative form.
    pub fn from_config(config: &LayoutConfig) -> Self {
        let mut layout = Self::new();
        layout.set_text(&config.text);
        layout.set_formats(config.formats.clone());
        layout.set_default_format(config.default_format.clone());
        layout.set_default_direction(config.direction);
        layout.set_locale(config.locale.clone());
        layout.set_font_size(config.font_size);
        layout.set_size(config.size);
        layout.set_alignment(config.alignment);
        layout.set_number_substitution(config.number_substitution);
        layout.set_fallback(config.fallback.clone());
        layout.set_line_spacing(config.line_spacing);
        if let Some(max) = config.max_line_glyphs {
            layout.set_max_line_glyphs(max);
        }
        layout
    }

    // ── Configuration ──────────────────────────────────────────

    pub fn set_text(&mut self, text: &str) {
        self.text = text.chars().collect();
        self.invalidated = true;
    }

    /// Replace the format ranges. Positions are char indices.
    pub fn set_formats(&mut self, formats: Vec<FormatRange>) {
        self.formats = formats;
        self.invalidated = true;
    }

    /// Format of text no range covers.
    pub fn set_default_format(&mut self, format: TextFormat) {
        self.default_format = format;
        self.invalidated = true;
    }

    pub fn set_default_direction(&mut self, direction: ReadingDirection) {
        self.direction = direction;
        self.invalidated = true;
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
        self.invalidated = true;
    }

    pub fn set_font_size(&mut self, font_size: f32) {
        self.font_size = font_size;
        self.invalidated = true;
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
        self.invalidated = true;
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
        self.invalidated = true;
    }

    pub fn set_number_substitution(&mut self, substitution: NumberSubstitution) {
        self.number_substitution = substitution;
        self.invalidated = true;
    }

    pub fn set_fallback(&mut self, fallback: FallbackPolicy) {
        self.fallback = fallback;
        self.invalidated = true;
    }

    /// Multiplier applied to the natural line height.
    pub fn set_line_spacing(&mut self, line_spacing: f32) {
        self.line_spacing = line_spacing;
        self.invalidated = true;
    }

    /// Cap on the number of glyphs per line.
    pub fn set_max_line_glyphs(&mut self, max_line_glyphs: usize) {
        self.max_line_glyphs = max_line_glyphs;
        self.invalidated = true;
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    /// Runs of the last analysis.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn glyphs(&self) -> &GlyphBuffers {
        &self.glyphs
    }

    /// Height requested from the source for every line.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn stats(&self) -> LayoutStats {
        self.stats
    }

    // ── Analysis ───────────────────────────────────────────────

    /// Analyze, merge, substitute and shape the text.
    ///
    /// Fails if the service can't analyze the text or a format names a font
    /// the service doesn't know. Everything else is absorbed and counted in
    /// [`stats`](Self::stats).
    pub fn analyze<S: ShapingService + ?Sized>(&mut self, service: &S) -> Result<(), LayoutError> {
        let text: String = self.text.iter().collect();
        let source = AnalysisSource {
            text: &text,
            locale: &self.locale,
            direction: self.direction,
            number_substitution: self.number_substitution,
        };
        let (mut table, breakpoints, analysis_anomalies) =
            TextAnalysis::analyze(service, &source)?.into_parts();

        let format_anomalies = merge_formats(&mut table, &self.formats);
        let format_table: Vec<TextFormat> = std::iter::once(self.default_format.clone())
            .chain(self.formats.iter().map(|r| r.format.clone()))
            .collect();
        if let Some(unknown) = format_table
            .iter()
            .find(|f| service.font_metrics(f.font).is_none())
        {
            return Err(LayoutError::InvalidFont(unknown.font));
        }
        embed_directions(&mut table, &format_table, self.direction);

        let font_substitutions =
            substitute_fonts(service, &self.text, &mut table, &format_table, &self.fallback);

        let mut runs = table.into_runs();
        let ctx = ShapingContext {
            text: &self.text,
            formats: &format_table,
            locale: &self.locale,
            font_size: self.font_size,
            number_substitution: self.number_substitution,
        };
        let (glyphs, shaping_failures) = shape_runs(service, &ctx, &mut runs);

        let mut fonts: Vec<FontId> = runs.iter().map(|r| ctx.run_font(r)).collect();
        fonts.push(self.default_format.font);
        fonts.sort();
        fonts.dedup();
        let (mut line_height, mut max_descent) = (0.0f32, 0.0f32);
        for metrics in fonts.iter().filter_map(|&f| service.font_metrics(f)) {
            line_height = line_height.max(metrics.line_height_at(self.font_size));
            max_descent = max_descent.max(metrics.descent_at(self.font_size));
        }

        self.stats = LayoutStats {
            analysis_anomalies,
            format_anomalies,
            font_substitutions,
            shaping_failures,
            runs: runs.len(),
            glyphs: glyphs.len(),
        };
        self.line_height = line_height * self.line_spacing;
        self.max_descent = max_descent;
        self.format_table = format_table;
        self.runs = runs;
        self.breakpoints = breakpoints;
        self.glyphs = glyphs;
        self.invalidated = false;

        log::debug!(
            target: "glyphflow::layout",
            "analysis done: {:?}, line height {}",
            self.stats,
            self.line_height
        );
        Ok(())
    }

    // ── Flow ───────────────────────────────────────────────────

    /// Flow the text into `source`'s areas, emitting glyph runs to `sink`.
    ///
    /// Re-analyzes first if the configuration changed since the last
    /// analysis. Running out of areas is not an error; see
    /// [`FlowOutcome::text_remaining`].
    pub fn flow<S, P, K>(
        &mut self,
        service: &S,
        source: &mut P,
        sink: &mut K,
    ) -> Result<FlowOutcome, LayoutError>
    where
        S: ShapingService + ?Sized,
        P: PaginationSource + ?Sized,
        K: GlyphSink + ?Sized,
    {
        if self.invalidated {
            self.analyze(service)?;
        }

        source.reset(self.size);
        sink.prepare(self.glyphs.len());

        let map = ClusterMap {
            runs: &self.runs,
            clusters: &self.glyphs.clusters,
            advances: &self.glyphs.advances,
        };
        let text_len = self.text.len();
        let mut cursor = map.position(0);
        let mut outcome = FlowOutcome::default();

        while cursor.text_position < text_len {
            let Some(rect) = source.next_area(self.line_height) else {
                log::debug!(
                    target: "glyphflow::layout",
                    "source exhausted at {} of {}",
                    cursor.text_position,
                    text_len
                );
                break;
            };
            let end = fit_text(
                &map,
                &self.breakpoints,
                &cursor,
                self.max_line_glyphs,
                rect.width(),
            );
            let line = self.emit_line(cursor.text_position..end.text_position, rect, sink);
            outcome.glyph_runs += line.glyph_runs;
            outcome.lines.push(line);
            cursor = end;
        }

        outcome.text_remaining = text_len - cursor.text_position;
        log::debug!(
            target: "glyphflow::layout",
            "flowed {} lines, {} glyph runs, {} chars remaining",
            outcome.lines.len(),
            outcome.glyph_runs,
            outcome.text_remaining
        );
        Ok(outcome)
    }

    /// Place the line `text` in `rect` and hand its visible slices to the
    /// sink in visual order.
    fn emit_line<K: GlyphSink + ?Sized>(
        &self,
        text: Range<usize>,
        rect: Rect,
        sink: &mut K,
    ) -> LineMetrics {
        let visible_end = self.visible_end(&text);
        let (slices, advances) = self.line_slices(text.start, visible_end);

        let natural_width: f32 = advances.iter().sum();
        let advances = if self.alignment == Alignment::Justified {
            let opportunities = self.justification_opportunities(&slices);
            justified_advances(
                &advances,
                &opportunities,
                natural_width,
                rect.width(),
                self.is_paragraph_end(text.end),
            )
        } else {
            advances
        };
        let width: f32 = advances.iter().sum();

        let baseline = rect.bottom - self.max_descent;
        let mut pen = rect.left + self.alignment_offset(rect.width() - width);

        let levels: Vec<u8> = slices
            .iter()
            .map(|s| self.runs[s.run_index].bidi_level)
            .collect();
        let mut glyph_runs = 0;
        for i in bidi_ordering(&levels) {
            let slice = &slices[i];
            let run = &self.runs[slice.run_index];
            let slice_advances = &advances[slice.line_start..slice.line_start + slice.glyph_range.len()];
            if run.script.shapes == ScriptShapes::NoVisual {
                pen += slice_advances.iter().sum::<f32>();
                continue;
            }
            let first = (slice.glyph_range.start - run.glyph_start) as u32;
            let cluster_map: Vec<u32> = self.glyphs.clusters[slice.text_range.clone()]
                .iter()
                .map(|&c| c.saturating_sub(first))
                .collect();

            sink.add_glyph_run(GlyphRunRef {
                text_range: slice.text_range.clone(),
                glyph_indices: &self.glyphs.indices[slice.glyph_range.clone()],
                advances: slice_advances,
                offsets: &self.glyphs.offsets[slice.glyph_range.clone()],
                cluster_map: &cluster_map,
                font: self.run_font(run),
                font_size: self.font_size,
                baseline_origin: Point::new(pen, baseline),
                line_rect: rect,
                bidi_level: run.bidi_level,
                sideways: run.sideways,
            });
            pen += slice_advances.iter().sum::<f32>();
            glyph_runs += 1;
        }

        LineMetrics {
            text_range: text,
            rect,
            width,
            baseline,
            glyph_runs,
        }
    }

    /// End of the line without its trailing whitespace.
    fn visible_end(&self, line: &Range<usize>) -> usize {
        let mut end = line.end;
        while end > line.start && self.breakpoints.get(end - 1).is_some_and(|bp| bp.is_whitespace) {
            end -= 1;
        }
        end
    }

    /// Run slices of `[start, end)` in logical order, plus the line's
    /// advances in the same order. Slices of no-visual runs are included so
    /// their advances still move the pen.
    fn line_slices(&self, start: usize, end: usize) -> (Vec<LineSlice>, Vec<f32>) {
        let mut slices = Vec::new();
        let mut advances = Vec::new();
        let Some(first) = find_run(&self.runs, start) else {
            return (slices, advances);
        };

        for (run_index, run) in self.runs.iter().enumerate().skip(first) {
            if run.text_start >= end {
                break;
            }
            let text_range = run.text_start.max(start)..run.text_end().min(end);
            let glyph_range = self.slice_glyphs(run, &text_range);
            let line_start = advances.len();
            advances.extend_from_slice(&self.glyphs.advances[glyph_range.clone()]);
            slices.push(LineSlice {
                run_index,
                text_range,
                glyph_range,
                line_start,
            });
        }
        (slices, advances)
    }

    /// Absolute glyph range covering `text` within `run`.
    fn slice_glyphs(&self, run: &Run, text: &Range<usize>) -> Range<usize> {
        let run_glyph_end = run.glyph_start + run.glyph_count;
        let start = run.glyph_start + self.glyphs.clusters[text.start] as usize;
        let end = if text.end >= run.text_end() {
            run_glyph_end
        } else {
            run.glyph_start + self.glyphs.clusters[text.end] as usize
        };
        start.min(run_glyph_end)..end.clamp(start.min(run_glyph_end), run_glyph_end)
    }

    /// Indices into the line's advances of the first glyph of every
    /// whitespace cluster.
    fn justification_opportunities(&self, slices: &[LineSlice]) -> Vec<usize> {
        let mut opportunities = Vec::new();
        for slice in slices {
            let run = &self.runs[slice.run_index];
            for pos in slice.text_range.clone() {
                let is_cluster_start = pos == run.text_start
                    || self.glyphs.clusters[pos] != self.glyphs.clusters[pos - 1];
                if !is_cluster_start || !self.breakpoints[pos].is_whitespace {
                    continue;
                }
                let glyph = run.glyph_start + self.glyphs.clusters[pos] as usize;
                if slice.glyph_range.contains(&glyph) {
                    opportunities.push(slice.line_start + glyph - slice.glyph_range.start);
                }
            }
        }
        opportunities
    }

    /// The line ending at `end` is the last of its paragraph.
    fn is_paragraph_end(&self, end: usize) -> bool {
        end >= self.text.len()
            || break_condition_at(&self.breakpoints, end) == BreakCondition::MustBreak
    }

    /// Horizontal offset of a line with `free` unused width.
    fn alignment_offset(&self, free: f32) -> f32 {
        let rtl = self.direction.is_rtl();
        match self.alignment {
            Alignment::Center => free / 2.0,
            Alignment::Start | Alignment::Justified if rtl => free,
            Alignment::End if !rtl => free,
            _ => 0.0,
        }
    }

    fn run_font(&self, run: &Run) -> FontId {
        run.font_substitute.unwrap_or_else(|| {
            self.format_table
                .get(run.format.0)
                .map(|f| f.font)
                .unwrap_or(self.default_format.font)
        })
    }
}
