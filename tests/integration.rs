//! Integration tests for the glyphflow layout pipeline.
//!
//! These tests exercise the full path from text and formats to positioned
//! glyph runs. They verify:
//! - Lines break at the right places and cover the whole text
//! - Mixed-direction lines come out in visual order
//! - Justification, alignment and pagination behave
//! - Broken runs degrade to notdef glyphs instead of failing
//! - The stored runs answer hit-tests and caret queries
//!
//! Everything runs on the fixed-pitch service: at font size 10 every visible
//! glyph is 5.0 wide and every line is 10.0 tall.

use glyphflow::error::ServiceError;
use glyphflow::layout::sink::GlyphRunBuffer;
use glyphflow::layout::source::StackedAreaSource;
use glyphflow::model::*;
use glyphflow::service::{
    AnalysisSink, AnalysisSource, FixedPitchFont, FixedPitchService, FontMetrics, ShapeRequest,
    ShapedGlyphs, ShapingService,
};
use glyphflow::{FlowOutcome, LayoutError, TextLayout};

// ─── Helpers ────────────────────────────────────────────────────

fn make_layout(text: &str, width: f32, height: f32) -> TextLayout {
    let mut layout = TextLayout::new();
    layout.set_text(text);
    layout.set_font_size(10.0);
    layout.set_size(Size::new(width, height));
    layout
}

fn flow_with<S: ShapingService>(
    layout: &mut TextLayout,
    service: &S,
) -> (FlowOutcome, GlyphRunBuffer) {
    let mut buffer = GlyphRunBuffer::new();
    let outcome = layout
        .flow(service, &mut StackedAreaSource::new(), &mut buffer)
        .unwrap();
    (outcome, buffer)
}

fn flow(layout: &mut TextLayout) -> (FlowOutcome, GlyphRunBuffer) {
    flow_with(layout, &FixedPitchService::new())
}

fn line_ranges(outcome: &FlowOutcome) -> Vec<std::ops::Range<usize>> {
    outcome.lines.iter().map(|l| l.text_range.clone()).collect()
}

fn font(id: u32) -> TextFormat {
    TextFormat {
        font: FontId(id),
        ..Default::default()
    }
}

/// Fixed-pitch service whose font 1 can't shape anything.
struct BrokenFont {
    inner: FixedPitchService,
}

impl ShapingService for BrokenFont {
    fn analyze(
        &self,
        source: &AnalysisSource<'_>,
        sink: &mut dyn AnalysisSink,
    ) -> Result<(), ServiceError> {
        self.inner.analyze(source, sink)
    }

    fn shape(&self, request: &ShapeRequest<'_>) -> Result<ShapedGlyphs, ServiceError> {
        if request.font == FontId(1) {
            return Err(ServiceError::Other("no glyph table".into()));
        }
        self.inner.shape(request)
    }

    fn font_metrics(&self, font: FontId) -> Option<FontMetrics> {
        (font.0 <= 1).then(|| self.inner.font_metrics(FontId(0))).flatten()
    }
}

/// Fixed-pitch service that gives tabs a 20.0 advance.
struct WideTabs {
    inner: FixedPitchService,
}

impl ShapingService for WideTabs {
    fn analyze(
        &self,
        source: &AnalysisSource<'_>,
        sink: &mut dyn AnalysisSink,
    ) -> Result<(), ServiceError> {
        self.inner.analyze(source, sink)
    }

    fn shape(&self, request: &ShapeRequest<'_>) -> Result<ShapedGlyphs, ServiceError> {
        let mut shaped = self.inner.shape(request)?;
        for (ch, &cluster) in request.text.chars().zip(&shaped.cluster_map) {
            if ch == '\t' {
                shaped.advances[cluster as usize] = 20.0;
            }
        }
        Ok(shaped)
    }

    fn font_metrics(&self, font: FontId) -> Option<FontMetrics> {
        self.inner.font_metrics(font)
    }
}

/// A service whose analysis pass always fails.
struct Unavailable;

impl ShapingService for Unavailable {
    fn analyze(
        &self,
        _source: &AnalysisSource<'_>,
        _sink: &mut dyn AnalysisSink,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::Other("service offline".into()))
    }

    fn shape(&self, _request: &ShapeRequest<'_>) -> Result<ShapedGlyphs, ServiceError> {
        Err(ServiceError::Other("service offline".into()))
    }

    fn font_metrics(&self, _font: FontId) -> Option<FontMetrics> {
        None
    }
}

// ─── Basic Flow Tests ───────────────────────────────────────────

#[test]
fn test_short_text_is_one_line() {
    let mut layout = make_layout("ab cd", 100.0, 100.0);
    let (outcome, buffer) = flow(&mut layout);

    assert_eq!(line_ranges(&outcome), vec![0..5]);
    assert!(outcome.is_complete());
    assert_eq!(buffer.runs().len(), 1);
    assert_eq!(buffer.runs()[0].text_range, 0..5);
    assert_eq!(buffer.runs()[0].width, 25.0);
}

#[test]
fn test_narrow_area_breaks_at_spaces() {
    let mut layout = make_layout("alpha beta gamma", 40.0, 100.0);
    let (outcome, _) = flow(&mut layout);

    assert_eq!(line_ranges(&outcome), vec![0..6, 6..11, 11..16]);
    // "alpha" plus its hanging space; the space is not counted.
    assert_eq!(outcome.lines[0].width, 25.0);
    let tops: Vec<f32> = outcome.lines.iter().map(|l| l.rect.top).collect();
    assert_eq!(tops, vec![0.0, 10.0, 20.0]);
}

#[test]
fn test_lines_cover_text_monotonically() {
    let text = "The quick brown fox jumps over the lazy dog, twice over.";
    for width in [1.0, 23.0, 60.0, 500.0] {
        let mut layout = make_layout(text, width, 10_000.0);
        let (outcome, _) = flow(&mut layout);
        let mut expected_start = 0;
        for line in &outcome.lines {
            assert_eq!(line.text_range.start, expected_start);
            assert!(line.text_range.end > line.text_range.start);
            expected_start = line.text_range.end;
        }
        assert_eq!(expected_start, text.chars().count());
    }
}

#[test]
fn test_newline_forces_break() {
    let mut layout = make_layout("ab\ncd", 100.0, 100.0);
    let (outcome, buffer) = flow(&mut layout);

    assert_eq!(line_ranges(&outcome), vec![0..3, 3..5]);
    let runs: Vec<_> = buffer.runs().iter().map(|r| r.text_range.clone()).collect();
    assert_eq!(runs, vec![0..2, 3..5]);
    assert_eq!(buffer.runs()[1].baseline_origin.y, 18.0);
}

#[test]
fn test_control_char_advance_moves_pen() {
    let service = WideTabs {
        inner: FixedPitchService::new(),
    };
    let mut layout = make_layout("ab\tcd", 100.0, 100.0);
    let (outcome, buffer) = flow_with(&mut layout, &service);

    assert_eq!(outcome.lines[0].width, 40.0);
    // The tab itself draws nothing.
    assert_eq!(outcome.glyph_runs, 2);
    let runs: Vec<_> = buffer
        .runs()
        .iter()
        .map(|r| (r.text_range.clone(), r.baseline_origin.x))
        .collect();
    assert_eq!(runs, vec![(0..2, 0.0), (3..5, 30.0)]);
}

#[test]
fn test_long_run_past_u16_clusters() {
    let text = "a ".repeat(40_000);
    let mut layout = make_layout(&text, 100.0, 1.0e6);
    let (outcome, buffer) = flow(&mut layout);

    assert!(outcome.is_complete());
    assert_eq!(outcome.lines.len(), 4_000);
    assert_eq!(layout.stats().shaping_failures, 0);
    let last = buffer.runs().last().unwrap();
    assert_eq!(last.text_range, 79_980..79_999);
    assert!(buffer.glyph_indices(last).iter().all(|&g| g != 0));
}

#[test]
fn test_unbreakable_word_is_split() {
    let mut layout = make_layout("abcdefghij", 20.0, 100.0);
    let (outcome, _) = flow(&mut layout);
    assert_eq!(line_ranges(&outcome), vec![0..4, 4..8, 8..10]);
}

// ─── Bidi Tests ─────────────────────────────────────────────────

#[test]
fn test_mixed_direction_in_ltr_paragraph() {
    let mut layout = make_layout("abc אבג", 100.0, 100.0);
    let (_, buffer) = flow(&mut layout);

    let runs = buffer.runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].text_range, 0..4);
    assert_eq!(runs[0].bidi_level, 0);
    assert_eq!(runs[1].text_range, 4..7);
    assert_eq!(runs[1].bidi_level, 1);
    assert_eq!(runs[1].baseline_origin.x, 20.0);
}

#[test]
fn test_rtl_paragraph_reverses_runs() {
    let mut layout = make_layout("abc אבג", 100.0, 100.0);
    layout.set_default_direction(ReadingDirection::RightToLeft);
    let (_, buffer) = flow(&mut layout);

    let order: Vec<_> = buffer.runs().iter().map(|r| r.text_range.clone()).collect();
    assert_eq!(order, vec![4..7, 3..4, 0..3]);
    let xs: Vec<f32> = buffer.runs().iter().map(|r| r.baseline_origin.x).collect();
    // Start alignment is the right edge in a right-to-left paragraph.
    assert_eq!(xs, vec![65.0, 80.0, 85.0]);
}

#[test]
fn test_format_direction_embeds_range() {
    let mut layout = make_layout("abc def", 100.0, 100.0);
    layout.set_formats(vec![FormatRange::new(
        4..7,
        TextFormat {
            direction: Some(ReadingDirection::RightToLeft),
            ..Default::default()
        },
    )]);
    let (_, buffer) = flow(&mut layout);
    let last = buffer.runs().last().unwrap();
    assert_eq!(last.text_range, 4..7);
    // Latin text keeps reading left to right inside the embedding.
    assert_eq!(last.bidi_level, 2);
    assert!(!last.is_rtl());
    assert_eq!(last.baseline_origin.x, 20.0);
    let hit = buffer.hit_test(Point::new(21.0, 5.0)).unwrap();
    assert_eq!(hit.text_position, 4);
    assert!(!hit.is_trailing);
}

#[test]
fn test_format_direction_reorders_mixed_runs() {
    let mut layout = make_layout("abc def אבג", 100.0, 100.0);
    layout.set_formats(vec![FormatRange::new(
        4..11,
        TextFormat {
            direction: Some(ReadingDirection::RightToLeft),
            ..Default::default()
        },
    )]);
    let (_, buffer) = flow(&mut layout);

    let runs = buffer.runs();
    let order: Vec<_> = runs.iter().map(|r| r.text_range.clone()).collect();
    assert_eq!(order, vec![0..4, 8..11, 4..8]);
    let levels: Vec<u8> = runs.iter().map(|r| r.bidi_level).collect();
    assert_eq!(levels, vec![0, 1, 2]);
    let xs: Vec<f32> = runs.iter().map(|r| r.baseline_origin.x).collect();
    assert_eq!(xs, vec![0.0, 20.0, 35.0]);
}

// ─── Justification & Alignment Tests ────────────────────────────

#[test]
fn test_justified_lines_fill_area() {
    let mut layout = make_layout("aa bb cc dd", 42.0, 100.0);
    layout.set_alignment(Alignment::Justified);
    let (outcome, buffer) = flow(&mut layout);

    assert_eq!(line_ranges(&outcome), vec![0..9, 9..11]);
    assert!((outcome.lines[0].width - 42.0).abs() < 1e-4);
    // Last line keeps its natural width.
    assert_eq!(outcome.lines[1].width, 10.0);

    let advances = buffer.advances(&buffer.runs()[0]);
    assert_eq!(advances.len(), 8);
    assert!((advances[2] - 6.0).abs() < 1e-4);
    assert!((advances[5] - 6.0).abs() < 1e-4);
    assert!(advances.iter().all(|&a| a >= 0.0));
}

#[test]
fn test_justification_skips_paragraph_end() {
    let mut layout = make_layout("aa bb\ncc dd", 100.0, 100.0);
    layout.set_alignment(Alignment::Justified);
    let (outcome, _) = flow(&mut layout);
    assert_eq!(outcome.lines[0].width, 25.0);
    assert_eq!(outcome.lines[1].width, 25.0);
}

#[test]
fn test_centered_line() {
    let mut layout = make_layout("abcd", 100.0, 100.0);
    layout.set_alignment(Alignment::Center);
    let (_, buffer) = flow(&mut layout);
    assert_eq!(buffer.runs()[0].baseline_origin.x, 40.0);
}

// ─── Pagination Tests ───────────────────────────────────────────

#[test]
fn test_exhausted_source_reports_remaining_text() {
    let mut layout = make_layout("alpha beta gamma", 40.0, 20.0);
    let (outcome, _) = flow(&mut layout);

    assert_eq!(line_ranges(&outcome), vec![0..6, 6..11]);
    assert!(!outcome.is_complete());
    assert_eq!(outcome.text_remaining, 5);
}

#[test]
fn test_columns_continue_the_flow() {
    let mut layout = make_layout("alpha beta gamma", 90.0, 20.0);
    let mut buffer = GlyphRunBuffer::new();
    let mut source = StackedAreaSource::with_columns(2, 10.0);
    let outcome = layout
        .flow(&FixedPitchService::new(), &mut source, &mut buffer)
        .unwrap();

    assert!(outcome.is_complete());
    let lefts: Vec<f32> = outcome.lines.iter().map(|l| l.rect.left).collect();
    assert_eq!(lefts, vec![0.0, 0.0, 50.0]);
}

#[test]
fn test_max_line_glyphs_caps_lines() {
    let mut layout = make_layout("a b c d", 1000.0, 100.0);
    layout.set_max_line_glyphs(4);
    let (outcome, _) = flow(&mut layout);
    assert_eq!(line_ranges(&outcome), vec![0..4, 4..7]);
}

// ─── Invalidation Tests ─────────────────────────────────────────

#[test]
fn test_changing_text_reflows() {
    let mut layout = make_layout("ab", 100.0, 100.0);
    let (first, _) = flow(&mut layout);
    assert_eq!(line_ranges(&first), vec![0..2]);

    layout.set_text("ab\ncd\nef");
    assert!(layout.is_invalidated());
    let (second, _) = flow(&mut layout);
    assert!(!layout.is_invalidated());
    assert_eq!(line_ranges(&second), vec![0..3, 3..6, 6..8]);
}

#[test]
fn test_flow_twice_is_stable() {
    let mut layout = make_layout("one two three", 30.0, 100.0);
    let (a, buf_a) = flow(&mut layout);
    let (b, buf_b) = flow(&mut layout);
    assert_eq!(a, b);
    assert_eq!(buf_a.runs(), buf_b.runs());
}

// ─── Degradation Tests ──────────────────────────────────────────

#[test]
fn test_shaping_failure_yields_notdef() {
    let service = BrokenFont {
        inner: FixedPitchService::new(),
    };
    let mut layout = make_layout("ab cd", 100.0, 100.0);
    layout.set_formats(vec![FormatRange::new(3..5, font(1))]);
    let (outcome, buffer) = flow_with(&mut layout, &service);

    assert!(outcome.is_complete());
    assert_eq!(layout.stats().shaping_failures, 1);
    let broken = buffer
        .runs()
        .iter()
        .find(|r| r.font == FontId(1))
        .unwrap();
    assert_eq!(broken.text_range, 3..5);
    assert_eq!(buffer.glyph_indices(broken), &[0, 0]);
    assert_eq!(broken.width, 10.0);
}

#[test]
fn test_unknown_format_font_is_an_error() {
    let mut layout = make_layout("ab", 100.0, 100.0);
    layout.set_formats(vec![FormatRange::new(0..1, font(4))]);
    let err = layout
        .flow(
            &FixedPitchService::new(),
            &mut StackedAreaSource::new(),
            &mut GlyphRunBuffer::new(),
        )
        .unwrap_err();
    assert!(matches!(err, LayoutError::InvalidFont(FontId(4))));
}

#[test]
fn test_analysis_failure_is_an_error() {
    let mut layout = make_layout("ab", 100.0, 100.0);
    let err = layout
        .flow(&Unavailable, &mut StackedAreaSource::new(), &mut GlyphRunBuffer::new())
        .unwrap_err();
    assert!(matches!(err, LayoutError::Service(_)));
}

#[test]
fn test_out_of_range_format_is_clamped() {
    let mut layout = make_layout("abc", 100.0, 100.0);
    layout.set_formats(vec![FormatRange::new(1..50, font(0))]);
    let (outcome, _) = flow(&mut layout);
    assert!(outcome.is_complete());
    assert_eq!(layout.stats().format_anomalies, 1);
}

// ─── Font Fallback Tests ────────────────────────────────────────

#[test]
fn test_fallback_splits_at_coverage_change() {
    let service = FixedPitchService::with_fonts(vec![
        FixedPitchFont::covering(vec!['a'..='z']),
        FixedPitchFont::default(),
    ]);
    let mut layout = make_layout("ab€cd", 100.0, 100.0);
    layout.set_fallback(FallbackPolicy::FirstCovering(vec![FontId(1)]));
    let (_, buffer) = flow_with(&mut layout, &service);

    let runs: Vec<_> = buffer
        .runs()
        .iter()
        .map(|r| (r.text_range.clone(), r.font))
        .collect();
    assert_eq!(
        runs,
        vec![(0..2, FontId(0)), (2..3, FontId(1)), (3..5, FontId(0))]
    );
    assert_eq!(layout.stats().font_substitutions, 1);
}

#[test]
fn test_fallback_disabled_keeps_font() {
    let service = FixedPitchService::with_fonts(vec![
        FixedPitchFont::covering(vec!['a'..='z']),
        FixedPitchFont::default(),
    ]);
    let mut layout = make_layout("ab€cd", 100.0, 100.0);
    let (_, buffer) = flow_with(&mut layout, &service);
    assert_eq!(buffer.runs().len(), 1);
    // The uncovered char shapes as notdef.
    assert_eq!(buffer.glyph_indices(&buffer.runs()[0])[2], 0);
}

// ─── Number Substitution Tests ──────────────────────────────────

#[test]
fn test_national_digits() {
    let mut layout = make_layout("ab 12", 100.0, 100.0);
    layout.set_locale("ar-EG");
    layout.set_number_substitution(NumberSubstitution::National);
    let (_, buffer) = flow(&mut layout);

    let digits = buffer
        .runs()
        .iter()
        .find(|r| r.text_range == (3..5))
        .unwrap();
    assert_eq!(buffer.glyph_indices(digits), &[0x0661, 0x0662]);
}

// ─── Hit-Testing Tests ──────────────────────────────────────────

#[test]
fn test_caret_and_hit_test_round_trip() {
    let mut layout = make_layout("hello world and more", 40.0, 100.0);
    let (outcome, buffer) = flow(&mut layout);
    assert!(outcome.lines.len() > 1);

    for run in buffer.runs() {
        for pos in run.text_range.clone() {
            let caret = buffer.text_position_to_point(pos, false).unwrap();
            let probe = Point::new(caret.point.x + 1.0, caret.point.y - 1.0);
            let hit = buffer.hit_test(probe).unwrap();
            assert_eq!(hit.text_position, pos);
            assert!(!hit.is_trailing);
            assert_eq!(caret.font_size, 10.0);
        }
    }
}

#[test]
fn test_hit_test_rtl_run() {
    let mut layout = make_layout("אבג", 100.0, 100.0);
    let (_, buffer) = flow(&mut layout);
    // The run sits at [0, 15); its first char is drawn rightmost.
    let hit = buffer.hit_test(Point::new(14.0, 5.0)).unwrap();
    assert_eq!(hit.text_position, 0);
    let hit = buffer.hit_test(Point::new(1.0, 5.0)).unwrap();
    assert_eq!(hit.text_position, 2);
}

// ─── JSON Entry Tests ───────────────────────────────────────────

#[test]
fn test_layout_json_end_to_end() {
    let json = r#"{
        "text": "alpha beta gamma",
        "fontSize": 10,
        "size": { "width": 40, "height": 100 },
        "alignment": "Center"
    }"#;
    let result = glyphflow::layout_json(json, &FixedPitchService::new()).unwrap();
    assert_eq!(line_ranges(&result.outcome), vec![0..6, 6..11, 11..16]);
    assert_eq!(result.stats.shaping_failures, 0);

    let value = serde_json::to_value(&result).unwrap();
    assert!(value["outcome"]["lines"].is_array());
    assert!(value["glyphs"]["runs"][0]["baselineOrigin"].is_object());
}

#[test]
fn test_layout_json_columns() {
    let json = r#"{
        "text": "alpha beta gamma",
        "fontSize": 10,
        "size": { "width": 90, "height": 20 },
        "columns": 2,
        "columnGap": 10
    }"#;
    let result = glyphflow::layout_json(json, &FixedPitchService::new()).unwrap();
    assert!(result.outcome.is_complete());
    assert_eq!(result.outcome.lines[2].rect.left, 50.0);
}

#[test]
fn test_layout_json_format_at_max_start() {
    let json = r#"{
        "text": "abc",
        "fontSize": 10,
        "size": { "width": 100, "height": 100 },
        "formats": [
            { "start": 18446744073709551615, "len": 2, "format": { "font": 0 } }
        ]
    }"#;
    let result = glyphflow::layout_json(json, &FixedPitchService::new()).unwrap();
    assert!(result.outcome.is_complete());
    assert_eq!(result.stats.format_anomalies, 1);
}

#[test]
fn test_layout_json_max_line_glyphs() {
    let json = r#"{
        "text": "a b c d",
        "fontSize": 10,
        "size": { "width": 1000, "height": 100 },
        "maxLineGlyphs": 4
    }"#;
    let result = glyphflow::layout_json(json, &FixedPitchService::new()).unwrap();
    assert_eq!(line_ranges(&result.outcome), vec![0..4, 4..7]);
}

#[test]
fn test_layout_json_rejects_bad_input() {
    let err = glyphflow::layout_json("{ \"text\": ", &FixedPitchService::new()).unwrap_err();
    assert!(matches!(err, LayoutError::Parse { .. }));

    let err = glyphflow::layout_json("{ \"text\": 5 }", &FixedPitchService::new()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Hint:"), "missing hint in {msg:?}");
}

// ─── Font Service Tests ─────────────────────────────────────────

use glyphflow::text::ScriptAnalysis;
use glyphflow::FontService;

/// Load a system font covering every char of `required`. Returns None if
/// none is available.
fn load_test_font(required: &str) -> Option<Vec<u8>> {
    let paths = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
        "/usr/share/fonts/truetype/noto/NotoSansHebrew-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial Unicode.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    for path in &paths {
        if let Ok(data) = std::fs::read(path) {
            let covers = ttf_parser::Face::parse(&data, 0)
                .is_ok_and(|face| required.chars().all(|ch| face.glyph_index(ch).is_some()));
            if covers {
                return Some(data);
            }
        }
    }
    None
}

/// The font's cmap glyph for each char of `text`.
fn cmap_glyphs(data: &[u8], text: &str) -> Vec<u16> {
    let face = ttf_parser::Face::parse(data, 0).unwrap();
    text.chars()
        .map(|ch| face.glyph_index(ch).map_or(0, |g| g.0))
        .collect()
}

fn font_service(data: &[u8]) -> FontService {
    let mut service = FontService::new();
    service.add_font(data.to_vec()).unwrap();
    service
}

fn font_request<'a>(text: &'a str, script: &str, bidi_level: u8) -> ShapeRequest<'a> {
    ShapeRequest {
        text,
        font: FontId(0),
        font_size: 10.0,
        locale: "en",
        bidi_level,
        sideways: false,
        script: ScriptAnalysis::from_tag(script),
        number_substitution: None,
    }
}

#[test]
fn test_font_rtl_glyphs_in_logical_order() {
    let Some(data) = load_test_font("אבג") else {
        eprintln!("Skipping: no test font with Hebrew found");
        return;
    };
    let service = font_service(&data);
    let shaped = service.shape(&font_request("אבג", "Hebr", 1)).unwrap();

    assert_eq!(shaped.glyph_indices, cmap_glyphs(&data, "אבג"));
    assert_eq!(shaped.cluster_map, vec![0, 1, 2]);
    assert!(shaped.advances.iter().all(|&a| a > 0.0));
}

#[test]
fn test_font_ligature_cluster_map() {
    let Some(data) = load_test_font("fi") else {
        eprintln!("Skipping: no test TTF font found");
        return;
    };
    let service = font_service(&data);
    let shaped = service.shape(&font_request("fix", "Latn", 0)).unwrap();

    assert_eq!(shaped.cluster_map.len(), 3);
    if shaped.glyph_indices.len() == 2 {
        // "fi" became one glyph; both chars share its cluster.
        assert_eq!(shaped.cluster_map, vec![0, 0, 1]);
        assert_eq!(shaped.glyph_indices[1], cmap_glyphs(&data, "x")[0]);
    } else {
        eprintln!("Skipping ligature check: font has no fi ligature");
        assert_eq!(shaped.cluster_map, vec![0, 1, 2]);
    }
}

#[test]
fn test_font_digit_substitution() {
    let Some(data) = load_test_font("12\u{0661}\u{0662}") else {
        eprintln!("Skipping: no test font with Arabic-Indic digits found");
        return;
    };
    let service = font_service(&data);

    let mut request = font_request("12", "Zyyy", 0);
    request.locale = "ar";
    let plain = service.shape(&request).unwrap();
    assert_eq!(plain.glyph_indices, cmap_glyphs(&data, "12"));

    request.number_substitution = Some(NumberSubstitution::National);
    let native = service.shape(&request).unwrap();
    assert_eq!(native.glyph_indices, cmap_glyphs(&data, "\u{0661}\u{0662}"));
    assert_eq!(native.cluster_map, vec![0, 1]);
}

#[test]
fn test_font_coverage_matches_cmap() {
    let Some(data) = load_test_font("a") else {
        eprintln!("Skipping: no test TTF font found");
        return;
    };
    let service = font_service(&data);
    let face = ttf_parser::Face::parse(&data, 0).unwrap();

    for ch in ['a', 'Z', ' ', 'é', 'א', '\u{0661}', '\u{4E2D}', '\u{10FFFD}'] {
        assert_eq!(
            service.covers(FontId(0), ch),
            face.glyph_index(ch).is_some(),
            "coverage of {ch:?}"
        );
    }
}

#[test]
fn test_font_flow_mixed_direction() {
    let Some(data) = load_test_font("abc אבג") else {
        eprintln!("Skipping: no test font with Hebrew found");
        return;
    };
    let service = font_service(&data);
    let mut layout = make_layout("abc אבג", 1000.0, 100.0);
    let (outcome, buffer) = flow_with(&mut layout, &service);

    assert!(outcome.is_complete());
    assert_eq!(layout.stats().shaping_failures, 0);
    let runs = buffer.runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1].text_range, 4..7);
    assert!(runs[1].is_rtl());
    assert_eq!(buffer.glyph_indices(&runs[1]), cmap_glyphs(&data, "אבג").as_slice());
    assert!((runs[1].baseline_origin.x - runs[0].width).abs() < 1e-3);
}
