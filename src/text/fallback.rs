//! # Font Fallback
//!
//! Splits runs where the requested font stops covering the text, and
//! assigns a substitute font to the uncovered parts according to the
//! configured [`FallbackPolicy`].
//!
//! Whitespace and control characters never start a new segment; they stay
//! with whatever font the preceding character got.

use std::ops::Range;

use crate::model::{FallbackPolicy, FontId, TextFormat};
use crate::service::ShapingService;
use crate::text::runs::RunTable;

/// Apply `policy` to `runs`. Returns the number of substituted segments.
pub fn substitute_fonts<S: ShapingService + ?Sized>(
    service: &S,
    text: &[char],
    runs: &mut RunTable,
    formats: &[TextFormat],
    policy: &FallbackPolicy,
) -> usize {
    let FallbackPolicy::FirstCovering(candidates) = policy else {
        return 0;
    };

    let mut segments: Vec<(Range<usize>, FontId)> = Vec::new();
    for run in runs.iter() {
        let font = formats.get(run.format.0).map(|f| f.font).unwrap_or_default();
        let mut current: Option<(usize, Option<FontId>)> = None;

        for pos in run.text_range() {
            let ch = text[pos];
            if ch.is_whitespace() || ch.is_control() {
                continue;
            }
            let choice = if service.covers(font, ch) {
                None
            } else {
                candidates.iter().copied().find(|&f| service.covers(f, ch))
            };
            match current {
                Some((_, prev)) if prev == choice => {}
                Some((start, Some(prev))) => {
                    segments.push((start..pos, prev));
                    current = Some((pos, choice));
                }
                Some((_, None)) => current = Some((pos, choice)),
                None => current = Some((run.text_start, choice)),
            }
        }
        if let Some((start, Some(sub))) = current {
            segments.push((start..run.text_end(), sub));
        }
    }

    for (range, font) in &segments {
        log::debug!(
            target: "glyphflow::fallback",
            "substituting font {:?} for {:?}",
            font,
            range
        );
        let Ok(inner) = runs.split_range(range.clone()) else {
            continue;
        };
        for run in &mut runs.runs_mut()[inner] {
            run.font_substitute = Some(*font);
        }
    }
    segments.len()
}
