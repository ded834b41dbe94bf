//! # Line Fitting
//!
//! Greedy fitting with lookback: walk forward cluster by cluster, remember
//! the furthest break opportunity that still fits, and fall back to it once
//! the next cluster would overflow.
//!
//! Whitespace clusters never overflow; trailing spaces hang past the edge
//! of the area and are excluded from the visible width later on.

use crate::text::cluster::{ClusterMap, ClusterPosition};
use crate::text::{break_condition_at, BreakCondition, Breakpoint};

/// Find the end of the line that starts at `start`.
///
/// The result is always strictly after `start` unless `start` is already at
/// the end of the text, so a pagination loop driven by it cannot stall.
/// When no break opportunity fits, the line is broken after the last
/// cluster that does fit, or after a single cluster when even the first one
/// is wider than `max_width`.
pub fn fit_text(
    map: &ClusterMap<'_>,
    breakpoints: &[Breakpoint],
    start: &ClusterPosition,
    max_glyph_count: usize,
    max_width: f32,
) -> ClusterPosition {
    let text_len = map.text_len();
    if start.text_position >= text_len {
        return *start;
    }

    let glyph_base = map.glyph_start(start);
    let mut cluster = *start;
    let mut text_width = 0.0;
    let mut best: Option<ClusterPosition> = None;

    while cluster.text_position < text_len {
        let mut next = cluster;
        map.advance(&mut next);

        let advance = map.range_width(&cluster, &next);
        let is_whitespace = breakpoints
            .get(cluster.text_position)
            .is_some_and(|bp| bp.is_whitespace);
        if text_width + advance > max_width && !is_whitespace {
            break;
        }
        if map.glyph_start(&next).saturating_sub(glyph_base) > max_glyph_count {
            break;
        }
        text_width += advance;
        cluster = next;

        match break_condition_at(breakpoints, next.text_position) {
            BreakCondition::MustBreak => {
                best = Some(next);
                break;
            }
            BreakCondition::CanBreak => best = Some(next),
            _ => {}
        }
    }

    match best {
        Some(end) => end,
        None if cluster.text_position > start.text_position => cluster,
        None => {
            let mut forced = *start;
            map.advance(&mut forced);
            forced
        }
    }
}
