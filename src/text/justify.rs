//! # Justification
//!
//! Spreads a line's slack across its justification opportunities (the
//! inter-word whitespace clusters) so the line fills its area.

/// Return `advances` with the slack distributed over `opportunities`.
///
/// - `advances` are the line's glyph advances in logical order;
/// - `opportunities` are indices into `advances`, one per whitespace
///   cluster (its first glyph), excluding trailing whitespace;
/// - `natural_width` is the visible width of the line.
///
/// Nothing changes when the line already fills the area, is the last line
/// of its paragraph, or has no opportunity. The last opportunity absorbs
/// the rounding remainder so the visible width lands exactly on the target.
pub fn justified_advances(
    advances: &[f32],
    opportunities: &[usize],
    natural_width: f32,
    target_width: f32,
    is_last_line: bool,
) -> Vec<f32> {
    let mut justified = advances.to_vec();
    let slack = target_width - natural_width;
    let valid: Vec<usize> = opportunities
        .iter()
        .copied()
        .filter(|&i| i < justified.len())
        .collect();
    if slack <= 0.0 || is_last_line || valid.is_empty() {
        return justified;
    }

    let per_opportunity = slack / valid.len() as f32;
    let (last, rest) = valid.split_last().unwrap_or((&0, &[]));
    for &i in rest {
        justified[i] += per_opportunity;
    }
    justified[*last] += slack - per_opportunity * rest.len() as f32;
    justified
}
