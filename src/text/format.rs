//! # Format Merge
//!
//! Intersects the analysis run table with the caller's format ranges so
//! every run is homogeneous in both analysis and formatting.
//!
//! Runs reference formats by [`FormatIndex`]: index 0 is the layout's
//! default format, caller range `i` becomes index `i + 1`. Text no range
//! covers keeps the default.
//!
//! Ranges are applied in increasing start order. Overlapping ranges are a
//! caller error with last-applied-wins behavior; the result is not
//! corrected.

use crate::model::{FormatIndex, FormatRange, ReadingDirection, TextFormat};
use crate::text::runs::RunTable;

/// Assign format indices to `runs`, splitting at every range boundary.
///
/// Returns the number of ranges that had to be clamped or skipped.
pub fn merge_formats(runs: &mut RunTable, formats: &[FormatRange]) -> usize {
    let text_len = runs.text_len();
    let mut order: Vec<usize> = (0..formats.len()).collect();
    order.sort_by_key(|&i| formats[i].start);

    let mut anomalies = 0;
    for i in order {
        let range = formats[i].range();
        let clamped = range.start.min(text_len)..range.end.min(text_len);
        if clamped != range {
            anomalies += 1;
            log::warn!(
                target: "glyphflow::format",
                "format range {:?} exceeds text length {}; clamped",
                range,
                text_len
            );
        }
        if clamped.is_empty() {
            continue;
        }
        let Ok(inner) = runs.split_range(clamped) else {
            continue;
        };
        for run in &mut runs.runs_mut()[inner] {
            run.format = FormatIndex(i + 1);
        }
    }
    anomalies
}

/// Raise the bidi level of runs whose format asks for a reading direction
/// other than the paragraph's, as a directional embedding would.
///
/// The embedding level is the least level above the paragraph level with
/// the requested parity. A run below it is raised to the embedding level
/// when its resolved direction matches the embedding, and one level above
/// when it doesn't, so left-to-right text inside a right-to-left embedding
/// still reads left to right. Runs already at or above the embedding level
/// keep their level. Returns the number of runs changed.
pub fn embed_directions(runs: &mut RunTable, formats: &[TextFormat], base: ReadingDirection) -> usize {
    let base_level = base.base_level();
    let mut changed = 0;
    for run in runs.runs_mut() {
        let Some(direction) = formats.get(run.format.0).and_then(|f| f.direction) else {
            continue;
        };
        if direction == base {
            continue;
        }
        let parity = direction.base_level();
        let embedding = if (base_level + 1) & 1 == parity {
            base_level + 1
        } else {
            base_level + 2
        };
        run.explicit_level = run.explicit_level.max(embedding);
        if run.bidi_level < embedding {
            run.bidi_level = if run.bidi_level & 1 == parity {
                embedding
            } else {
                embedding + 1
            };
            changed += 1;
        }
    }
    changed
}
