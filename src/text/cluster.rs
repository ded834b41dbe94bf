//! # Cluster Navigation
//!
//! A [`ClusterPosition`] remembers which run it is in, so walking forward
//! cluster by cluster costs nothing until a run boundary is crossed. The
//! cursor is always passed explicitly; nothing here holds iteration state.

use crate::text::runs::{find_run, Run};

/// A cursor at a cluster boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterPosition {
    pub text_position: usize,
    /// Run containing `text_position` (the last run at end of text).
    pub run_index: usize,
    /// End of that run.
    pub run_end: usize,
}

/// Read-only view of the shaped text used to walk clusters.
#[derive(Debug, Clone, Copy)]
pub struct ClusterMap<'a> {
    pub runs: &'a [Run],
    /// Per text position, first glyph of its cluster relative to the run.
    pub clusters: &'a [u32],
    pub advances: &'a [f32],
}

impl<'a> ClusterMap<'a> {
    pub fn text_len(&self) -> usize {
        self.clusters.len()
    }

    /// A cursor at `text_position`, resolved from scratch.
    pub fn position(&self, text_position: usize) -> ClusterPosition {
        let mut cursor = ClusterPosition::default();
        self.set_position(&mut cursor, text_position);
        cursor
    }

    /// Move `cursor` to `text_position`, re-resolving the run only when the
    /// position left the current one.
    pub fn set_position(&self, cursor: &mut ClusterPosition, text_position: usize) {
        cursor.text_position = text_position;
        let text_len = self.text_len();
        if text_position >= text_len {
            cursor.run_index = self.runs.len().saturating_sub(1);
            cursor.run_end = text_len;
            return;
        }
        let still_inside = self
            .runs
            .get(cursor.run_index)
            .is_some_and(|r| r.contains(text_position));
        if !still_inside {
            cursor.run_index = find_run(self.runs, text_position).unwrap_or(0);
        }
        cursor.run_end = self
            .runs
            .get(cursor.run_index)
            .map(Run::text_end)
            .unwrap_or(text_len);
    }

    /// Step `cursor` to the start of the next cluster.
    pub fn advance(&self, cursor: &mut ClusterPosition) {
        let mut pos = cursor.text_position;
        if pos >= self.text_len() {
            return;
        }
        let cluster_id = self.clusters[pos];
        pos += 1;
        while pos < cursor.run_end {
            if self.clusters[pos] != cluster_id {
                cursor.text_position = pos;
                return;
            }
            pos += 1;
        }
        // Crossed into the next run (or the end of text).
        self.set_position(cursor, cursor.run_end);
    }

    /// Absolute index of the first glyph at `cursor`.
    pub fn glyph_start(&self, cursor: &ClusterPosition) -> usize {
        let Some(run) = self.runs.get(cursor.run_index) else {
            return 0;
        };
        if cursor.text_position < cursor.run_end && run.contains(cursor.text_position) {
            run.glyph_start + self.clusters[cursor.text_position] as usize
        } else {
            run.glyph_start + run.glyph_count
        }
    }

    /// Total advance of the glyphs between two cursors.
    pub fn range_width(&self, start: &ClusterPosition, end: &ClusterPosition) -> f32 {
        self.glyph_range_width(self.glyph_start(start), self.glyph_start(end), self.advances)
    }

    /// Sum of `advances[glyph_start..glyph_end]`, tolerating inverted ranges.
    pub fn glyph_range_width(&self, glyph_start: usize, glyph_end: usize, advances: &[f32]) -> f32 {
        if glyph_end <= glyph_start {
            return 0.0;
        }
        advances[glyph_start..glyph_end.min(advances.len())]
            .iter()
            .sum()
    }
}
