//! # Run Table
//!
//! An ordered, gap-free partition of the text into runs. Every later stage
//! refines it by splitting; nothing ever merges runs back together, so a
//! run boundary introduced by one pass (say, a bidi level change) survives
//! every pass after it.

use std::ops::Range;

use crate::error::LayoutError;
use crate::model::{FontId, FormatIndex};
use crate::text::ScriptAnalysis;

/// A maximal text range homogeneous in analysis and format attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text_start: usize,
    pub text_len: usize,
    pub script: ScriptAnalysis,
    /// Level from explicit embeddings/overrides only.
    pub explicit_level: u8,
    /// Fully resolved bidi embedding level (odd = right-to-left).
    pub bidi_level: u8,
    pub number_substituted: bool,
    pub sideways: bool,
    pub format: FormatIndex,
    /// Set by font fallback when the format's font lacks coverage.
    pub font_substitute: Option<FontId>,
    /// First glyph of this run in the shared glyph arrays.
    pub glyph_start: usize,
    pub glyph_count: usize,
}

impl Run {
    fn spanning(text_start: usize, text_len: usize) -> Self {
        Self {
            text_start,
            text_len,
            script: ScriptAnalysis::COMMON,
            explicit_level: 0,
            bidi_level: 0,
            number_substituted: false,
            sideways: false,
            format: FormatIndex::DEFAULT,
            font_substitute: None,
            glyph_start: 0,
            glyph_count: 0,
        }
    }

    pub fn text_end(&self) -> usize {
        self.text_start + self.text_len
    }

    pub fn text_range(&self) -> Range<usize> {
        self.text_start..self.text_end()
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.text_start <= pos && pos < self.text_end()
    }

    pub fn is_rtl(&self) -> bool {
        self.bidi_level & 1 == 1
    }
}

/// Sorted, contiguous runs covering `[0, text_len)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTable {
    runs: Vec<Run>,
    text_len: usize,
}

impl RunTable {
    /// A table with one run spanning the whole text (none for empty text).
    pub fn new(text_len: usize) -> Self {
        let runs = if text_len == 0 {
            Vec::new()
        } else {
            vec![Run::spanning(0, text_len)]
        };
        Self { runs, text_len }
    }

    pub fn text_len(&self) -> usize {
        self.text_len
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn runs_mut(&mut self) -> &mut [Run] {
        &mut self.runs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Run> {
        self.runs.iter()
    }

    pub fn into_runs(self) -> Vec<Run> {
        self.runs
    }

    /// Index of the run containing `pos`, or `None` outside the text.
    pub fn find_run(&self, pos: usize) -> Option<usize> {
        find_run(&self.runs, pos)
    }

    /// Make `pos` a run boundary.
    ///
    /// Splitting at an existing boundary (including 0 and the text end) is
    /// a no-op, so repeated splits at the same position are idempotent.
    pub fn split_at(&mut self, pos: usize) -> Result<(), LayoutError> {
        if pos > self.text_len {
            return Err(LayoutError::OutOfRange {
                position: pos,
                len: self.text_len,
            });
        }
        if pos == self.text_len {
            return Ok(());
        }
        let Some(index) = self.find_run(pos) else {
            return Ok(());
        };
        let run = &mut self.runs[index];
        if run.text_start == pos {
            return Ok(());
        }

        let mut tail = run.clone();
        tail.text_start = pos;
        tail.text_len = run.text_end() - pos;
        run.text_len = pos - run.text_start;
        self.runs.insert(index + 1, tail);
        Ok(())
    }

    /// Split at both ends of `range` and return the indices of the runs now
    /// lying entirely inside it.
    pub fn split_range(&mut self, range: Range<usize>) -> Result<Range<usize>, LayoutError> {
        if range.start > range.end {
            return Err(LayoutError::OutOfRange {
                position: range.start,
                len: self.text_len,
            });
        }
        self.split_at(range.start)?;
        self.split_at(range.end)?;
        let first = self.boundary_index(range.start);
        let last = self.boundary_index(range.end);
        Ok(first..last)
    }

    /// Index of the run starting at boundary `pos` (`len()` at text end).
    fn boundary_index(&self, pos: usize) -> usize {
        if pos >= self.text_len {
            self.runs.len()
        } else {
            self.find_run(pos).unwrap_or(self.runs.len())
        }
    }
}

/// Binary search for the run containing `pos` in a sorted, contiguous slice.
pub(crate) fn find_run(runs: &[Run], pos: usize) -> Option<usize> {
    let index = runs.partition_point(|r| r.text_start <= pos).checked_sub(1)?;
    runs[index].contains(pos).then_some(index)
}
