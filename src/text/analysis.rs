//! # Analysis Adapter
//!
//! Receives a service's analysis reports and folds them into a [`RunTable`]
//! plus a per-char breakpoint array.
//!
//! Reports are independent passes over the same text (bidi levels, scripts,
//! digits...) with different partitions, arriving in any order. Each report
//! first makes its range ends run boundaries, then stamps its attribute on
//! every run inside, so the table converges to the common refinement of all
//! passes no matter how they interleave.

use std::ops::Range;

use crate::error::LayoutError;
use crate::service::{AnalysisSink, AnalysisSource, ShapingService};
use crate::text::runs::{Run, RunTable};
use crate::text::{BreakCondition, Breakpoint, ScriptAnalysis};

/// Analysis state for one text: run table, breakpoints, anomaly count.
#[derive(Debug, Clone)]
pub struct TextAnalysis {
    runs: RunTable,
    breakpoints: Vec<Breakpoint>,
    anomalies: usize,
}

impl TextAnalysis {
    pub fn new(text_len: usize) -> Self {
        // Until the service says otherwise, break nowhere but at the end.
        let breakpoints = vec![
            Breakpoint {
                break_before: BreakCondition::MayNotBreak,
                break_after: BreakCondition::MayNotBreak,
                ..Default::default()
            };
            text_len
        ];
        Self {
            runs: RunTable::new(text_len),
            breakpoints,
            anomalies: 0,
        }
    }

    /// Run the service's analysis pass over `source`.
    pub fn analyze<S: ShapingService + ?Sized>(
        service: &S,
        source: &AnalysisSource<'_>,
    ) -> Result<Self, LayoutError> {
        let mut analysis = TextAnalysis::new(source.text.chars().count());
        service.analyze(source, &mut analysis)?;
        log::debug!(
            target: "glyphflow::analysis",
            "analyzed {} chars into {} runs ({} anomalies)",
            analysis.runs.text_len(),
            analysis.runs.len(),
            analysis.anomalies
        );
        Ok(analysis)
    }

    pub fn runs(&self) -> &RunTable {
        &self.runs
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Number of reports that had to be clamped or dropped.
    pub fn anomalies(&self) -> usize {
        self.anomalies
    }

    pub fn into_parts(self) -> (RunTable, Vec<Breakpoint>, usize) {
        (self.runs, self.breakpoints, self.anomalies)
    }

    /// Clamp a reported range to the text, counting anything malformed.
    fn clamp(&mut self, start: usize, len: usize, what: &str) -> Option<Range<usize>> {
        let text_len = self.runs.text_len();
        let end = start.saturating_add(len);
        let clamped = start.min(text_len)..end.min(text_len);
        if clamped.end != end {
            self.anomalies += 1;
            log::warn!(
                target: "glyphflow::analysis",
                "{} report {}..{} exceeds text length {}; clamped",
                what,
                start,
                end,
                text_len
            );
        }
        if clamped.is_empty() {
            return None;
        }
        Some(clamped)
    }

    /// Split at the range ends and apply `f` to every run inside.
    fn apply(&mut self, start: usize, len: usize, what: &str, f: impl Fn(&mut Run)) {
        let Some(range) = self.clamp(start, len, what) else {
            return;
        };
        // The range is clamped to the text, so splitting cannot fail.
        let Ok(inner) = self.runs.split_range(range) else {
            return;
        };
        for run in &mut self.runs.runs_mut()[inner] {
            f(run);
        }
    }
}

impl AnalysisSink for TextAnalysis {
    fn set_line_breakpoints(&mut self, start: usize, breakpoints: &[Breakpoint]) {
        let Some(range) = self.clamp(start, breakpoints.len(), "breakpoint") else {
            return;
        };
        let count = range.len();
        self.breakpoints[range].copy_from_slice(&breakpoints[..count]);
    }

    fn set_script_analysis(&mut self, start: usize, len: usize, script: ScriptAnalysis) {
        self.apply(start, len, "script", |run| run.script = script);
    }

    fn set_bidi_level(&mut self, start: usize, len: usize, explicit_level: u8, resolved_level: u8) {
        self.apply(start, len, "bidi", |run| {
            run.explicit_level = explicit_level;
            run.bidi_level = resolved_level;
        });
    }

    fn set_number_substitution(
        &mut self,
        start: usize,
        len: usize,
        substitution: Option<crate::model::NumberSubstitution>,
    ) {
        self.apply(start, len, "number substitution", |run| {
            run.number_substituted = substitution.is_some();
        });
    }

    fn set_glyph_orientation(&mut self, start: usize, len: usize, sideways: bool) {
        self.apply(start, len, "orientation", |run| run.sideways = sideways);
    }
}
