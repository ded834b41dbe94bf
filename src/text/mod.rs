//! # Text Pipeline
//!
//! The algorithmic core of the engine, leaves first:
//!
//! ```text
//!   [runs]      — ordered partition of the text, split-only
//!       ↓
//!   [analysis]  — folds service range reports into the run table
//!       ↓
//!   [format]    — intersects runs with caller format ranges
//!       ↓
//!   [fallback]  — splits runs at font coverage changes
//!       ↓
//!   [shaping]   — glyphs per run into shared glyph arrays
//!       ↓
//!   [cluster] → [fit] → [bidi] → [justify]   (per line)
//! ```
//!
//! All positions are char indices into the layout text.

pub mod analysis;
pub mod bidi;
pub mod cluster;
pub mod fallback;
pub mod fit;
pub mod format;
pub mod justify;
pub mod runs;
pub mod shaping;

use serde::{Deserialize, Serialize};

/// Whether a line may break at one side of a character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakCondition {
    /// No opinion; the other side decides.
    #[default]
    Neutral,
    CanBreak,
    MayNotBreak,
    MustBreak,
}

/// Line-break classification of one character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub break_before: BreakCondition,
    pub break_after: BreakCondition,
    pub is_whitespace: bool,
    pub is_soft_hyphen: bool,
}

impl Breakpoint {
    /// Condition for a break between `before` and `after`.
    ///
    /// A mandatory break on either side wins, then a prohibition, then an
    /// opportunity. Two neutral sides do not break.
    pub fn between(before: &Breakpoint, after: &Breakpoint) -> BreakCondition {
        let pair = [before.break_after, after.break_before];
        if pair.contains(&BreakCondition::MustBreak) {
            BreakCondition::MustBreak
        } else if pair.contains(&BreakCondition::MayNotBreak) {
            BreakCondition::MayNotBreak
        } else if pair.contains(&BreakCondition::CanBreak) {
            BreakCondition::CanBreak
        } else {
            BreakCondition::Neutral
        }
    }
}

/// Condition at text position `pos` (between chars `pos - 1` and `pos`).
///
/// The end of the text is always a mandatory break; the start never breaks.
pub fn break_condition_at(breakpoints: &[Breakpoint], pos: usize) -> BreakCondition {
    if pos == 0 || breakpoints.is_empty() {
        return BreakCondition::MayNotBreak;
    }
    if pos >= breakpoints.len() {
        return BreakCondition::MustBreak;
    }
    Breakpoint::between(&breakpoints[pos - 1], &breakpoints[pos])
}

/// Whether a script produces visible glyphs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptShapes {
    #[default]
    Default,
    /// Control characters and the like; shaped but never drawn.
    NoVisual,
}

/// Script analysis for a run: ISO 15924 tag plus visual class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptAnalysis {
    pub script: [u8; 4],
    pub shapes: ScriptShapes,
}

impl ScriptAnalysis {
    /// "Zyyy", the common script.
    pub const COMMON: ScriptAnalysis = ScriptAnalysis {
        script: *b"Zyyy",
        shapes: ScriptShapes::Default,
    };

    pub fn from_tag(tag: &str) -> Self {
        let mut script = *b"Zzzz";
        for (dst, src) in script.iter_mut().zip(tag.bytes()) {
            *dst = src;
        }
        Self {
            script,
            shapes: ScriptShapes::Default,
        }
    }

    pub fn tag(&self) -> &str {
        std::str::from_utf8(&self.script).unwrap_or("Zzzz")
    }
}

impl Default for ScriptAnalysis {
    fn default() -> Self {
        Self::COMMON
    }
}
