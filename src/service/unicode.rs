//! # Unicode Analysis Pass
//!
//! The analysis half of both bundled services. Runs UAX#14 line breaking
//! (`unicode-linebreak`), script itemization (`unicode-script`) and UAX#9
//! level resolution (`unicode-bidi`) over the text, then reports each
//! result to the sink as its own independently partitioned pass.

use unicode_bidi::{BidiInfo, Level};
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_script::{Script, UnicodeScript};

use crate::model::NumberSubstitution;
use crate::service::{byte_to_char_map, AnalysisSink, AnalysisSource};
use crate::text::{BreakCondition, Breakpoint, ScriptAnalysis, ScriptShapes};

/// Run every analysis and report it to `sink`.
pub fn analyze_text(source: &AnalysisSource<'_>, sink: &mut dyn AnalysisSink) {
    let text = source.text;
    if text.is_empty() {
        return;
    }
    let byte_to_char = byte_to_char_map(text);
    let chars: Vec<char> = text.chars().collect();

    sink.set_line_breakpoints(0, &compute_breakpoints(text, &chars, &byte_to_char));

    for (start, len, script) in script_runs(&chars) {
        sink.set_script_analysis(start, len, script);
    }

    let base = source.direction.base_level();
    for (start, len, explicit, resolved) in level_runs(text, &chars, base) {
        sink.set_bidi_level(start, len, explicit, resolved);
    }

    if source.number_substitution != NumberSubstitution::None {
        for (start, len) in digit_runs(&chars) {
            sink.set_number_substitution(start, len, Some(source.number_substitution));
        }
    }
}

/// Per-char UAX#14 classification.
///
/// `linebreaks` yields the byte offset *after* each opportunity; both sides
/// of that boundary are marked so the pair stays consistent.
fn compute_breakpoints(text: &str, chars: &[char], byte_to_char: &[usize]) -> Vec<Breakpoint> {
    let mut result: Vec<Breakpoint> = chars
        .iter()
        .map(|&ch| Breakpoint {
            break_before: BreakCondition::MayNotBreak,
            break_after: BreakCondition::MayNotBreak,
            is_whitespace: ch.is_whitespace(),
            is_soft_hyphen: ch == '\u{00AD}',
        })
        .collect();

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        // The break at the very end of the text is implicit.
        if char_idx == 0 || char_idx >= chars.len() {
            continue;
        }
        let condition = match opp {
            BreakOpportunity::Mandatory => BreakCondition::MustBreak,
            BreakOpportunity::Allowed => BreakCondition::CanBreak,
        };
        result[char_idx - 1].break_after = condition;
        result[char_idx].break_before = condition;
    }

    result
}

/// Maximal runs of one script. Common and inherited characters join the
/// script around them; control characters form their own invisible runs.
fn script_runs(chars: &[char]) -> Vec<(usize, usize, ScriptAnalysis)> {
    let mut resolved: Vec<Option<Script>> = chars
        .iter()
        .map(|ch| match ch.script() {
            Script::Common | Script::Inherited | Script::Unknown => None,
            s => Some(s),
        })
        .collect();

    let mut last = None;
    for slot in resolved.iter_mut() {
        match slot {
            Some(s) => last = Some(*s),
            None => *slot = last,
        }
    }
    let first_strong = resolved.iter().flatten().next().copied();
    for slot in resolved.iter_mut() {
        if slot.is_some() {
            break;
        }
        *slot = first_strong;
    }

    let analysis_at = |i: usize| {
        let tag = resolved[i].unwrap_or(Script::Common).short_name();
        let mut analysis = ScriptAnalysis::from_tag(tag);
        if chars[i].is_control() {
            analysis.shapes = ScriptShapes::NoVisual;
        }
        analysis
    };

    let mut runs = Vec::new();
    let mut run_start = 0;
    let mut current = analysis_at(0);
    for i in 1..chars.len() {
        let next = analysis_at(i);
        if next != current {
            runs.push((run_start, i - run_start, current));
            run_start = i;
            current = next;
        }
    }
    runs.push((run_start, chars.len() - run_start, current));
    runs
}

/// Deepest explicit embedding level (UAX#9 `max_depth`).
const MAX_EXPLICIT_LEVEL: u8 = 125;

/// Explicit embedding level of every char: the paragraph level raised by
/// the embedding, override and isolate controls it sits inside.
///
/// Controls carry the level outside of what they open or close. FSI is
/// treated as LRI, and pushes past [`MAX_EXPLICIT_LEVEL`] are ignored
/// along with their matching pops.
fn explicit_levels(chars: &[char], base: u8) -> Vec<u8> {
    // (level, opened by an isolate)
    let mut stack: Vec<(u8, bool)> = vec![(base, false)];
    let mut overflow = 0usize;
    let mut levels = Vec::with_capacity(chars.len());

    for &ch in chars {
        let current = stack.last().map_or(base, |e| e.0);
        let push = match ch {
            '\u{202A}' | '\u{202D}' => Some((false, false)),
            '\u{2066}' | '\u{2068}' => Some((false, true)),
            '\u{202B}' | '\u{202E}' => Some((true, false)),
            '\u{2067}' => Some((true, true)),
            _ => None,
        };
        if let Some((rtl, isolate)) = push {
            let next = if rtl { (current + 1) | 1 } else { (current + 2) & !1 };
            if overflow == 0 && next <= MAX_EXPLICIT_LEVEL {
                stack.push((next, isolate));
            } else {
                overflow += 1;
            }
            levels.push(current);
            continue;
        }
        match ch {
            // PDF
            '\u{202C}' => {
                if overflow > 0 {
                    overflow -= 1;
                } else if stack.len() > 1 && stack.last().is_some_and(|e| !e.1) {
                    stack.pop();
                }
            }
            // PDI
            '\u{2069}' => {
                overflow = 0;
                if let Some(i) = stack.iter().rposition(|e| e.1) {
                    stack.truncate(i.max(1));
                }
            }
            '\n' | '\r' | '\u{1C}'..='\u{1E}' | '\u{85}' | '\u{2029}' => {
                overflow = 0;
                stack.truncate(1);
            }
            _ => {}
        }
        levels.push(stack.last().map_or(base, |e| e.0));
    }
    levels
}

/// Maximal runs of one (explicit, resolved) bidi level pair.
fn level_runs(text: &str, chars: &[char], base: u8) -> Vec<(usize, usize, u8, u8)> {
    let para_level = Level::new(base).unwrap_or_else(|_| Level::ltr());
    let bidi_info = BidiInfo::new(text, Some(para_level));

    // `levels` is indexed by byte; take the level of each char's first byte.
    let char_levels: Vec<u8> = text
        .char_indices()
        .map(|(byte_idx, _)| {
            bidi_info
                .levels
                .get(byte_idx)
                .map(|l| l.number())
                .unwrap_or(base)
        })
        .collect();

    let explicit = explicit_levels(chars, base);

    let level_at = |i: usize| (explicit[i], char_levels[i]);
    let mut runs = Vec::new();
    let mut run_start = 0;
    for i in 1..chars.len() {
        if level_at(i) != level_at(run_start) {
            let (e, r) = level_at(run_start);
            runs.push((run_start, i - run_start, e, r));
            run_start = i;
        }
    }
    let (e, r) = level_at(run_start);
    runs.push((run_start, chars.len() - run_start, e, r));
    runs
}

fn digit_runs(chars: &[char]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            runs.push((start, i - start));
        } else {
            i += 1;
        }
    }
    runs
}
