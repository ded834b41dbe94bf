//! # Bidi Reordering
//!
//! Visual ordering of a line's runs by level reversal (UAX#9 rule L2):
//! from the highest level down to the lowest odd level, reverse every
//! maximal group of runs at that level or higher.
//!
//! This works at run granularity only. Glyph order inside a right-to-left
//! run is the sink's business; the service hands glyphs over in logical
//! order and the run's odd level tells the sink to lay them out leftward.

/// Permutation of run indices (`0..levels.len()`) in visual left-to-right
/// order.
pub fn bidi_ordering(levels: &[u8]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    let Some(&max_level) = levels.iter().max() else {
        return order;
    };
    let min_level = levels.iter().copied().min().unwrap_or(0);

    // Only reorder if there's actually an RTL level.
    if max_level & 1 == 0 && max_level == min_level {
        return order;
    }
    let min_odd = min_level | 1;

    let mut level = max_level;
    while level >= min_odd {
        let mut i = 0;
        while i < order.len() {
            if levels[order[i]] >= level {
                let start = i;
                while i < order.len() && levels[order[i]] >= level {
                    i += 1;
                }
                order[start..i].reverse();
            } else {
                i += 1;
            }
        }
        level -= 1;
    }
    order
}
