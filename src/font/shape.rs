//! # OpenType Shaping
//!
//! Wraps rustybuzz to shape one run (GSUB/GPOS), then converts the output
//! into the engine's conventions: glyphs in logical order, advances scaled
//! to the font size, and a per-char cluster map.

use std::str::FromStr;

use crate::service::{byte_to_char_map, substitute_digit, GlyphOffset, ShapeRequest, ShapedGlyphs};

/// Shape `request.text` with the font in `font_data`.
///
/// Returns `None` if the font data can't be parsed.
pub fn shape_run(font_data: &[u8], units_per_em: u16, request: &ShapeRequest<'_>) -> Option<ShapedGlyphs> {
    let face = rustybuzz::Face::from_slice(font_data, 0)?;

    let text: String = if request.substitutes_digits() {
        request
            .text
            .chars()
            .map(|ch| substitute_digit(ch, request.locale))
            .collect()
    } else {
        request.text.to_string()
    };

    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(&text);
    buffer.set_direction(if request.is_rtl() {
        rustybuzz::Direction::RightToLeft
    } else {
        rustybuzz::Direction::LeftToRight
    });
    if let Some(script) = rustybuzz::Script::from_iso15924_tag(rustybuzz::ttf_parser::Tag::from_bytes(
        &request.script.script,
    )) {
        buffer.set_script(script);
    }
    if let Ok(language) = rustybuzz::Language::from_str(request.locale) {
        buffer.set_language(language);
    }

    let output = rustybuzz::shape(&face, &[], buffer);
    let scale = request.font_size / f32::from(units_per_em.max(1));

    // RTL output comes back in visual order; the engine wants logical.
    let mut glyphs: Vec<(u16, u32, f32, GlyphOffset)> = output
        .glyph_infos()
        .iter()
        .zip(output.glyph_positions())
        .map(|(info, pos)| {
            (
                info.glyph_id as u16,
                info.cluster,
                pos.x_advance as f32 * scale,
                GlyphOffset {
                    advance_offset: pos.x_offset as f32 * scale,
                    ascender_offset: pos.y_offset as f32 * scale,
                },
            )
        })
        .collect();
    if request.is_rtl() {
        glyphs.reverse();
    }

    let byte_to_char = byte_to_char_map(&text);
    let char_count = text.chars().count();
    let glyph_clusters: Vec<usize> = glyphs
        .iter()
        .map(|g| byte_to_char[(g.1 as usize).min(text.len())])
        .collect();

    Some(ShapedGlyphs {
        glyph_indices: glyphs.iter().map(|g| g.0).collect(),
        advances: glyphs.iter().map(|g| g.2).collect(),
        offsets: glyphs.iter().map(|g| g.3).collect(),
        cluster_map: cluster_map(&glyph_clusters, char_count),
    })
}

/// Per-char index of the first glyph of the char's cluster.
///
/// `glyph_clusters` holds each glyph's first char, non-decreasing. A char
/// no glyph starts at (the tail of a ligature) belongs to the cluster
/// before it.
pub fn cluster_map(glyph_clusters: &[usize], char_count: usize) -> Vec<u32> {
    let mut starts: Vec<Option<u32>> = vec![None; char_count];
    for (glyph, &ch) in glyph_clusters.iter().enumerate().rev() {
        if ch < char_count {
            starts[ch] = Some(glyph as u32);
        }
    }
    let mut current = 0;
    starts
        .into_iter()
        .map(|s| {
            if let Some(g) = s {
                current = g;
            }
            current
        })
        .collect()
}
