//! Greedy word wrap over pixel-measured text.

use vitae_core::WhiteSpace;

use crate::layout::font_metrics::FontSpec;

/// One wrapped line and its measured width in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    pub width_px: f32,
}

/// Wraps `text` into lines no wider than `max_width_px`.
///
/// `Normal` collapses whitespace runs. `PreWrap` honours hard line breaks and keeps
/// a line verbatim when it fits; lines that overflow are re-flowed word by word.
/// A word wider than the line on its own is split between characters.
pub fn wrap_text(
    text: &str,
    font: &FontSpec,
    max_width_px: f32,
    white_space: WhiteSpace,
) -> Vec<WrappedLine> {
    match white_space {
        WhiteSpace::Normal => greedy_wrap(text, font, max_width_px),
        WhiteSpace::PreWrap => {
            let body = text.strip_suffix('\n').unwrap_or(text);
            let body = body.strip_suffix('\r').unwrap_or(body);
            let mut lines = Vec::new();
            for hard in body.split('\n') {
                let hard = hard.strip_suffix('\r').unwrap_or(hard);
                let width = font.measure_px(hard);
                if width <= max_width_px {
                    lines.push(WrappedLine {
                        text: hard.to_string(),
                        width_px: width,
                    });
                } else {
                    lines.extend(greedy_wrap(hard, font, max_width_px));
                }
            }
            lines
        }
    }
}

fn greedy_wrap(text: &str, font: &FontSpec, max_width_px: f32) -> Vec<WrappedLine> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![];
    }

    let space_w = font.advance_px(' ');
    let mut lines: Vec<WrappedLine> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in words {
        for piece in split_oversized(word, font, max_width_px) {
            let piece_w = font.measure_px(&piece);
            if current.is_empty() {
                current = piece;
                current_width = piece_w;
            } else if current_width + space_w + piece_w > max_width_px {
                // Current line is full — push it and start a new line.
                lines.push(WrappedLine {
                    text: std::mem::take(&mut current),
                    width_px: current_width,
                });
                current = piece;
                current_width = piece_w;
            } else {
                current.push(' ');
                current.push_str(&piece);
                current_width += space_w + piece_w;
            }
        }
    }
    lines.push(WrappedLine {
        text: current,
        width_px: current_width,
    });
    lines
}

/// Splits a word that cannot fit on a line by itself into line-sized chunks.
fn split_oversized(word: &str, font: &FontSpec, max_width_px: f32) -> Vec<String> {
    if font.measure_px(word) <= max_width_px {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0_f32;
    for c in word.chars() {
        let w = font.advance_px(c);
        if !piece.is_empty() && width + w > max_width_px {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}
