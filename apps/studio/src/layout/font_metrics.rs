//! Static font-metric tables used by the block layout engine.
//!
//! Character widths are in em units (relative to font size) and cover ASCII
//! 0x20..=0x7E. Index = (char as usize) - 32. The tables approximate Inter (sans)
//! and EB Garamond (serif); monospace text uses a uniform advance.

use vitae_core::{FontFamily, FontWeight};

/// Advance of every glyph in the monospace family, in em.
const MONO_ADVANCE_EM: f32 = 0.6;

/// Static character-width table for a font family.
///
/// `widths[i]` = width of ASCII character `(i + 32)`, covering 0x20 (space) through 0x7E (~).
pub struct FontMetricTable {
    pub family: FontFamily,
    widths: [f32; 95],
    /// Fallback width for non-ASCII characters (codepoints > 0x7E).
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    /// Width of a single character in em units.
    pub fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        }
    }

    /// Measures the rendered width of a string in em units.
    ///
    /// Non-ASCII characters fall back to `average_char_width`.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }
}

/// Resolved font for measuring one run of text in pixels.
#[derive(Clone, Copy)]
pub struct FontSpec {
    pub table: &'static FontMetricTable,
    pub size_px: f32,
    pub weight: FontWeight,
    pub letter_spacing_em: f32,
}

impl FontSpec {
    pub fn new(family: FontFamily, size_px: f32, weight: FontWeight, letter_spacing_em: f32) -> Self {
        Self {
            table: get_metrics(family),
            size_px,
            weight,
            letter_spacing_em,
        }
    }

    /// Heavier weights run wider than the regular tables.
    fn weight_factor(&self) -> f32 {
        match self.weight {
            FontWeight::Normal => 1.0,
            FontWeight::Medium => 1.02,
            FontWeight::Semibold => 1.04,
            FontWeight::Bold => 1.06,
        }
    }

    /// Pixel advance of one character, including letter spacing.
    pub fn advance_px(&self, c: char) -> f32 {
        (self.table.char_width(c) * self.weight_factor() + self.letter_spacing_em) * self.size_px
    }

    pub fn measure_px(&self, s: &str) -> f32 {
        s.chars().map(|c| self.advance_px(c)).sum()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

/// Inter — humanist sans-serif.
static SANS_TABLE: FontMetricTable = FontMetricTable {
    family: FontFamily::Sans,
    #[rustfmt::skip]
    widths: [
        // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
        0.25, 0.30, 0.38, 0.56, 0.56, 0.89, 0.67, 0.22, 0.33, 0.33, 0.39, 0.59, 0.28, 0.33, 0.28, 0.31,
        // 0     1     2     3     4     5     6     7     8     9
        0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56,
        // :     ;     <     =     >     ?     @
        0.28, 0.28, 0.59, 0.59, 0.59, 0.50, 1.02,
        // A     B     C     D     E     F     G     H     I     J     K     L     M
        0.67, 0.61, 0.61, 0.67, 0.56, 0.50, 0.67, 0.67, 0.25, 0.39, 0.61, 0.53, 0.78,
        // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
        0.67, 0.72, 0.56, 0.72, 0.61, 0.50, 0.56, 0.67, 0.67, 0.89, 0.61, 0.61, 0.56,
        // [     \     ]     ^     _     `
        0.28, 0.31, 0.28, 0.47, 0.56, 0.34,
        // a     b     c     d     e     f     g     h     i     j     k     l     m
        0.56, 0.56, 0.50, 0.56, 0.56, 0.31, 0.56, 0.56, 0.22, 0.22, 0.53, 0.22, 0.83,
        // n     o     p     q     r     s     t     u     v     w     x     y     z
        0.56, 0.56, 0.56, 0.56, 0.33, 0.44, 0.39, 0.56, 0.50, 0.72, 0.50, 0.50, 0.44,
        // {     |     }     ~
        0.33, 0.26, 0.33, 0.59,
    ],
    average_char_width: 0.52,
    space_width: 0.25,
};

/// EB Garamond — old-style serif. Approx. 85% of Inter.
static SERIF_TABLE: FontMetricTable = FontMetricTable {
    family: FontFamily::Serif,
    #[rustfmt::skip]
    widths: [
        // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
        0.21, 0.26, 0.32, 0.48, 0.48, 0.76, 0.57, 0.19, 0.28, 0.28, 0.33, 0.50, 0.24, 0.28, 0.24, 0.26,
        // 0     1     2     3     4     5     6     7     8     9
        0.48, 0.48, 0.48, 0.48, 0.48, 0.48, 0.48, 0.48, 0.48, 0.48,
        // :     ;     <     =     >     ?     @
        0.24, 0.24, 0.50, 0.50, 0.50, 0.43, 0.87,
        // A     B     C     D     E     F     G     H     I     J     K     L     M
        0.57, 0.52, 0.52, 0.57, 0.48, 0.43, 0.57, 0.57, 0.21, 0.33, 0.52, 0.45, 0.66,
        // N     O     P     Q     R     S     T     U     V     W     X     Y     Z
        0.57, 0.61, 0.48, 0.61, 0.52, 0.43, 0.48, 0.57, 0.57, 0.76, 0.52, 0.52, 0.48,
        // [     \     ]     ^     _     `
        0.24, 0.26, 0.24, 0.40, 0.48, 0.29,
        // a     b     c     d     e     f     g     h     i     j     k     l     m
        0.48, 0.48, 0.43, 0.48, 0.48, 0.26, 0.48, 0.48, 0.19, 0.19, 0.45, 0.19, 0.71,
        // n     o     p     q     r     s     t     u     v     w     x     y     z
        0.48, 0.48, 0.48, 0.48, 0.28, 0.37, 0.33, 0.48, 0.43, 0.61, 0.43, 0.43, 0.37,
        // {     |     }     ~
        0.28, 0.22, 0.28, 0.50,
    ],
    average_char_width: 0.44,
    space_width: 0.21,
};

static MONO_TABLE: FontMetricTable = FontMetricTable {
    family: FontFamily::Mono,
    widths: [MONO_ADVANCE_EM; 95],
    average_char_width: MONO_ADVANCE_EM,
    space_width: MONO_ADVANCE_EM,
};

/// Returns the static metric table for a given font family.
pub fn get_metrics(family: FontFamily) -> &'static FontMetricTable {
    match family {
        FontFamily::Sans => &SANS_TABLE,
        FontFamily::Serif => &SERIF_TABLE,
        FontFamily::Mono => &MONO_TABLE,
    }
}
