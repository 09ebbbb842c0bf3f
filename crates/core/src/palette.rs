use serde::{Deserialize, Serialize};

use crate::dom::Color;

/// Colours used by the preview renderer.
///
/// The renderer never consults ambient theme state: callers pass the palette in.
/// Export and print always use [`Palette::light`] so documents look the same
/// whatever theme the user is browsing in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    /// Headings and titles.
    pub text: Color,
    /// Body copy and bullets.
    pub body: Color,
    /// Secondary lines (role).
    pub muted: Color,
    /// Tertiary lines (contacts, dates, links).
    pub faint: Color,
    /// Section heading underline.
    pub rule: Color,
    pub background: Color,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            text: Color::BLACK,
            body: Color::BLACK.with_opacity(0.9),
            muted: Color::BLACK.with_opacity(0.8),
            faint: Color::BLACK.with_opacity(0.7),
            rule: Color::rgb(229, 231, 235),
            background: Color::WHITE,
        }
    }

    pub fn dark() -> Self {
        Self {
            text: Color::WHITE,
            body: Color::WHITE.with_opacity(0.9),
            muted: Color::WHITE.with_opacity(0.8),
            faint: Color::WHITE.with_opacity(0.7),
            rule: Color::rgb(38, 38, 38),
            background: Color::rgb(10, 10, 10),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::light()
    }
}
