//! The page's class stylesheet. Rules can depend on the active UI theme, which is
//! exactly what an export snapshot must not inherit.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vitae_core::{Color, FontFamily, FontWeight, Style, WhiteSpace};

/// Prefix marking a class that only applies under the dark theme (`dark:text-white`).
const DARK_PREFIX: &str = "dark:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub style: Style,
    /// Set when the rule's values change with the theme.
    pub theme_dependent: bool,
}

#[derive(Debug, Clone)]
pub struct Stylesheet {
    theme: Theme,
    rules: HashMap<String, Rule>,
}

impl Stylesheet {
    /// A stylesheet with no rules. Detached snapshots are laid out against this.
    pub fn empty() -> Self {
        Self {
            theme: Theme::Light,
            rules: HashMap::new(),
        }
    }

    /// The application's utility classes resolved for `theme`.
    pub fn for_theme(theme: Theme) -> Self {
        let (fg, bg, muted, border) = match theme {
            Theme::Light => (
                Color::rgb(10, 10, 10),
                Color::WHITE,
                Color::rgb(115, 115, 115),
                Color::rgb(229, 229, 229),
            ),
            Theme::Dark => (
                Color::rgb(250, 250, 250),
                Color::rgb(10, 10, 10),
                Color::rgb(163, 163, 163),
                Color::rgb(38, 38, 38),
            ),
        };

        let mut sheet = Self {
            theme,
            rules: HashMap::new(),
        };

        // Theme-independent typography and spacing.
        sheet.insert("text-xs", font_size(12.0), false);
        sheet.insert("text-sm", font_size(14.0), false);
        sheet.insert("text-2xl", font_size(24.0), false);
        sheet.insert("font-medium", weight(FontWeight::Medium), false);
        sheet.insert("font-semibold", weight(FontWeight::Semibold), false);
        sheet.insert("font-bold", weight(FontWeight::Bold), false);
        sheet.insert("font-serif", family(FontFamily::Serif), false);
        sheet.insert("font-mono", family(FontFamily::Mono), false);
        sheet.insert(
            "whitespace-pre-wrap",
            Style {
                white_space: Some(WhiteSpace::PreWrap),
                ..Style::default()
            },
            false,
        );
        sheet.insert(
            "mb-4",
            Style {
                margin_bottom_px: Some(16.0),
                ..Style::default()
            },
            false,
        );
        sheet.insert(
            "p-6",
            Style {
                padding_px: Some(24.0),
                ..Style::default()
            },
            false,
        );

        // Theme-dependent colours.
        sheet.insert("text-foreground", color(fg), true);
        sheet.insert("text-muted-foreground", color(muted), true);
        sheet.insert(
            "bg-background",
            Style {
                background: Some(bg),
                ..Style::default()
            },
            true,
        );
        sheet.insert(
            "bg-card",
            Style {
                background: Some(bg),
                ..Style::default()
            },
            true,
        );
        sheet.insert(
            "border-b",
            Style {
                border_bottom_px: Some(1.0),
                border_color: Some(border),
                ..Style::default()
            },
            true,
        );
        sheet.insert("text-white", color(Color::WHITE), false);
        sheet.insert("text-black", color(Color::BLACK), false);
        sheet
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn insert(&mut self, class: impl Into<String>, style: Style, theme_dependent: bool) {
        self.rules.insert(
            class.into(),
            Rule {
                style,
                theme_dependent,
            },
        );
    }

    /// True when the class's effect depends on the theme (including `dark:` variants).
    pub fn is_theme_dependent(&self, class: &str) -> bool {
        class.starts_with(DARK_PREFIX)
            || self
                .rules
                .get(class)
                .map(|r| r.theme_dependent)
                .unwrap_or(false)
    }

    /// Combined style of `classes`, later classes winning. `dark:` variants only apply
    /// under the dark theme. Unknown classes are ignored.
    pub fn resolve(&self, classes: &[String]) -> Style {
        classes.iter().fold(Style::default(), |acc, class| {
            let rule = match class.strip_prefix(DARK_PREFIX) {
                Some(base) if self.theme == Theme::Dark => self.rules.get(base),
                Some(_) => None,
                None => self.rules.get(class),
            };
            match rule {
                Some(rule) => acc.merged(&rule.style),
                None => acc,
            }
        })
    }

    /// Like [`Stylesheet::resolve`] but skipping every theme-dependent class.
    pub fn resolve_theme_neutral(&self, classes: &[String]) -> Style {
        classes
            .iter()
            .filter(|c| !self.is_theme_dependent(c))
            .fold(Style::default(), |acc, class| match self.rules.get(class) {
                Some(rule) => acc.merged(&rule.style),
                None => acc,
            })
    }

    /// Style the `<body>` passes down to everything mounted on the page.
    pub fn body_style(&self) -> Style {
        let (fg, bg) = match self.theme {
            Theme::Light => (Color::rgb(10, 10, 10), Color::WHITE),
            Theme::Dark => (Color::rgb(250, 250, 250), Color::rgb(10, 10, 10)),
        };
        Style {
            color: Some(fg),
            background: Some(bg),
            font_family: Some(FontFamily::Sans),
            font_size_px: Some(16.0),
            font_weight: Some(FontWeight::Normal),
            line_height: Some(1.5),
            ..Style::default()
        }
    }
}

fn font_size(px: f32) -> Style {
    Style {
        font_size_px: Some(px),
        ..Style::default()
    }
}

fn weight(w: FontWeight) -> Style {
    Style {
        font_weight: Some(w),
        ..Style::default()
    }
}

fn family(f: FontFamily) -> Style {
    Style {
        font_family: Some(f),
        ..Style::default()
    }
}

fn color(c: Color) -> Style {
    Style {
        color: Some(c),
        ..Style::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_later_classes_win() {
        let sheet = Stylesheet::for_theme(Theme::Light);
        let style = sheet.resolve(&classes(&["text-xs", "text-sm"]));
        assert_eq!(style.font_size_px, Some(14.0));
    }

    #[test]
    fn test_dark_variant_applies_only_in_dark_theme() {
        let cls = classes(&["text-black", "dark:text-white"]);
        let light = Stylesheet::for_theme(Theme::Light).resolve(&cls);
        let dark = Stylesheet::for_theme(Theme::Dark).resolve(&cls);
        assert_eq!(light.color, Some(Color::BLACK));
        assert_eq!(dark.color, Some(Color::WHITE));
    }

    #[test]
    fn test_theme_neutral_resolution_skips_theme_classes() {
        let sheet = Stylesheet::for_theme(Theme::Dark);
        let cls = classes(&["text-sm", "text-foreground", "dark:text-white", "bg-card"]);
        let style = sheet.resolve_theme_neutral(&cls);
        assert_eq!(style.font_size_px, Some(14.0));
        assert_eq!(style.color, None);
        assert_eq!(style.background, None);
    }

    #[test]
    fn test_body_style_follows_theme() {
        let light = Stylesheet::for_theme(Theme::Light).body_style();
        let dark = Stylesheet::for_theme(Theme::Dark).body_style();
        assert_ne!(light.color, dark.color);
        assert_eq!(Stylesheet::empty().theme(), Theme::Light);
    }
}
