//! Element tree — a small, owned stand-in for the browser DOM.
//!
//! The preview renderer builds it, the studio lays it out and rasterizes it, and the
//! API serializes it to HTML for the print view. `Clone` is a deep clone: a cloned
//! subtree shares nothing with its source.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

// ────────────────────────────────────────────────────────────────────────────
// Colour
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour at `opacity` (0.0 – 1.0) of full alpha.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a, ..self }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub fn to_css(&self) -> String {
        if self.is_opaque() {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.2})",
                self.r,
                self.g,
                self.b,
                self.a as f32 / 255.0
            )
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Style
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    pub fn css_stack(&self) -> &'static str {
        match self {
            FontFamily::Sans => {
                "Inter, -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif"
            }
            FontFamily::Serif => "'EB Garamond', Georgia, serif",
            FontFamily::Mono => "ui-monospace, Menlo, monospace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FontWeight {
    Normal,
    Medium,
    Semibold,
    Bold,
}

impl FontWeight {
    pub fn css_value(&self) -> u16 {
        match self {
            FontWeight::Normal => 400,
            FontWeight::Medium => 500,
            FontWeight::Semibold => 600,
            FontWeight::Bold => 700,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListMarker {
    Disc,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WhiteSpace {
    Normal,
    PreWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Display {
    Block,
    None,
}

/// Inline style properties. `None` means "not set here": the value is inherited
/// (for inheritable properties) or takes the engine default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub color: Option<Color>,
    pub background: Option<Color>,
    pub border_color: Option<Color>,
    pub border_bottom_px: Option<f32>,
    pub font_family: Option<FontFamily>,
    pub font_size_px: Option<f32>,
    pub font_weight: Option<FontWeight>,
    /// Line height as a multiple of the font size.
    pub line_height: Option<f32>,
    pub letter_spacing_em: Option<f32>,
    pub margin_top_px: Option<f32>,
    pub margin_bottom_px: Option<f32>,
    pub padding_px: Option<f32>,
    pub padding_left_px: Option<f32>,
    pub padding_bottom_px: Option<f32>,
    pub list_marker: Option<ListMarker>,
    pub white_space: Option<WhiteSpace>,
    pub break_all: Option<bool>,
    pub width_px: Option<f32>,
    pub height_px: Option<f32>,
    pub min_height_px: Option<f32>,
    pub display: Option<Display>,
}

impl Style {
    /// Returns `self` with every property that `over` sets replaced by `over`'s value.
    pub fn merged(&self, over: &Style) -> Style {
        macro_rules! pick {
            ($($field:ident),* $(,)?) => {
                Style { $($field: over.$field.or(self.$field),)* }
            };
        }
        pick!(
            color,
            background,
            border_color,
            border_bottom_px,
            font_family,
            font_size_px,
            font_weight,
            line_height,
            letter_spacing_em,
            margin_top_px,
            margin_bottom_px,
            padding_px,
            padding_left_px,
            padding_bottom_px,
            list_marker,
            white_space,
            break_all,
            width_px,
            height_px,
            min_height_px,
            display,
        )
    }

    /// The subset of properties a child inherits from this computed style.
    pub fn inheritable(&self) -> Style {
        Style {
            color: self.color,
            font_family: self.font_family,
            font_size_px: self.font_size_px,
            font_weight: self.font_weight,
            line_height: self.line_height,
            letter_spacing_em: self.letter_spacing_em,
            list_marker: self.list_marker,
            white_space: self.white_space,
            break_all: self.break_all,
            ..Style::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Style::default()
    }

    /// Serializes the set properties as a CSS declaration list.
    pub fn to_css(&self) -> String {
        let mut decls: Vec<String> = Vec::new();
        if let Some(c) = self.color {
            decls.push(format!("color: {}", c.to_css()));
        }
        if let Some(c) = self.background {
            decls.push(format!("background-color: {}", c.to_css()));
        }
        if let Some(w) = self.border_bottom_px {
            let c = self.border_color.unwrap_or(Color::BLACK);
            decls.push(format!("border-bottom: {}px solid {}", w, c.to_css()));
        } else if let Some(c) = self.border_color {
            decls.push(format!("border-color: {}", c.to_css()));
        }
        if let Some(f) = self.font_family {
            decls.push(format!("font-family: {}", f.css_stack()));
        }
        if let Some(s) = self.font_size_px {
            decls.push(format!("font-size: {s}px"));
        }
        if let Some(w) = self.font_weight {
            decls.push(format!("font-weight: {}", w.css_value()));
        }
        if let Some(l) = self.line_height {
            decls.push(format!("line-height: {l}"));
        }
        if let Some(l) = self.letter_spacing_em {
            decls.push(format!("letter-spacing: {l}em"));
        }
        if let Some(m) = self.margin_top_px {
            decls.push(format!("margin-top: {m}px"));
        }
        if let Some(m) = self.margin_bottom_px {
            decls.push(format!("margin-bottom: {m}px"));
        }
        if let Some(p) = self.padding_px {
            decls.push(format!("padding: {p}px"));
        }
        if let Some(p) = self.padding_left_px {
            decls.push(format!("padding-left: {p}px"));
        }
        if let Some(p) = self.padding_bottom_px {
            decls.push(format!("padding-bottom: {p}px"));
        }
        if let Some(m) = self.list_marker {
            let v = match m {
                ListMarker::Disc => "disc",
                ListMarker::None => "none",
            };
            decls.push(format!("list-style-type: {v}"));
        }
        if let Some(w) = self.white_space {
            let v = match w {
                WhiteSpace::Normal => "normal",
                WhiteSpace::PreWrap => "pre-wrap",
            };
            decls.push(format!("white-space: {v}"));
        }
        if self.break_all == Some(true) {
            decls.push("word-break: break-all".to_string());
        }
        if let Some(w) = self.width_px {
            decls.push(format!("width: {w}px"));
        }
        if let Some(h) = self.height_px {
            decls.push(format!("height: {h}px"));
        }
        if let Some(h) = self.min_height_px {
            decls.push(format!("min-height: {h}px"));
        }
        if let Some(d) = self.display {
            let v = match d {
                Display::Block => "block",
                Display::None => "none",
            };
            decls.push(format!("display: {v}"));
        }
        decls.join("; ")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Nodes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Main,
    Div,
    Article,
    Header,
    Section,
    H1,
    H2,
    P,
    Ul,
    Li,
    Script,
    NoScript,
}

impl Tag {
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Main => "main",
            Tag::Div => "div",
            Tag::Article => "article",
            Tag::Header => "header",
            Tag::Section => "section",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::P => "p",
            Tag::Ul => "ul",
            Tag::Li => "li",
            Tag::Script => "script",
            Tag::NoScript => "noscript",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: Tag,
    pub attrs: Vec<(String, String)>,
    pub classes: Vec<String>,
    pub style: Style,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            classes: Vec::new(),
            style: Style::default(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Pre-order traversal over this element and every descendant element.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        f(self);
        for child in self.element_children() {
            child.walk(f);
        }
    }

    /// Pre-order mutable traversal. `f` runs on a parent before its children.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in self.children.iter_mut() {
            if let Node::Element(e) = child {
                e.walk_mut(f);
            }
        }
    }

    /// First element (pre-order, including `self`) whose attribute `name` equals `value`.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<&Element> {
        if self.get_attr(name) == Some(value) {
            return Some(self);
        }
        self.element_children()
            .find_map(|c| c.find_by_attr(name, value))
    }

    /// All elements carrying attribute `name`, in document order.
    pub fn collect_with_attr<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.walk(&mut |e| {
            if e.get_attr(name).is_some() {
                found.push(e);
            }
        });
        found
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let tag = self.tag.name();
        out.push('<');
        out.push_str(tag);
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_html(&self.classes.join(" ")));
        }
        for (k, v) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", k, escape_html(v));
        }
        if !self.style.is_empty() {
            let _ = write!(out, " style=\"{}\"", escape_html(&self.style.to_css()));
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Text(t) if self.tag == Tag::Script => out.push_str(t),
                Node::Text(t) => out.push_str(&escape_html(t)),
                Node::Element(e) => e.write_html(out),
            }
        }
        let _ = write!(out, "</{tag}>");
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new(Tag::Article)
            .attr("data-preview", "resume")
            .child(Element::new(Tag::H1).child("Jane <Doe>"))
            .child(
                Element::new(Tag::Section)
                    .attr("data-section", "skills")
                    .child(Element::new(Tag::P).child("Rust, Go")),
            )
    }

    #[test]
    fn test_merged_prefers_override() {
        let base = Style {
            color: Some(Color::WHITE),
            font_size_px: Some(14.0),
            ..Style::default()
        };
        let over = Style {
            color: Some(Color::BLACK),
            ..Style::default()
        };
        let merged = base.merged(&over);
        assert_eq!(merged.color, Some(Color::BLACK));
        assert_eq!(merged.font_size_px, Some(14.0));
    }

    #[test]
    fn test_inheritable_drops_box_properties() {
        let style = Style {
            color: Some(Color::BLACK),
            background: Some(Color::WHITE),
            margin_bottom_px: Some(16.0),
            ..Style::default()
        };
        let inherited = style.inheritable();
        assert_eq!(inherited.color, Some(Color::BLACK));
        assert_eq!(inherited.background, None);
        assert_eq!(inherited.margin_bottom_px, None);
    }

    #[test]
    fn test_clone_is_detached() {
        let original = sample();
        let mut copy = original.clone();
        copy.walk_mut(&mut |e| e.classes.push("mutated".to_string()));
        let mut touched = 0;
        original.walk(&mut |e| touched += e.classes.len());
        assert_eq!(touched, 0);
    }

    #[test]
    fn test_find_by_attr_and_text_content() {
        let tree = sample();
        let section = tree.find_by_attr("data-section", "skills").unwrap();
        assert_eq!(section.text_content(), "Rust, Go");
        assert!(tree.find_by_attr("data-section", "summary").is_none());
        assert_eq!(tree.collect_with_attr("data-section").len(), 1);
    }

    #[test]
    fn test_to_html_escapes_text_and_attrs() {
        let html = sample().to_html();
        assert!(html.starts_with("<article data-preview=\"resume\">"));
        assert!(html.contains("Jane &lt;Doe&gt;"));
        assert!(html.ends_with("</article>"));
    }

    #[test]
    fn test_color_css() {
        assert_eq!(Color::BLACK.to_css(), "#000000");
        assert_eq!(Color::BLACK.with_opacity(0.5).to_css(), "rgba(0, 0, 0, 0.50)");
    }
}
