//! Block layout engine.
//!
//! Every element is a block stacked vertically inside its parent's content box;
//! runs of text are wrapped into line boxes with the static font metrics. This is
//! enough for the single-column resume preview, and it is the geometry both the
//! live document (`bounding_rect`) and the rasterizer use.

pub mod font_metrics;
pub mod wrap;

use vitae_core::{Color, Display, Element, FontFamily, FontWeight, ListMarker, Node, Style, Tag, WhiteSpace};

use crate::layout::font_metrics::FontSpec;
use crate::layout::wrap::wrap_text;
use crate::stylesheet::Stylesheet;

pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;
pub const DEFAULT_LINE_HEIGHT: f32 = 1.5;

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when either dimension is zero (or negative).
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Font and colour a text line is painted with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub family: FontFamily,
    pub size_px: f32,
    pub weight: FontWeight,
    pub letter_spacing_em: f32,
    pub color: Color,
}

impl TextStyle {
    fn from_computed(style: &Style) -> Self {
        Self {
            family: style.font_family.unwrap_or(FontFamily::Sans),
            size_px: style.font_size_px.unwrap_or(DEFAULT_FONT_SIZE_PX),
            weight: style.font_weight.unwrap_or(FontWeight::Normal),
            letter_spacing_em: style.letter_spacing_em.unwrap_or(0.0),
            color: style.color.unwrap_or(Color::BLACK),
        }
    }

    pub fn font(&self) -> FontSpec {
        FontSpec::new(self.family, self.size_px, self.weight, self.letter_spacing_em)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Line box: full line height, text width.
    pub rect: Rect,
    pub style: TextStyle,
}

/// A list bullet drawn to the left of an `<li>`'s first line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Block(LayoutBox),
    Line(TextLine),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub tag: Tag,
    /// Border box (margins excluded).
    pub rect: Rect,
    pub style: Style,
    pub marker: Option<Marker>,
    pub fragments: Vec<Fragment>,
}

impl LayoutBox {
    /// Every text line in this box and its descendants, in paint order.
    pub fn lines(&self) -> Vec<&TextLine> {
        let mut out = Vec::new();
        self.collect_lines(&mut out);
        out
    }

    fn collect_lines<'a>(&'a self, out: &mut Vec<&'a TextLine>) {
        for fragment in &self.fragments {
            match fragment {
                Fragment::Line(line) => out.push(line),
                Fragment::Block(b) => b.collect_lines(out),
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

/// Styles a layout pass resolves against.
pub struct LayoutContext<'a> {
    pub stylesheet: &'a Stylesheet,
    /// Computed style of the (virtual) parent of the laid-out root.
    pub root_style: Style,
}

/// Lays out `element` with its border box at `(x, y)` in `available_width` pixels.
///
/// Returns `None` when the element does not generate a box (`display: none`,
/// `script`, `noscript`).
pub fn layout_tree(
    element: &Element,
    x: f32,
    y: f32,
    available_width: f32,
    ctx: &LayoutContext<'_>,
) -> Option<LayoutBox> {
    layout_element(element, &ctx.root_style, x, y, available_width, ctx.stylesheet)
}

/// Computed style of `element` given its parent's computed style.
pub fn compute_style(element: &Element, parent: &Style, stylesheet: &Stylesheet) -> Style {
    parent
        .inheritable()
        .merged(&stylesheet.resolve(&element.classes))
        .merged(&element.style)
}

fn layout_element(
    element: &Element,
    parent: &Style,
    x: f32,
    y: f32,
    available_width: f32,
    stylesheet: &Stylesheet,
) -> Option<LayoutBox> {
    if matches!(element.tag, Tag::Script | Tag::NoScript) {
        return None;
    }
    let style = compute_style(element, parent, stylesheet);
    if style.display == Some(Display::None) {
        return None;
    }

    let top = y + style.margin_top_px.unwrap_or(0.0);
    let width = style.width_px.unwrap_or(available_width).max(0.0);
    let pad = style.padding_px.unwrap_or(0.0);
    let pad_left = style.padding_left_px.unwrap_or(pad);
    let pad_bottom = style.padding_bottom_px.unwrap_or(pad);
    let content_x = x + pad_left;
    let content_width = (width - pad_left - pad).max(0.0);

    let text_style = TextStyle::from_computed(&style);
    let font = text_style.font();
    let line_height = text_style.size_px * style.line_height.unwrap_or(DEFAULT_LINE_HEIGHT);
    let white_space = style.white_space.unwrap_or(WhiteSpace::Normal);

    let mut cursor = top + pad;
    let mut fragments = Vec::new();
    let mut run = String::new();

    let flush = |run: &mut String, cursor: &mut f32, fragments: &mut Vec<Fragment>| {
        if run.is_empty() {
            return;
        }
        for line in wrap_text(run, &font, content_width, white_space) {
            fragments.push(Fragment::Line(TextLine {
                text: line.text,
                rect: Rect::new(content_x, *cursor, line.width_px, line_height),
                style: text_style,
            }));
            *cursor += line_height;
        }
        run.clear();
    };

    for child in &element.children {
        match child {
            Node::Text(t) => run.push_str(t),
            Node::Element(e) => {
                flush(&mut run, &mut cursor, &mut fragments);
                if let Some(child_box) =
                    layout_element(e, &style, content_x, cursor, content_width, stylesheet)
                {
                    cursor = child_box.rect.bottom() + child_box.style.margin_bottom_px.unwrap_or(0.0);
                    fragments.push(Fragment::Block(child_box));
                }
            }
        }
    }
    flush(&mut run, &mut cursor, &mut fragments);

    let border = style.border_bottom_px.unwrap_or(0.0);
    let mut height = cursor - top + pad_bottom + border;
    if let Some(h) = style.height_px {
        height = h;
    }
    if let Some(min) = style.min_height_px {
        height = height.max(min);
    }

    let marker = (element.tag == Tag::Li && style.list_marker == Some(ListMarker::Disc)).then(|| {
        Marker {
            cx: x - text_style.size_px * 0.7,
            cy: top + pad + line_height / 2.0,
            radius: (text_style.size_px * 0.15).max(1.0),
            color: text_style.color,
        }
    });

    Some(LayoutBox {
        tag: element.tag,
        rect: Rect::new(x, top, width, height.max(0.0)),
        style,
        marker,
        fragments,
    })
}
