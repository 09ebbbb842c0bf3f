//! Snapshot Sanitizer — turns a mounted preview into a detached, self-contained clone
//! that rasterizes the same way with or without the page's stylesheet.
//!
//! Strategy: computed-style inlining. Each descendant's style is resolved (inherited
//! values, theme-neutral class rules, then inline overrides) and written inline, and
//! every class name is dropped. Theme-dependent classes are discarded without being
//! applied, and inheritance starts from a fixed light root instead of the themed
//! `<body>`, so a dark UI never leaks into the export.
//!
//! [`capture`] is the pure part. [`Scaffold`] owns the off-screen mount and removes it
//! when dropped, on success and failure paths alike.

use tracing::debug;
use vitae_core::{Color, Element, FontFamily, FontWeight, Node, Style, Tag, WhiteSpace};

use crate::document::{lock, Document, NodeId, Placement, SharedDocument};
use crate::errors::ExportError;
use crate::stylesheet::Stylesheet;

/// Marks the off-screen container so leftovers are easy to detect.
pub const SCAFFOLD_ATTR: &str = "data-export-scaffold";

#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// Opaque background painted behind the snapshot.
    pub background: Color,
    /// Text colour at the root of the snapshot's inheritance chain.
    pub text_color: Color,
    pub font_family: FontFamily,
    /// Horizontal position of the off-screen container.
    pub offscreen_left: f32,
    /// Elements removed from the clone.
    pub drop_tags: Vec<Tag>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            text_color: Color::BLACK,
            font_family: FontFamily::Sans,
            offscreen_left: -9999.0,
            drop_tags: vec![Tag::Script, Tag::NoScript],
        }
    }
}

impl SanitizeOptions {
    fn neutral_root(&self) -> Style {
        Style {
            color: Some(self.text_color),
            font_family: Some(self.font_family),
            font_size_px: Some(16.0),
            font_weight: Some(FontWeight::Normal),
            line_height: Some(1.5),
            white_space: Some(WhiteSpace::Normal),
            ..Style::default()
        }
    }
}

/// A sanitized clone wrapped in its off-screen container, not yet mounted.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub container: Element,
    pub width: f32,
    pub height: f32,
}

/// Checks the source is renderable and produces its sanitized snapshot.
///
/// Fails before any cloning when the source is not mounted or has an empty box.
pub fn capture(
    document: &Document,
    source: NodeId,
    options: &SanitizeOptions,
) -> Result<Snapshot, ExportError> {
    let element = document.get(source).ok_or(ExportError::MissingSource)?;
    let rect = document
        .bounding_rect(source)
        .ok_or(ExportError::MissingSource)?;
    if rect.is_empty() {
        return Err(ExportError::ZeroDimension {
            width: rect.width,
            height: rect.height,
        });
    }
    debug!(
        "Capturing {source}: {:.0}x{:.0}px",
        rect.width, rect.height
    );

    let clone = sanitize(element, document.stylesheet(), options);
    let container = Element::new(Tag::Div)
        .attr(SCAFFOLD_ATTR, "true")
        .style(Style {
            background: Some(options.background),
            color: Some(options.text_color),
            font_family: Some(options.font_family),
            width_px: Some(rect.width),
            height_px: Some(rect.height),
            min_height_px: Some(rect.height),
            ..Style::default()
        })
        .child(clone);

    Ok(Snapshot {
        container,
        width: rect.width,
        height: rect.height,
    })
}

/// Deep-clones `source` with every computed style written inline.
pub fn sanitize(source: &Element, sheet: &Stylesheet, options: &SanitizeOptions) -> Element {
    inline_computed(source.clone(), &options.neutral_root(), sheet, options)
}

fn inline_computed(
    mut element: Element,
    parent: &Style,
    sheet: &Stylesheet,
    options: &SanitizeOptions,
) -> Element {
    let computed = parent
        .inheritable()
        .merged(&sheet.resolve_theme_neutral(&element.classes))
        .merged(&element.style);

    element.classes.clear();
    element.children = std::mem::take(&mut element.children)
        .into_iter()
        .filter_map(|child| match child {
            Node::Element(e) if options.drop_tags.contains(&e.tag) => None,
            Node::Element(e) => Some(Node::Element(inline_computed(
                e, &computed, sheet, options,
            ))),
            text => Some(text),
        })
        .collect();
    element.style = computed;
    element
}

// ────────────────────────────────────────────────────────────────────────────
// Scaffold
// ────────────────────────────────────────────────────────────────────────────

/// A snapshot mounted off-screen. Dropping the scaffold unmounts it.
pub struct Scaffold {
    document: SharedDocument,
    id: NodeId,
    width: f32,
    height: f32,
}

impl Scaffold {
    pub fn attach(document: &SharedDocument, snapshot: Snapshot, options: &SanitizeOptions) -> Self {
        let Snapshot {
            container,
            width,
            height,
        } = snapshot;
        let id = lock(document).mount_with_width(
            container,
            Placement::Offscreen {
                left: options.offscreen_left,
                top: 0.0,
            },
            width,
        );
        debug!("Mounted export scaffold {id}");
        Self {
            document: document.clone(),
            id,
            width,
            height,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Owned copy of the mounted container, for handing to the rasterizer.
    pub fn content(&self) -> Result<Element, ExportError> {
        lock(&self.document)
            .get(self.id)
            .cloned()
            .ok_or(ExportError::MissingSource)
    }
}

impl Drop for Scaffold {
    fn drop(&mut self) {
        if lock(&self.document).unmount(self.id).is_some() {
            debug!("Removed export scaffold {}", self.id);
        }
    }
}
