//! The live document: everything currently mounted on the page.
//!
//! The editor mounts the resume preview here; export scaffolds are mounted off-screen
//! next to it for the duration of one export. The document is the only mutable state
//! the UI and the export pipeline share, hence [`SharedDocument`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use vitae_core::{Element, Style};

use crate::layout::{compute_style, layout_tree, LayoutBox, LayoutContext, Rect};
use crate::stylesheet::{Stylesheet, Theme};

pub type SharedDocument = Arc<Mutex<Document>>;

/// Locks the shared document. A poisoned lock still holds a consistent tree (every
/// mutation is a single map operation), so the guard is recovered rather than
/// propagated.
pub fn lock(document: &SharedDocument) -> MutexGuard<'_, Document> {
    document.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Where a mounted subtree sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    /// Laid out in the visible viewport at its origin.
    InFlow,
    /// Rendered but positioned outside the viewport.
    Offscreen { left: f32, top: f32 },
    /// Mounted but not rendered (`display: none` on the mount point).
    Hidden,
}

#[derive(Debug, Clone)]
struct Mounted {
    element: Element,
    placement: Placement,
    width_px: f32,
}

#[derive(Debug, Clone)]
pub struct Document {
    stylesheet: Stylesheet,
    viewport_width: f32,
    nodes: BTreeMap<NodeId, Mounted>,
    next_id: u64,
}

impl Document {
    pub fn new(theme: Theme, viewport_width: f32) -> Self {
        Self {
            stylesheet: Stylesheet::for_theme(theme),
            viewport_width,
            nodes: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn theme(&self) -> Theme {
        self.stylesheet.theme()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.stylesheet = Stylesheet::for_theme(theme);
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    /// Computed style every mounted root inherits from.
    pub fn root_style(&self) -> Style {
        self.stylesheet.body_style()
    }

    /// Mounts `element` at viewport width.
    pub fn mount(&mut self, element: Element, placement: Placement) -> NodeId {
        let width = self.viewport_width;
        self.mount_with_width(element, placement, width)
    }

    pub fn mount_with_width(&mut self, element: Element, placement: Placement, width_px: f32) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Mounted {
                element,
                placement,
                width_px,
            },
        );
        id
    }

    pub fn unmount(&mut self, id: NodeId) -> Option<Element> {
        self.nodes.remove(&id).map(|m| m.element)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(&id).map(|m| &m.element)
    }

    /// Computed style of the element reached from root `id` by following `path`
    /// (indices into element children).
    pub fn computed_style(&self, id: NodeId, path: &[usize]) -> Option<Style> {
        let mut element = self.get(id)?;
        let mut style = compute_style(element, &self.root_style(), &self.stylesheet);
        for &index in path {
            element = element.element_children().nth(index)?;
            style = compute_style(element, &style, &self.stylesheet);
        }
        Some(style)
    }

    pub fn placement(&self, id: NodeId) -> Option<Placement> {
        self.nodes.get(&id).map(|m| m.placement)
    }

    /// Layout of a mounted subtree. `None` when it is absent or renders no box.
    pub fn layout(&self, id: NodeId) -> Option<LayoutBox> {
        let mounted = self.nodes.get(&id)?;
        let (x, y) = match mounted.placement {
            Placement::InFlow => (0.0, 0.0),
            Placement::Offscreen { left, top } => (left, top),
            Placement::Hidden => return None,
        };
        let ctx = LayoutContext {
            stylesheet: &self.stylesheet,
            root_style: self.root_style(),
        };
        layout_tree(&mounted.element, x, y, mounted.width_px, &ctx)
    }

    /// Rendered border box of a mounted subtree, like `getBoundingClientRect`.
    ///
    /// Hidden subtrees report an empty rect. `None` only when `id` is not mounted.
    pub fn bounding_rect(&self, id: NodeId) -> Option<Rect> {
        if !self.contains(id) {
            return None;
        }
        Some(self.layout(id).map(|b| b.rect).unwrap_or_default())
    }

    /// Number of elements, across every mounted subtree, carrying attribute `name`.
    pub fn count_with_attr(&self, name: &str) -> usize {
        self.nodes
            .values()
            .map(|m| m.element.collect_with_attr(name).len())
            .sum()
    }

    /// First mounted root whose subtree has `name="value"`.
    pub fn find_root_with_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, m)| m.element.find_by_attr(name, value).is_some())
            .map(|(id, _)| *id)
    }
}
