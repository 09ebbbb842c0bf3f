//! Shared building blocks for Vitae: the resume model, the element tree every
//! renderer speaks, the colour palettes and the preview renderer.
//!
//! Nothing in this crate performs I/O. The studio mounts and exports what
//! `render_preview` produces; [`render_print_page`] wraps the same tree in the
//! print view that both the API and the studio's offline fallback serve.

pub mod dom;
pub mod model;
pub mod palette;
pub mod preview;
pub mod print;

pub use dom::{Color, Display, Element, FontFamily, FontWeight, ListMarker, Node, Style, Tag, WhiteSpace};
pub use model::{Resume, ResumeSection};
pub use palette::Palette;
pub use preview::{render_preview, text_block, visible_sections, SectionKind};
pub use print::{render_print_page, PRINT_FLAG};
