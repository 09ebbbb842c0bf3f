//! Client side of Vitae: the live document holding the resume preview, and the
//! pipeline that exports it to a paginated A4 PDF with a print-view fallback.

pub mod config;
pub mod document;
pub mod errors;
pub mod export;
pub mod layout;
pub mod shell;
pub mod source;
pub mod stylesheet;

pub use document::{Document, NodeId, Placement, SharedDocument};
pub use errors::{ErrorKind, ExportError};
pub use stylesheet::{Stylesheet, Theme};
