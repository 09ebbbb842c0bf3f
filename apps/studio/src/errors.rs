use serde::Serialize;
use thiserror::Error;

/// Failure of one export attempt. Every variant ends the attempt and triggers the
/// print fallback; none is retried automatically.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No element provided for PDF generation")]
    MissingSource,

    #[error("Element has no visible content ({width}x{height})")]
    ZeroDimension { width: f32, height: f32 },

    #[error("Invalid export options: {0}")]
    InvalidOptions(String),

    #[error("PDF conversion failed: {0}")]
    Rasterization(String),

    #[error("PDF conversion failed: rasterizer produced an empty {width}x{height} bitmap")]
    EmptyBitmap { width: u32, height: u32 },

    #[error("PDF assembly failed: {0}")]
    Assembly(String),

    #[error("Saving the PDF failed: {0}")]
    Save(String),
}

/// Coarse failure classes, used for logging and for the user-facing toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Nothing renderable to export; no work was attempted.
    Precondition,
    /// Rasterizing the snapshot failed or produced nothing.
    Conversion,
    /// Building or saving the document failed.
    Assembly,
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::MissingSource
            | ExportError::ZeroDimension { .. }
            | ExportError::InvalidOptions(_) => ErrorKind::Precondition,
            ExportError::Rasterization(_) | ExportError::EmptyBitmap { .. } => {
                ErrorKind::Conversion
            }
            ExportError::Assembly(_) | ExportError::Save(_) => ErrorKind::Assembly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(
            ExportError::ZeroDimension {
                width: 0.0,
                height: 10.0
            }
            .kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            ExportError::Rasterization("boom".into()).kind(),
            ErrorKind::Conversion
        );
        assert_eq!(ExportError::Save("disk full".into()).kind(), ErrorKind::Assembly);
    }

    #[test]
    fn test_conversion_message_keeps_original_cause() {
        let err = ExportError::Rasterization("canvas tainted".into());
        assert_eq!(err.to_string(), "PDF conversion failed: canvas tainted");
    }
}
