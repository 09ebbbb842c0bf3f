//! Export Orchestrator: runs sanitize → rasterize → paginate/assemble → save as one
//! sequential operation, and falls back to the print view on any failure.
//!
//! # State machine
//! `Idle → Sanitizing → Rasterizing → Assembling → Downloaded` on success,
//! `… → Failed → PrintFallback` on any stage error. Every transition is published
//! on a `watch` channel so a UI can disable its trigger and show progress.
//!
//! # Scaffold lifetime
//! The off-screen scaffold is owned by the rasterize stage and dropped as soon as
//! rasterization finishes, whatever its outcome, so it is gone before the state
//! reaches `Assembling`, `Downloaded` or `PrintFallback`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::document::{lock, NodeId, SharedDocument};
use crate::errors::{ErrorKind, ExportError};
use crate::export::assemble::{DownloadSink, PdfAssembler};
use crate::export::fallback::{fallback_to_print, Navigator, Notifier, PrintView, Toast};
use crate::export::paginate::{paginate, PageFormat, TrailingPage};
use crate::export::raster::{RasterOptions, Rasterizer};
use crate::export::sanitize::{capture, SanitizeOptions, Scaffold};

pub const DEFAULT_FILENAME: &str = "resume.pdf";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExportState {
    Idle,
    Sanitizing,
    Rasterizing,
    Assembling,
    Downloaded { filename: String },
    Failed { kind: ErrorKind, message: String },
    PrintFallback { url: String },
}

/// Per-export options supplied by the trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub filename: String,
    /// Device pixels per CSS pixel.
    pub scale: f32,
    /// Nominal image quality in `(0, 1]`. Pages are embedded losslessly, so this
    /// only matters to rasterizers with a lossy output.
    pub quality: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            scale: 2.0,
            quality: 1.0,
        }
    }
}

impl ExportOptions {
    fn validate(&self) -> Result<(), ExportError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ExportError::InvalidOptions(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ExportError::InvalidOptions(format!(
                "quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }

    /// The requested filename, defaulted and forced to end in `.pdf`.
    fn resolved_filename(&self) -> String {
        let name = self.filename.trim();
        if name.is_empty() {
            DEFAULT_FILENAME.to_string()
        } else if name.to_ascii_lowercase().ends_with(".pdf") {
            name.to_string()
        } else {
            format!("{name}.pdf")
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// The mounted preview to export.
    pub source: NodeId,
    /// Identifies the resume for the print fallback.
    pub resume_id: String,
    /// Where the print fallback points for this resume.
    pub print_view: PrintView,
    pub options: ExportOptions,
}

/// Result handed back to the trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
}

impl ExportOutcome {
    pub const BUSY_MESSAGE: &'static str = "An export is already in progress";

    /// Outcome of a trigger that arrived while another export was running.
    pub fn busy() -> Self {
        Self::failure(Self::BUSY_MESSAGE)
    }

    pub fn is_busy(&self) -> bool {
        !self.success && self.error.as_deref() == Some(Self::BUSY_MESSAGE)
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            filename: None,
            error: Some(message.into()),
            saved_to: None,
            page_count: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Wait between mounting the scaffold and rasterizing it.
    pub settle: Duration,
    pub page_format: PageFormat,
    pub trailing_page: TrailingPage,
    /// Origin serving the print view.
    pub print_base_url: String,
    pub sanitize: SanitizeOptions,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(100),
            page_format: PageFormat::A4,
            trailing_page: TrailingPage::Preserve,
            print_base_url: "http://localhost:8080".to_string(),
            sanitize: SanitizeOptions::default(),
        }
    }
}

struct Saved {
    filename: String,
    path: PathBuf,
    page_count: usize,
}

/// Clears the in-flight flag when an export ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ExportOrchestrator {
    document: SharedDocument,
    rasterizer: Arc<dyn Rasterizer>,
    assembler: PdfAssembler,
    sink: Arc<dyn DownloadSink>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    config: ExportConfig,
    state: watch::Sender<ExportState>,
    in_flight: AtomicBool,
}

impl ExportOrchestrator {
    pub fn new(
        document: SharedDocument,
        rasterizer: Arc<dyn Rasterizer>,
        sink: Arc<dyn DownloadSink>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: ExportConfig,
    ) -> Self {
        let (state, _) = watch::channel(ExportState::Idle);
        Self {
            document,
            rasterizer,
            assembler: PdfAssembler::new(),
            sink,
            notifier,
            navigator,
            config,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_assembler(mut self, assembler: PdfAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Receives every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ExportState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ExportState {
        self.state.borrow().clone()
    }

    /// True while an export runs; a trigger should be disabled meanwhile.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one export. Never panics or propagates: every failure becomes an
    /// unsuccessful outcome after the print fallback has fired.
    ///
    /// A call made while another export is running returns [`ExportOutcome::busy`]
    /// and has no other effect.
    pub async fn export(&self, request: ExportRequest) -> ExportOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Export of {} ignored: another export is running", request.resume_id);
            return ExportOutcome::busy();
        }
        let _in_flight = InFlight(&self.in_flight);

        info!("Starting PDF export of resume {}", request.resume_id);
        self.notifier.notify(Toast::loading("Generating PDF..."));

        match self.run(&request).await {
            Ok(saved) => {
                info!(
                    "PDF export of {} finished: {} ({} page(s))",
                    request.resume_id, saved.filename, saved.page_count
                );
                self.transition(ExportState::Downloaded {
                    filename: saved.filename.clone(),
                });
                self.notifier
                    .notify(Toast::success(format!("Downloaded {}", saved.filename)));
                ExportOutcome {
                    success: true,
                    filename: Some(saved.filename),
                    error: None,
                    saved_to: Some(saved.path),
                    page_count: Some(saved.page_count),
                }
            }
            Err(err) => {
                let kind = err.kind();
                error!(?kind, "PDF export of {} failed: {err}", request.resume_id);
                self.transition(ExportState::Failed {
                    kind,
                    message: err.to_string(),
                });
                self.notifier.notify(Toast::error(format!(
                    "{err}. Opening the print view instead."
                )));

                let url = request
                    .print_view
                    .url(&self.config.print_base_url, &request.resume_id);
                fallback_to_print(self.navigator.as_ref(), &url);
                self.transition(ExportState::PrintFallback { url });
                ExportOutcome::failure(err.to_string())
            }
        }
    }

    async fn run(&self, request: &ExportRequest) -> Result<Saved, ExportError> {
        let options = &request.options;

        // Step 1: Preconditions and sanitized snapshot.
        self.transition(ExportState::Sanitizing);
        options.validate()?;
        let snapshot = {
            let document = lock(&self.document);
            capture(&document, request.source, &self.config.sanitize)?
        };

        // Step 2: Rasterize. The scaffold lives exactly as long as this block.
        let bitmap = {
            let scaffold = Scaffold::attach(&self.document, snapshot, &self.config.sanitize);
            tokio::time::sleep(self.config.settle).await;
            self.transition(ExportState::Rasterizing);

            let content = scaffold.content()?;
            let (width, height) = scaffold.size();
            let raster_options = RasterOptions {
                scale: options.scale,
                background: self.config.sanitize.background,
            };
            let rasterizer = self.rasterizer.clone();
            tokio::task::spawn_blocking(move || {
                rasterizer.rasterize(&content, width, height, &raster_options)
            })
            .await
            .map_err(|e| ExportError::Rasterization(format!("rasterizer task failed: {e}")))??
        };
        debug!(
            "Bitmap {}x{} (quality {} has no effect on lossless pages)",
            bitmap.width(),
            bitmap.height(),
            options.quality
        );

        // Step 3: Paginate and assemble.
        self.transition(ExportState::Assembling);
        let assembler = self.assembler.clone();
        let format = self.config.page_format;
        let trailing = self.config.trailing_page;
        let pdf = tokio::task::spawn_blocking(move || {
            let image = bitmap.encode_png()?;
            let slices = paginate(image.width, image.height, &format, trailing);
            assembler.assemble(&slices, &image, &format)
        })
        .await
        .map_err(|e| ExportError::Assembly(format!("assembly task failed: {e}")))??;

        // Step 4: Hand the file to the user.
        let filename = options.resolved_filename();
        let path = self.sink.save(&filename, &pdf.bytes).await?;

        Ok(Saved {
            filename,
            path,
            page_count: pdf.page_count,
        })
    }

    fn transition(&self, next: ExportState) {
        let previous = self.state.send_replace(next.clone());
        debug!("Export state {:?} -> {:?}", previous, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_defaults_and_extension() {
        let mut options = ExportOptions::default();
        assert_eq!(options.resolved_filename(), "resume.pdf");
        options.filename = "  ".to_string();
        assert_eq!(options.resolved_filename(), "resume.pdf");
        options.filename = "Jane_Doe_2024-03-05".to_string();
        assert_eq!(options.resolved_filename(), "Jane_Doe_2024-03-05.pdf");
        options.filename = "cv.PDF".to_string();
        assert_eq!(options.resolved_filename(), "cv.PDF");
    }

    #[test]
    fn test_option_validation() {
        let bad_scale = ExportOptions {
            scale: 0.0,
            ..ExportOptions::default()
        };
        assert!(matches!(
            bad_scale.validate(),
            Err(ExportError::InvalidOptions(_))
        ));
        let bad_quality = ExportOptions {
            quality: 1.5,
            ..ExportOptions::default()
        };
        assert!(bad_quality.validate().is_err());
        assert!(ExportOptions::default().validate().is_ok());
    }

    #[test]
    fn test_outcome_serializes_like_the_trigger_contract() {
        let json = serde_json::to_value(ExportOutcome::busy()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "error": "An export is already in progress" })
        );
        assert!(ExportOutcome::busy().is_busy());
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let json = serde_json::to_value(ExportState::PrintFallback {
            url: "/print/r1?print=1".into(),
        })
        .unwrap();
        assert_eq!(json["state"], "print_fallback");
        assert_eq!(json["url"], "/print/r1?print=1");
    }
}
