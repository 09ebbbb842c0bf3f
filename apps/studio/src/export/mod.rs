// Export pipeline: sanitize → rasterize → paginate → assemble → save.
// The orchestrator is the only entry point UI code should need.

pub mod assemble;
pub mod fallback;
pub mod filename;
pub mod orchestrator;
pub mod paginate;
pub mod raster;
pub mod sanitize;

pub use assemble::{DirectorySink, DownloadSink, PdfAssembler, PdfDocument};
pub use fallback::{
    fallback_to_print, file_print_url, print_url, write_local_print_page, FallbackTarget, Navigator,
    Notifier, PrintView, Toast, ToastLevel,
};
pub use filename::{generate_pdf_filename, generate_pdf_filename_today};
pub use orchestrator::{
    ExportConfig, ExportOptions, ExportOrchestrator, ExportOutcome, ExportRequest, ExportState,
};
pub use paginate::{paginate, PageFormat, PageSlice, TrailingPage};
pub use raster::{Bitmap, EncodedImage, RasterOptions, Rasterizer, SkiaRasterizer};
pub use sanitize::{capture, sanitize, SanitizeOptions, Scaffold, Snapshot, SCAFFOLD_ATTR};
