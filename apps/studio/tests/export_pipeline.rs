use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vitae_core::{render_preview, Element, Palette, Resume, ResumeSection, Style, Tag};
use vitae_studio::document::lock;
use vitae_studio::export::{
    write_local_print_page, Bitmap, DirectorySink, DownloadSink, ExportConfig, ExportOptions,
    ExportOrchestrator, ExportRequest, ExportState, Navigator, Notifier, PdfAssembler, PrintView,
    RasterOptions, Rasterizer, SkiaRasterizer, Toast, ToastLevel, TrailingPage, SCAFFOLD_ATTR,
};
use vitae_studio::source::{ChainSource, LocalCache};
use vitae_studio::{Document, ExportError, NodeId, Placement, SharedDocument, Theme};

// ── test doubles ──

#[derive(Default)]
struct RecordingNavigator {
    tabs: Mutex<Vec<String>>,
    navigations: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn calls(&self) -> Vec<String> {
        let mut all = self.tabs.lock().unwrap().clone();
        all.extend(self.navigations.lock().unwrap().iter().cloned());
        all
    }
}

impl Navigator for RecordingNavigator {
    fn open_new_tab(&self, url: &str) -> bool {
        self.tabs.lock().unwrap().push(url.to_string());
        true
    }

    fn navigate(&self, url: &str) {
        self.navigations.lock().unwrap().push(url.to_string());
    }
}

#[derive(Default)]
struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    fn count(&self) -> usize {
        self.toasts.lock().unwrap().len()
    }

    fn errors(&self) -> Vec<String> {
        self.toasts
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.level == ToastLevel::Error)
            .map(|t| t.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

/// Delegates to the real rasterizer, recording how often it ran and how many
/// scaffolds were mounted while it did.
struct SpyRasterizer {
    document: SharedDocument,
    calls: AtomicUsize,
    scaffolds_seen: AtomicUsize,
    delay: Duration,
}

impl SpyRasterizer {
    fn new(document: &SharedDocument) -> Self {
        Self {
            document: document.clone(),
            calls: AtomicUsize::new(0),
            scaffolds_seen: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }
}

impl Rasterizer for SpyRasterizer {
    fn rasterize(
        &self,
        element: &Element,
        width: f32,
        height: f32,
        options: &RasterOptions,
    ) -> Result<Bitmap, ExportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scaffolds_seen.store(
            lock(&self.document).count_with_attr(SCAFFOLD_ATTR),
            Ordering::SeqCst,
        );
        std::thread::sleep(self.delay);
        SkiaRasterizer.rasterize(element, width, height, options)
    }
}

struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn rasterize(
        &self,
        _element: &Element,
        _width: f32,
        _height: f32,
        _options: &RasterOptions,
    ) -> Result<Bitmap, ExportError> {
        Err(ExportError::Rasterization("canvas is tainted".to_string()))
    }
}

struct FullDisk;

#[async_trait]
impl DownloadSink for FullDisk {
    async fn save(&self, filename: &str, _pdf: &[u8]) -> Result<PathBuf, ExportError> {
        Err(ExportError::Save(format!("{filename}: no space left on device")))
    }
}

// ── fixtures ──

struct Harness {
    document: SharedDocument,
    source: NodeId,
    navigator: Arc<RecordingNavigator>,
    notifier: Arc<RecordingNotifier>,
    out: tempfile::TempDir,
}

impl Harness {
    fn new(viewport_width: f32, root: Element) -> Self {
        let document = Document::new(Theme::Dark, viewport_width).into_shared();
        let source = lock(&document).mount(root, Placement::InFlow);
        Self {
            document,
            source,
            navigator: Arc::new(RecordingNavigator::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            out: tempfile::tempdir().unwrap(),
        }
    }

    fn orchestrator(&self, rasterizer: Arc<dyn Rasterizer>, trailing: TrailingPage) -> ExportOrchestrator {
        ExportOrchestrator::new(
            self.document.clone(),
            rasterizer,
            Arc::new(DirectorySink::new(self.out.path())),
            self.notifier.clone(),
            self.navigator.clone(),
            ExportConfig {
                settle: Duration::ZERO,
                trailing_page: trailing,
                print_base_url: "https://vitae.test".to_string(),
                ..ExportConfig::default()
            },
        )
    }

    fn request(&self, filename: &str, scale: f32) -> ExportRequest {
        ExportRequest {
            source: self.source,
            resume_id: "resume-42".to_string(),
            print_view: PrintView::Server,
            options: ExportOptions {
                filename: filename.to_string(),
                scale,
                quality: 1.0,
            },
        }
    }

    fn scaffolds(&self) -> usize {
        lock(&self.document).count_with_attr(SCAFFOLD_ATTR)
    }
}

fn one_page_resume() -> Element {
    let mut resume = Resume::new("resume-42");
    resume.name = "Jane Doe".to_string();
    resume.role = "Backend Engineer".to_string();
    resume.email = Some("jane@example.com".to_string());
    resume.summary = "Builds reliable services.".to_string();
    resume.experience = vec![ResumeSection {
        start_date: Some("2021".to_string()),
        end_date: Some("Present".to_string()),
        ..ResumeSection::new("e1", "Acme — Staff Engineer", "Led the billing rewrite\nCut p99 latency by 40%")
    }];
    resume.skills = vec!["Rust".to_string(), "PostgreSQL".to_string()];
    render_preview(&resume, &Palette::light())
}

fn block(height: f32) -> Element {
    Element::new(Tag::Div).style(Style {
        height_px: Some(height),
        ..Style::default()
    })
}

fn page_count(path: &std::path::Path) -> usize {
    lopdf::Document::load(path).unwrap().get_pages().len()
}

// ── tests ──

#[tokio::test]
async fn test_zero_width_source_never_reaches_rasterizer() {
    let h = Harness::new(0.0, one_page_resume());
    let spy = Arc::new(SpyRasterizer::new(&h.document));
    let orchestrator = h.orchestrator(spy.clone(), TrailingPage::Preserve);

    let outcome = orchestrator.export(h.request("resume.pdf", 2.0)).await;

    assert!(!outcome.success);
    assert!(
        outcome.error.as_deref().unwrap().contains("no visible content"),
        "got {:?}",
        outcome.error
    );
    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.scaffolds(), 0);
    assert!(std::fs::read_dir(h.out.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_single_page_resume_exports_one_page_pdf() {
    let h = Harness::new(794.0, one_page_resume());
    let spy = Arc::new(SpyRasterizer::new(&h.document));
    let orchestrator = h.orchestrator(spy.clone(), TrailingPage::Preserve);
    assert_eq!(h.scaffolds(), 0);

    let outcome = orchestrator
        .export(h.request("Jane_Doe_2024-03-05.pdf", 2.0))
        .await;

    assert!(outcome.success, "export failed: {:?}", outcome.error);
    assert_eq!(outcome.filename.as_deref(), Some("Jane_Doe_2024-03-05.pdf"));
    assert_eq!(outcome.page_count, Some(1));
    let saved = outcome.saved_to.unwrap();
    assert_eq!(saved, h.out.path().join("Jane_Doe_2024-03-05.pdf"));
    assert_eq!(page_count(&saved), 1);

    // The scaffold existed while rasterizing and is gone afterwards.
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    assert_eq!(spy.scaffolds_seen.load(Ordering::SeqCst), 1);
    assert_eq!(h.scaffolds(), 0);
    assert!(lock(&h.document).contains(h.source));

    assert!(h.navigator.calls().is_empty());
    assert!(matches!(orchestrator.state(), ExportState::Downloaded { .. }));
}

#[tokio::test]
async fn test_exported_pdf_carries_resume_title() {
    let h = Harness::new(794.0, one_page_resume());
    let orchestrator = h
        .orchestrator(Arc::new(SkiaRasterizer), TrailingPage::Preserve)
        .with_assembler(PdfAssembler::new().with_title("Jane Doe"));

    let outcome = orchestrator.export(h.request("resume.pdf", 1.0)).await;
    assert!(outcome.success, "export failed: {:?}", outcome.error);

    let pdf = lopdf::Document::load(outcome.saved_to.unwrap()).unwrap();
    let info = pdf.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let title = pdf
        .get_object(info)
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"Title")
        .unwrap()
        .as_str()
        .unwrap();
    assert_eq!(title, b"Jane Doe");
}

#[tokio::test]
async fn test_rasterizer_failure_cleans_up_and_falls_back_once() {
    let h = Harness::new(794.0, one_page_resume());
    let orchestrator = h.orchestrator(Arc::new(FailingRasterizer), TrailingPage::Preserve);

    let outcome = orchestrator.export(h.request("resume.pdf", 2.0)).await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.error.as_deref(),
        Some("PDF conversion failed: canvas is tainted")
    );
    assert_eq!(h.scaffolds(), 0);

    let calls = h.navigator.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("resume-42"));
    assert!(calls[0].contains("print=1"));
    assert_eq!(calls[0], "https://vitae.test/print/resume-42?print=1");

    let errors = h.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("canvas is tainted"));
    assert!(matches!(orchestrator.state(), ExportState::PrintFallback { .. }));
}

#[tokio::test]
async fn test_cache_only_resume_falls_back_to_local_print_page() {
    let h = Harness::new(794.0, one_page_resume());
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = LocalCache::new(cache_dir.path().join("resumes.v1.json"));
    let mut draft = Resume::new("draft 7");
    draft.name = "Jane Doe".to_string();
    cache.save(&draft).await.unwrap();

    let chain = ChainSource::new(vec![Box::new(cache)]);
    let resolved = chain.resolve("draft 7").await.unwrap().unwrap();
    assert!(!resolved.serves_print_view);

    let page = write_local_print_page(cache_dir.path(), &resolved.resume, Duration::from_millis(400))
        .await
        .unwrap();
    let orchestrator = h.orchestrator(Arc::new(FailingRasterizer), TrailingPage::Preserve);
    let outcome = orchestrator
        .export(ExportRequest {
            resume_id: resolved.resume.id().to_string(),
            print_view: PrintView::Local(page.clone()),
            ..h.request("resume.pdf", 2.0)
        })
        .await;

    assert!(!outcome.success);
    let calls = h.navigator.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("file:///"));
    assert!(calls[0].contains("print-draft%2520"));
    assert!(calls[0].ends_with("?print=1"));
    assert!(!calls[0].contains("vitae.test"));

    let html = std::fs::read_to_string(&page).unwrap();
    assert!(html.contains("<title>Jane Doe</title>"));
    assert!(html.contains("window.print()"));
    assert!(matches!(orchestrator.state(), ExportState::PrintFallback { url } if url == calls[0]));
}

#[tokio::test]
async fn test_save_failure_is_reported_and_falls_back() {
    let h = Harness::new(794.0, one_page_resume());
    let orchestrator = ExportOrchestrator::new(
        h.document.clone(),
        Arc::new(SkiaRasterizer),
        Arc::new(FullDisk),
        h.notifier.clone(),
        h.navigator.clone(),
        ExportConfig {
            settle: Duration::ZERO,
            ..ExportConfig::default()
        },
    );

    let outcome = orchestrator.export(h.request("resume.pdf", 1.0)).await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("no space left"));
    assert_eq!(h.navigator.calls().len(), 1);
    assert_eq!(h.scaffolds(), 0);
}

#[tokio::test]
async fn test_second_trigger_while_running_is_a_no_op() {
    let h = Harness::new(794.0, one_page_resume());
    let mut spy = SpyRasterizer::new(&h.document);
    spy.delay = Duration::from_millis(300);
    let spy = Arc::new(spy);
    let orchestrator = Arc::new(h.orchestrator(spy.clone(), TrailingPage::Preserve));
    let mut states = orchestrator.subscribe();

    let first = {
        let orchestrator = orchestrator.clone();
        let request = h.request("first.pdf", 1.0);
        tokio::spawn(async move { orchestrator.export(request).await })
    };
    states
        .wait_for(|s| *s == ExportState::Rasterizing)
        .await
        .unwrap();
    assert!(orchestrator.is_busy());

    let toasts_before = h.notifier.count();
    let second = orchestrator.export(h.request("second.pdf", 1.0)).await;
    assert!(second.is_busy());
    assert_eq!(h.notifier.count(), toasts_before);

    let first = first.await.unwrap();
    assert!(first.success);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    assert!(!h.out.path().join("second.pdf").exists());

    // The guard is released once the first export ends.
    assert!(!orchestrator.is_busy());
    let third = orchestrator.export(h.request("third.pdf", 1.0)).await;
    assert!(third.success);
}

#[tokio::test]
async fn test_exact_two_page_height_emits_trailing_page() {
    // 210 px wide at scale 1 maps one pixel to one millimetre: 594 px is two A4 pages.
    let h = Harness::new(210.0, block(594.0));
    let orchestrator = h.orchestrator(Arc::new(SkiaRasterizer), TrailingPage::Preserve);
    let outcome = orchestrator.export(h.request("exact.pdf", 1.0)).await;
    assert!(outcome.success, "export failed: {:?}", outcome.error);
    assert_eq!(page_count(&outcome.saved_to.unwrap()), 3);

    let trimmed = h.orchestrator(Arc::new(SkiaRasterizer), TrailingPage::Trim);
    let outcome = trimmed.export(h.request("trimmed.pdf", 1.0)).await;
    assert_eq!(page_count(&outcome.saved_to.unwrap()), 2);
}

#[tokio::test]
async fn test_repeated_exports_leave_no_orphans() {
    let h = Harness::new(794.0, one_page_resume());
    let good = h.orchestrator(Arc::new(SkiaRasterizer), TrailingPage::Preserve);
    let bad = h.orchestrator(Arc::new(FailingRasterizer), TrailingPage::Preserve);

    for i in 0..3 {
        assert!(good.export(h.request(&format!("ok-{i}.pdf"), 1.0)).await.success);
        assert!(!bad.export(h.request("bad.pdf", 1.0)).await.success);
    }
    assert_eq!(h.scaffolds(), 0);
    assert_eq!(lock(&h.document).len(), 1);
}
