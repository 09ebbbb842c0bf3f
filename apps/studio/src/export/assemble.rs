//! PDF Assembler: one page per slice, all sharing a single image XObject, and the
//! sinks that hand the finished file to the user.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tiny_skia::Pixmap;
use tracing::{debug, info};

use crate::errors::ExportError;
use crate::export::paginate::{mm_to_pt, PageFormat, PageSlice};
use crate::export::raster::EncodedImage;

const IMAGE_NAME: &str = "Im0";

/// A finished PDF.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

#[derive(Debug, Clone)]
pub struct PdfAssembler {
    title: Option<String>,
    creator: String,
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self {
            title: None,
            creator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl PdfAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builds a document with one `format`-sized page per slice.
    ///
    /// The PNG is decoded and re-embedded as 8-bit DeviceRGB with FlateDecode, so
    /// the pixels reach the PDF without lossy recompression.
    pub fn assemble(
        &self,
        slices: &[PageSlice],
        image: &EncodedImage,
        format: &PageFormat,
    ) -> Result<PdfDocument, ExportError> {
        if slices.is_empty() {
            return Err(ExportError::Assembly("no pages to assemble".to_string()));
        }

        let rgb = decode_rgb(image)?;
        let compressed = zlib(&rgb)?;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        ));
        let resources_id = doc.add_object(dictionary! {
            "XObject" => dictionary! {
                IMAGE_NAME => image_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(slices.len());
        for slice in slices {
            let content = Content {
                operations: place_image(slice, format),
            };
            let encoded = content
                .encode()
                .map_err(|e| ExportError::Assembly(format!("encoding page content: {e}")))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len();
        doc.set_object(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Count" => page_count as i64,
                "Kids" => kids,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    format.width_pt().into(),
                    format.height_pt().into(),
                ],
            },
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let stamp = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        let mut info = dictionary! {
            "Creator" => Object::string_literal(self.creator.clone()),
            "CreationDate" => Object::string_literal(stamp),
        };
        if let Some(title) = &self.title {
            info.set("Title", Object::string_literal(title.clone()));
        }
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| ExportError::Assembly(format!("writing PDF: {e}")))?;

        debug!(
            "Assembled {} page(s) from a {}x{} image ({} bytes)",
            page_count,
            image.width,
            image.height,
            bytes.len()
        );
        Ok(PdfDocument { bytes, page_count })
    }
}

/// `q w 0 0 h x y cm /Im0 Do Q`, with the slice's top-left offset converted to the
/// PDF's bottom-left origin.
fn place_image(slice: &PageSlice, format: &PageFormat) -> Vec<Operation> {
    let width_pt = mm_to_pt(slice.image_width_mm);
    let height_pt = mm_to_pt(slice.image_height_mm);
    let bottom_mm = format.height_mm - (slice.vertical_offset_mm + slice.image_height_mm);
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                width_pt.into(),
                0.into(),
                0.into(),
                height_pt.into(),
                0.into(),
                mm_to_pt(bottom_mm).into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

fn decode_rgb(image: &EncodedImage) -> Result<Vec<u8>, ExportError> {
    let pixmap = Pixmap::decode_png(&image.bytes)
        .map_err(|e| ExportError::Assembly(format!("decoding page image: {e}")))?;
    if pixmap.width() != image.width || pixmap.height() != image.height {
        return Err(ExportError::Assembly(format!(
            "page image is {}x{}, expected {}x{}",
            pixmap.width(),
            pixmap.height(),
            image.width,
            image.height
        )));
    }
    let mut rgb = Vec::with_capacity(pixmap.pixels().len() * 3);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
    }
    Ok(rgb)
}

fn zlib(data: &[u8]) -> Result<Vec<u8>, ExportError> {
    let failed = |e: std::io::Error| ExportError::Assembly(format!("compressing page image: {e}"));
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(failed)?;
    encoder.finish().map_err(failed)
}

// ────────────────────────────────────────────────────────────────────────────
// Download sinks
// ────────────────────────────────────────────────────────────────────────────

/// Receives the finished PDF under the user-facing filename.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Saves `pdf` as `filename` and returns where it ended up.
    async fn save(&self, filename: &str, pdf: &[u8]) -> Result<PathBuf, ExportError>;
}

/// Writes downloads into one directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, filename: &str, pdf: &[u8]) -> Result<PathBuf, ExportError> {
        // Only the final component; a download never escapes its directory.
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| ExportError::Save(format!("invalid filename {filename:?}")))?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ExportError::Save(format!("{}: {e}", self.dir.display())))?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, pdf)
            .await
            .map_err(|e| ExportError::Save(format!("{}: {e}", path.display())))?;
        info!("Saved {} ({} bytes)", path.display(), pdf.len());
        Ok(path)
    }
}
