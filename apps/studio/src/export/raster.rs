//! Rasterizer: paints a sanitized snapshot into a single bitmap.
//!
//! The snapshot is laid out against an empty stylesheet, since everything it needs
//! is inline, and painted with tiny-skia at `scale` device pixels per CSS pixel.
//! Text uses fixed 8x8 bitmap glyphs stretched to each character's metric advance,
//! so line breaks and widths agree exactly with the layout engine.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};
use tracing::debug;
use vitae_core::{Color, Element, FontWeight, Style};

use crate::errors::ExportError;
use crate::layout::{layout_tree, Fragment, LayoutBox, LayoutContext, TextLine};
use crate::stylesheet::Stylesheet;

/// Rows of a filled round bullet, drawn for `•` which no 8x8 table carries.
const BULLET_GLYPH: [u8; 8] = [0x00, 0x00, 0x18, 0x3C, 0x3C, 0x18, 0x00, 0x00];

#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Device pixels per CSS pixel.
    pub scale: f32,
    /// Painted under everything before the tree.
    pub background: Color,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background: Color::WHITE,
        }
    }
}

/// Turns an element tree into pixels. Implementations run on a blocking thread.
pub trait Rasterizer: Send + Sync {
    /// Rasterizes `element`, whose rendered size is `width` x `height` CSS pixels.
    /// The bitmap is `round(width * scale)` x `round(height * scale)`.
    fn rasterize(
        &self,
        element: &Element,
        width: f32,
        height: f32,
        options: &RasterOptions,
    ) -> Result<Bitmap, ExportError>;
}

/// A rasterized snapshot.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pixmap: Pixmap,
}

/// PNG-encoded image plus its pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Bitmap {
    /// An opaque bitmap filled with `color`. Fails for zero or unallocatable sizes.
    pub fn filled(width: u32, height: u32, color: Color) -> Result<Self, ExportError> {
        if width == 0 || height == 0 {
            return Err(ExportError::EmptyBitmap { width, height });
        }
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ExportError::Rasterization(format!("cannot allocate a {width}x{height} bitmap"))
        })?;
        pixmap.fill(skia_color(color));
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight (non-premultiplied) colour of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(p.red(), p.green(), p.blue(), p.alpha()))
    }

    pub fn encode_png(&self) -> Result<EncodedImage, ExportError> {
        let bytes = self
            .pixmap
            .encode_png()
            .map_err(|e| ExportError::Rasterization(format!("PNG encoding failed: {e}")))?;
        Ok(EncodedImage {
            bytes,
            width: self.width(),
            height: self.height(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// tiny-skia implementation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct SkiaRasterizer;

impl Rasterizer for SkiaRasterizer {
    fn rasterize(
        &self,
        element: &Element,
        width: f32,
        height: f32,
        options: &RasterOptions,
    ) -> Result<Bitmap, ExportError> {
        if !options.scale.is_finite() || options.scale <= 0.0 {
            return Err(ExportError::Rasterization(format!(
                "invalid scale {}",
                options.scale
            )));
        }
        let px_width = (width * options.scale).round().max(0.0) as u32;
        let px_height = (height * options.scale).round().max(0.0) as u32;
        let mut bitmap = Bitmap::filled(px_width, px_height, options.background)?;

        let sheet = Stylesheet::empty();
        let ctx = LayoutContext {
            stylesheet: &sheet,
            root_style: Style::default(),
        };
        let transform = Transform::from_scale(options.scale, options.scale);
        if let Some(root) = layout_tree(element, 0.0, 0.0, width, &ctx) {
            paint_box(&mut bitmap.pixmap, &root, transform);
        }

        debug!(
            "Rasterized {:.0}x{:.0}px at {}x into {}x{}",
            width, height, options.scale, px_width, px_height
        );
        Ok(bitmap)
    }
}

fn paint_box(pixmap: &mut Pixmap, b: &LayoutBox, transform: Transform) {
    if let Some(bg) = b.style.background.filter(|c| !c.is_transparent()) {
        fill_rect(pixmap, b.rect.x, b.rect.y, b.rect.width, b.rect.height, bg, transform);
    }

    for fragment in &b.fragments {
        match fragment {
            Fragment::Block(child) => paint_box(pixmap, child, transform),
            Fragment::Line(line) => paint_line(pixmap, line, transform),
        }
    }

    if let Some(border) = b.style.border_bottom_px.filter(|w| *w > 0.0) {
        let color = b.style.border_color.unwrap_or(Color::BLACK);
        fill_rect(
            pixmap,
            b.rect.x,
            b.rect.bottom() - border,
            b.rect.width,
            border,
            color,
            transform,
        );
    }

    if let Some(marker) = b.marker {
        if let Some(path) = PathBuilder::from_circle(marker.cx, marker.cy, marker.radius) {
            pixmap.fill_path(&path, &paint(marker.color), FillRule::Winding, transform, None);
        }
    }
}

fn paint_line(pixmap: &mut Pixmap, line: &TextLine, transform: Transform) {
    let font = line.style.font();
    let glyph_height = line.style.size_px;
    let top = line.rect.y + (line.rect.height - glyph_height) / 2.0;
    let cell_h = glyph_height / 8.0;
    let heavy = matches!(line.style.weight, FontWeight::Semibold | FontWeight::Bold);

    let mut pb = PathBuilder::new();
    let mut pen = line.rect.x;
    for c in line.text.chars() {
        let advance = font.advance_px(c);
        if let Some(rows) = glyph(c) {
            let cell_w = advance / 8.0;
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..8 {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let x = pen + col as f32 * cell_w;
                    let y = top + row as f32 * cell_h;
                    // Faux bold: widen every stroke by half a cell.
                    let w = if heavy { cell_w * 1.5 } else { cell_w };
                    if let Some(r) = tiny_skia::Rect::from_xywh(x, y, w, cell_h) {
                        pb.push_rect(r);
                    }
                }
            }
        }
        pen += advance;
    }

    if let Some(path) = pb.finish() {
        pixmap.fill_path(&path, &paint(line.style.color), FillRule::Winding, transform, None);
    }
}

fn glyph(c: char) -> Option<[u8; 8]> {
    match c {
        '•' | '·' => Some(BULLET_GLYPH),
        '–' | '—' | '‒' => BASIC_FONTS.get('-'),
        '‘' | '’' => BASIC_FONTS.get('\''),
        '“' | '”' => BASIC_FONTS.get('"'),
        _ => BASIC_FONTS.get(c).or_else(|| LATIN_FONTS.get(c)),
    }
}

fn fill_rect(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    color: Color,
    transform: Transform,
) {
    if let Some(rect) = tiny_skia::Rect::from_xywh(x, y, width, height) {
        pixmap.fill_rect(rect, &paint(color), transform, None);
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}
