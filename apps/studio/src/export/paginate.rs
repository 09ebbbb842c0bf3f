//! Paginator: maps one tall bitmap onto fixed-size physical pages.
//!
//! The image is scaled so its width fills the page width. Every page shows the same
//! image, shifted up by one page height per page; the page box clips the rest.

use serde::{Deserialize, Serialize};

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageFormat {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageFormat {
    pub const A4: PageFormat = PageFormat {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    pub fn width_pt(&self) -> f32 {
        mm_to_pt(self.width_mm)
    }

    pub fn height_pt(&self) -> f32 {
        mm_to_pt(self.height_mm)
    }
}

impl Default for PageFormat {
    fn default() -> Self {
        Self::A4
    }
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// What to do when the content ends exactly on a page boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingPage {
    /// Keep emitting while the remaining height is `>= 0`, which yields one blank
    /// trailing page for exact multiples. Matches documents exported so far.
    #[default]
    Preserve,
    /// Stop once less than 0.01 mm remains.
    Trim,
}

impl TrailingPage {
    fn wants_another(&self, remaining_mm: f32) -> bool {
        match self {
            TrailingPage::Preserve => remaining_mm >= 0.0,
            TrailingPage::Trim => remaining_mm > 0.01,
        }
    }
}

/// Placement of the full image on one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSlice {
    /// Offset of the image's top edge from the page's top edge; `0` or negative.
    pub vertical_offset_mm: f32,
    pub image_width_mm: f32,
    pub image_height_mm: f32,
}

/// Lays a `width_px` x `height_px` image out over pages of `format`.
///
/// Returns no pages for an image with a zero dimension.
pub fn paginate(
    width_px: u32,
    height_px: u32,
    format: &PageFormat,
    trailing: TrailingPage,
) -> Vec<PageSlice> {
    if width_px == 0 || height_px == 0 {
        return Vec::new();
    }
    let image_width_mm = format.width_mm;
    let image_height_mm = height_px as f32 * format.width_mm / width_px as f32;
    let slice = |index: usize| PageSlice {
        vertical_offset_mm: -(index as f32 * format.height_mm),
        image_width_mm,
        image_height_mm,
    };

    let mut pages = vec![slice(0)];
    let mut remaining_mm = image_height_mm - format.height_mm;
    while trailing.wants_another(remaining_mm) {
        pages.push(slice(pages.len()));
        remaining_mm -= format.height_mm;
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_image_fits_one_page() {
        let pages = paginate(800, 1000, &PageFormat::A4, TrailingPage::Preserve);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].vertical_offset_mm, 0.0);
        assert_eq!(pages[0].image_width_mm, 210.0);
        assert!((pages[0].image_height_mm - 262.5).abs() < 1e-3);
    }

    #[test]
    fn test_offsets_step_by_page_height() {
        // 210 px wide maps 1 px to 1 mm; 700 mm tall needs three pages.
        let pages = paginate(210, 700, &PageFormat::A4, TrailingPage::Preserve);
        let offsets: Vec<f32> = pages.iter().map(|p| p.vertical_offset_mm).collect();
        assert_eq!(offsets, vec![0.0, -297.0, -594.0]);
    }

    #[test]
    fn test_exact_multiple_keeps_blank_trailing_page() {
        let pages = paginate(210, 594, &PageFormat::A4, TrailingPage::Preserve);
        assert_eq!(pages.len(), 3);
        let one = paginate(210, 297, &PageFormat::A4, TrailingPage::Preserve);
        assert_eq!(one.len(), 2);
    }

    #[test]
    fn test_trim_drops_blank_trailing_page() {
        assert_eq!(paginate(210, 594, &PageFormat::A4, TrailingPage::Trim).len(), 2);
        assert_eq!(paginate(210, 595, &PageFormat::A4, TrailingPage::Trim).len(), 3);
    }

    #[test]
    fn test_zero_dimension_yields_no_pages() {
        assert!(paginate(0, 100, &PageFormat::A4, TrailingPage::Preserve).is_empty());
        assert!(paginate(100, 0, &PageFormat::A4, TrailingPage::Trim).is_empty());
    }

    #[test]
    fn test_a4_in_points() {
        assert!((PageFormat::A4.width_pt() - 595.276).abs() < 0.01);
        assert!((PageFormat::A4.height_pt() - 841.89).abs() < 0.01);
    }
}
