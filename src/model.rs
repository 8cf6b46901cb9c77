use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

/// Clinic accent color (#005aab), used for the net price highlight.
pub const ACCENT: [u8; 3] = [0x00, 0x5a, 0xab];
/// Muted gray (#555555) for captions and secondary text.
pub const MUTED: [u8; 3] = [0x55, 0x55, 0x55];
/// Background fill (#f8f9fa) behind the boxed net price line.
pub const BOX_BG: [u8; 3] = [0xf8, 0xf9, 0xfa];

/// Validated input record for one quote. Supplied by the caller (UI or CLI);
/// the pipeline re-validates required fields and the horizon range on entry.
///
/// `discount <= sticker_price` is deliberately NOT enforced: a larger discount
/// yields a negative net price, which is rendered as-is.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuoteInput {
    pub clinic_name: String,
    pub contact_info: String,
    pub patient_name: String,
    pub issue_date: NaiveDate,
    pub surgery_at: NaiveDateTime,
    /// Sticker price in whole currency units (KRW), >= 0.
    pub sticker_price: i64,
    pub discount: i64,
    /// Expected service life in years, 5..=30.
    pub horizon_years: i64,
}

/// Derived financial figures. Recomputed on every render, never cached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuoteResult {
    pub net_price: i64,
    /// Exact quotient `net_price / (horizon_years * 365)`. Rounding or
    /// truncation happens at display time only.
    pub daily_cost: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AssetKind {
    Image,
    Font,
}

/// Result of probing one logical asset name against the asset directory.
/// Owned by the resolver output for the duration of one render.
#[derive(Clone, Debug)]
pub struct AssetRef {
    pub logical_name: String,
    pub path: PathBuf,
    pub present: bool,
    pub kind: AssetKind,
    /// Pixel dimensions from the image header, when the asset is a readable image.
    pub pixel_size: Option<(u32, u32)>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

#[derive(Clone)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub display_width: f32,  // points
    pub display_height: f32, // points
}

/// One logical unit of document content, prior to absolute placement.
/// Insertion order defines document order.
///
/// `TextLine`, `Paragraph`, `Image` and `PageBreak` are flowing: the layout
/// cursor places them and the page-break rule applies. `Pinned` blocks carry
/// their own absolute coordinates, are drawn on whatever page the cursor is on,
/// and bypass pagination entirely (used for the QR annotation and the logo).
pub enum LayoutBlock {
    TextLine {
        text: String,
        size: f32,
        color: Option<[u8; 3]>,
        boxed: bool,
    },
    Paragraph {
        text: String,
        size: f32,
    },
    /// Flowing image at its intrinsic point size; the layout engine caps it at
    /// the content width and centers it when the cap applies.
    Image { image: EmbeddedImage },
    Pinned {
        image: EmbeddedImage,
        caption: Option<String>,
        /// Top-left corner, measured from the page's top-left in points.
        x: f32,
        y: f32,
    },
    PageBreak,
}

/// A fully resolved draw instruction in PDF coordinate space (origin at the
/// page's bottom-left, y increasing upward). Carries everything the renderer
/// needs; the renderer does no layout of its own.
pub enum DrawCommand {
    Text {
        page: usize,
        x: f32,
        /// Baseline y.
        y: f32,
        text: String,
        size: f32,
        color: Option<[u8; 3]>,
    },
    Rect {
        page: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<[u8; 3]>,
        stroke: Option<[u8; 3]>,
        stroke_width: f32,
    },
    Image {
        page: usize,
        x: f32,
        /// Bottom edge of the placed image.
        y: f32,
        width: f32,
        height: f32,
        image: EmbeddedImage,
    },
}

impl DrawCommand {
    pub fn page(&self) -> usize {
        match self {
            DrawCommand::Text { page, .. }
            | DrawCommand::Rect { page, .. }
            | DrawCommand::Image { page, .. } => *page,
        }
    }
}

/// Fixed page geometry. Every page of a document uses the same format.
#[derive(Clone, Copy, Debug)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    /// A4 portrait with 50pt margins.
    pub fn a4() -> Self {
        Self {
            page_width: 595.276,
            page_height: 841.89,
            margin_top: 50.0,
            margin_bottom: 50.0,
            margin_left: 50.0,
            margin_right: 50.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn usable_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }
}

/// Finished document: opaque bytes plus a suggested download filename.
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
}
