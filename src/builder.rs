use std::path::Path;

use crate::assets::{self, AssetResolver};
use crate::model::{
    ACCENT, AssetRef, EmbeddedImage, ImageFormat, LayoutBlock, PageGeometry, QuoteInput,
    QuoteResult,
};

const TITLE: &str = "Premium Implant Treatment Estimate";
const TITLE_SIZE: f32 = 20.0;
const INFO_SIZE: f32 = 10.5;
const SUMMARY_SIZE: f32 = 12.0;
const NET_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 11.0;

/// Default on-page scale for intrinsic image sizes: pixels at 96dpi to points.
const PX_TO_PT: f32 = 0.75;

/// Rendered side of the pinned QR code, in points.
const QR_SIZE: f32 = 96.0;
/// Rendered width of the pinned logo, in points.
const LOGO_WIDTH: f32 = 110.0;

/// Assemble the fixed block sequence for one quote. Emits logical blocks with
/// semantic size hints only; concrete placement is the layout engine's job.
/// The sole geometric knowledge here is the choice of pin coordinates for the
/// QR annotation and the logo, which are fixed by design and not subject to
/// flow.
pub(crate) fn build(
    input: &QuoteInput,
    result: &QuoteResult,
    resolver: &AssetResolver,
    geo: &PageGeometry,
) -> Vec<LayoutBlock> {
    let mut blocks = Vec::new();

    // The logo is emitted ahead of the flowing content: pinned blocks draw on
    // whatever page the cursor is on, so this keeps it on the first page even
    // when the evidence images push the flow onto later pages.
    if let Some(asset) = resolver.resolve(assets::LOGO)
        && let Some(mut image) = load_image(&asset)
    {
        let aspect = image.display_height / image.display_width.max(1.0);
        image.display_width = LOGO_WIDTH;
        image.display_height = LOGO_WIDTH * aspect;
        blocks.push(LayoutBlock::Pinned {
            image,
            caption: None,
            x: geo.page_width - geo.margin_right - LOGO_WIDTH,
            y: geo.margin_top,
        });
    }

    blocks.push(LayoutBlock::TextLine {
        text: TITLE.to_string(),
        size: TITLE_SIZE,
        color: None,
        boxed: false,
    });

    blocks.push(LayoutBlock::TextLine {
        text: format!("{} | {}", input.clinic_name, input.contact_info),
        size: INFO_SIZE,
        color: None,
        boxed: false,
    });
    blocks.push(LayoutBlock::TextLine {
        text: format!("Patient: {}", input.patient_name),
        size: INFO_SIZE,
        color: None,
        boxed: false,
    });
    blocks.push(LayoutBlock::TextLine {
        text: format!(
            "Issued {} | Surgery {}",
            input.issue_date.format("%Y-%m-%d"),
            input.surgery_at.format("%Y-%m-%d %H:%M"),
        ),
        size: INFO_SIZE,
        color: None,
        boxed: false,
    });

    blocks.push(LayoutBlock::TextLine {
        text: format!("Sticker price: {} KRW", group_thousands(input.sticker_price)),
        size: SUMMARY_SIZE,
        color: None,
        boxed: false,
    });
    blocks.push(LayoutBlock::TextLine {
        // Discount shown as a negative delta against the sticker price.
        text: format!("Discount: {} KRW", group_thousands(-input.discount)),
        size: SUMMARY_SIZE,
        color: None,
        boxed: false,
    });
    blocks.push(LayoutBlock::TextLine {
        text: format!("Net price: {} KRW", group_thousands(result.net_price)),
        size: NET_SIZE,
        color: Some(ACCENT),
        boxed: true,
    });

    // Daily cost is truncated toward zero here, matching the original display
    // (`int(daily_cost)`); the stored result keeps the exact quotient.
    blocks.push(LayoutBlock::Paragraph {
        text: format!(
            "Across {} years of expected use, this treatment comes to an average daily \
             investment of {} KRW. An implant that never needs revision surgery is the \
             most economical choice for a lifetime of healthy smiles. All figures are a \
             consultation aid; the final plan is confirmed with your doctor.",
            input.horizon_years,
            group_thousands(result.daily_cost as i64),
        ),
        size: BODY_SIZE,
    });

    for logical in assets::EVIDENCE {
        let Some(asset) = resolver.resolve(logical) else {
            log::debug!("Supporting image {logical} absent, block skipped");
            continue;
        };
        if let Some(image) = load_image(&asset) {
            blocks.push(LayoutBlock::Image { image });
        }
    }

    // The QR annotation lands on whatever page the flow ends on, in its fixed
    // corner, and never triggers the page-break rule.
    if let Some(asset) = resolver.resolve(assets::QR)
        && let Some(mut image) = load_image(&asset)
    {
        image.display_width = QR_SIZE;
        image.display_height = QR_SIZE;
        blocks.push(LayoutBlock::Pinned {
            image,
            caption: Some("Scan to book your follow-up consultation".to_string()),
            x: geo.page_width - geo.margin_right - QR_SIZE,
            y: geo.page_height - geo.margin_bottom - QR_SIZE - 14.0,
        });
    }

    blocks
}

/// Read an image asset into an embeddable payload. Returns `None` (and logs)
/// on any read or format problem: a broken optional asset omits its block, it
/// never fails the document.
fn load_image(asset: &AssetRef) -> Option<EmbeddedImage> {
    let (pixel_width, pixel_height) = asset.pixel_size?;
    let data = match std::fs::read(&asset.path) {
        Ok(d) => d,
        Err(err) => {
            log::warn!("Cannot read image {} ({err}), block skipped", asset.path.display());
            return None;
        }
    };
    let format = match image_format(&asset.path, &data) {
        Some(f) => f,
        None => {
            log::warn!(
                "Unsupported image format for {}, block skipped",
                asset.path.display()
            );
            return None;
        }
    };
    Some(EmbeddedImage {
        data,
        format,
        pixel_width,
        pixel_height,
        display_width: pixel_width as f32 * PX_TO_PT,
        display_height: pixel_height as f32 * PX_TO_PT,
    })
}

fn image_format(path: &Path, data: &[u8]) -> Option<ImageFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(e) if e.eq_ignore_ascii_case("png") => return Some(ImageFormat::Png),
        Some(e) if e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg") => {
            return Some(ImageFormat::Jpeg);
        }
        _ => {}
    }
    match image::guess_format(data).ok()? {
        image::ImageFormat::Png => Some(ImageFormat::Png),
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

/// Format an integer with thousands separators, e.g. `-1234567` → `-1,234,567`.
pub(crate) fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    let lead = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance;
    use crate::fonts::QuoteFont;
    use crate::layout;
    use crate::model::DrawCommand;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn sample_input() -> QuoteInput {
        QuoteInput {
            clinic_name: "Bright Dental".into(),
            contact_info: "02-555-0192".into(),
            patient_name: "Kim Minjun".into(),
            issue_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            surgery_at: NaiveDateTime::parse_from_str("2026-03-20 10:30", "%Y-%m-%d %H:%M")
                .unwrap(),
            sticker_price: 1_500_000,
            discount: 200_000,
            horizon_years: 15,
        }
    }

    fn temp_root(tag: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("quotesmith-builder-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn build_for(root: &Path) -> Vec<LayoutBlock> {
        let input = sample_input();
        let result = finance::compute(input.sticker_price, input.discount, input.horizon_years)
            .unwrap();
        build(&input, &result, &AssetResolver::new(root), &PageGeometry::a4())
    }

    #[test]
    fn absent_images_emit_no_blocks() {
        let blocks = build_for(&temp_root("noassets"));
        assert!(
            !blocks
                .iter()
                .any(|b| matches!(b, LayoutBlock::Image { .. } | LayoutBlock::Pinned { .. }))
        );
        // Title, three info lines, three pricing lines, narrative.
        assert_eq!(blocks.len(), 8);
    }

    #[test]
    fn present_evidence_images_appear_in_order() {
        let root = temp_root("evidence");
        image::RgbaImage::new(40, 30).save(root.join("case_photo_1.png")).unwrap();
        image::RgbaImage::new(20, 20).save(root.join("case_photo_3.png")).unwrap();
        let blocks = build_for(&root);
        let images: Vec<_> = blocks
            .iter()
            .filter_map(|b| match b {
                LayoutBlock::Image { image, .. } => Some(image),
                _ => None,
            })
            .collect();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].pixel_width, 40);
        assert_eq!(images[1].pixel_width, 20);
    }

    #[test]
    fn qr_block_is_pinned_with_caption() {
        let root = temp_root("qr");
        image::RgbaImage::new(64, 64).save(root.join("qr.png")).unwrap();
        let blocks = build_for(&root);
        let geo = PageGeometry::a4();
        let pinned = blocks
            .iter()
            .find_map(|b| match b {
                LayoutBlock::Pinned { caption, x, y, .. } => Some((caption, *x, *y)),
                _ => None,
            })
            .expect("pinned QR block");
        assert!(pinned.0.is_some());
        assert!((pinned.1 - (geo.page_width - geo.margin_right - 96.0)).abs() < 0.01);
        assert!(pinned.2 < geo.page_height - geo.margin_bottom);
    }

    #[test]
    fn net_price_line_is_boxed_and_accented() {
        let blocks = build_for(&temp_root("net"));
        let net = blocks
            .iter()
            .find_map(|b| match b {
                LayoutBlock::TextLine { text, color, boxed, .. } if text.starts_with("Net price") => {
                    Some((text.clone(), *color, *boxed))
                }
                _ => None,
            })
            .expect("net price line");
        assert_eq!(net.0, "Net price: 1,300,000 KRW");
        assert_eq!(net.1, Some(ACCENT));
        assert!(net.2);
    }

    #[test]
    fn logo_stays_on_the_first_page_of_a_multi_page_document() {
        let root = temp_root("logo-page");
        image::RgbaImage::new(200, 80).save(root.join("logo.png")).unwrap();
        // Tall evidence images push the flow onto later pages.
        for i in 1..=3 {
            image::RgbaImage::new(600, 900)
                .save(root.join(format!("case_photo_{i}.png")))
                .unwrap();
        }
        let blocks = build_for(&root);
        let font = QuoteFont::load(None, &HashSet::new());
        let cmds = layout::paginate(&blocks, &font, &PageGeometry::a4()).unwrap();

        let last_page = cmds.iter().map(|c| c.page()).max().unwrap();
        assert!(last_page >= 1, "expected the flow to break pages");

        let logo_page = cmds
            .iter()
            .find_map(|c| match c {
                DrawCommand::Image { page, width, .. }
                    if (*width - LOGO_WIDTH).abs() < 0.01 =>
                {
                    Some(*page)
                }
                _ => None,
            })
            .expect("logo draw command");
        assert_eq!(logo_page, 0);
    }

    #[test]
    fn evidence_images_flow_at_intrinsic_point_size() {
        let root = temp_root("intrinsic");
        image::RgbaImage::new(40, 30).save(root.join("case_photo_2.png")).unwrap();
        let blocks = build_for(&root);
        let image = blocks
            .iter()
            .find_map(|b| match b {
                LayoutBlock::Image { image } => Some(image),
                _ => None,
            })
            .expect("evidence image block");
        assert_eq!(image.display_width, 40.0 * PX_TO_PT);
        assert_eq!(image.display_height, 30.0 * PX_TO_PT);
    }

    #[test]
    fn narrative_truncates_daily_cost() {
        // 1,300,000 / (15 * 365) = 237.44…, displayed truncated as 237.
        let blocks = build_for(&temp_root("narrative"));
        let para = blocks
            .iter()
            .find_map(|b| match b {
                LayoutBlock::Paragraph { text, .. } => Some(text.clone()),
                _ => None,
            })
            .unwrap();
        assert!(para.contains("237 KRW"), "{para}");
        assert!(para.contains("15 years"));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(205), "205");
        assert_eq!(group_thousands(1500), "1,500");
        assert_eq!(group_thousands(1_500_000), "1,500,000");
        assert_eq!(group_thousands(-200_000), "-200,000");
    }
}
