use crate::error::Error;
use crate::fonts::QuoteFont;
use crate::model::{ACCENT, BOX_BG, DrawCommand, LayoutBlock, MUTED, PageGeometry};

/// Vertical gap between flowing blocks, in points.
const BLOCK_SPACING: f32 = 8.0;
/// Inner padding of the boxed net price line.
const BOX_PAD: f32 = 10.0;
/// Width of the accent bar on the left edge of a boxed line.
const BAR_WIDTH: f32 = 6.0;
const CAPTION_SIZE: f32 = 8.5;
/// Gap between a pinned image and its caption baseline area.
const CAPTION_GAP: f32 = 4.0;

/// Running position on the current page. `y` grows downward from the page top;
/// draw commands are emitted in PDF space (y up). One cursor per render, owned
/// exclusively here.
struct Cursor {
    page: usize,
    y: f32,
}

/// Walk the block list and resolve every block to absolute draw commands.
///
/// Flowing blocks obey the page-break rule: a block that would cross the
/// bottom margin starts a new page. Pinned blocks are drawn at their fixed
/// coordinates on whatever page the cursor is on, with no break check; this
/// hybrid of flowed and absolute placement is deliberate, so the QR annotation
/// always lands in the same corner regardless of preceding content length.
///
/// Fails only when a single flowing block is taller than the usable page
/// height; the page count itself is unbounded.
pub(crate) fn paginate(
    blocks: &[LayoutBlock],
    font: &QuoteFont,
    geo: &PageGeometry,
) -> Result<Vec<DrawCommand>, Error> {
    let mut commands = Vec::new();
    let mut cursor = Cursor { page: 0, y: geo.margin_top };
    let content_width = geo.content_width();

    for block in blocks {
        match block {
            LayoutBlock::TextLine { text, size, color, boxed } => {
                let line_h = font.line_height(*size);
                let height = if *boxed { line_h + 2.0 * BOX_PAD } else { line_h };
                fit(&mut cursor, height, "text line", geo)?;

                if *boxed {
                    let box_top = cursor.y;
                    commands.push(DrawCommand::Rect {
                        page: cursor.page,
                        x: geo.margin_left,
                        y: geo.page_height - box_top - height,
                        width: content_width,
                        height,
                        fill: Some(BOX_BG),
                        stroke: Some(color.unwrap_or(ACCENT)),
                        stroke_width: 0.75,
                    });
                    commands.push(DrawCommand::Rect {
                        page: cursor.page,
                        x: geo.margin_left,
                        y: geo.page_height - box_top - height,
                        width: BAR_WIDTH,
                        height,
                        fill: Some(color.unwrap_or(ACCENT)),
                        stroke: None,
                        stroke_width: 0.0,
                    });
                    commands.push(DrawCommand::Text {
                        page: cursor.page,
                        x: geo.margin_left + BAR_WIDTH + BOX_PAD,
                        y: geo.page_height - box_top - BOX_PAD - font.ascent(*size),
                        text: text.clone(),
                        size: *size,
                        color: *color,
                    });
                } else {
                    commands.push(DrawCommand::Text {
                        page: cursor.page,
                        x: geo.margin_left,
                        y: geo.page_height - cursor.y - font.ascent(*size),
                        text: text.clone(),
                        size: *size,
                        color: *color,
                    });
                }
                cursor.y += height + BLOCK_SPACING;
            }

            LayoutBlock::Paragraph { text, size } => {
                let lines = wrap(text, font, *size, content_width);
                let line_h = font.line_height(*size);
                let height = lines.len() as f32 * line_h;
                fit(&mut cursor, height, "paragraph", geo)?;

                for (i, line) in lines.into_iter().enumerate() {
                    commands.push(DrawCommand::Text {
                        page: cursor.page,
                        x: geo.margin_left,
                        y: geo.page_height - cursor.y - i as f32 * line_h - font.ascent(*size),
                        text: line,
                        size: *size,
                        color: None,
                    });
                }
                cursor.y += height + BLOCK_SPACING;
            }

            LayoutBlock::Image { image } => {
                let intrinsic_w = image.display_width.max(1.0);
                let width = image.display_width.min(content_width);
                let height = width * image.display_height / intrinsic_w;
                fit(&mut cursor, height, "image", geo)?;

                // Wide images are scaled to the content width and centered.
                let x = if width >= content_width {
                    (geo.page_width - width) / 2.0
                } else {
                    geo.margin_left
                };
                commands.push(DrawCommand::Image {
                    page: cursor.page,
                    x,
                    y: geo.page_height - cursor.y - height,
                    width,
                    height,
                    image: image.clone(),
                });
                cursor.y += height + BLOCK_SPACING;
            }

            LayoutBlock::Pinned { image, caption, x, y } => {
                commands.push(DrawCommand::Image {
                    page: cursor.page,
                    x: *x,
                    y: geo.page_height - y - image.display_height,
                    width: image.display_width,
                    height: image.display_height,
                    image: image.clone(),
                });
                if let Some(caption) = caption {
                    // Center the caption under the image.
                    let caption_w = font.text_width(caption, CAPTION_SIZE);
                    let caption_x = x + (image.display_width - caption_w) / 2.0;
                    commands.push(DrawCommand::Text {
                        page: cursor.page,
                        x: caption_x,
                        y: geo.page_height
                            - y
                            - image.display_height
                            - CAPTION_GAP
                            - font.ascent(CAPTION_SIZE),
                        text: caption.clone(),
                        size: CAPTION_SIZE,
                        color: Some(MUTED),
                    });
                }
            }

            LayoutBlock::PageBreak => {
                cursor.page += 1;
                cursor.y = geo.margin_top;
            }
        }
    }

    Ok(commands)
}

/// Apply the page-break rule for a flowing block of the given height: break to
/// a fresh page when the block would cross the bottom margin, fail when no
/// page could ever hold it.
fn fit(cursor: &mut Cursor, height: f32, block: &'static str, geo: &PageGeometry) -> Result<(), Error> {
    if height > geo.usable_height() {
        return Err(Error::LayoutOverflow { block, height, usable: geo.usable_height() });
    }
    if cursor.y + height > geo.page_height - geo.margin_bottom {
        cursor.page += 1;
        cursor.y = geo.margin_top;
    }
    Ok(())
}

/// Greedy word wrap against the measured text width. A single word wider than
/// the line gets a line of its own and may overhang.
fn wrap(text: &str, font: &QuoteFont, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate_w = font.text_width(&current, size)
            + font.text_width(" ", size)
            + font.text_width(word, size);
        if candidate_w > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
