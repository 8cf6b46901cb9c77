use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDateTime, Timelike};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Error;
use crate::fonts::QuoteFont;
use crate::model::{DrawCommand, EmbeddedImage, ImageFormat, PageGeometry};

const FONT_NAME: &[u8] = b"F1";

/// Turn resolved draw commands into PDF bytes.
///
/// All pages share the same media box. The output is deterministic for a given
/// `(commands, font, generated_at)`: the creation timestamp in the Info
/// dictionary is the only field that varies between otherwise identical
/// renders. Characters the active font cannot represent are substituted and
/// logged; they never fail the render.
pub(crate) fn render(
    commands: &[DrawCommand],
    font: &QuoteFont,
    geo: &PageGeometry,
    generated_at: NaiveDateTime,
) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let font_ref = register_font(&mut pdf, font, &mut alloc);
    let t_font = t0.elapsed();

    // Embed image XObjects. A command whose payload fails to decode is dropped
    // from the draw list (logged), not fatal.
    let mut image_xobjects: Vec<(String, Ref)> = Vec::new();
    let mut image_names: HashMap<usize, String> = HashMap::new();
    for (idx, cmd) in commands.iter().enumerate() {
        if let DrawCommand::Image { image, .. } = cmd
            && let Some(name) = embed_image(image, &mut image_xobjects, &mut pdf, &mut alloc)
        {
            image_names.insert(idx, name);
        }
    }
    let t_images = t0.elapsed();

    let page_count = commands.iter().map(|c| c.page()).max().map_or(1, |p| p + 1);
    let mut contents: Vec<Content> = (0..page_count).map(|_| Content::new()).collect();
    let mut missing: HashSet<char> = HashSet::new();

    for (idx, cmd) in commands.iter().enumerate() {
        match cmd {
            DrawCommand::Text { page, x, y, text, size, color } => {
                let content = &mut contents[*page];
                let bytes = font.encode(text, &mut missing);
                content.begin_text();
                content.set_font(Name(FONT_NAME), *size);
                match color {
                    Some([r, g, b]) => content.set_fill_rgb(
                        *r as f32 / 255.0,
                        *g as f32 / 255.0,
                        *b as f32 / 255.0,
                    ),
                    None => content.set_fill_gray(0.0),
                };
                content.next_line(*x, *y);
                content.show(Str(&bytes));
                content.end_text();
            }

            DrawCommand::Rect { page, x, y, width, height, fill, stroke, stroke_width } => {
                let content = &mut contents[*page];
                content.save_state();
                if let Some([r, g, b]) = fill {
                    content.set_fill_rgb(*r as f32 / 255.0, *g as f32 / 255.0, *b as f32 / 255.0);
                    content.rect(*x, *y, *width, *height);
                    content.fill_nonzero();
                }
                if let Some([r, g, b]) = stroke {
                    content.set_stroke_rgb(*r as f32 / 255.0, *g as f32 / 255.0, *b as f32 / 255.0);
                    content.set_line_width(*stroke_width);
                    content.rect(*x, *y, *width, *height);
                    content.stroke();
                }
                content.restore_state();
            }

            DrawCommand::Image { page, x, y, width, height, .. } => {
                if let Some(name) = image_names.get(&idx) {
                    let content = &mut contents[*page];
                    content.save_state();
                    content.transform([*width, 0.0, 0.0, *height, *x, *y]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                }
            }
        }
    }

    if !missing.is_empty() {
        let mut chars: Vec<char> = missing.into_iter().collect();
        chars.sort_unstable();
        log::warn!(
            "{} character(s) not representable with the active font, substituted: {}",
            chars.len(),
            chars.iter().collect::<String>(),
        );
    }

    let page_ids: Vec<Ref> = (0..page_count).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..page_count).map(|_| alloc()).collect();

    for (i, content) in contents.into_iter().enumerate() {
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_count as i32);

    for i in 0..page_count {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, geo.page_width, geo.page_height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        resources.fonts().pair(Name(FONT_NAME), font_ref);
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    // The single nondeterministic field of the output.
    let info_id = alloc();
    pdf.document_info(info_id)
        .producer(TextStr("quotesmith"))
        .creation_date(to_pdf_date(generated_at));

    let bytes = pdf.finish();
    log::info!(
        "Render phases: font={:.1}ms, images={:.1}ms, assembly={:.1}ms ({} pages, {} bytes)",
        t_font.as_secs_f64() * 1000.0,
        (t_images - t_font).as_secs_f64() * 1000.0,
        (t0.elapsed() - t_images).as_secs_f64() * 1000.0,
        page_count,
        bytes.len(),
    );
    Ok(bytes)
}

fn to_pdf_date(at: NaiveDateTime) -> pdf_writer::Date {
    pdf_writer::Date::new(at.year().clamp(0, u16::MAX as i32) as u16)
        .month(at.month() as u8)
        .day(at.day() as u8)
        .hour(at.hour() as u8)
        .minute(at.minute() as u8)
        .second(at.second() as u8)
}

/// Write the single document font: a subsetted CIDFont (Identity-H) when the
/// custom font loaded, otherwise the built-in WinAnsi Helvetica.
fn register_font(pdf: &mut Pdf, font: &QuoteFont, alloc: &mut impl FnMut() -> Ref) -> Ref {
    let font_ref = alloc();
    let Some(embedded) = font.embedded() else {
        pdf.type1_font(font_ref)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        return font_ref;
    };

    let descriptor_ref = alloc();
    let data_ref = alloc();

    let data_len = embedded.subset_data.len() as i32;
    pdf.stream(data_ref, &embedded.subset_data)
        .pair(Name(b"Length1"), data_len);

    let [x_min, y_min, x_max, y_max] = embedded.bbox;
    pdf.font_descriptor(descriptor_ref)
        .name(Name(embedded.ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(x_min, y_min, x_max, y_max))
        .italic_angle(0.0)
        .ascent(embedded.ascent)
        .descent(embedded.descent)
        .cap_height(embedded.cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = pdf_writer::types::SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    };

    let cid_font_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(embedded.ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !embedded.gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &embedded.gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", embedded.ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        },
    );
    let mut pairs: Vec<(u16, char)> = embedded.char_to_gid.iter().map(|(&ch, &gid)| (gid, ch)).collect();
    pairs.sort_unstable();
    for (gid, ch) in pairs {
        cmap.pair(gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(embedded.ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    font_ref
}

/// Embed one raster image as a PDF XObject. JPEG passes through with
/// DctDecode; PNG is decoded to RGB (plus an SMask when it carries alpha) and
/// deflated. Returns the resource name, or `None` when the payload cannot be
/// decoded.
fn embed_image(
    img: &EmbeddedImage,
    image_xobjects: &mut Vec<(String, Ref)>,
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<String> {
    let xobj_ref = alloc();
    let pdf_name = format!("Im{}", image_xobjects.len() + 1);

    match img.format {
        ImageFormat::Jpeg => {
            let mut xobj = pdf.image_xobject(xobj_ref, &img.data);
            xobj.filter(Filter::DctDecode);
            xobj.width(img.pixel_width as i32);
            xobj.height(img.pixel_height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        ImageFormat::Png => {
            let cursor = std::io::Cursor::new(&img.data);
            let reader = image::ImageReader::with_format(
                std::io::BufReader::new(cursor),
                image::ImageFormat::Png,
            );
            let decoded = match reader.decode() {
                Ok(d) => d,
                Err(err) => {
                    log::warn!("PNG payload failed to decode ({err}), image dropped");
                    return None;
                }
            };
            let rgba: image::RgbaImage = decoded.to_rgba8();
            let (w, h) = (rgba.width(), rgba.height());
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

            let rgb_data: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = if has_alpha {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w as i32);
                mask.height(h as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w as i32);
            xobj.height(h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }

    image_xobjects.push((pdf_name.clone(), xobj_ref));
    Some(pdf_name)
}
