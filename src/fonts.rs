use std::collections::{HashMap, HashSet};

use memmap2::Mmap;
use ttf_parser::Face;

use crate::model::{AssetRef, LayoutBlock};

/// Metrics and glyph data for the single text font of a quote document.
///
/// Loaded once per render from the `font` asset. When the asset is absent or
/// unparseable the built-in WinAnsi Helvetica takes over; glyphs outside its
/// coverage (Hangul, emoji) render as missing-glyph substitutes, which is a
/// documented degradation, not an error.
pub(crate) struct QuoteFont {
    backing: Backing,
    line_h_ratio: f32,
    ascender_ratio: f32,
}

enum Backing {
    Embedded(EmbeddedFont),
    Helvetica { widths_1000: Vec<f32> },
}

/// A subsetted TrueType font ready for CIDFont (Identity-H) embedding.
pub(crate) struct EmbeddedFont {
    pub(crate) ps_name: String,
    pub(crate) subset_data: Vec<u8>,
    pub(crate) char_to_gid: HashMap<char, u16>,
    char_widths_1000: HashMap<char, f32>,
    /// (remapped gid, width in 1000-units), sorted by gid.
    pub(crate) gid_widths: Vec<(u16, f32)>,
    pub(crate) ascent: f32,
    pub(crate) descent: f32,
    pub(crate) cap_height: f32,
    pub(crate) bbox: [f32; 4],
}

impl QuoteFont {
    /// Load the custom font asset, subsetted to `used` characters, or fall
    /// back to Helvetica. Never fails: every degradation is logged and the
    /// render continues.
    pub(crate) fn load(asset: Option<&AssetRef>, used: &HashSet<char>) -> QuoteFont {
        if let Some(asset) = asset
            && asset.present
            && let Some(font) = load_embedded(asset, used)
        {
            return font;
        }
        if asset.is_none() {
            log::warn!("Font asset not found, falling back to built-in Helvetica");
        }
        QuoteFont {
            backing: Backing::Helvetica {
                widths_1000: helvetica_widths(),
            },
            line_h_ratio: 1.2,
            ascender_ratio: 0.75,
        }
    }

    pub(crate) fn embedded(&self) -> Option<&EmbeddedFont> {
        match &self.backing {
            Backing::Embedded(f) => Some(f),
            Backing::Helvetica { .. } => None,
        }
    }

    pub(crate) fn line_height(&self, size: f32) -> f32 {
        size * self.line_h_ratio
    }

    pub(crate) fn ascent(&self, size: f32) -> f32 {
        size * self.ascender_ratio
    }

    fn char_width_1000(&self, ch: char) -> f32 {
        match &self.backing {
            Backing::Embedded(f) => f.char_widths_1000.get(&ch).copied().unwrap_or(0.0),
            Backing::Helvetica { widths_1000 } => {
                let byte = char_to_winansi(ch);
                if byte >= 32 {
                    widths_1000[(byte - 32) as usize]
                } else {
                    0.0
                }
            }
        }
    }

    pub(crate) fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * size / 1000.0)
            .sum()
    }

    /// Encode `text` for a PDF content stream: 2-byte glyph IDs for the
    /// embedded CIDFont, WinAnsi bytes for Helvetica. Characters the active
    /// font cannot represent are substituted (glyph 0 / dropped byte) and
    /// recorded in `missing` so the renderer can log them once per render.
    pub(crate) fn encode(&self, text: &str, missing: &mut HashSet<char>) -> Vec<u8> {
        match &self.backing {
            Backing::Embedded(f) => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for ch in text.chars() {
                    let gid = match f.char_to_gid.get(&ch) {
                        Some(&gid) => gid,
                        None => {
                            missing.insert(ch);
                            0
                        }
                    };
                    out.push((gid >> 8) as u8);
                    out.push((gid & 0xFF) as u8);
                }
                out
            }
            Backing::Helvetica { .. } => {
                let mut out = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    let byte = char_to_winansi(ch);
                    if byte >= 32 {
                        out.push(byte);
                    } else {
                        missing.insert(ch);
                    }
                }
                out
            }
        }
    }
}

/// Collect every character the document will draw, so the embedded font can be
/// subsetted and measured before layout. Space is always included.
pub(crate) fn used_chars(blocks: &[LayoutBlock]) -> HashSet<char> {
    let mut chars = HashSet::new();
    for block in blocks {
        match block {
            LayoutBlock::TextLine { text, .. } | LayoutBlock::Paragraph { text, .. } => {
                chars.extend(text.chars());
            }
            LayoutBlock::Pinned { caption, .. } => {
                if let Some(caption) = caption {
                    chars.extend(caption.chars());
                }
            }
            LayoutBlock::Image { .. } | LayoutBlock::PageBreak => {}
        }
    }
    chars.insert(' ');
    chars
}

fn load_embedded(asset: &AssetRef, used: &HashSet<char>) -> Option<QuoteFont> {
    let file = match std::fs::File::open(&asset.path) {
        Ok(f) => f,
        Err(err) => {
            log::warn!(
                "Cannot open font {} ({err}), falling back to Helvetica",
                asset.path.display()
            );
            return None;
        }
    };
    let data = match unsafe { Mmap::map(&file) } {
        Ok(m) => m,
        Err(err) => {
            log::warn!(
                "Cannot map font {} ({err}), falling back to Helvetica",
                asset.path.display()
            );
            return None;
        }
    };
    let face = match Face::parse(&data, 0) {
        Ok(f) => f,
        Err(err) => {
            log::warn!(
                "Cannot parse font {} ({err}), falling back to Helvetica",
                asset.path.display()
            );
            return None;
        }
    };

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);
    let bb = face.global_bounding_box();
    let bbox = [
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    ];

    // Deterministic glyph order: the remapper assigns ids in visit order, and
    // those ids end up in the output bytes.
    let mut used_sorted: Vec<char> = used.iter().copied().collect();
    used_sorted.sort_unstable();

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut char_widths_1000 = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    for ch in used_sorted {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            let w = face
                .glyph_hor_advance(gid)
                .map(|adv| adv as f32 / units * 1000.0)
                .unwrap_or(0.0);
            char_to_gid.insert(ch, new_gid);
            char_widths_1000.insert(ch, w);
            gid_widths.push((new_gid, w));
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);

    let subset_data = subsetter::subset(&data, 0, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {} ({e}), embedding full font", asset.path.display());
        data.to_vec()
    });

    let ps_name = font_family_name(&face)
        .unwrap_or_else(|| "QuoteFont".to_string())
        .replace(' ', "");

    let line_gap = face.line_gap() as f32;
    let line_h_ratio = (face.ascender() as f32 - face.descender() as f32 + line_gap) / units;
    let ascender_ratio = face.ascender() as f32 / units;

    Some(QuoteFont {
        backing: Backing::Embedded(EmbeddedFont {
            ps_name,
            subset_data,
            char_to_gid,
            char_widths_1000,
            gid_widths,
            ascent,
            descent,
            cap_height,
            bbox,
        }),
        line_h_ratio,
        ascender_ratio,
    })
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

/// Map a single Unicode char to its WinAnsi (Windows-1252) byte, or 0 if
/// unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95, // bullet
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths() -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,                          // space
            33..=47 => 333.0,                     // punctuation
            48..=57 => 556.0,                     // digits
            58..=64 => 333.0,                     // more punctuation
            73 | 74 => 278.0,                     // I J (narrow uppercase)
            77 => 833.0,                          // M (wide)
            65..=90 => 667.0,                     // uppercase A-Z (average)
            91..=96 => 333.0,                     // brackets etc.
            102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
            109 | 119 => 833.0,                   // m w (wide)
            97..=122 => 556.0,                    // lowercase a-z (average)
            _ => 556.0,
        })
        .collect()
}
