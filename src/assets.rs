use std::path::{Path, PathBuf};

use crate::model::{AssetKind, AssetRef};

/// Resolves the fixed set of logical asset names against an asset directory.
///
/// Probes are stat-level and side-effect-free, and re-run on every render so
/// assets may be added or removed between renders without restarting. A
/// missing, unreadable, or undecodable optional asset is never an error:
/// callers branch on [`AssetRef::present`] and omit the corresponding block.
pub struct AssetResolver {
    root: PathBuf,
}

/// The custom text font. Absence falls back to the built-in Helvetica.
pub const FONT: &str = "font";
/// QR code image, pinned with a caption in the bottom-right corner.
pub const QR: &str = "qr";
/// Clinic logo, pinned in the top-right corner of the first page.
pub const LOGO: &str = "logo";
/// Supporting clinical evidence images, in document order.
pub const EVIDENCE: [&str; 3] = ["evidence-1", "evidence-2", "evidence-3"];

/// Candidate file names for a logical asset, tried in order.
fn candidates(logical: &str) -> &'static [&'static str] {
    match logical {
        FONT => &["NanumGothic.ttf"],
        QR => &["qr.png"],
        LOGO => &["logo.png"],
        "evidence-1" => &["case_photo_1.png", "case_photo_1.jpg"],
        "evidence-2" => &["case_photo_2.png", "case_photo_2.jpg"],
        "evidence-3" => &["case_photo_3.png", "case_photo_3.jpg"],
        _ => &[],
    }
}

fn kind_of(logical: &str) -> AssetKind {
    if logical == FONT {
        AssetKind::Font
    } else {
        AssetKind::Image
    }
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a backing file for `logical` exists right now.
    pub fn exists(&self, logical: &str) -> bool {
        self.resolve(logical).is_some_and(|a| a.present)
    }

    /// Probe a logical name. `None` means the name is unknown or no backing
    /// file exists; image assets whose header cannot be read also count as
    /// absent so a corrupt file degrades to an omitted block, not a failure.
    pub fn resolve(&self, logical: &str) -> Option<AssetRef> {
        let kind = kind_of(logical);
        for name in candidates(logical) {
            let path = self.root.join(name);
            if !path.is_file() {
                continue;
            }
            let pixel_size = match kind {
                AssetKind::Font => None,
                AssetKind::Image => match image::image_dimensions(&path) {
                    Ok(dims) => Some(dims),
                    Err(err) => {
                        log::warn!(
                            "Asset {logical} at {} is unreadable as an image ({err}), treating as absent",
                            path.display()
                        );
                        continue;
                    }
                },
            };
            return Some(AssetRef {
                logical_name: logical.to_string(),
                path,
                present: true,
                kind,
                pixel_size,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("quotesmith-assets-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_assets_resolve_to_none() {
        let resolver = AssetResolver::new(temp_root("empty"));
        assert!(!resolver.exists(QR));
        assert!(!resolver.exists(FONT));
        assert!(resolver.resolve("evidence-1").is_none());
        assert!(resolver.resolve("no-such-name").is_none());
    }

    #[test]
    fn present_image_reports_dimensions() {
        let root = temp_root("qr");
        image::RgbaImage::new(33, 47)
            .save(root.join("qr.png"))
            .unwrap();
        let resolver = AssetResolver::new(&root);
        let qr = resolver.resolve(QR).unwrap();
        assert!(qr.present);
        assert_eq!(qr.kind, AssetKind::Image);
        assert_eq!(qr.pixel_size, Some((33, 47)));
    }

    #[test]
    fn corrupt_image_counts_as_absent() {
        let root = temp_root("corrupt");
        std::fs::write(root.join("logo.png"), b"not a png").unwrap();
        let resolver = AssetResolver::new(&root);
        assert!(!resolver.exists(LOGO));
    }

    #[test]
    fn presence_is_reprobed_per_call() {
        let root = temp_root("reprobe");
        let resolver = AssetResolver::new(&root);
        assert!(!resolver.exists(QR));
        image::RgbaImage::new(8, 8).save(root.join("qr.png")).unwrap();
        assert!(resolver.exists(QR));
    }
}
