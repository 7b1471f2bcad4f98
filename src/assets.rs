use crate::config::ReportConfig;
use crate::font::Font;
use crate::image::Image;
use std::path::Path;

/// Read-only resources shared by every report: the header logo and the text font.
///
/// Loaded once at start-up. Nothing here is fatal; a logo that can't be read leaves the
/// header without one, and a font that can't be read falls back to Helvetica.
#[derive(Debug, Clone, Default)]
pub struct ReportAssets {
    pub logo: Option<Image>,
    pub font: Font,
}

impl ReportAssets {
    pub fn new(logo: Option<Image>, font: Font) -> ReportAssets {
        ReportAssets { logo, font }
    }

    pub fn load(config: &ReportConfig) -> ReportAssets {
        let logo = config.logo_path.as_deref().and_then(load_logo);
        let font = config
            .font_path
            .as_deref()
            .map(load_font)
            .unwrap_or_default();
        ReportAssets { logo, font }
    }
}

fn load_logo(path: &Path) -> Option<Image> {
    match Image::from_file(path) {
        Ok(logo) => {
            log::debug!("loaded {}x{} logo from {}", logo.width, logo.height, path.display());
            Some(logo)
        }
        Err(e) => {
            log::warn!("logo {} unavailable, reports will omit it: {e}", path.display());
            None
        }
    }
}

fn load_font(path: &Path) -> Font {
    let font = std::fs::read(path)
        .map_err(crate::PDFError::from)
        .and_then(Font::load);
    match font {
        Ok(font) => {
            log::debug!("loaded font {:?} from {}", font.name(), path.display());
            font
        }
        Err(e) => {
            log::warn!("font {} unavailable, falling back to Helvetica: {e}", path.display());
            Font::helvetica()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    #[test]
    fn nothing_configured_means_helvetica_and_no_logo() {
        let assets = ReportAssets::load(&ReportConfig::default());
        assert!(assets.logo.is_none());
        assert!(!assets.font.is_embedded());
    }

    #[test]
    fn broken_assets_degrade() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.bin");
        std::fs::write(&bogus, b"definitely not a png or a font").unwrap();

        let config = ReportConfig {
            logo_path: Some(bogus.clone()),
            font_path: Some(dir.path().join("missing.ttf")),
            ..ReportConfig::default()
        };
        let assets = ReportAssets::load(&config);
        assert!(assets.logo.is_none());
        assert_eq!(assets.font.name(), "Helvetica");

        let config = ReportConfig {
            font_path: Some(bogus),
            ..ReportConfig::default()
        };
        assert!(!ReportAssets::load(&config).font.is_embedded());
    }

    #[test]
    fn logos_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(40, 18))
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .unwrap();
        std::fs::write(&path, png).unwrap();

        let config = ReportConfig {
            logo_path: Some(path),
            ..ReportConfig::default()
        };
        let logo = ReportAssets::load(&config).logo.unwrap();
        assert_eq!((logo.width, logo.height), (40, 18));
    }
}
