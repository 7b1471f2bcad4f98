//! Report layout and asset configuration, stored as JSON.
//!
//! Every distance is in millimetres measured from the top-left corner of the page (or of
//! the element it belongs to); font sizes are in points. The defaults reproduce the
//! landscape A4 report the field teams are used to.

use crate::layout::MarginsMm;
use crate::pagesize::{Orientation, PageSize, Paper};
use crate::units::{Mm, Pt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A box relative to its parent's top-left corner
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxMm {
    pub x: Mm,
    pub y: Mm,
    pub width: Mm,
    pub height: Mm,
}

impl BoxMm {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> BoxMm {
        BoxMm {
            x: Mm(x),
            y: Mm(y),
            width: Mm(width),
            height: Mm(height),
        }
    }

    fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.0.is_finite())
            && self.width.0 > 0.0
            && self.height.0 > 0.0
    }
}

/// A text baseline position relative to its parent, and the size to set it in
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMm {
    pub x: Mm,
    pub y: Mm,
    pub size: Pt,
}

impl TextMm {
    pub const fn new(x: f32, y: f32, size: f32) -> TextMm {
        TextMm {
            x: Mm(x),
            y: Mm(y),
            size: Pt(size),
        }
    }

    fn is_valid(&self) -> bool {
        self.x.0.is_finite() && self.y.0.is_finite() && self.size.0.is_finite() && self.size.0 > 0.0
    }
}

/// Logo, title, date and the rule underneath them; drawn on the first page only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub logo: BoxMm,
    pub title: TextMm,
    pub date: TextMm,
    pub rule_y: Mm,
    pub rule_from: Mm,
    pub rule_to: Mm,
    pub rule_width: Mm,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        HeaderConfig {
            logo: BoxMm::new(10.0, 8.0, 40.0, 18.0),
            title: TextMm::new(60.0, 20.0, 20.0),
            date: TextMm::new(60.0, 28.0, 12.0),
            rule_y: Mm(32.0),
            rule_from: Mm(10.0),
            rule_to: Mm(285.0),
            rule_width: Mm(0.2),
        }
    }
}

/// The row of statistic badges below the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeConfig {
    pub top: Mm,
    pub width: Mm,
    pub height: Mm,
    pub gap: Mm,
    pub radius: Mm,
    /// Label position inside a badge
    pub label: TextMm,
    /// Value position inside a badge
    pub value: TextMm,
    /// Space between the badges and the first record block
    pub spacing_after: Mm,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        BadgeConfig {
            top: Mm(38.0),
            width: Mm(50.0),
            height: Mm(18.0),
            gap: Mm(10.0),
            radius: Mm(3.0),
            label: TextMm::new(5.0, 7.0, 11.0),
            value: TextMm::new(5.0, 15.0, 14.0),
            spacing_after: Mm(12.0),
        }
    }
}

/// One record block. Positions inside the block are relative to its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Block width; `None` spans the whole content width
    pub width: Option<Mm>,
    pub height: Mm,
    /// Vertical space between two blocks
    pub gap: Mm,
    pub radius: Mm,
    pub border_width: Mm,
    pub title: TextMm,
    /// Append the location to the block title
    pub title_with_location: bool,
    /// Baseline of the first key/value line
    pub fields: TextMm,
    pub field_line_height: Mm,
    /// Width that descriptions and comments are wrapped to
    pub wrap_width: Mm,
    /// Indent of wrapped text relative to its label
    pub wrap_indent: Mm,
    pub wrap_line_height: Mm,
    /// Space after a wrapped paragraph
    pub paragraph_spacing: Mm,
    pub photo: BoxMm,
    pub qr: BoxMm,
}

impl Default for BlockConfig {
    fn default() -> Self {
        BlockConfig {
            width: Some(Mm(270.0)),
            height: Mm(60.0),
            gap: Mm(10.0),
            radius: Mm(2.0),
            border_width: Mm(0.4),
            title: TextMm::new(5.0, 8.0, 13.0),
            title_with_location: false,
            fields: TextMm::new(5.0, 16.0, 10.0),
            field_line_height: Mm(6.0),
            wrap_width: Mm(110.0),
            wrap_indent: Mm(10.0),
            wrap_line_height: Mm(5.0),
            paragraph_spacing: Mm(5.0),
            photo: BoxMm::new(140.0, 10.0, 60.0, 45.0),
            qr: BoxMm::new(210.0, 10.0, 40.0, 40.0),
        }
    }
}

impl BlockConfig {
    /// Distance from one block's top to the next one's
    pub fn stride(&self) -> Mm {
        self.height + self.gap
    }
}

fn default_margins() -> MarginsMm {
    MarginsMm {
        top: Mm(20.0),
        right: Mm(10.0),
        bottom: Mm(10.0),
        left: Mm(10.0),
    }
}

fn default_bucket() -> String {
    "punch-reports".to_string()
}

/// Everything that shapes a generated report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub paper: Paper,
    #[serde(default)]
    pub orientation: Orientation,
    /// The top margin is where the cursor restarts on every page after the first
    #[serde(default = "default_margins")]
    pub margins: MarginsMm,
    #[serde(default)]
    pub header: HeaderConfig,
    #[serde(default)]
    pub badges: BadgeConfig,
    #[serde(default)]
    pub block: BlockConfig,
    /// Logo drawn in the header; relative paths resolve against the working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<PathBuf>,
    /// TrueType / OpenType font to embed; Helvetica is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Object store bucket that published reports go to
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            paper: Paper::default(),
            orientation: Orientation::default(),
            margins: default_margins(),
            header: HeaderConfig::default(),
            badges: BadgeConfig::default(),
            block: BlockConfig::default(),
            logo_path: None,
            font_path: None,
            bucket: default_bucket(),
        }
    }
}

impl ReportConfig {
    /// Load the configuration from a JSON file, or return defaults if the file doesn't exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no report configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: ReportConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn page_size(&self) -> PageSize {
        self.paper.size(self.orientation)
    }

    /// Where the first record block starts on page one
    pub fn first_block_top(&self) -> Mm {
        self.badges.top + self.badges.height + self.badges.spacing_after
    }

    /// The lowest point a block may reach, measured from the top of the page
    pub fn block_limit(&self) -> Mm {
        let (_, height) = self.page_size();
        Mm::from(height) - self.margins.bottom
    }

    pub fn block_width(&self) -> Mm {
        self.block.width.unwrap_or_else(|| {
            let (width, _) = self.page_size();
            Mm::from(width) - self.margins.left - self.margins.right
        })
    }

    /// How many blocks fit on a page whose cursor starts at `top`
    pub fn blocks_fitting_from(&self, top: Mm) -> usize {
        let mut cursor = top;
        let mut count = 0;
        while cursor.0 + self.block.height.0 <= self.block_limit().0 {
            count += 1;
            cursor += self.block.stride();
        }
        count
    }

    /// Check that the geometry describes a report that can actually be laid out
    pub fn validate(&self) -> Result<(), ConfigError> {
        let margins = [
            self.margins.top,
            self.margins.right,
            self.margins.bottom,
            self.margins.left,
        ];
        if margins.iter().any(|m| !m.0.is_finite() || m.0 < 0.0) {
            return Err(ConfigError::Invalid(
                "margins must be finite and non-negative".to_string(),
            ));
        }

        let block = &self.block;
        let lengths = [
            block.height,
            block.gap,
            block.radius,
            block.border_width,
            block.field_line_height,
            block.wrap_width,
            block.wrap_indent,
            block.wrap_line_height,
            block.paragraph_spacing,
            self.badges.width,
            self.badges.height,
            self.badges.gap,
            self.badges.radius,
            self.badges.spacing_after,
            self.header.rule_width,
        ];
        if lengths.iter().any(|m| !m.0.is_finite() || m.0 < 0.0) {
            return Err(ConfigError::Invalid(
                "lengths must be finite and non-negative".to_string(),
            ));
        }
        if block.height.0 <= 0.0 || block.wrap_width.0 <= 0.0 {
            return Err(ConfigError::Invalid(
                "record blocks need a positive height and wrap width".to_string(),
            ));
        }
        if !self.block_width().0.is_finite() || self.block_width().0 <= 0.0 {
            return Err(ConfigError::Invalid("record blocks need a positive width".to_string()));
        }

        let boxes = [self.header.logo, block.photo, block.qr];
        let texts = [
            self.header.title,
            self.header.date,
            self.badges.label,
            self.badges.value,
            block.title,
            block.fields,
        ];
        if !boxes.iter().all(BoxMm::is_valid) || !texts.iter().all(TextMm::is_valid) {
            return Err(ConfigError::Invalid(
                "boxes and text positions must be finite with positive sizes".to_string(),
            ));
        }
        if !self.badges.top.0.is_finite()
            || !self.header.rule_y.0.is_finite()
            || !self.header.rule_from.0.is_finite()
            || !self.header.rule_to.0.is_finite()
        {
            return Err(ConfigError::Invalid("header positions must be finite".to_string()));
        }

        if self.blocks_fitting_from(self.margins.top) == 0 {
            return Err(ConfigError::Invalid(format!(
                "a {} mm record block does not fit between the margins of a {} mm page",
                block.height.0,
                Mm::from(self.page_size().1).0
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_landscape_a4() {
        let config = ReportConfig::default();
        let (width, height) = config.page_size();
        assert!((Mm::from(width).0 - 297.0).abs() < 1e-3);
        assert!((Mm::from(height).0 - 210.0).abs() < 1e-3);
        assert_eq!(config.first_block_top(), Mm(68.0));
        assert_eq!(config.block.stride(), Mm(70.0));
        config.validate().unwrap();
    }

    #[test]
    fn two_blocks_fit_on_every_default_page() {
        let config = ReportConfig::default();
        assert_eq!(config.blocks_fitting_from(config.first_block_top()), 2);
        assert_eq!(config.blocks_fitting_from(config.margins.top), 2);
    }

    #[test]
    fn oversized_blocks_are_rejected() {
        let mut config = ReportConfig::default();
        config.block.height = Mm(500.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ReportConfig::default();
        config.block.gap = Mm(f32::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig::load(dir.path().join("report.json")).unwrap();
        assert_eq!(config, ReportConfig::default());
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        fs::write(
            &path,
            r#"{ "paper": "letter", "orientation": "portrait", "block": { "height": 50.0 } }"#,
        )
        .unwrap();

        let config = ReportConfig::load(&path).unwrap();
        assert_eq!(config.paper, Paper::Letter);
        assert_eq!(config.block.height, Mm(50.0));
        assert_eq!(config.block.gap, Mm(10.0));
        assert_eq!(config.bucket, "punch-reports");
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut config = ReportConfig::default();
        config.block.title_with_location = true;
        config.save(&path).unwrap();
        assert_eq!(ReportConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ReportConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
