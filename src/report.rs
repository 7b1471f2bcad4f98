//! Lays a project's records out as a paginated PDF report.
//!
//! The first page starts with a header (logo, title, date and a rule) and a row of
//! statistic badges. Records follow as fixed-height blocks in the order they were given;
//! a block that would cross the bottom margin moves to a fresh page as a whole. Every
//! block advances the cursor by the same stride however much text it holds, so long
//! descriptions can run past the block's border but never move anything else.

use crate::assets::ReportAssets;
use crate::colour::{colours, Colour};
use crate::config::{BoxMm, ConfigError, ReportConfig, TextMm};
use crate::document::Document;
use crate::export::{report_file_name, Report};
use crate::font::Font;
use crate::image::Image;
use crate::info::Info;
use crate::layout::{lines_to_spans, wrap_text};
use crate::model::{Record, Stats};
use crate::page::{ImageLayout, Page, Shape, ShapeLayout, SpanFont, SpanLayout};
use crate::qr::encode_qr;
use crate::units::{Mm, Pt};
use crate::PDFError;
use chrono::{Local, NaiveDate};
use id_arena::Id;
use thiserror::Error;

/// Fatal report generation failures. Problems with individual photos, QR codes or the
/// logo are not errors; they are logged and the affected area stays blank.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pdf(#[from] PDFError),
}

/// Generates reports from a fixed configuration and set of assets.
///
/// Holds no mutable state, so one generator can serve any number of threads at once.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    config: ReportConfig,
    assets: ReportAssets,
}

impl ReportGenerator {
    pub fn new(config: ReportConfig, assets: ReportAssets) -> ReportGenerator {
        ReportGenerator { config, assets }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn assets(&self) -> &ReportAssets {
        &self.assets
    }

    /// Generate a report dated today (local calendar date)
    pub fn generate_report(
        &self,
        project: &str,
        records: &[Record],
        stats: &Stats,
    ) -> Result<Report, ReportError> {
        self.generate_report_on(project, records, stats, Local::now().date_naive())
    }

    /// Generate a report with a pinned date. The output depends on nothing else, so equal
    /// inputs give byte-identical PDFs.
    pub fn generate_report_on(
        &self,
        project: &str,
        records: &[Record],
        stats: &Stats,
        date: NaiveDate,
    ) -> Result<Report, ReportError> {
        let document = self.build_document_on(project, records, stats, date)?;
        let page_count = document.page_count();
        let bytes = document.to_bytes()?;
        log::debug!(
            "generated report for {project:?}: {} records, {page_count} pages, {} bytes",
            records.len(),
            bytes.len()
        );
        Ok(Report {
            bytes,
            page_count,
            file_name: report_file_name(project, date),
        })
    }

    /// Lay the report out without serializing it
    pub fn build_document_on(
        &self,
        project: &str,
        records: &[Record],
        stats: &Stats,
        date: NaiveDate,
    ) -> Result<Document, ReportError> {
        self.config.validate()?;
        if !stats.is_consistent() {
            log::debug!("rendering inconsistent stats as given: {stats:?}");
        }

        let mut layout = ReportLayout::new(&self.config, &self.assets.font, project, date);
        layout.header(project, date, self.assets.logo.as_ref())?;
        layout.badges(stats)?;
        for record in records {
            layout.record(record)?;
        }
        Ok(layout.finish())
    }
}

/// Label, value and fill of each badge, left to right
fn badge_entries(stats: &Stats) -> [(&'static str, u32, Colour); 5] {
    [
        ("Open", stats.open, colours::BLUE),
        ("Faulty", stats.faulty, colours::RED),
        ("Closed", stats.closed, colours::GREY),
        ("Completed", stats.completed, colours::GREEN),
        ("Total", stats.total, colours::PURPLE),
    ]
}

/// State of one generation call: the document being built, the page being written and the
/// cursor on it (millimetres from the top of the page)
struct ReportLayout<'a> {
    config: &'a ReportConfig,
    font: &'a Font,
    font_id: Id<Font>,
    document: Document,
    page: Id<Page>,
    cursor: Mm,
}

impl<'a> ReportLayout<'a> {
    fn new(config: &'a ReportConfig, font: &'a Font, project: &str, date: NaiveDate) -> Self {
        let mut document = Document::default();
        let mut info = Info::new();
        info.title(format!("{project} - Project Report"))
            .subject("Project progress report")
            .created(date);
        document.set_info(info);

        let font_id = document.add_font(font.clone());
        let page = document.add_page(Page::new(config.page_size(), Some(config.margins.into())));

        ReportLayout {
            config,
            font,
            font_id,
            document,
            page,
            cursor: config.first_block_top(),
        }
    }

    fn finish(self) -> Document {
        self.document
    }

    fn page(&mut self) -> Result<&mut Page, PDFError> {
        self.document.page_mut(self.page).ok_or(PDFError::PageMissing)
    }

    fn new_page(&mut self) {
        let page = Page::new(self.config.page_size(), Some(self.config.margins.into()));
        self.page = self.document.add_page(page);
        self.cursor = self.config.margins.top;
    }

    /// A single line of text with its baseline `top` millimetres below the page's top edge
    fn text(&mut self, text: &str, left: Mm, top: Mm, size: Pt, colour: Colour) -> Result<(), PDFError> {
        let text = self.font.prepare(text);
        let font = SpanFont {
            id: self.font_id,
            size,
        };
        let page = self.page()?;
        let coords = (Pt::from(left), page.from_top(top.into()));
        page.add_span(SpanLayout {
            text,
            font,
            colour,
            coords,
        });
        Ok(())
    }

    fn shape(&mut self, shape: ShapeLayout) -> Result<(), PDFError> {
        self.page()?.add_shape(shape);
        Ok(())
    }

    /// Place an image in a box given relative to `(left, top)`; `fit` keeps the image's
    /// aspect ratio, otherwise it fills the box
    fn image(&mut self, image: Image, area: BoxMm, left: Mm, top: Mm, fit: bool) -> Result<(), PDFError> {
        let (width, height) = (image.width as f32, image.height as f32);
        let image_id = self.document.add_image(image);
        let page = self.page()?;
        let mut position = page.rect_from_top(
            Pt::from(left + area.x),
            Pt::from(top + area.y),
            area.width.into(),
            area.height.into(),
        );
        if fit {
            position = position.fit_centred(width, height);
        }
        page.add_image(ImageLayout { image_id, position });
        Ok(())
    }

    fn header(&mut self, project: &str, date: NaiveDate, logo: Option<&Image>) -> Result<(), PDFError> {
        let config = self.config;
        let header = &config.header;

        match logo {
            Some(logo) => self.image(logo.clone(), header.logo, Mm(0.0), Mm(0.0), false)?,
            None => log::debug!("no logo available, header drawn without one"),
        }

        let TextMm { x, y, size } = header.title;
        self.text(&format!("{project} - Project Report"), x, y, size, colours::BLACK)?;
        let TextMm { x, y, size } = header.date;
        let date = format!("Report Date: {}", date.format("%d.%m.%Y"));
        self.text(&date, x, y, size, colours::BLACK)?;

        let page = self.page()?;
        let y = page.from_top(header.rule_y.into());
        self.shape(ShapeLayout {
            shape: Shape::Line {
                from: (header.rule_from.into(), y),
                to: (header.rule_to.into(), y),
            },
            fill: None,
            stroke: Some((colours::RULE, header.rule_width.into())),
        })
    }

    fn badges(&mut self, stats: &Stats) -> Result<(), PDFError> {
        let config = self.config;
        let badges = &config.badges;
        let left = config.margins.left;

        for (i, (label, value, colour)) in badge_entries(stats).into_iter().enumerate() {
            let x = left + (badges.width + badges.gap) * i as f32;
            let rect = self.page()?.rect_from_top(
                x.into(),
                badges.top.into(),
                badges.width.into(),
                badges.height.into(),
            );
            self.shape(ShapeLayout {
                shape: Shape::RoundedRect {
                    rect,
                    radius: badges.radius.into(),
                },
                fill: Some(colour),
                stroke: None,
            })?;

            let TextMm { x: dx, y: dy, size } = badges.label;
            self.text(label, x + dx, badges.top + dy, size, colours::WHITE)?;
            let TextMm { x: dx, y: dy, size } = badges.value;
            self.text(&value.to_string(), x + dx, badges.top + dy, size, colours::WHITE)?;
        }
        Ok(())
    }

    fn record(&mut self, record: &Record) -> Result<(), PDFError> {
        let config = self.config;
        let block = &config.block;

        if self.cursor.0 + block.height.0 > self.config.block_limit().0 {
            log::trace!(
                "record #{} does not fit below {} mm, starting page {}",
                record.id,
                self.cursor.0,
                self.document.page_count() + 1
            );
            self.new_page();
        }

        let left = self.config.margins.left;
        let top = self.cursor;
        let width = self.config.block_width();

        let page = self.page()?;
        let border = page.rect_from_top(left.into(), top.into(), width.into(), block.height.into());
        let bookmark_top = page.from_top(top.into());
        self.shape(ShapeLayout {
            shape: Shape::RoundedRect {
                rect: border,
                radius: block.radius.into(),
            },
            fill: None,
            stroke: Some((colours::BORDER, block.border_width.into())),
        })?;

        let title = if block.title_with_location {
            format!("Record #{} - {}", record.id, record.location)
        } else {
            format!("Record #{}", record.id)
        };
        self.text(&title, left + block.title.x, top + block.title.y, block.title.size, colours::BLACK)?;

        let mut fields = vec![
            format!("Location: {}", record.location),
            format!("Assignee: {}", record.assignee),
            format!("Status: {}", record.status),
            format!("Date: {}", record.date_label()),
        ];
        if let Some(payload) = record.qr_payload.as_deref().filter(|p| !p.is_empty()) {
            fields.push(format!("QR Code: {payload}"));
        }

        let text_x = left + block.fields.x;
        let size = block.fields.size;
        let mut text_y = top + block.fields.y;
        for field in &fields {
            self.text(field, text_x, text_y, size, colours::BLACK)?;
            text_y += block.field_line_height;
        }

        let paragraphs = [
            ("Description:", record.description.as_deref()),
            ("Comment:", record.comment.as_deref()),
        ];
        for (label, body) in paragraphs {
            let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
                continue;
            };
            self.text(label, text_x, text_y, size, colours::BLACK)?;

            let lines = wrap_text(&self.font.prepare(body), self.font, size, block.wrap_width.into());
            let start = text_y + block.wrap_line_height;
            let font = SpanFont {
                id: self.font_id,
                size,
            };
            let page = self.page()?;
            let spans = lines_to_spans(
                &lines,
                font,
                colours::BLACK,
                (
                    Pt::from(text_x + block.wrap_indent),
                    page.from_top(start.into()),
                ),
                block.wrap_line_height.into(),
            );
            page.add_spans(spans);
            text_y += block.wrap_line_height * lines.len() as f32 + block.paragraph_spacing;
        }
        if text_y > top + block.height {
            log::debug!("record #{} text runs past its block", record.id);
        }

        // photo and QR are anchored to the block top, independent of the text above
        if let Some(bytes) = &record.photo {
            match Image::from_bytes(bytes) {
                Ok(photo) => self.image(photo, block.photo, left, top, true)?,
                Err(e) => log::warn!("record #{}: photo could not be embedded: {e}", record.id),
            }
        } else if record.photo_url.is_some() {
            log::debug!("record #{} has a photo URL but no photo bytes", record.id);
        }

        if let Some(payload) = record.qr_payload.as_deref().filter(|p| !p.is_empty()) {
            match encode_qr(payload) {
                Ok(symbol) => self.image(symbol, block.qr, left, top, true)?,
                Err(e) => log::warn!("record #{}: QR code could not be generated: {e}", record.id),
            }
        }

        let page_index = self.document.page_count() - 1;
        self.document
            .add_bookmark(format!("Record #{}", record.id), page_index, bookmark_top);

        self.cursor += block.stride();
        Ok(())
    }
}
