use crate::{
    font::Font,
    image::Image,
    info::Info,
    outline::Outline,
    page::Page,
    refs::{ObjectReferences, RefType},
    PDFError, Pt,
};
use id_arena::{Arena, Id};
use pdf_writer::{Finish, Pdf, Ref};
use std::io::Write;

#[derive(Default, Debug)]
/// A document is the main object that stores all the contents of the PDF
/// then renders it out with a call to [Document::write]
pub struct Document {
    pub info: Option<Info>,
    pub pages: Arena<Page>,
    pub page_order: Vec<Id<Page>>,
    pub fonts: Arena<Font>,
    pub images: Arena<Image>,
    pub outline: Outline,
}

impl Document {
    /// Sets information about the document. If not provided, no information block will be
    /// written to the PDF
    pub fn set_info(&mut self, info: Info) {
        self.info = Some(info);
    }

    /// Add a page to the end of the document, returning its id
    pub fn add_page(&mut self, page: Page) -> Id<Page> {
        let id = self.pages.alloc(page);
        self.page_order.push(id);
        id
    }

    /// Number of pages in the document
    pub fn page_count(&self) -> usize {
        self.page_order.len()
    }

    /// The pages in document order
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.page_order.iter().filter_map(|id| self.pages.get(*id))
    }

    pub fn page(&self, id: Id<Page>) -> Option<&Page> {
        self.pages.get(id)
    }

    pub fn page_mut(&mut self, id: Id<Page>) -> Option<&mut Page> {
        self.pages.get_mut(id)
    }

    /// Add a font to the document. Fonts are stored "globally" within the document, so any
    /// page can use it by referring to the returned id.
    pub fn add_font(&mut self, font: Font) -> Id<Font> {
        self.fonts.alloc(font)
    }

    /// Add an image to the document. Like fonts, images are shared by every page and may be
    /// placed any number of times.
    pub fn add_image(&mut self, image: Image) -> Id<Image> {
        self.images.alloc(image)
    }

    /// Add a bookmark to the document outline that scrolls the page at `page_index` so that
    /// the PDF y coordinate `top` sits at the top of the window
    pub fn add_bookmark<S: ToString>(&mut self, title: S, page_index: usize, top: Pt) {
        self.outline
            .add_bookmark(page_index, title.to_string(), top);
    }

    /// Serialize the document into a byte buffer
    pub fn to_bytes(self) -> Result<Vec<u8>, PDFError> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    /// Write the entire document to the writer. The whole document is rendered in memory
    /// first, then handed to `w` in one go.
    ///
    /// Until `write` is called all references are unresolved. Object ids are handed out in a
    /// fixed order (catalog, page tree, info, pages, fonts, images, page contents, outline),
    /// so the same document always serializes to the same bytes.
    pub fn write<W: Write>(self, mut w: W) -> Result<(), PDFError> {
        let Document {
            info,
            pages,
            page_order,
            fonts,
            images,
            outline,
        } = self;

        let mut refs = ObjectReferences::new();

        let catalog_id = refs.gen(RefType::Catalog);
        let page_tree_id = refs.gen(RefType::PageTree);

        let mut writer = Pdf::new();
        if let Some(info) = info {
            info.write(&mut refs, &mut writer);
        }

        // page refs are keyed by position in page_order so bookmarks can address them
        let page_refs: Vec<Ref> = (0..page_order.len())
            .map(|i| refs.gen(RefType::Page(i)))
            .collect();

        writer
            .pages(page_tree_id)
            .count(page_refs.len() as i32)
            .kids(page_refs);

        for (id, font) in fonts.iter() {
            font.write(&mut refs, id, &mut writer);
        }

        for (id, image) in images.iter() {
            image.write(&mut refs, id.index(), &mut writer);
        }

        for (page_index, id) in page_order.iter().enumerate() {
            let page = pages.get(*id).ok_or(PDFError::PageMissing)?;
            page.write(&mut refs, page_index, &fonts, &images, &mut writer)?;
        }

        if outline.entries.iter().any(|e| e.page_index >= page_order.len()) {
            return Err(PDFError::PageMissing);
        }
        if !outline.is_empty() {
            outline.write(&mut refs, &mut writer);
        }

        let mut catalog = writer.catalog(catalog_id);
        catalog.pages(page_tree_id);
        if let Some(outlines_id) = refs.get(RefType::Outlines) {
            catalog.outlines(outlines_id);
        }
        catalog.finish();

        w.write_all(writer.finish().as_slice()).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagesize;

    #[test]
    fn writes_a_pdf_with_every_page() {
        let mut doc = Document::default();
        doc.add_font(Font::helvetica());
        doc.add_page(Page::new(pagesize::A4, None));
        doc.add_page(Page::new(pagesize::A4, None));
        assert_eq!(doc.page_count(), 2);

        let bytes = doc.to_bytes().expect("document writes");
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
        assert!(!text.contains("/Outlines"));
    }

    #[test]
    fn bookmarks_produce_an_outline() {
        let mut doc = Document::default();
        doc.add_page(Page::new(pagesize::A4, None));
        doc.add_bookmark("Record #1", 0, Pt(500.0));

        let bytes = doc.to_bytes().expect("document writes");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Outlines"));
        assert!(text.contains("(Record #1)"));
    }

    #[test]
    fn bookmark_to_missing_page_is_an_error() {
        let mut doc = Document::default();
        doc.add_page(Page::new(pagesize::A4, None));
        doc.add_bookmark("nowhere", 3, Pt(0.0));
        assert!(matches!(doc.to_bytes(), Err(PDFError::PageMissing)));
    }
}
