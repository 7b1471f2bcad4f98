use pdf_writer::{Finish, Pdf, TextStr};

use crate::refs::{ObjectReferences, RefType};
use crate::units::Pt;

/// The document outline (bookmarks panel): a flat list of entries, each jumping to a
/// position on a page
#[derive(Default, Debug)]
pub struct Outline {
    pub entries: Vec<OutlineEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    /// Index of the target page within the document's page order
    pub page_index: usize,
    pub title: String,
    /// PDF y coordinate that the viewer scrolls to the top of the window
    pub top: Pt,
}

impl Outline {
    pub fn add_bookmark(&mut self, page_index: usize, title: String, top: Pt) {
        self.entries.push(OutlineEntry {
            page_index,
            title,
            top,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the outline root and its entries. Page objects are referenced by index, so
    /// every target page must already have its id allocated in `refs`.
    pub(crate) fn write(&self, refs: &mut ObjectReferences, writer: &mut Pdf) {
        let outlines_id = refs.gen(RefType::Outlines);
        let entry_ids: Vec<_> = (0..self.entries.len())
            .map(|i| refs.gen(RefType::OutlineEntry(i)))
            .collect();

        let mut outline = writer.outline(outlines_id);
        if let (Some(first), Some(last)) = (entry_ids.first(), entry_ids.last()) {
            outline.first(*first);
            outline.last(*last);
            outline.count(entry_ids.len() as i32);
        }
        outline.finish();

        for (i, entry) in self.entries.iter().enumerate() {
            let mut item = writer.outline_item(entry_ids[i]);
            item.parent(outlines_id);
            item.title(TextStr(entry.title.as_str()));
            if i > 0 {
                item.prev(entry_ids[i - 1]);
            }
            if let Some(next) = entry_ids.get(i + 1) {
                item.next(*next);
            }
            let page = refs.gen(RefType::Page(entry.page_index));
            item.dest().page(page).xyz(0.0, entry.top.0, None);
        }
    }
}
