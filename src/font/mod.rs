use crate::{
    refs::{ObjectReferences, RefType},
    PDFError, Pt,
};
use id_arena::Id;
use owned_ttf_parser::{AsFaceRef, GlyphId, OwnedFace};
use pdf_writer::{
    types::{FontFlags, SystemInfo},
    Finish, Name, Pdf, Ref, Str,
};
use std::collections::HashMap;
use std::sync::Arc;

mod helvetica;

/// A font that text spans can be set in.
///
/// Two kinds exist: the standard PDF Helvetica, which every viewer ships and which is
/// therefore never embedded (but is limited to the WinAnsi code page), and TrueType /
/// OpenType faces loaded from disk, which are embedded in their entirety as a CID font
/// so any glyph they contain can be shown.
///
/// Fonts are cheap to clone; an embedded face is shared between clones.
#[derive(Clone)]
pub struct Font {
    kind: FontKind,
}

#[derive(Clone)]
enum FontKind {
    Helvetica,
    TrueType(Arc<OwnedFace>),
}

impl Default for Font {
    fn default() -> Self {
        Font::helvetica()
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font").field("name", &self.name()).finish()
    }
}

impl Font {
    /// The standard Helvetica face
    pub fn helvetica() -> Font {
        Font {
            kind: FontKind::Helvetica,
        }
    }

    /// Load a font from raw bytes, parsing the font and returning an error if the font
    /// could not be parsed
    pub fn load(bytes: Vec<u8>) -> Result<Font, PDFError> {
        let face = OwnedFace::from_vec(bytes, 0)?;
        Ok(Font {
            kind: FontKind::TrueType(Arc::new(face)),
        })
    }

    /// Whether the font program is written into the PDF
    pub fn is_embedded(&self) -> bool {
        matches!(self.kind, FontKind::TrueType(_))
    }

    /// Obtain the full name of the font
    pub fn name(&self) -> String {
        match &self.kind {
            FontKind::Helvetica => "Helvetica".to_string(),
            FontKind::TrueType(face) => face_name(face, owned_ttf_parser::name_id::FULL_NAME)
                .unwrap_or_else(|| "Embedded".to_string()),
        }
    }

    fn family(&self) -> String {
        match &self.kind {
            FontKind::Helvetica => "Helvetica".to_string(),
            FontKind::TrueType(face) => face_name(face, owned_ttf_parser::name_id::FAMILY)
                .unwrap_or_else(|| self.name()),
        }
    }

    /// (units per em, ascender, descender, line gap) in font units
    fn metrics(&self) -> (f32, f32, f32, f32) {
        match &self.kind {
            FontKind::Helvetica => (
                helvetica::UNITS_PER_EM,
                helvetica::ASCENDER,
                helvetica::DESCENDER,
                helvetica::LINE_GAP,
            ),
            FontKind::TrueType(face) => {
                let face = face.as_face_ref();
                (
                    face.units_per_em() as f32,
                    face.ascender() as f32,
                    face.descender() as f32,
                    face.line_gap() as f32,
                )
            }
        }
    }

    /// Calculate the ascent (distance from the baseline to the top of the font) for the given font size
    pub fn ascent(&self, size: Pt) -> Pt {
        let (upem, ascender, _, _) = self.metrics();
        size * (ascender / upem)
    }

    /// Calculate the descent (distance from the baseline to the bottom of the font) for the given font size.
    /// Note: this is usually negative
    pub fn descent(&self, size: Pt) -> Pt {
        let (upem, _, descender, _) = self.metrics();
        size * (descender / upem)
    }

    /// Calculate the leading (extra space between lines) for the given font size
    pub fn leading(&self, size: Pt) -> Pt {
        let (upem, _, _, line_gap) = self.metrics();
        size * (line_gap / upem)
    }

    /// Calculate the default line height of the font for the given size. The returned value is
    /// how much to vertically offset a second row of text below a first row of text.
    pub fn line_height(&self, size: Pt) -> Pt {
        self.leading(size) + self.ascent(size) - self.descent(size)
    }

    /// Horizontal advance of a single character at the given size. Characters the font
    /// cannot show are measured as the glyph they will be replaced with.
    pub fn advance(&self, ch: char, size: Pt) -> Pt {
        match &self.kind {
            FontKind::Helvetica => {
                let code = helvetica::encode_char(ch)
                    .or_else(|| helvetica::transliterate(ch).and_then(helvetica::encode_char))
                    .unwrap_or(b'?');
                size * (helvetica::width_of_code(code) as f32 / helvetica::UNITS_PER_EM)
            }
            FontKind::TrueType(face) => {
                let face_ref = face.as_face_ref();
                let gid = GlyphId(self.glyph_id(ch).unwrap_or_else(|| self.fallback_glyph_id()));
                let advance = face_ref.glyph_hor_advance(gid).unwrap_or_default() as f32;
                size * (advance / face_ref.units_per_em() as f32)
            }
        }
    }

    /// Calculate the width of a given string of text at the given font size
    pub fn width_of_text(&self, text: &str, size: Pt) -> Pt {
        text.chars().map(|ch| self.advance(ch, size)).sum()
    }

    /// Rewrite text so that every character is one the font can show. Embedded fonts
    /// are left alone (missing glyphs fall back at render time); Helvetica folds Turkish
    /// letters outside WinAnsi onto their Latin equivalents.
    pub fn prepare(&self, text: &str) -> String {
        match &self.kind {
            FontKind::Helvetica => helvetica::sanitize(text),
            FontKind::TrueType(_) => text.to_string(),
        }
    }

    /// Encode text into the byte string a `Tj` operator expects for this font
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.kind {
            FontKind::Helvetica => helvetica::sanitize(text)
                .chars()
                .map(|ch| helvetica::encode_char(ch).unwrap_or(b'?'))
                .collect(),
            FontKind::TrueType(_) => text
                .chars()
                .flat_map(|ch| {
                    self.glyph_id(ch)
                        .unwrap_or_else(|| self.fallback_glyph_id())
                        .to_be_bytes()
                })
                .collect(),
        }
    }

    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        match &self.kind {
            FontKind::Helvetica => None,
            FontKind::TrueType(face) => face.as_face_ref().glyph_index(ch).map(|i| i.0),
        }
    }

    fn fallback_glyph_id(&self) -> u16 {
        self.glyph_id('\u{FFFD}')
            .or_else(|| self.glyph_id('?'))
            .unwrap_or(0)
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, id: Id<Font>, writer: &mut Pdf) {
        let font_index = id.index();
        let font_id = refs.gen(RefType::Font(font_index));

        let face = match &self.kind {
            FontKind::Helvetica => {
                writer
                    .type1_font(font_id)
                    .base_font(Name(b"Helvetica"))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
                return;
            }
            FontKind::TrueType(face) => face,
        };

        let cid_font_id = self.write_cid(face, refs, font_index, writer);
        let to_unicode_id = write_to_unicode(face, refs, font_index, writer);

        let mut font = writer.type0_font(font_id);
        font.base_font(Name(format!("F{font_index}").as_bytes()));
        font.encoding_predefined(Name(b"Identity-H"));
        font.descendant_font(cid_font_id);
        font.to_unicode(to_unicode_id);
    }

    fn write_cid(
        &self,
        face: &OwnedFace,
        refs: &mut ObjectReferences,
        font_index: usize,
        writer: &mut Pdf,
    ) -> Ref {
        let font_descriptor_id = self.write_descriptor(face, refs, font_index, writer);

        let id = refs.gen(RefType::CidFont(font_index));

        let mut cid_font = writer.cid_font(id);
        cid_font.subtype(pdf_writer::types::CidFontType::Type2);
        cid_font.base_font(Name(format!("F{font_index}").as_bytes()));
        cid_font.system_info(SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        });
        cid_font.font_descriptor(font_descriptor_id);

        let ids_augmented = glyphs_sizing(face, &glyph_ids(face));
        let scaling = 1000.0 / face.as_face_ref().units_per_em() as f32;

        // the most common advance becomes the default width, ties going to the wider one
        let mut widths_counts: HashMap<u16, usize> = HashMap::new();
        for (_, (width, _)) in ids_augmented.values() {
            *widths_counts.entry(*width).or_insert(0) += 1;
        }
        let most_common_width = widths_counts
            .iter()
            .max_by_key(|(&width, &count)| (count, width))
            .map(|(&width, _)| width as f32 * scaling)
            .unwrap_or(1000.0);

        let mut id_widths: Vec<(u16, f32)> = ids_augmented
            .iter()
            .map(|(&cid, &(_, (width, _)))| (cid, width as f32 * scaling))
            .collect();
        id_widths.sort_by_key(|(id, _)| *id);

        let mut widths = cid_font.widths();
        widths.consecutive(0, [1000.0]);
        if let Some(&(first_cid, first_width)) = id_widths.first() {
            let mut start_cid: u16 = first_cid;
            let mut current_widths: Vec<f32> = vec![first_width];
            for (cid, width) in id_widths.into_iter().skip(1) {
                if (cid - start_cid) as usize > current_widths.len() {
                    // gap in the cid sequence, start a new run
                    widths.consecutive(start_cid, current_widths.clone());
                    start_cid = cid;
                    current_widths.clear();
                }
                current_widths.push(width);
            }
            if !current_widths.is_empty() {
                widths.consecutive(start_cid, current_widths);
            }
        }
        widths.finish();

        cid_font.default_width(most_common_width);
        cid_font.cid_to_gid_map_predefined(Name(b"Identity"));

        id
    }

    fn write_descriptor(
        &self,
        face: &OwnedFace,
        refs: &mut ObjectReferences,
        font_index: usize,
        writer: &mut Pdf,
    ) -> Ref {
        let font_data_stream_id = refs.gen(RefType::FontData(font_index));
        writer
            .stream(font_data_stream_id, face.as_slice())
            .pair(Name(b"Length1"), face.as_slice().len() as i32);

        let gids_augmented = glyphs_sizing(face, &glyph_ids(face));
        let max_width = gids_augmented
            .values()
            .map(|&(_, (w, _))| w)
            .max()
            .unwrap_or_default();
        let max_height = gids_augmented
            .values()
            .map(|&(_, (_, h))| h)
            .max()
            .unwrap_or_default();
        let sum_width: usize = gids_augmented.values().map(|&(_, (w, _))| w as usize).sum();
        let avg_width = sum_width as f32 / gids_augmented.len().max(1) as f32;

        let id = refs.gen(RefType::FontDescriptor(font_index));
        let face_ref = face.as_face_ref();

        let name = self.name();
        let family = self.family();
        let mut descriptor = writer.font_descriptor(id);
        descriptor.name(Name(name.as_bytes()));
        descriptor.family(Str(family.as_bytes()));
        descriptor.weight(face_ref.weight().to_number());

        let mut flags: FontFlags = FontFlags::empty();
        if face_ref.is_monospaced() {
            flags.set(FontFlags::FIXED_PITCH, true);
        }
        if face_ref.is_italic() {
            flags.set(FontFlags::ITALIC, true);
        }
        flags.set(FontFlags::NON_SYMBOLIC, true);
        descriptor.flags(flags);

        let scaling = 1000.0 / face_ref.units_per_em() as f32;
        descriptor.bbox(pdf_writer::Rect {
            x1: 0.0,
            y1: 0.0,
            x2: max_width as f32 * scaling,
            y2: max_height as f32 * scaling,
        });
        descriptor.italic_angle(face_ref.italic_angle());
        descriptor.ascent(face_ref.ascender() as f32 * scaling);
        descriptor.descent(face_ref.descender() as f32 * scaling);
        descriptor.leading(face_ref.line_gap() as f32 * scaling);
        let cap_height = face_ref
            .capital_height()
            .map(|h| h as f32 * scaling)
            .unwrap_or(helvetica::CAP_HEIGHT);
        descriptor.cap_height(cap_height);
        descriptor.x_height(
            face_ref
                .x_height()
                .map(|h| h as f32 * scaling)
                .unwrap_or(cap_height),
        );
        descriptor.stem_v(80.0);
        descriptor.avg_width(avg_width * scaling);
        descriptor.max_width(max_width as f32 * scaling);
        descriptor.missing_width(max_width as f32 * scaling);
        descriptor.font_file2(font_data_stream_id);

        id
    }
}

fn face_name(face: &OwnedFace, name_id: u16) -> Option<String> {
    face.as_face_ref()
        .names()
        .into_iter()
        .find(|name| name.name_id == name_id && name.is_unicode())
        .and_then(|name| name.to_string())
}

/// Every (glyph id, character) pair the face's unicode cmaps map
fn glyph_ids(face: &OwnedFace) -> HashMap<u16, char> {
    let mut map: HashMap<u16, char> = HashMap::new();

    let Some(cmap) = face.as_face_ref().tables().cmap else {
        return map;
    };
    for subtable in cmap.subtables.into_iter().filter(|table| table.is_unicode()) {
        subtable.codepoints(|codepoint: u32| {
            if let Ok(ch) = char::try_from(codepoint) {
                if let Some(index) = subtable.glyph_index(codepoint).filter(|index| index.0 > 0) {
                    map.entry(index.0).or_insert(ch);
                }
            }
        });
    }

    map
}

/// glyph id => (character, (advance, height))
fn glyphs_sizing(face: &OwnedFace, ids: &HashMap<u16, char>) -> HashMap<u16, (char, (u16, i16))> {
    let face = face.as_face_ref();
    let mut ids_augmented: HashMap<u16, (char, (u16, i16))> = HashMap::new();
    for (&id, &ch) in ids.iter() {
        if let Some(gid) = face.glyph_index(ch) {
            if let Some(h_advance) = face.glyph_hor_advance(gid) {
                let height = face
                    .glyph_bounding_box(gid)
                    .map(|bbox| {
                        bbox.y_max
                            .saturating_sub(bbox.y_min)
                            .saturating_sub(face.descender())
                    })
                    .unwrap_or(1000);
                ids_augmented.insert(id, (ch, (h_advance, height)));
            }
        }
    }
    ids_augmented
}

fn write_to_unicode(
    face: &OwnedFace,
    refs: &mut ObjectReferences,
    font_index: usize,
    writer: &mut Pdf,
) -> Ref {
    let id = refs.gen(RefType::ToUnicode(font_index));

    let mut map: String = r#"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
/Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
"#
    .replace("\r\n", "\n");

    let mut ids: Vec<(u16, char)> = glyph_ids(face).into_iter().collect();
    ids.sort_by_key(|&(id, _)| id);

    // bfchar blocks hold at most 100 entries sharing a high byte
    let mut cmap_blocks: Vec<Vec<(u16, char)>> = Vec::new();
    let mut current_block: Vec<(u16, char)> = Vec::new();
    let mut high_byte: u8 = 0;
    for &(id, ch) in ids.iter() {
        if (id >> 8) as u8 != high_byte || current_block.len() >= 100 {
            if !current_block.is_empty() {
                cmap_blocks.push(std::mem::take(&mut current_block));
            }
            high_byte = (id >> 8) as u8;
        }
        current_block.push((id, ch));
    }
    if !current_block.is_empty() {
        cmap_blocks.push(current_block);
    }

    for block in cmap_blocks.into_iter() {
        map.push_str(&format!("{} beginbfchar\n", block.len()));
        for (id, ch) in block.into_iter() {
            let mut utf16 = [0u16; 2];
            let encoded: String = ch
                .encode_utf16(&mut utf16)
                .iter()
                .map(|unit| format!("{unit:04x}"))
                .collect();
            map.push_str(&format!("<{id:04x}> <{encoded}>\n"));
        }
        map.push_str("endbfchar\n");
    }

    map.push_str("endcmap CMapName currentdict /CMap defineresource pop end end\n");

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(
        map.as_bytes(),
        miniz_oxide::deflate::CompressionLevel::DefaultLevel as u8,
    );
    let mut stream = writer.stream(id, compressed.as_slice());
    stream.filter(pdf_writer::Filter::FlateDecode);

    id
}
