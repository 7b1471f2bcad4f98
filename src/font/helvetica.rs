//! Metrics and encoding for the standard (non-embedded) Helvetica face, using the
//! WinAnsi code page. Widths are in 1/1000 em, straight from the Adobe AFM.

pub(crate) const UNITS_PER_EM: f32 = 1000.0;
pub(crate) const ASCENDER: f32 = 718.0;
pub(crate) const DESCENDER: f32 = -207.0;
pub(crate) const LINE_GAP: f32 = 231.0;
pub(crate) const CAP_HEIGHT: f32 = 718.0;

/// 0x20..=0x7E
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' ../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// 0xA0..=0xFF, which WinAnsi shares with Latin-1
const LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, //
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, //
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, //
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, //
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, //
];

/// The 0x80..=0x9F block of WinAnsi, which Latin-1 leaves to control codes
const WIN_ANSI_EXTRAS: [(char, u8, u16); 27] = [
    ('€', 0x80, 556),
    ('‚', 0x82, 222),
    ('ƒ', 0x83, 556),
    ('„', 0x84, 333),
    ('…', 0x85, 1000),
    ('†', 0x86, 556),
    ('‡', 0x87, 556),
    ('ˆ', 0x88, 333),
    ('‰', 0x89, 1000),
    ('Š', 0x8A, 667),
    ('‹', 0x8B, 333),
    ('Œ', 0x8C, 1000),
    ('Ž', 0x8E, 611),
    ('‘', 0x91, 222),
    ('’', 0x92, 222),
    ('“', 0x93, 333),
    ('”', 0x94, 333),
    ('•', 0x95, 350),
    ('–', 0x96, 556),
    ('—', 0x97, 1000),
    ('˜', 0x98, 333),
    ('™', 0x99, 1000),
    ('š', 0x9A, 500),
    ('›', 0x9B, 333),
    ('œ', 0x9C, 944),
    ('ž', 0x9E, 500),
    ('Ÿ', 0x9F, 667),
];

/// Map a character to its WinAnsi byte, if the code page has it
pub(crate) fn encode_char(ch: char) -> Option<u8> {
    match ch as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(ch as u32 as u8),
        _ => WIN_ANSI_EXTRAS
            .iter()
            .find(|(c, _, _)| *c == ch)
            .map(|&(_, code, _)| code),
    }
}

/// Advance width of a WinAnsi byte
pub(crate) fn width_of_code(code: u8) -> u16 {
    match code {
        0x20..=0x7E => ASCII_WIDTHS[(code - 0x20) as usize],
        0xA0..=0xFF => LATIN1_WIDTHS[(code - 0xA0) as usize],
        _ => WIN_ANSI_EXTRAS
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|&(_, _, w)| w)
            .unwrap_or(556),
    }
}

/// Turkish letters missing from WinAnsi, folded onto their closest Latin letter
pub(crate) fn transliterate(ch: char) -> Option<char> {
    match ch {
        'ğ' => Some('g'),
        'Ğ' => Some('G'),
        'ş' => Some('s'),
        'Ş' => Some('S'),
        'ı' => Some('i'),
        'İ' => Some('I'),
        _ => None,
    }
}

/// Rewrite `text` so that every character can be shown in WinAnsi. Line breaks of any
/// style become `\n`.
pub(crate) fn sanitize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .map(|ch| match ch {
            '\t' | '\n' => ch,
            '\r' => '\n',
            _ if encode_char(ch).is_some() => ch,
            _ => transliterate(ch).unwrap_or('?'),
        })
        .collect()
}
