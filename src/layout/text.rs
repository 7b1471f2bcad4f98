use crate::colour::Colour;
use crate::font::Font;
use crate::page::{SpanFont, SpanLayout};
use crate::units::Pt;

const TABSIZE: usize = 4;

/// Splits text into lines no wider than `max_width`, breaking at whitespace.
///
/// Tabs become spaces and any newline style starts a new line; blank lines inside the text
/// are kept, trailing ones are not. Runs of whitespace between words collapse to a single
/// space. A word that is wider than a whole line on its own is broken between characters so
/// that no line ever overflows.
pub fn wrap_text(text: &str, font: &Font, size: Pt, max_width: Pt) -> Vec<String> {
    // replace tabs with spaces
    let text = text.replace('\t', &" ".repeat(TABSIZE));
    // normalize newlines
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let space_width = font.advance(' ', size);
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.trim_end().split('\n') {
        let mut line = String::new();
        let mut width = Pt(0.0);

        for word in paragraph.split_whitespace() {
            let word_width = font.width_of_text(word, size);
            let gap = if line.is_empty() { Pt(0.0) } else { space_width };

            if width + gap + word_width <= max_width {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
                width += gap + word_width;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                width = Pt(0.0);
            }

            if word_width <= max_width {
                line.push_str(word);
                width = word_width;
            } else {
                // no break point - force character breaks
                for ch in word.chars() {
                    let advance = font.advance(ch, size);
                    if width + advance > max_width && !line.is_empty() {
                        lines.push(std::mem::take(&mut line));
                        width = Pt(0.0);
                    }
                    line.push(ch);
                    width += advance;
                }
            }
        }

        lines.push(line);
    }

    if lines.len() == 1 && lines[0].is_empty() {
        lines.clear();
    }
    lines
}

/// Turns already-wrapped lines into spans, the first baseline at `start` and each following
/// line `line_height` further down the page
pub fn lines_to_spans(
    lines: &[String],
    font: SpanFont,
    colour: Colour,
    start: (Pt, Pt),
    line_height: Pt,
) -> Vec<SpanLayout> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(i, line)| SpanLayout {
            text: line.clone(),
            font,
            colour,
            coords: (start.0, start.1 - line_height * i as f32),
        })
        .collect()
}
