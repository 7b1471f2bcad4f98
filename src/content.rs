//! Rendering of page contents into a PDF content stream.

use crate::colour::Colour;
use crate::font::Font;
use crate::page::{ImageLayout, PageContents, Shape, ShapeLayout, SpanFont, SpanLayout};
use crate::rect::Rect;
use crate::units::Pt;
use crate::PDFError;
use id_arena::Arena;
use std::io::Write;

/// Bézier handle length for approximating a quarter circle
const KAPPA: f32 = 0.552_284_8;

/// Renders page contents to a PDF content stream, converting high-level content items into
/// low-level PDF operators. Fails if any coordinate is not a finite number or a span refers
/// to a font the document does not have.
#[allow(clippy::write_with_newline)]
pub(crate) fn render_contents(
    contents: &[PageContents],
    fonts: &Arena<Font>,
) -> Result<Vec<u8>, PDFError> {
    let mut content: Vec<u8> = Vec::default();

    for page_content in contents.iter() {
        match page_content {
            PageContents::Text(spans) => render_text_spans(&mut content, spans, fonts)?,
            PageContents::Image(image) => render_image(&mut content, image)?,
            PageContents::Shape(shape) => render_shape(&mut content, shape)?,
        }
    }

    Ok(content)
}

#[allow(clippy::write_with_newline)]
fn render_text_spans(
    content: &mut Vec<u8>,
    spans: &[SpanLayout],
    fonts: &Arena<Font>,
) -> Result<(), PDFError> {
    let Some(first) = spans.first() else {
        return Ok(());
    };

    write!(content, "q\n")?;

    let mut current_font: SpanFont = first.font;
    let mut current_colour: Colour = first.colour;
    write_font(content, current_font)?;
    write_fill_colour(content, current_colour)?;

    for span in spans.iter() {
        if !span.coords.0.is_finite() || !span.coords.1.is_finite() {
            return Err(PDFError::InvalidGeometry(format!(
                "text {:?} placed at a non-finite position",
                span.text
            )));
        }
        let font = fonts.get(span.font.id).ok_or(PDFError::FontMissing)?;

        if span.font != current_font {
            current_font = span.font;
            write_font(content, current_font)?;
        }
        if span.colour != current_colour {
            current_colour = span.colour;
            write_fill_colour(content, current_colour)?;
        }

        write!(content, "BT\n")?;
        write!(content, "{} {} Td\n", span.coords.0, span.coords.1)?;
        write!(content, "<")?;
        for byte in font.encode(&span.text) {
            write!(content, "{byte:02x}")?;
        }
        write!(content, "> Tj\n")?;
        write!(content, "ET\n")?;
    }

    write!(content, "Q\n")?;
    Ok(())
}

#[allow(clippy::write_with_newline)]
fn render_image(content: &mut Vec<u8>, image: &ImageLayout) -> Result<(), PDFError> {
    check_rect(&image.position)?;
    write!(content, "q\n")?;
    write!(
        content,
        "{} 0 0 {} {} {} cm\n",
        image.position.width(),
        image.position.height(),
        image.position.x1,
        image.position.y1
    )?;
    write!(content, "/I{} Do\n", image.image_id.index())?;
    write!(content, "Q\n")?;
    Ok(())
}

#[allow(clippy::write_with_newline)]
fn render_shape(content: &mut Vec<u8>, layout: &ShapeLayout) -> Result<(), PDFError> {
    write!(content, "q\n")?;
    if let Some(fill) = layout.fill {
        write_fill_colour(content, fill)?;
    }
    if let Some((stroke, width)) = layout.stroke {
        write_stroke_colour(content, stroke)?;
        write!(content, "{} w\n", width)?;
    }

    match &layout.shape {
        Shape::Line { from, to } => {
            if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
                return Err(PDFError::InvalidGeometry("line with non-finite ends".into()));
            }
            write!(content, "{} {} m\n", from.0, from.1)?;
            write!(content, "{} {} l\n", to.0, to.1)?;
        }
        Shape::RoundedRect { rect, radius } => {
            check_rect(rect)?;
            write_rounded_rect(content, rect, *radius)?;
        }
    }

    let operator = match (layout.fill.is_some(), layout.stroke.is_some()) {
        (true, true) => "B",
        (true, false) => "f",
        (false, true) => "S",
        (false, false) => "n",
    };
    write!(content, "{operator}\n")?;
    write!(content, "Q\n")?;
    Ok(())
}

/// Path of a rectangle with quarter-circle corners, anticlockwise from the bottom edge
#[allow(clippy::write_with_newline)]
fn write_rounded_rect(content: &mut Vec<u8>, rect: &Rect, radius: Pt) -> Result<(), PDFError> {
    let r = radius
        .max(Pt(0.0))
        .min(rect.width() / 2.0)
        .min(rect.height() / 2.0);
    let k = r * KAPPA;
    let Rect { x1, y1, x2, y2 } = *rect;

    write!(content, "{} {} m\n", x1 + r, y1)?;
    write!(content, "{} {} l\n", x2 - r, y1)?;
    write!(
        content,
        "{} {} {} {} {} {} c\n",
        x2 - r + k,
        y1,
        x2,
        y1 + r - k,
        x2,
        y1 + r
    )?;
    write!(content, "{} {} l\n", x2, y2 - r)?;
    write!(
        content,
        "{} {} {} {} {} {} c\n",
        x2,
        y2 - r + k,
        x2 - r + k,
        y2,
        x2 - r,
        y2
    )?;
    write!(content, "{} {} l\n", x1 + r, y2)?;
    write!(
        content,
        "{} {} {} {} {} {} c\n",
        x1 + r - k,
        y2,
        x1,
        y2 - r + k,
        x1,
        y2 - r
    )?;
    write!(content, "{} {} l\n", x1, y1 + r)?;
    write!(
        content,
        "{} {} {} {} {} {} c\n",
        x1,
        y1 + r - k,
        x1 + r - k,
        y1,
        x1 + r,
        y1
    )?;
    write!(content, "h\n")?;
    Ok(())
}

fn check_rect(rect: &Rect) -> Result<(), PDFError> {
    if rect.is_finite() && rect.x2 >= rect.x1 && rect.y2 >= rect.y1 {
        Ok(())
    } else {
        Err(PDFError::InvalidGeometry(format!("invalid rectangle {rect:?}")))
    }
}

#[allow(clippy::write_with_newline)]
fn write_font(content: &mut Vec<u8>, font: SpanFont) -> Result<(), std::io::Error> {
    write!(content, "/F{} {} Tf\n", font.id.index(), font.size)
}

#[allow(clippy::write_with_newline)]
fn write_fill_colour(content: &mut Vec<u8>, colour: Colour) -> Result<(), std::io::Error> {
    match colour {
        Colour::RGB { r, g, b } => write!(content, "{r} {g} {b} rg\n"),
        Colour::Grey { g } => write!(content, "{g} g\n"),
    }
}

#[allow(clippy::write_with_newline)]
fn write_stroke_colour(content: &mut Vec<u8>, colour: Colour) -> Result<(), std::io::Error> {
    match colour {
        Colour::RGB { r, g, b } => write!(content, "{r} {g} {b} RG\n"),
        Colour::Grey { g } => write!(content, "{g} G\n"),
    }
}
