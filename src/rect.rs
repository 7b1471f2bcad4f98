use crate::units::*;

/// A rectangle, specified by two opposite corners in PDF space (y grows upwards).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    /// The x-coordinate of the lower-left corner.
    pub x1: Pt,
    /// The y-coordinate of the lower-left corner.
    pub y1: Pt,
    /// The x-coordinate of the upper-right corner.
    pub x2: Pt,
    /// The y-coordinate of the upper-right corner.
    pub y2: Pt,
}

impl Rect {
    /// Build a rectangle from its lower-left corner and its size
    pub fn from_origin(x: Pt, y: Pt, width: Pt, height: Pt) -> Rect {
        Rect {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    pub fn width(&self) -> Pt {
        self.x2 - self.x1
    }

    pub fn height(&self) -> Pt {
        self.y2 - self.y1
    }

    /// Whether `other` lies entirely within `self` (edges may touch)
    pub fn contains(&self, other: &Rect) -> bool {
        other.x1 >= self.x1 && other.x2 <= self.x2 && other.y1 >= self.y1 && other.y2 <= self.y2
    }

    /// The largest rectangle with the aspect ratio `width:height` that fits inside `self`,
    /// centred on both axes
    pub fn fit_centred(&self, width: f32, height: f32) -> Rect {
        if width <= 0.0 || height <= 0.0 {
            return *self;
        }
        // the limiting axis keeps the box's own edges
        if self.width().0 / width <= self.height().0 / height {
            let h = (self.width() * (height / width)).min(self.height());
            let y1 = (self.y1 + (self.height() - h) / 2.0).max(self.y1);
            Rect {
                x1: self.x1,
                y1,
                x2: self.x2,
                y2: (y1 + h).min(self.y2),
            }
        } else {
            let w = (self.height() * (width / height)).min(self.width());
            let x1 = (self.x1 + (self.width() - w) / 2.0).max(self.x1);
            Rect {
                x1,
                y1: self.y1,
                x2: (x1 + w).min(self.x2),
                y2: self.y2,
            }
        }
    }

    /// Whether all four coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }
}

impl From<Rect> for pdf_writer::Rect {
    fn from(r: Rect) -> Self {
        pdf_writer::Rect {
            x1: r.x1.into(),
            y1: r.y1.into(),
            x2: r.x2.into(),
            y2: r.y2.into(),
        }
    }
}

impl From<&Rect> for pdf_writer::Rect {
    fn from(r: &Rect) -> Self {
        (*r).into()
    }
}
