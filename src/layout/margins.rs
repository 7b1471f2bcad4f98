use crate::units::{Mm, Pt};
use serde::{Deserialize, Serialize};

/// Margins are used when laying out objects on a page. There is no control
/// preventing objects on pages to overflow the margins; the margins are there
/// as guidelines for layout functions. Additionally, the margins are applied
/// to [`Page`](crate::Page)s to determine the `ArtBox` attribute of each page in the
/// generated PDF
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Margins {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Margins {
    /// Create margins by specifying individual components in a clockwise fashion
    /// starting at the top (in the same order as CSS margins)
    pub fn trbl(top: Pt, right: Pt, bottom: Pt, left: Pt) -> Margins {
        Margins {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Create margins where all values are equal
    pub fn all(value: Pt) -> Margins {
        Margins::trbl(value, value, value, value)
    }

    /// Create margins where all values are 0.0
    pub fn empty() -> Margins {
        Margins::all(Pt(0.0))
    }
}

/// Margins as written in a configuration file, in millimetres
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginsMm {
    pub top: Mm,
    pub right: Mm,
    pub bottom: Mm,
    pub left: Mm,
}

impl From<MarginsMm> for Margins {
    fn from(m: MarginsMm) -> Self {
        Margins::trbl(m.top.into(), m.right.into(), m.bottom.into(), m.left.into())
    }
}
