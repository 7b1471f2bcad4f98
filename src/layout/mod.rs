//! Utilities for positioning text on pages.
//!
//! [`wrap_text`] breaks a paragraph into lines that fit a given width, measuring each
//! glyph with the font it will be set in; [`lines_to_spans`] turns those lines into
//! [`SpanLayout`](crate::SpanLayout)s stacked at a fixed line height.
//!
//! # Example
//!
//! ```
//! use punch_report::{Font, Pt};
//! use punch_report::layout::wrap_text;
//!
//! let font = Font::helvetica();
//! let lines = wrap_text("The quick brown fox jumps over the lazy dog", &font, Pt(10.0), Pt(80.0));
//! assert!(lines.len() > 1);
//! ```

mod margins;
mod text;

pub use margins::*;
pub use text::*;
