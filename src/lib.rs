//! Paginated PDF progress reports for field-inspection projects.
//!
//! The crate is split in two layers. The lower one is a small document model on top of
//! [pdf_writer]: [Document]s made of [Page]s that hold text spans, images and vector
//! shapes, written out with shared [Font]s and [Image]s. The upper one turns a project's
//! [Record]s and [Stats] into a report with [ReportGenerator], and carries the plumbing
//! around it: filtering, export helpers, backend collaborator traits and publishing.

mod colour;
pub use colour::*;

mod content;

mod document;
pub use document::*;

mod font;
pub use font::*;

mod image;
pub use self::image::*;

mod info;
pub use info::*;

/// Utility functions and structures to layout objects (mostly text) on pages
pub mod layout;

mod outline;
pub use outline::*;

mod page;
pub use page::*;

/// Standard page sizes and orientation helpers
pub mod pagesize;

mod rect;
pub use rect::*;

pub(crate) mod refs;

mod units;
pub use units::*;

mod error;
pub use error::*;

mod model;
pub use model::*;

mod config;
pub use config::*;

mod qr;
pub use qr::*;

mod assets;
pub use assets::*;

mod report;
pub use report::*;

mod export;
pub use export::*;

/// Record filtering and search, as used to pick what goes into a report
pub mod dashboard;

/// Interfaces to the hosted backend, plus an in-process implementation
pub mod store;

mod publish;
pub use publish::*;

/// Re-export PDF-writer functionality
pub use pdf_writer;
