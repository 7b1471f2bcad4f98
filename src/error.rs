use thiserror::Error;

/// All errors that can occur while assembling or serializing a PDF document
#[derive(Error, Debug)]
pub enum PDFError {
    #[error(transparent)]
    /// An I/O error occurred
    Io(#[from] std::io::Error),

    #[error(transparent)]
    /// [owned_ttf_parser] failed to parse the font
    FaceParsingError(#[from] owned_ttf_parser::FaceParsingError),

    #[error(transparent)]
    /// An image could not be decoded
    Image(#[from] crate::image::ImageError),

    #[error("invalid geometry: {0}")]
    /// A shape, image placement or text position was not a finite number
    InvalidGeometry(String),

    #[error("a page refers to a font that is not part of the document")]
    FontMissing,

    #[error("a page refers to an image that is not part of the document")]
    ImageMissing,

    #[error("the page order refers to a page that is not part of the document")]
    PageMissing,
}
