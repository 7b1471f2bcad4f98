use crate::image::Image;
use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};
use thiserror::Error;

/// Light modules around the symbol, as required for scanners to find it
pub const QUIET_ZONE: u32 = 4;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QrError {
    #[error("QR payload is empty")]
    Empty,

    #[error("could not encode QR payload: {0}")]
    Encode(#[from] qrcode::types::QrError),
}

/// Encode `payload` as a QR symbol ready to place on a page.
///
/// The payload's UTF-8 bytes are encoded at error-correction level M in the smallest
/// version that holds them. The image has one pixel per module (black on white) plus a
/// quiet zone of [QUIET_ZONE] modules on every side; it is meant to be scaled up without
/// interpolation.
pub fn encode_qr(payload: &str) -> Result<Image, QrError> {
    if payload.is_empty() {
        return Err(QrError::Empty);
    }

    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = modules + 2 * QUIET_ZONE;

    let symbol = GrayImage::from_fn(side, side, |x, y| {
        let inside = |v: u32| (QUIET_ZONE..QUIET_ZONE + modules).contains(&v);
        if inside(x) && inside(y) {
            let index = ((y - QUIET_ZONE) * modules + (x - QUIET_ZONE)) as usize;
            match colors[index] {
                Color::Dark => Luma([0u8]),
                Color::Light => Luma([255u8]),
            }
        } else {
            Luma([255u8])
        }
    });

    log::trace!("encoded {} byte QR payload as a {modules}x{modules} symbol", payload.len());
    Ok(Image::from_luma(&symbol))
}
