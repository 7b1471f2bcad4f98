use crate::refs::{ObjectReferences, RefType};
use image::{ColorType, DynamicImage, GenericImageView, GrayImage, ImageFormat};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Pdf};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("image has no pixels")]
    Empty,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ColourSpace {
    Rgb,
    Grey,
}

/// A raster image, decoded and re-encoded for the PDF up front so that broken image data is
/// reported when the image is created rather than when the document is written.
///
/// Images are cheap to clone; the encoded bytes are shared between clones.
#[derive(Clone, Debug)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    colour_space: ColourSpace,
    filter: Filter,
    bytes: Arc<[u8]>,
    mask: Option<Arc<[u8]>>,
}

impl Image {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Image, ImageError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Decode an encoded image (PNG, JPEG, GIF, ...). Baseline RGB JPEGs are kept as they
    /// are and embedded directly; anything else is converted to 8-bit RGB.
    pub fn from_bytes(data: &[u8]) -> Result<Image, ImageError> {
        let format = image::guess_format(data)?;
        let image = image::load_from_memory_with_format(data, format)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(ImageError::Empty);
        }

        match (format, image.color()) {
            (ImageFormat::Jpeg, ColorType::Rgb8) if jpeg_components(data) == Some(3) => Ok(Image {
                width: image.width(),
                height: image.height(),
                colour_space: ColourSpace::Rgb,
                filter: Filter::DctDecode,
                bytes: Arc::from(data),
                mask: None,
            }),
            _ => Ok(Self::from_dynamic(&image)),
        }
    }

    /// Encode already-decoded pixels, keeping any alpha channel as a soft mask
    pub fn from_dynamic(image: &DynamicImage) -> Image {
        let level = CompressionLevel::DefaultLevel as u8;

        let mask = image.color().has_alpha().then(|| {
            let alphas: Vec<u8> = image.pixels().map(|(_, _, p)| p.0[3]).collect();
            Arc::from(compress_to_vec_zlib(&alphas, level))
        });
        let bytes = compress_to_vec_zlib(image.to_rgb8().as_raw(), level);

        Image {
            width: image.width(),
            height: image.height(),
            colour_space: ColourSpace::Rgb,
            filter: Filter::FlateDecode,
            bytes: Arc::from(bytes),
            mask,
        }
    }

    /// Encode a single-channel image, one byte per pixel
    pub fn from_luma(image: &GrayImage) -> Image {
        let bytes = compress_to_vec_zlib(image.as_raw(), CompressionLevel::DefaultLevel as u8);
        Image {
            width: image.width(),
            height: image.height(),
            colour_space: ColourSpace::Grey,
            filter: Filter::FlateDecode,
            bytes: Arc::from(bytes),
            mask: None,
        }
    }

    /// Whether the image carries a transparency mask
    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, image_index: usize, writer: &mut Pdf) {
        let id = refs.gen(RefType::Image(image_index));
        let mask_id = self
            .mask
            .as_ref()
            .map(|_| refs.gen(RefType::ImageMask(image_index)));

        let mut image = writer.image_xobject(id, &self.bytes);
        image.filter(self.filter);
        image.width(self.width as i32);
        image.height(self.height as i32);
        match self.colour_space {
            ColourSpace::Rgb => image.color_space().device_rgb(),
            ColourSpace::Grey => image.color_space().device_gray(),
        };
        image.bits_per_component(8);
        // keep module edges crisp when a small symbol is scaled up
        image.interpolate(self.colour_space == ColourSpace::Rgb);
        if let Some(mask_id) = mask_id {
            image.s_mask(mask_id);
        }
        image.finish();

        if let (Some(mask_id), Some(mask)) = (mask_id, &self.mask) {
            let mut s_mask = writer.image_xobject(mask_id, mask);
            s_mask.filter(Filter::FlateDecode);
            s_mask.width(self.width as i32);
            s_mask.height(self.height as i32);
            s_mask.color_space().device_gray();
            s_mask.bits_per_component(8);
        }
    }
}

/// Number of colour components in a JPEG's frame header. The decoder reports CMYK and YCCK
/// files as RGB, but their scan data can't be embedded as `/DeviceRGB`.
fn jpeg_components(data: &[u8]) -> Option<u8> {
    let mut pos = 2;
    while pos + 3 < data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        match marker {
            // fill byte
            0xFF => pos += 1,
            // markers without a payload
            0x01 | 0xD0..=0xD7 => pos += 2,
            // start of scan or end of image before any frame header
            0xD9 | 0xDA => return None,
            // frame headers: length, precision, height, width, components
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return data.get(pos + 9).copied();
            }
            _ => {
                let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                pos += 2 + length;
            }
        }
    }
    None
}
