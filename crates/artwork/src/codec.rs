//! Image decode and PNG encode helpers.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

/// Errors decoding image bytes.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("empty image payload")]
    Empty,

    #[error("undecodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decodes PNG or JPEG bytes, guessing the format from the content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Decodes bytes that must be PNG.
pub fn decode_png(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?)
}

/// Encodes an image as PNG. Lossless and deterministic for a given image.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
