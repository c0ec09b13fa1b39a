use base64::{Engine, engine::general_purpose::STANDARD};
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Empty image data")]
    Empty,

    #[error("Invalid image format")]
    InvalidFormat(#[source] image::ImageError),

    #[error("Failed to decode image: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Decode an uploaded image (any supported container) into 3-channel RGB.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let image = image::load_from_memory(bytes).map_err(DecodeError::InvalidFormat)?;

    tracing::trace!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Decoded image"
    );

    Ok(image.to_rgb8())
}

/// Decode a standard-alphabet base64 string, then the image it carries.
///
/// Whitespace anywhere in the input is ignored, so line-wrapped output from
/// `base64` tools is accepted.
pub fn decode_base64(encoded: &str) -> Result<RgbImage, DecodeError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact)?;
    decode_image(&bytes)
}
