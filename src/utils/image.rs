//! Decoding of submitted images into [`GrayscaleImage`]s.
//!
//! Browsers send canvas drawings as data URLs
//! (`data:image/png;base64,<payload>`); uploads and the CLI hand over raw
//! encoded bytes. Both end up as a single-channel image scaled to [0, 1].

use crate::core::{DigitError, DigitResult, ProcessingStage};
use crate::processors::GrayscaleImage;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

/// Extracts and decodes the base64 payload of a data URL.
///
/// Everything up to the first comma is treated as the header and ignored.
/// A string without a `data:` prefix is decoded as bare base64.
///
/// # Errors
///
/// Returns [`DigitError::InvalidInput`] for an empty payload or a `data:` URL
/// without a comma, and a decode-stage [`DigitError::Processing`] for invalid
/// base64.
pub fn decode_data_url(data_url: &str) -> DigitResult<Vec<u8>> {
    let data_url = data_url.trim();
    let payload = if data_url.starts_with("data:") {
        match data_url.split_once(',') {
            Some((_, payload)) => payload,
            None => return Err(DigitError::invalid_input("data URL has no ',' separator")),
        }
    } else {
        data_url
    };

    // Some clients wrap long payloads.
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if payload.is_empty() {
        return Err(DigitError::invalid_input("image payload is empty"));
    }

    STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| {
            DigitError::processing(ProcessingStage::Decode, "invalid base64 image data", e)
        })
}

/// Decodes encoded image bytes (PNG, JPEG, ...) into a grayscale image.
///
/// Color is converted to luma and any alpha channel is discarded.
pub fn decode_grayscale(bytes: &[u8]) -> DigitResult<GrayscaleImage> {
    if bytes.is_empty() {
        return Err(DigitError::invalid_input("image data is empty"));
    }
    let decoded = image::load_from_memory(bytes)?;
    GrayscaleImage::from_luma8(&decoded.to_luma8())
}

/// Decodes a data URL straight into a grayscale image.
pub fn load_grayscale_from_data_url(data_url: &str) -> DigitResult<GrayscaleImage> {
    let bytes = decode_data_url(data_url)?;
    decode_grayscale(&bytes)
}

/// Reads and decodes an image file.
pub fn load_grayscale(path: impl AsRef<Path>) -> DigitResult<GrayscaleImage> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_grayscale(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(image: &image::DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_data_url_with_header() {
        let encoded = STANDARD.encode(b"hello");
        let url = format!("data:image/png;base64,{encoded}");
        assert_eq!(decode_data_url(&url).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_bare_base64_and_whitespace() {
        let encoded = STANDARD.encode(b"digits");
        let wrapped = format!("{}\n{}", &encoded[..4], &encoded[4..]);
        assert_eq!(decode_data_url(&wrapped).unwrap(), b"digits");
    }

    #[test]
    fn test_decode_data_url_errors() {
        for bad in ["data:image/png;base64", "data:image/png;base64,", "!!not base64!!"] {
            let err = decode_data_url(bad).unwrap_err();
            assert!(err.is_user_error(), "{bad} -> {err}");
        }
    }

    #[test]
    fn test_decode_grayscale_scales_to_unit_range() {
        let mut gray = GrayImage::new(4, 3);
        gray.put_pixel(1, 2, Luma([255]));
        gray.put_pixel(3, 0, Luma([51]));
        let bytes = png_bytes(&image::DynamicImage::ImageLuma8(gray));

        let image = decode_grayscale(&bytes).unwrap();
        assert_eq!((image.height(), image.width()), (3, 4));
        assert_eq!(image.as_array()[[2, 1]], 1.0);
        assert!((image.as_array()[[0, 3]] - 0.2).abs() < 1e-6);
        assert_eq!(image.as_array()[[0, 0]], 0.0);
    }

    #[test]
    fn test_rgba_drawing_is_converted() {
        let mut rgba = RgbaImage::new(5, 5);
        rgba.put_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let bytes = png_bytes(&image::DynamicImage::ImageRgba8(rgba));
        let url = format!("data:image/png;base64,{}", STANDARD.encode(&bytes));

        let image = load_grayscale_from_data_url(&url).unwrap();
        assert_eq!(image.as_array()[[2, 2]], 1.0);
        assert_eq!(image.as_array().sum(), 1.0);
    }

    #[test]
    fn test_undecodable_bytes_are_user_errors() {
        assert!(decode_grayscale(b"").unwrap_err().is_user_error());
        let err = decode_grayscale(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DigitError::ImageLoad(_)));
        assert!(err.is_user_error());
    }
}
