//! Preview export encoding.
//!
//! Serializes a rendered [`Surface`] into an encoded image blob using the
//! `image` crate's encoders. JPEG supports a configurable quality setting;
//! PNG is lossless and ignores quality.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::Surface;

/// Errors that can occur while encoding a preview blob.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The requested MIME type is not an encodable image type
    #[error("Unsupported MIME type: {0}")]
    UnsupportedMime(String),

    /// Encoding failed
    #[error("Image encoding failed: {0}")]
    EncodingFailed(String),
}

/// Export MIME types the pipeline can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageMime {
    /// `image/jpeg`, quality-parametrized.
    #[default]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    /// `image/png`, lossless (quality ignored).
    #[serde(rename = "image/png")]
    Png,
}

impl ImageMime {
    /// Parse a MIME type string.
    ///
    /// # Errors
    ///
    /// `EncodeError::UnsupportedMime` for anything other than
    /// `image/jpeg` or `image/png`.
    pub fn parse(mime: &str) -> Result<Self, EncodeError> {
        match mime {
            "image/jpeg" => Ok(ImageMime::Jpeg),
            "image/png" => Ok(ImageMime::Png),
            other => Err(EncodeError::UnsupportedMime(other.to_string())),
        }
    }

    /// The canonical MIME type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
        }
    }
}

/// Encode a rendered surface into an image blob.
///
/// # Arguments
///
/// * `surface` - Rendered preview surface (RGB8)
/// * `mime` - Target format
/// * `quality` - JPEG quality (1-100, clamped; ignored for PNG)
///
/// # Errors
///
/// Zero-area surfaces and mismatched pixel buffers are errors; the caller's
/// previously published preview stays valid when encoding fails.
pub fn encode_surface(surface: &Surface, mime: ImageMime, quality: u8) -> Result<Vec<u8>, EncodeError> {
    encode_pixels(&surface.pixels, surface.width, surface.height, mime, quality)
}

/// Encode raw RGB pixel data into an image blob.
pub fn encode_pixels(
    pixels: &[u8],
    width: u32,
    height: u32,
    mime: ImageMime,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    // Validate dimensions
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    // Validate pixel data length
    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());

    match mime {
        ImageMime::Jpeg => {
            // Clamp quality to valid range (1-100)
            let quality = quality.clamp(1, 100);
            JpegEncoder::new_with_quality(&mut buffer, quality)
                .write_image(pixels, width, height, ExtendedColorType::Rgb8)
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
        }
        ImageMime::Png => {
            PngEncoder::new(&mut buffer)
                .write_image(pixels, width, height, ExtendedColorType::Rgb8)
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
        }
    }

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 4] = [0x89, b'P', b'N', b'G'];

    #[test]
    fn test_encode_jpeg_basic() {
        let pixels = vec![128u8; 100 * 100 * 3];

        let jpeg = encode_pixels(&pixels, 100, 100, ImageMime::Jpeg, 90).unwrap();

        // SOI and EOI markers
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_png_basic() {
        let pixels = vec![128u8; 50 * 50 * 3];

        let png = encode_pixels(&pixels, 50, 50, ImageMime::Png, 90).unwrap();
        assert_eq!(&png[0..4], &PNG_MAGIC);
    }

    #[test]
    fn test_encode_surface() {
        let surface = Surface {
            width: 10,
            height: 10,
            pixels: vec![64u8; 10 * 10 * 3],
        };

        let blob = encode_surface(&surface, ImageMime::Png, 90).unwrap();
        assert_eq!(&blob[0..4], &PNG_MAGIC);
    }

    #[test]
    fn test_encode_jpeg_quality_clamping() {
        let pixels = vec![128u8; 10 * 10 * 3];

        // Quality 0 clamps to 1, 255 clamps to 100.
        assert!(encode_pixels(&pixels, 10, 10, ImageMime::Jpeg, 0).is_ok());
        assert!(encode_pixels(&pixels, 10, 10, ImageMime::Jpeg, 255).is_ok());
    }

    #[test]
    fn test_encode_jpeg_quality_affects_size() {
        // Gradient image so quality differences are visible.
        let mut pixels = Vec::with_capacity(100 * 100 * 3);
        for y in 0..100u32 {
            for x in 0..100u32 {
                pixels.push((x * 255 / 100) as u8);
                pixels.push((y * 255 / 100) as u8);
                pixels.push(128);
            }
        }

        let low = encode_pixels(&pixels, 100, 100, ImageMime::Jpeg, 10).unwrap();
        let high = encode_pixels(&pixels, 100, 100, ImageMime::Jpeg, 95).unwrap();
        assert!(high.len() > low.len());
    }

    #[test]
    fn test_encode_zero_width() {
        let result = encode_pixels(&[], 0, 100, ImageMime::Jpeg, 90);
        assert!(matches!(result, Err(EncodeError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_encode_zero_height() {
        let result = encode_pixels(&[], 100, 0, ImageMime::Png, 90);
        assert!(matches!(result, Err(EncodeError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_encode_empty_surface_fails() {
        let surface = Surface::new();
        let result = encode_surface(&surface, ImageMime::Jpeg, 90);
        assert!(matches!(result, Err(EncodeError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_encode_mismatched_pixel_data() {
        let pixels = vec![128u8; 99 * 100 * 3]; // One row short

        let result = encode_pixels(&pixels, 100, 100, ImageMime::Jpeg, 90);
        assert!(matches!(result, Err(EncodeError::InvalidPixelData { .. })));
    }

    #[test]
    fn test_mime_parse() {
        assert_eq!(ImageMime::parse("image/jpeg").unwrap(), ImageMime::Jpeg);
        assert_eq!(ImageMime::parse("image/png").unwrap(), ImageMime::Png);
        assert!(matches!(
            ImageMime::parse("image/webp"),
            Err(EncodeError::UnsupportedMime(_))
        ));
        assert!(matches!(
            ImageMime::parse(""),
            Err(EncodeError::UnsupportedMime(_))
        ));
    }

    #[test]
    fn test_mime_as_str_round_trip() {
        assert_eq!(ImageMime::parse(ImageMime::Jpeg.as_str()).unwrap(), ImageMime::Jpeg);
        assert_eq!(ImageMime::parse(ImageMime::Png.as_str()).unwrap(), ImageMime::Png);
    }

    #[test]
    fn test_encode_error_display() {
        let err = EncodeError::UnsupportedMime("image/webp".to_string());
        assert_eq!(err.to_string(), "Unsupported MIME type: image/webp");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
