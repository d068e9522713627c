//! WASM-compatible wrapper types for image data.
//!
//! This module provides JavaScript-friendly types that wrap the core Pixcrop
//! types, handling the conversion between Rust and JavaScript data
//! representations.

use pixcrop_core::decode::{self, SourceImage};
use wasm_bindgen::prelude::*;

/// A decoded source image wrapper for JavaScript.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. `pixels()` copies it out to a
/// `Uint8Array`; for large images prefer keeping the image in WASM memory
/// and only extracting pixels when needed. wasm-bindgen's finalizer frees
/// the WASM memory when the JavaScript handle is collected.
#[wasm_bindgen]
pub struct JsSourceImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsSourceImage {
    /// Create a new JsSourceImage from dimensions and pixel data.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsSourceImage {
        JsSourceImage {
            width,
            height,
            pixels,
        }
    }

    /// Get the natural image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the natural image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of bytes in the pixel buffer (width * height * 3 for RGB)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array (copies out of WASM memory).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsSourceImage {
    /// Create a JsSourceImage from a core SourceImage.
    pub(crate) fn from_source(img: SourceImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }
}

/// Decode an image file (PNG or JPEG) from bytes.
///
/// EXIF orientation is applied automatically so the image matches what the
/// browser would display.
///
/// # Arguments
///
/// * `bytes` - The raw file bytes as a `Uint8Array`
///
/// # Errors
///
/// Rejects with a message when the bytes are not a decodable image; the
/// failure is also logged to the browser console.
#[wasm_bindgen]
pub fn decode_source(bytes: &[u8]) -> Result<JsSourceImage, JsValue> {
    match decode::decode_image(bytes) {
        Ok(img) => Ok(JsSourceImage::from_source(img)),
        Err(e) => {
            web_sys::console::warn_1(&format!("pixcrop: decode failed: {e}").into());
            Err(JsValue::from_str(&e.to_string()))
        }
    }
}
