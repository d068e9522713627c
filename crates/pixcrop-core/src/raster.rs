//! Preview rasterization.
//!
//! Draws a scaled/rotated sub-region of a source image onto an output pixel
//! surface, the software stand-in for the preview canvas.
//!
//! # Algorithm
//!
//! The transform pivots on the *source image* natural center, not the crop
//! rectangle's center, so changing the crop boundaries after rotating does
//! not visually jump the image. The forward transform (source → device) is:
//!
//! ```text
//! p = center + scale * R(theta) * (s - center)   // pivot on image center
//! device = dpr * (p - crop_origin)               // crop offset, then DPR
//! ```
//!
//! Rendering inverts this per output pixel and samples the source with
//! bilinear interpolation:
//!
//! ```text
//! p = device / dpr + crop_origin
//! s = center + R(-theta) * (p - center) / scale
//! ```

use crate::decode::SourceImage;
use crate::geometry::{CropRegion, TransformState, Unit};

/// An output pixel buffer with RGB8 data.
///
/// Reused across renders; [`render`] resizes it to the crop region's device
/// dimensions on each call.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    /// Surface width in device pixels.
    pub width: u32,
    /// Surface height in device pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl Surface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize the surface, zeroing its contents.
    fn reset(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize((width * height * 3) as usize, 0);
    }

    /// Check if the surface has no drawable area.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Render a crop region of the source onto the surface.
///
/// The surface is sized to the region's pixel dimensions scaled by
/// `device_pixel_ratio`, so the preview stays crisp on scaled displays.
/// `circular` masks the output to the inscribed ellipse (a display/encode
/// hint); masked pixels are left black.
///
/// # Arguments
///
/// * `source` - Decoded source image
/// * `surface` - Output buffer, resized and overwritten
/// * `region` - Crop region in **pixel units** (see
///   [`crate::geometry::to_pixel_region`])
/// * `transform` - User scale and rotation
/// * `device_pixel_ratio` - Display scaling factor (1.0 = no scaling)
/// * `circular` - Mask output to the inscribed ellipse
///
/// # Behavior
///
/// A zero-area region or an empty source makes this call a no-op: the
/// surface is left untouched and no error is raised. Degenerate regions are
/// routine during interactive dragging.
pub fn render(
    source: &SourceImage,
    surface: &mut Surface,
    region: &CropRegion,
    transform: &TransformState,
    device_pixel_ratio: f64,
    circular: bool,
) {
    debug_assert_eq!(region.unit, Unit::Pixel, "render expects a pixel region");

    if region.is_degenerate() || source.is_empty() {
        return;
    }

    let dpr = if device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };

    let out_w = (region.width * dpr).round().max(1.0) as u32;
    let out_h = (region.height * dpr).round().max(1.0) as u32;
    surface.reset(out_w, out_h);

    // Pivot on the source image's natural center.
    let center_x = source.width as f64 / 2.0;
    let center_y = source.height as f64 / 2.0;

    let angle_rad = transform.rotate_degrees.to_radians();
    let (sin, cos) = (-angle_rad).sin_cos();
    let inv_scale = 1.0 / transform.scale;

    // Ellipse mask in output space: center and radii of the inscribed ellipse.
    let mask_cx = out_w as f64 / 2.0;
    let mask_cy = out_h as f64 / 2.0;
    let mask_rx = (out_w as f64 / 2.0).max(f64::EPSILON);
    let mask_ry = (out_h as f64 / 2.0).max(f64::EPSILON);

    for dst_y in 0..out_h {
        for dst_x in 0..out_w {
            // Sample at the pixel center for stable half-pixel alignment.
            let ox = dst_x as f64 + 0.5;
            let oy = dst_y as f64 + 0.5;

            if circular {
                let nx = (ox - mask_cx) / mask_rx;
                let ny = (oy - mask_cy) / mask_ry;
                if nx * nx + ny * ny > 1.0 {
                    continue; // outside the ellipse, stays black
                }
            }

            // Undo DPR scaling and the crop-origin translation.
            let px = ox / dpr + region.x;
            let py = oy / dpr + region.y;

            // Undo scale/rotation about the image center.
            let dx = px - center_x;
            let dy = py - center_y;
            let src_x = (dx * cos - dy * sin) * inv_scale + center_x;
            let src_y = (dx * sin + dy * cos) * inv_scale + center_y;

            let pixel = sample_bilinear(source, src_x - 0.5, src_y - 0.5);

            let dst_idx = ((dst_y * out_w + dst_x) * 3) as usize;
            surface.pixels[dst_idx] = pixel[0];
            surface.pixels[dst_idx + 1] = pixel[1];
            surface.pixels[dst_idx + 2] = pixel[2];
        }
    }
}

/// Get a pixel as [f64; 3] from the source at the given coordinates.
#[inline]
fn get_pixel_f64(source: &SourceImage, px: usize, py: usize) -> [f64; 3] {
    let idx = (py * source.width as usize + px) * 3;
    [
        source.pixels[idx] as f64,
        source.pixels[idx + 1] as f64,
        source.pixels[idx + 2] as f64,
    ]
}

/// Sample a pixel using bilinear interpolation.
///
/// Considers the 4 nearest pixels and weights their contribution by
/// distance. Out-of-bounds samples are black.
fn sample_bilinear(source: &SourceImage, x: f64, y: f64) -> [u8; 3] {
    let (w, h) = (source.width as i64, source.height as i64);

    if x < -1.0 || x >= w as f64 || y < -1.0 || y >= h as f64 {
        return [0, 0, 0];
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    // Clamp-to-edge addressing keeps the crop borders free of dark fringes.
    let cx0 = x0.clamp(0, w - 1) as usize;
    let cy0 = y0.clamp(0, h - 1) as usize;
    let cx1 = x1.clamp(0, w - 1) as usize;
    let cy1 = y1.clamp(0, h - 1) as usize;

    let p00 = get_pixel_f64(source, cx0, cy0);
    let p10 = get_pixel_f64(source, cx1, cy0);
    let p01 = get_pixel_f64(source, cx0, cy1);
    let p11 = get_pixel_f64(source, cx1, cy1);

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image where each pixel encodes its position.
    fn test_source(width: u32, height: u32) -> SourceImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x % 256) as u8);
                pixels.push((y % 256) as u8);
                pixels.push(128);
            }
        }
        SourceImage::new(width, height, pixels)
    }

    /// Uniform-color source.
    fn solid_source(width: u32, height: u32, rgb: [u8; 3]) -> SourceImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgb);
        }
        SourceImage::new(width, height, pixels)
    }

    fn identity() -> TransformState {
        TransformState::default()
    }

    #[test]
    fn test_render_sizes_surface_to_region() {
        let src = test_source(100, 100);
        let mut surface = Surface::new();
        let region = CropRegion::pixels(10.0, 10.0, 40.0, 20.0);

        render(&src, &mut surface, &region, &identity(), 1.0, false);

        assert_eq!(surface.width, 40);
        assert_eq!(surface.height, 20);
        assert_eq!(surface.pixels.len(), 40 * 20 * 3);
    }

    #[test]
    fn test_render_applies_device_pixel_ratio() {
        let src = test_source(100, 100);
        let mut surface = Surface::new();
        let region = CropRegion::pixels(0.0, 0.0, 50.0, 50.0);

        render(&src, &mut surface, &region, &identity(), 2.0, false);

        assert_eq!(surface.width, 100);
        assert_eq!(surface.height, 100);
    }

    #[test]
    fn test_render_zero_area_is_noop() {
        let src = test_source(100, 100);
        let mut surface = Surface::new();
        surface.reset(7, 7);
        surface.pixels.fill(42);
        let before = surface.pixels.clone();

        let region = CropRegion::pixels(10.0, 10.0, 0.0, 20.0);
        render(&src, &mut surface, &region, &identity(), 1.0, false);

        // Surface untouched.
        assert_eq!(surface.width, 7);
        assert_eq!(surface.pixels, before);
    }

    #[test]
    fn test_render_empty_source_is_noop() {
        let src = SourceImage::new(0, 0, vec![]);
        let mut surface = Surface::new();
        let region = CropRegion::pixels(0.0, 0.0, 10.0, 10.0);

        render(&src, &mut surface, &region, &identity(), 1.0, false);

        assert!(surface.is_empty());
    }

    #[test]
    fn test_render_identity_copies_region() {
        let src = test_source(64, 64);
        let mut surface = Surface::new();
        let region = CropRegion::pixels(16.0, 8.0, 32.0, 32.0);

        render(&src, &mut surface, &region, &identity(), 1.0, false);

        // With no scale/rotation each output pixel maps straight onto a
        // source pixel offset by the crop origin.
        for (dst_x, dst_y) in [(0u32, 0u32), (5, 7), (31, 31)] {
            let idx = ((dst_y * 32 + dst_x) * 3) as usize;
            assert_eq!(surface.pixels[idx], (16 + dst_x) as u8, "x at {dst_x},{dst_y}");
            assert_eq!(surface.pixels[idx + 1], (8 + dst_y) as u8, "y at {dst_x},{dst_y}");
        }
    }

    #[test]
    fn test_render_rotate_90_square_center_crop() {
        // rotate=90, scale=1, square crop on a square source: output is the
        // source rotated 90 degrees with no cropping loss at the center.
        let size = 40;
        let src = test_source(size, size);
        let mut surface = Surface::new();
        let region = CropRegion::pixels(0.0, 0.0, size as f64, size as f64);
        let transform = TransformState::new(1.0, 90.0);

        render(&src, &mut surface, &region, &transform, 1.0, false);

        assert_eq!(surface.width, size);
        assert_eq!(surface.height, size);

        // Spot-check interior pixels against a 90-degree rotation: the
        // pixel at output (x, y) comes from source (y, size-1-x).
        for (x, y) in [(10u32, 10u32), (20, 5), (5, 30)] {
            let idx = ((y * size + x) * 3) as usize;
            let expected_src_x = y;
            let expected_src_y = size - 1 - x;
            assert_eq!(surface.pixels[idx], expected_src_x as u8, "at {x},{y}");
            assert_eq!(surface.pixels[idx + 1], expected_src_y as u8, "at {x},{y}");
        }
    }

    #[test]
    fn test_render_scale_zooms_toward_center() {
        // Scaling 2x on a centered crop keeps the center pixel fixed.
        let src = test_source(41, 41);
        let mut surface = Surface::new();
        let region = CropRegion::pixels(0.0, 0.0, 41.0, 41.0);
        let transform = TransformState::new(2.0, 0.0);

        render(&src, &mut surface, &region, &transform, 1.0, false);

        let center_idx = ((20 * 41 + 20) * 3) as usize;
        assert_eq!(surface.pixels[center_idx], 20);
        assert_eq!(surface.pixels[center_idx + 1], 20);
    }

    #[test]
    fn test_render_circular_mask_blanks_corners() {
        let src = solid_source(50, 50, [200, 200, 200]);
        let mut surface = Surface::new();
        let region = CropRegion::pixels(0.0, 0.0, 50.0, 50.0);

        render(&src, &mut surface, &region, &identity(), 1.0, true);

        // Corners are outside the inscribed ellipse.
        assert_eq!(&surface.pixels[0..3], &[0, 0, 0]);
        let last = surface.pixels.len() - 3;
        assert_eq!(&surface.pixels[last..], &[0, 0, 0]);

        // Center is inside and keeps the source color.
        let center_idx = ((25 * 50 + 25) * 3) as usize;
        assert_eq!(&surface.pixels[center_idx..center_idx + 3], &[200, 200, 200]);
    }

    #[test]
    fn test_render_without_mask_keeps_corners() {
        let src = solid_source(50, 50, [200, 200, 200]);
        let mut surface = Surface::new();
        let region = CropRegion::pixels(0.0, 0.0, 50.0, 50.0);

        render(&src, &mut surface, &region, &identity(), 1.0, false);

        assert_eq!(&surface.pixels[0..3], &[200, 200, 200]);
    }

    #[test]
    fn test_render_region_outside_source_is_black() {
        let src = solid_source(20, 20, [255, 255, 255]);
        let mut surface = Surface::new();
        // Crop that extends well past the source bounds.
        let region = CropRegion::pixels(15.0, 15.0, 30.0, 30.0);

        render(&src, &mut surface, &region, &identity(), 1.0, false);

        // Far corner maps outside the source, so it's black.
        let last = surface.pixels.len() - 3;
        assert_eq!(&surface.pixels[last..], &[0, 0, 0]);
        // Near corner still lands on the source.
        assert_eq!(&surface.pixels[0..3], &[255, 255, 255]);
    }

    #[test]
    fn test_render_repeated_is_stable() {
        let src = test_source(60, 40);
        let region = CropRegion::pixels(5.0, 5.0, 30.0, 20.0);
        let transform = TransformState::new(1.3, 17.0);

        let mut a = Surface::new();
        let mut b = Surface::new();
        render(&src, &mut a, &region, &transform, 1.5, false);
        render(&src, &mut b, &region, &transform, 1.5, false);

        assert_eq!(a.pixels, b.pixels);
        assert_eq!((a.width, a.height), (b.width, b.height));
    }

    #[test]
    fn test_render_invalid_dpr_falls_back_to_one() {
        let src = test_source(30, 30);
        let mut surface = Surface::new();
        let region = CropRegion::pixels(0.0, 0.0, 10.0, 10.0);

        render(&src, &mut surface, &region, &identity(), 0.0, false);

        assert_eq!(surface.width, 10);
        assert_eq!(surface.height, 10);
    }

    #[test]
    fn test_bilinear_interpolates_midpoint() {
        let mut src = solid_source(2, 1, [0, 0, 0]);
        src.pixels[3] = 100; // second pixel R = 100

        let sample = sample_bilinear(&src, 0.5, 0.0);
        assert_eq!(sample[0], 50);
    }

    #[test]
    fn test_bilinear_out_of_bounds_black() {
        let src = solid_source(4, 4, [255, 255, 255]);
        assert_eq!(sample_bilinear(&src, -5.0, 0.0), [0, 0, 0]);
        assert_eq!(sample_bilinear(&src, 0.0, 100.0), [0, 0, 0]);
    }

    #[test]
    fn test_bilinear_clamps_at_edges() {
        let src = solid_source(4, 4, [90, 90, 90]);
        // Just inside the right edge still samples the edge color.
        assert_eq!(sample_bilinear(&src, 3.4, 3.4), [90, 90, 90]);
    }
}
