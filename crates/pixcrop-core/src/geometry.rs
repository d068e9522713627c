//! Crop-region geometry.
//!
//! This module provides the pure math that turns a target aspect ratio and a
//! container size into a centered crop region, and converts regions between
//! percentage and pixel units.
//!
//! # Coordinate System
//!
//! - (0, 0) = top-left corner
//! - Percent regions are relative to the container / natural image size
//!   (0.0 to 100.0 per axis)
//! - Pixel regions are absolute device-independent pixels
//!
//! # Rounding
//!
//! Percent-to-pixel conversion uses `.round()` (half away from zero) and is
//! applied exactly once: a region already in pixel units passes through
//! unchanged, so the conversion is idempotent.

use serde::{Deserialize, Serialize};

/// Fraction of the limiting container dimension covered by the initial
/// auto-centered crop.
const CENTER_CROP_COVERAGE: f64 = 0.9;

/// Unit a [`CropRegion`] is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Relative to the natural dimensions, 0.0 to 100.0 per axis.
    #[default]
    Percent,
    /// Absolute pixels.
    Pixel,
}

/// A rectangular crop selection.
///
/// Regions are value types: every drag/resize event produces a new region
/// rather than mutating a committed one in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Region width. Must be > 0 for a usable region.
    pub width: f64,
    /// Region height. Must be > 0 for a usable region.
    pub height: f64,
    /// Unit the fields are expressed in.
    pub unit: Unit,
}

impl CropRegion {
    /// Create a percent-unit region.
    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: Unit::Percent,
        }
    }

    /// Create a pixel-unit region.
    pub fn pixels(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: Unit::Pixel,
        }
    }

    /// A region that cannot produce output (zero or negative area).
    ///
    /// Degenerate regions show up transiently while the user is dragging;
    /// downstream stages treat them as a silent no-op rather than an error.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// The region's aspect ratio (width / height), if it has one.
    pub fn aspect(&self) -> Option<f64> {
        if self.is_degenerate() {
            None
        } else {
            Some(self.width / self.height)
        }
    }
}

/// Compute a centered crop region for a container.
///
/// The region covers [`CENTER_CROP_COVERAGE`] (90%) of the limiting
/// dimension and is centered in the container. With an aspect ratio the
/// region satisfies `width / height == aspect` (in pixel terms) within
/// floating-point tolerance; without one, cropping is freeform and the
/// region simply covers 90% of both dimensions.
///
/// # Arguments
///
/// * `aspect` - Target width/height ratio, or `None` for freeform
/// * `container_width` - Container width in pixels (> 0)
/// * `container_height` - Container height in pixels (> 0)
///
/// # Returns
///
/// A percent-unit [`CropRegion`].
///
/// # Example
///
/// ```
/// use pixcrop_core::geometry::center_crop;
///
/// // 16:9 crop in a 16:9 container fills 90% of both axes
/// let region = center_crop(Some(16.0 / 9.0), 1600.0, 900.0);
/// assert!((region.width - 90.0).abs() < 1e-9);
/// assert!((region.x - 5.0).abs() < 1e-9);
/// ```
pub fn center_crop(aspect: Option<f64>, container_width: f64, container_height: f64) -> CropRegion {
    let (w, h) = (container_width.max(1.0), container_height.max(1.0));

    let (crop_w, crop_h) = match aspect {
        Some(aspect) if aspect > 0.0 => {
            // Start from 90% of the width, shrink if the implied height
            // overflows 90% of the container height.
            let mut crop_w = CENTER_CROP_COVERAGE * w;
            let mut crop_h = crop_w / aspect;
            let max_h = CENTER_CROP_COVERAGE * h;
            if crop_h > max_h {
                crop_h = max_h;
                crop_w = crop_h * aspect;
            }
            (crop_w, crop_h)
        }
        // Freeform (or nonsense aspect): no ratio constraint.
        _ => (CENTER_CROP_COVERAGE * w, CENTER_CROP_COVERAGE * h),
    };

    CropRegion::percent(
        (w - crop_w) / 2.0 / w * 100.0,
        (h - crop_h) / 2.0 / h * 100.0,
        crop_w / w * 100.0,
        crop_h / h * 100.0,
    )
}

/// Convert a region to pixel units against the given natural dimensions.
///
/// Percent regions are scaled, rounded with `.round()`, and clamped to the
/// image bounds. Pixel regions are returned unchanged, which makes repeated
/// conversion idempotent.
///
/// # Arguments
///
/// * `region` - Region in either unit
/// * `natural_width` - Source image width in pixels
/// * `natural_height` - Source image height in pixels
///
/// # Example
///
/// ```
/// use pixcrop_core::geometry::{to_pixel_region, CropRegion};
///
/// let pct = CropRegion::percent(25.0, 25.0, 50.0, 50.0);
/// let px = to_pixel_region(&pct, 200, 100);
/// assert_eq!(px.x, 50.0);
/// assert_eq!(px.width, 100.0);
/// ```
pub fn to_pixel_region(region: &CropRegion, natural_width: u32, natural_height: u32) -> CropRegion {
    if region.unit == Unit::Pixel {
        return *region;
    }

    let nw = natural_width as f64;
    let nh = natural_height as f64;

    let x = (region.x.clamp(0.0, 100.0) / 100.0 * nw).round();
    let y = (region.y.clamp(0.0, 100.0) / 100.0 * nh).round();
    let width = (region.width.clamp(0.0, 100.0) / 100.0 * nw).round();
    let height = (region.height.clamp(0.0, 100.0) / 100.0 * nh).round();

    // Clamp so the region stays inside the image after rounding.
    let x = x.min(nw);
    let y = y.min(nh);
    let width = width.min(nw - x);
    let height = height.min(nh - y);

    CropRegion::pixels(x, y, width, height)
}

/// Scale and rotation applied jointly with the crop region.
///
/// Owned by the interactive session; independent of the region. Both feed
/// the rasterizer together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    /// Zoom factor, always > 0.
    pub scale: f64,
    /// Rotation in degrees, -180.0 to 180.0.
    pub rotate_degrees: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotate_degrees: 0.0,
        }
    }
}

impl TransformState {
    /// Smallest accepted scale factor.
    pub const MIN_SCALE: f64 = 0.01;

    /// Create a transform, clamping both fields into their valid ranges.
    pub fn new(scale: f64, rotate_degrees: f64) -> Self {
        Self {
            scale: scale.max(Self::MIN_SCALE),
            rotate_degrees: rotate_degrees.clamp(-180.0, 180.0),
        }
    }

    /// True when the transform leaves the image untouched.
    pub fn is_identity(&self) -> bool {
        (self.scale - 1.0).abs() < f64::EPSILON && self.rotate_degrees.abs() < f64::EPSILON
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
