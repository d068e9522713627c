//! Crop session WASM bindings.
//!
//! Exposes [`pixcrop_core::session::CropSession`] to JavaScript. The host
//! event loop supplies timestamps as `performance.now()` milliseconds and
//! drives `poll`; within WASM the encode completes synchronously inside
//! `poll`, so each call either returns a fresh [`JsPreviewUpdate`] or
//! `undefined`. (Native hosts can drive the job-based core API directly to
//! overlap encodes; single-threaded WASM has nothing to overlap with.)
//!
//! # Example
//!
//! ```typescript
//! const session = new JsCropSession({ aspect: 1.0, circular_crop: true });
//! session.load_source(bytes);
//! session.set_scale(1.25, performance.now());
//!
//! function tick(nowMs) {
//!   const update = session.poll(nowMs);
//!   if (update) {
//!     previewImg.src = update.url;   // previous URL already revoked
//!   }
//!   requestAnimationFrame(tick);
//! }
//! ```

use std::time::Duration;

use pixcrop_core::geometry::CropRegion;
use pixcrop_core::session::{CropSession, PublishOutcome, SessionOptions, SessionState};
use wasm_bindgen::prelude::*;

/// Convert a `performance.now()`-style millisecond timestamp into the
/// core's epoch-relative `Duration`.
fn duration_from_ms(now_ms: f64) -> Duration {
    Duration::from_secs_f64(now_ms.max(0.0) / 1000.0)
}

/// A freshly published preview.
#[wasm_bindgen]
pub struct JsPreviewUpdate {
    version: u64,
    url: String,
    blob: Vec<u8>,
}

#[wasm_bindgen]
impl JsPreviewUpdate {
    /// Session version the preview was encoded at.
    #[wasm_bindgen(getter)]
    pub fn version(&self) -> f64 {
        self.version as f64
    }

    /// Revocable reference for the preview blob. Valid until the next
    /// update (or teardown) revokes it.
    #[wasm_bindgen(getter)]
    pub fn url(&self) -> String {
        self.url.clone()
    }

    /// Encoded image bytes.
    #[wasm_bindgen(getter)]
    pub fn blob(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(&self.blob[..])
    }
}

/// An interactive crop session.
#[wasm_bindgen]
pub struct JsCropSession {
    inner: CropSession,
}

#[wasm_bindgen]
impl JsCropSession {
    /// Create a session.
    ///
    /// # Arguments
    ///
    /// * `options` - Plain object matching `SessionOptions` (all fields
    ///   optional), or `undefined` for defaults. Recognized keys:
    ///   `aspect`, `circular_crop`, `enable_scale`, `enable_rotate`,
    ///   `show_preview`, `quiet_period_ms`, `mime`, `quality`,
    ///   `device_pixel_ratio`.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsCropSession, JsValue> {
        let options = if options.is_undefined() || options.is_null() {
            SessionOptions::default()
        } else {
            serde_wasm_bindgen::from_value::<SessionOptions>(options)
                .map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        Ok(JsCropSession {
            inner: CropSession::new(options),
        })
    }

    /// Load a source image (PNG or JPEG bytes), replacing any current one.
    ///
    /// # Errors
    ///
    /// Rejects on decode failure; the prior session state stays usable.
    pub fn load_source(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner.load_source(bytes).map_err(|e| {
            web_sys::console::warn_1(&format!("pixcrop: load failed: {e}").into());
            JsValue::from_str(&e.to_string())
        })
    }

    /// Commit a crop region (a settle event).
    ///
    /// # Arguments
    ///
    /// * `region` - `{ x, y, width, height, unit: "percent" | "pixel" }`
    /// * `now_ms` - `performance.now()` timestamp
    pub fn set_region(&mut self, region: JsValue, now_ms: f64) -> Result<(), JsValue> {
        let region = serde_wasm_bindgen::from_value::<CropRegion>(region)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.set_region(region, duration_from_ms(now_ms));
        Ok(())
    }

    /// Change the zoom factor (ignored when disabled by options).
    pub fn set_scale(&mut self, scale: f64, now_ms: f64) {
        self.inner.set_scale(scale, duration_from_ms(now_ms));
    }

    /// Change the rotation in degrees (ignored when disabled by options).
    pub fn set_rotation(&mut self, degrees: f64, now_ms: f64) {
        self.inner.set_rotation(degrees, duration_from_ms(now_ms));
    }

    /// Drive the session from the event loop.
    ///
    /// Returns a [`JsPreviewUpdate`] when a debounced recompute completed,
    /// `undefined` otherwise.
    ///
    /// # Errors
    ///
    /// Rejects when encoding fails; the previously published preview URL
    /// remains valid.
    pub fn poll(&mut self, now_ms: f64) -> Result<Option<JsPreviewUpdate>, JsValue> {
        let Some(job) = self.inner.poll(duration_from_ms(now_ms)) else {
            return Ok(None);
        };

        let version = job.version();
        let frame = job.run().map_err(|e| {
            self.inner.encode_failed();
            web_sys::console::warn_1(&format!("pixcrop: encode failed: {e}").into());
            JsValue::from_str(&e.to_string())
        })?;

        match self.inner.publish(frame) {
            PublishOutcome::Published => Ok(self.inner.preview().map(|preview| JsPreviewUpdate {
                version,
                url: preview.url.clone(),
                blob: preview.blob.clone(),
            })),
            // Unreachable in the synchronous binding, but harmless.
            PublishOutcome::Stale => Ok(None),
        }
    }

    /// Current crop region as `{ x, y, width, height, unit }`, or
    /// `undefined` when no source is loaded.
    pub fn region(&self) -> Result<JsValue, JsValue> {
        match self.inner.region() {
            Some(region) => {
                serde_wasm_bindgen::to_value(region).map_err(|e| JsValue::from_str(&e.to_string()))
            }
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// The live preview URL, if one has been published.
    pub fn preview_url(&self) -> Option<String> {
        self.inner.preview().map(|p| p.url.clone())
    }

    /// Current session state: `"idle"`, `"ready"`, `"debouncing"` or
    /// `"exporting"`.
    pub fn state(&self) -> String {
        match self.inner.state() {
            SessionState::Idle => "idle",
            SessionState::Ready => "ready",
            SessionState::Debouncing => "debouncing",
            SessionState::Exporting => "exporting",
        }
        .to_string()
    }

    /// Natural source width, or 0 when idle.
    pub fn source_width(&self) -> u32 {
        self.inner.source_dimensions().map_or(0, |(w, _)| w)
    }

    /// Natural source height, or 0 when idle.
    pub fn source_height(&self) -> u32 {
        self.inner.source_dimensions().map_or(0, |(_, h)| h)
    }

    /// Drop the source and return to idle, revoking the live preview URL.
    pub fn clear_source(&mut self) {
        self.inner.clear_source();
    }

    /// End the session: cancel pending work and revoke the live preview
    /// URL. Call before dropping the handle on unmount.
    pub fn teardown(&mut self) {
        self.inner.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_ms() {
        assert_eq!(duration_from_ms(0.0), Duration::ZERO);
        assert_eq!(duration_from_ms(1500.0), Duration::from_millis(1500));
        // Negative clock skew clamps to the epoch.
        assert_eq!(duration_from_ms(-10.0), Duration::ZERO);
    }
}
