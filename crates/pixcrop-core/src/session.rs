//! The interactive crop session.
//!
//! Ties the pipeline together: a decoded source, the current crop region
//! and transform, the debounce scheduler, the rasterizer, and the export
//! pipeline with its preview-URL ownership contract.
//!
//! # State machine
//!
//! `Idle → Ready → Debouncing → Exporting → Ready`, with `Ready` reentrant
//! on every settle event and `Idle` both initial and terminal. Loading and
//! rendering complete within the synchronous calls that perform them
//! (`load_source`, `poll`), so only the four states above are observable
//! between calls.
//!
//! # Concurrency model
//!
//! Single-threaded and cooperative. The caller's event loop supplies every
//! timestamp and drives [`CropSession::poll`]; the only asynchronous
//! boundary is the encode, modeled as an [`EncodeJob`] the host completes
//! whenever it likes. A job already handed out cannot be cancelled — it is
//! version-gated at [`CropSession::publish`] instead, so a slow encode that
//! resolves after a newer one (or after teardown) is discarded, never
//! published, and never revokes anything.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::debounce::DebounceScheduler;
use crate::decode::{decode_image, DecodeError, SourceImage};
use crate::encode::{encode_pixels, EncodeError, ImageMime};
use crate::geometry::{center_crop, to_pixel_region, CropRegion, TransformState};
use crate::preview::{PreviewHandle, PreviewUrls};
use crate::raster::{render, Surface};

/// Errors surfaced by session operations.
///
/// All failures are local to the session; none are fatal to the caller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The supplied source file could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The preview blob could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Recognized session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Locked aspect ratio (width/height); `None` permits freeform crops.
    pub aspect: Option<f64>,
    /// Mask the output as an ellipse (display/encode hint).
    pub circular_crop: bool,
    /// Whether scale changes are accepted.
    pub enable_scale: bool,
    /// Whether rotation changes are accepted.
    pub enable_rotate: bool,
    /// Whether the caller keeps the rendered surface visible.
    pub show_preview: bool,
    /// Debounce quiet period in milliseconds.
    pub quiet_period_ms: u64,
    /// Export encoding format.
    pub mime: ImageMime,
    /// Export quality (JPEG only, 1-100).
    pub quality: u8,
    /// Display scaling factor applied to the preview surface.
    pub device_pixel_ratio: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            aspect: None,
            circular_crop: false,
            enable_scale: true,
            enable_rotate: true,
            show_preview: true,
            quiet_period_ms: 100,
            mime: ImageMime::Jpeg,
            quality: 90,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Observable session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No source selected (initial, and terminal after teardown).
    #[default]
    Idle,
    /// Source loaded, no recompute pending.
    Ready,
    /// Dependency changed, quiet period running.
    Debouncing,
    /// An encode job has been handed to the host and not yet resolved.
    Exporting,
}

/// A snapshot of the rendered surface, tagged with the session version it
/// was taken at. The host runs it (the asynchronous encode boundary) and
/// hands the resulting frame back to [`CropSession::publish`].
#[derive(Debug)]
pub struct EncodeJob {
    version: u64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    mime: ImageMime,
    quality: u8,
}

impl EncodeJob {
    /// The session version this job was created at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Output dimensions of the frame being encoded.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Encode the snapshot into a frame.
    ///
    /// # Errors
    ///
    /// Propagates [`EncodeError`]; the session's previously published
    /// preview stays valid (report the failure via
    /// [`CropSession::encode_failed`]).
    pub fn run(self) -> Result<EncodedFrame, EncodeError> {
        let blob = encode_pixels(&self.pixels, self.width, self.height, self.mime, self.quality)?;
        Ok(EncodedFrame {
            version: self.version,
            blob,
        })
    }
}

/// A completed encode, ready to publish.
#[derive(Debug)]
pub struct EncodedFrame {
    version: u64,
    blob: Vec<u8>,
}

impl EncodedFrame {
    /// The session version the frame was encoded at.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Result of handing a frame back to the session.
#[derive(Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The frame was current and is now the live preview.
    Published,
    /// The frame was superseded before it resolved; it was dropped without
    /// minting a URL and without touching the live preview.
    Stale,
}

/// An interactive crop session.
pub struct CropSession {
    options: SessionOptions,
    state: SessionState,
    source: Option<SourceImage>,
    region: Option<CropRegion>,
    transform: TransformState,
    scheduler: DebounceScheduler,
    surface: Surface,
    urls: PreviewUrls,
    preview: Option<PreviewHandle>,
    /// Monotonic dependency version; every change, load and teardown bumps
    /// it, staling any encode job created earlier.
    version: u64,
}

impl CropSession {
    /// Create an idle session with the given options.
    pub fn new(options: SessionOptions) -> Self {
        let scheduler = DebounceScheduler::new(Duration::from_millis(options.quiet_period_ms));
        Self {
            options,
            state: SessionState::Idle,
            source: None,
            region: None,
            transform: TransformState::default(),
            scheduler,
            surface: Surface::new(),
            urls: PreviewUrls::new(),
            preview: None,
            version: 0,
        }
    }

    /// Current observable state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session configuration.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Current crop region, if a source is loaded.
    pub fn region(&self) -> Option<&CropRegion> {
        self.region.as_ref()
    }

    /// Current transform.
    pub fn transform(&self) -> TransformState {
        self.transform
    }

    /// Natural dimensions of the loaded source.
    pub fn source_dimensions(&self) -> Option<(u32, u32)> {
        self.source.as_ref().map(|s| (s.width, s.height))
    }

    /// The live preview, if one has been published.
    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    /// The most recently rendered surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Preview reference accounting (live/minted/revoked counts).
    pub fn urls(&self) -> &PreviewUrls {
        &self.urls
    }

    /// Current dependency version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Load a new source image, replacing any existing one.
    ///
    /// On success the crop auto-centers to the configured aspect ratio,
    /// pending debounced work is cancelled, any in-flight encode is staled,
    /// and the previously published preview reference is revoked.
    ///
    /// # Errors
    ///
    /// A decode failure leaves the session exactly as it was: prior source,
    /// region and preview all remain usable.
    pub fn load_source(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let source = decode_image(bytes)?;

        self.scheduler.cancel();
        self.version += 1;
        self.revoke_preview();

        self.region = Some(center_crop(
            self.options.aspect,
            source.width as f64,
            source.height as f64,
        ));
        self.transform = TransformState::default();
        self.source = Some(source);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Drop the source and return to `Idle`, with the same cancellation and
    /// revocation duties as [`CropSession::teardown`].
    pub fn clear_source(&mut self) {
        self.teardown();
    }

    /// Commit a new crop region (a "settle" event) and re-arm the debounce.
    ///
    /// Ignored while no source is loaded.
    pub fn set_region(&mut self, region: CropRegion, now: Duration) {
        if self.source.is_none() {
            return;
        }
        self.region = Some(region);
        self.touch(now);
    }

    /// Change the zoom factor. Ignored when scaling is disabled by options
    /// or no source is loaded.
    pub fn set_scale(&mut self, scale: f64, now: Duration) {
        if self.source.is_none() || !self.options.enable_scale {
            return;
        }
        self.transform = TransformState::new(scale, self.transform.rotate_degrees);
        self.touch(now);
    }

    /// Change the rotation. Ignored when rotation is disabled by options or
    /// no source is loaded.
    pub fn set_rotation(&mut self, degrees: f64, now: Duration) {
        if self.source.is_none() || !self.options.enable_rotate {
            return;
        }
        self.transform = TransformState::new(self.transform.scale, degrees);
        self.touch(now);
    }

    /// Drive the state machine from the host event loop.
    ///
    /// When the quiet period has elapsed since the last change, renders the
    /// preview surface and returns an [`EncodeJob`] tagged with the current
    /// version. A degenerate (zero-area) region is a silent no-op back to
    /// `Ready`. Returns `None` whenever there is nothing to do.
    pub fn poll(&mut self, now: Duration) -> Option<EncodeJob> {
        if !self.scheduler.fire(now) {
            return None;
        }

        let source = self.source.as_ref()?;
        let region = self.region.as_ref()?;
        let pixel_region = to_pixel_region(region, source.width, source.height);

        if pixel_region.is_degenerate() {
            self.state = SessionState::Ready;
            return None;
        }

        render(
            source,
            &mut self.surface,
            &pixel_region,
            &self.transform,
            self.options.device_pixel_ratio,
            self.options.circular_crop,
        );

        self.state = SessionState::Exporting;
        Some(EncodeJob {
            version: self.version,
            width: self.surface.width,
            height: self.surface.height,
            pixels: self.surface.pixels.clone(),
            mime: self.options.mime,
            quality: self.options.quality,
        })
    }

    /// Publish a completed frame.
    ///
    /// A frame whose version no longer matches the session's is stale: it
    /// is dropped without minting a reference and nothing live is revoked.
    /// A current frame becomes the live preview and exactly the superseded
    /// reference is revoked.
    pub fn publish(&mut self, frame: EncodedFrame) -> PublishOutcome {
        if frame.version != self.version {
            return PublishOutcome::Stale;
        }

        let url = self.urls.mint();
        let previous = self.preview.replace(PreviewHandle {
            blob: frame.blob,
            url,
        });
        if let Some(previous) = previous {
            self.urls.revoke(&previous.url);
        }
        self.state = SessionState::Ready;
        PublishOutcome::Published
    }

    /// Report a failed encode for the job most recently handed out.
    ///
    /// The previously published preview stays valid; the session returns to
    /// `Ready` so the user can retry by re-interacting.
    pub fn encode_failed(&mut self) {
        if self.state == SessionState::Exporting {
            self.state = SessionState::Ready;
        }
    }

    /// End the session: cancel pending debounced work, stale any in-flight
    /// encode, revoke the last published preview reference, drop the source.
    pub fn teardown(&mut self) {
        self.scheduler.cancel();
        self.version += 1;
        self.revoke_preview();
        self.source = None;
        self.region = None;
        self.transform = TransformState::default();
        self.surface = Surface::new();
        self.state = SessionState::Idle;
    }

    /// Bump the version and re-arm the debounce for a dependency change.
    fn touch(&mut self, now: Duration) {
        self.version += 1;
        self.scheduler.notify(now);
        self.state = SessionState::Debouncing;
    }

    /// Revoke the live preview reference, if any. Release-before-replace:
    /// only ever called with the reference actually being superseded.
    fn revoke_preview(&mut self) {
        if let Some(handle) = self.preview.take() {
            self.urls.revoke(&handle.url);
        }
    }
}
