//! Pixcrop Core - Interactive crop preview pipeline
//!
//! This crate provides the processing core behind an interactive image-crop
//! editor: crop-region geometry, a software rasterizer for the preview
//! surface, a debounce scheduler that coalesces bursts of edits, and an
//! export pipeline with an explicit preview-reference ownership contract.
//!
//! The crate is pure and single-threaded: the embedding event loop supplies
//! timestamps and drives [`session::CropSession::poll`], and completes
//! encode jobs at the one asynchronous boundary the pipeline has.

pub mod debounce;
pub mod decode;
pub mod encode;
pub mod geometry;
pub mod preview;
pub mod raster;
pub mod session;

pub use debounce::{DebounceScheduler, DEFAULT_QUIET_PERIOD};
pub use decode::{decode_image, DecodeError, SourceImage};
pub use encode::{encode_pixels, encode_surface, EncodeError, ImageMime};
pub use geometry::{center_crop, to_pixel_region, CropRegion, TransformState, Unit};
pub use preview::{PreviewHandle, PreviewUrls};
pub use raster::{render, Surface};
pub use session::{
    CropSession, EncodeJob, EncodedFrame, PublishOutcome, SessionError, SessionOptions,
    SessionState,
};
