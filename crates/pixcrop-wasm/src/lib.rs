//! Pixcrop WASM - WebAssembly bindings for Pixcrop
//!
//! This crate exposes the pixcrop-core crop pipeline to JavaScript/
//! TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for image data
//! - `session` - The interactive crop session binding
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropSession } from '@pixcrop/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const session = new JsCropSession({ aspect: 16 / 9, quality: 85 });
//! session.load_source(new Uint8Array(await file.arrayBuffer()));
//! session.set_region({ x: 10, y: 10, width: 50, height: 50, unit: "percent" }, performance.now());
//!
//! // Drive from the event loop; an update carries the fresh preview.
//! const update = session.poll(performance.now());
//! if (update) imgEl.src = update.url;
//! ```

use wasm_bindgen::prelude::*;

mod session;
mod types;

// Re-export public types
pub use session::{JsCropSession, JsPreviewUpdate};
pub use types::{decode_source, JsSourceImage};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: Set up panic hook for better error messages in browser console
    // when console_error_panic_hook feature is added
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
