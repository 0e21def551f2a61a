//! nitro_palette: representative color palettes from raw image buffers.
//!
//! Pipeline, leaves first:
//!
//! 1. [`pixels`] validates a raw buffer and streams sampled pixels
//!    (every Nth pixel on both axes, transparent and optionally white
//!    pixels dropped).
//! 2. [`quantize`] reduces the samples to at most K clusters, median-cut by
//!    default.
//! 3. [`rank`] orders clusters by coverage and folds near-duplicates.
//! 4. [`encode`] produces `{red, green, blue, weight}` records.
//!
//! [`extract()`] runs all four stages. Each call owns all of its state, so
//! concurrent extractions of different images need no coordination.
//!
//! ```
//! use nitro_palette::{ExtractionConfig, PixelFormat, RawImage, extract};
//!
//! // 2x2 RGBA: red, red, blue, green
//! let pixels = [
//!     255, 0, 0, 255, 255, 0, 0, 255,
//!     0, 0, 255, 255, 0, 255, 0, 255,
//! ];
//! let config = ExtractionConfig::builder().palette_size(2).build();
//! let palette = extract(RawImage::new(&pixels, 2, 2, PixelFormat::Rgba8), &config).unwrap();
//!
//! let weights: f64 = palette.records().iter().map(|r| r.weight).sum();
//! assert!((weights - 1.0).abs() < 1e-9);
//! ```
//!
//! The [`bridge`] module exposes the same entry point to a JavaScript host
//! through `wasm-bindgen`.

pub mod bridge;
pub mod color;
pub mod config;
pub mod encode;
pub mod error;
pub mod extract;
pub mod pixels;
pub mod quantize;
pub mod rank;

pub use config::{Algorithm, DistanceMetric, ExtractionConfig, ExtractionConfigBuilder};
pub use encode::{ColorNotation, PaletteRecord};
pub use error::{ErrorKind, ExtractError, Result};
pub use extract::{Extraction, ExtractionResult, ExtractionState, extract};
pub use pixels::{PixelBuffer, PixelFormat, PixelSample, RawImage, SampleFilter};
pub use rank::PaletteEntry;
