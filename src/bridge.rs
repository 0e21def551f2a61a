//! JavaScript host bridge.
//!
//! Thin `wasm-bindgen` wrappers around [`extract`]. The host passes raw RGBA
//! pixels (as read back from a decoded image) plus dimensions; nothing here
//! holds global state. A host that wants fixed settings constructs a
//! [`PaletteExtractor`] once and reuses it.

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::config::ExtractionConfig;
use crate::encode::ColorNotation;
use crate::extract::{ExtractionResult, extract};
use crate::pixels::{PixelFormat, RawImage};

const MIN_COLOR_COUNT: f64 = 1.0;
const MAX_COLOR_COUNT: f64 = 256.0;
const MIN_QUALITY: f64 = 1.0;
const MAX_QUALITY: f64 = 10.0;

fn clamp_host(v: f64, lo: f64, hi: f64, default: f64) -> f64 {
    if v.is_nan() { default } else { v.clamp(lo, hi) }
}

/// Host `quality` is a linear step over the pixel list: one pixel in
/// `quality` is visited. The stride here applies to both axes, so the
/// stride is the square root of `quality` to keep about the same density.
fn stride_for_quality(quality: usize) -> usize {
    ((quality as f64).sqrt().round() as usize).max(1)
}

/// Host-facing settings, clamped the same way the JS API documents them:
/// `colorCount` 1..=256 and `quality` 1..=10.
fn host_config(color_count: f64, quality: usize, ignore_white: bool) -> ExtractionConfig {
    ExtractionConfig::builder()
        .palette_size(clamp_host(color_count, MIN_COLOR_COUNT, MAX_COLOR_COUNT, 5.0) as usize)
        .sampling_stride(stride_for_quality(quality))
        .ignore_white(ignore_white)
        .build()
}

fn host_quality(quality: f64) -> usize {
    clamp_host(quality, MIN_QUALITY, MAX_QUALITY, MAX_QUALITY) as usize
}

fn run(config: &ExtractionConfig, pixels: &[u8], width: u32, height: u32) -> Result<ExtractionResult, JsValue> {
    extract(RawImage::new(pixels, width, height, PixelFormat::Rgba8), config)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn css_array(result: &ExtractionResult) -> Array {
    let out = Array::new();
    for s in result.to_strings(ColorNotation::Css) {
        out.push(&JsValue::from_str(&s));
    }
    out
}

fn record_array(result: &ExtractionResult) -> Result<Array, JsValue> {
    let out = Array::new();
    for record in result.records() {
        let obj = Object::new();
        Reflect::set(&obj, &JsValue::from_str("red"), &JsValue::from(record.red))?;
        Reflect::set(&obj, &JsValue::from_str("green"), &JsValue::from(record.green))?;
        Reflect::set(&obj, &JsValue::from_str("blue"), &JsValue::from(record.blue))?;
        Reflect::set(&obj, &JsValue::from_str("weight"), &JsValue::from(record.weight))?;
        out.push(&obj);
    }
    Ok(out)
}

/// Palette as `rgb(r,g,b)` strings, most dominant first.
#[wasm_bindgen(js_name = extractColors)]
pub fn extract_colors(
    pixels: &[u8],
    width: u32,
    height: u32,
    color_count: f64,
    quality: f64,
    ignore_white: bool,
) -> Result<Array, JsValue> {
    let config = host_config(color_count, host_quality(quality), ignore_white);
    run(&config, pixels, width, height).map(|r| css_array(&r))
}

/// Palette as `{red, green, blue, weight}` objects, most dominant first.
#[wasm_bindgen(js_name = extractPalette)]
pub fn extract_palette(
    pixels: &[u8],
    width: u32,
    height: u32,
    color_count: f64,
    quality: f64,
    ignore_white: bool,
) -> Result<Array, JsValue> {
    let config = host_config(color_count, host_quality(quality), ignore_white);
    record_array(&run(&config, pixels, width, height)?)
}

/// Explicitly constructed extractor handle for hosts that reuse one setting.
#[wasm_bindgen]
pub struct PaletteExtractor {
    config: ExtractionConfig,
    quality: usize,
}

#[wasm_bindgen]
impl PaletteExtractor {
    #[wasm_bindgen(constructor)]
    pub fn new(color_count: f64, quality: f64, ignore_white: bool) -> PaletteExtractor {
        let quality = host_quality(quality);
        PaletteExtractor {
            config: host_config(color_count, quality, ignore_white),
            quality,
        }
    }

    #[wasm_bindgen(js_name = extractColors)]
    pub fn extract_colors(&self, pixels: &[u8], width: u32, height: u32) -> Result<Array, JsValue> {
        run(&self.config, pixels, width, height).map(|r| css_array(&r))
    }

    #[wasm_bindgen(js_name = extractPalette)]
    pub fn extract_palette(&self, pixels: &[u8], width: u32, height: u32) -> Result<Array, JsValue> {
        record_array(&run(&self.config, pixels, width, height)?)
    }

    #[wasm_bindgen(getter, js_name = colorCount)]
    pub fn color_count(&self) -> usize {
        self.config.palette_size()
    }

    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> usize {
        self.quality
    }
}
