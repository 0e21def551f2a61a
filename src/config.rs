//! Extraction configuration.
//!
//! An [`ExtractionConfig`] is fixed for the duration of one extraction. Values
//! are clamped into range on construction, the same way the JS host clamps
//! `colorCount` and `quality` before calling into native code.

use serde::{Deserialize, Serialize};

pub use crate::color::DistanceMetric;

pub const MIN_PALETTE_SIZE: usize = 1;
pub const MAX_PALETTE_SIZE: usize = 256;
pub const DEFAULT_PALETTE_SIZE: usize = 5;
/// Samples with alpha at or below this value count as transparent.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 125;

/// Quantization strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Recursive median-cut over the RGB cube. Deterministic tie-breaks.
    #[default]
    MedianCut,
    /// K-means in CIELAB with a fixed seed.
    KMeans,
}

/// Immutable settings for one extraction.
///
/// Deserialized values are clamped exactly like builder values; missing
/// fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigFields")]
pub struct ExtractionConfig {
    palette_size: usize,
    sampling_stride: usize,
    metric: DistanceMetric,
    merge_threshold: f64,
    algorithm: Algorithm,
    ignore_white: bool,
    alpha_threshold: u8,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            palette_size: DEFAULT_PALETTE_SIZE,
            sampling_stride: 1,
            metric: DistanceMetric::default(),
            merge_threshold: 0.0,
            algorithm: Algorithm::default(),
            ignore_white: false,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
        }
    }
}

impl ExtractionConfig {
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Start a builder seeded with this configuration.
    pub fn to_builder(&self) -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: self.clone(),
        }
    }

    /// Requested palette size K, 1 ..= 256.
    pub fn palette_size(&self) -> usize {
        self.palette_size
    }

    /// Every Nth pixel is sampled along both axes. Always at least 1.
    pub fn sampling_stride(&self) -> usize {
        self.sampling_stride
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Entries closer than this (in `metric` units) are merged. `0.0` disables merging.
    pub fn merge_threshold(&self) -> f64 {
        self.merge_threshold
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn ignore_white(&self) -> bool {
        self.ignore_white
    }

    pub fn alpha_threshold(&self) -> u8 {
        self.alpha_threshold
    }
}

/// Builder for [`ExtractionConfig`]. Out-of-range values are clamped, never rejected.
#[derive(Clone, Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn palette_size(mut self, k: usize) -> Self {
        self.config.palette_size = k;
        self
    }

    pub fn sampling_stride(mut self, stride: usize) -> Self {
        self.config.sampling_stride = stride;
        self
    }

    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    pub fn merge_threshold(mut self, threshold: f64) -> Self {
        self.config.merge_threshold = threshold;
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    pub fn ignore_white(mut self, ignore: bool) -> Self {
        self.config.ignore_white = ignore;
        self
    }

    pub fn alpha_threshold(mut self, threshold: u8) -> Self {
        self.config.alpha_threshold = threshold;
        self
    }

    pub fn build(self) -> ExtractionConfig {
        let mut config = self.config;
        config.palette_size = config
            .palette_size
            .clamp(MIN_PALETTE_SIZE, MAX_PALETTE_SIZE);
        config.sampling_stride = config.sampling_stride.max(1);
        if !config.merge_threshold.is_finite() || config.merge_threshold < 0.0 {
            config.merge_threshold = 0.0;
        }
        config
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct ConfigFields {
    palette_size: usize,
    sampling_stride: usize,
    metric: DistanceMetric,
    merge_threshold: f64,
    algorithm: Algorithm,
    ignore_white: bool,
    alpha_threshold: u8,
}

impl Default for ConfigFields {
    fn default() -> Self {
        let defaults = ExtractionConfig::default();
        Self {
            palette_size: defaults.palette_size,
            sampling_stride: defaults.sampling_stride,
            metric: defaults.metric,
            merge_threshold: defaults.merge_threshold,
            algorithm: defaults.algorithm,
            ignore_white: defaults.ignore_white,
            alpha_threshold: defaults.alpha_threshold,
        }
    }
}

impl From<ConfigFields> for ExtractionConfig {
    fn from(fields: ConfigFields) -> Self {
        ExtractionConfig::builder()
            .palette_size(fields.palette_size)
            .sampling_stride(fields.sampling_stride)
            .metric(fields.metric)
            .merge_threshold(fields.merge_threshold)
            .algorithm(fields.algorithm)
            .ignore_white(fields.ignore_white)
            .alpha_threshold(fields.alpha_threshold)
            .build()
    }
}
