//! Extraction orchestrator.
//!
//! Drives one image through sampling, quantization, ranking and encoding:
//!
//! ```text
//! Idle -> Sampling -> Quantizing -> Ranking -> Encoding -> Done
//!            \            \            \           \
//!             +------------+------------+-----------+--> Error(kind)
//! ```
//!
//! There are no retries. The first failing stage ends the run and its error
//! kind is kept in the terminal state.

use palette::Srgb;
use serde::{Serialize, Serializer};

use crate::config::{DistanceMetric, ExtractionConfig};
use crate::encode::{ColorNotation, PaletteRecord, encode};
use crate::error::{ErrorKind, ExtractError, Result};
use crate::pixels::{RawImage, SampleFilter};
use crate::quantize::{ColorHistogram, quantizer_for};
use crate::rank::{PaletteEntry, Ranker};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionState {
    Idle,
    Sampling,
    Quantizing,
    Ranking,
    Encoding,
    Done,
    Error(ErrorKind),
}

impl ExtractionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExtractionState::Done | ExtractionState::Error(_))
    }
}

/// One extraction run. Owns its configuration and is not reentrant: a second
/// call to [`Extraction::run`] is refused.
#[derive(Debug)]
pub struct Extraction {
    config: ExtractionConfig,
    state: ExtractionState,
}

impl Extraction {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            state: ExtractionState::Idle,
        }
    }

    pub fn state(&self) -> ExtractionState {
        self.state
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn run(&mut self, image: RawImage<'_>) -> Result<ExtractionResult> {
        if self.state != ExtractionState::Idle {
            return Err(ExtractError::invariant(format!(
                "extraction already ran (state {:?})",
                self.state
            )));
        }

        match self.stages(image) {
            Ok(result) => {
                self.transition(ExtractionState::Done);
                Ok(result)
            }
            Err(err) => {
                self.transition(ExtractionState::Error(err.kind()));
                Err(err)
            }
        }
    }

    fn stages(&mut self, image: RawImage<'_>) -> Result<ExtractionResult> {
        self.transition(ExtractionState::Sampling);
        let buffer = image.validate()?;
        let histogram: ColorHistogram = buffer
            .samples(self.config.sampling_stride(), SampleFilter::from(&self.config))
            .collect();

        self.transition(ExtractionState::Quantizing);
        let clusters = quantizer_for(self.config.algorithm())
            .quantize(&histogram, self.config.palette_size())?;

        self.transition(ExtractionState::Ranking);
        let entries = Ranker::from(&self.config).rank(&clusters)?;

        self.transition(ExtractionState::Encoding);
        let records = encode(&entries)?;

        tracing::debug!(
            width = buffer.width(),
            height = buffer.height(),
            sampled = histogram.total(),
            distinct = histogram.distinct_colors(),
            colors = records.len(),
            "palette extracted"
        );

        Ok(ExtractionResult {
            entries,
            records,
            sampled_pixels: histogram.total(),
            metric: self.config.metric(),
        })
    }

    fn transition(&mut self, next: ExtractionState) {
        tracing::debug!(from = ?self.state, to = ?next, "extraction state");
        self.state = next;
    }
}

/// Run a complete extraction of `image` with `config`.
///
/// ```
/// use nitro_palette::{ExtractionConfig, PixelFormat, RawImage, extract};
///
/// let pixels = [255, 0, 0, 255, 255, 0, 0, 255, 0, 0, 255, 255, 0, 255, 0, 255];
/// let config = ExtractionConfig::builder().palette_size(2).build();
/// let result = extract(RawImage::new(&pixels, 2, 2, PixelFormat::Rgba8), &config).unwrap();
///
/// assert_eq!(result.len(), 2);
/// assert_eq!(result.entries()[0].rgb(), [255, 0, 0]);
/// ```
pub fn extract(image: RawImage<'_>, config: &ExtractionConfig) -> Result<ExtractionResult> {
    Extraction::new(config.clone()).run(image)
}

/// Ranked palette of one extraction. Serializes as its list of records.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionResult {
    entries: Vec<PaletteEntry>,
    records: Vec<PaletteRecord>,
    sampled_pixels: u64,
    metric: DistanceMetric,
}

impl ExtractionResult {
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn records(&self) -> &[PaletteRecord] {
        &self.records
    }

    /// Number of pixels that survived sampling and filtering.
    pub fn sampled_pixels(&self) -> u64 {
        self.sampled_pixels
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Palette entry closest to `color` under the configured metric.
    /// The higher-ranked entry wins on equal distance.
    pub fn nearest(&self, color: Srgb<u8>) -> Option<&PaletteEntry> {
        self.entries.iter().min_by(|a, b| {
            self.metric
                .distance(a.color, color)
                .total_cmp(&self.metric.distance(b.color, color))
        })
    }

    pub fn to_strings(&self, notation: ColorNotation) -> Vec<String> {
        self.records.iter().map(|r| r.render(notation)).collect()
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}
