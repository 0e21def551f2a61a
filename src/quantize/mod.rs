//! Color quantization.
//!
//! A [`Quantizer`] reduces a [`ColorHistogram`] to at most `max_colors`
//! [`ColorCluster`]s. Median-cut is the default; k-means is available as an
//! alternative strategy behind the same trait.

pub mod kmeans;
pub mod median_cut;

use std::collections::HashMap;

use palette::Srgb;

use crate::color::pack;
use crate::config::Algorithm;
use crate::error::{ExtractError, Result};
use crate::pixels::PixelSample;

pub use kmeans::KMeans;
pub use median_cut::MedianCut;

/// RGB channel index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    #[inline(always)]
    pub fn of(self, color: Srgb<u8>) -> u8 {
        match self {
            Channel::Red => color.red,
            Channel::Green => color.green,
            Channel::Blue => color.blue,
        }
    }

    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }
}

/// Distinct sampled colors with their pixel counts, ordered by packed RGB value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorHistogram {
    entries: Vec<(Srgb<u8>, u64)>,
    total: u64,
}

impl ColorHistogram {
    pub fn entries(&self) -> &[(Srgb<u8>, u64)] {
        &self.entries
    }

    /// Number of sampled pixels.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn distinct_colors(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PixelSample> for ColorHistogram {
    fn from_iter<I: IntoIterator<Item = PixelSample>>(iter: I) -> Self {
        let mut map: HashMap<u32, (Srgb<u8>, u64)> = HashMap::new();
        let mut total = 0;
        for sample in iter {
            map.entry(pack(sample.color))
                .or_insert((sample.color, 0))
                .1 += 1;
            total += 1;
        }
        let mut entries: Vec<_> = map.into_values().collect();
        entries.sort_unstable_by_key(|(color, _)| pack(*color));
        Self { entries, total }
    }
}

/// Running accumulator for one group of pixels.
///
/// Sums stay in the integer domain; conversion to floating point happens only
/// in [`ColorCluster::mean`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorCluster {
    sums: [u64; 3],
    count: u64,
    min: [u8; 3],
    max: [u8; 3],
}

impl Default for ColorCluster {
    fn default() -> Self {
        Self {
            sums: [0; 3],
            count: 0,
            min: [u8::MAX; 3],
            max: [u8::MIN; 3],
        }
    }
}

impl ColorCluster {
    /// Add `count` pixels of `color`.
    pub fn add(&mut self, color: Srgb<u8>, count: u64) {
        if count == 0 {
            return;
        }
        for channel in Channel::ALL {
            let i = channel.index();
            let v = channel.of(color);
            self.sums[i] += v as u64 * count;
            self.min[i] = self.min[i].min(v);
            self.max[i] = self.max[i].max(v);
        }
        self.count += count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `max - min` along `channel`; 0 for an empty cluster.
    pub fn extent(&self, channel: Channel) -> u8 {
        let i = channel.index();
        self.max[i].saturating_sub(self.min[i])
    }

    /// Channel with the largest extent. Ties resolve red, then green, then blue.
    pub fn widest_channel(&self) -> (Channel, u8) {
        Channel::ALL
            .into_iter()
            .map(|c| (c, self.extent(c)))
            .fold((Channel::Red, 0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    /// Pixel-weighted mean color, each channel rounded half-up.
    pub fn mean(&self) -> Option<Srgb<u8>> {
        if self.count == 0 {
            return None;
        }
        let channel = |i: usize| {
            let mean = self.sums[i] as f64 / self.count as f64;
            (mean + 0.5).floor().min(255.0) as u8
        };
        Some(Srgb::new(channel(0), channel(1), channel(2)))
    }
}

/// Strategy that reduces a histogram to a bounded set of clusters.
pub trait Quantizer {
    /// Returns between 1 and `max_colors` non-empty clusters, in discovery order.
    ///
    /// Fails with [`ExtractError::DegenerateInput`] when the histogram is empty.
    fn quantize(&self, histogram: &ColorHistogram, max_colors: usize) -> Result<Vec<ColorCluster>>;
}

/// Quantizer implementing `algorithm`.
pub fn quantizer_for(algorithm: Algorithm) -> Box<dyn Quantizer> {
    match algorithm {
        Algorithm::MedianCut => Box::new(MedianCut),
        Algorithm::KMeans => Box::new(KMeans::default()),
    }
}

pub(crate) fn ensure_samples(histogram: &ColorHistogram) -> Result<()> {
    if histogram.is_empty() {
        return Err(ExtractError::DegenerateInput(
            "no pixel samples left to quantize (image fully filtered out?)".into(),
        ));
    }
    Ok(())
}
