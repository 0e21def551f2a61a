use std::cmp::Reverse;
use std::ops::Range;

use palette::Srgb;

use super::{ColorCluster, ColorHistogram, Quantizer, ensure_samples};
use crate::color::pack;
use crate::error::Result;

/// Median-cut over the RGB cube.
///
/// Starts with one box holding every sample and repeatedly splits the box
/// with the largest extent along its widest channel, at the median sample.
/// Stops at `max_colors` boxes or when every box holds a single color.
///
/// Determinism:
/// - the box with the largest extent is split first; ties go to the box with
///   more pixels, then to the earlier box;
/// - the widest channel ties resolve red, green, blue;
/// - samples are ordered from high to low along the split channel and the
///   median of an even count is the lower-indexed midpoint.
#[derive(Clone, Copy, Debug, Default)]
pub struct MedianCut;

/// A contiguous run of histogram entries plus their running statistics.
#[derive(Clone, Debug)]
struct VBox {
    range: Range<usize>,
    stats: ColorCluster,
}

impl VBox {
    fn from(entries: &[(Srgb<u8>, u64)], range: Range<usize>) -> Self {
        let mut stats = ColorCluster::default();
        for &(color, count) in &entries[range.clone()] {
            stats.add(color, count);
        }
        Self { range, stats }
    }

    /// Only boxes with two or more distinct colors can be cut.
    #[inline]
    fn is_splittable(&self) -> bool {
        self.range.len() > 1
    }

    fn split(&self, entries: &mut [(Srgb<u8>, u64)]) -> (VBox, VBox) {
        let (channel, _) = self.stats.widest_channel();
        let slice = &mut entries[self.range.clone()];
        // Packed color keeps equal channel values in a fixed order.
        slice.sort_unstable_by_key(|&(color, _)| Reverse((channel.of(color), pack(color))));

        let median = (self.stats.count() - 1) / 2;
        let mut seen = 0;
        let mut cut = slice.len();
        for (i, &(_, count)) in slice.iter().enumerate() {
            seen += count;
            if seen > median {
                cut = i + 1;
                break;
            }
        }
        // Both halves keep at least one distinct color.
        let cut = self.range.start + cut.clamp(1, slice.len() - 1);

        tracing::trace!(
            ?channel,
            pixels = self.stats.count(),
            left = cut - self.range.start,
            right = self.range.end - cut,
            "median cut split"
        );

        (
            VBox::from(entries, self.range.start..cut),
            VBox::from(entries, cut..self.range.end),
        )
    }
}

/// Index of the next box to split, if any box can still be split.
fn select(boxes: &[VBox]) -> Option<usize> {
    let mut best: Option<(usize, (u8, u64))> = None;
    for (i, vbox) in boxes.iter().enumerate() {
        if !vbox.is_splittable() {
            continue;
        }
        let key = (vbox.stats.widest_channel().1, vbox.stats.count());
        if best.is_none_or(|(_, best_key)| key > best_key) {
            best = Some((i, key));
        }
    }
    best.map(|(i, _)| i)
}

impl Quantizer for MedianCut {
    fn quantize(&self, histogram: &ColorHistogram, max_colors: usize) -> Result<Vec<ColorCluster>> {
        ensure_samples(histogram)?;
        let max_colors = max_colors.max(1);

        let mut entries = histogram.entries().to_vec();
        let mut boxes = vec![VBox::from(&entries, 0..entries.len())];

        while boxes.len() < max_colors {
            let Some(idx) = select(&boxes) else {
                break;
            };
            let (first, second) = boxes[idx].split(&mut entries);
            boxes[idx] = first;
            boxes.push(second);
        }

        tracing::debug!(
            requested = max_colors,
            produced = boxes.len(),
            distinct = histogram.distinct_colors(),
            "median cut finished"
        );

        Ok(boxes.into_iter().map(|b| b.stats).collect())
    }
}
