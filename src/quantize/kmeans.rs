use kmeans_colors::get_kmeans;
use palette::Lab;

use super::{ColorCluster, ColorHistogram, Quantizer, ensure_samples};
use crate::color::to_lab;
use crate::error::Result;

/// `kmeans_colors` reports cluster membership as `u8`.
const MAX_KMEANS_COLORS: usize = 256;

/// K-means clustering in CIELAB.
///
/// Membership is decided in Lab space, but the resulting clusters accumulate
/// the original sRGB samples, so their means are comparable with median-cut
/// output. A fixed seed keeps runs reproducible.
#[derive(Clone, Copy, Debug)]
pub struct KMeans {
    pub max_iter: usize,
    pub converge: f32,
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            max_iter: 20,
            converge: 1e-4,
            seed: 0,
        }
    }
}

impl Quantizer for KMeans {
    fn quantize(&self, histogram: &ColorHistogram, max_colors: usize) -> Result<Vec<ColorCluster>> {
        ensure_samples(histogram)?;
        let k = max_colors
            .clamp(1, MAX_KMEANS_COLORS)
            .min(histogram.distinct_colors());

        let mut lab_pixels: Vec<Lab> = Vec::with_capacity(histogram.total() as usize);
        for &(color, count) in histogram.entries() {
            let lab = to_lab(color);
            lab_pixels.extend(std::iter::repeat_n(lab, count as usize));
        }

        let kmeans = get_kmeans(k, self.max_iter, self.converge, false, &lab_pixels, self.seed);

        let mut clusters = vec![ColorCluster::default(); kmeans.centroids.len()];
        let mut indices = kmeans.indices.iter();
        for &(color, count) in histogram.entries() {
            for _ in 0..count {
                if let Some(&idx) = indices.next() {
                    clusters[idx as usize].add(color, 1);
                }
            }
        }
        clusters.retain(|c| !c.is_empty());

        tracing::debug!(
            k,
            produced = clusters.len(),
            score = kmeans.score,
            "k-means finished"
        );

        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::pack;
    use crate::pixels::PixelSample;

    #[test]
    fn single_color_gives_one_cluster() {
        let hist: ColorHistogram = std::iter::repeat_n(PixelSample::new(40, 80, 120), 30).collect();
        let clusters = KMeans::default().quantize(&hist, 6).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count(), 30);
        assert_eq!(pack(clusters[0].mean().unwrap()), 0x285078);
    }

    #[test]
    fn two_well_separated_colors() {
        let hist: ColorHistogram = std::iter::repeat_n(PixelSample::new(250, 10, 10), 12)
            .chain(std::iter::repeat_n(PixelSample::new(10, 10, 250), 4))
            .collect();
        let clusters = KMeans::default().quantize(&hist, 2).unwrap();
        let mut got: Vec<(u32, u64)> = clusters
            .iter()
            .map(|c| (pack(c.mean().unwrap()), c.count()))
            .collect();
        got.sort();
        assert_eq!(got, vec![(0x0A0AFA, 4), (0xFA0A0A, 12)]);
    }

    #[test]
    fn same_seed_same_result() {
        let hist: ColorHistogram = (0..300u32)
            .map(|i| PixelSample::new((i * 7 % 256) as u8, (i * 13 % 256) as u8, (i % 256) as u8))
            .collect();
        let a = KMeans::default().quantize(&hist, 5).unwrap();
        let b = KMeans::default().quantize(&hist, 5).unwrap();
        assert_eq!(a, b);
        assert!(a.len() <= 5);
        assert_eq!(a.iter().map(|c| c.count()).sum::<u64>(), 300);
    }
}
