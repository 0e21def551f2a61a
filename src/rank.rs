//! Palette ranking.
//!
//! Finalizes quantizer clusters into [`PaletteEntry`]s ordered by coverage,
//! optionally folding near-duplicate colors into their heavier neighbour.

use std::cmp::Reverse;

use palette::Srgb;

use crate::color::DistanceMetric;
use crate::config::ExtractionConfig;
use crate::error::{ExtractError, Result};
use crate::quantize::ColorCluster;

/// One color of an extracted palette.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaletteEntry {
    pub color: Srgb<u8>,
    /// Fraction of sampled pixels represented by this color, 0.0 ..= 1.0.
    pub weight: f64,
    /// Position in the ranked palette, 0 = most dominant.
    pub rank: usize,
    /// Number of sampled pixels represented by this color.
    pub pixels: u64,
}

impl PaletteEntry {
    pub fn rgb(&self) -> [u8; 3] {
        [self.color.red, self.color.green, self.color.blue]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ranker {
    pub metric: DistanceMetric,
    /// Entries closer than this are merged. `0.0` disables merging.
    pub merge_threshold: f64,
    /// Maximum number of entries to keep after merging.
    pub limit: usize,
}

impl From<&ExtractionConfig> for Ranker {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            metric: config.metric(),
            merge_threshold: config.merge_threshold(),
            limit: config.palette_size(),
        }
    }
}

struct Candidate {
    color: Srgb<u8>,
    pixels: u64,
}

impl Ranker {
    /// Rank `clusters` by pixel count, descending.
    ///
    /// The sort is stable, so clusters with equal counts keep the order the
    /// quantizer discovered them in. Weights are computed against the pixel
    /// total of all clusters, so entries dropped by `limit` are not
    /// redistributed.
    pub fn rank(&self, clusters: &[ColorCluster]) -> Result<Vec<PaletteEntry>> {
        let mut candidates = Vec::with_capacity(clusters.len());
        for (i, cluster) in clusters.iter().enumerate() {
            let color = cluster
                .mean()
                .ok_or_else(|| ExtractError::invariant(format!("cluster {} is empty", i)))?;
            candidates.push(Candidate {
                color,
                pixels: cluster.count(),
            });
        }

        let total: u64 = candidates.iter().map(|c| c.pixels).sum();
        if total == 0 {
            return Err(ExtractError::invariant("no clusters to rank"));
        }

        candidates.sort_by_key(|c| Reverse(c.pixels));

        if self.merge_threshold > 0.0 {
            candidates = self.merge(candidates);
        }

        candidates.truncate(self.limit.max(1));

        Ok(candidates
            .into_iter()
            .enumerate()
            .map(|(rank, c)| PaletteEntry {
                color: c.color,
                weight: c.pixels as f64 / total as f64,
                rank,
                pixels: c.pixels,
            })
            .collect())
    }

    /// Fold each candidate into the first heavier one within the threshold.
    /// Expects `candidates` sorted by pixel count, descending.
    fn merge(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let target = kept
                .iter_mut()
                .find(|k| self.metric.distance(k.color, candidate.color) < self.merge_threshold);
            match target {
                Some(k) => {
                    tracing::trace!(
                        into = %crate::color::hex(k.color),
                        from = %crate::color::hex(candidate.color),
                        "merging near-duplicate palette color"
                    );
                    k.pixels += candidate.pixels;
                }
                None => kept.push(candidate),
            }
        }
        kept.sort_by_key(|c| Reverse(c.pixels));
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(color: (u8, u8, u8), pixels: u64) -> ColorCluster {
        let mut c = ColorCluster::default();
        c.add(Srgb::new(color.0, color.1, color.2), pixels);
        c
    }

    fn ranker(threshold: f64, limit: usize) -> Ranker {
        Ranker {
            metric: DistanceMetric::Euclidean,
            merge_threshold: threshold,
            limit,
        }
    }

    #[test]
    fn orders_by_weight_and_assigns_ranks() {
        let clusters = [
            cluster((0, 0, 255), 1),
            cluster((255, 0, 0), 3),
            cluster((0, 255, 0), 4),
        ];
        let entries = ranker(0.0, 8).rank(&clusters).unwrap();
        let got: Vec<_> = entries.iter().map(|e| (e.rgb(), e.weight, e.rank)).collect();
        assert_eq!(
            got,
            vec![
                ([0, 255, 0], 0.5, 0),
                ([255, 0, 0], 0.375, 1),
                ([0, 0, 255], 0.125, 2),
            ]
        );
    }

    #[test]
    fn equal_weights_keep_discovery_order() {
        let clusters = [
            cluster((9, 9, 9), 2),
            cluster((1, 1, 1), 2),
            cluster((5, 5, 5), 2),
        ];
        let entries = ranker(0.0, 8).rank(&clusters).unwrap();
        let got: Vec<_> = entries.iter().map(|e| e.rgb()).collect();
        assert_eq!(got, vec![[9, 9, 9], [1, 1, 1], [5, 5, 5]]);
    }

    #[test]
    fn merges_close_colors_into_heavier_one() {
        let clusters = [
            cluster((200, 0, 0), 2),
            cluster((0, 0, 200), 5),
            cluster((203, 2, 0), 4),
        ];
        let entries = ranker(10.0, 8).rank(&clusters).unwrap();
        let got: Vec<_> = entries.iter().map(|e| (e.rgb(), e.pixels)).collect();
        assert_eq!(got, vec![([203, 2, 0], 6), ([0, 0, 200], 5)]);
        let sum: f64 = entries.iter().map(|e| e.weight).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_threshold_never_merges_identical_means() {
        let clusters = [cluster((1, 2, 3), 1), cluster((1, 2, 3), 1)];
        let entries = ranker(0.0, 8).rank(&clusters).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn truncates_to_limit() {
        let clusters = [
            cluster((0, 0, 0), 5),
            cluster((100, 100, 100), 3),
            cluster((255, 255, 255), 2),
        ];
        let entries = ranker(0.0, 2).rank(&clusters).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].rgb(), [100, 100, 100]);
        assert!((entries[0].weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_cluster_is_an_invariant_violation() {
        let clusters = [cluster((0, 0, 0), 1), ColorCluster::default()];
        let err = ranker(0.0, 4).rank(&clusters).unwrap_err();
        assert!(matches!(err, ExtractError::InternalInvariantViolation(_)));

        let err = ranker(0.0, 4).rank(&[]).unwrap_err();
        assert!(matches!(err, ExtractError::InternalInvariantViolation(_)));
    }
}
