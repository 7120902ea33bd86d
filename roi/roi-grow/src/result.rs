//! Result types for growing operations.

use crate::evolving::EvolvingRegion;
use crate::region::RegionId;

/// One assessment sample taken during growth.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssessmentSample {
    /// Component length (absorbed regions) when the sample was taken.
    pub component_len: usize,
    /// Assessment value. Higher is better.
    pub value: f64,
    /// Average scalar mean signal of the candidate neighbors, if any.
    pub outer_mean: Option<f64>,
    /// Smallest scalar mean signal among the absorbed regions.
    pub inner_min: f64,
}

/// A single merge performed by the growth loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEvent {
    /// Zero-based merge counter.
    pub iteration: usize,
    /// Index of the evolving region that grew.
    pub evolving: usize,
    /// Atomic region it absorbed.
    pub region: RegionId,
    /// Candidate distance that won the iteration.
    pub distance: f64,
}

/// Output of the shared growth loop.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowOutcome {
    /// One grown region per seed group, in seed order.
    pub regions: Vec<EvolvingRegion>,
    /// Assessment samples per region; empty when sampling was off.
    pub samples: Vec<Vec<AssessmentSample>>,
    /// Number of merges performed.
    pub merges: usize,
}

impl GrowOutcome {
    /// Total number of elements across all grown regions.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.regions.iter().map(EvolvingRegion::size).sum()
    }
}

impl std::fmt::Display for GrowOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Growth: {} regions, {} elements, {} merges",
            self.regions.len(),
            self.total_size(),
            self.merges
        )
    }
}

/// Output of adaptive region growing.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveOutcome {
    /// Regions rolled back to their best-assessed cut.
    pub regions: Vec<EvolvingRegion>,
    /// The fully grown regions, when requested.
    pub grown: Option<Vec<EvolvingRegion>>,
    /// Raw assessment samples per region.
    pub samples: Vec<Vec<AssessmentSample>>,
    /// Chosen component length per region, `None` when it had no samples.
    pub cuts: Vec<Option<usize>>,
}

impl AdaptiveOutcome {
    /// Assessment values of one region, in sampling order.
    #[must_use]
    pub fn values(&self, region: usize) -> Vec<f64> {
        self.samples
            .get(region)
            .map(|samples| samples.iter().map(|s| s.value).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn outcome_display() {
        let outcome = GrowOutcome {
            regions: vec![EvolvingRegion::new(0, vec![0], 1)],
            samples: Vec::new(),
            merges: 3,
        };
        assert_eq!(outcome.to_string(), "Growth: 1 regions, 0 elements, 3 merges");
    }

    #[test]
    fn values_of_unknown_region_are_empty() {
        let outcome = AdaptiveOutcome {
            regions: Vec::new(),
            grown: None,
            samples: vec![vec![AssessmentSample {
                component_len: 2,
                value: 0.5,
                outer_mean: None,
                inner_min: 1.0,
            }]],
            cuts: vec![Some(2)],
        };
        assert_eq!(outcome.values(0), vec![0.5]);
        assert!(outcome.values(7).is_empty());
    }
}
