//! The region growing orchestrator.

use hashbrown::HashSet;
use tracing::info;

use crate::adaptive::{best_sample, cut_length, rollback};
use crate::assess::Assessment;
use crate::connectivity;
use crate::error::{GrowError, GrowResult};
use crate::evolving::EvolvingRegion;
use crate::graph::ElementGraph;
use crate::grow::{Sampler, grow};
use crate::params::{AdaptiveParams, PartitionParams, StopCriteria};
use crate::partition::{Partition, Preclusterer};
use crate::region::{Region, RegionId};
use crate::result::{AdaptiveOutcome, GrowOutcome, MergeEvent};
use crate::signal::FeatureSignal;

/// Seeded, adaptive and connectivity region growing over one partition.
///
/// Owns the atomic partition and the assessment strategy used by adaptive
/// growing. Growing never mutates the partition, so one `RegionGrow` can
/// serve many seed sets.
///
/// # Example
///
/// ```
/// use roi_grow::{ElementGraph, FeatureSignal, PartitionParams, RegionGrow};
///
/// let graph = ElementGraph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
/// let signal = FeatureSignal::from_scalars(&[1.0; 5]);
/// let grower =
///     RegionGrow::build_partition(&graph, &signal, None, &PartitionParams::default(), None)
///         .unwrap();
///
/// let regions = grower.srg_parcel(&[vec![0]], 3).unwrap();
/// assert_eq!(regions[0].element_ids(), vec![0, 1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct RegionGrow {
    partition: Partition,
    assessment: Assessment,
}

impl RegionGrow {
    /// Grow over an existing partition with the default assessment.
    #[must_use]
    pub fn new(partition: Partition) -> Self {
        Self {
            partition,
            assessment: Assessment::default(),
        }
    }

    /// Build the atomic partition and wrap it.
    ///
    /// See [`Partition::build`].
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::TypeInvalid`] if the signal or mask does not match
    /// the graph, or if parcels are requested without a preclusterer.
    pub fn build_partition(
        graph: &ElementGraph,
        signal: &FeatureSignal,
        mask: Option<&[bool]>,
        params: &PartitionParams,
        preclusterer: Option<&dyn Preclusterer>,
    ) -> GrowResult<Self> {
        Partition::build(graph, signal, mask, params, preclusterer).map(Self::new)
    }

    /// The atomic partition.
    #[must_use]
    pub const fn partition(&self) -> &Partition {
        &self.partition
    }

    /// The atomic regions.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        self.partition.regions()
    }

    /// Atomic region holding `element`, if it is unmasked.
    #[must_use]
    pub fn region_of(&self, element: usize) -> Option<RegionId> {
        self.partition.region_of(element)
    }

    /// Active assessment strategy.
    #[must_use]
    pub const fn assessment(&self) -> Assessment {
        self.assessment
    }

    /// Select the assessment strategy by name.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::UnknownAssessment`] if no strategy has that name;
    /// the current strategy is kept.
    pub fn set_assessment(&mut self, name: &str) -> GrowResult<()> {
        self.assessment = name.parse()?;
        Ok(())
    }

    /// Select the assessment strategy directly.
    #[must_use]
    pub const fn with_assessment(mut self, assessment: Assessment) -> Self {
        self.assessment = assessment;
        self
    }

    /// Names of all registered assessment strategies.
    #[must_use]
    pub const fn list_assessments() -> &'static [&'static str] {
        &Assessment::NAMES
    }

    /// Elements of the atomic region with the highest mean signal.
    ///
    /// Used as the sole seed group when growing is started without seeds.
    /// The scalar mean averages over features; ties go to the lowest region
    /// id.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::EmptyPartition`] if there are no regions.
    pub fn get_seed_region(&self) -> GrowResult<Vec<usize>> {
        let mut best: Option<(&Region, f64)> = None;
        for region in self.partition.regions() {
            let mean = region.scalar_mean()?;
            if best.is_none_or(|(_, top)| mean > top) {
                best = Some((region, mean));
            }
        }

        best.map(|(region, _)| region.element_ids())
            .ok_or(GrowError::EmptyPartition)
    }

    /// Run the shared growth loop.
    ///
    /// With `assess_step` set, the active assessment is sampled whenever a
    /// region's component length is a multiple of it.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::NoSeeds`], [`GrowError::SeedOutOfMask`],
    /// [`GrowError::ConflictingSeeds`] or [`GrowError::StopCriteriaMismatch`]
    /// for bad seeds, and [`GrowError::TypeInvalid`] for a zero step.
    pub fn compute(
        &self,
        seeds: &[Vec<usize>],
        stop: impl Into<StopCriteria>,
        assess_step: Option<usize>,
    ) -> GrowResult<GrowOutcome> {
        self.compute_observed(seeds, stop, assess_step, |_, _| {})
    }

    /// Like [`RegionGrow::compute`], calling `observer` after every merge.
    ///
    /// # Errors
    ///
    /// See [`RegionGrow::compute`].
    pub fn compute_observed<F>(
        &self,
        seeds: &[Vec<usize>],
        stop: impl Into<StopCriteria>,
        assess_step: Option<usize>,
        observer: F,
    ) -> GrowResult<GrowOutcome>
    where
        F: FnMut(&MergeEvent, &[EvolvingRegion]),
    {
        let sampler = assess_step.map(|step| Sampler {
            assessment: self.assessment,
            step,
        });
        grow(&self.partition, seeds, &stop.into(), sampler, observer)
    }

    /// Seeded region growing.
    ///
    /// Grows one region per seed group until each reaches its stop size or
    /// runs out of candidates. Empty `seeds` falls back to
    /// [`RegionGrow::get_seed_region`].
    ///
    /// # Errors
    ///
    /// See [`RegionGrow::compute`].
    pub fn srg_parcel(
        &self,
        seeds: &[Vec<usize>],
        stop: impl Into<StopCriteria>,
    ) -> GrowResult<Vec<EvolvingRegion>> {
        let seeds = self.seeds_or_fallback(seeds)?;
        Ok(self.compute(&seeds, stop, None)?.regions)
    }

    /// Adaptive region growing.
    ///
    /// Grows like [`RegionGrow::srg_parcel`] while sampling the active
    /// assessment, then rolls each region back to its best smoothed sample.
    /// Sample `i` (zero-based) keeps the first `(i + 1) * assess_step`
    /// absorbed regions, see [`cut_length`].
    /// Empty `seeds` falls back to [`RegionGrow::get_seed_region`].
    ///
    /// # Errors
    ///
    /// See [`RegionGrow::compute`].
    pub fn arg_parcel(
        &self,
        seeds: &[Vec<usize>],
        stop: impl Into<StopCriteria>,
        params: &AdaptiveParams,
    ) -> GrowResult<AdaptiveOutcome> {
        let seeds = self.seeds_or_fallback(seeds)?;
        let outcome = self.compute(&seeds, stop, Some(params.assess_step))?;
        let arena = self.partition.regions();

        let mut regions = Vec::with_capacity(outcome.regions.len());
        let mut cuts = Vec::with_capacity(outcome.regions.len());
        for (grown, samples) in outcome.regions.iter().zip(&outcome.samples) {
            let cut = best_sample(samples, params.half_width)
                .map(|index| cut_length(index, params.assess_step, grown.component().len()));
            regions.push(match cut {
                Some(cut) => rollback(grown, cut, arena),
                None => grown.clone(),
            });
            cuts.push(cut);
        }

        info!(
            regions = regions.len(),
            assessment = %self.assessment,
            half_width = params.half_width,
            "Adaptive region growing finished"
        );

        Ok(AdaptiveOutcome {
            regions,
            grown: params.whole_results.then_some(outcome.regions),
            samples: outcome.samples,
            cuts,
        })
    }

    /// Connectivity region growing; see [`connectivity::connectivity_grow`].
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::NoSeeds`] or [`GrowError::SeedOutOfMask`] for bad
    /// seeds.
    pub fn connectivity_grow(
        seeds: &[Vec<usize>],
        graph: &ElementGraph,
    ) -> GrowResult<Vec<HashSet<usize>>> {
        connectivity::connectivity_grow(seeds, graph)
    }

    fn seeds_or_fallback(&self, seeds: &[Vec<usize>]) -> GrowResult<Vec<Vec<usize>>> {
        if seeds.is_empty() {
            Ok(vec![self.get_seed_region()?])
        } else {
            Ok(seeds.to_vec())
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn grower(values: &[f64]) -> RegionGrow {
        let n = values.len();
        let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        let graph = ElementGraph::from_edges(n, &edges).expect("valid path");
        RegionGrow::build_partition(
            &graph,
            &FeatureSignal::from_scalars(values),
            None,
            &PartitionParams::default(),
            None,
        )
        .expect("valid input")
    }

    #[test]
    fn shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RegionGrow>();
    }

    #[test]
    fn set_assessment_by_name() {
        let mut grower = grower(&[1.0, 2.0]);
        assert_eq!(grower.assessment(), Assessment::TransitionLevel);

        grower.set_assessment("gray_level_sum").expect("registered");
        assert_eq!(grower.assessment(), Assessment::GrayLevelSum);

        let result = grower.set_assessment("entropy");
        assert!(matches!(result, Err(GrowError::UnknownAssessment { .. })));
        assert_eq!(grower.assessment(), Assessment::GrayLevelSum);
    }

    #[test]
    fn list_assessments_matches_registry() {
        let names = RegionGrow::list_assessments();
        assert_eq!(names.len(), Assessment::ALL.len());
        assert!(names.contains(&"transition_level"));
    }

    #[test]
    fn seed_region_has_highest_mean() {
        let grower = grower(&[1.0, 7.0, 3.0, 7.0]);
        assert_eq!(grower.get_seed_region().expect("non-empty"), vec![1]);
    }

    #[test]
    fn empty_partition_has_no_seed_region() {
        let graph = ElementGraph::new(2);
        let grower = RegionGrow::build_partition(
            &graph,
            &FeatureSignal::from_scalars(&[1.0, 2.0]),
            Some(&[false, false]),
            &PartitionParams::default(),
            None,
        )
        .expect("valid input");
        assert!(matches!(
            grower.get_seed_region(),
            Err(GrowError::EmptyPartition)
        ));
    }

    #[test]
    fn srg_without_seeds_starts_at_peak() {
        let grower = grower(&[1.0, 2.0, 9.0, 8.5, 0.0]);
        let regions = grower.srg_parcel(&[], 2).expect("fallback seed");
        assert_eq!(regions[0].seeds(), &[2]);
        assert_eq!(regions[0].element_ids(), vec![2, 3]);
    }

    #[test]
    fn arg_rolls_back_to_contrast_edge() {
        let grower = grower(&[1.0, 1.0, 1.0, 1.0, 1.0, 9.0, 9.0, 9.0, 9.0, 9.0]);
        let params = AdaptiveParams::default().with_whole_results(true);
        let outcome = grower
            .arg_parcel(&[vec![0]], 10, &params)
            .expect("growth succeeds");

        // The contrast peaks at the fourth sample (component length 5), and
        // the n-th sample keeps the first n * assess_step regions.
        assert_eq!(outcome.values(0)[3], 8.0);
        assert_eq!(outcome.regions[0].element_ids(), vec![0, 1, 2, 3]);
        assert_eq!(outcome.cuts, vec![Some(4)]);
        let grown = outcome.grown.as_ref().expect("whole results requested");
        assert_eq!(grown[0].size(), 10);
        assert_eq!(outcome.values(0).len(), 9);
    }

    #[test]
    fn arg_without_whole_results() {
        let grower = grower(&[1.0, 1.0, 5.0]);
        let outcome = grower
            .arg_parcel(&[vec![0]], 3, &AdaptiveParams::default())
            .expect("growth succeeds");
        assert!(outcome.grown.is_none());
        assert_eq!(outcome.regions.len(), 1);
    }

    #[test]
    fn arg_region_without_samples_keeps_growth() {
        let grower = grower(&[1.0, 2.0, 3.0]);
        let params = AdaptiveParams::default().with_assess_step(50);
        let outcome = grower
            .arg_parcel(&[vec![0]], 3, &params)
            .expect("growth succeeds");
        assert_eq!(outcome.cuts, vec![None]);
        assert_eq!(outcome.regions[0].size(), 3);
    }
}
