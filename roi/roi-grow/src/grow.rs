//! The shared growth loop behind seeded and adaptive region growing.
//!
//! All evolving regions compete in one loop. Each iteration performs exactly
//! one merge: the globally closest (evolving region, candidate) pair wins.
//! This total order is what keeps two seeds from racing for the same atomic
//! region, and an owner table makes every claim explicit.

// Neighbor counts don't overflow f64 precision in practice
#![allow(clippy::cast_precision_loss)]

use tracing::{debug, info};

use crate::assess::Assessment;
use crate::error::{GrowError, GrowResult};
use crate::evolving::EvolvingRegion;
use crate::params::StopCriteria;
use crate::partition::Partition;
use crate::region::{Region, RegionId};
use crate::result::{AssessmentSample, GrowOutcome, MergeEvent};

/// Periodic assessment of the region that just grew.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sampler {
    pub assessment: Assessment,
    pub step: usize,
}

/// Run the growth loop until every region reached its stop size or starved.
///
/// `observer` is called after every merge with the current state.
#[allow(clippy::too_many_lines)]
pub(crate) fn grow<F>(
    partition: &Partition,
    seeds: &[Vec<usize>],
    stop: &StopCriteria,
    sampler: Option<Sampler>,
    mut observer: F,
) -> GrowResult<GrowOutcome>
where
    F: FnMut(&MergeEvent, &[EvolvingRegion]),
{
    if seeds.is_empty() || seeds.iter().any(Vec::is_empty) {
        return Err(GrowError::NoSeeds);
    }
    if sampler.is_some_and(|s| s.step == 0) {
        return Err(GrowError::invalid("assess_step must be positive"));
    }
    let targets = stop.resolve(seeds.len())?;
    let arena = partition.regions();

    let mut owner: Vec<Option<usize>> = vec![None; arena.len()];
    let mut evolving = seed_regions(partition, seeds, &mut owner)?;
    for region in &mut evolving {
        region.retain_neighbors(|id| owner[*id].is_none());
    }

    info!(
        seeds = seeds.len(),
        regions = arena.len(),
        sampling = sampler.is_some(),
        "Starting region growing"
    );

    let count = evolving.len();
    let mut starved = vec![false; count];
    let mut cache: Vec<Option<(RegionId, f64)>> = vec![None; count];
    let mut samples: Vec<Vec<AssessmentSample>> = vec![Vec::new(); count];
    let mut merges = 0;

    mark_starved(&evolving, &targets, &mut starved);

    loop {
        let mut best: Option<(usize, RegionId, f64)> = None;
        for (i, region) in evolving.iter().enumerate() {
            if !is_active(region, targets[i], starved[i]) {
                continue;
            }
            let candidate = match cache[i] {
                Some(candidate) => candidate,
                None => {
                    let candidate = region.nearest_neighbor(arena)?;
                    cache[i] = Some(candidate);
                    candidate
                }
            };
            if best.is_none_or(|(_, _, distance)| candidate.1 < distance) {
                best = Some((i, candidate.0, candidate.1));
            }
        }

        let Some((winner, target, distance)) = best else {
            break;
        };
        cache[winner] = None;

        // Claimed ids are pruned from every neighbor set after each merge, so
        // a claimed winner only shows up if that pruning is broken.
        debug_assert!(owner[target].is_none(), "region {target} already claimed");
        if owner[target].is_some() {
            evolving[winner].remove_neighbor(target);
            mark_starved(&evolving, &targets, &mut starved);
            continue;
        }

        owner[target] = Some(winner);
        evolving[winner].merge(&arena[target]);
        evolving[winner].retain_neighbors(|id| owner[*id].is_none());

        if let Some(sampler) = sampler
            && evolving[winner].component().len() % sampler.step == 0
        {
            let sample = take_sample(&evolving[winner], arena, sampler.assessment)?;
            samples[winner].push(sample);
        }

        for (i, region) in evolving.iter_mut().enumerate() {
            if i != winner && region.remove_neighbor(target) {
                cache[i] = None;
            }
        }
        mark_starved(&evolving, &targets, &mut starved);

        observer(
            &MergeEvent {
                iteration: merges,
                evolving: winner,
                region: target,
                distance,
            },
            &evolving,
        );
        merges += 1;
    }

    info!(
        merges,
        starved = starved.iter().filter(|&&s| s).count(),
        "Region growing converged"
    );

    Ok(GrowOutcome {
        regions: evolving,
        samples,
        merges,
    })
}

/// Create one evolving region per seed group and claim the seed regions.
fn seed_regions(
    partition: &Partition,
    seeds: &[Vec<usize>],
    owner: &mut [Option<usize>],
) -> GrowResult<Vec<EvolvingRegion>> {
    let arena = partition.regions();
    let mut evolving = Vec::with_capacity(seeds.len());

    for (group, elements) in seeds.iter().enumerate() {
        let mut region = EvolvingRegion::new(group, elements.clone(), partition.feature_count());
        for &element in elements {
            let id = partition
                .region_of(element)
                .ok_or(GrowError::SeedOutOfMask { element })?;
            match owner[id] {
                Some(first) if first == group => continue,
                Some(first) => {
                    return Err(GrowError::ConflictingSeeds {
                        region: id,
                        first,
                        second: group,
                    });
                }
                None => {}
            }
            owner[id] = Some(group);
            region.merge(&arena[id]);
        }
        evolving.push(region);
    }

    Ok(evolving)
}

/// Whether a region still competes for merges.
///
/// A starved region keeps its real size; the flag stands in for forcing its
/// size up to the stop criterion.
fn is_active(region: &EvolvingRegion, target: usize, starved: bool) -> bool {
    !starved && region.size() < target
}

/// Stop regions that still want to grow but have nothing left to absorb.
fn mark_starved(evolving: &[EvolvingRegion], targets: &[usize], starved: &mut [bool]) {
    for (i, region) in evolving.iter().enumerate() {
        if is_active(region, targets[i], starved[i]) && region.neighbors().is_empty() {
            starved[i] = true;
            debug!(
                region = i,
                size = region.size(),
                target = targets[i],
                "Region starved before reaching its stop size"
            );
        }
    }
}

fn take_sample(
    region: &EvolvingRegion,
    arena: &[Region],
    assessment: Assessment,
) -> GrowResult<AssessmentSample> {
    let value = assessment.assess(region, arena)?;

    let outer_mean = if region.neighbors().is_empty() {
        None
    } else {
        let mut total = 0.0;
        for &id in region.neighbors() {
            total += arena[id].scalar_mean()?;
        }
        Some(total / region.neighbors().len() as f64)
    };

    let mut inner_min = f64::INFINITY;
    for &id in region.component() {
        inner_min = inner_min.min(arena[id].scalar_mean()?);
    }

    Ok(AssessmentSample {
        component_len: region.component().len(),
        value,
        outer_mean,
        inner_min,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::graph::ElementGraph;
    use crate::signal::FeatureSignal;

    fn partition(n: usize, edges: &[(usize, usize)], values: &[f64]) -> Partition {
        let graph = ElementGraph::from_edges(n, edges).expect("valid edges");
        Partition::per_element(&graph, &FeatureSignal::from_scalars(values), None, 1)
            .expect("valid input")
    }

    fn path(n: usize) -> Partition {
        let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        partition(n, &edges, &vec![1.0; n])
    }

    fn run(partition: &Partition, seeds: &[Vec<usize>], stop: StopCriteria) -> GrowOutcome {
        grow(partition, seeds, &stop, None, |_, _| {}).expect("growth succeeds")
    }

    #[test]
    fn path_grows_to_stop_size() {
        let outcome = run(&path(5), &[vec![0]], StopCriteria::Uniform(3));

        assert_eq!(outcome.regions[0].element_ids(), vec![0, 1, 2]);
        assert_eq!(outcome.regions[0].component(), &[0, 1, 2]);
        assert_eq!(outcome.merges, 2);
    }

    #[test]
    fn picks_closest_signal_first() {
        // Star centered on 0.
        let partition = partition(4, &[(0, 1), (0, 2), (0, 3)], &[1.0, 5.0, 1.1, 3.0]);
        let outcome = run(&partition, &[vec![0]], StopCriteria::Uniform(2));
        assert_eq!(outcome.regions[0].element_ids(), vec![0, 2]);
    }

    #[test]
    fn global_order_decides_between_seeds() {
        // 0 - 1 - 2 - 3: both seeds want region 1 or 2; region 1 is closer to
        // seed 0 than region 2 is to seed 3, so seed 0 moves first.
        let partition = partition(4, &[(0, 1), (1, 2), (2, 3)], &[1.0, 1.2, 5.0, 3.0]);
        let mut order = Vec::new();
        grow(
            &partition,
            &[vec![0], vec![3]],
            &StopCriteria::Uniform(2),
            None,
            |event, _| order.push((event.evolving, event.region)),
        )
        .expect("growth succeeds");

        assert_eq!(order, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn starved_region_stops() {
        let outcome = run(&path(3), &[vec![0]], StopCriteria::Uniform(10));
        assert_eq!(outcome.regions[0].size(), 3);
        assert_eq!(outcome.merges, 2);
    }

    #[test]
    fn isolated_seed_starves_immediately() {
        let partition = partition(2, &[], &[1.0, 2.0]);
        let outcome = run(&partition, &[vec![0]], StopCriteria::Uniform(2));
        assert_eq!(outcome.regions[0].size(), 1);
        assert_eq!(outcome.merges, 0);
    }

    #[test]
    fn conflicting_seeds_rejected() {
        let result = grow(
            &path(5),
            &[vec![0], vec![0]],
            &StopCriteria::Uniform(3),
            None,
            |_, _| {},
        );
        assert!(matches!(
            result,
            Err(GrowError::ConflictingSeeds {
                region: 0,
                first: 0,
                second: 1
            })
        ));
    }

    #[test]
    fn repeated_seed_in_one_group_is_merged_once() {
        let outcome = run(&path(5), &[vec![1, 1]], StopCriteria::Uniform(2));
        assert_eq!(outcome.regions[0].component().len(), 2);
        assert_eq!(outcome.regions[0].seeds(), &[1, 1]);
    }

    #[test]
    fn seed_out_of_mask_rejected() {
        let graph = ElementGraph::from_edges(3, &[(0, 1), (1, 2)]).expect("valid edges");
        let partition = Partition::per_element(
            &graph,
            &FeatureSignal::from_scalars(&[1.0, 1.0, 1.0]),
            Some(&[true, false, true]),
            1,
        )
        .expect("valid input");

        for element in [1, 99] {
            let result = grow(
                &partition,
                &[vec![element]],
                &StopCriteria::Uniform(2),
                None,
                |_, _| {},
            );
            assert!(matches!(result, Err(GrowError::SeedOutOfMask { element: e }) if e == element));
        }
    }

    #[test]
    fn empty_seeds_rejected() {
        let stop = StopCriteria::Uniform(2);
        assert!(matches!(
            grow(&path(3), &[], &stop, None, |_, _| {}),
            Err(GrowError::NoSeeds)
        ));
        assert!(matches!(
            grow(&path(3), &[vec![]], &stop, None, |_, _| {}),
            Err(GrowError::NoSeeds)
        ));
    }

    #[test]
    fn zero_assess_step_rejected() {
        let sampler = Sampler {
            assessment: Assessment::TransitionLevel,
            step: 0,
        };
        let result = grow(
            &path(3),
            &[vec![0]],
            &StopCriteria::Uniform(2),
            Some(sampler),
            |_, _| {},
        );
        assert!(matches!(result, Err(GrowError::TypeInvalid { .. })));
    }

    #[test]
    fn samples_follow_assess_step() {
        let sampler = Sampler {
            assessment: Assessment::TransitionLevel,
            step: 2,
        };
        let outcome = grow(
            &path(6),
            &[vec![0]],
            &StopCriteria::Uniform(6),
            Some(sampler),
            |_, _| {},
        )
        .expect("growth succeeds");

        let lengths: Vec<usize> = outcome.samples[0].iter().map(|s| s.component_len).collect();
        assert_eq!(lengths, vec![2, 4, 6]);
        assert!(outcome.samples[0][2].outer_mean.is_none());
        assert!(outcome.samples[0][0].outer_mean.is_some());
    }
}
