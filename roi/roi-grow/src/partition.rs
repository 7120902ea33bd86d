//! Atomic partition construction.
//!
//! A [`Partition`] is the arena of atomic [`Region`]s that growing operates
//! on, together with the element → region lookup. It is built either with one
//! region per unmasked element or from a [`Parcellation`] produced by a
//! [`Preclusterer`].

use std::collections::VecDeque;

use tracing::info;

use crate::error::{GrowError, GrowResult};
use crate::graph::ElementGraph;
use crate::params::PartitionParams;
use crate::region::{Region, RegionId};
use crate::signal::FeatureSignal;

/// Super-element clustering: per-element parcel labels plus parcel adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parcellation {
    /// Parcel of each element, `None` for elements that belong to no parcel.
    pub labels: Vec<Option<usize>>,
    /// For each parcel, the parcels it touches.
    pub adjacency: Vec<Vec<usize>>,
}

impl Parcellation {
    /// Number of parcels.
    #[must_use]
    pub fn parcel_count(&self) -> usize {
        self.adjacency.len()
    }
}

/// Groups elements into connected parcels before growing.
pub trait Preclusterer {
    /// Cluster the unmasked elements of `graph` into about `n_parcel` parcels.
    ///
    /// # Errors
    ///
    /// Implementations fail if they cannot cluster the given input.
    fn parcellate(
        &self,
        graph: &ElementGraph,
        mask: &[bool],
        n_parcel: usize,
    ) -> GrowResult<Parcellation>;
}

/// Breadth-first preclusterer.
///
/// Starting from the lowest unassigned element, each parcel takes up to
/// `ceil(unmasked / n_parcel)` connected elements in breadth-first order.
/// Disconnected pieces start their own parcels, so the parcel count can
/// exceed `n_parcel`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BfsPreclusterer;

impl Preclusterer for BfsPreclusterer {
    fn parcellate(
        &self,
        graph: &ElementGraph,
        mask: &[bool],
        n_parcel: usize,
    ) -> GrowResult<Parcellation> {
        if n_parcel == 0 {
            return Err(GrowError::invalid("n_parcel must be positive"));
        }
        let graph = graph.restrict(mask)?;
        let unmasked = mask.iter().filter(|&&m| m).count();
        let target = unmasked.div_ceil(n_parcel).max(1);

        let mut labels: Vec<Option<usize>> = vec![None; graph.element_count()];
        let mut parcel_count = 0;

        for start in 0..graph.element_count() {
            if !mask[start] || labels[start].is_some() {
                continue;
            }

            let parcel = parcel_count;
            parcel_count += 1;
            labels[start] = Some(parcel);
            let mut taken = 1;
            let mut queue = VecDeque::from([start]);

            'fill: while let Some(element) = queue.pop_front() {
                for &next in graph.neighbors(element) {
                    if taken == target {
                        break 'fill;
                    }
                    if labels[next].is_none() {
                        labels[next] = Some(parcel);
                        taken += 1;
                        queue.push_back(next);
                    }
                }
            }
        }

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); parcel_count];
        for (element, label) in labels.iter().enumerate() {
            let Some(a) = *label else { continue };
            for &next in graph.neighbors(element) {
                if let Some(b) = labels[next]
                    && a != b
                    && !adjacency[a].contains(&b)
                {
                    adjacency[a].push(b);
                }
            }
        }
        for list in &mut adjacency {
            list.sort_unstable();
        }

        Ok(Parcellation { labels, adjacency })
    }
}

/// Disjoint cover of the unmasked elements by atomic regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    regions: Vec<Region>,
    element_to_region: Vec<Option<RegionId>>,
    feature_count: usize,
}

impl Partition {
    /// Build a partition with one region per unmasked element.
    ///
    /// Region adjacency is the `n_ring` expansion of the element adjacency
    /// restricted to the mask, so rings never pass through masked-out
    /// elements. Region ids follow ascending element order.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::TypeInvalid`] if the signal or mask does not match
    /// the graph's element count.
    ///
    /// # Example
    ///
    /// ```
    /// use roi_grow::{ElementGraph, FeatureSignal, Partition};
    ///
    /// let graph = ElementGraph::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
    /// let signal = FeatureSignal::from_scalars(&[1.0, 2.0, 3.0]);
    /// let partition = Partition::per_element(&graph, &signal, Some(&[true, true, false]), 1).unwrap();
    ///
    /// assert_eq!(partition.len(), 2);
    /// assert_eq!(partition.region_of(2), None);
    /// ```
    pub fn per_element(
        graph: &ElementGraph,
        signal: &FeatureSignal,
        mask: Option<&[bool]>,
        n_ring: usize,
    ) -> GrowResult<Self> {
        check_signal(graph, signal)?;
        let mask = resolve_mask(graph, mask)?;
        let graph = graph.restrict(&mask)?.n_ring(n_ring);

        let mut element_to_region = vec![None; graph.element_count()];
        let mut regions = Vec::new();
        for element in (0..graph.element_count()).filter(|&e| mask[e]) {
            let mut region = Region::new(regions.len(), signal.feature_count());
            region.add_element(element, signal.row(element));
            element_to_region[element] = Some(region.id());
            regions.push(region);
        }

        for (element, slot) in element_to_region.iter().enumerate() {
            let Some(id) = *slot else {
                continue;
            };
            for &next in graph.neighbors(element) {
                if let Some(other) = element_to_region[next] {
                    regions[id].add_neighbor(other);
                }
            }
        }

        Ok(Self {
            regions,
            element_to_region,
            feature_count: signal.feature_count(),
        })
    }

    /// Build a partition with one region per parcel.
    ///
    /// Masked-out elements are left without a region even if labelled.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::TypeInvalid`] if the labels do not cover the
    /// signal's elements, reference an unknown parcel, the adjacency
    /// references an unknown parcel, or a parcel ends up with no elements.
    pub fn from_parcellation(
        parcellation: &Parcellation,
        signal: &FeatureSignal,
        mask: Option<&[bool]>,
    ) -> GrowResult<Self> {
        let element_count = signal.element_count();
        if parcellation.labels.len() != element_count {
            return Err(GrowError::invalid(format!(
                "parcellation labels {} elements but the signal has {element_count}",
                parcellation.labels.len()
            )));
        }
        if let Some(mask) = mask
            && mask.len() != element_count
        {
            return Err(GrowError::invalid(format!(
                "mask has {} entries but the signal has {element_count} elements",
                mask.len()
            )));
        }

        let parcel_count = parcellation.parcel_count();
        let mut regions: Vec<Region> = (0..parcel_count)
            .map(|id| Region::new(id, signal.feature_count()))
            .collect();
        let mut element_to_region = vec![None; element_count];

        for (element, label) in parcellation.labels.iter().enumerate() {
            let Some(parcel) = *label else { continue };
            if mask.is_some_and(|m| !m[element]) {
                continue;
            }
            if parcel >= parcel_count {
                return Err(GrowError::invalid(format!(
                    "element {element} is labelled with parcel {parcel} of {parcel_count}"
                )));
            }
            regions[parcel].add_element(element, signal.row(element));
            element_to_region[element] = Some(parcel);
        }

        for (parcel, neighbors) in parcellation.adjacency.iter().enumerate() {
            if regions[parcel].is_empty() {
                return Err(GrowError::invalid(format!("parcel {parcel} has no elements")));
            }
            for &other in neighbors {
                if other >= parcel_count {
                    return Err(GrowError::invalid(format!(
                        "parcel {parcel} is adjacent to unknown parcel {other}"
                    )));
                }
                if other != parcel {
                    regions[parcel].add_neighbor(other);
                    regions[other].add_neighbor(parcel);
                }
            }
        }

        Ok(Self {
            regions,
            element_to_region,
            feature_count: signal.feature_count(),
        })
    }

    /// Build a partition according to `params`.
    ///
    /// With `n_parcel == 0` this is [`Partition::per_element`]; otherwise the
    /// `n_ring` graph is handed to `preclusterer` and the resulting parcels
    /// become the atomic regions.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::TypeInvalid`] on shape mismatches, or if parcels
    /// are requested without a preclusterer.
    pub fn build(
        graph: &ElementGraph,
        signal: &FeatureSignal,
        mask: Option<&[bool]>,
        params: &PartitionParams,
        preclusterer: Option<&dyn Preclusterer>,
    ) -> GrowResult<Self> {
        let partition = if params.n_parcel == 0 {
            Self::per_element(graph, signal, mask, params.n_ring)?
        } else {
            let Some(preclusterer) = preclusterer else {
                return Err(GrowError::invalid(
                    "pre-clustering requested without a preclusterer",
                ));
            };
            check_signal(graph, signal)?;
            let mask = resolve_mask(graph, mask)?;
            let ring = graph.restrict(&mask)?.n_ring(params.n_ring);
            let parcellation = preclusterer.parcellate(&ring, &mask, params.n_parcel)?;
            Self::from_parcellation(&parcellation, signal, Some(&mask))?
        };

        info!(
            elements = graph.element_count(),
            regions = partition.len(),
            n_ring = params.n_ring,
            n_parcel = params.n_parcel,
            "Built region partition"
        );

        Ok(partition)
    }

    /// Atomic regions, indexed by [`RegionId`].
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Look up a region by id.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    /// Region owning an element, if any.
    #[must_use]
    pub fn region_of(&self, element: usize) -> Option<RegionId> {
        self.element_to_region.get(element).copied().flatten()
    }

    /// Element → region lookup for every element.
    #[must_use]
    pub fn element_to_region(&self) -> &[Option<RegionId>] {
        &self.element_to_region
    }

    /// Number of atomic regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Check if the partition has no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of elements the partition was built over.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.element_to_region.len()
    }

    /// Features per element.
    #[must_use]
    pub const fn feature_count(&self) -> usize {
        self.feature_count
    }
}

fn check_signal(graph: &ElementGraph, signal: &FeatureSignal) -> GrowResult<()> {
    if signal.element_count() == graph.element_count() {
        Ok(())
    } else {
        Err(GrowError::invalid(format!(
            "signal has {} elements but the graph has {}",
            signal.element_count(),
            graph.element_count()
        )))
    }
}

fn resolve_mask(graph: &ElementGraph, mask: Option<&[bool]>) -> GrowResult<Vec<bool>> {
    match mask {
        None => Ok(vec![true; graph.element_count()]),
        Some(mask) if mask.len() == graph.element_count() => Ok(mask.to_vec()),
        Some(mask) => Err(GrowError::invalid(format!(
            "mask has {} entries but the graph has {} elements",
            mask.len(),
            graph.element_count()
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn path(n: usize) -> ElementGraph {
        let edges: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
        ElementGraph::from_edges(n, &edges).expect("valid path")
    }

    fn ramp(n: usize) -> FeatureSignal {
        let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
        FeatureSignal::from_scalars(&values)
    }

    #[test]
    fn per_element_covers_every_unmasked_element_once() {
        let graph = path(6);
        let mask = [true, false, true, true, true, false];
        let partition =
            Partition::per_element(&graph, &ramp(6), Some(&mask), 1).expect("valid input");

        assert_eq!(partition.len(), 4);
        for (element, &inside) in mask.iter().enumerate() {
            let owners = partition
                .regions()
                .iter()
                .filter(|r| r.contains_element(element))
                .count();
            assert_eq!(owners, usize::from(inside));
            assert_eq!(partition.region_of(element).is_some(), inside);
        }
    }

    #[test]
    fn per_element_adjacency_respects_mask() {
        let graph = path(4);
        let partition =
            Partition::per_element(&graph, &ramp(4), Some(&[true, true, false, true]), 1)
                .expect("valid input");

        let r0 = partition.region_of(0).expect("unmasked");
        let r1 = partition.region_of(1).expect("unmasked");
        let r3 = partition.region_of(3).expect("unmasked");
        assert!(partition.regions()[r0].neighbors().contains(&r1));
        assert!(partition.regions()[r3].neighbors().is_empty());
    }

    #[test]
    fn n_ring_does_not_hop_across_mask() {
        let graph = path(3);
        let partition =
            Partition::per_element(&graph, &ramp(3), Some(&[true, false, true]), 2)
                .expect("valid input");

        let r0 = partition.region_of(0).expect("unmasked");
        let r2 = partition.region_of(2).expect("unmasked");
        assert!(partition.regions()[r0].neighbors().is_empty());
        assert!(partition.regions()[r2].neighbors().is_empty());
    }

    #[test]
    fn per_element_uses_n_ring() {
        let graph = path(5);
        let partition = Partition::per_element(&graph, &ramp(5), None, 2).expect("valid input");
        assert_eq!(partition.regions()[0].neighbors().len(), 2);
        assert_eq!(partition.regions()[2].neighbors().len(), 4);
    }

    #[test]
    fn signal_length_mismatch_is_type_invalid() {
        let result = Partition::per_element(&path(4), &ramp(3), None, 1);
        assert!(matches!(result, Err(GrowError::TypeInvalid { .. })));
    }

    #[test]
    fn mask_length_mismatch_is_type_invalid() {
        let result = Partition::per_element(&path(4), &ramp(4), Some(&[true]), 1);
        assert!(matches!(result, Err(GrowError::TypeInvalid { .. })));
    }

    #[test]
    fn bfs_preclusterer_chunks_a_path() {
        let graph = path(6);
        let parcellation = BfsPreclusterer
            .parcellate(&graph, &[true; 6], 2)
            .expect("clusterable");

        assert_eq!(
            parcellation.labels,
            vec![Some(0), Some(0), Some(0), Some(1), Some(1), Some(1)]
        );
        assert_eq!(parcellation.adjacency, vec![vec![1], vec![0]]);
    }

    #[test]
    fn build_with_parcels() {
        let graph = path(6);
        let params = PartitionParams::with_parcels(3);
        let partition = Partition::build(&graph, &ramp(6), None, &params, Some(&BfsPreclusterer))
            .expect("valid input");

        assert_eq!(partition.len(), 3);
        assert_eq!(partition.regions()[1].element_ids(), vec![2, 3]);
        assert_eq!(partition.region_of(5), Some(2));
        let neighbors: Vec<_> = partition.regions()[1].neighbors().iter().copied().collect();
        assert_eq!(neighbors, vec![0, 2]);
    }

    #[test]
    fn build_with_parcels_needs_preclusterer() {
        let params = PartitionParams::with_parcels(2);
        let result = Partition::build(&path(4), &ramp(4), None, &params, None);
        assert!(matches!(result, Err(GrowError::TypeInvalid { .. })));
    }

    #[test]
    fn empty_parcel_rejected() {
        let parcellation = Parcellation {
            labels: vec![Some(0), Some(0)],
            adjacency: vec![vec![1], vec![0]],
        };
        let result = Partition::from_parcellation(&parcellation, &ramp(2), None);
        assert!(matches!(result, Err(GrowError::TypeInvalid { .. })));
    }

    #[test]
    fn unknown_parcel_label_rejected() {
        let parcellation = Parcellation {
            labels: vec![Some(0), Some(4)],
            adjacency: vec![vec![]],
        };
        let result = Partition::from_parcellation(&parcellation, &ramp(2), None);
        assert!(matches!(result, Err(GrowError::TypeInvalid { .. })));
    }
}
