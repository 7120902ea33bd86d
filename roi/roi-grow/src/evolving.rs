//! Growing composite regions.

use std::collections::BTreeSet;

use hashbrown::HashSet;
use nalgebra::DVector;

use crate::error::GrowResult;
use crate::region::{Region, RegionId};

/// A region that grows by absorbing atomic partition regions.
///
/// Besides the merged elements it records the seed elements it started from
/// and the ordered history of absorbed regions.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolvingRegion {
    region: Region,
    seeds: Vec<usize>,
    component: Vec<RegionId>,
    /// Same ids as `component`, for constant-time membership checks.
    members: HashSet<RegionId>,
}

impl EvolvingRegion {
    /// Create an empty evolving region for a seed group.
    ///
    /// `id` identifies the region among its peers (the seed group index).
    #[must_use]
    pub fn new(id: RegionId, seeds: Vec<usize>, feature_count: usize) -> Self {
        Self {
            region: Region::new(id, feature_count),
            seeds,
            component: Vec::new(),
            members: HashSet::new(),
        }
    }

    /// Absorb an atomic region.
    ///
    /// Its elements are copied in, it is appended to the component history,
    /// and its neighbors become candidates unless already absorbed.
    pub fn merge(&mut self, atomic: &Region) {
        self.region.absorb_elements(atomic);
        self.component.push(atomic.id());
        self.members.insert(atomic.id());
        for &neighbor in atomic.neighbors() {
            self.add_neighbor(neighbor);
        }
        self.region.remove_neighbor(atomic.id());
    }

    /// Add a candidate neighbor unless it is already part of the component.
    pub fn add_neighbor(&mut self, region: RegionId) {
        if !self.members.contains(&region) {
            self.region.add_neighbor(region);
        }
    }

    /// Remove a candidate neighbor. Returns `true` if it was present.
    pub fn remove_neighbor(&mut self, region: RegionId) -> bool {
        self.region.remove_neighbor(region)
    }

    pub(crate) fn retain_neighbors(&mut self, keep: impl FnMut(&RegionId) -> bool) {
        self.region.retain_neighbors(keep);
    }

    /// Seed elements this region was started from.
    #[must_use]
    pub fn seeds(&self) -> &[usize] {
        &self.seeds
    }

    /// Absorbed atomic regions, in merge order.
    #[must_use]
    pub fn component(&self) -> &[RegionId] {
        &self.component
    }

    /// Check if an atomic region has been absorbed.
    #[must_use]
    pub fn has_absorbed(&self, region: RegionId) -> bool {
        self.members.contains(&region)
    }

    /// The merged region.
    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    /// Peer index of this region.
    #[must_use]
    pub const fn id(&self) -> RegionId {
        self.region.id()
    }

    /// Number of merged elements.
    #[must_use]
    pub fn size(&self) -> usize {
        self.region.size()
    }

    /// Merged element ids in ascending order.
    #[must_use]
    pub fn element_ids(&self) -> Vec<usize> {
        self.region.element_ids()
    }

    /// Current candidate neighbors.
    #[must_use]
    pub const fn neighbors(&self) -> &BTreeSet<RegionId> {
        self.region.neighbors()
    }

    /// Mean feature vector of the merged elements.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GrowError::EmptyRegion`] before anything is merged.
    pub fn mean_signal(&self) -> GrowResult<DVector<f64>> {
        self.region.mean_signal()
    }

    /// Closest candidate neighbor; see [`Region::nearest_neighbor`].
    ///
    /// # Errors
    ///
    /// Fails if there are no candidates or nothing has been merged yet.
    pub fn nearest_neighbor(&self, arena: &[Region]) -> GrowResult<(RegionId, f64)> {
        self.region.nearest_neighbor(arena)
    }
}
