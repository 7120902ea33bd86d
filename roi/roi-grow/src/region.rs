//! Atomic partition regions.
//!
//! A [`Region`] owns a set of elements with their feature vectors and knows
//! which other regions of the same partition it touches. Regions refer to each
//! other by [`RegionId`], an index into the partition's region arena.

// Element counts don't overflow f64 precision in practice
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeSet;

use hashbrown::HashMap;
use nalgebra::DVector;

use crate::error::{GrowError, GrowResult};

/// Index of a region in a partition's region arena.
pub type RegionId = usize;

/// A unit of a partition: owned elements plus a neighbor set.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    elements: HashMap<usize, DVector<f64>>,
    /// Running sum of all owned feature vectors.
    signal_sum: DVector<f64>,
    /// Ordered so that nearest-neighbor ties resolve to the lowest id.
    neighbors: BTreeSet<RegionId>,
}

impl Region {
    /// Create an empty region whose elements carry `feature_count` features.
    #[must_use]
    pub fn new(id: RegionId, feature_count: usize) -> Self {
        Self {
            id,
            elements: HashMap::new(),
            signal_sum: DVector::zeros(feature_count),
            neighbors: BTreeSet::new(),
        }
    }

    /// The region's id.
    #[must_use]
    pub const fn id(&self) -> RegionId {
        self.id
    }

    /// Add an element and its feature vector.
    ///
    /// Callers guarantee that an element is never added twice.
    pub fn add_element(&mut self, element: usize, signal: DVector<f64>) {
        self.signal_sum += &signal;
        self.elements.insert(element, signal);
    }

    /// Number of owned elements.
    #[must_use]
    pub fn size(&self) -> usize {
        self.elements.len()
    }

    /// Check if the region owns no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Owned elements and their feature vectors.
    #[must_use]
    pub const fn elements(&self) -> &HashMap<usize, DVector<f64>> {
        &self.elements
    }

    /// Owned element ids in ascending order.
    #[must_use]
    pub fn element_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.elements.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Check if an element belongs to this region.
    #[must_use]
    pub fn contains_element(&self, element: usize) -> bool {
        self.elements.contains_key(&element)
    }

    /// Sum of all owned feature vectors.
    #[must_use]
    pub const fn signal_sum(&self) -> &DVector<f64> {
        &self.signal_sum
    }

    /// Arithmetic mean of the owned feature vectors.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::EmptyRegion`] if the region owns no elements.
    pub fn mean_signal(&self) -> GrowResult<DVector<f64>> {
        if self.elements.is_empty() {
            return Err(GrowError::EmptyRegion { region: self.id });
        }
        Ok(&self.signal_sum / self.elements.len() as f64)
    }

    /// Mean signal collapsed to a scalar by averaging over features.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::EmptyRegion`] if the region owns no elements.
    pub fn scalar_mean(&self) -> GrowResult<f64> {
        Ok(self.mean_signal()?.mean())
    }

    /// Neighboring region ids, ascending.
    #[must_use]
    pub const fn neighbors(&self) -> &BTreeSet<RegionId> {
        &self.neighbors
    }

    /// Add a neighbor. No-op if already present.
    pub fn add_neighbor(&mut self, region: RegionId) {
        self.neighbors.insert(region);
    }

    /// Remove a neighbor. Returns `true` if it was present.
    pub fn remove_neighbor(&mut self, region: RegionId) -> bool {
        self.neighbors.remove(&region)
    }

    /// Keep only the neighbors for which `keep` returns `true`.
    pub(crate) fn retain_neighbors(&mut self, keep: impl FnMut(&RegionId) -> bool) {
        self.neighbors.retain(keep);
    }

    /// Absorb another region's elements and running sum.
    pub(crate) fn absorb_elements(&mut self, other: &Self) {
        self.signal_sum += &other.signal_sum;
        self.elements
            .extend(other.elements.iter().map(|(&id, signal)| (id, signal.clone())));
    }

    /// Find the neighbor closest in feature space.
    ///
    /// The Euclidean distance between mean signals is divided by
    /// `s - s_min + 1`, where `s` is the sum of both mean vectors' components
    /// and `s_min` the smallest such sum over all neighbors. This down-weights
    /// comparisons between high-magnitude region pairs. Ties go to the lowest
    /// region id.
    ///
    /// `arena` is the partition's region array that neighbor ids index into.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::NoNeighbors`] if the neighbor set is empty, or
    /// [`GrowError::EmptyRegion`] if this region or a neighbor is empty.
    pub fn nearest_neighbor(&self, arena: &[Self]) -> GrowResult<(RegionId, f64)> {
        if self.neighbors.is_empty() {
            return Err(GrowError::NoNeighbors { region: self.id });
        }

        let own = self.mean_signal()?;
        let own_sum = own.sum();

        let mut candidates = Vec::with_capacity(self.neighbors.len());
        for &id in &self.neighbors {
            let mean = arena[id].mean_signal()?;
            let raw = (&own - &mean).norm();
            candidates.push((id, raw, own_sum + mean.sum()));
        }

        let min_sum = candidates
            .iter()
            .map(|&(_, _, sum)| sum)
            .fold(f64::INFINITY, f64::min);

        let mut best = (candidates[0].0, f64::INFINITY);
        for (index, &(id, raw, sum)) in candidates.iter().enumerate() {
            let distance = raw / (sum - min_sum + 1.0);
            if index == 0 || distance < best.1 {
                best = (id, distance);
            }
        }

        Ok(best)
    }
}
