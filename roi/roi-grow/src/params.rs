//! Parameters for partition construction and region growing.

use crate::error::{GrowError, GrowResult};

/// Parameters for building the atomic partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionParams {
    /// Neighborhood radius in adjacency hops. Default: 1
    pub n_ring: usize,

    /// Number of pre-clustered parcels. 0 keeps one region per element.
    /// Default: 0
    pub n_parcel: usize,
}

impl Default for PartitionParams {
    fn default() -> Self {
        Self {
            n_ring: 1,
            n_parcel: 0,
        }
    }
}

impl PartitionParams {
    /// Params for a per-element partition over an n-ring neighborhood.
    #[must_use]
    pub fn with_n_ring(n_ring: usize) -> Self {
        Self {
            n_ring,
            ..Default::default()
        }
    }

    /// Params for a partition of pre-clustered parcels.
    #[must_use]
    pub fn with_parcels(n_parcel: usize) -> Self {
        Self {
            n_parcel,
            ..Default::default()
        }
    }
}

/// Size at which each growing region stops.
///
/// Sizes are counted in elements.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopCriteria {
    /// The same target size for every seed group.
    Uniform(usize),
    /// One target size per seed group.
    PerGroup(Vec<usize>),
}

impl StopCriteria {
    /// Resolve to one target size per seed group.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::StopCriteriaMismatch`] if per-group criteria do
    /// not match the number of groups.
    pub fn resolve(&self, groups: usize) -> GrowResult<Vec<usize>> {
        match self {
            Self::Uniform(size) => Ok(vec![*size; groups]),
            Self::PerGroup(sizes) if sizes.len() == groups => Ok(sizes.clone()),
            Self::PerGroup(sizes) => Err(GrowError::StopCriteriaMismatch {
                groups,
                criteria: sizes.len(),
            }),
        }
    }
}

impl From<usize> for StopCriteria {
    fn from(size: usize) -> Self {
        Self::Uniform(size)
    }
}

impl From<Vec<usize>> for StopCriteria {
    fn from(sizes: Vec<usize>) -> Self {
        Self::PerGroup(sizes)
    }
}

impl From<&[usize]> for StopCriteria {
    fn from(sizes: &[usize]) -> Self {
        Self::PerGroup(sizes.to_vec())
    }
}

/// Parameters for adaptive region growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdaptiveParams {
    /// Sample the assessment every this many absorbed regions. Default: 1
    pub assess_step: usize,

    /// Half-width of the centered moving average applied to the samples.
    /// 0 disables smoothing. Default: 0
    pub half_width: usize,

    /// Also return the fully grown regions. Default: false
    pub whole_results: bool,
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            assess_step: 1,
            half_width: 0,
            whole_results: false,
        }
    }
}

impl AdaptiveParams {
    /// Set the sampling cadence.
    #[must_use]
    pub const fn with_assess_step(mut self, step: usize) -> Self {
        self.assess_step = step;
        self
    }

    /// Set the smoothing half-width.
    #[must_use]
    pub const fn with_half_width(mut self, half_width: usize) -> Self {
        self.half_width = half_width;
        self
    }

    /// Keep the fully grown regions in the outcome.
    #[must_use]
    pub const fn with_whole_results(mut self, whole: bool) -> Self {
        self.whole_results = whole;
        self
    }
}
