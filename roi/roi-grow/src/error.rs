//! Error types for region growing.

use thiserror::Error;

use crate::region::RegionId;

/// Result type for region growing operations.
pub type GrowResult<T> = Result<T, GrowError>;

/// Errors that can occur while building a partition or growing regions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GrowError {
    /// A seed element has no owning atomic region (masked out or out of range).
    #[error("seed element {element} is outside the mask")]
    SeedOutOfMask {
        /// The offending seed element.
        element: usize,
    },

    /// Two seed groups resolve to the same atomic region.
    #[error("seed groups {first} and {second} both claim region {region}")]
    ConflictingSeeds {
        /// The contested atomic region.
        region: RegionId,
        /// Index of the group that claimed the region first.
        first: usize,
        /// Index of the group that tried to claim it again.
        second: usize,
    },

    /// Input has the wrong shape or kind for the requested operation.
    #[error("invalid input: {reason}")]
    TypeInvalid {
        /// What was wrong with the input.
        reason: String,
    },

    /// No assessment strategy is registered under this name.
    #[error("unknown assessment '{name}'")]
    UnknownAssessment {
        /// The requested strategy name.
        name: String,
    },

    /// A statistic was requested from a region that owns no elements.
    #[error("region {region} has no elements")]
    EmptyRegion {
        /// The empty region.
        region: RegionId,
    },

    /// A nearest-neighbor query was made on a region with no neighbors.
    #[error("region {region} has no neighbors")]
    NoNeighbors {
        /// The isolated region.
        region: RegionId,
    },

    /// No seeds were provided, or a seed group was empty.
    #[error("no seed elements provided for region growing")]
    NoSeeds,

    /// Per-group stop criteria do not line up with the seed groups.
    #[error("{criteria} stop criteria given for {groups} seed groups")]
    StopCriteriaMismatch {
        /// Number of seed groups.
        groups: usize,
        /// Number of stop criteria.
        criteria: usize,
    },

    /// The partition holds no regions.
    #[error("partition is empty")]
    EmptyPartition,
}

impl GrowError {
    /// Build a [`GrowError::TypeInvalid`] from any displayable reason.
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::TypeInvalid {
            reason: reason.into(),
        }
    }
}
