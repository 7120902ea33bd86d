//! Region growing over partition graphs.
//!
//! This crate grows regions of interest from seed elements on an arbitrary
//! element graph (mesh vertices, voxels, cortical surface nodes) carrying a
//! per-element feature signal. Common use cases include:
//!
//! - Seeded region growing to a target size
//! - Adaptive region growing that stops at the strongest boundary
//! - Connectivity flood fill after cutting edges by hand
//!
//! # Overview
//!
//! Elements are first grouped into atomic [`Region`]s, one per element or one
//! per parcel of a [`Preclusterer`]. A [`RegionGrow`] then grows one
//! [`EvolvingRegion`] per seed group by repeatedly absorbing the neighboring
//! atomic region whose mean signal is closest. Two seed groups never claim the
//! same atomic region.
//!
//! # Quick Start
//!
//! ```
//! use roi_grow::{ElementGraph, FeatureSignal, PartitionParams, RegionGrow};
//!
//! // 0 - 1 - 2 - 3 - 4
//! let graph = ElementGraph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
//! let signal = FeatureSignal::from_scalars(&[1.0, 1.1, 1.2, 7.0, 7.1]);
//!
//! let grower =
//!     RegionGrow::build_partition(&graph, &signal, None, &PartitionParams::default(), None)
//!         .unwrap();
//! let regions = grower.srg_parcel(&[vec![0]], 3).unwrap();
//!
//! assert_eq!(regions[0].element_ids(), vec![0, 1, 2]);
//! ```
//!
//! # Adaptive Growing
//!
//! Adaptive growing samples an [`Assessment`] while growing and rolls each
//! region back to its best sample. With the default step of one, the n-th
//! sample keeps the first n absorbed regions:
//!
//! ```
//! use roi_grow::{AdaptiveParams, ElementGraph, FeatureSignal, PartitionParams, RegionGrow};
//!
//! let edges: Vec<(usize, usize)> = (1..8).map(|i| (i - 1, i)).collect();
//! let graph = ElementGraph::from_edges(8, &edges).unwrap();
//! let signal = FeatureSignal::from_scalars(&[1.0, 1.0, 1.0, 1.0, 6.0, 6.0, 6.0, 6.0]);
//!
//! let mut grower =
//!     RegionGrow::build_partition(&graph, &signal, None, &PartitionParams::default(), None)
//!         .unwrap();
//! grower.set_assessment("transition_level").unwrap();
//!
//! let outcome = grower
//!     .arg_parcel(&[vec![0]], 8, &AdaptiveParams::default())
//!     .unwrap();
//! // The 1 | 6 boundary is sampled third, at component length 4.
//! assert_eq!(outcome.regions[0].element_ids(), vec![0, 1, 2]);
//! ```

#![warn(missing_docs)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod adaptive;
mod assess;
mod connectivity;
mod error;
mod evolving;
mod graph;
mod grow;
mod params;
mod partition;
mod region;
mod region_grow;
mod result;
mod signal;

pub use adaptive::{best_sample, cut_length, rollback, smooth};
pub use assess::Assessment;
pub use connectivity::connectivity_grow;
pub use error::{GrowError, GrowResult};
pub use evolving::EvolvingRegion;
pub use graph::ElementGraph;
pub use params::{AdaptiveParams, PartitionParams, StopCriteria};
pub use partition::{BfsPreclusterer, Parcellation, Partition, Preclusterer};
pub use region::{Region, RegionId};
pub use region_grow::RegionGrow;
pub use result::{AdaptiveOutcome, AssessmentSample, GrowOutcome, MergeEvent};
pub use signal::FeatureSignal;
