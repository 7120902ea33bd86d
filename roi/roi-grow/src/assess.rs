//! Quality assessment of grown regions.
//!
//! Adaptive growing samples one of these metrics along the growth history and
//! rolls back to the sample with the highest value.

// Element counts don't overflow f64 precision in practice
#![allow(clippy::cast_precision_loss)]

use std::fmt;
use std::str::FromStr;

use nalgebra::DVector;

use crate::error::{GrowError, GrowResult};
use crate::evolving::EvolvingRegion;
use crate::region::Region;

/// A scalar "goodness" metric for an evolving region. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Assessment {
    /// Mean signal distance across the region boundary, averaged over every
    /// (inner boundary region, outer neighbor) pair.
    #[default]
    TransitionLevel,
    /// Distance between the region's mean signal and the average mean signal
    /// of its candidate neighbors.
    MeanSignalDistance,
    /// Reciprocal of the mean squared deviation inside the region.
    GrayLevelInner,
    /// Reciprocal of the mean squared deviation inside the region plus that
    /// of its complement.
    GrayLevelMean,
    /// Reciprocal of the summed squared deviation inside the region plus that
    /// of its complement.
    GrayLevelSum,
}

impl Assessment {
    /// Every strategy, in registration order.
    pub const ALL: [Self; 5] = [
        Self::TransitionLevel,
        Self::MeanSignalDistance,
        Self::GrayLevelInner,
        Self::GrayLevelMean,
        Self::GrayLevelSum,
    ];

    /// Names accepted by [`Assessment::from_str`], in registration order.
    pub const NAMES: [&'static str; 5] = [
        "transition_level",
        "mean_signal_distance",
        "gray_level_inner",
        "gray_level_mean",
        "gray_level_sum",
    ];

    /// The strategy's registered name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TransitionLevel => Self::NAMES[0],
            Self::MeanSignalDistance => Self::NAMES[1],
            Self::GrayLevelInner => Self::NAMES[2],
            Self::GrayLevelMean => Self::NAMES[3],
            Self::GrayLevelSum => Self::NAMES[4],
        }
    }

    /// Evaluate the metric on `region`.
    ///
    /// `arena` is the atomic partition the region was grown over; the
    /// complement-based variants treat every element of `arena` not absorbed
    /// by `region` as the complement.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::EmptyRegion`] if `region` has no elements.
    pub fn assess(self, region: &EvolvingRegion, arena: &[Region]) -> GrowResult<f64> {
        match self {
            Self::TransitionLevel => transition_level(region, arena),
            Self::MeanSignalDistance => mean_signal_distance(region, arena),
            Self::GrayLevelInner => {
                let (inner, count) = squared_deviation(region.region())?;
                Ok(reciprocal(inner / count as f64))
            }
            Self::GrayLevelMean => {
                let (inner, inner_count) = squared_deviation(region.region())?;
                let (outer, outer_count) = complement_deviation(region, arena);
                let outer_mean = if outer_count == 0 {
                    0.0
                } else {
                    outer / outer_count as f64
                };
                Ok(reciprocal(inner / inner_count as f64 + outer_mean))
            }
            Self::GrayLevelSum => {
                let (inner, _) = squared_deviation(region.region())?;
                let (outer, _) = complement_deviation(region, arena);
                Ok(reciprocal(inner + outer))
            }
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Assessment {
    type Err = GrowError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| GrowError::UnknownAssessment {
                name: name.to_owned(),
            })
    }
}

fn reciprocal(variance: f64) -> f64 {
    1.0 / variance.max(f64::EPSILON)
}

fn transition_level(region: &EvolvingRegion, arena: &[Region]) -> GrowResult<f64> {
    let mut total = 0.0;
    let mut pairs = 0usize;

    for &inner in region.component() {
        let atomic = &arena[inner];
        let outers: Vec<usize> = atomic
            .neighbors()
            .iter()
            .copied()
            .filter(|&outer| !region.has_absorbed(outer))
            .collect();
        if outers.is_empty() {
            continue;
        }

        let inner_mean = atomic.mean_signal()?;
        for outer in outers {
            total += (&inner_mean - arena[outer].mean_signal()?).norm();
            pairs += 1;
        }
    }

    if pairs == 0 {
        // No boundary: nothing to contrast against.
        return Ok(0.0);
    }
    Ok(total / pairs as f64)
}

fn mean_signal_distance(region: &EvolvingRegion, arena: &[Region]) -> GrowResult<f64> {
    let own = region.mean_signal()?;
    if region.neighbors().is_empty() {
        return Ok(0.0);
    }

    let mut outer: DVector<f64> = DVector::zeros(own.len());
    for &id in region.neighbors() {
        outer += arena[id].mean_signal()?;
    }
    outer /= region.neighbors().len() as f64;

    Ok((own - outer).norm())
}

/// Sum of squared deviations from the region's mean, and the element count.
fn squared_deviation(region: &Region) -> GrowResult<(f64, usize)> {
    let mean = region.mean_signal()?;
    let sum: f64 = region
        .elements()
        .values()
        .map(|signal| (signal - &mean).norm_squared())
        .sum();
    Ok((sum, region.size()))
}

/// Squared deviation of every element outside `region`, around their own mean.
fn complement_deviation(region: &EvolvingRegion, arena: &[Region]) -> (f64, usize) {
    let outside = || {
        arena
            .iter()
            .filter(|atomic| !region.has_absorbed(atomic.id()))
    };

    let mut sum: DVector<f64> = DVector::zeros(region.region().signal_sum().len());
    let mut count = 0usize;
    for atomic in outside() {
        sum += atomic.signal_sum();
        count += atomic.size();
    }
    if count == 0 {
        return (0.0, 0);
    }
    let mean = sum / count as f64;

    let deviation: f64 = outside()
        .flat_map(|atomic| atomic.elements().values())
        .map(|signal| (signal - &mean).norm_squared())
        .sum();
    (deviation, count)
}
