//! Retrospective rollback for adaptive region growing.
//!
//! The assessment signal along a growth history is noisy and rarely monotonic,
//! so regions are grown past their optimum and then truncated to the best
//! sampled cut.

// Window sizes don't overflow f64 precision in practice
#![allow(clippy::cast_precision_loss)]

use tracing::debug;

use crate::evolving::EvolvingRegion;
use crate::region::Region;
use crate::result::AssessmentSample;

/// Centered moving average with a window of `2 * half_width + 1` samples.
///
/// The window is truncated at both ends, so every output averages only real
/// samples. `half_width == 0` returns the input unchanged.
///
/// # Example
///
/// ```
/// use roi_grow::smooth;
///
/// let smoothed = smooth(&[0.0, 3.0, 0.0, 3.0], 1);
/// assert_eq!(smoothed, vec![1.5, 1.0, 2.0, 1.5]);
/// ```
#[must_use]
pub fn smooth(values: &[f64], half_width: usize) -> Vec<f64> {
    if half_width == 0 {
        return values.to_vec();
    }

    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half_width);
            let end = (i + half_width + 1).min(values.len());
            let window = &values[start..end];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Index of the best (first maximal) smoothed sample.
///
/// Returns `None` when there are no samples.
#[must_use]
pub fn best_sample(samples: &[AssessmentSample], half_width: usize) -> Option<usize> {
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    let smoothed = smooth(&values, half_width);

    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in smoothed.iter().enumerate() {
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((index, value));
        }
    }

    best.map(|(index, _)| index)
}

/// Component length kept when rolling back to sample `index`.
///
/// The n-th sample stands for the first `n * assess_step` absorbed regions,
/// capped at the grown component length.
#[must_use]
pub fn cut_length(index: usize, assess_step: usize, component_len: usize) -> usize {
    (index + 1).saturating_mul(assess_step).min(component_len)
}

/// Rebuild `grown` from the first `cut` regions of its component.
///
/// The result is a new evolving region with the same id and seeds; `grown`
/// is left untouched.
#[must_use]
pub fn rollback(grown: &EvolvingRegion, cut: usize, arena: &[Region]) -> EvolvingRegion {
    let feature_count = grown.region().signal_sum().len();
    let mut region = EvolvingRegion::new(grown.id(), grown.seeds().to_vec(), feature_count);

    let cut = cut.min(grown.component().len());
    for &id in &grown.component()[..cut] {
        region.merge(&arena[id]);
    }

    debug!(
        region = grown.id(),
        grown = grown.component().len(),
        kept = cut,
        "Rolled back region to best cut"
    );

    region
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    fn sample(component_len: usize, value: f64) -> AssessmentSample {
        AssessmentSample {
            component_len,
            value,
            outer_mean: None,
            inner_min: 0.0,
        }
    }

    #[test]
    fn smooth_without_width_is_identity() {
        assert_eq!(smooth(&[1.0, 5.0, 2.0], 0), vec![1.0, 5.0, 2.0]);
    }

    #[test]
    fn smooth_truncates_window_at_ends() {
        let smoothed = smooth(&[3.0, 0.0, 0.0, 6.0], 1);
        assert_relative_eq!(smoothed[0], 1.5);
        assert_relative_eq!(smoothed[1], 1.0);
        assert_relative_eq!(smoothed[2], 2.0);
        assert_relative_eq!(smoothed[3], 3.0);
    }

    #[test]
    fn smooth_empty() {
        assert!(smooth(&[], 3).is_empty());
    }

    #[test]
    fn best_sample_takes_first_maximum() {
        let samples = [sample(2, 1.0), sample(3, 4.0), sample(4, 4.0), sample(5, 0.5)];
        assert_eq!(best_sample(&samples, 0), Some(1));
    }

    #[test]
    fn cut_length_counts_steps_from_first_sample() {
        // Single seed, step 1: samples start at component length 2, but the
        // first sample keeps one region.
        assert_eq!(cut_length(0, 1, 10), 1);
        assert_eq!(cut_length(3, 1, 10), 4);
        assert_eq!(cut_length(2, 3, 20), 9);
        assert_eq!(cut_length(5, 3, 10), 10);
    }

    #[test]
    fn smoothing_moves_the_cut_past_a_spike() {
        // A lone spike loses to a broad plateau once smoothed.
        let values = [0.0, 0.0, 9.0, 0.0, 0.0, 4.0, 4.0, 4.0];
        let samples: Vec<AssessmentSample> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| sample(i + 2, v))
            .collect();
        assert_eq!(best_sample(&samples, 0), Some(2));
        assert_eq!(best_sample(&samples, 1), Some(6));
    }

    #[test]
    fn best_sample_without_samples() {
        assert_eq!(best_sample(&[], 2), None);
    }

    #[test]
    fn rollback_keeps_a_prefix() {
        let arena: Vec<Region> = (0..4)
            .map(|id| {
                let mut region = Region::new(id, 1);
                region.add_element(id, DVector::from_vec(vec![1.0]));
                region
            })
            .collect();
        let mut grown = EvolvingRegion::new(0, vec![2], 1);
        for id in [2, 1, 3, 0] {
            grown.merge(&arena[id]);
        }

        let rolled = rollback(&grown, 2, &arena);
        assert_eq!(rolled.component(), &[2, 1]);
        assert_eq!(rolled.seeds(), &[2]);
        assert_eq!(rolled.element_ids(), vec![1, 2]);
        assert_eq!(grown.component().len(), 4);

        let capped = rollback(&grown, 10, &arena);
        assert_eq!(capped.component(), grown.component());
    }
}
