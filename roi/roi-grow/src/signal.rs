//! Dense per-element feature signal.

use nalgebra::{DMatrix, DVector};

use crate::error::{GrowError, GrowResult};

/// An element × feature array.
///
/// Row `i` holds the feature vector of element `i` (for example the
/// activation values of a vertex across contrasts).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureSignal {
    data: DMatrix<f64>,
}

impl FeatureSignal {
    /// Wrap an existing matrix (rows = elements, columns = features).
    #[must_use]
    pub const fn from_matrix(data: DMatrix<f64>) -> Self {
        Self { data }
    }

    /// Build a single-feature signal from one scalar per element.
    ///
    /// # Example
    ///
    /// ```
    /// use roi_grow::FeatureSignal;
    ///
    /// let signal = FeatureSignal::from_scalars(&[1.0, 2.0, 3.0]);
    /// assert_eq!(signal.element_count(), 3);
    /// assert_eq!(signal.feature_count(), 1);
    /// ```
    #[must_use]
    pub fn from_scalars(values: &[f64]) -> Self {
        Self {
            data: DMatrix::from_column_slice(values.len(), 1, values),
        }
    }

    /// Build a signal from per-element rows.
    ///
    /// # Errors
    ///
    /// Returns [`GrowError::TypeInvalid`] if the rows have different lengths.
    pub fn from_rows(rows: &[Vec<f64>]) -> GrowResult<Self> {
        let features = rows.first().map_or(0, Vec::len);
        if let Some((element, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != features) {
            return Err(GrowError::invalid(format!(
                "element {element} has {} features, expected {features}",
                row.len()
            )));
        }

        let data = DMatrix::from_fn(rows.len(), features, |r, c| rows[r][c]);
        Ok(Self { data })
    }

    /// Number of elements (rows).
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.data.nrows()
    }

    /// Number of features per element (columns).
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.data.ncols()
    }

    /// Feature vector of one element.
    ///
    /// # Panics
    ///
    /// Panics if `element` is out of range.
    #[must_use]
    pub fn row(&self, element: usize) -> DVector<f64> {
        self.data.row(element).transpose()
    }

    /// The underlying matrix.
    #[must_use]
    pub const fn as_matrix(&self) -> &DMatrix<f64> {
        &self.data
    }
}
