use ndarray::{Array2, ArrayView2};

use crate::math::{IntegrationHelper, MatrixHelper};
use crate::prelude::{Shape, StageError, StageResult};

/// Retention-time matrix of one GCxGC run.
///
/// Rows run along the second dimension (time within a modulation, seconds),
/// stored descending so row 0 holds the latest intra-modulation sample.
/// Columns run along the first dimension (modulation start, minutes),
/// ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromatogram2D {
    values: Array2<f64>,
    rt2_seconds: Vec<f64>,
    rt1_minutes: Vec<f64>,
}

impl Chromatogram2D {
    pub fn new(values: Array2<f64>, rt2_seconds: Vec<f64>, rt1_minutes: Vec<f64>) -> StageResult<Self> {
        let axes = (rt2_seconds.len(), rt1_minutes.len());
        if values.dim() != axes {
            return Err(StageError::ShapeMismatch {
                context: "chromatogram axes".into(),
                expected: axes,
                found: values.dim(),
            });
        }
        Ok(Self {
            values,
            rt2_seconds,
            rt1_minutes,
        })
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Replaces the matrix while keeping both axes; the shape must not change.
    pub fn with_values(self, values: Array2<f64>) -> StageResult<Self> {
        if values.dim() != self.values.dim() {
            return Err(StageError::ShapeMismatch {
                context: "replacement matrix".into(),
                expected: self.values.dim(),
                found: values.dim(),
            });
        }
        Ok(Self { values, ..self })
    }

    pub fn shape(&self) -> Shape {
        self.values.dim()
    }

    pub fn rt2_seconds(&self) -> &[f64] {
        &self.rt2_seconds
    }

    pub fn rt1_minutes(&self) -> &[f64] {
        &self.rt1_minutes
    }

    /// Double trapezoidal integral with unit spacing.
    pub fn volume(&self) -> f64 {
        IntegrationHelper::volume(self.values.view())
    }

    pub fn max(&self) -> Option<f64> {
        MatrixHelper::global_max(self.values.view())
    }

    /// Rows as nested vectors, the layout the mask GUI exchanges.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.outer_iter().map(|row| row.to_vec()).collect()
    }
}
