use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::stats::StatsHelper;

pub struct MatrixHelper;

impl MatrixHelper {
    /// Circularly rotates rows: row `i` lands at `(i + shift) mod rows`.
    pub fn roll_rows(matrix: ArrayView2<f64>, shift: i64) -> Array2<f64> {
        let rows = matrix.nrows();
        let offset = Self::wrap_offset(shift, rows);
        if offset == 0 {
            return matrix.to_owned();
        }
        let mut rolled = Array2::zeros(matrix.raw_dim());
        for (index, row) in matrix.axis_iter(Axis(0)).enumerate() {
            rolled.row_mut((index + offset) % rows).assign(&row);
        }
        rolled
    }

    /// Reduces a signed shift to the equivalent non-negative offset below `rows`.
    pub fn wrap_offset(shift: i64, rows: usize) -> usize {
        if rows == 0 {
            return 0;
        }
        shift.rem_euclid(rows as i64) as usize
    }

    /// Minimum of every column.
    pub fn column_minima(matrix: ArrayView2<f64>) -> Array1<f64> {
        matrix
            .axis_iter(Axis(1))
            .map(|column| StatsHelper::min(column.iter().copied()).unwrap_or(0.0))
            .collect()
    }

    pub fn global_max(matrix: ArrayView2<f64>) -> Option<f64> {
        StatsHelper::max(matrix.iter().copied())
    }
}
