use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

/// Trapezoidal integration with unit sample spacing.
pub struct IntegrationHelper;

impl IntegrationHelper {
    pub fn trapezoid(values: ArrayView1<f64>) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        values
            .iter()
            .zip(values.iter().skip(1))
            .map(|(left, right)| (left + right) / 2.0)
            .sum()
    }

    /// Integrates every column over its rows.
    pub fn column_integrals(matrix: ArrayView2<f64>) -> Array1<f64> {
        matrix
            .axis_iter(Axis(1))
            .map(Self::trapezoid)
            .collect()
    }

    /// Double integral: rows first (per column), then across the column totals.
    pub fn volume(matrix: ArrayView2<f64>) -> f64 {
        let per_column = Self::column_integrals(matrix);
        Self::trapezoid(per_column.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn trapezoid_of_linear_ramp() {
        let ramp = array![0.0, 1.0, 2.0, 3.0];
        assert_relative_eq!(IntegrationHelper::trapezoid(ramp.view()), 4.5);
        assert_eq!(IntegrationHelper::trapezoid(array![7.0].view()), 0.0);
    }

    #[test]
    fn volume_of_unit_square_grid() {
        let ones = Array2::<f64>::ones((4, 4));
        assert_relative_eq!(IntegrationHelper::volume(ones.view()), 9.0);
    }
}
