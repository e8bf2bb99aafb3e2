use crate::data::Chromatogram2D;
use crate::math::MatrixHelper;
use crate::prelude::{ProcessingStage, StageOutput, StageResult};

/// Corrects modulation phase by rotating rows; positive shifts move rows down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseAligner {
    shift: i64,
}

impl PhaseAligner {
    pub fn new(shift: i64) -> Self {
        Self { shift }
    }

    pub fn shift(&self) -> i64 {
        self.shift
    }
}

impl ProcessingStage for PhaseAligner {
    fn label(&self) -> &'static str {
        "phase"
    }

    fn execute(&self, input: Chromatogram2D) -> StageResult<StageOutput> {
        let (rows, _) = input.shape();
        if MatrixHelper::wrap_offset(self.shift, rows) == 0 {
            return Ok(StageOutput::new(input).with_note("phase unchanged"));
        }
        let rolled = MatrixHelper::roll_rows(input.values(), self.shift);
        Ok(StageOutput::new(input.with_values(rolled)?)
            .with_note(format!("phase shifted by {} rows", self.shift)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn numbered(rows: usize, columns: usize) -> Chromatogram2D {
        let values = Array2::from_shape_fn((rows, columns), |(r, c)| (r * 10 + c) as f64);
        Chromatogram2D::new(
            values,
            (0..rows).rev().map(|r| r as f64).collect(),
            (0..columns).map(|c| c as f64).collect(),
        )
        .unwrap()
    }

    fn shifted(chrom: Chromatogram2D, shift: i64) -> Chromatogram2D {
        PhaseAligner::new(shift).execute(chrom).unwrap().chromatogram
    }

    #[test]
    fn shifts_compose_modulo_row_count() {
        let rows = 5;
        for (a, b) in [(1, 2), (3, 4), (-2, 6), (7, -11), (0, 5)] {
            let twice = shifted(shifted(numbered(rows, 3), a), b);
            let once = shifted(numbered(rows, 3), (a + b).rem_euclid(rows as i64));
            assert_eq!(twice, once, "a={} b={}", a, b);
        }
    }

    #[test]
    fn rotation_loses_no_data() {
        let original = numbered(4, 2);
        let rolled = shifted(original.clone(), 1);
        assert_eq!(rolled.values()[[0, 0]], original.values()[[3, 0]]);
        assert_eq!(rolled.values()[[1, 1]], original.values()[[0, 1]]);
        let mut before: Vec<f64> = original.values().iter().copied().collect();
        let mut after: Vec<f64> = rolled.values().iter().copied().collect();
        before.sort_by(f64::total_cmp);
        after.sort_by(f64::total_cmp);
        assert_eq!(before, after);
    }

    #[test]
    fn axes_stay_in_place() {
        let original = numbered(3, 2);
        let rolled = shifted(original.clone(), 2);
        assert_eq!(rolled.rt2_seconds(), original.rt2_seconds());
    }
}
