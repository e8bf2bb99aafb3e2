use ndarray::Array2;

use crate::data::Chromatogram2D;
use crate::math::StatsHelper;
use crate::prelude::{StageError, StageResult};

use super::split::SegmentedTrace;

const SECONDS_PER_MINUTE: f64 = 60.0;
/// Decimal places kept on the second retention-time axis.
const RT2_DECIMALS: u32 = 3;

/// Assembles modulations into the retention-time matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reshaper;

impl Reshaper {
    pub fn new() -> Self {
        Self
    }

    /// Column `c` holds modulation `c`; row `r` holds intra-modulation sample
    /// `samples_per_segment - 1 - r`, so the second dimension grows upward.
    pub fn reshape(&self, segmented: &SegmentedTrace) -> StageResult<Chromatogram2D> {
        let rows = segmented.samples_per_segment();
        let columns = segmented.segment_count();
        if rows == 0 || columns == 0 {
            return Err(StageError::Precondition(
                "cannot reshape a trace without samples".into(),
            ));
        }

        let mut values = Array2::zeros((rows, columns));
        for (column, segment) in segmented.segments().enumerate() {
            for (offset, &intensity) in segment.iter().enumerate() {
                values[[rows - 1 - offset, column]] = intensity;
            }
        }

        let modulation_time = segmented.modulation_time();
        let rt2_seconds = (0..rows)
            .rev()
            .map(|offset| {
                StatsHelper::round_decimals(
                    offset as f64 * modulation_time / rows as f64,
                    RT2_DECIMALS,
                )
            })
            .collect();
        let rt1_minutes = (0..columns)
            .map(|column| column as f64 * modulation_time / SECONDS_PER_MINUTE)
            .collect();

        Chromatogram2D::new(values, rt2_seconds, rt1_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawTrace;
    use crate::processing::split::Splitter;
    use approx::assert_relative_eq;

    fn reshape_ramp(len: usize, modulation: f64, interval: f64) -> Chromatogram2D {
        let trace =
            RawTrace::from_uniform(interval, (0..len).map(|i| i as f64).collect()).unwrap();
        let segmented = Splitter::new(modulation, interval).unwrap().split(&trace).unwrap();
        Reshaper::new().reshape(&segmented).unwrap()
    }

    #[test]
    fn shape_is_samples_per_segment_by_segment_count() {
        let chrom = reshape_ramp(12, 2.0, 0.5);
        assert_eq!(chrom.shape(), (4, 3));
    }

    #[test]
    fn every_element_maps_back_to_its_trace_position() {
        let chrom = reshape_ramp(12, 2.0, 0.5);
        let values = chrom.values();
        for column in 0..3 {
            for offset in 0..4 {
                let expected = (column * 4 + offset) as f64;
                assert_eq!(values[[3 - offset, column]], expected);
            }
        }
        // top-left holds the last sample of the first modulation
        assert_eq!(values[[0, 0]], 3.0);
        assert_eq!(values[[3, 0]], 0.0);
    }

    #[test]
    fn axes_follow_the_stored_orientation() {
        let chrom = reshape_ramp(12, 2.0, 0.5);
        assert_eq!(chrom.rt2_seconds(), &[1.5, 1.0, 0.5, 0.0]);
        assert_relative_eq!(chrom.rt1_minutes()[2], 4.0 / 60.0);
    }

    #[test]
    fn rt2_axis_is_rounded_to_milliseconds() {
        let chrom = reshape_ramp(6, 2.0, 2.0 / 3.0);
        assert_eq!(chrom.rt2_seconds(), &[1.333, 0.667, 0.0]);
    }

    #[test]
    fn rt2_labels_round_sub_millisecond_ties_on_exact_values() {
        let chrom = reshape_ramp(4000, 1.0, 0.0005);
        let rows = chrom.shape().0;
        let label = |offset: usize| chrom.rt2_seconds()[rows - 1 - offset];
        assert_eq!(label(0), 0.0);
        assert_eq!(label(1), 0.001);
        assert_eq!(label(5), 0.003);
        assert_eq!(label(11), 0.005);
    }
}
