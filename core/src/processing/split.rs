use log::debug;

use crate::data::RawTrace;
use crate::math::stats::is_integer_multiple;
use crate::prelude::{StageError, StageResult};

/// A trace cut into equally long modulations.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedTrace {
    intensities: Vec<f64>,
    samples_per_segment: usize,
    modulation_time: f64,
    padded_samples: usize,
}

impl SegmentedTrace {
    pub fn samples_per_segment(&self) -> usize {
        self.samples_per_segment
    }

    pub fn segment_count(&self) -> usize {
        if self.samples_per_segment == 0 {
            return 0;
        }
        self.intensities.len() / self.samples_per_segment
    }

    pub fn modulation_time(&self) -> f64 {
        self.modulation_time
    }

    /// Number of trailing samples duplicated to complete the last modulation.
    pub fn padded_samples(&self) -> usize {
        self.padded_samples
    }

    /// Segment index of every sample, padding included.
    pub fn segment_indices(&self) -> Vec<usize> {
        (0..self.intensities.len())
            .map(|position| position / self.samples_per_segment)
            .collect()
    }

    pub fn segment(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.samples_per_segment)?;
        self.intensities.get(start..start + self.samples_per_segment)
    }

    pub fn segments(&self) -> impl Iterator<Item = &[f64]> {
        self.intensities.chunks_exact(self.samples_per_segment)
    }
}

/// Cuts a trace into modulations of `modulation_time` seconds.
#[derive(Debug, Clone, Copy)]
pub struct Splitter {
    modulation_time: f64,
    samples_per_segment: usize,
}

impl Splitter {
    /// Fails unless the modulation time is a whole number of sampling intervals.
    pub fn new(modulation_time: f64, sampling_interval: f64) -> StageResult<Self> {
        if !(modulation_time.is_finite() && modulation_time > 0.0) {
            return Err(StageError::Configuration(format!(
                "modulation time must be positive, got {}",
                modulation_time
            )));
        }
        if !(sampling_interval.is_finite() && sampling_interval > 0.0) {
            return Err(StageError::Configuration(format!(
                "sampling interval must be positive, got {}",
                sampling_interval
            )));
        }
        if !is_integer_multiple(modulation_time, sampling_interval) {
            return Err(StageError::Precondition(format!(
                "modulation time {} s is not an integer multiple of the sampling interval {} s",
                modulation_time, sampling_interval
            )));
        }
        let samples_per_segment = (modulation_time / sampling_interval).round() as usize;
        if samples_per_segment == 0 {
            return Err(StageError::Precondition(format!(
                "modulation time {} s is shorter than the sampling interval {} s",
                modulation_time, sampling_interval
            )));
        }
        Ok(Self {
            modulation_time,
            samples_per_segment,
        })
    }

    pub fn samples_per_segment(&self) -> usize {
        self.samples_per_segment
    }

    /// Assigns sample `i` to segment `i / samples_per_segment`.
    ///
    /// A short final segment is completed by repeating the trace's last
    /// sample, so every modulation has the same length.
    pub fn split(&self, trace: &RawTrace) -> StageResult<SegmentedTrace> {
        let last = *trace
            .intensities()
            .last()
            .ok_or_else(|| StageError::Precondition("cannot split an empty trace".into()))?;

        let mut intensities = trace.intensities().to_vec();
        let remainder = intensities.len() % self.samples_per_segment;
        let padded_samples = if remainder == 0 {
            0
        } else {
            self.samples_per_segment - remainder
        };
        intensities.resize(intensities.len() + padded_samples, last);

        let segmented = SegmentedTrace {
            intensities,
            samples_per_segment: self.samples_per_segment,
            modulation_time: self.modulation_time,
            padded_samples,
        };
        debug!(
            "split {} samples into {} modulations of {} ({} padded)",
            trace.len(),
            segmented.segment_count(),
            self.samples_per_segment,
            padded_samples
        );
        Ok(segmented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize, interval: f64) -> RawTrace {
        RawTrace::from_uniform(interval, (0..len).map(|i| i as f64).collect()).unwrap()
    }

    #[test]
    fn segment_indices_form_contiguous_increasing_groups() {
        for (modulation, interval, len) in [(2.0, 0.5, 17), (6.0, 0.004, 4_000), (1.0, 1.0, 5)] {
            let splitter = Splitter::new(modulation, interval).unwrap();
            let segmented = splitter.split(&ramp(len, interval)).unwrap();
            let indices = segmented.segment_indices();
            assert!(indices.windows(2).all(|w| w[1] == w[0] || w[1] == w[0] + 1));
            assert_eq!(indices[0], 0);
            for segment in 0..segmented.segment_count() {
                let count = indices.iter().filter(|&&i| i == segment).count();
                assert_eq!(count, splitter.samples_per_segment());
            }
        }
    }

    #[test]
    fn short_final_segment_is_padded_with_last_sample() {
        let splitter = Splitter::new(2.0, 0.5).unwrap();
        let segmented = splitter.split(&ramp(10, 0.5)).unwrap();
        assert_eq!(segmented.segment_count(), 3);
        assert_eq!(segmented.padded_samples(), 2);
        assert_eq!(segmented.segment(2).unwrap(), &[8.0, 9.0, 9.0, 9.0]);
    }

    #[test]
    fn exact_fit_needs_no_padding() {
        let splitter = Splitter::new(2.0, 0.5).unwrap();
        let segmented = splitter.split(&ramp(8, 0.5)).unwrap();
        assert_eq!(segmented.padded_samples(), 0);
        assert_eq!(segmented.segments().count(), 2);
    }

    #[test]
    fn non_integer_ratio_is_a_precondition_error() {
        let err = Splitter::new(20.0, 3.0).unwrap_err();
        assert!(matches!(err, StageError::Precondition(_)));
    }

    #[test]
    fn non_positive_modulation_is_a_configuration_error() {
        assert!(matches!(
            Splitter::new(0.0, 1.0).unwrap_err(),
            StageError::Configuration(_)
        ));
        assert!(matches!(
            Splitter::new(1.0, -1.0).unwrap_err(),
            StageError::Configuration(_)
        ));
    }
}
