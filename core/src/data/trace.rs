use std::path::PathBuf;

use crate::math::stats::StatsHelper;
use crate::prelude::{StageError, StageResult};

use super::loader::TraceLoader;

/// Allowed relative deviation of any sample spacing from the median spacing.
pub const SPACING_TOLERANCE: f64 = 1e-2;

/// Inferred sampling intervals are rounded to whole microseconds.
const MICROSECONDS_PER_SECOND: f64 = 1e6;

/// Name given to samples built from an in-memory table.
pub const DEFAULT_SAMPLE_NAME: &str = "Chromatogram";

/// Single-channel detector trace: intensity against retention time in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrace {
    times: Vec<f64>,
    intensities: Vec<f64>,
}

impl RawTrace {
    /// Builds a trace from retention times (seconds) and intensities.
    ///
    /// Times must be finite, strictly increasing and uniformly spaced within
    /// [`SPACING_TOLERANCE`].
    pub fn new(times: Vec<f64>, intensities: Vec<f64>) -> StageResult<Self> {
        if times.len() != intensities.len() {
            return Err(StageError::Precondition(format!(
                "trace has {} time stamps but {} intensities",
                times.len(),
                intensities.len()
            )));
        }
        if times.is_empty() {
            return Err(StageError::Precondition("trace contains no samples".into()));
        }
        if let Some(index) = times
            .iter()
            .chain(intensities.iter())
            .position(|v| !v.is_finite())
        {
            return Err(StageError::Precondition(format!(
                "trace contains a non-finite value at position {}",
                index % times.len()
            )));
        }

        let spacings: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
        if let Some(index) = spacings.iter().position(|&dt| dt <= 0.0) {
            return Err(StageError::Precondition(format!(
                "retention time is not strictly increasing at sample {}",
                index + 1
            )));
        }
        if let Some(median) = StatsHelper::median(&spacings) {
            if let Some(index) = spacings
                .iter()
                .position(|&dt| ((dt - median) / median).abs() > SPACING_TOLERANCE)
            {
                return Err(StageError::Precondition(format!(
                    "sampling is not uniform: spacing {:.6} s at sample {} deviates from {:.6} s",
                    spacings[index],
                    index + 1,
                    median
                )));
            }
        }

        Ok(Self { times, intensities })
    }

    /// Builds a trace from absolute times in minutes, re-based to start at zero.
    pub fn from_minutes(minutes: &[f64], intensities: Vec<f64>) -> StageResult<Self> {
        let origin = minutes.first().copied().unwrap_or(0.0);
        let seconds = minutes.iter().map(|m| (m - origin) * 60.0).collect();
        Self::new(seconds, intensities)
    }

    /// Builds a trace sampled every `interval` seconds starting at zero.
    pub fn from_uniform(interval: f64, intensities: Vec<f64>) -> StageResult<Self> {
        let times = (0..intensities.len()).map(|i| i as f64 * interval).collect();
        Self::new(times, intensities)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// First and last retention time in seconds.
    pub fn time_bounds(&self) -> (f64, f64) {
        let first = self.times.first().copied().unwrap_or(0.0);
        let last = self.times.last().copied().unwrap_or(0.0);
        (first, last)
    }

    pub fn min_intensity(&self) -> f64 {
        StatsHelper::min(self.intensities.iter().copied()).unwrap_or(0.0)
    }

    /// Sampling interval in seconds inferred from the trace spacing.
    pub fn inferred_interval(&self) -> StageResult<f64> {
        let spacings: Vec<f64> = self.times.windows(2).map(|w| w[1] - w[0]).collect();
        let median = StatsHelper::median(&spacings).ok_or_else(|| {
            StageError::Precondition(
                "cannot infer the sampling interval from a single sample".into(),
            )
        })?;
        Ok((median * MICROSECONDS_PER_SECOND).round() / MICROSECONDS_PER_SECOND)
    }

    /// Copy of the trace with every intensity at or before `cutoff` seconds set to zero.
    pub fn split_solvent(&self, cutoff: f64) -> Self {
        let intensities = self
            .times
            .iter()
            .zip(&self.intensities)
            .map(|(&t, &v)| if t <= cutoff { 0.0 } else { v })
            .collect();
        Self {
            times: self.times.clone(),
            intensities,
        }
    }
}

/// Where the pipeline reads its trace from.
#[derive(Debug, Clone)]
pub enum TraceSource {
    /// A CSV export on disk; the sample is named after the file.
    File(PathBuf),
    /// An already parsed trace.
    Table(RawTrace),
}

impl TraceSource {
    /// Loads the trace and picks the default display name for it.
    pub fn resolve(self) -> StageResult<(RawTrace, String)> {
        match self {
            TraceSource::File(path) => {
                let trace = TraceLoader::load_csv(&path)?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULT_SAMPLE_NAME.to_string());
                Ok((trace, name))
            }
            TraceSource::Table(trace) => Ok((trace, DEFAULT_SAMPLE_NAME.to_string())),
        }
    }
}

impl From<RawTrace> for TraceSource {
    fn from(trace: RawTrace) -> Self {
        TraceSource::Table(trace)
    }
}

impl From<PathBuf> for TraceSource {
    fn from(path: PathBuf) -> Self {
        TraceSource::File(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_non_increasing_time() {
        let err = RawTrace::new(vec![0.0, 1.0, 1.0], vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, StageError::Precondition(_)));
    }

    #[test]
    fn rejects_irregular_spacing() {
        let err = RawTrace::new(vec![0.0, 1.0, 2.0, 3.5], vec![0.0; 4]).unwrap_err();
        assert!(matches!(err, StageError::Precondition(_)));
    }

    #[test]
    fn rejects_length_mismatch_and_empty() {
        assert!(RawTrace::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(RawTrace::new(Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn minutes_are_rebased_to_seconds() {
        let trace = RawTrace::from_minutes(&[2.0, 2.5, 3.0], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(trace.times(), &[0.0, 30.0, 60.0]);
    }

    #[test]
    fn inferred_interval_is_rounded_to_microseconds() {
        let times = (0..10).map(|i| i as f64 * 0.004_000_000_3).collect();
        let trace = RawTrace::new(times, vec![0.0; 10]).unwrap();
        assert_relative_eq!(trace.inferred_interval().unwrap(), 0.004, epsilon = 1e-15);
    }

    #[test]
    fn single_sample_interval_cannot_be_inferred() {
        let trace = RawTrace::new(vec![0.0], vec![1.0]).unwrap();
        assert!(trace.inferred_interval().is_err());
    }

    #[test]
    fn solvent_split_zeroes_up_to_and_including_cutoff() {
        let trace = RawTrace::from_uniform(1.0, vec![5.0, 6.0, 7.0, 8.0]).unwrap();
        let cut = trace.split_solvent(1.0);
        assert_eq!(cut.intensities(), &[0.0, 0.0, 7.0, 8.0]);
        assert_eq!(cut.times(), trace.times());
    }

    #[test]
    fn table_source_uses_default_name() {
        let trace = RawTrace::from_uniform(1.0, vec![1.0, 2.0]).unwrap();
        let (_, name) = TraceSource::from(trace).resolve().unwrap();
        assert_eq!(name, DEFAULT_SAMPLE_NAME);
    }
}
