use serde::{Deserialize, Serialize};

use crate::data::{Chromatogram2D, RawTrace};
use crate::math::StatsHelper;
use crate::prelude::StageResult;
use crate::processing::NormalizeMode;

use super::assembly::assemble;
use super::config::PipelineConfig;

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Plot extent of a sample: first dimension in minutes, second in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub rt1_min: f64,
    pub rt1_max: f64,
    pub rt2_min: f64,
    pub rt2_max: f64,
}

impl AxisLimits {
    pub fn from_parts(trace: &RawTrace, chromatogram: &Chromatogram2D) -> Self {
        let (first, last) = trace.time_bounds();
        let rt2 = chromatogram.rt2_seconds().iter().copied();
        Self {
            rt1_min: first / SECONDS_PER_MINUTE,
            rt1_max: last / SECONDS_PER_MINUTE,
            rt2_min: StatsHelper::min(rt2.clone()).unwrap_or(0.0),
            rt2_max: StatsHelper::max(rt2).unwrap_or(0.0),
        }
    }

    /// `[rt1_min, rt1_max, rt2_min, rt2_max]`
    pub fn as_array(&self) -> [f64; 4] {
        [self.rt1_min, self.rt1_max, self.rt2_min, self.rt2_max]
    }
}

/// A processed GCxGC run: the trace it came from and its normalized matrix.
///
/// Samples are never modified; [`Sample::with_shift`] derives a new one.
#[derive(Debug, Clone)]
pub struct Sample {
    pub(super) name: String,
    pub(super) trace: RawTrace,
    pub(super) chromatogram: Chromatogram2D,
    pub(super) sampling_interval: f64,
    pub(super) limits: AxisLimits,
    pub(super) config: PipelineConfig,
}

impl Sample {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The trace after the solvent cutoff, as it entered the splitter.
    pub fn trace(&self) -> &RawTrace {
        &self.trace
    }

    pub fn chromatogram(&self) -> &Chromatogram2D {
        &self.chromatogram
    }

    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    pub fn modulation_time(&self) -> f64 {
        self.config.modulation_time
    }

    pub fn shift(&self) -> i64 {
        self.config.shift
    }

    pub fn solvent_cutoff(&self) -> f64 {
        self.config.solvent_cutoff
    }

    pub fn normalize_mode(&self) -> NormalizeMode {
        self.config.normalize
    }

    pub fn limits(&self) -> AxisLimits {
        self.limits
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Recomputes the matrix from the stored trace with a different phase shift.
    pub fn with_shift(&self, shift: i64) -> StageResult<Sample> {
        let config = self.config.clone().with_shift(shift);
        assemble(
            self.name.clone(),
            self.trace.clone(),
            self.sampling_interval,
            config,
        )
    }
}
