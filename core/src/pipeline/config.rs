use std::fmt;
use std::str::FromStr;

use crate::prelude::{StageError, StageResult};
use crate::processing::{BaselineMode, NormalizeMode};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SamplingInterval {
    /// Take the spacing of the trace itself.
    #[default]
    Infer,
    Seconds(f64),
}

impl fmt::Display for SamplingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingInterval::Infer => f.write_str("infer"),
            SamplingInterval::Seconds(seconds) => write!(f, "{}", seconds),
        }
    }
}

impl FromStr for SamplingInterval {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("infer") {
            return Ok(SamplingInterval::Infer);
        }
        s.parse::<f64>()
            .map(SamplingInterval::Seconds)
            .map_err(|_| {
                StageError::Configuration(format!(
                    "sampling interval must be seconds or \"infer\", got {:?}",
                    s
                ))
            })
    }
}

/// Options of one chromatogram transform run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Modulation period in seconds.
    pub modulation_time: f64,
    pub sampling_interval: SamplingInterval,
    /// Initial phase shift in rows.
    pub shift: i64,
    pub baseline: BaselineMode,
    pub normalize: NormalizeMode,
    /// Seconds; intensities at or before it are zeroed. Zero disables it.
    pub solvent_cutoff: f64,
    /// Overrides the name derived from the trace source.
    pub name: Option<String>,
}

impl PipelineConfig {
    pub fn new(modulation_time: f64) -> Self {
        Self {
            modulation_time,
            sampling_interval: SamplingInterval::Infer,
            shift: 0,
            baseline: BaselineMode::Stridewise,
            normalize: NormalizeMode::Volume,
            solvent_cutoff: 0.0,
            name: None,
        }
    }

    pub fn with_sampling_interval(mut self, interval: SamplingInterval) -> Self {
        self.sampling_interval = interval;
        self
    }

    pub fn with_shift(mut self, shift: i64) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_baseline(mut self, baseline: BaselineMode) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_normalize(mut self, normalize: NormalizeMode) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_solvent_cutoff(mut self, cutoff: f64) -> Self {
        self.solvent_cutoff = cutoff;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn validate(&self) -> StageResult<()> {
        if !(self.modulation_time.is_finite() && self.modulation_time > 0.0) {
            return Err(StageError::Configuration(format!(
                "modulation_time must be a positive number of seconds, got {}",
                self.modulation_time
            )));
        }
        if let SamplingInterval::Seconds(seconds) = self.sampling_interval {
            if !(seconds.is_finite() && seconds > 0.0) {
                return Err(StageError::Configuration(format!(
                    "sampling_interval must be positive, got {}",
                    seconds
                )));
            }
        }
        if !(self.solvent_cutoff.is_finite() && self.solvent_cutoff >= 0.0) {
            return Err(StageError::Configuration(format!(
                "solvent_cutoff must be zero or positive, got {}",
                self.solvent_cutoff
            )));
        }
        Ok(())
    }
}
