use std::fmt;
use std::str::FromStr;

use crate::data::Chromatogram2D;
use crate::prelude::{ProcessingStage, StageError, StageOutput, StageResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NormalizeMode {
    /// Divide by the double trapezoidal integral.
    #[default]
    Volume,
    /// Divide by the global maximum.
    Max,
    None,
}

impl fmt::Display for NormalizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormalizeMode::Volume => "volume",
            NormalizeMode::Max => "max",
            NormalizeMode::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for NormalizeMode {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "volume" => Ok(NormalizeMode::Volume),
            "max" => Ok(NormalizeMode::Max),
            "none" => Ok(NormalizeMode::None),
            other => Err(StageError::Configuration(format!(
                "unknown normalization {:?} (expected volume, max or none)",
                other
            ))),
        }
    }
}

/// Rescales matrix intensity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    mode: NormalizeMode,
}

impl Normalizer {
    pub fn new(mode: NormalizeMode) -> Self {
        Self { mode }
    }

    fn divide(input: Chromatogram2D, divisor: f64, what: &str) -> StageResult<StageOutput> {
        if divisor == 0.0 || !divisor.is_finite() {
            return Err(StageError::DivisionDegeneracy(format!(
                "cannot normalize by {} {}",
                what, divisor
            )));
        }
        let scaled = input.values().mapv(|v| v / divisor);
        let mut output = StageOutput::new(input.with_values(scaled)?)
            .with_note(format!("normalized by {} {:.6e}", what, divisor));
        output.metadata.scale = Some(divisor);
        Ok(output)
    }
}

impl ProcessingStage for Normalizer {
    fn label(&self) -> &'static str {
        "normalize"
    }

    fn execute(&self, input: Chromatogram2D) -> StageResult<StageOutput> {
        match self.mode {
            NormalizeMode::Volume => {
                let volume = input.volume();
                Self::divide(input, volume, "volume")
            }
            NormalizeMode::Max => {
                let max = input.max().unwrap_or(0.0);
                Self::divide(input, max, "maximum")
            }
            NormalizeMode::None => Ok(StageOutput::new(input).with_note("no normalization")),
        }
    }
}
