use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ndarray::{Array2, Axis};

use crate::data::Chromatogram2D;
use crate::math::MatrixHelper;
use crate::prelude::{ProcessingStage, StageError, StageOutput, StageResult};

/// Caller-supplied baseline model applied to the whole matrix.
pub trait BaselineTransform: Send + Sync {
    fn apply(&self, matrix: Array2<f64>) -> Array2<f64>;
}

impl<F> BaselineTransform for F
where
    F: Fn(Array2<f64>) -> Array2<f64> + Send + Sync,
{
    fn apply(&self, matrix: Array2<f64>) -> Array2<f64> {
        self(matrix)
    }
}

#[derive(Clone, Default)]
pub enum BaselineMode {
    /// Subtract each modulation's own minimum.
    #[default]
    Stridewise,
    /// Subtract the minimum of the one-dimensional trace.
    Global,
    Custom(Arc<dyn BaselineTransform>),
    None,
}

impl BaselineMode {
    pub fn custom<T: BaselineTransform + 'static>(transform: T) -> Self {
        BaselineMode::Custom(Arc::new(transform))
    }
}

impl fmt::Debug for BaselineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BaselineMode::{}", self)
    }
}

impl fmt::Display for BaselineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaselineMode::Stridewise => "stridewise",
            BaselineMode::Global => "global",
            BaselineMode::Custom(_) => "custom",
            BaselineMode::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for BaselineMode {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stridewise" => Ok(BaselineMode::Stridewise),
            "global" => Ok(BaselineMode::Global),
            "none" => Ok(BaselineMode::None),
            "custom" => Err(StageError::Configuration(
                "a custom baseline must be supplied as a transform, not by name".into(),
            )),
            other => Err(StageError::Configuration(format!(
                "unknown baseline type {:?} (expected stridewise, global or none)",
                other
            ))),
        }
    }
}

/// Removes detector offset from the retention-time matrix.
pub struct BaselineCorrector {
    mode: BaselineMode,
    trace_minimum: f64,
}

impl BaselineCorrector {
    /// `trace_minimum` is the lowest intensity of the 1D trace, used by [`BaselineMode::Global`].
    pub fn new(mode: BaselineMode, trace_minimum: f64) -> Self {
        Self {
            mode,
            trace_minimum,
        }
    }
}

impl ProcessingStage for BaselineCorrector {
    fn label(&self) -> &'static str {
        "baseline"
    }

    fn execute(&self, input: Chromatogram2D) -> StageResult<StageOutput> {
        match &self.mode {
            BaselineMode::Stridewise => {
                let minima = MatrixHelper::column_minima(input.values());
                let corrected = &input.values() - &minima.view().insert_axis(Axis(0));
                Ok(StageOutput::new(input.with_values(corrected)?).with_note(format!(
                    "stridewise baseline over {} modulations",
                    minima.len()
                )))
            }
            BaselineMode::Global => {
                let offset = self.trace_minimum;
                let corrected = input.values().mapv(|v| v - offset);
                let mut output = StageOutput::new(input.with_values(corrected)?)
                    .with_note(format!("global baseline {:.6}", offset));
                output.metadata.scale = Some(offset);
                Ok(output)
            }
            BaselineMode::Custom(transform) => {
                let shape = input.shape();
                let corrected = transform.apply(input.values().to_owned());
                if corrected.dim() != shape {
                    return Err(StageError::ShapeMismatch {
                        context: "custom baseline output".into(),
                        expected: shape,
                        found: corrected.dim(),
                    });
                }
                Ok(StageOutput::new(input.with_values(corrected)?).with_note("custom baseline"))
            }
            BaselineMode::None => Ok(StageOutput::new(input).with_note("no baseline correction")),
        }
    }
}
