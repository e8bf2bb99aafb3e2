//! Chromatogram transform and mask integration core for GCxGC detector traces.
//!
//! A one-dimensional detector trace is sliced into modulations, reshaped into a
//! retention-time matrix, baseline corrected, phase aligned and normalized. The
//! resulting [`Sample`] feeds the mask integrator, which attributes the
//! normalized volume to named compound-class regions.

pub mod data;
pub mod mask;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use data::{Chromatogram2D, RawTrace, TraceSource};
pub use mask::{Mask, MaskIntegralSet, MaskIntegrator};
pub use math::stats::is_integer_multiple;
pub use pipeline::{parse_2d_chromatogram, PipelineConfig, Sample};
pub use prelude::{ProcessingStage, StageError, StageOutput, StageResult};
