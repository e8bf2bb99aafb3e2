pub mod assembly;
pub mod config;
pub mod sample;

pub use assembly::parse_2d_chromatogram;
pub use config::{PipelineConfig, SamplingInterval};
pub use sample::{AxisLimits, Sample};
