pub mod baseline;
pub mod normalize;
pub mod phase;
pub mod reshape;
pub mod split;

pub use baseline::{BaselineCorrector, BaselineMode, BaselineTransform};
pub use normalize::{NormalizeMode, Normalizer};
pub use phase::PhaseAligner;
pub use reshape::Reshaper;
pub use split::{SegmentedTrace, Splitter};
