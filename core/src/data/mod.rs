pub mod chromatogram;
pub mod loader;
pub mod trace;

pub use chromatogram::Chromatogram2D;
pub use loader::TraceLoader;
pub use trace::{RawTrace, TraceSource};
