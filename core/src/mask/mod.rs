pub mod integrator;
pub mod region;

pub use integrator::{MaskIntegralSet, MaskIntegrator, UNASSIGNED};
pub use region::Mask;
