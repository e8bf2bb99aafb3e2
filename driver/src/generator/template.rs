/// Two-dimensional Gaussian peak, evaluated per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakTemplate {
    /// First-dimension apex, seconds from injection.
    pub rt1: f64,
    /// Second-dimension apex, seconds into the modulation.
    pub rt2: f64,
    pub width1: f64,
    pub width2: f64,
    pub height: f64,
}

impl PeakTemplate {
    /// Peak response for a sample taken `tau` seconds into the modulation starting at `start`.
    pub fn response(&self, start: f64, tau: f64) -> f64 {
        self.height * gaussian(start - self.rt1, self.width1) * gaussian(tau - self.rt2, self.width2)
    }
}

pub fn gaussian(offset: f64, width: f64) -> f64 {
    if width <= 0.0 {
        return if offset == 0.0 { 1.0 } else { 0.0 };
    }
    (-(offset * offset) / (2.0 * width * width)).exp()
}
