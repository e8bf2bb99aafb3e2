use log::{debug, info};

use crate::prelude::StageMetadata;

/// Routes stage notes of one sample to the `log` facade.
pub struct LogManager {
    sample: String,
}

impl LogManager {
    pub fn new(sample: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
        }
    }

    pub fn record(&self, message: &str) {
        info!("{}: {}", self.sample, message);
    }

    pub fn record_stage(&self, label: &str, metadata: &StageMetadata) {
        for note in &metadata.notes {
            debug!("{} [{}] {}", self.sample, label, note);
        }
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("sample")
    }
}
