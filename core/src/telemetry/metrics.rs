use std::sync::Mutex;

/// Batch counters shared across worker threads.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub processed: usize,
    pub failed: usize,
    pub masks_integrated: usize,
}

#[derive(Default)]
struct Metrics {
    processed: usize,
    failed: usize,
    masks_integrated: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_processed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.processed += 1;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failed += 1;
        }
    }

    pub fn record_masks(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.masks_integrated += count;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            MetricsSnapshot {
                processed: metrics.processed,
                failed: metrics.failed,
                masks_integrated: metrics.masks_integrated,
            }
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_processed();
        metrics.record_processed();
        metrics.record_failure();
        metrics.record_masks(3);
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                processed: 2,
                failed: 1,
                masks_integrated: 3
            }
        );
    }
}
