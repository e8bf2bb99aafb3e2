use crate::workflow::config::WorkflowConfig;
use crate::workflow::report::IntegralRow;
use anyhow::Context;
use gcxgccore::pipeline::{AxisLimits, PipelineConfig};
use gcxgccore::telemetry::{MetricsRecorder, MetricsSnapshot};
use gcxgccore::{parse_2d_chromatogram, Mask, MaskIntegralSet, MaskIntegrator, Sample, TraceSource};
use log::{info, warn};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

pub struct WorkflowResult {
    pub sample: Sample,
    pub integrals: Option<MaskIntegralSet>,
}

impl WorkflowResult {
    pub fn limits(&self) -> AxisLimits {
        self.sample.limits()
    }

    pub fn integral_row(&self) -> Option<IntegralRow> {
        self.integrals.as_ref().map(|integrals| IntegralRow {
            sample: self.sample.name().to_string(),
            integrals: integrals.clone(),
        })
    }
}

pub struct BatchResult {
    pub results: Vec<WorkflowResult>,
    pub failures: Vec<(PathBuf, String)>,
    pub metrics: MetricsSnapshot,
}

impl BatchResult {
    pub fn integral_rows(&self) -> Vec<IntegralRow> {
        self.results
            .iter()
            .filter_map(WorkflowResult::integral_row)
            .collect()
    }
}

#[derive(Clone)]
pub struct Runner {
    pipeline: PipelineConfig,
    integrator: MaskIntegrator,
    masks: Arc<Vec<Mask>>,
}

impl Runner {
    /// Validates the configuration and loads the mask directory once for all samples.
    pub fn new(config: &WorkflowConfig) -> anyhow::Result<Self> {
        let pipeline = config.to_pipeline_config()?;
        let integrator = config.mask_integrator();
        let masks = match &config.mask_dir {
            Some(dir) => integrator
                .load_directory(dir)
                .with_context(|| format!("loading masks from {}", dir.display()))?,
            None => Vec::new(),
        };
        Ok(Self {
            pipeline,
            integrator,
            masks: Arc::new(masks),
        })
    }

    #[cfg(test)]
    pub fn with_masks(mut self, masks: Vec<Mask>) -> Self {
        self.masks = Arc::new(masks);
        self
    }

    pub fn integrator(&self) -> &MaskIntegrator {
        &self.integrator
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    pub fn execute(&self, source: impl Into<TraceSource>) -> anyhow::Result<WorkflowResult> {
        let sample =
            parse_2d_chromatogram(source, &self.pipeline).context("building 2D chromatogram")?;
        let integrals = if self.masks.is_empty() {
            None
        } else {
            Some(
                self.integrator
                    .integrate_sample(&sample, &self.masks)
                    .with_context(|| format!("integrating masks for {}", sample.name()))?,
            )
        };
        Ok(WorkflowResult { sample, integrals })
    }

    /// Processes every trace in parallel; a failing trace does not stop the others.
    pub fn execute_batch(&self, traces: &[PathBuf]) -> BatchResult {
        let metrics = MetricsRecorder::new();
        let outcomes: Vec<(PathBuf, anyhow::Result<WorkflowResult>)> = traces
            .par_iter()
            .map(|path| (path.clone(), self.execute(path.clone())))
            .collect();

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    metrics.record_processed();
                    metrics.record_masks(result.integrals.as_ref().map_or(0, |set| set.len()));
                    results.push(result);
                }
                Err(err) => {
                    warn!("{}: {:#}", path.display(), err);
                    metrics.record_failure();
                    failures.push((path, format!("{:#}", err)));
                }
            }
        }

        let metrics = metrics.snapshot();
        info!(
            "batch finished: {} processed, {} failed, {} mask integrals",
            metrics.processed, metrics.failed, metrics.masks_integrated
        );
        BatchResult {
            results,
            failures,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_trace, write_export};
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use tempfile::tempdir;

    #[test]
    fn runner_executes_workflow() {
        let cfg = WorkflowConfig::from_modulation(6.0);
        let runner = Runner::new(&cfg).unwrap();
        let trace = build_trace(6.0, 20, 3).unwrap();
        let result = runner.execute(trace).unwrap();
        assert_eq!(result.sample.chromatogram().shape(), (300, 20));
        assert_relative_eq!(result.sample.chromatogram().volume(), 1.0, epsilon = 1e-9);
        assert!(result.integrals.is_none());
    }

    #[test]
    fn complementary_masks_leave_nothing_unassigned() {
        let cfg = WorkflowConfig::from_modulation(6.0);
        let first = Array2::from_shape_fn((300, 20), |(_, c)| if c < 10 { 1.0 } else { 0.0 });
        let second = first.mapv(|v| 1.0 - v);
        let runner = Runner::new(&cfg)
            .unwrap()
            .with_masks(vec![Mask::new("early", first), Mask::new("late", second)]);
        let result = runner.execute(build_trace(6.0, 20, 5).unwrap()).unwrap();
        let integrals = result.integrals.unwrap();
        assert_relative_eq!(integrals.unassigned().unwrap(), 0.0, epsilon = 1e-9);
        assert_eq!(integrals.len(), 2);
    }

    #[test]
    fn batch_reports_failures_without_stopping() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.csv");
        write_export(&build_trace(6.0, 8, 11).unwrap(), &good).unwrap();
        let missing = dir.path().join("missing.csv");

        let runner = Runner::new(&WorkflowConfig::from_modulation(6.0)).unwrap();
        let batch = runner.execute_batch(&[good, missing.clone()]);
        assert_eq!(batch.metrics.processed, 1);
        assert_eq!(batch.metrics.failed, 1);
        assert_eq!(batch.failures[0].0, missing);
        assert_eq!(batch.results[0].sample.name(), "good.csv");
    }

    #[test]
    fn empty_mask_directory_fails_runner_setup() {
        let dir = tempdir().unwrap();
        let mut cfg = WorkflowConfig::from_modulation(6.0);
        cfg.mask_dir = Some(dir.path().to_path_buf());
        assert!(Runner::new(&cfg).is_err());
    }
}
