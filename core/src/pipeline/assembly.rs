use crate::data::{RawTrace, TraceSource};
use crate::prelude::{ProcessingStage, StageResult};
use crate::processing::{BaselineCorrector, Normalizer, PhaseAligner, Reshaper, Splitter};
use crate::telemetry::LogManager;

use super::config::{PipelineConfig, SamplingInterval};
use super::sample::{AxisLimits, Sample};

/// Runs the full chromatogram transform on one trace.
///
/// Order: solvent cutoff, split, reshape, phase shift, baseline, normalize.
/// The first failing stage ends the run.
pub fn parse_2d_chromatogram(
    source: impl Into<TraceSource>,
    config: &PipelineConfig,
) -> StageResult<Sample> {
    config.validate()?;
    let (trace, default_name) = source.into().resolve()?;
    let name = config.name.clone().unwrap_or(default_name);

    let trace = if config.solvent_cutoff > 0.0 {
        trace.split_solvent(config.solvent_cutoff)
    } else {
        trace
    };

    let sampling_interval = match config.sampling_interval {
        SamplingInterval::Infer => trace.inferred_interval()?,
        SamplingInterval::Seconds(seconds) => seconds,
    };

    assemble(name, trace, sampling_interval, config.clone())
}

pub(super) fn assemble(
    name: String,
    trace: RawTrace,
    sampling_interval: f64,
    config: PipelineConfig,
) -> StageResult<Sample> {
    let logger = LogManager::new(name.as_str());

    let splitter = Splitter::new(config.modulation_time, sampling_interval)?;
    let segmented = splitter.split(&trace)?;
    let mut chromatogram = Reshaper::new().reshape(&segmented)?;

    let stages: [Box<dyn ProcessingStage>; 3] = [
        Box::new(PhaseAligner::new(config.shift)),
        Box::new(BaselineCorrector::new(
            config.baseline.clone(),
            trace.min_intensity(),
        )),
        Box::new(Normalizer::new(config.normalize)),
    ];
    for stage in &stages {
        let output = stage.execute(chromatogram)?;
        logger.record_stage(stage.label(), &output.metadata);
        chromatogram = output.chromatogram;
    }

    let (rows, columns) = chromatogram.shape();
    logger.record(&format!(
        "{} x {} chromatogram ({} s modulation, {} s sampling, shift {})",
        rows, columns, config.modulation_time, sampling_interval, config.shift
    ));

    let limits = AxisLimits::from_parts(&trace, &chromatogram);
    Ok(Sample {
        name,
        trace,
        chromatogram,
        sampling_interval,
        limits,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::StageError;
    use crate::processing::{BaselineMode, NormalizeMode};
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// 3 modulations of 4 samples, 0.5 s apart, with a flat offset of 1.
    fn trace() -> RawTrace {
        let intensities = (0..12).map(|i| 1.0 + (i % 4) as f64 + (i / 4) as f64).collect();
        RawTrace::from_uniform(0.5, intensities).unwrap()
    }

    #[test]
    fn sample_carries_metadata_and_limits() {
        let config = PipelineConfig::new(2.0).with_shift(1).with_name("run 7");
        let sample = parse_2d_chromatogram(trace(), &config).unwrap();
        assert_eq!(sample.name(), "run 7");
        assert_eq!(sample.sampling_interval(), 0.5);
        assert_eq!(sample.modulation_time(), 2.0);
        assert_eq!(sample.shift(), 1);
        assert_eq!(sample.chromatogram().shape(), (4, 3));
        let limits = sample.limits().as_array();
        assert_relative_eq!(limits[1], 5.5 / 60.0);
        assert_eq!(limits[2], 0.0);
        assert_eq!(limits[3], 1.5);
    }

    #[test]
    fn table_input_defaults_to_generic_name() {
        let sample = parse_2d_chromatogram(trace(), &PipelineConfig::new(2.0)).unwrap();
        assert_eq!(sample.name(), "Chromatogram");
    }

    #[test]
    fn default_pipeline_yields_unit_volume() {
        let sample = parse_2d_chromatogram(trace(), &PipelineConfig::new(2.0)).unwrap();
        assert_relative_eq!(sample.chromatogram().volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn raw_pipeline_reproduces_trace_layout() {
        let config = PipelineConfig::new(2.0)
            .with_baseline(BaselineMode::None)
            .with_normalize(NormalizeMode::None);
        let sample = parse_2d_chromatogram(trace(), &config).unwrap();
        let values = sample.chromatogram().values();
        let raw = sample.trace().intensities();
        for column in 0..3 {
            for offset in 0..4 {
                assert_eq!(values[[3 - offset, column]], raw[column * 4 + offset]);
            }
        }
    }

    #[test]
    fn phase_shift_runs_before_baseline() {
        let config = PipelineConfig::new(2.0)
            .with_shift(1)
            .with_normalize(NormalizeMode::None);
        let sample = parse_2d_chromatogram(trace(), &config).unwrap();
        let values = sample.chromatogram().values();
        // column 0 was [4, 3, 2, 1] top to bottom; after the roll and the
        // stridewise minimum the top row holds the old bottom row
        assert_eq!(values.column(0).to_vec(), vec![0.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn global_baseline_uses_trace_minimum_after_cutoff() {
        let config = PipelineConfig::new(2.0)
            .with_baseline(BaselineMode::Global)
            .with_normalize(NormalizeMode::Max)
            .with_solvent_cutoff(0.5);
        let sample = parse_2d_chromatogram(trace(), &config).unwrap();
        assert_eq!(sample.trace().intensities()[..3], [0.0, 0.0, 3.0]);
        assert_eq!(sample.chromatogram().max(), Some(1.0));
        assert_eq!(sample.solvent_cutoff(), 0.5);
    }

    #[test]
    fn reshift_derives_a_new_sample_from_the_same_trace() {
        let original = parse_2d_chromatogram(trace(), &PipelineConfig::new(2.0)).unwrap();
        let shifted = original.with_shift(2).unwrap();
        assert_eq!(original.shift(), 0);
        assert_eq!(shifted.shift(), 2);
        assert_eq!(shifted.trace(), original.trace());
        assert_eq!(shifted.name(), original.name());
        assert_ne!(shifted.chromatogram(), original.chromatogram());
        let back = shifted.with_shift(0).unwrap();
        assert_eq!(back.chromatogram(), original.chromatogram());
    }

    #[test]
    fn mismatched_modulation_fails_before_any_stage() {
        let config = PipelineConfig::new(2.2);
        let err = parse_2d_chromatogram(trace(), &config).unwrap_err();
        assert!(matches!(err, StageError::Precondition(_)));
    }

    #[test]
    fn flat_trace_cannot_be_volume_normalized() {
        let flat = RawTrace::from_uniform(0.5, vec![3.0; 8]).unwrap();
        let err = parse_2d_chromatogram(flat, &PipelineConfig::new(2.0)).unwrap_err();
        assert!(matches!(err, StageError::DivisionDegeneracy(_)));
    }

    #[test]
    fn custom_baseline_is_kept_for_reshift() {
        let config = PipelineConfig::new(2.0)
            .with_baseline(BaselineMode::custom(|m: Array2<f64>| m.mapv(|v| v - 1.0)))
            .with_normalize(NormalizeMode::None);
        let sample = parse_2d_chromatogram(trace(), &config).unwrap();
        assert_eq!(sample.chromatogram().values()[[3, 0]], 0.0);
        let shifted = sample.with_shift(1).unwrap();
        assert_eq!(shifted.chromatogram().values()[[0, 0]], 0.0);
    }

    #[test]
    fn file_input_is_named_after_the_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "Example export").unwrap();
        writeln!(temp, "Time(ms),Time(min),Unknown,Absolute Intensity").unwrap();
        for i in 0..8 {
            let minutes = i as f64 * 0.5 / 60.0;
            writeln!(temp, "{},{},0,{}", i * 500, minutes, 1 + i % 4).unwrap();
        }
        let path = temp.path().to_path_buf();
        let sample = parse_2d_chromatogram(path.clone(), &PipelineConfig::new(2.0)).unwrap();
        let expected = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(sample.name(), expected);
        assert_eq!(sample.sampling_interval(), 0.5);
    }
}
