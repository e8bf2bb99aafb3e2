use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use gcxgccore::RawTrace;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::template::PeakTemplate;

/// Configuration for generating a synthetic GCxGC detector trace.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub modulation_time: f64,
    pub sampling_interval: f64,
    pub modulations: usize,
    /// Number of randomly placed peaks.
    pub peak_count: usize,
    pub offset: f64,
    /// Linear detector drift per second.
    pub drift: f64,
    pub noise: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            modulation_time: 6.0,
            sampling_interval: 0.02,
            modulations: 120,
            peak_count: 25,
            offset: 5.0,
            drift: 0.001,
            noise: 0.05,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    fn samples_per_modulation(&self) -> anyhow::Result<usize> {
        anyhow::ensure!(
            gcxgccore::is_integer_multiple(self.modulation_time, self.sampling_interval),
            "modulation time {} s is not a whole number of {} s samples",
            self.modulation_time,
            self.sampling_interval
        );
        Ok((self.modulation_time / self.sampling_interval).round() as usize)
    }

    fn peaks(&self, rng: &mut StdRng) -> Vec<PeakTemplate> {
        let run_length = self.modulation_time * self.modulations as f64;
        (0..self.peak_count)
            .map(|_| PeakTemplate {
                rt1: rng.gen_range(0.05..0.95) * run_length,
                rt2: rng.gen_range(0.1..0.9) * self.modulation_time,
                width1: self.modulation_time * rng.gen_range(0.5..2.0),
                width2: self.modulation_time * rng.gen_range(0.01..0.04),
                height: rng.gen_range(10.0..500.0),
            })
            .collect()
    }
}

pub fn build_trace_from_config(config: &GeneratorConfig) -> anyhow::Result<RawTrace> {
    let per_modulation = config.samples_per_modulation()?;
    let sample_count = per_modulation
        .checked_mul(config.modulations)
        .context("overflow computing sample count for generator")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let peaks = config.peaks(&mut rng);
    let mut intensities = Vec::with_capacity(sample_count);

    for index in 0..sample_count {
        let time = index as f64 * config.sampling_interval;
        let start = (index / per_modulation) as f64 * config.modulation_time;
        let tau = time - start;
        let signal: f64 = peaks.iter().map(|peak| peak.response(start, tau)).sum();
        let jitter = if config.noise > 0.0 {
            rng.gen_range(-config.noise..config.noise)
        } else {
            0.0
        };
        intensities.push(config.offset + config.drift * time + signal + jitter);
    }

    RawTrace::from_uniform(config.sampling_interval, intensities)
        .context("assembling synthetic trace")
}

pub fn build_trace(modulation_time: f64, modulations: usize, seed: u64) -> anyhow::Result<RawTrace> {
    let config = GeneratorConfig {
        modulation_time,
        modulations,
        seed,
        ..Default::default()
    };
    build_trace_from_config(&config)
}

/// Writes a trace in the detector's CSV export layout.
pub fn write_export(trace: &RawTrace, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "Synthetic GCxGC trace")?;
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["Time(ms)", "Time(min)", "Unknown", "Absolute Intensity"])?;
    for (&time, &intensity) in trace.times().iter().zip(trace.intensities()) {
        writer.write_record([
            format!("{}", (time * 1000.0).round()),
            format!("{}", time / 60.0),
            "0".to_string(),
            format!("{}", intensity),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
