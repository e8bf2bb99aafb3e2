use anyhow::Context;
use clap::Parser;
use generator::profile::{build_trace, write_export};
use gui_bridge::bridge::{default_bind_address, GuiBridge};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::{IntervalSetting, WorkflowConfig};
use workflow::report::save_integral_table;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "GCxGC chromatogram transform and mask integration")]
struct Args {
    /// Detector CSV exports to process
    traces: Vec<PathBuf>,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Modulation period in seconds
    #[arg(long)]
    modulation_time: Option<f64>,
    /// Sampling interval in seconds, or "infer"
    #[arg(long, default_value = "infer")]
    sampling_interval: String,
    /// Initial phase shift in rows
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    shift: i64,
    /// stridewise, global or none
    #[arg(long, default_value = "stridewise")]
    baseline: String,
    /// volume, max or none
    #[arg(long, default_value = "volume")]
    normalize: String,
    /// Zero the signal up to this retention time (seconds)
    #[arg(long, default_value_t = 0.0)]
    solvent_cutoff: f64,
    /// Directory of .tif masks
    #[arg(long)]
    masks: Option<PathBuf>,
    /// Literal prefix stripped from mask file names
    #[arg(long)]
    mask_prefix: Option<String>,
    /// Write the integral table to this CSV file
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write a synthetic trace to this path and add it to the batch
    #[arg(long)]
    synthetic: Option<PathBuf>,
    /// Number of modulations in the synthetic trace
    #[arg(long, default_value_t = 120)]
    modulations: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Keep the GUI bridge alive for an external mask editor
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long)]
    bind: Option<SocketAddr>,
}

impl Args {
    fn workflow_config(&self) -> anyhow::Result<WorkflowConfig> {
        let mut config = match &self.workflow {
            Some(path) => WorkflowConfig::load(path)?,
            None => {
                let modulation_time = self
                    .modulation_time
                    .context("--modulation-time is required without --workflow")?;
                let mut config = WorkflowConfig::from_modulation(modulation_time);
                config.sampling_interval = match self.sampling_interval.parse::<f64>() {
                    Ok(seconds) => IntervalSetting::Seconds(seconds),
                    Err(_) => IntervalSetting::Keyword(self.sampling_interval.clone()),
                };
                config.shift = self.shift;
                config.baseline_type = self.baseline.clone();
                config.normalize = self.normalize.clone();
                config.solvent_cutoff = self.solvent_cutoff;
                config
            }
        };
        config.traces.extend(self.traces.iter().cloned());
        if self.masks.is_some() {
            config.mask_dir = self.masks.clone();
        }
        if self.mask_prefix.is_some() {
            config.mask_prefix = self.mask_prefix.clone();
        }
        if self.output.is_some() {
            config.output = self.output.clone();
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut workflow_config = args.workflow_config()?;

    if let Some(path) = &args.synthetic {
        let trace = build_trace(workflow_config.modulation_time, args.modulations, args.seed)?;
        write_export(&trace, path)?;
        println!("Synthetic trace -> {} ({} samples)", path.display(), trace.len());
        workflow_config.traces.push(path.clone());
    }

    anyhow::ensure!(
        !workflow_config.traces.is_empty(),
        "no traces given; pass CSV paths, list them under `traces` or use --synthetic"
    );

    let runner = Runner::new(&workflow_config)?;
    let batch = runner.execute_batch(&workflow_config.traces);

    for result in &batch.results {
        let [rt1_min, rt1_max, rt2_min, rt2_max] = result.limits().as_array();
        let (rows, columns) = result.sample.chromatogram().shape();
        println!(
            "{} -> {} x {} matrix, rt1 {:.2}-{:.2} min, rt2 {:.3}-{:.3} s",
            result.sample.name(),
            rows,
            columns,
            rt1_min,
            rt1_max,
            rt2_min,
            rt2_max
        );
        if let Some(integrals) = &result.integrals {
            for (name, value) in integrals.records() {
                println!("    {:<24} {:.6}", name, value);
            }
        }
    }
    for (path, reason) in &batch.failures {
        eprintln!("{} failed: {}", path.display(), reason);
    }
    println!(
        "Batch -> processed {}, failed {}, mask integrals {}",
        batch.metrics.processed, batch.metrics.failed, batch.metrics.masks_integrated
    );

    if let Some(path) = &workflow_config.output {
        save_integral_table(path, &batch.integral_rows())?;
        println!("Integral table -> {}", path.display());
    }

    if args.serve {
        let gui_bridge = GuiBridge::new(
            Arc::new(runner),
            workflow_config.mask_dir.clone(),
            workflow_config.mask_prefix.clone(),
        );
        if let Some(result) = batch.results.first() {
            gui_bridge.publish(result)?;
        }
        gui_bridge.serve(args.bind.unwrap_or_else(default_bind_address));
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    anyhow::ensure!(
        batch.failures.is_empty(),
        "{} of {} traces failed",
        batch.failures.len(),
        workflow_config.traces.len()
    );
    Ok(())
}
