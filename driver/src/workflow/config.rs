use anyhow::Context;
use gcxgccore::pipeline::{PipelineConfig, SamplingInterval};
use gcxgccore::processing::{BaselineMode, NormalizeMode};
use gcxgccore::MaskIntegrator;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// `sampling_interval` as written in YAML: seconds, or the keyword `infer`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntervalSetting {
    Seconds(f64),
    Keyword(String),
}

impl Default for IntervalSetting {
    fn default() -> Self {
        IntervalSetting::Keyword("infer".into())
    }
}

impl IntervalSetting {
    pub fn to_sampling_interval(&self) -> anyhow::Result<SamplingInterval> {
        match self {
            IntervalSetting::Seconds(seconds) => Ok(SamplingInterval::Seconds(*seconds)),
            IntervalSetting::Keyword(word) => Ok(word.parse::<SamplingInterval>()?),
        }
    }
}

fn default_baseline() -> String {
    "stridewise".into()
}

fn default_normalize() -> String {
    "volume".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub modulation_time: f64,
    #[serde(default)]
    pub sampling_interval: IntervalSetting,
    #[serde(default)]
    pub shift: i64,
    #[serde(default = "default_baseline")]
    pub baseline_type: String,
    #[serde(default = "default_normalize")]
    pub normalize: String,
    #[serde(default)]
    pub solvent_cutoff: f64,
    #[serde(default)]
    pub traces: Vec<PathBuf>,
    #[serde(default)]
    pub mask_dir: Option<PathBuf>,
    #[serde(default)]
    pub mask_prefix: Option<String>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_modulation(modulation_time: f64) -> Self {
        Self {
            modulation_time,
            sampling_interval: IntervalSetting::default(),
            shift: 0,
            baseline_type: default_baseline(),
            normalize: default_normalize(),
            solvent_cutoff: 0.0,
            traces: Vec::new(),
            mask_dir: None,
            mask_prefix: None,
            output: None,
        }
    }

    pub fn to_pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let baseline: BaselineMode = self
            .baseline_type
            .parse()
            .context("reading baseline_type")?;
        let normalize: NormalizeMode = self.normalize.parse().context("reading normalize")?;
        let sampling_interval = self
            .sampling_interval
            .to_sampling_interval()
            .context("reading sampling_interval")?;
        let config = PipelineConfig::new(self.modulation_time)
            .with_sampling_interval(sampling_interval)
            .with_shift(self.shift)
            .with_baseline(baseline)
            .with_normalize(normalize)
            .with_solvent_cutoff(self.solvent_cutoff);
        config.validate().context("validating workflow config")?;
        Ok(config)
    }

    pub fn mask_integrator(&self) -> MaskIntegrator {
        match &self.mask_prefix {
            Some(prefix) => MaskIntegrator::with_prefix(prefix.as_str()),
            None => MaskIntegrator::new(),
        }
    }
}
