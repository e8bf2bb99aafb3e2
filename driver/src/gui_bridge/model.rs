use crate::workflow::runner::WorkflowResult;
use gcxgccore::{Mask, MaskIntegralSet, StageResult};
use serde::{Deserialize, Serialize};

/// Snapshot of the current sample as served to the mask drawing front end.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChromatogramModel {
    pub name: String,
    /// `[rt1_min, rt1_max, rt2_min, rt2_max]`
    pub limits: Option<[f64; 4]>,
    pub rt1_minutes: Vec<f64>,
    pub rt2_seconds: Vec<f64>,
    pub values: Vec<Vec<f64>>,
    pub shift: i64,
    pub integrals: Option<MaskIntegralSet>,
}

impl ChromatogramModel {
    pub fn from_result(result: &WorkflowResult) -> Self {
        let chromatogram = result.sample.chromatogram();
        Self {
            name: result.sample.name().to_string(),
            limits: Some(result.limits().as_array()),
            rt1_minutes: chromatogram.rt1_minutes().to_vec(),
            rt2_seconds: chromatogram.rt2_seconds().to_vec(),
            values: chromatogram.to_rows(),
            shift: result.sample.shift(),
            integrals: result.integrals.clone(),
        }
    }
}

/// A mask as exchanged over the bridge: row-major values, 0/1 or 0/255.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaskPayload {
    pub name: String,
    pub rows: Vec<Vec<f64>>,
}

impl MaskPayload {
    pub fn from_mask(mask: &Mask) -> Self {
        Self {
            name: mask.name().to_string(),
            rows: mask.values().outer_iter().map(|row| row.to_vec()).collect(),
        }
    }

    pub fn to_mask(&self) -> StageResult<Mask> {
        Mask::from_rows(self.name.as_str(), self.rows.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MaskRequest {
    pub masks: Vec<MaskPayload>,
}
