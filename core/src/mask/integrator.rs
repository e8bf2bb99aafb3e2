use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::data::Chromatogram2D;
use crate::math::IntegrationHelper;
use crate::pipeline::Sample;
use crate::prelude::{StageError, StageResult};
use crate::processing::NormalizeMode;

use super::region::Mask;

/// Key reserved for the share of volume no mask claims.
pub const UNASSIGNED: &str = "unassigned";

const MASK_EXTENSION: &str = "tif";

/// Integrated volume of every named region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaskIntegralSet {
    integrals: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unassigned: Option<f64>,
}

impl MaskIntegralSet {
    pub fn get(&self, name: &str) -> Option<f64> {
        if name == UNASSIGNED {
            return self.unassigned;
        }
        self.integrals.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.integrals.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.integrals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integrals.is_empty()
    }

    /// Sum of the named integrals.
    pub fn assigned(&self) -> f64 {
        self.integrals.values().sum()
    }

    /// `1 - assigned`, present only for volume-normalized chromatograms.
    /// Negative when masks overlap.
    pub fn unassigned(&self) -> Option<f64> {
        self.unassigned
    }

    /// Name/value rows in output order, `unassigned` last when present.
    pub fn records(&self) -> Vec<(String, f64)> {
        let mut rows: Vec<(String, f64)> = self
            .integrals
            .iter()
            .map(|(name, &value)| (name.clone(), value))
            .collect();
        if let Some(value) = self.unassigned {
            rows.push((UNASSIGNED.to_string(), value));
        }
        rows
    }
}

/// Attributes chromatogram volume to named masks.
#[derive(Debug, Clone, Default)]
pub struct MaskIntegrator {
    prefix: Option<String>,
}

impl MaskIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strips `prefix` from mask file stems before they are used as names.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: (!prefix.is_empty()).then_some(prefix),
        }
    }

    /// Double trapezoidal integral of the chromatogram inside one mask.
    pub fn integrate_mask(chromatogram: &Chromatogram2D, mask: &Mask) -> StageResult<f64> {
        let masked = mask.apply(chromatogram)?;
        Ok(IntegrationHelper::volume(masked.view()))
    }

    /// Integrates every mask; with `report_unassigned` the remainder of a
    /// unit volume is added as [`UNASSIGNED`].
    pub fn integrate(
        &self,
        chromatogram: &Chromatogram2D,
        masks: &[Mask],
        report_unassigned: bool,
    ) -> StageResult<MaskIntegralSet> {
        if masks.is_empty() {
            return Err(StageError::Configuration("no masks supplied".into()));
        }

        let mut integrals = BTreeMap::new();
        for mask in masks {
            if mask.name() == UNASSIGNED {
                return Err(StageError::Configuration(format!(
                    "mask name {:?} is reserved",
                    UNASSIGNED
                )));
            }
            let value = Self::integrate_mask(chromatogram, mask)?;
            debug!("mask {} integrates to {:.6}", mask.name(), value);
            if integrals.insert(mask.name().to_string(), value).is_some() {
                return Err(StageError::Configuration(format!(
                    "mask name {:?} appears more than once",
                    mask.name()
                )));
            }
        }

        let mut set = MaskIntegralSet {
            integrals,
            unassigned: None,
        };
        if report_unassigned {
            set.unassigned = Some(1.0 - set.assigned());
        }
        Ok(set)
    }

    /// Integrates a sample; `unassigned` is reported when it was volume-normalized.
    pub fn integrate_sample(&self, sample: &Sample, masks: &[Mask]) -> StageResult<MaskIntegralSet> {
        let report_unassigned = sample.normalize_mode() == NormalizeMode::Volume;
        let set = self.integrate(sample.chromatogram(), masks, report_unassigned)?;
        info!(
            "{}: integrated {} masks, assigned {:.4}",
            sample.name(),
            set.len(),
            set.assigned()
        );
        Ok(set)
    }

    /// Loads the masks in `dir` and integrates them against `sample`.
    pub fn integrate_directory(&self, sample: &Sample, dir: &Path) -> StageResult<MaskIntegralSet> {
        let masks = self.load_directory(dir)?;
        self.integrate_sample(sample, &masks)
    }

    /// Loads every `.tif` file (any case) in `dir`, sorted by file name.
    pub fn load_directory(&self, dir: &Path) -> StageResult<Vec<Mask>> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_mask = path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case(MASK_EXTENSION))
                    .unwrap_or(false);
            if is_mask {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(StageError::Configuration(format!(
                "no .{} masks found in {}",
                MASK_EXTENSION,
                dir.display()
            )));
        }
        paths.sort();

        paths
            .iter()
            .map(|path| Mask::load_tiff(path, self.mask_name(path)))
            .collect()
    }

    /// File stem with the configured prefix removed.
    pub fn mask_name(&self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match &self.prefix {
            Some(prefix) => stem
                .strip_prefix(prefix.as_str())
                .map(str::to_string)
                .unwrap_or(stem),
            None => stem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};
    use tempfile::tempdir;

    fn ones(rows: usize, columns: usize) -> Chromatogram2D {
        Chromatogram2D::new(
            Array2::ones((rows, columns)),
            (0..rows).rev().map(|r| r as f64).collect(),
            (0..columns).map(|c| c as f64).collect(),
        )
        .unwrap()
    }

    fn left_half(scale: f64) -> Array2<f64> {
        Array2::from_shape_fn((4, 4), |(_, c)| if c < 2 { scale } else { 0.0 })
    }

    #[test]
    fn left_half_mask_takes_half_the_volume() {
        let chrom = ones(4, 4);
        let volume = chrom.volume();
        let value = MaskIntegrator::integrate_mask(&chrom, &Mask::new("left", left_half(1.0))).unwrap();
        assert_relative_eq!(value, volume / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn byte_and_unit_masks_integrate_identically() {
        let chrom = Chromatogram2D::new(
            Array2::from_shape_fn((4, 4), |(r, c)| (r + 2 * c) as f64),
            vec![3.0, 2.0, 1.0, 0.0],
            vec![0.0, 1.0, 2.0, 3.0],
        )
        .unwrap();
        let byte = MaskIntegrator::integrate_mask(&chrom, &Mask::new("b", left_half(255.0))).unwrap();
        let unit = MaskIntegrator::integrate_mask(&chrom, &Mask::new("u", left_half(1.0))).unwrap();
        assert_eq!(byte, unit);
    }

    #[test]
    fn overlapping_masks_drive_unassigned_negative() {
        let chrom = ones(4, 4);
        let scaled = chrom.clone().with_values(Array2::ones((4, 4)) / 9.0).unwrap();
        let everything = Mask::new("all", Array2::ones((4, 4)));
        let left = Mask::new("left", left_half(1.0));
        let set = MaskIntegrator::new()
            .integrate(&scaled, &[everything, left], true)
            .unwrap();
        assert_relative_eq!(set.get("all").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(set.unassigned().unwrap(), -0.5, epsilon = 1e-12);
        assert_eq!(set.records().last().unwrap().0, UNASSIGNED);
    }

    #[test]
    fn unassigned_is_omitted_when_not_requested() {
        let set = MaskIntegrator::new()
            .integrate(&ones(4, 4), &[Mask::new("left", left_half(1.0))], false)
            .unwrap();
        assert_eq!(set.unassigned(), None);
        assert_eq!(set.records().len(), 1);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = MaskIntegrator::new()
            .integrate(&ones(4, 4), &[Mask::new("small", array![[1.0]])], true)
            .unwrap_err();
        assert!(matches!(err, StageError::ShapeMismatch { .. }));
    }

    #[test]
    fn empty_or_duplicate_mask_lists_are_configuration_errors() {
        let chrom = ones(4, 4);
        assert!(matches!(
            MaskIntegrator::new().integrate(&chrom, &[], true).unwrap_err(),
            StageError::Configuration(_)
        ));
        let twice = [Mask::new("a", left_half(1.0)), Mask::new("a", left_half(1.0))];
        assert!(matches!(
            MaskIntegrator::new().integrate(&chrom, &twice, true).unwrap_err(),
            StageError::Configuration(_)
        ));
    }

    #[test]
    fn empty_directory_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a mask").unwrap();
        let err = MaskIntegrator::new().load_directory(dir.path()).unwrap_err();
        assert!(matches!(err, StageError::Configuration(_)));
    }

    #[test]
    fn directory_masks_are_named_by_stem_without_prefix() {
        let dir = tempdir().unwrap();
        Mask::new("x", left_half(1.0))
            .save_tiff(&dir.path().join("Mask_aromatics.TIF"))
            .unwrap();
        Mask::new("y", Array2::ones((4, 4)))
            .save_tiff(&dir.path().join("alkanes.tif"))
            .unwrap();
        let masks = MaskIntegrator::with_prefix("Mask_")
            .load_directory(dir.path())
            .unwrap();
        let names: Vec<&str> = masks.iter().map(Mask::name).collect();
        assert_eq!(names, vec!["aromatics", "alkanes"]);
    }

    #[test]
    fn directory_integration_matches_in_memory_unit_masks() {
        use crate::data::RawTrace;
        use crate::pipeline::{parse_2d_chromatogram, PipelineConfig};

        let intensities = (0..16).map(|i| ((i * 7) % 5) as f64 + 1.0).collect();
        let trace = RawTrace::from_uniform(0.5, intensities).unwrap();
        let sample = parse_2d_chromatogram(trace, &PipelineConfig::new(2.0)).unwrap();
        assert_eq!(sample.chromatogram().shape(), (4, 4));

        let dir = tempdir().unwrap();
        let left = Mask::new("left", left_half(1.0));
        let right = Mask::new("right", left_half(1.0).mapv(|v| 1.0 - v));
        left.save_tiff(&dir.path().join("Mask_left.tif")).unwrap();
        right.save_tiff(&dir.path().join("Mask_right.tif")).unwrap();

        let integrator = MaskIntegrator::with_prefix("Mask_");
        let from_disk = integrator.integrate_directory(&sample, dir.path()).unwrap();
        let in_memory = integrator.integrate_sample(&sample, &[left, right]).unwrap();

        assert_eq!(from_disk.names().collect::<Vec<_>>(), vec!["left", "right"]);
        for name in ["left", "right", UNASSIGNED] {
            assert_relative_eq!(
                from_disk.get(name).unwrap(),
                in_memory.get(name).unwrap(),
                epsilon = 1e-12
            );
        }
        assert!(from_disk.unassigned().is_some());
    }
}
