use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat};
use ndarray::Array2;

use crate::data::Chromatogram2D;
use crate::math::MatrixHelper;
use crate::prelude::{Shape, StageError, StageResult};

/// Maximum value of a mask stored as 8-bit 0/255 image.
pub const BYTE_SCALE: f64 = 255.0;

/// Named region of interest over a chromatogram.
///
/// Values are kept as read; [`Mask::binary`] folds 0/255 masks down to 0/1.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    name: String,
    values: Array2<f64>,
}

impl Mask {
    pub fn new(name: impl Into<String>, values: Array2<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Builds a mask from row vectors, as sent by a drawing front end.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<f64>>) -> StageResult<Self> {
        let name = name.into();
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(index) = rows.iter().position(|row| row.len() != width) {
            return Err(StageError::Precondition(format!(
                "mask {} row {} has {} values, expected {}",
                name,
                index,
                rows[index].len(),
                width
            )));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((height, width), flat)
            .map_err(|err| StageError::Precondition(format!("mask {}: {}", name, err)))?;
        Ok(Self { name, values })
    }

    /// Reads a single-channel TIFF; image rows become matrix rows.
    pub fn load_tiff(path: &Path, name: impl Into<String>) -> StageResult<Self> {
        let name = name.into();
        let image = image::open(path)?;
        let (width, height) = (image.width() as usize, image.height() as usize);
        let flat: Vec<f64> = match image {
            DynamicImage::ImageLuma8(buffer) => buffer.into_raw().into_iter().map(f64::from).collect(),
            DynamicImage::ImageLuma16(buffer) => {
                buffer.into_raw().into_iter().map(f64::from).collect()
            }
            other => other.into_luma8().into_raw().into_iter().map(f64::from).collect(),
        };
        let values = Array2::from_shape_vec((height, width), flat).map_err(|err| {
            StageError::Precondition(format!("mask {}: {}", path.display(), err))
        })?;
        Ok(Self { name, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> Shape {
        self.values.dim()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Mask scaled to 0/1: a maximum of 255 marks a byte-scaled mask.
    pub fn binary(&self) -> Array2<f64> {
        match MatrixHelper::global_max(self.values.view()) {
            Some(max) if max == BYTE_SCALE => self.values.mapv(|v| v / BYTE_SCALE),
            _ => self.values.clone(),
        }
    }

    pub fn check_shape(&self, expected: Shape) -> StageResult<()> {
        if self.shape() != expected {
            return Err(StageError::ShapeMismatch {
                context: format!("mask {}", self.name),
                expected,
                found: self.shape(),
            });
        }
        Ok(())
    }

    /// The chromatogram with everything outside the region zeroed.
    pub fn apply(&self, chromatogram: &Chromatogram2D) -> StageResult<Array2<f64>> {
        self.check_shape(chromatogram.shape())?;
        Ok(&chromatogram.values() * &self.binary())
    }

    /// Writes the mask as an 8-bit 0/255 TIFF.
    pub fn save_tiff(&self, path: &Path) -> StageResult<()> {
        let (height, width) = self.shape();
        let pixels: Vec<u8> = self
            .binary()
            .iter()
            .map(|&v| if v > 0.5 { u8::MAX } else { 0 })
            .collect();
        let image = GrayImage::from_raw(width as u32, height as u32, pixels).ok_or_else(|| {
            StageError::Precondition(format!("mask {} does not fit an image buffer", self.name))
        })?;
        image.save_with_format(path, ImageFormat::Tiff)?;
        Ok(())
    }
}
