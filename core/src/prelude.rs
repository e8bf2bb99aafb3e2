use crate::data::Chromatogram2D;

/// Matrix shape as `(rows, columns)`.
pub type Shape = (usize, usize);

/// Output produced by each matrix stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub chromatogram: Chromatogram2D,
    pub metadata: StageMetadata,
}

impl StageOutput {
    pub fn new(chromatogram: Chromatogram2D) -> Self {
        Self {
            chromatogram,
            metadata: StageMetadata::default(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.metadata.notes.push(note.into());
        self
    }
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    /// Scalar the stage subtracted or divided by, when it has one.
    pub scale: Option<f64>,
    pub notes: Vec<String>,
}

/// Common error type for every component of the chromatogram transform.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("precondition violated: {0}")]
    Precondition(String),
    #[error("shape mismatch for {context}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        context: String,
        expected: Shape,
        found: Shape,
    },
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("division degeneracy: {0}")]
    DivisionDegeneracy(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed trace table: {0}")]
    Csv(#[from] csv::Error),
    #[error("unreadable mask image: {0}")]
    Image(#[from] image::ImageError),
}

pub type StageResult<T> = Result<T, StageError>;

/// A matrix-to-matrix step of the chromatogram transform.
///
/// Stages are pure: they consume a chromatogram and hand back one of the same
/// shape, so the same stage value can be reused across samples and threads.
pub trait ProcessingStage {
    fn label(&self) -> &'static str;
    fn execute(&self, input: Chromatogram2D) -> StageResult<StageOutput>;
}
