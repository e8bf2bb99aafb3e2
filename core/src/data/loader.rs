use std::fs;
use std::path::Path;

use log::debug;

use crate::prelude::{StageError, StageResult};

use super::trace::RawTrace;

const MINUTES_COLUMN: usize = 1;
const INTENSITY_COLUMN: usize = 3;
const EXPECTED_COLUMNS: usize = 4;

/// Reader for the detector's CSV export.
///
/// The export starts with one free-form title line, followed by a header row
/// and data rows with the columns `Time(ms)`, `Time(min)`, an unused column and
/// `Absolute Intensity`. Retention time is taken from the minutes column.
pub struct TraceLoader;

impl TraceLoader {
    pub fn load_csv(path: &Path) -> StageResult<RawTrace> {
        let text = fs::read_to_string(path)?;
        let trace = Self::parse_csv(&text).map_err(|err| match err {
            StageError::Precondition(msg) => {
                StageError::Precondition(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        debug!("loaded {} samples from {}", trace.len(), path.display());
        Ok(trace)
    }

    pub fn parse_csv(text: &str) -> StageResult<RawTrace> {
        let body = match text.split_once('\n') {
            Some((_title, rest)) => rest,
            None => {
                return Err(StageError::Precondition(
                    "trace export has no header or data rows".into(),
                ))
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let mut minutes = Vec::new();
        let mut intensities = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() < EXPECTED_COLUMNS {
                return Err(StageError::Precondition(format!(
                    "data row {} has {} columns, expected {}",
                    row + 1,
                    record.len(),
                    EXPECTED_COLUMNS
                )));
            }
            minutes.push(Self::field(&record, MINUTES_COLUMN, row)?);
            intensities.push(Self::field(&record, INTENSITY_COLUMN, row)?);
        }

        RawTrace::from_minutes(&minutes, intensities)
    }

    fn field(record: &csv::StringRecord, column: usize, row: usize) -> StageResult<f64> {
        let raw = record.get(column).unwrap_or_default();
        raw.parse::<f64>().map_err(|_| {
            StageError::Precondition(format!(
                "data row {} column {} is not numeric: {:?}",
                row + 1,
                column + 1,
                raw
            ))
        })
    }
}
