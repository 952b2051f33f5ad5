//! Activity record loading.
//!
//! A `SampleSource` hands back the raw activity log for a device. Records are
//! returned in source order; ordering is the estimator's job.

use crate::state::ActivitySample;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub mod json_file;
pub mod memory;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read data file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse data file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

pub trait SampleSource: Send + Sync + std::fmt::Debug {
    /// Load every valid record the source holds.
    fn load_all(&self) -> Result<Vec<ActivitySample>, SourceError>;

    /// Load the records belonging to `device_id`. An empty vec means the
    /// device is unknown.
    fn fetch_by_device(&self, device_id: &str) -> Result<Vec<ActivitySample>, SourceError> {
        let samples = self.load_all()?;
        Ok(samples
            .into_iter()
            .filter(|sample| sample.device_id == device_id)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSample {
    device_id: String,
    timestamp: String,
    is_writing: Option<bool>,
}

/// Parse a JSON array of activity records.
///
/// The document must be an array; anything else is a parse error. Elements
/// that do not match the record schema, or whose timestamp is not RFC 3339,
/// are skipped with a warning so one bad record cannot fail every device.
pub fn parse_samples(contents: &str) -> Result<Vec<ActivitySample>, SourceError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(contents)?;
    let mut samples = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        let raw: RawSample = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(index, error = %err, "Skipping malformed activity record");
                continue;
            }
        };

        match ActivitySample::parse(
            raw.device_id,
            &raw.timestamp,
            raw.is_writing.unwrap_or(false),
        ) {
            Ok(sample) => samples.push(sample),
            Err(err) => {
                warn!(
                    index,
                    timestamp = %raw.timestamp,
                    error = %err,
                    "Skipping activity record with unparsable timestamp"
                );
            }
        }
    }

    Ok(samples)
}
