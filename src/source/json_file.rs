use crate::source::{SampleSource, SourceError, parse_samples};
use crate::state::ActivitySample;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads the activity log from a JSON file on every call.
///
/// Nothing is cached, so edits to the file are picked up by the next request.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSource for JsonFileSource {
    fn load_all(&self) -> Result<Vec<ActivitySample>, SourceError> {
        let contents = std::fs::read_to_string(&self.path)?;
        let samples = parse_samples(&contents)?;
        debug!(
            path = %self.path.display(),
            count = samples.len(),
            "Loaded activity records"
        );
        Ok(samples)
    }
}
