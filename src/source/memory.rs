use crate::source::{SampleSource, SourceError};
use crate::state::ActivitySample;

/// Fixed in-memory activity log.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    samples: Vec<ActivitySample>,
    unavailable: Option<String>,
}

impl InMemorySource {
    pub fn new(samples: Vec<ActivitySample>) -> Self {
        Self {
            samples,
            unavailable: None,
        }
    }

    /// A source that fails every load with `reason`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            samples: Vec::new(),
            unavailable: Some(reason.into()),
        }
    }
}

impl SampleSource for InMemorySource {
    fn load_all(&self) -> Result<Vec<ActivitySample>, SourceError> {
        match &self.unavailable {
            Some(reason) => Err(SourceError::Unavailable(reason.clone())),
            None => Ok(self.samples.clone()),
        }
    }
}
