use crate::error::AppError;
use crate::estimation::estimate_pen_status;
use crate::estimation::model::EstimationModel;
use crate::source::SampleSource;
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// One writing-activity observation reported by a pen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySample {
    pub device_id: String,
    pub timestamp: OffsetDateTime,
    /// Timestamp exactly as the device reported it.
    pub raw_timestamp: String,
    pub is_writing: bool,
}

impl ActivitySample {
    pub fn parse(
        device_id: impl Into<String>,
        timestamp: &str,
        is_writing: bool,
    ) -> Result<Self, time::error::Parse> {
        Ok(Self {
            device_id: device_id.into(),
            timestamp: OffsetDateTime::parse(timestamp, &Rfc3339)?,
            raw_timestamp: timestamp.to_string(),
            is_writing,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementSuggestion {
    NotNeeded,
    Low,
    Depleted,
}

impl ReplacementSuggestion {
    /// Classify an ink level; the low threshold is strict, so a level equal
    /// to it still reads as `NotNeeded`.
    pub fn for_level(ink_level: f64, threshold: f64) -> Self {
        if ink_level <= 0.0 {
            Self::Depleted
        } else if ink_level < threshold {
            Self::Low
        } else {
            Self::NotNeeded
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::NotNeeded => "no replacement needed yet.",
            Self::Low => "ink level low; replacement recommended.",
            Self::Depleted => "ink depleted; replace now.",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PenStatus {
    pub device_id: String,
    /// Remaining ink in percent, rounded to two decimals.
    pub ink_level: f64,
    pub estimated_empty_date: Option<OffsetDateTime>,
    pub replacement_suggestion: ReplacementSuggestion,
    pub last_updated_at: String,
}

/// Shared, read-only handles used by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    source: Arc<dyn SampleSource>,
    model: Arc<dyn EstimationModel>,
}

impl AppState {
    pub fn new(source: Arc<dyn SampleSource>, model: Arc<dyn EstimationModel>) -> Self {
        Self { source, model }
    }

    pub fn source(&self) -> &dyn SampleSource {
        self.source.as_ref()
    }

    pub fn model(&self) -> &dyn EstimationModel {
        self.model.as_ref()
    }

    pub fn pen_status(&self, device_id: &str) -> Result<PenStatus, AppError> {
        estimate_pen_status(self.source(), self.model(), device_id)
    }
}
