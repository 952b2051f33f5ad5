//! Estimation model trait for ink-level estimation.
//!
//! Models take a device's activity log and produce a `PenStatus`. The service
//! builds one model at startup from `EstimationParams`.

use crate::estimation::EstimationError;
use crate::state::{ActivitySample, PenStatus};

pub const DEFAULT_INITIAL_LEVEL: f64 = 100.0;
/// 0.5% of capacity per minute of writing.
pub const DEFAULT_CONSUMPTION_RATE_PER_SECOND: f64 = 0.5 / 60.0;
pub const DEFAULT_REPLACEMENT_THRESHOLD: f64 = 20.0;

/// Constants driving the ink model, loaded from the `[estimation]` config section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimationParams {
    /// Ink level of a fresh cartridge, in percent.
    pub initial_level: f64,
    /// Percentage points consumed per second of writing.
    pub consumption_rate_per_second: f64,
    /// Levels strictly below this trigger a low-ink suggestion.
    pub replacement_threshold: f64,
}

impl Default for EstimationParams {
    fn default() -> Self {
        Self {
            initial_level: DEFAULT_INITIAL_LEVEL,
            consumption_rate_per_second: DEFAULT_CONSUMPTION_RATE_PER_SECOND,
            replacement_threshold: DEFAULT_REPLACEMENT_THRESHOLD,
        }
    }
}

/// Trait for models that estimate pen status from activity samples.
pub trait EstimationModel: Send + Sync + std::fmt::Debug {
    /// Compute the status of `device_id` from its samples, in any order.
    fn estimate(
        &self,
        device_id: &str,
        samples: &[ActivitySample],
    ) -> Result<PenStatus, EstimationError>;

    /// Returns the parameters this model was built with.
    fn params(&self) -> &EstimationParams;
}
