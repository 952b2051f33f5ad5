use crate::error::AppError;
use crate::source::SampleSource;
use crate::state::{PenStatus, ReplacementSuggestion};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod linear;
pub mod model;

use model::EstimationModel;

#[derive(Debug, Error)]
pub enum EstimationError {
    #[error("no activity samples to estimate from")]
    NoSamples,
}

/// Load a device's activity log and run it through `model`.
pub fn estimate_pen_status(
    source: &dyn SampleSource,
    model: &dyn EstimationModel,
    device_id: &str,
) -> Result<PenStatus, AppError> {
    let samples = source.fetch_by_device(device_id)?;
    if samples.is_empty() {
        return Err(AppError::NotFound(device_id.to_string()));
    }
    debug!(device_id, count = samples.len(), "Estimating pen status");

    let status = model.estimate(device_id, &samples)?;

    match status.replacement_suggestion {
        ReplacementSuggestion::Depleted => {
            warn!(device_id, "Pen ink depleted");
        }
        ReplacementSuggestion::Low => {
            info!(device_id, ink_level = status.ink_level, "Pen ink low");
        }
        ReplacementSuggestion::NotNeeded => {}
    }

    Ok(status)
}
