use crate::estimation::EstimationError;
use crate::source::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("data source unavailable: {0}")]
    DataUnavailable(#[from] SourceError),
    #[error("device '{0}' not found")]
    NotFound(String),
    #[error("estimation failed: {0}")]
    Estimation(#[from] EstimationError),
}
