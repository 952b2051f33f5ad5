use crate::api::responses::{
    ErrorCode, ErrorResponse, HealthResponseBody, HealthStatus, PenStatusSuccessResponse,
    WelcomeResponse,
};
use crate::error::AppError;
use crate::estimation::EstimationError;
use crate::state::{AppState, PenStatus};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const DATA_UNAVAILABLE_MESSAGE: &str = "Pen data unavailable";
pub const WELCOME_MESSAGE: &str =
    "Welcome to the IoT Pen API. Access status at /pens/{device_id}/status";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum PenStatusResponse {
    Success(PenStatusSuccessResponse),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl IntoResponse for PenStatusResponse {
    fn into_response(self) -> Response {
        match self {
            PenStatusResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            PenStatusResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_pen_status(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> impl IntoResponse {
    build_pen_status_response(&state, &device_id, SystemTime::now())
}

pub struct HealthResponse {
    status: StatusCode,
    body: HealthResponseBody,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub async fn get_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    build_health_response(&state, SystemTime::now())
}

pub async fn get_root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE,
    })
}

fn build_pen_status_response(
    state: &AppState,
    device_id: &str,
    now: SystemTime,
) -> PenStatusResponse {
    match state.pen_status(device_id) {
        Ok(status) => success_response(status),
        Err(AppError::NotFound(_) | AppError::Estimation(EstimationError::NoSamples)) => {
            warn!(device_id, "Status requested for unknown device");
            error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                format!("Device ID '{device_id}' not found."),
                now,
            )
        }
        Err(AppError::DataUnavailable(err)) => {
            error!(device_id, error = %err, "Pen data source unavailable");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DataUnavailable,
                DATA_UNAVAILABLE_MESSAGE.to_string(),
                now,
            )
        }
    }
}

fn success_response(status: PenStatus) -> PenStatusResponse {
    let estimated_empty_date = match status.estimated_empty_date.map(format_datetime).transpose() {
        Ok(formatted) => formatted,
        Err(err) => {
            error!(
                device_id = %status.device_id,
                error = %err,
                "Failed to format estimated empty date"
            );
            return internal_error("empty date formatting failure");
        }
    };

    PenStatusResponse::Success(PenStatusSuccessResponse {
        device_id: status.device_id,
        ink_level: status.ink_level,
        estimated_empty_date,
        replacement_suggestion: status.replacement_suggestion.message().to_string(),
        last_updated_at: status.last_updated_at,
    })
}

fn error_response(
    status: StatusCode,
    error_code: ErrorCode,
    error_message: String,
    now: SystemTime,
) -> PenStatusResponse {
    match format_timestamp(now) {
        Ok(timestamp) => PenStatusResponse::Error {
            status,
            body: ErrorResponse {
                error_code,
                error_message,
                timestamp,
            },
        },
        Err(_err) => internal_error("timestamp formatting failure"),
    }
}

fn internal_error(message: &str) -> PenStatusResponse {
    error!(
        message = message,
        "Internal error while handling /pens/{{device_id}}/status"
    );
    PenStatusResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: fallback_timestamp(),
        },
    }
}

fn build_health_response(state: &AppState, now: SystemTime) -> HealthResponse {
    let (status_code, status) = match state.source().load_all() {
        Ok(_) => (StatusCode::OK, HealthStatus::Ok),
        Err(err) => {
            warn!(error = %err, "Health check could not read pen data");
            (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Ko)
        }
    };

    let timestamp = format_timestamp(now).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format health timestamp");
        fallback_timestamp()
    });

    HealthResponse {
        status: status_code,
        body: HealthResponseBody { status, timestamp },
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    format_datetime(OffsetDateTime::from(timestamp))
}

fn format_datetime(datetime: OffsetDateTime) -> Result<String, TimestampError> {
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}

fn fallback_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
