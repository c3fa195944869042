use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::upstream::UpstreamError;
use crate::workflows::deadlines::{CalculationError, DeadlineServiceError};
use crate::workflows::invoices::InvoiceServiceError;
use crate::workflows::projects::ProjectServiceError;
use crate::workflows::{RepositoryError, ValidationError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;
use tracing::error;

const GENERIC_FAILURE: &str = "internal server error";

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    /// Missing or malformed input.
    Validation(String),
    NotFound(String),
    /// A concurrent write won; the request is safe to retry.
    Conflict(String),
    Storage(String),
    Upstream(UpstreamError),
    Internal(String),
}

impl AppError {
    fn from_repository(err: RepositoryError, entity: &str) -> Self {
        match err {
            RepositoryError::NotFound => AppError::NotFound(format!("{entity} not found")),
            RepositoryError::Conflict => AppError::Conflict(format!(
                "{entity} was modified by a concurrent request; retry"
            )),
            RepositoryError::Constraint(detail) => AppError::Validation(detail),
            RepositoryError::Rejected(message) => AppError::Validation(message),
            RepositoryError::Unavailable(detail) => AppError::Storage(detail),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Storage(_)
            | AppError::Upstream(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Validation(message) => write!(f, "{}", message),
            AppError::NotFound(message) => write!(f, "{}", message),
            AppError::Conflict(message) => write!(f, "{}", message),
            AppError::Storage(detail) => write!(f, "storage error: {}", detail),
            AppError::Upstream(err) => write!(f, "upstream error: {}", err),
            AppError::Internal(detail) => write!(f, "internal error: {}", detail),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Upstream(err) => Some(err),
            AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::Conflict(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            GENERIC_FAILURE.to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value.0)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::from_repository(value, "record")
    }
}

impl From<CalculationError> for AppError {
    fn from(value: CalculationError) -> Self {
        match value {
            CalculationError::NoMatchingRule { .. } => Self::NotFound(value.to_string()),
            CalculationError::DateOutOfRange { .. } => Self::Validation(value.to_string()),
        }
    }
}

impl From<DeadlineServiceError> for AppError {
    fn from(value: DeadlineServiceError) -> Self {
        match value {
            DeadlineServiceError::Validation(err) => err.into(),
            DeadlineServiceError::Calculation(err) => err.into(),
            DeadlineServiceError::ProjectNotFound(_) => Self::NotFound(value.to_string()),
            DeadlineServiceError::Repository(err) => Self::from_repository(err, "deadline"),
        }
    }
}

impl From<InvoiceServiceError> for AppError {
    fn from(value: InvoiceServiceError) -> Self {
        match value {
            InvoiceServiceError::Validation(err) => err.into(),
            InvoiceServiceError::ProjectNotFound(_) => Self::NotFound(value.to_string()),
            InvoiceServiceError::Repository(err) => Self::from_repository(err, "invoice"),
        }
    }
}

impl From<ProjectServiceError> for AppError {
    fn from(value: ProjectServiceError) -> Self {
        match value {
            ProjectServiceError::Validation(err) => err.into(),
            ProjectServiceError::Repository(err) => Self::from_repository(err, "project"),
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(value: UpstreamError) -> Self {
        match value {
            UpstreamError::UnknownService(_) => Self::NotFound(value.to_string()),
            UpstreamError::InvalidPath(_) => Self::Validation(value.to_string()),
            other => Self::Upstream(other),
        }
    }
}
