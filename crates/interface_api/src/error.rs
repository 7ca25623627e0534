//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use core_kernel::PortError;
use domain_fees::FeeError;
use domain_reminders::ReminderError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized => ("unauthorized", "Unauthorized".to_string(), None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "request failed");
                ("internal_error", msg, None)
            }
            ApiError::Unavailable(msg) => ("service_unavailable", msg, None),
            ApiError::Validation { message, details } => {
                let details = (!details.is_empty()).then_some(details);
                ("validation_error", message, details)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, .. } => ApiError::NotFound(format!("{} not found", entity_type)),
            PortError::Validation { message, field } => ApiError::Validation {
                message,
                details: field.into_iter().collect(),
            },
            PortError::Conflict { message } => ApiError::Conflict(message),
            PortError::Connection { message, .. } => ApiError::Unavailable(message),
            PortError::Transformation { message } | PortError::Internal { message, .. } => {
                ApiError::Internal(message)
            }
        }
    }
}

impl From<FeeError> for ApiError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::Port(e) => e.into(),
            FeeError::StudentFeeNotFound(_) => ApiError::NotFound("Student fee not found".to_string()),
            FeeError::PaymentExceedsDue { .. } => ApiError::BadRequest("Payment exceeds due amount".to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<ReminderError> for ApiError {
    fn from(err: ReminderError) -> Self {
        match err {
            ReminderError::Port(e) => e.into(),
            ReminderError::InvalidRunDate(_) => ApiError::BadRequest(err.to_string()),
            ReminderError::InvalidRule(message) => ApiError::validation(message),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        details.sort();

        ApiError::Validation {
            message: "Request validation failed".to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Money;

    #[test]
    fn test_port_errors_map_to_statuses() {
        assert_eq!(ApiError::from(PortError::not_found("StudentFee", "x")).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(PortError::conflict("dup")).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(PortError::connection("down")).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::from(PortError::internal("boom")).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_overpayment_is_bad_request() {
        let err = ApiError::from(FeeError::PaymentExceedsDue {
            amount: Money::from_major(10),
            due: Money::from_major(5),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Bad request: Payment exceeds due amount");
    }

    #[test]
    fn test_reminder_errors() {
        assert_eq!(
            ApiError::from(ReminderError::InvalidRunDate("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ReminderError::InvalidRule("bad".into())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
