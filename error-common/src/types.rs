use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::codes;
use crate::outcome::{ExpectedFailure, UnhandledError};

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Error type/code
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<HashMap<String, Vec<String>>>,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Main API error enum
///
/// Every variant except [`ApiError::Internal`] is a deliberate, client-facing
/// rejection and is never forwarded to error reporting.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, Vec<String>>>,
    },

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Authorization error: {message}")]
    Authorization { message: String },

    #[error("Resource not found: {resource_type}")]
    NotFound { resource_type: String },

    #[error("Resource conflict: {message}")]
    Conflict { message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimit { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// A genuine defect. The only variant that reaches error reporting.
    #[error("Internal server error: {source}")]
    Internal { source: UnhandledError },
}

impl ApiError {
    /// Create a validation error with field-specific errors
    pub fn validation_with_fields(
        message: impl Into<String>,
        field_errors: HashMap<String, Vec<String>>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Create a simple validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an authorization (403) error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Create an internal error from any error value
    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            source: UnhandledError::new(error),
        }
    }

    /// Create an internal error from a plain message
    pub fn internal_message(message: impl Into<String>) -> Self {
        Self::internal(anyhow::anyhow!(message.into()))
    }

    /// Whether this error is a deliberate rejection rather than a defect
    pub fn is_expected(&self) -> bool {
        !matches!(self, ApiError::Internal { .. })
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => codes::expected::VALIDATION,
            ApiError::Authentication { .. } => codes::expected::AUTHENTICATION,
            ApiError::Authorization { .. } => codes::expected::AUTHORIZATION,
            ApiError::NotFound { .. } => codes::expected::NOT_FOUND,
            ApiError::Conflict { .. } => codes::expected::CONFLICT,
            ApiError::RateLimit { .. } => codes::expected::RATE_LIMIT,
            ApiError::BadRequest { .. } => codes::expected::BAD_REQUEST,
            ApiError::UnprocessableEntity { .. } => codes::expected::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable { .. } => codes::expected::SERVICE_UNAVAILABLE,
            ApiError::Internal { source } => source.error_type(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();
        let error_type = self.error_type();

        let field_errors = match &self {
            ApiError::Validation { field_errors, .. } => field_errors.clone(),
            _ => None,
        };

        // Don't expose internal details to clients
        let message = match &self {
            ApiError::Internal { .. } => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        let body = ApiErrorResponse {
            error_id: error_id.clone(),
            error_type: error_type.to_string(),
            message: message.clone(),
            field_errors,
            timestamp: chrono::Utc::now(),
        };

        let mut response = (status_code, Json(body)).into_response();

        match self {
            ApiError::Internal { source } => {
                error!(
                    error_id = %error_id,
                    error_type = %error_type,
                    status_code = %status_code.as_u16(),
                    error = %source,
                    "API error occurred"
                );
                response.extensions_mut().insert(source);
            }
            _ => {
                warn!(
                    error_id = %error_id,
                    error_type = %error_type,
                    status_code = %status_code.as_u16(),
                    "Request rejected"
                );
                response.extensions_mut().insert(ExpectedFailure {
                    status: status_code,
                    error_type,
                    message,
                });
            }
        }

        response
    }
}

/// Convert anyhow errors to API errors
impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::internal(error)
    }
}

/// Convert serde JSON errors to API errors
impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::BadRequest {
            message: format!("Invalid JSON: {error}"),
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
