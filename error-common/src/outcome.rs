//! Request outcome classification
//!
//! Handlers signal how a request ended by attaching a marker to the response
//! extensions ([`ApiError`](crate::ApiError) does this in `into_response`).
//! [`RequestOutcome::from_response`] reads the marker back after the handler
//! ran, so post-processing hooks never have to guess from the status code.

use axum::http::{Response, StatusCode};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::codes;

/// A genuine defect raised while handling a request.
///
/// Cheap to clone so it can sit in response extensions and be handed to a
/// reporting client after the response is built.
#[derive(Clone)]
pub struct UnhandledError {
    inner: Arc<anyhow::Error>,
}

impl UnhandledError {
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: Arc::new(error.into()),
        }
    }

    /// The underlying error, forwarded verbatim to reporting
    pub fn error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &**self.inner
    }

    /// The error followed by its chain of sources, outermost first
    pub fn chain(&self) -> anyhow::Chain<'_> {
        self.inner.chain()
    }

    /// Whether this error came from a panicking handler
    pub fn is_panic(&self) -> bool {
        self.inner.downcast_ref::<PanicError>().is_some()
    }

    pub fn error_type(&self) -> &'static str {
        if self.is_panic() {
            codes::unhandled::PANIC
        } else {
            codes::unhandled::INTERNAL
        }
    }
}

impl fmt::Display for UnhandledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl fmt::Debug for UnhandledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl std::error::Error for UnhandledError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Details of a deliberate client-facing rejection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedFailure {
    pub status: StatusCode,
    pub error_type: &'static str,
    pub message: String,
}

/// How a request ended, as seen by post-processing hooks
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    /// No error was raised; carries the final status
    Ok(StatusCode),
    /// A handled rejection (validation, authorization, ...)
    ExpectedFailure(ExpectedFailure),
    /// A defect that should be reported
    UnhandledError(UnhandledError),
}

impl RequestOutcome {
    pub fn from_response<B>(response: &Response<B>) -> Self {
        if let Some(error) = response.extensions().get::<UnhandledError>() {
            return RequestOutcome::UnhandledError(error.clone());
        }
        if let Some(failure) = response.extensions().get::<ExpectedFailure>() {
            return RequestOutcome::ExpectedFailure(failure.clone());
        }
        RequestOutcome::Ok(response.status())
    }

    pub fn is_reportable(&self) -> bool {
        matches!(self, RequestOutcome::UnhandledError(_))
    }
}

/// A handler panic converted into an error value
#[derive(Error, Debug, Clone)]
#[error("handler panicked: {message}")]
pub struct PanicError {
    pub message: String,
}

impl PanicError {
    /// Build from a payload returned by `catch_unwind`
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}
