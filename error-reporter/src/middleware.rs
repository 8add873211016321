//! Post-processing hook that forwards unhandled request errors

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use error_common::{ApiError, PanicError, RequestErrorContext, RequestOutcome};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

use crate::global;
use crate::plugin::ErrorReporter;

/// Runs once per request. Reports the outcome only when it is an
/// unhandled error; expected failures and successes pass through untouched.
///
/// When reporting is enabled, a panicking handler is turned into an
/// unhandled error, reported, and answered with a 500. The global panic
/// hook skips these panics so each one is reported once.
pub async fn report_errors(
    State(reporter): State<ErrorReporter>,
    request: Request,
    next: Next,
) -> Response {
    if !reporter.is_enabled() {
        return next.run(request).await;
    }

    // Collected up front: the handler consumes the request
    let context = RequestErrorContext::from_request(&request);

    let handled = AssertUnwindSafe(global::request_scope(next.run(request)))
        .catch_unwind()
        .await;
    let response = match handled {
        Ok(response) => response,
        Err(payload) => {
            let panic = PanicError::from_payload(payload.as_ref());
            tracing::error!(
                request_id = %context.id,
                method = %context.method,
                path = %context.path,
                panic = %panic.message,
                "Handler panicked"
            );
            ApiError::internal(panic).into_response()
        }
    };

    match RequestOutcome::from_response(&response) {
        RequestOutcome::UnhandledError(error) => reporter.capture(&error, &context),
        RequestOutcome::ExpectedFailure(failure) => tracing::debug!(
            request_id = %context.id,
            status = %failure.status.as_u16(),
            error_type = failure.error_type,
            "Expected failure not reported"
        ),
        RequestOutcome::Ok(_) => {}
    }

    response
}
