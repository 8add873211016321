//! Common error handling utilities for request processing
//!
//! Shared by HTTP handlers and the error reporting adapter. Handlers return
//! [`ApiError`]; its response carries a marker that tells post-processing
//! hooks whether the request failed on purpose or hit a defect.
//!
//! # Error Categories
//!
//! - **Expected failures**: validation, authentication, authorization, not
//!   found, conflict, rate limiting, bad request, service unavailable. These
//!   are answered to the client and never reported.
//! - **Unhandled errors**: [`ApiError::Internal`] and handler panics. These are
//!   forwarded to error reporting together with a [`RequestErrorContext`].
//!
//! # Example
//!
//! ```rust,ignore
//! use error_common::{ApiError, ApiResult};
//!
//! async fn show_chart(id: u64) -> ApiResult<String> {
//!     if id == 0 {
//!         return Err(ApiError::forbidden("chart is restricted"));
//!     }
//!     let chart = load_chart(id).await?; // anyhow errors become ApiError::Internal
//!     Ok(chart)
//! }
//! ```

pub mod types;
pub mod context;
pub mod codes;
pub mod outcome;

pub use types::*;
pub use context::*;
pub use outcome::*;
