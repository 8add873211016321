//! Error reporting for axum services
//!
//! Connects the request lifecycle to an external error-reporting service:
//! - On registration, builds a reporting client from the configured DSN
//! - Optionally installs a process-wide panic hook (`patch_global`)
//! - After every request, forwards unhandled errors together with request
//!   metadata; expected rejections ([`error_common::ApiError`] other than
//!   `Internal`) are never reported
//!
//! Without a DSN nothing is constructed and the hook is a pass-through.
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::{routing::get, Router};
//! use error_common::ApiError;
//! use error_reporter::{register, ReporterConfig, ReporterOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReporterConfig::from_env()?;
//!
//!     let app = Router::new().route(
//!         "/",
//!         get(|| async { Err::<(), _>(ApiError::internal_message("database unreachable")) }),
//!     );
//!     let app = register(app, ReporterOptions::new(config));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod dsn;
pub mod error;
pub mod http_client;
pub mod middleware;
pub mod plugin;
mod global;

pub use client::{ClientFactory, EventId, PatchCallback, PatchOutcome, ReportingClient};
pub use config::ReporterConfig;
pub use dsn::Dsn;
pub use error::{ReporterError, Result};
pub use http_client::{ClientSettings, HttpClientFactory, HttpReportingClient};
pub use middleware::report_errors;
pub use plugin::{register, ErrorReporter, ReporterOptions};
