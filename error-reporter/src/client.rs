//! Reporting client contract
//!
//! The adapter only ever talks to these two traits, so tests and alternative
//! backends plug in through [`ReporterOptions::with_client_factory`](crate::ReporterOptions::with_client_factory).

use error_common::{RequestErrorContext, UnhandledError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;

/// Identifier assigned to a captured event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    // 32 lowercase hex digits, no hyphens
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Result of reporting an uncaught panic through the global hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Whether the event was handed to the transport
    pub sent: bool,
    pub event_id: Option<EventId>,
    pub message: String,
}

/// Completion callback invoked after the global hook reported a panic
pub type PatchCallback = Box<dyn Fn(PatchOutcome) + Send + Sync>;

/// An error-reporting backend
pub trait ReportingClient: Send + Sync {
    /// Capture an unhandled request error together with its request context
    ///
    /// # Errors
    ///
    /// Returns an error when the event could not be handed to the transport.
    fn capture_error(
        &self,
        error: &UnhandledError,
        context: &RequestErrorContext,
    ) -> Result<EventId>;

    /// Install process-wide error capture. Clients without such a facility
    /// keep the default, which does nothing.
    fn patch_global(&self, on_complete: PatchCallback) {
        let _ = on_complete;
        tracing::debug!("Reporting client does not support global patching");
    }
}

/// Constructs a [`ReportingClient`] from an endpoint identifier
pub trait ClientFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the DSN cannot be used by this backend.
    fn create(&self, dsn: &str) -> Result<Arc<dyn ReportingClient>>;
}

impl<F> ClientFactory for F
where
    F: Fn(&str) -> Result<Arc<dyn ReportingClient>> + Send + Sync,
{
    fn create(&self, dsn: &str) -> Result<Arc<dyn ReportingClient>> {
        self(dsn)
    }
}
