//! Registration of the error reporter on a router

use axum::{middleware::from_fn_with_state, Router};
use error_common::{RequestErrorContext, UnhandledError};
use std::fmt;
use std::sync::Arc;

use crate::client::{ClientFactory, PatchCallback, PatchOutcome, ReportingClient};
use crate::config::ReporterConfig;
use crate::http_client::HttpClientFactory;
use crate::middleware::report_errors;

/// Everything registration needs: configuration plus the client constructor
#[derive(Clone)]
pub struct ReporterOptions {
    pub config: ReporterConfig,
    factory: Arc<dyn ClientFactory>,
}

impl ReporterOptions {
    /// Options using the default HTTP client
    pub fn new(config: ReporterConfig) -> Self {
        let factory = Arc::new(HttpClientFactory::from_config(&config));
        Self { config, factory }
    }

    /// Replace the client constructor
    pub fn with_client_factory(mut self, factory: impl ClientFactory + 'static) -> Self {
        let factory: Arc<dyn ClientFactory> = Arc::new(factory);
        self.factory = factory;
        self
    }
}

impl fmt::Debug for ReporterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterOptions")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A registered error reporter. Shared by every request through the
/// middleware state; the client is never mutated after registration.
#[derive(Clone, Default)]
pub struct ErrorReporter {
    client: Option<Arc<dyn ReportingClient>>,
}

impl ErrorReporter {
    /// Build the reporter from options. Never fails: a missing DSN or a
    /// client that cannot be constructed leaves reporting disabled.
    pub fn register(options: ReporterOptions) -> Self {
        let ReporterOptions { config, factory } = options;

        let Some(dsn) = config.dsn() else {
            if config.patch_global {
                tracing::debug!("No DSN configured; ignoring patch_global");
            }
            tracing::info!("Error reporting disabled: no DSN configured");
            return Self::disabled();
        };

        let client = match factory.create(dsn) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Error reporting disabled: client construction failed");
                return Self::disabled();
            }
        };

        if config.patch_global {
            client.patch_global(panic_reported());
        }

        tracing::info!(patch_global = config.patch_global, "Error reporting enabled");
        Self {
            client: Some(client),
        }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Forward an unhandled error to the client, if one is configured. The
    /// client's result is only logged.
    pub fn capture(&self, error: &UnhandledError, context: &RequestErrorContext) {
        let Some(client) = &self.client else {
            return;
        };

        match client.capture_error(error, context) {
            Ok(event_id) => tracing::info!(
                event_id = %event_id,
                request_id = %context.id,
                method = %context.method,
                path = %context.path,
                "Captured request error"
            ),
            Err(e) => tracing::warn!(
                request_id = %context.id,
                error = %e,
                "Reporting client failed to capture request error"
            ),
        }
    }

    /// Attach the post-processing hook to a router
    ///
    /// Only routes already on `router` are wrapped. Add every route first and
    /// attach last; routes added afterwards are never reported.
    pub fn attach<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(from_fn_with_state(self, report_errors))
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Register the error reporter on `router`. Registration always succeeds.
///
/// Call this after all routes are added: like [`ErrorReporter::attach`], it
/// only wraps the routes `router` already has.
pub fn register<S>(router: Router<S>, options: ReporterOptions) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    ErrorReporter::register(options).attach(router)
}

fn panic_reported() -> PatchCallback {
    Box::new(|outcome: PatchOutcome| match outcome.event_id {
        Some(event_id) if outcome.sent => tracing::error!(
            event_id = %event_id,
            panic = %outcome.message,
            "Uncaught panic reported"
        ),
        _ => tracing::error!(panic = %outcome.message, "Uncaught panic could not be reported"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EventId;
    use crate::error::{ReporterError, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullClient;

    impl ReportingClient for NullClient {
        fn capture_error(&self, _: &UnhandledError, _: &RequestErrorContext) -> Result<EventId> {
            Err(ReporterError::NoRuntime)
        }
    }

    fn counting_factory(calls: Arc<AtomicUsize>) -> impl ClientFactory {
        move |_: &str| -> Result<Arc<dyn ReportingClient>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullClient))
        }
    }

    #[test]
    fn test_blank_dsn_skips_factory() {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = ReporterOptions::new(ReporterConfig::with_dsn("").patch_global(true))
            .with_client_factory(counting_factory(Arc::clone(&calls)));

        assert!(!ErrorReporter::register(options).is_enabled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_factory_called_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = ReporterOptions::new(ReporterConfig::with_dsn("dsn"))
            .with_client_factory(counting_factory(Arc::clone(&calls)));

        assert!(ErrorReporter::register(options).is_enabled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_factory_with_malformed_dsn_stays_disabled() {
        let reporter = ErrorReporter::register(ReporterOptions::new(ReporterConfig::with_dsn("dsn")));
        assert!(!reporter.is_enabled());
    }

    #[test]
    fn test_capture_swallows_client_failure() {
        let reporter = ErrorReporter {
            client: Some(Arc::new(NullClient)),
        };
        let context = RequestErrorContext {
            timestamp: 0,
            id: "req".to_string(),
            method: "get".to_string(),
            path: "/".to_string(),
            query: std::collections::BTreeMap::new(),
            remote_address: None,
            user_agent: None,
        };

        reporter.capture(&UnhandledError::new(anyhow::anyhow!("defect")), &context);
    }
}
