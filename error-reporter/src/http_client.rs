//! Default reporting client
//!
//! Posts one JSON event per captured error to the DSN's store endpoint. Each
//! event is a single detached request on the current tokio runtime: no queue,
//! no retry.

use chrono::{DateTime, Utc};
use error_common::{codes, RequestErrorContext, UnhandledError};
use serde::Serialize;
use std::sync::Arc;

use crate::client::{ClientFactory, EventId, PatchCallback, ReportingClient};
use crate::config::ReporterConfig;
use crate::dsn::Dsn;
use crate::error::{ReporterError, Result};
use crate::global;

const CLIENT_NAME: &str = concat!("error-reporter/", env!("CARGO_PKG_VERSION"));

/// Metadata stamped on every event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSettings {
    pub release: Option<String>,
    pub environment: Option<String>,
    pub server_name: Option<String>,
}

impl From<&ReporterConfig> for ClientSettings {
    fn from(config: &ReporterConfig) -> Self {
        Self {
            release: config.release.clone(),
            environment: config.environment.clone(),
            server_name: config.server_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExceptionValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExceptionList {
    pub values: Vec<ExceptionValue>,
}

/// Event payload accepted by the store endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ReportEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub level: &'static str,
    pub platform: &'static str,
    pub logger: &'static str,
    pub message: String,
    pub exception: ExceptionList,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<RequestErrorContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
}

impl ReportEvent {
    pub fn new(
        event_id: EventId,
        error: &UnhandledError,
        context: Option<&RequestErrorContext>,
        settings: &ClientSettings,
    ) -> Self {
        // Only the outermost error carries the error type
        let mut values: Vec<ExceptionValue> = error
            .chain()
            .enumerate()
            .map(|(depth, cause)| ExceptionValue {
                kind: if depth == 0 {
                    error.error_type()
                } else {
                    codes::unhandled::CAUSE
                }
                .to_string(),
                value: cause.to_string(),
            })
            .collect();
        // Innermost cause first, the way the store API orders exceptions
        values.reverse();

        Self {
            event_id: event_id.to_string(),
            timestamp: Utc::now(),
            level: "error",
            platform: "rust",
            logger: "error-reporter",
            message: error.to_string(),
            exception: ExceptionList { values },
            extra: context.cloned(),
            release: settings.release.clone(),
            environment: settings.environment.clone(),
            server_name: settings.server_name.clone(),
        }
    }
}

#[derive(Clone)]
struct Transport {
    http: reqwest::Client,
    dsn: Dsn,
    settings: ClientSettings,
}

impl Transport {
    fn send(&self, error: &UnhandledError, context: Option<&RequestErrorContext>) -> Result<EventId> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ReporterError::NoRuntime)?;

        let event_id = EventId::new();
        let event = ReportEvent::new(event_id, error, context, &self.settings);
        let body = serde_json::to_vec(&event)?;

        let request = self
            .http
            .post(self.dsn.store_url())
            .header(
                "X-Sentry-Auth",
                self.dsn.auth_header(CLIENT_NAME, Utc::now().timestamp()),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);

        runtime.spawn(async move {
            match request.send().await.and_then(reqwest::Response::error_for_status) {
                Ok(_) => tracing::debug!(event_id = %event_id, "Error event delivered"),
                Err(e) => tracing::warn!(
                    event_id = %event_id,
                    error = %e,
                    "Error event delivery failed"
                ),
            }
        });

        Ok(event_id)
    }
}

/// Reporting client backed by the DSN's HTTP store endpoint
#[derive(Clone)]
pub struct HttpReportingClient {
    transport: Transport,
}

impl HttpReportingClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(dsn: Dsn, settings: ClientSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(CLIENT_NAME)
            .build()?;

        Ok(Self {
            transport: Transport {
                http,
                dsn,
                settings,
            },
        })
    }

    pub fn dsn(&self) -> &Dsn {
        &self.transport.dsn
    }
}

impl ReportingClient for HttpReportingClient {
    fn capture_error(
        &self,
        error: &UnhandledError,
        context: &RequestErrorContext,
    ) -> Result<EventId> {
        self.transport.send(error, Some(context))
    }

    fn patch_global(&self, on_complete: PatchCallback) {
        let transport = self.transport.clone();
        global::install_panic_hook(
            move |panic| transport.send(&UnhandledError::new(panic), None),
            on_complete,
        );
    }
}

/// Builds [`HttpReportingClient`]s; the factory used unless one is injected
#[derive(Debug, Clone, Default)]
pub struct HttpClientFactory {
    settings: ClientSettings,
}

impl HttpClientFactory {
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &ReporterConfig) -> Self {
        Self::new(ClientSettings::from(config))
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self, dsn: &str) -> Result<Arc<dyn ReportingClient>> {
        let dsn = Dsn::parse(dsn)?;
        Ok(Arc::new(HttpReportingClient::new(dsn, self.settings.clone())?))
    }
}
