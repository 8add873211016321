//! DSN parsing
//!
//! `{scheme}://{public_key}[:{secret_key}]@{host}[:{port}]/{path}/{project_id}`

use reqwest::Url;
use std::fmt;
use std::str::FromStr;

use crate::error::{ReporterError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    scheme: String,
    public_key: String,
    secret_key: Option<String>,
    host: String,
    port: Option<u16>,
    path: String,
    project_id: String,
}

impl Dsn {
    /// # Errors
    ///
    /// Returns [`ReporterError::InvalidDsn`] when the value is not an
    /// http(s) URL carrying a public key and a project id.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| ReporterError::InvalidDsn(format!("{raw}: {e}")))?;

        let scheme = url.scheme().to_string();
        if scheme != "http" && scheme != "https" {
            return Err(ReporterError::InvalidDsn(format!(
                "unsupported scheme '{scheme}'"
            )));
        }

        let public_key = url.username().to_string();
        if public_key.is_empty() {
            return Err(ReporterError::InvalidDsn("missing public key".to_string()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ReporterError::InvalidDsn("missing host".to_string()))?
            .to_string();

        let trimmed = url.path().trim_end_matches('/');
        let (path, project_id) = trimmed.rsplit_once('/').unwrap_or(("", trimmed));
        if project_id.is_empty() {
            return Err(ReporterError::InvalidDsn("missing project id".to_string()));
        }

        Ok(Self {
            scheme,
            public_key,
            secret_key: url.password().map(ToString::to_string),
            host,
            port: url.port(),
            path: path.to_string(),
            project_id: project_id.to_string(),
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref()
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn origin(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// URL events are posted to
    pub fn store_url(&self) -> String {
        format!("{}{}/api/{}/store/", self.origin(), self.path, self.project_id)
    }

    /// Value of the `X-Sentry-Auth` header
    pub fn auth_header(&self, client_name: &str, timestamp: i64) -> String {
        let mut header = format!(
            "Sentry sentry_version=7, sentry_client={client_name}, sentry_timestamp={timestamp}, sentry_key={}",
            self.public_key
        );
        if let Some(secret) = &self.secret_key {
            header.push_str(", sentry_secret=");
            header.push_str(secret);
        }
        header
    }
}

impl FromStr for Dsn {
    type Err = ReporterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Dsn {
    // Never prints the secret key
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}@", self.scheme, self.public_key)?;
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port)?,
            None => write!(f, "{}", self.host)?,
        }
        write!(f, "{}/{}", self.path, self.project_id)
    }
}
