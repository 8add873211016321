//! Reporter configuration
//!
//! Loaded from the environment (`ERROR_REPORTER_*`, with `.env` support) or
//! from a YAML/TOML/JSON file overlaid by the same environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ReporterError, Result};

const ENV_PREFIX: &str = "ERROR_REPORTER";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Endpoint identifier of the reporting service. Reporting is disabled
    /// when absent.
    pub dsn: Option<String>,
    /// Install the process-wide panic hook
    pub patch_global: bool,
    pub release: Option<String>,
    pub environment: Option<String>,
    pub server_name: Option<String>,
}

impl ReporterConfig {
    pub fn with_dsn(dsn: impl Into<String>) -> Self {
        Self {
            dsn: Some(dsn.into()),
            ..Self::default()
        }
    }

    pub fn patch_global(mut self, enabled: bool) -> Self {
        self.patch_global = enabled;
        self
    }

    /// The DSN, treating empty or blank values as absent
    pub fn dsn(&self) -> Option<&str> {
        self.dsn
            .as_deref()
            .map(str::trim)
            .filter(|dsn| !dsn.is_empty())
    }

    /// Load from `ERROR_REPORTER_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ReporterError::Configuration`] when `ERROR_REPORTER_PATCH_GLOBAL`
    /// is set to something other than a boolean.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let var = |name: &str| std::env::var(format!("{ENV_PREFIX}_{name}")).ok();

        let patch_global = match var("PATCH_GLOBAL") {
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                ReporterError::Configuration(format!(
                    "{ENV_PREFIX}_PATCH_GLOBAL must be true or false, got '{raw}'"
                ))
            })?,
            None => false,
        };

        Ok(Self {
            dsn: var("DSN"),
            patch_global,
            release: var("RELEASE"),
            environment: var("ENVIRONMENT"),
            server_name: var("SERVER_NAME"),
        })
    }

    /// Load from a configuration file, overridden by environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ReporterError::Config`] when the file is missing or malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
