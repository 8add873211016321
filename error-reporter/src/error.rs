use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("Invalid DSN: {0}")]
    InvalidDsn(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration source error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("No async runtime available to deliver the event")]
    NoRuntime,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReporterError>;
