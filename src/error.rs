use thiserror::Error;

use crate::remote::RemoteError;

#[derive(Debug, Error)]
pub enum ConvoyError {
    /// The job request was rejected before any remote call.
    #[error("invalid job request: {0}")]
    Validation(String),

    /// The carrier answered job creation with `ERROR`.
    #[error("carrier failed to create job: {0}")]
    CreateJob(String),

    #[error("remote service error: {0}")]
    Remote(#[from] RemoteError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
