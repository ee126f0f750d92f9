use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or validating a campaign definition.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// No embedded campaign with this name.
    #[error("campaign not found: {0}")]
    NotFound(String),

    /// The campaign file could not be read.
    #[error("failed to read campaign file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid campaign json: {0}")]
    Json(#[from] serde_json::Error),

    /// The definition parsed but breaks a structural rule.
    #[error("invalid campaign: {0}")]
    Invalid(String),
}
