use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("no LLM provider key: set DEEPSEEK_API_KEY or OPENROUTER_API_KEY")]
    NoProvider,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("failed to persist manifest at {}: {reason}", .path.display())]
    Persist { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl FleetError {
    /// True for failures that must stop the scheduler: losing the manifest
    /// would re-register the whole fleet on the next start.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FleetError::Persist { .. } | FleetError::NoProvider)
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
