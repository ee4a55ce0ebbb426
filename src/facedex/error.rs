use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FacedexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Replace rules produced invalid JSON: {0}")]
    Transform(String),

    #[error("No source documents configured")]
    NoSources,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Persistence queue is shutting down")]
    ShuttingDown,
}

impl FacedexError {
    /// Status code the route layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            FacedexError::MalformedRequest(_) => 400,
            FacedexError::ShuttingDown => 503,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, FacedexError>;
