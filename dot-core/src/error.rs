//! Error types for dot-core

use crate::spec::SpecError;
use thiserror::Error;

/// Main error type for the dot-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// No model client was supplied to the session
    #[error("No LLM client provided.")]
    MissingClient,

    /// The model client call failed
    #[error("{0}")]
    Llm(String),

    /// The backend answered, but not with a valid dashboard spec
    #[error("Invalid dashboard spec returned by LLM.")]
    InvalidSpecification(#[source] SpecError),
}

impl Error {
    /// Whether the orchestrator may try this failure again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::MissingClient | Error::Config(_))
    }
}

/// Result type alias for dot-core
pub type Result<T> = std::result::Result<T, Error>;
