//! Metadata provider trait for fetching pipeline snapshots

use pipescope_graph::{PipelineSnapshot, SnapshotError};

/// Errors that can occur when fetching a snapshot
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<SnapshotError> for FetchError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::IoError(path, msg) => Self::IoError(format!("{}: {}", path, msg)),
            SnapshotError::ParseError(msg) => Self::InvalidResponse(msg),
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}

/// Source of pipeline metadata
///
/// A view performs exactly one fetch per load. Retrying is left to the caller.
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Provider name (e.g., "JsonFile", "Mock")
    fn name(&self) -> &'static str;

    /// Fetch the complete node/edge snapshot
    async fn fetch_snapshot(&self) -> Result<PipelineSnapshot, FetchError>;
}
