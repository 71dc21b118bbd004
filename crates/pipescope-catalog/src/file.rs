//! Snapshot provider backed by a JSON file on disk

use crate::provider::{FetchError, MetadataProvider};
use pipescope_graph::PipelineSnapshot;
use std::path::{Path, PathBuf};

/// Reads a snapshot JSON file on every fetch
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl MetadataProvider for JsonFileProvider {
    fn name(&self) -> &'static str {
        "JsonFile"
    }

    async fn fetch_snapshot(&self) -> Result<PipelineSnapshot, FetchError> {
        tracing::debug!(path = %self.path.display(), "reading snapshot");

        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound(self.path.display().to_string())
            } else {
                FetchError::IoError(format!("{}: {}", self.path.display(), e))
            }
        })?;

        let snapshot = PipelineSnapshot::from_json(&contents)?;

        tracing::debug!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "read snapshot"
        );

        Ok(snapshot)
    }
}
