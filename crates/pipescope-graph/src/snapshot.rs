//! Pipeline snapshot parsing
//!
//! A snapshot is the full node/edge set delivered by the metadata provider
//! in a single fetch. It is immutable once a view has been built from it.

use crate::function::classify_columns;
use pipescope_core::{Edge, Node, SnapshotConfig};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

/// Nodes and edges of one pipeline, as fetched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    /// Tables and views, in provider order
    #[serde(default)]
    pub nodes: Vec<Node>,

    /// Structural and cross-reference edges, in provider order
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl PipelineSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Load snapshot from file
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SnapshotError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_json(&contents)
    }

    /// Parse snapshot from JSON string
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json)
            .map_err(|e| SnapshotError::ParseError(e.to_string()))
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a node by id
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Resolve a node from its id or its unique short name
    pub fn resolve_node(&self, name_or_id: &str) -> Result<&Node, SnapshotError> {
        if let Some(node) = self.get_node(name_or_id) {
            return Ok(node);
        }

        let matches: Vec<&Node> = self.nodes.iter().filter(|n| n.name == name_or_id).collect();
        match matches.as_slice() {
            [node] => Ok(node),
            [] => Err(SnapshotError::NodeNotFound(name_or_id.to_string())),
            _ => Err(SnapshotError::AmbiguousName(
                name_or_id.to_string(),
                matches.iter().map(|n| n.id.clone()).collect(),
            )),
        }
    }

    /// Add a structural edge `base -> view` for every view whose base is a
    /// known node and that has no incoming structural edge yet.
    ///
    /// Returns the number of edges added.
    pub fn derive_base_edges(&mut self) -> usize {
        let known: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let targeted: HashSet<&str> = self
            .edges
            .iter()
            .filter(|e| e.is_structural())
            .map(|e| e.target.as_str())
            .collect();

        let derived: Vec<Edge> = self
            .nodes
            .iter()
            .filter(|n| n.is_view && !targeted.contains(n.id.as_str()))
            .filter_map(|n| {
                let base = n.base.as_deref()?;
                if base == n.id || !known.contains(base) {
                    return None;
                }
                Some(Edge::structural(base, n.id.clone()))
            })
            .collect();

        let added = derived.len();
        if added > 0 {
            tracing::debug!(added, "derived structural edges from view bases");
        }
        self.edges.extend(derived);
        added
    }

    /// Fill in missing function kinds/names on computed columns
    ///
    /// Returns the number of columns changed.
    pub fn classify_functions(&mut self) -> usize {
        self.nodes
            .iter_mut()
            .map(|node| classify_columns(&mut node.columns))
            .sum()
    }

    /// Apply ingestion options before the snapshot is handed to a view
    pub fn prepare(&mut self, config: &SnapshotConfig) {
        if config.derive_base_edges {
            self.derive_base_edges();
        }
        let classified = self.classify_functions();
        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            classified,
            "prepared snapshot"
        );
    }

    /// Hex SHA-256 of the canonical JSON serialization
    ///
    /// Two snapshots with the same fingerprint produce the same layout.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        // Serializing plain structs and vectors cannot fail
        if let Ok(bytes) = serde_json::to_vec(self) {
            hasher.update(&bytes);
        }
        hex::encode(hasher.finalize())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Snapshot parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse snapshot JSON: {0}")]
    ParseError(String),

    #[error("Node '{0}' not found in snapshot")]
    NodeNotFound(String),

    #[error("Name '{0}' matches several nodes: {}", .1.join(", "))]
    AmbiguousName(String, Vec<String>),
}
