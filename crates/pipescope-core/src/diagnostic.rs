//! Snapshot diagnostic codes
//!
//! Diagnostic codes are stable strings. Never rename or remove a code;
//! add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Forest shape
    /// A node is the target of more than one structural edge
    MultipleStructuralParents,

    /// Structural edges form a cycle
    StructuralCycle,

    /// A view's `base` disagrees with its structural parent
    BaseEdgeMismatch,

    // Edge hygiene
    /// An edge references a node id that is not in the snapshot
    DanglingEdgeEndpoint,

    /// An edge connects a node to itself
    SelfReferencingEdge,

    /// The same (source, target, type) edge appears more than once
    DuplicateEdge,

    // Node hygiene
    /// Two nodes share an id
    DuplicateNodeId,

    /// Provider aggregates disagree with the column-derived values
    AggregateMismatch,

    /// General informational message
    Info,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleStructuralParents => "MULTIPLE_STRUCTURAL_PARENTS",
            Self::StructuralCycle => "STRUCTURAL_CYCLE",
            Self::BaseEdgeMismatch => "BASE_EDGE_MISMATCH",
            Self::DanglingEdgeEndpoint => "DANGLING_EDGE_ENDPOINT",
            Self::SelfReferencingEdge => "SELF_REFERENCING_EDGE",
            Self::DuplicateEdge => "DUPLICATE_EDGE",
            Self::DuplicateNodeId => "DUPLICATE_NODE_ID",
            Self::AggregateMismatch => "AGGREGATE_MISMATCH",
            Self::Info => "INFO",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message about a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Node the diagnostic is about, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    /// Other nodes involved (e.g. the competing parents)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            node: None,
            related: Vec::new(),
        }
    }

    /// Attach the node the diagnostic is about
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Attach related nodes
    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related = related;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        assert_eq!(
            DiagnosticCode::MultipleStructuralParents.as_str(),
            "MULTIPLE_STRUCTURAL_PARENTS"
        );
        assert_eq!(DiagnosticCode::DanglingEdgeEndpoint.as_str(), "DANGLING_EDGE_ENDPOINT");
    }

    #[test]
    fn serde_name_matches_as_str() {
        let json = serde_json::to_string(&DiagnosticCode::BaseEdgeMismatch).unwrap();
        assert_eq!(json, format!("\"{}\"", DiagnosticCode::BaseEdgeMismatch.as_str()));
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(
            DiagnosticCode::MultipleStructuralParents,
            Severity::Warn,
            "Node 'v' has 2 structural parents",
        )
        .with_node("v")
        .with_related(vec!["a".to_string(), "b".to_string()]);

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("MULTIPLE_STRUCTURAL_PARENTS"));
        assert!(json.contains("\"warn\""));
        assert!(json.contains("\"related\":[\"a\",\"b\"]"));
    }
}
