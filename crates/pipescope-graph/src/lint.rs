//! Snapshot lint
//!
//! Malformed snapshots are never rejected: layout and highlighting handle
//! them defensively. This pass reports what is wrong so the provider side
//! can be fixed.

use crate::adjacency::Adjacency;
use crate::snapshot::PipelineSnapshot;
use pipescope_core::{Diagnostic, DiagnosticCode, LintConfig, LintReport, Severity};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Runs every snapshot check
pub struct SnapshotLinter;

impl SnapshotLinter {
    /// Lint a snapshot and collect the diagnostics into a report
    pub fn report(snapshot: &PipelineSnapshot, config: &LintConfig) -> LintReport {
        LintReport::from_diagnostics(Self::lint(snapshot, config))
            .with_counts(snapshot.nodes.len(), snapshot.edges.len())
            .with_fingerprint(snapshot.fingerprint())
    }

    /// Run all checks, in a stable order
    pub fn lint(snapshot: &PipelineSnapshot, config: &LintConfig) -> Vec<Diagnostic> {
        let adjacency = Adjacency::build(&snapshot.nodes, &snapshot.edges);
        let mut diagnostics = Vec::new();

        diagnostics.extend(Self::check_duplicate_nodes(snapshot));
        diagnostics.extend(Self::check_edges(snapshot));
        diagnostics.extend(Self::check_multiple_parents(&adjacency));
        diagnostics.extend(Self::check_base_edges(snapshot, &adjacency));
        diagnostics.extend(Self::check_cycles(snapshot, &adjacency));
        diagnostics.extend(Self::check_aggregates(snapshot));

        for diag in &mut diagnostics {
            diag.severity = config.get_severity(diag.code, diag.severity);
        }

        if diagnostics.iter().any(|d| d.code == DiagnosticCode::MultipleStructuralParents) {
            tracing::warn!("snapshot violates the forest invariant; first structural parent wins");
        }

        diagnostics
    }

    fn check_duplicate_nodes(snapshot: &PipelineSnapshot) -> Vec<Diagnostic> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut reported: HashSet<&str> = HashSet::new();
        let mut diagnostics = Vec::new();

        for node in &snapshot.nodes {
            if !seen.insert(node.id.as_str()) && reported.insert(node.id.as_str()) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DuplicateNodeId,
                        Severity::Error,
                        format!("Node id '{}' appears more than once", node.id),
                    )
                    .with_node(node.id.clone()),
                );
            }
        }

        diagnostics
    }

    fn check_edges(snapshot: &PipelineSnapshot) -> Vec<Diagnostic> {
        let known: HashSet<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut seen = HashSet::new();
        let mut diagnostics = Vec::new();

        for edge in &snapshot.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !known.contains(endpoint.as_str()) {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::DanglingEdgeEndpoint,
                            Severity::Warn,
                            format!(
                                "Edge {} -> {} references unknown node '{}'",
                                edge.source, edge.target, endpoint
                            ),
                        )
                        .with_node(endpoint.clone()),
                    );
                }
            }

            if edge.source == edge.target {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::SelfReferencingEdge,
                        Severity::Warn,
                        format!("Edge connects '{}' to itself", edge.source),
                    )
                    .with_node(edge.source.clone()),
                );
            }

            if !seen.insert((&edge.source, &edge.target, edge.kind)) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DuplicateEdge,
                        Severity::Info,
                        format!("Duplicate edge {} -> {}", edge.source, edge.target),
                    )
                    .with_node(edge.target.clone())
                    .with_related(vec![edge.source.clone()]),
                );
            }
        }

        diagnostics
    }

    fn check_multiple_parents(adjacency: &Adjacency) -> Vec<Diagnostic> {
        adjacency
            .multi_parent_nodes()
            .into_iter()
            .map(|(child, parents)| {
                // Duplicate edges from one parent are reported separately
                let distinct: BTreeSet<&String> = parents.iter().collect();
                (child, parents, distinct.len())
            })
            .filter(|(_, _, distinct)| *distinct > 1)
            .map(|(child, parents, distinct)| {
                Diagnostic::new(
                    DiagnosticCode::MultipleStructuralParents,
                    Severity::Warn,
                    format!(
                        "Node '{}' has {} structural parents; it is laid out under '{}'",
                        child, distinct, parents[0]
                    ),
                )
                .with_node(child.clone())
                .with_related(parents.to_vec())
            })
            .collect()
    }

    fn check_base_edges(snapshot: &PipelineSnapshot, adjacency: &Adjacency) -> Vec<Diagnostic> {
        snapshot
            .nodes
            .iter()
            .filter_map(|node| {
                let base = node.base.as_ref()?;
                let parents = adjacency.parents(&node.id);
                if parents.is_empty() || parents.contains(base) {
                    return None;
                }

                Some(
                    Diagnostic::new(
                        DiagnosticCode::BaseEdgeMismatch,
                        Severity::Warn,
                        format!(
                            "View '{}' declares base '{}' but its structural parent is '{}'",
                            node.id, base, parents[0]
                        ),
                    )
                    .with_node(node.id.clone())
                    .with_related(vec![base.clone()]),
                )
            })
            .collect()
    }

    /// Kahn's algorithm over structural edges; whatever cannot be ordered
    /// sits on or below a cycle.
    fn check_cycles(snapshot: &PipelineSnapshot, adjacency: &Adjacency) -> Vec<Diagnostic> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();

        for node in &snapshot.nodes {
            in_degree.entry(node.id.as_str()).or_insert(0);
        }
        let ids: Vec<&str> = in_degree.keys().copied().collect();
        for id in ids {
            for child in adjacency.children(id) {
                if let Some(degree) = in_degree.get_mut(child.as_str()) {
                    *degree += 1;
                }
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut ordered = 0;
        let mut expanded: HashSet<&str> = HashSet::new();

        while let Some(id) = queue.pop_front() {
            if !expanded.insert(id) {
                continue;
            }
            ordered += 1;

            for child in adjacency.children(id) {
                if let Some(degree) = in_degree.get_mut(child.as_str()) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(child.as_str());
                    }
                }
            }
        }

        if ordered == in_degree.len() {
            return Vec::new();
        }

        let stuck: Vec<String> = in_degree
            .iter()
            .filter(|(id, _)| !expanded.contains(*id))
            .map(|(id, _)| id.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        vec![Diagnostic::new(
            DiagnosticCode::StructuralCycle,
            Severity::Error,
            format!(
                "Structural edges form a cycle; {} nodes cannot be placed in the forest",
                stuck.len()
            ),
        )
        .with_related(stuck)]
    }

    fn check_aggregates(snapshot: &PipelineSnapshot) -> Vec<Diagnostic> {
        snapshot
            .nodes
            .iter()
            .filter(|node| !node.columns.is_empty())
            .filter_map(|node| {
                let errors = node.column_error_total();
                let computed = node.column_computed_count();
                if node.total_errors == errors && node.computed_count == computed {
                    return None;
                }

                Some(
                    Diagnostic::new(
                        DiagnosticCode::AggregateMismatch,
                        Severity::Info,
                        format!(
                            "Node '{}' reports {} errors / {} computed columns, columns give {} / {}",
                            node.id, node.total_errors, node.computed_count, errors, computed
                        ),
                    )
                    .with_node(node.id.clone()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipescope_core::{Column, Edge, Node};
    use pretty_assertions::assert_eq;

    fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn clean_forest_has_no_diagnostics() {
        let snapshot = PipelineSnapshot::new(
            vec![
                Node::table("t", "t"),
                Node::view("v", "v", "t"),
                Node::table("other", "other"),
            ],
            vec![Edge::structural("t", "v"), Edge::cross_reference("other", "v")],
        );

        assert!(SnapshotLinter::lint(&snapshot, &LintConfig::default()).is_empty());
    }

    #[test]
    fn reports_multiple_parents_and_base_mismatch() {
        let snapshot = PipelineSnapshot::new(
            vec![Node::table("a", "a"), Node::table("b", "b"), Node::view("v", "v", "b")],
            vec![Edge::structural("a", "v"), Edge::structural("b", "v")],
        );

        let diagnostics = SnapshotLinter::lint(&snapshot, &LintConfig::default());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::MultipleStructuralParents]);
        assert_eq!(diagnostics[0].related, vec!["a".to_string(), "b".to_string()]);
        assert!(diagnostics[0].message.contains("laid out under 'a'"));

        let mismatch = PipelineSnapshot::new(
            vec![Node::table("a", "a"), Node::table("b", "b"), Node::view("v", "v", "b")],
            vec![Edge::structural("a", "v")],
        );
        let diagnostics = SnapshotLinter::lint(&mismatch, &LintConfig::default());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::BaseEdgeMismatch]);
    }

    #[test]
    fn reports_edge_hygiene() {
        let snapshot = PipelineSnapshot::new(
            vec![Node::table("a", "a"), Node::table("b", "b")],
            vec![
                Edge::cross_reference("a", "ghost"),
                Edge::cross_reference("a", "a"),
                Edge::cross_reference("a", "b"),
                Edge::cross_reference("a", "b"),
            ],
        );

        let diagnostics = SnapshotLinter::lint(&snapshot, &LintConfig::default());
        assert_eq!(
            codes(&diagnostics),
            vec![
                DiagnosticCode::DanglingEdgeEndpoint,
                DiagnosticCode::SelfReferencingEdge,
                DiagnosticCode::DuplicateEdge,
            ]
        );
    }

    #[test]
    fn duplicate_structural_edge_is_not_a_second_parent() {
        let snapshot = PipelineSnapshot::new(
            vec![Node::table("a", "a"), Node::view("v", "v", "a")],
            vec![Edge::structural("a", "v"), Edge::structural("a", "v")],
        );

        let diagnostics = SnapshotLinter::lint(&snapshot, &LintConfig::default());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::DuplicateEdge]);
    }

    #[test]
    fn reports_duplicate_node_ids_once() {
        let snapshot = PipelineSnapshot::new(
            vec![Node::table("a", "a"), Node::table("a", "a"), Node::table("a", "a")],
            vec![],
        );

        let diagnostics = SnapshotLinter::lint(&snapshot, &LintConfig::default());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::DuplicateNodeId]);
    }

    #[test]
    fn reports_structural_cycle() {
        let snapshot = PipelineSnapshot::new(
            vec![Node::table("root", "root"), Node::table("x", "x"), Node::table("y", "y"), Node::table("z", "z")],
            vec![
                Edge::structural("root", "z"),
                Edge::structural("x", "y"),
                Edge::structural("y", "x"),
            ],
        );

        let diagnostics = SnapshotLinter::lint(&snapshot, &LintConfig::default());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::StructuralCycle]);
        assert_eq!(diagnostics[0].related, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn reports_aggregate_mismatch() {
        let mut node = Node::table("t", "t").with_columns(vec![
            Column::new("a", "Int"),
            Column::computed("b", "Int", "a + 1").with_errors(4),
        ]);
        node.total_errors = 1;

        let snapshot = PipelineSnapshot::new(vec![node], vec![]);
        let diagnostics = SnapshotLinter::lint(&snapshot, &LintConfig::default());
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::AggregateMismatch]);
    }

    #[test]
    fn severity_overrides_apply() {
        let snapshot = PipelineSnapshot::new(
            vec![Node::table("a", "a")],
            vec![Edge::cross_reference("a", "a")],
        );
        let mut config = LintConfig::default();
        config.set_override(DiagnosticCode::SelfReferencingEdge, Severity::Error);

        let report = SnapshotLinter::report(&snapshot, &config);
        assert!(report.has_errors());
        assert_eq!(report.summary.nodes_checked, 1);
        assert_eq!(report.summary.edges_checked, 1);
        assert!(report.fingerprint.is_some());
    }
}
