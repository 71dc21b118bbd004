//! Detail panel assembly for a selected node

use pipescope_core::{Column, Index, Node, NodeId, VersionEntry};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// A computed column and its position in the node's pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStep {
    /// 1-based step number (declaration order)
    pub step: usize,

    #[serde(flatten)]
    pub column: Column,
}

/// Column-derived totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailAggregate {
    /// Sum of error counts over computed columns
    pub total_errors: u64,

    pub computed_count: usize,

    /// Columns that accept inserted values
    pub insertable_count: usize,
}

/// Display-ready summary of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailView {
    pub id: NodeId,
    pub name: String,
    pub is_view: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterator_type: Option<String>,

    pub row_count: u64,
    pub version: u64,

    /// Non-computed columns
    pub base: Vec<Column>,

    /// Computed columns in inferred execution order
    pub computed: Vec<PipelineStep>,

    pub aggregate: DetailAggregate,

    /// Node this view is derived from
    pub lineage: Option<NodeId>,

    pub indices: Vec<Index>,

    /// Version history, newest first
    pub versions_descending: Vec<VersionEntry>,
}

impl DetailView {
    /// Base columns inherited from an ancestor table
    pub fn inherited_columns(&self) -> impl Iterator<Item = &Column> {
        self.base.iter().filter(|c| c.is_inherited())
    }

    /// Computed steps with at least one error
    pub fn failing_steps(&self) -> impl Iterator<Item = &PipelineStep> {
        self.computed.iter().filter(|s| s.column.error_count > 0)
    }
}

/// Build the detail view of a node
pub fn assemble_detail(node: &Node) -> DetailView {
    let (computed, base): (Vec<&Column>, Vec<&Column>) =
        node.columns.iter().partition(|c| c.is_computed);

    let computed: Vec<PipelineStep> = computed
        .into_iter()
        .enumerate()
        .map(|(index, column)| PipelineStep {
            step: index + 1,
            column: column.clone(),
        })
        .collect();

    let aggregate = DetailAggregate {
        total_errors: computed
            .iter()
            .map(|s| s.column.error_count)
            .fold(0u64, u64::saturating_add),
        computed_count: computed.len(),
        insertable_count: base.len(),
    };

    let mut versions_descending = node.versions.clone();
    versions_descending.sort_by_key(|v| Reverse(v.version));

    DetailView {
        id: node.id.clone(),
        name: node.name.clone(),
        is_view: node.is_view,
        iterator_type: node.iterator_type.clone(),
        row_count: node.row_count,
        version: node.version,
        base: base.into_iter().cloned().collect(),
        computed,
        aggregate,
        lineage: node.base.clone(),
        indices: node.indices.clone(),
        versions_descending,
    }
}
