//! Selection state machine and highlight derivation
//!
//! A view holds at most one selected node. Clicks move the state between
//! `Idle` and `Selected`; the highlight partition is then recomputed from
//! the state and the prebuilt adjacency. Nothing here touches layout.

use pipescope_core::{Edge, Node, NodeId};
use pipescope_graph::Adjacency;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current selection of a view
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "node", rename_all = "snake_case")]
pub enum SelectionState {
    #[default]
    Idle,
    Selected(NodeId),
}

impl SelectionState {
    /// Toggle: clicking the selected node deselects it, any other node selects it
    pub fn on_node_click(&mut self, id: &str) {
        let next = match self {
            Self::Selected(current) if current == id => Self::Idle,
            _ => Self::Selected(id.to_string()),
        };

        tracing::info!(from = ?self, to = ?next, "selection changed");
        *self = next;
    }

    /// Click on the empty canvas
    pub fn on_pane_click(&mut self) {
        if !self.is_idle() {
            tracing::info!(from = ?self, "selection cleared");
        }
        *self = Self::Idle;
    }

    pub fn selected(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Selected(id) => Some(id.as_str()),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Visual intent of one node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIntent {
    pub is_highlighted: bool,
    pub is_dimmed: bool,
}

impl NodeIntent {
    pub const NEUTRAL: NodeIntent = NodeIntent {
        is_highlighted: false,
        is_dimmed: false,
    };

    fn from_membership(connected: bool) -> Self {
        Self {
            is_highlighted: connected,
            is_dimmed: !connected,
        }
    }
}

/// Highlight partition for one selection state
///
/// `nodes` and `edges` are aligned index-for-index with the slices passed
/// to [`derive_highlight`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight {
    /// Node selected when this highlight was derived
    pub selected: Option<NodeId>,

    pub nodes: Vec<NodeIntent>,

    /// Whether each edge is emphasized
    pub edges: Vec<bool>,
}

impl Highlight {
    /// A selection is active
    pub fn is_active(&self) -> bool {
        self.selected.is_some()
    }

    /// Ids of highlighted nodes, in node order
    pub fn highlighted_ids<'n>(&self, nodes: &'n [Node]) -> Vec<&'n str> {
        nodes
            .iter()
            .zip(&self.nodes)
            .filter(|(_, intent)| intent.is_highlighted)
            .map(|(node, _)| node.id.as_str())
            .collect()
    }

    /// Ids of dimmed nodes, in node order
    pub fn dimmed_ids<'n>(&self, nodes: &'n [Node]) -> Vec<&'n str> {
        nodes
            .iter()
            .zip(&self.nodes)
            .filter(|(_, intent)| intent.is_dimmed)
            .map(|(node, _)| node.id.as_str())
            .collect()
    }

    pub fn emphasized_count(&self) -> usize {
        self.edges.iter().filter(|e| **e).count()
    }
}

/// Derive node and edge intents from a selection state
pub fn derive_highlight(
    state: &SelectionState,
    adjacency: &Adjacency,
    nodes: &[Node],
    edges: &[Edge],
) -> Highlight {
    let Some(selected) = state.selected() else {
        return Highlight {
            selected: None,
            nodes: vec![NodeIntent::NEUTRAL; nodes.len()],
            edges: vec![false; edges.len()],
        };
    };

    let connected: HashSet<NodeId> = adjacency.connected(selected);

    let node_intents = nodes
        .iter()
        .map(|node| NodeIntent::from_membership(connected.contains(&node.id)))
        .collect();

    let edge_emphasis: Vec<bool> = edges.iter().map(|edge| edge.touches(selected)).collect();

    tracing::debug!(
        selected,
        connected = connected.len(),
        emphasized = edge_emphasis.iter().filter(|e| **e).count(),
        "derived highlight"
    );

    Highlight {
        selected: Some(selected.to_string()),
        nodes: node_intents,
        edges: edge_emphasis,
    }
}
