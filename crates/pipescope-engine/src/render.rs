//! Render intents handed to the drawing layer
//!
//! Positions come from one layout pass; highlight flags and edge strokes
//! come from the current selection. Rebuilding these never re-runs layout.

use crate::layout::Position;
use crate::selection::{Highlight, NodeIntent};
use pipescope_core::{Edge, Node, NodeId, ReportVersion, StyleConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Node payload: the node itself plus its highlight flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(flatten)]
    pub node: Node,

    pub is_highlighted: bool,
    pub is_dimmed: bool,
}

/// A node with its layout position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub data: NodeData,
}

/// An edge with its stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedEdge {
    /// Stable id: `{source}->{target}#{index}`
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub emphasized: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    pub stroke_color: String,
    pub stroke_width: f64,
    pub opacity: f64,
}

/// Fill color of a node
pub fn node_color<'s>(node: &Node, style: &'s StyleConfig) -> &'s str {
    match (node.is_view, node.iterator_type.is_some()) {
        (true, true) => style.iterator_view_color.as_str(),
        (true, false) => style.view_color.as_str(),
        (false, _) => style.table_color.as_str(),
    }
}

/// Positioned nodes, one per distinct id, in input order
pub fn positioned_nodes(
    nodes: &[Node],
    positions: &HashMap<NodeId, Position>,
    highlight: &Highlight,
) -> Vec<PositionedNode> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(nodes.len());

    nodes
        .iter()
        .enumerate()
        .filter(|&(_, node)| seen.insert(node.id.as_str()))
        .map(|(index, node)| {
            let position = positions.get(&node.id).copied().unwrap_or_default();
            let intent = highlight.nodes.get(index).copied().unwrap_or(NodeIntent::NEUTRAL);

            PositionedNode {
                id: node.id.clone(),
                x: position.x,
                y: position.y,
                data: NodeData {
                    node: node.clone(),
                    is_highlighted: intent.is_highlighted,
                    is_dimmed: intent.is_dimmed,
                },
            }
        })
        .collect()
}

/// Rendered edges in input order
///
/// Emphasized edges take the color of their source node. While a selection
/// is active every other edge is faded.
pub fn rendered_edges(
    nodes: &[Node],
    edges: &[Edge],
    highlight: &Highlight,
    style: &StyleConfig,
) -> Vec<RenderedEdge> {
    let mut by_id: HashMap<&str, &Node> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        by_id.entry(node.id.as_str()).or_insert(node);
    }

    edges
        .iter()
        .enumerate()
        .map(|(index, edge)| {
            let emphasized = highlight.edges.get(index).copied().unwrap_or(false);

            let (stroke_color, stroke_width, opacity) = if emphasized {
                let color = by_id
                    .get(edge.source.as_str())
                    .map(|source| node_color(source, style))
                    .unwrap_or(style.edge_color.as_str());
                (color, style.emphasized_edge_width, style.emphasized_edge_opacity)
            } else if highlight.is_active() {
                (style.edge_color.as_str(), style.edge_width, style.faded_edge_opacity)
            } else {
                (style.edge_color.as_str(), style.edge_width, style.edge_opacity)
            };

            RenderedEdge {
                id: format!("{}->{}#{}", edge.source, edge.target, index),
                source: edge.source.clone(),
                target: edge.target.clone(),
                emphasized,
                label: edge.label.clone(),
                stroke_color: stroke_color.to_string(),
                stroke_width,
                opacity,
            }
        })
        .collect()
}

/// Everything the drawing layer needs for one frame (render.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderDocument {
    pub version: ReportVersion,

    /// Fingerprint of the rendered snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Selected node, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<NodeId>,

    pub positioned_nodes: Vec<PositionedNode>,
    pub rendered_edges: Vec<RenderedEdge>,
}

impl RenderDocument {
    pub fn new(positioned_nodes: Vec<PositionedNode>, rendered_edges: Vec<RenderedEdge>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            fingerprint: None,
            selected: None,
            positioned_nodes,
            rendered_edges,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn with_selected(mut self, selected: Option<NodeId>) -> Self {
        self.selected = selected;
        self
    }

    /// Look up a positioned node
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.positioned_nodes.iter().find(|n| n.id == id)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save document to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
