//! Adjacency views over a pipeline snapshot
//!
//! Two views are precomputed once from the edge list:
//! - a structural parent -> children map (the forest driving layout)
//! - an undirected all-neighbors map (used for highlighting only)

use pipescope_core::{Edge, Node, NodeId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Adjacency maps built from a node/edge list
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    /// Structural edges: parent -> children, in edge order
    children_by_parent: HashMap<NodeId, Vec<NodeId>>,

    /// Structural edges reversed: child -> parents, in edge order
    parents_by_child: HashMap<NodeId, Vec<NodeId>>,

    /// Every edge, both directions
    all_neighbors: HashMap<NodeId, HashSet<NodeId>>,
}

impl Adjacency {
    /// Build both adjacency views
    ///
    /// Duplicate and self-referencing edges are tolerated: duplicates add
    /// nothing to the neighbor sets.
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut children_by_parent: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut parents_by_child: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut all_neighbors: HashMap<NodeId, HashSet<NodeId>> = HashMap::new();

        for edge in edges {
            if edge.is_structural() {
                children_by_parent
                    .entry(edge.source.clone())
                    .or_default()
                    .push(edge.target.clone());

                parents_by_child
                    .entry(edge.target.clone())
                    .or_default()
                    .push(edge.source.clone());
            }

            all_neighbors
                .entry(edge.source.clone())
                .or_default()
                .insert(edge.target.clone());
            all_neighbors
                .entry(edge.target.clone())
                .or_default()
                .insert(edge.source.clone());
        }

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            parents = children_by_parent.len(),
            "built adjacency"
        );

        Self {
            children_by_parent,
            parents_by_child,
            all_neighbors,
        }
    }

    /// Structural children of a node, in edge order
    pub fn children(&self, node_id: &str) -> &[NodeId] {
        self.children_by_parent
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Structural parents of a node (more than one only in malformed input)
    pub fn parents(&self, node_id: &str) -> &[NodeId] {
        self.parents_by_child
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the node is the target of some structural edge
    pub fn has_structural_parent(&self, node_id: &str) -> bool {
        self.parents_by_child.contains_key(node_id)
    }

    /// Whether the node is the source of some structural edge
    pub fn has_structural_children(&self, node_id: &str) -> bool {
        self.children_by_parent.contains_key(node_id)
    }

    /// Nodes connected to this one by any edge, in either direction
    pub fn neighbors(&self, node_id: &str) -> Option<&HashSet<NodeId>> {
        self.all_neighbors.get(node_id)
    }

    /// The node itself plus all of its neighbors
    pub fn connected(&self, node_id: &str) -> HashSet<NodeId> {
        let mut connected: HashSet<NodeId> = self
            .neighbors(node_id)
            .cloned()
            .unwrap_or_default();
        connected.insert(node_id.to_string());
        connected
    }

    /// Nodes that are the target of at least one structural edge
    pub fn structural_targets(&self) -> impl Iterator<Item = &NodeId> {
        self.parents_by_child.keys()
    }

    /// Nodes with more than one structural parent, sorted by id
    pub fn multi_parent_nodes(&self) -> Vec<(&NodeId, &[NodeId])> {
        let mut result: Vec<(&NodeId, &[NodeId])> = self
            .parents_by_child
            .iter()
            .filter(|(_, parents)| parents.len() > 1)
            .map(|(child, parents)| (child, parents.as_slice()))
            .collect();
        result.sort_by(|a, b| a.0.cmp(b.0));
        result
    }

    /// Structural descendants (BFS order), each visited once
    pub fn descendants(&self, node_id: &str) -> Vec<NodeId> {
        self.walk(node_id, |id| self.children(id))
    }

    /// Structural ancestors, nearest first, each visited once
    pub fn ancestors(&self, node_id: &str) -> Vec<NodeId> {
        self.walk(node_id, |id| self.parents(id))
    }

    /// Check if `target` is reachable from `source` over structural edges
    pub fn has_path(&self, source: &str, target: &str) -> bool {
        self.descendants(source).iter().any(|id| id == target)
    }

    fn walk<'a, F>(&'a self, start: &str, next: F) -> Vec<NodeId>
    where
        F: Fn(&str) -> &'a [NodeId],
    {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&NodeId> = next(start).iter().collect();
        let mut result = Vec::new();

        visited.insert(start);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.as_str()) {
                continue;
            }

            result.push(current.clone());

            for follower in next(current.as_str()) {
                if !visited.contains(follower.as_str()) {
                    queue.push_back(follower);
                }
            }
        }

        result
    }
}
