//! Hierarchical forest layout
//!
//! Structural edges form a forest. Each tree is laid out by aggregating
//! subtree widths bottom-up and placing children centered under their
//! parent top-down. Trees are placed side by side in input order, followed
//! by a row of standalone nodes. Cross-reference edges never affect layout.
//!
//! The algorithm is a pure function of its input: every call owns a fresh
//! width memo, and identical input yields identical positions.

use pipescope_core::{Edge, LayoutConfig, Node, NodeId};
use pipescope_graph::Adjacency;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Column count above which node height stops growing
pub const MAX_HEIGHT_COLUMNS: usize = 10;

/// Center of a node box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Height of a node with `column_count` columns
pub fn node_height(column_count: usize, config: &LayoutConfig) -> f64 {
    config.base_height + config.per_column_height * column_count.min(MAX_HEIGHT_COLUMNS) as f64
}

/// Compute a position for every node
pub fn layout(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> HashMap<NodeId, Position> {
    let adjacency = Adjacency::build(nodes, edges);
    layout_with_adjacency(nodes, &adjacency, config)
}

/// Compute positions from a prebuilt adjacency
pub fn layout_with_adjacency(
    nodes: &[Node],
    adjacency: &Adjacency,
    config: &LayoutConfig,
) -> HashMap<NodeId, Position> {
    let mut pass = LayoutPass::new(nodes, adjacency, config);
    pass.place_forest(nodes);

    let mut positions = HashMap::with_capacity(nodes.len());
    for node in nodes {
        let position = pass.positions.get(node.id.as_str()).copied().unwrap_or_default();
        positions.entry(node.id.clone()).or_insert(position);
    }

    tracing::debug!(
        nodes = nodes.len(),
        placed = pass.positions.len(),
        width_evaluations = pass.width_evaluations,
        "computed layout"
    );

    positions
}

/// Pending width computation of a node whose children are being summed
struct WidthFrame<'a> {
    id: &'a str,
    children: &'a [NodeId],

    /// Index of the next child to visit
    next: usize,

    /// Sum of (child width + gap) over visited children
    children_width: f64,
}

/// State of one `layout()` invocation
struct LayoutPass<'a> {
    adjacency: &'a Adjacency,
    config: &'a LayoutConfig,

    /// Column count per node id (first occurrence wins)
    column_counts: HashMap<&'a str, usize>,

    /// Subtree width memo, scoped to this pass
    widths: HashMap<&'a str, f64>,

    /// Nodes whose width is being computed (guards structural cycles)
    visiting: HashSet<&'a str>,

    positions: HashMap<&'a str, Position>,

    /// Number of non-memoized width computations
    width_evaluations: usize,
}

impl<'a> LayoutPass<'a> {
    fn new(nodes: &'a [Node], adjacency: &'a Adjacency, config: &'a LayoutConfig) -> Self {
        let mut column_counts = HashMap::with_capacity(nodes.len());
        for node in nodes {
            column_counts.entry(node.id.as_str()).or_insert(node.column_count());
        }

        Self {
            adjacency,
            config,
            column_counts,
            widths: HashMap::new(),
            visiting: HashSet::new(),
            positions: HashMap::new(),
            width_evaluations: 0,
        }
    }

    fn node_height(&self, id: &str) -> f64 {
        node_height(self.column_counts.get(id).copied().unwrap_or(0), self.config)
    }

    /// Horizontal space needed by a node and its structural descendants
    ///
    /// Post-order over an explicit stack, so deep chains do not grow the
    /// call stack.
    fn subtree_width(&mut self, id: &'a str) -> f64 {
        let node_width = self.config.node_width;
        let gap = self.config.horizontal_gap;

        let mut stack: Vec<WidthFrame<'a>> = Vec::new();
        if let Some(width) = self.enter_width(id, &mut stack) {
            return width;
        }

        while let Some(frame) = stack.last_mut() {
            let children = frame.children;
            if let Some(child) = children.get(frame.next) {
                frame.next += 1;
                if let Some(width) = self.enter_width(child.as_str(), &mut stack) {
                    if let Some(parent) = stack.last_mut() {
                        parent.children_width += width + gap;
                    }
                }
                continue;
            }

            let Some(frame) = stack.pop() else { break };
            self.visiting.remove(frame.id);

            let width = node_width.max(frame.children_width - gap);
            self.widths.insert(frame.id, width);

            match stack.last_mut() {
                Some(parent) => parent.children_width += width + gap,
                None => return width,
            }
        }

        node_width
    }

    /// Resolve a width without descending, or push a frame for its children
    fn enter_width(&mut self, id: &'a str, stack: &mut Vec<WidthFrame<'a>>) -> Option<f64> {
        if let Some(width) = self.widths.get(id) {
            return Some(*width);
        }

        let node_width = self.config.node_width;
        let adjacency = self.adjacency;
        let children = adjacency.children(id);
        if children.is_empty() {
            self.width_evaluations += 1;
            self.widths.insert(id, node_width);
            return Some(node_width);
        }

        // Re-entered through a structural cycle: treat as a leaf
        if !self.visiting.insert(id) {
            return Some(node_width);
        }

        self.width_evaluations += 1;
        stack.push(WidthFrame {
            id,
            children,
            next: 0,
            children_width: 0.0,
        });
        None
    }

    /// Place a node and its structural subtree; the first placement wins
    ///
    /// Worklist in depth-first pre-order, children pushed in reverse so the
    /// leftmost subtree is placed first.
    fn place_tree(&mut self, id: &'a str, center_x: f64, y: f64) {
        let mut worklist: Vec<(&'a str, f64, f64)> = vec![(id, center_x, y)];

        while let Some((id, center_x, y)) = worklist.pop() {
            if self.positions.contains_key(id) {
                tracing::debug!(node = id, "already placed, keeping first position");
                continue;
            }

            self.positions.insert(id, Position::new(center_x, y));

            let adjacency = self.adjacency;
            let children = adjacency.children(id);
            if children.is_empty() {
                continue;
            }

            let width = self.subtree_width(id);
            let child_y = y + self.node_height(id) + self.config.vertical_gap;
            let mut slice_start = center_x - width / 2.0;

            let mut placements = Vec::with_capacity(children.len());
            for child in children {
                let child_width = self.subtree_width(child.as_str());
                placements.push((child.as_str(), slice_start + child_width / 2.0, child_y));
                slice_start += child_width + self.config.horizontal_gap;
            }

            worklist.extend(placements.into_iter().rev());
        }
    }

    /// Lay out every tree left to right, then the standalone row
    fn place_forest(&mut self, nodes: &'a [Node]) {
        let mut roots: Vec<&'a str> = Vec::new();
        let mut standalone: Vec<&'a str> = Vec::new();
        let mut seen: HashSet<&'a str> = HashSet::new();

        for node in nodes {
            let id = node.id.as_str();
            if !seen.insert(id) || self.adjacency.has_structural_parent(id) {
                continue;
            }

            if self.adjacency.has_structural_children(id) {
                roots.push(id);
            } else {
                standalone.push(id);
            }
        }

        let gap = self.config.horizontal_gap;
        let mut global_x = 0.0;

        for root in roots.iter().copied() {
            let width = self.subtree_width(root);
            self.place_tree(root, global_x + width / 2.0, 0.0);
            global_x += width + 2.0 * gap;
        }

        for id in standalone.iter().copied() {
            self.positions.insert(id, Position::new(global_x, 0.0));
            global_x += self.config.node_width + gap;
        }

        tracing::debug!(
            roots = roots.len(),
            standalone = standalone.len(),
            "placed forest"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipescope_core::Column;
    use pretty_assertions::assert_eq;

    fn config() -> LayoutConfig {
        LayoutConfig {
            node_width: 240.0,
            base_height: 80.0,
            per_column_height: 18.0,
            horizontal_gap: 40.0,
            vertical_gap: 80.0,
        }
    }

    fn tables(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| Node::table(*id, *id)).collect()
    }

    #[test]
    fn leaf_width_is_node_width() {
        let nodes = tables(&["leaf"]);
        let adjacency = Adjacency::build(&nodes, &[]);
        let config = config();
        let mut pass = LayoutPass::new(&nodes, &adjacency, &config);

        assert_eq!(pass.subtree_width("leaf"), 240.0);
    }

    #[test]
    fn parent_width_spans_children() {
        let nodes = tables(&["A", "B", "C"]);
        let edges = vec![Edge::structural("A", "B"), Edge::structural("A", "C")];

        let adjacency = Adjacency::build(&nodes, &edges);
        let config = config();
        let mut pass = LayoutPass::new(&nodes, &adjacency, &config);

        assert_eq!(pass.subtree_width("B"), 240.0);
        assert_eq!(pass.subtree_width("C"), 240.0);
        assert_eq!(pass.subtree_width("A"), 520.0);
    }

    #[test]
    fn widths_are_memoized_within_a_pass() {
        // Deep chain with a wide fan-out at the bottom
        let mut ids: Vec<String> = (0..6).map(|i| format!("n{}", i)).collect();
        ids.extend((0..4).map(|i| format!("leaf{}", i)));
        let nodes: Vec<Node> = ids.iter().map(|id| Node::table(id.clone(), id.clone())).collect();

        let mut edges: Vec<Edge> = (0..5)
            .map(|i| Edge::structural(format!("n{}", i), format!("n{}", i + 1)))
            .collect();
        edges.extend((0..4).map(|i| Edge::structural("n5", format!("leaf{}", i))));

        let adjacency = Adjacency::build(&nodes, &edges);
        let config = config();
        let mut pass = LayoutPass::new(&nodes, &adjacency, &config);

        pass.place_forest(&nodes);
        pass.subtree_width("n0");
        pass.subtree_width("n3");

        // Every node's width is computed exactly once
        assert_eq!(pass.width_evaluations, nodes.len());
    }

    #[test]
    fn node_height_is_capped() {
        let config = config();
        assert_eq!(node_height(0, &config), 80.0);
        assert_eq!(node_height(3, &config), 80.0 + 3.0 * 18.0);
        assert_eq!(node_height(10, &config), 260.0);
        assert_eq!(node_height(45, &config), 260.0);
    }

    #[test]
    fn places_tree_and_standalone_row() {
        let mut nodes = tables(&["A", "B", "C", "D"]);
        nodes[0].columns = vec![Column::new("x", "Int"), Column::new("y", "Int")];
        let edges = vec![Edge::structural("A", "B"), Edge::structural("A", "C")];
        let config = config();

        let positions = layout(&nodes, &edges, &config);
        let (a, b, c, d) = (positions["A"], positions["B"], positions["C"], positions["D"]);

        assert_eq!(a, Position::new(260.0, 0.0));

        let child_y = node_height(2, &config) + config.vertical_gap;
        assert_eq!(b.y, child_y);
        assert_eq!(c.y, child_y);

        // Symmetric around the parent, separated by one gap
        assert_eq!(a.x - b.x, c.x - a.x);
        assert_eq!((c.x - config.node_width / 2.0) - (b.x + config.node_width / 2.0), 40.0);

        // Standalone row starts after the tree plus two gaps
        assert_eq!(d, Position::new(600.0, 0.0));
        assert!(d.x > a.x + 520.0 / 2.0);
    }

    #[test]
    fn trees_are_laid_out_left_to_right() {
        let nodes = tables(&["r1", "c1", "r2", "c2", "c3", "s1", "s2"]);
        let edges = vec![
            Edge::structural("r1", "c1"),
            Edge::structural("r2", "c2"),
            Edge::structural("r2", "c3"),
        ];

        let positions = layout(&nodes, &edges, &config());

        assert_eq!(positions["r1"], Position::new(120.0, 0.0));
        assert_eq!(positions["c1"].x, 120.0);
        // r1 occupies 240, plus 2 * 40
        assert_eq!(positions["r2"], Position::new(320.0 + 260.0, 0.0));
        // r2 occupies 520, plus 2 * 40
        assert_eq!(positions["s1"], Position::new(320.0 + 600.0, 0.0));
        assert_eq!(positions["s2"], Position::new(320.0 + 600.0 + 280.0, 0.0));
    }

    #[test]
    fn cross_references_do_not_affect_layout() {
        let nodes = tables(&["A", "B", "X"]);
        let structural = vec![Edge::structural("A", "B")];
        let mut with_cross = structural.clone();
        with_cross.push(Edge::cross_reference("X", "B"));
        with_cross.push(Edge::cross_reference("A", "X"));

        assert_eq!(
            layout(&nodes, &structural, &config()),
            layout(&nodes, &with_cross, &config())
        );
    }

    #[test]
    fn layout_is_idempotent() {
        let nodes = tables(&["A", "B", "C", "D", "E"]);
        let edges = vec![
            Edge::structural("A", "B"),
            Edge::structural("B", "C"),
            Edge::structural("A", "D"),
            Edge::cross_reference("E", "C"),
        ];

        assert_eq!(
            layout(&nodes, &edges, &config()),
            layout(&nodes, &edges, &config())
        );
    }

    #[test]
    fn empty_graph_yields_empty_layout() {
        assert!(layout(&[], &[], &config()).is_empty());
    }

    #[test]
    fn multiple_parents_first_placement_wins() {
        let nodes = tables(&["P1", "P2", "child"]);
        let edges = vec![Edge::structural("P1", "child"), Edge::structural("P2", "child")];

        let positions = layout(&nodes, &edges, &config());

        assert_eq!(positions.len(), 3);
        assert_eq!(positions["child"].x, positions["P1"].x);
        assert_ne!(positions["child"].x, positions["P2"].x);
    }

    #[test]
    fn structural_cycle_terminates() {
        let nodes = tables(&["root", "a", "b", "island1", "island2"]);
        let edges = vec![
            Edge::structural("root", "a"),
            Edge::structural("a", "b"),
            Edge::structural("b", "a"),
            Edge::structural("island1", "island2"),
            Edge::structural("island2", "island1"),
        ];

        let positions = layout(&nodes, &edges, &config());

        assert_eq!(positions.len(), 5);
        // Nodes unreachable from any root default to the origin
        assert_eq!(positions["island1"], Position::default());
        assert_eq!(positions["island2"], Position::default());
        assert_eq!(positions["root"].y, 0.0);
        assert!(positions["b"].y > positions["a"].y);
    }

    #[test]
    fn dangling_children_are_not_reported() {
        let nodes = tables(&["A"]);
        let edges = vec![Edge::structural("A", "ghost")];

        let positions = layout(&nodes, &edges, &config());
        assert_eq!(positions.len(), 1);
        assert_eq!(positions["A"], Position::new(120.0, 0.0));
    }

    #[test]
    fn deep_chain_is_laid_out_without_recursion() {
        let depth = 20_000;
        let nodes: Vec<Node> = (0..depth)
            .map(|i| Node::view(format!("v{}", i), format!("v{}", i), "src"))
            .collect();
        let edges: Vec<Edge> = (1..depth)
            .map(|i| Edge::structural(format!("v{}", i - 1), format!("v{}", i)))
            .collect();
        let config = config();

        let positions = layout(&nodes, &edges, &config);

        assert_eq!(positions.len(), depth);
        let step = node_height(0, &config) + config.vertical_gap;
        let last = positions[&format!("v{}", depth - 1)];
        assert_eq!(last, Position::new(120.0, step * (depth - 1) as f64));
    }
}
