//! Pipescope Engine
//!
//! Layout, selection and detail assembly over an in-memory snapshot.
//! Everything here is a total function: malformed forests, cycles and
//! empty graphs all produce output rather than errors.

pub mod layout;
pub mod selection;
pub mod render;
pub mod detail;

pub use layout::{layout, layout_with_adjacency, node_height, Position, MAX_HEIGHT_COLUMNS};
pub use selection::{derive_highlight, Highlight, NodeIntent, SelectionState};
pub use render::{
    node_color, positioned_nodes, rendered_edges, NodeData, PositionedNode, RenderDocument,
    RenderedEdge,
};
pub use detail::{assemble_detail, DetailAggregate, DetailView, PipelineStep};
