//! Pipeline snapshot ingestion and the graph data model
//!
//! This crate handles:
//! - Parsing snapshots fetched from the metadata provider
//! - Building structural and all-neighbor adjacency maps
//! - Structural lineage (ancestors / descendants)
//! - Snapshot lint (forest invariant, edge hygiene)
//! - Classifying computed-column functions

pub mod snapshot;
pub mod adjacency;
pub mod lint;
pub mod function;

pub use snapshot::{PipelineSnapshot, SnapshotError};
pub use adjacency::Adjacency;
pub use lint::SnapshotLinter;
pub use function::{FunctionSignature, classify_columns};
