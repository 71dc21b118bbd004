//! Pipeline view sessions
//!
//! Ties a metadata provider to the engine: one fetch, one layout per
//! distinct snapshot, then click-driven highlight and detail updates.

pub mod cache;
pub mod view;

pub use cache::{LayoutCache, Positions};
pub use view::{LoadedPipeline, PipelineView, SessionError, ViewState, ViewStatus};
