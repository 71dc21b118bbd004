//! Metadata providers for pipeline snapshots
//!
//! A provider delivers the full node/edge set of one pipeline in a single
//! fetch. Providers available here:
//! - `JsonFileProvider` - reads a snapshot JSON file
//! - `MockProvider` - in-memory snapshot with simulated failures and latency
//!
//! ## Example
//!
//! ```rust,ignore
//! use pipescope_catalog::{JsonFileProvider, MetadataProvider};
//!
//! let provider = JsonFileProvider::new("pipeline.json");
//! let snapshot = provider.fetch_snapshot().await?;
//! ```

pub mod provider;
pub mod file;
pub mod mock;

pub use provider::{MetadataProvider, FetchError};
pub use file::JsonFileProvider;
pub use mock::MockProvider;
