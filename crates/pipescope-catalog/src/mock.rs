//! Mock metadata provider for testing
//!
//! Serves an in-memory snapshot and can simulate failures and latency.
//!
//! ```rust,ignore
//! use pipescope_catalog::{MockProvider, MetadataProvider};
//!
//! let provider = MockProvider::new(snapshot).with_latency(50);
//! let fetched = provider.fetch_snapshot().await?;
//!
//! let failing = MockProvider::empty().with_failure(FetchError::NetworkError("down".into()));
//! assert!(failing.fetch_snapshot().await.is_err());
//! ```

use crate::provider::{FetchError, MetadataProvider};
use pipescope_graph::PipelineSnapshot;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory metadata provider
///
/// Clones share the stored snapshot and the fetch counter.
pub struct MockProvider {
    snapshot: Arc<RwLock<PipelineSnapshot>>,

    /// Error returned instead of the snapshot
    failure: Option<FetchError>,

    /// Simulated fetch latency (milliseconds)
    latency_ms: u64,

    fetches: Arc<AtomicUsize>,

    provider_name: &'static str,
}

impl MockProvider {
    pub fn new(snapshot: PipelineSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            failure: None,
            latency_ms: 0,
            fetches: Arc::new(AtomicUsize::new(0)),
            provider_name: "Mock",
        }
    }

    /// Provider with no nodes or edges
    pub fn empty() -> Self {
        Self::new(PipelineSnapshot::default())
    }

    /// Fail every fetch with `error`
    pub fn with_failure(mut self, error: FetchError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.provider_name = name;
        self
    }

    /// Replace the served snapshot
    pub async fn set_snapshot(&self, snapshot: PipelineSnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    /// Number of fetches served so far, including failed ones
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::empty()
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
            failure: self.failure.clone(),
            latency_ms: self.latency_ms,
            fetches: Arc::clone(&self.fetches),
            provider_name: self.provider_name,
        }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.provider_name
    }

    async fn fetch_snapshot(&self) -> Result<PipelineSnapshot, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        Ok(self.snapshot.read().await.clone())
    }
}
