//! Layout reuse keyed by snapshot fingerprint
//!
//! Layout runs once per distinct fetched graph. Each view remembers the
//! layout of the snapshot it last loaded; reloading an unchanged snapshot
//! with unchanged layout settings reuses the stored positions, and loading
//! anything else replaces them.

use pipescope_core::{LayoutConfig, NodeId};
use pipescope_engine::Position;
use std::collections::HashMap;
use std::sync::Arc;

/// Computed positions of one snapshot
pub type Positions = HashMap<NodeId, Position>;

/// Last layout computed by a view
///
/// ```rust,ignore
/// let mut cache = LayoutCache::new();
/// cache.insert(&fingerprint, &config, positions);
///
/// if let Some(positions) = cache.get(&fingerprint, &config) {
///     // Skip layout
/// }
/// ```
#[derive(Debug, Default)]
pub struct LayoutCache {
    entry: Option<CachedLayout>,
}

#[derive(Debug)]
struct CachedLayout {
    key: String,
    positions: Arc<Positions>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key: snapshot fingerprint plus every layout setting
    ///
    /// Format: "fingerprint:w/h/c/hg/vg"
    fn cache_key(fingerprint: &str, config: &LayoutConfig) -> String {
        format!(
            "{}:{}/{}/{}/{}/{}",
            fingerprint,
            config.node_width,
            config.base_height,
            config.per_column_height,
            config.horizontal_gap,
            config.vertical_gap
        )
    }

    /// Store positions, replacing the previous layout
    pub fn insert(&mut self, fingerprint: &str, config: &LayoutConfig, positions: Positions) -> Arc<Positions> {
        let positions = Arc::new(positions);

        if let Some(previous) = self.entry.as_ref() {
            tracing::debug!(key = %previous.key, "replacing cached layout");
        }

        self.entry = Some(CachedLayout {
            key: Self::cache_key(fingerprint, config),
            positions: Arc::clone(&positions),
        });

        positions
    }

    /// Positions computed for the same snapshot and settings
    pub fn get(&self, fingerprint: &str, config: &LayoutConfig) -> Option<Arc<Positions>> {
        let entry = self.entry.as_ref()?;
        (entry.key == Self::cache_key(fingerprint, config)).then(|| Arc::clone(&entry.positions))
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}
