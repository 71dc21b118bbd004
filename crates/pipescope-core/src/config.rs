//! Configuration schema (pipescope.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::diagnostic::{DiagnosticCode, Severity};

/// Geometry used by the layout engine
///
/// Always passed explicitly to `layout()`; the algorithm never reads a
/// global default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of every node box
    pub node_width: f64,

    /// Height of a node with no columns
    pub base_height: f64,

    /// Extra height per column (capped at 10 columns)
    pub per_column_height: f64,

    /// Gap between sibling subtrees
    pub horizontal_gap: f64,

    /// Gap between a parent's bottom edge and its children
    pub vertical_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 240.0,
            base_height: 80.0,
            per_column_height: 18.0,
            horizontal_gap: 40.0,
            vertical_gap: 80.0,
        }
    }
}

impl LayoutConfig {
    /// Check that every dimension is a positive finite number
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("node_width", self.node_width),
            ("base_height", self.base_height),
            ("per_column_height", self.per_column_height),
            ("horizontal_gap", self.horizontal_gap),
            ("vertical_gap", self.vertical_gap),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidLayout(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Colors and stroke weights for render intents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Fill color of base tables
    pub table_color: String,

    /// Fill color of views
    pub view_color: String,

    /// Fill color of iterator views (frames, chunks, ...)
    pub iterator_view_color: String,

    /// Stroke color of edges while nothing is emphasized
    pub edge_color: String,

    pub edge_width: f64,
    pub emphasized_edge_width: f64,
    pub edge_opacity: f64,
    pub emphasized_edge_opacity: f64,

    /// Opacity of non-emphasized edges while a node is selected
    pub faded_edge_opacity: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            table_color: "#3b82f6".to_string(),
            view_color: "#8b5cf6".to_string(),
            iterator_view_color: "#f59e0b".to_string(),
            edge_color: "#94a3b8".to_string(),
            edge_width: 1.5,
            emphasized_edge_width: 3.0,
            edge_opacity: 0.8,
            emphasized_edge_opacity: 1.0,
            faded_edge_opacity: 0.15,
        }
    }
}

/// Snapshot ingestion options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Add a structural edge `base -> view` for views that have none
    pub derive_base_edges: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            derive_base_edges: true,
        }
    }
}

/// Severity overrides for specific lint codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintConfig {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub severity: HashMap<String, Severity>,
}

impl LintConfig {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.severity
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.severity.insert(code.as_str().to_string(), severity);
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub style: StyleConfig,

    #[serde(default)]
    pub snapshot: SnapshotConfig,

    #[serde(default)]
    pub lint: LintConfig,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.layout.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid layout configuration: {0}")]
    InvalidLayout(String),
}
