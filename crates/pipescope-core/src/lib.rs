//! Pipescope Core
//!
//! Core domain model shared by every pipescope crate.
//! Never rename diagnostic codes - they are part of the public API.

pub mod model;
pub mod diagnostic;
pub mod report;
pub mod config;

pub use model::{NodeId, Node, Column, FuncType, Index, VersionEntry, ChangeType, Edge, EdgeKind};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use report::{LintReport, ReportSummary, ReportVersion};
pub use config::{Config, ConfigError, LayoutConfig, StyleConfig, SnapshotConfig, LintConfig};
