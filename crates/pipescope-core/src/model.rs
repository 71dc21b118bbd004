//! Pipeline data model
//!
//! Tables, views, columns, indexes and version history as delivered by the
//! metadata provider. Field names follow the snapshot wire format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Node identifier (unique table/view path, e.g. "agents.chat_history")
pub type NodeId = String;

/// Kind of function backing a computed column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuncType {
    /// Function shipped with the pipeline runtime
    Builtin,

    /// User-defined function
    CustomUdf,

    /// Query function reading another table
    Query,

    /// Could not be determined
    Unknown,
}

impl FuncType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::CustomUdf => "custom_udf",
            Self::Query => "query",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FuncType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A column of a table or view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Declared type, as rendered by the pipeline runtime
    #[serde(rename = "type", default = "unknown_type")]
    pub column_type: String,

    /// Whether the value is derived by a declared function
    #[serde(default)]
    pub is_computed: bool,

    /// Kind of function (computed columns only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func_type: Option<FuncType>,

    /// Function name (computed columns only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func_name: Option<String>,

    /// Source expression text (computed columns only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_with: Option<String>,

    /// Names of the columns this one is computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,

    /// Number of rows whose computation failed
    #[serde(default)]
    pub error_count: u64,

    /// Owning base table name, for inherited columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defined_in: Option<String>,

    /// False when the column is inherited from a base
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defined_in_self: Option<bool>,
}

fn unknown_type() -> String {
    "unknown".to_string()
}

impl Column {
    /// Create a plain (insertable) column
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            is_computed: false,
            func_type: None,
            func_name: None,
            computed_with: None,
            depends_on: None,
            error_count: 0,
            defined_in: None,
            defined_in_self: None,
        }
    }

    /// Create a computed column from its source expression
    pub fn computed(
        name: impl Into<String>,
        column_type: impl Into<String>,
        computed_with: impl Into<String>,
    ) -> Self {
        Self {
            is_computed: true,
            computed_with: Some(computed_with.into()),
            ..Self::new(name, column_type)
        }
    }

    /// Set the function kind and name
    pub fn with_function(mut self, func_type: FuncType, func_name: impl Into<String>) -> Self {
        self.func_type = Some(func_type);
        self.func_name = Some(func_name.into());
        self
    }

    /// Set the column dependencies
    pub fn with_depends_on(mut self, depends_on: Vec<String>) -> Self {
        self.depends_on = Some(depends_on);
        self
    }

    /// Set the error count
    pub fn with_errors(mut self, error_count: u64) -> Self {
        self.error_count = error_count;
        self
    }

    /// Mark the column as inherited from `base`
    pub fn inherited_from(mut self, base: impl Into<String>) -> Self {
        self.defined_in = Some(base.into());
        self.defined_in_self = Some(false);
        self
    }

    /// Whether this column was inherited from a base table
    pub fn is_inherited(&self) -> bool {
        self.defined_in_self == Some(false)
    }
}

/// An embedding index over one or more columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,

    #[serde(default)]
    pub columns: BTreeSet<String>,

    /// Embedding function description
    #[serde(default)]
    pub embedding: String,
}

/// What a table version changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Data,
    Schema,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data => write!(f, "data"),
            Self::Schema => write!(f, "schema"),
        }
    }
}

/// One entry of a table's version history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: u64,
    pub change_type: ChangeType,
    #[serde(default)]
    pub inserts: u64,
    #[serde(default)]
    pub updates: u64,
    #[serde(default)]
    pub deletes: u64,
    #[serde(default)]
    pub errors: u64,
}

/// A table or view in the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique path
    pub id: NodeId,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub is_view: bool,

    /// Node this view is derived from
    #[serde(default)]
    pub base: Option<NodeId>,

    #[serde(default)]
    pub row_count: u64,

    #[serde(default)]
    pub version: u64,

    /// Columns in declaration order
    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default)]
    pub indices: Vec<Index>,

    /// Version history, oldest first
    #[serde(default)]
    pub versions: Vec<VersionEntry>,

    /// Iterator backing the view (e.g. a frame or chunk iterator)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterator_type: Option<String>,

    /// Total computation errors, as reported by the provider
    #[serde(default)]
    pub total_errors: u64,

    /// Number of computed columns, as reported by the provider
    #[serde(default)]
    pub computed_count: u64,
}

impl Node {
    /// Create a base table node
    pub fn table(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_view: false,
            base: None,
            row_count: 0,
            version: 0,
            columns: Vec::new(),
            indices: Vec::new(),
            versions: Vec::new(),
            iterator_type: None,
            total_errors: 0,
            computed_count: 0,
        }
    }

    /// Create a view derived from `base`
    pub fn view(id: impl Into<String>, name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            is_view: true,
            base: Some(base.into()),
            ..Self::table(id, name)
        }
    }

    /// Set columns and refresh the derived aggregates
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self.total_errors = self.column_error_total();
        self.computed_count = self.column_computed_count();
        self
    }

    pub fn with_indices(mut self, indices: Vec<Index>) -> Self {
        self.indices = indices;
        self
    }

    pub fn with_versions(mut self, versions: Vec<VersionEntry>) -> Self {
        self.versions = versions;
        self
    }

    pub fn with_iterator(mut self, iterator_type: impl Into<String>) -> Self {
        self.iterator_type = Some(iterator_type.into());
        self
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Sum of error counts over computed columns, saturating at `u64::MAX`
    pub fn column_error_total(&self) -> u64 {
        self.columns
            .iter()
            .filter(|c| c.is_computed)
            .map(|c| c.error_count)
            .fold(0u64, u64::saturating_add)
    }

    /// Number of computed columns
    pub fn column_computed_count(&self) -> u64 {
        self.columns.iter().filter(|c| c.is_computed).count() as u64
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Edge type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// View derived from its base; drives layout
    Structural,

    /// Non-hierarchical data dependency; highlight only
    CrossReference,
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,

    #[serde(rename = "type")]
    pub kind: EdgeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// Create a structural edge from a base to a derived view
    pub fn structural(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Structural,
            label: None,
        }
    }

    /// Create a cross-reference edge
    pub fn cross_reference(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::CrossReference,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_structural(&self) -> bool {
        self.kind == EdgeKind::Structural
    }

    /// Whether `id` is either endpoint
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}
