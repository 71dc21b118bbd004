//! Per-view session: loading, layout and selection
//!
//! A view fetches one snapshot, lays it out once and then only recolors in
//! response to clicks. Each view owns its graph and selection exclusively.

use crate::cache::{LayoutCache, Positions};
use pipescope_catalog::{FetchError, MetadataProvider};
use pipescope_core::{Config, LintReport};
use pipescope_engine::{
    assemble_detail, derive_highlight, layout_with_adjacency, positioned_nodes, rendered_edges,
    DetailView, Highlight, PositionedNode, RenderDocument, RenderedEdge, SelectionState,
};
use pipescope_graph::{Adjacency, PipelineSnapshot, SnapshotLinter};
use std::sync::Arc;

/// Session errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to fetch pipeline metadata: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse view status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    Error,
    Ready,
}

/// A fetched graph with its layout and selection
#[derive(Debug, Clone)]
pub struct LoadedPipeline {
    pub snapshot: PipelineSnapshot,
    pub adjacency: Adjacency,
    pub fingerprint: String,
    pub positions: Arc<Positions>,
    pub selection: SelectionState,

    /// Highlight derived from `selection`
    pub highlight: Highlight,
}

impl LoadedPipeline {
    fn refresh_highlight(&mut self) {
        self.highlight = derive_highlight(
            &self.selection,
            &self.adjacency,
            &self.snapshot.nodes,
            &self.snapshot.edges,
        );
    }
}

/// View state; no partial graph is ever exposed
#[derive(Debug, Clone)]
pub enum ViewState {
    Loading,
    Error(String),
    Ready(Box<LoadedPipeline>),
}

impl ViewState {
    pub fn status(&self) -> ViewStatus {
        match self {
            Self::Loading => ViewStatus::Loading,
            Self::Error(_) => ViewStatus::Error,
            Self::Ready(_) => ViewStatus::Ready,
        }
    }
}

/// One pipeline view
#[derive(Debug)]
pub struct PipelineView {
    config: Config,

    /// Layout of the last loaded snapshot
    cache: LayoutCache,
    state: ViewState,

    /// Layout computations performed by this view (cache hits excluded)
    layout_runs: usize,
}

impl PipelineView {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: LayoutCache::new(),
            state: ViewState::Loading,
            layout_runs: 0,
        }
    }

    /// Fetch a snapshot and build the view
    ///
    /// On failure the view enters the `Error` state carrying the message.
    pub async fn load(&mut self, provider: &dyn MetadataProvider) -> Result<(), SessionError> {
        self.state = ViewState::Loading;
        tracing::info!(provider = provider.name(), "loading pipeline");

        match provider.fetch_snapshot().await {
            Ok(snapshot) => self.load_snapshot(snapshot),
            Err(err) => {
                let err = SessionError::from(err);
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Build the view from an already fetched snapshot
    pub fn load_snapshot(&mut self, mut snapshot: PipelineSnapshot) -> Result<(), SessionError> {
        if let Err(err) = self.config.layout.validate() {
            let err = SessionError::InvalidConfig(err.to_string());
            self.fail(&err);
            return Err(err);
        }

        snapshot.prepare(&self.config.snapshot);

        let adjacency = Adjacency::build(&snapshot.nodes, &snapshot.edges);
        let fingerprint = snapshot.fingerprint();
        let positions = self.positions_for(&snapshot, &adjacency, &fingerprint);

        let mut loaded = LoadedPipeline {
            snapshot,
            adjacency,
            fingerprint,
            positions,
            selection: SelectionState::Idle,
            highlight: Highlight::default(),
        };
        loaded.refresh_highlight();

        tracing::info!(
            nodes = loaded.snapshot.nodes.len(),
            edges = loaded.snapshot.edges.len(),
            fingerprint = %loaded.fingerprint,
            "pipeline ready"
        );

        self.state = ViewState::Ready(Box::new(loaded));
        Ok(())
    }

    fn positions_for(
        &mut self,
        snapshot: &PipelineSnapshot,
        adjacency: &Adjacency,
        fingerprint: &str,
    ) -> Arc<Positions> {
        if let Some(positions) = self.cache.get(fingerprint, &self.config.layout) {
            tracing::debug!(fingerprint, "reusing cached layout");
            return positions;
        }

        self.layout_runs += 1;
        let positions = layout_with_adjacency(&snapshot.nodes, adjacency, &self.config.layout);
        self.cache.insert(fingerprint, &self.config.layout, positions)
    }

    fn fail(&mut self, err: &SessionError) {
        tracing::warn!(error = %err, "pipeline view failed");
        self.state = ViewState::Error(err.to_string());
    }

    /// Node click: toggle selection
    pub fn on_node_click(&mut self, id: &str) {
        match &mut self.state {
            ViewState::Ready(loaded) => {
                loaded.selection.on_node_click(id);
                loaded.refresh_highlight();
            }
            _ => tracing::debug!(node = id, "ignoring click, view not ready"),
        }
    }

    /// Click on the empty canvas: clear selection
    pub fn on_pane_click(&mut self) {
        if let ViewState::Ready(loaded) = &mut self.state {
            loaded.selection.on_pane_click();
            loaded.refresh_highlight();
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn status(&self) -> ViewStatus {
        self.state.status()
    }

    /// Failure message while in the `Error` state
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ViewState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout_runs(&self) -> usize {
        self.layout_runs
    }

    fn loaded(&self) -> Option<&LoadedPipeline> {
        match &self.state {
            ViewState::Ready(loaded) => Some(loaded.as_ref()),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<&PipelineSnapshot> {
        self.loaded().map(|l| &l.snapshot)
    }

    pub fn adjacency(&self) -> Option<&Adjacency> {
        self.loaded().map(|l| &l.adjacency)
    }

    pub fn selection(&self) -> Option<&SelectionState> {
        self.loaded().map(|l| &l.selection)
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.loaded().map(|l| &l.highlight)
    }

    /// Detail of the selected node; None when idle or not ready
    pub fn current_detail(&self) -> Option<DetailView> {
        let loaded = self.loaded()?;
        let selected = loaded.selection.selected()?;
        loaded.snapshot.get_node(selected).map(assemble_detail)
    }

    pub fn positioned_nodes(&self) -> Vec<PositionedNode> {
        self.loaded()
            .map(|l| positioned_nodes(&l.snapshot.nodes, &l.positions, &l.highlight))
            .unwrap_or_default()
    }

    pub fn rendered_edges(&self) -> Vec<RenderedEdge> {
        self.loaded()
            .map(|l| rendered_edges(&l.snapshot.nodes, &l.snapshot.edges, &l.highlight, &self.config.style))
            .unwrap_or_default()
    }

    /// Full frame for the drawing layer
    pub fn render_document(&self) -> Option<RenderDocument> {
        let loaded = self.loaded()?;

        Some(
            RenderDocument::new(self.positioned_nodes(), self.rendered_edges())
                .with_fingerprint(loaded.fingerprint.clone())
                .with_selected(loaded.selection.selected().map(str::to_string)),
        )
    }

    /// Lint the loaded snapshot with the configured severities
    pub fn lint_report(&self) -> Option<LintReport> {
        self.loaded()
            .map(|l| SnapshotLinter::report(&l.snapshot, &self.config.lint))
    }
}

impl Default for PipelineView {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipescope_core::{Column, Edge, Node};
    use pretty_assertions::assert_eq;

    fn snapshot() -> PipelineSnapshot {
        PipelineSnapshot::new(
            vec![
                Node::table("docs", "docs").with_columns(vec![
                    Column::new("doc", "Document"),
                    Column::computed("text", "String", "extract(doc)").with_errors(1),
                ]),
                Node::view("chunks", "chunks", "docs").with_iterator("DocumentSplitter"),
                Node::table("questions", "questions"),
            ],
            vec![Edge::cross_reference("questions", "chunks")],
        )
    }

    #[test]
    fn test_new_view_is_loading() {
        let view = PipelineView::default();
        assert_eq!(view.status(), ViewStatus::Loading);
        assert!(view.render_document().is_none());
        assert!(view.positioned_nodes().is_empty());
    }

    #[test]
    fn test_load_snapshot_derives_base_edges() {
        let mut view = PipelineView::default();
        view.load_snapshot(snapshot()).unwrap();

        assert_eq!(view.status(), ViewStatus::Ready);
        let adjacency = view.adjacency().unwrap();
        assert_eq!(adjacency.children("docs"), ["chunks".to_string()]);
        assert_eq!(view.layout_runs(), 1);
    }

    #[test]
    fn test_clicks_do_not_relayout() {
        let mut view = PipelineView::default();
        view.load_snapshot(snapshot()).unwrap();
        let before: Vec<(String, f64, f64)> =
            view.positioned_nodes().into_iter().map(|n| (n.id, n.x, n.y)).collect();

        view.on_node_click("chunks");
        view.on_node_click("docs");
        view.on_pane_click();

        let after: Vec<(String, f64, f64)> =
            view.positioned_nodes().into_iter().map(|n| (n.id, n.x, n.y)).collect();
        assert_eq!(before, after);
        assert_eq!(view.layout_runs(), 1);
    }

    #[test]
    fn test_current_detail_follows_selection() {
        let mut view = PipelineView::default();
        view.load_snapshot(snapshot()).unwrap();
        assert!(view.current_detail().is_none());

        view.on_node_click("docs");
        let detail = view.current_detail().unwrap();
        assert_eq!(detail.id, "docs");
        assert_eq!(detail.aggregate.total_errors, 1);

        view.on_node_click("docs");
        assert!(view.current_detail().is_none());
    }

    #[test]
    fn test_only_last_layout_is_kept() {
        let mut changed = snapshot();
        changed.nodes.push(Node::table("answers", "answers"));

        let mut view = PipelineView::default();
        view.load_snapshot(snapshot()).unwrap();
        view.load_snapshot(snapshot()).unwrap();
        assert_eq!(view.layout_runs(), 1);

        view.load_snapshot(changed).unwrap();
        assert_eq!(view.layout_runs(), 2);

        // The first layout was replaced, so returning to it lays out again
        view.load_snapshot(snapshot()).unwrap();
        assert_eq!(view.layout_runs(), 3);
        assert_eq!(view.positioned_nodes().len(), 3);
    }

    #[test]
    fn test_invalid_layout_config_enters_error_state() {
        let mut config = Config::default();
        config.layout.node_width = 0.0;

        let mut view = PipelineView::new(config);
        let result = view.load_snapshot(snapshot());

        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
        assert_eq!(view.status(), ViewStatus::Error);
        assert!(view.error_message().is_some());
        assert!(view.snapshot().is_none());
    }

    #[test]
    fn test_clicks_ignored_until_ready() {
        let mut view = PipelineView::default();
        view.on_node_click("docs");
        view.on_pane_click();

        assert!(view.selection().is_none());
        assert!(view.current_detail().is_none());
    }

    #[test]
    fn test_render_document_reports_selection() {
        let mut view = PipelineView::default();
        view.load_snapshot(snapshot()).unwrap();
        view.on_node_click("chunks");

        let document = view.render_document().unwrap();
        assert_eq!(document.selected.as_deref(), Some("chunks"));
        assert_eq!(document.positioned_nodes.len(), 3);
        assert_eq!(document.rendered_edges.len(), 2);
        assert!(document.rendered_edges.iter().all(|e| e.emphasized));
        assert_eq!(document.fingerprint.as_deref().map(str::len), Some(64));
    }
}
