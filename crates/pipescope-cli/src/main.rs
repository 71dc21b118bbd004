use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pipescope_catalog::JsonFileProvider;
use pipescope_core::{Config, FuncType, LintReport, Severity};
use pipescope_engine::DetailView;
use pipescope_graph::SnapshotLinter;
use pipescope_session::PipelineView;

/// Pipescope - Explore pipeline lineage graphs
#[derive(Parser)]
#[command(name = "pipescope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: pipescope.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out a snapshot and write the render document
    Render {
        /// Path to snapshot JSON
        snapshot: PathBuf,

        /// Output file for render.json
        #[arg(short, long, default_value = "render.json")]
        output: PathBuf,

        /// Nodes to click, in order (id or unique name)
        #[arg(short, long)]
        select: Vec<String>,
    },

    /// Show the detail panel of a node
    Inspect {
        /// Path to snapshot JSON
        snapshot: PathBuf,

        /// Node to inspect (id or unique name)
        node: String,
    },

    /// Show the highlight partition for a selected node
    Select {
        /// Path to snapshot JSON
        snapshot: PathBuf,

        /// Node to select (id or unique name)
        node: String,
    },

    /// Show structural ancestors, descendants and neighbors of a node
    Lineage {
        /// Path to snapshot JSON
        snapshot: PathBuf,

        /// Node to analyze (id or unique name)
        node: String,
    },

    /// Check a snapshot for malformed structure
    Lint {
        /// Path to snapshot JSON
        snapshot: PathBuf,

        /// Output file for lint.json
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("pipescope.toml").exists() {
        Config::from_file(Path::new("pipescope.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    tracing::debug!(?config, "resolved configuration");

    match cli.command {
        Commands::Render { snapshot, output, select } => {
            render_command(config, &snapshot, &output, &select, cli.verbose).await
        }
        Commands::Inspect { snapshot, node } => {
            inspect_command(config, &snapshot, &node, cli.verbose).await
        }
        Commands::Select { snapshot, node } => {
            select_command(config, &snapshot, &node, cli.verbose).await
        }
        Commands::Lineage { snapshot, node } => {
            lineage_command(config, &snapshot, &node, cli.verbose).await
        }
        Commands::Lint { snapshot, output } => {
            lint_command(&config, &snapshot, output.as_deref(), cli.verbose)
        }
    }
}

/// Log to stderr; `--verbose` raises the level to debug
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Fetch the snapshot and build a ready view
async fn load_view(config: Config, snapshot: &Path, verbose: bool) -> Result<PipelineView> {
    if verbose {
        eprintln!("{} {}", "Loading snapshot from:".cyan(), snapshot.display());
    }

    let provider = JsonFileProvider::new(snapshot);
    let mut view = PipelineView::new(config);
    view.load(&provider)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load snapshot: {}", e))?;

    if verbose {
        if let Some(snapshot) = view.snapshot() {
            eprintln!(
                "{} {} nodes, {} edges",
                "Loaded".cyan(),
                snapshot.nodes.len(),
                snapshot.edges.len()
            );
        }
    }

    Ok(view)
}

/// Find node id from short name or id
fn find_node_id(view: &PipelineView, name: &str) -> Result<String> {
    let snapshot = view
        .snapshot()
        .ok_or_else(|| anyhow::anyhow!("Pipeline view is not ready"))?;

    snapshot
        .resolve_node(name)
        .map(|node| node.id.clone())
        .map_err(|e| anyhow::anyhow!("{}. Try using the full node id", e))
}

fn print_banner(title: &str) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", title.bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();
}

fn print_footer() {
    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Render command - layout, replay clicks, write render.json
async fn render_command(
    config: Config,
    snapshot: &Path,
    output: &Path,
    select: &[String],
    verbose: bool,
) -> Result<()> {
    let mut view = load_view(config, snapshot, verbose).await?;

    for name in select {
        let node_id = find_node_id(&view, name)?;
        if verbose {
            eprintln!("{} {}", "Clicking:".cyan(), node_id);
        }
        view.on_node_click(&node_id);
    }

    let document = view
        .render_document()
        .ok_or_else(|| anyhow::anyhow!("Pipeline view is not ready"))?;
    document.save_to_file(output)?;

    if verbose {
        eprintln!("{} {}", "Render document saved to:".green(), output.display());
    }

    print_banner("Pipeline Render");

    println!("Version: {}", document.version);
    if let Some(fingerprint) = &document.fingerprint {
        println!("Fingerprint: {}", fingerprint);
    }
    println!();

    println!("{} {}", "Nodes:".bold(), document.positioned_nodes.len());
    println!("{} {}", "Edges:".bold(), document.rendered_edges.len());

    match &document.selected {
        Some(selected) => {
            let highlighted = document
                .positioned_nodes
                .iter()
                .filter(|n| n.data.is_highlighted)
                .count();
            println!("{} {}", "Selected:".bold(), selected.green());
            println!("  Highlighted: {}", highlighted);
            println!("  Dimmed:      {}", document.positioned_nodes.len() - highlighted);
        }
        None => println!("{} {}", "Selected:".bold(), "none".dimmed()),
    }

    println!();
    println!("{} {}", "✓ Written to".green(), output.display());
    print_footer();

    Ok(())
}

/// Inspect command - print the detail panel
async fn inspect_command(config: Config, snapshot: &Path, node: &str, verbose: bool) -> Result<()> {
    let mut view = load_view(config, snapshot, verbose).await?;
    let node_id = find_node_id(&view, node)?;

    view.on_node_click(&node_id);
    let detail = view
        .current_detail()
        .ok_or_else(|| anyhow::anyhow!("Node '{}' has no detail", node_id))?;

    print_detail(&detail);

    Ok(())
}

fn node_kind(detail: &DetailView) -> String {
    match (&detail.iterator_type, detail.is_view) {
        (Some(iterator), _) => format!("view ({})", iterator),
        (None, true) => "view".to_string(),
        (None, false) => "table".to_string(),
    }
}

fn func_type_label(func_type: Option<FuncType>) -> colored::ColoredString {
    match func_type {
        Some(FuncType::Builtin) => "builtin".blue(),
        Some(FuncType::CustomUdf) => "custom_udf".magenta(),
        Some(FuncType::Query) => "query".cyan(),
        Some(FuncType::Unknown) | None => "unknown".dimmed(),
    }
}

fn print_detail(detail: &DetailView) {
    print_banner(&format!("Node Detail: {}", detail.name));

    println!("{} {}", "Id:".bold(), detail.id.green());
    println!("{} {}", "Kind:".bold(), node_kind(detail));
    match &detail.lineage {
        Some(base) => println!("{} {}", "Derived from:".bold(), base.yellow()),
        None => println!("{} {}", "Derived from:".bold(), "-".dimmed()),
    }
    println!("{} {}", "Rows:".bold(), detail.row_count);
    println!("{} {}", "Version:".bold(), detail.version);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Insertable columns: {}", detail.aggregate.insertable_count);
    println!("  Computed columns:   {}", detail.aggregate.computed_count);
    if detail.aggregate.total_errors > 0 {
        println!("  Errors:             {}", detail.aggregate.total_errors.to_string().red().bold());
    } else {
        println!("  Errors:             {}", detail.aggregate.total_errors.to_string().green());
    }
    println!();

    println!("{}", "Columns:".bold());
    if detail.base.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for column in &detail.base {
        match (&column.defined_in, column.is_inherited()) {
            (Some(owner), true) => println!(
                "  {} {} {}",
                column.name,
                column.column_type.dimmed(),
                format!("(from {})", owner).dimmed()
            ),
            _ => println!("  {} {}", column.name, column.column_type.dimmed()),
        }
    }
    println!();

    println!("{}", "Computation pipeline:".bold());
    if detail.computed.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for step in &detail.computed {
        let column = &step.column;
        let errors = if column.error_count > 0 {
            format!("{} errors", column.error_count).red().to_string()
        } else {
            "ok".green().to_string()
        };

        println!(
            "  {}. {} {} [{}{}] {}",
            step.step,
            column.name.bold(),
            column.column_type.dimmed(),
            func_type_label(column.func_type),
            column
                .func_name
                .as_ref()
                .map(|name| format!(": {}", name))
                .unwrap_or_default(),
            errors
        );

        if let Some(expression) = &column.computed_with {
            println!("     = {}", expression);
        }
        if let Some(depends_on) = column.depends_on.as_ref().filter(|d| !d.is_empty()) {
            println!("     depends on: {}", depends_on.join(", "));
        }
    }

    if !detail.indices.is_empty() {
        println!();
        println!("{}", "Indices:".bold());
        for index in &detail.indices {
            let columns: Vec<&str> = index.columns.iter().map(String::as_str).collect();
            println!("  {} on [{}] {}", index.name, columns.join(", "), index.embedding.dimmed());
        }
    }

    if !detail.versions_descending.is_empty() {
        println!();
        println!("{}", "Versions (newest first):".bold());
        for entry in &detail.versions_descending {
            let errors = if entry.errors > 0 {
                entry.errors.to_string().red()
            } else {
                entry.errors.to_string().normal()
            };
            println!(
                "  v{} {:<6} +{} ~{} -{} errors: {}",
                entry.version, entry.change_type.to_string(), entry.inserts, entry.updates, entry.deletes, errors
            );
        }
    }

    print_footer();
}

/// Select command - show highlighted and dimmed nodes
async fn select_command(config: Config, snapshot: &Path, node: &str, verbose: bool) -> Result<()> {
    let mut view = load_view(config, snapshot, verbose).await?;
    let node_id = find_node_id(&view, node)?;

    view.on_node_click(&node_id);

    let nodes = view.positioned_nodes();
    let edges = view.rendered_edges();

    print_banner("Selection");

    println!("{} {}", "Selected:".bold(), node_id.green());
    println!();

    println!("{}", "Highlighted:".bold());
    for n in nodes.iter().filter(|n| n.data.is_highlighted) {
        let marker = if n.id == node_id { "●" } else { "○" };
        println!("  {} {}", marker.green(), n.id);
    }
    println!();

    println!("{}", "Dimmed:".bold());
    let dimmed: Vec<_> = nodes.iter().filter(|n| n.data.is_dimmed).collect();
    if dimmed.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for n in dimmed {
        println!("  {}", n.id.dimmed());
    }
    println!();

    println!("{}", "Emphasized edges:".bold());
    let emphasized: Vec<_> = edges.iter().filter(|e| e.emphasized).collect();
    if emphasized.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for edge in emphasized {
        match &edge.label {
            Some(label) => println!("  {} -> {} ({})", edge.source, edge.target, label.italic()),
            None => println!("  {} -> {}", edge.source, edge.target),
        }
    }

    print_footer();

    Ok(())
}

/// Lineage command - structural ancestors and descendants plus all neighbors
async fn lineage_command(config: Config, snapshot: &Path, node: &str, verbose: bool) -> Result<()> {
    let view = load_view(config, snapshot, verbose).await?;
    let node_id = find_node_id(&view, node)?;
    let adjacency = view
        .adjacency()
        .ok_or_else(|| anyhow::anyhow!("Pipeline view is not ready"))?;

    let ancestors = adjacency.ancestors(&node_id);
    let descendants = adjacency.descendants(&node_id);
    let mut neighbors: Vec<&String> = adjacency
        .neighbors(&node_id)
        .map(|n| n.iter().collect())
        .unwrap_or_default();
    neighbors.sort();

    print_banner("Lineage");

    println!("{} {}", "Node:".bold(), node_id.green());
    println!();

    println!("{} {}", "Ancestors (nearest first):".bold(), ancestors.len());
    for (i, id) in ancestors.iter().enumerate() {
        println!("  {}. {}", i + 1, id.yellow());
    }
    println!();

    println!("{} {}", "Descendants:".bold(), descendants.len());
    for (i, id) in descendants.iter().enumerate() {
        println!("  {}. {}", i + 1, id.yellow());
    }
    println!();

    println!("{} {}", "Neighbors (any edge):".bold(), neighbors.len());
    for id in neighbors {
        println!("  - {}", id);
    }

    if descendants.is_empty() {
        println!();
        println!("{}", "✓ No structural descendants".green());
    }

    print_footer();

    Ok(())
}

/// Lint command - report malformed snapshot structure
fn lint_command(config: &Config, snapshot: &Path, output: Option<&Path>, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("{} {}", "Loading snapshot from:".cyan(), snapshot.display());
    }

    let mut pipeline = pipescope_graph::PipelineSnapshot::from_file(snapshot)
        .map_err(|e| anyhow::anyhow!("Failed to load snapshot: {}", e))?;
    pipeline.prepare(&config.snapshot);

    let report = SnapshotLinter::report(&pipeline, &config.lint);

    if let Some(path) = output {
        report.save_to_file(path)?;
        if verbose {
            eprintln!("{} {}", "Lint report saved to:".green(), path.display());
        }
    }

    print_lint_summary(&report);

    // Exit with error code if there are errors
    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_lint_summary(report: &LintReport) {
    print_banner("Snapshot Lint Report");

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("{}", "Summary:".bold());
    println!(
        "  Checked {} nodes, {} edges",
        report.summary.nodes_checked, report.summary.edges_checked
    );
    println!("  Total diagnostics: {}", report.summary.total);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }

    println!("  Info:     {}", report.summary.info);
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

            if !diag.related.is_empty() {
                println!("    related: {}", diag.related.join(", "));
            }
        }
    }

    print_footer();
}
