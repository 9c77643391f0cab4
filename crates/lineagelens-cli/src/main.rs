use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lineagelens_core::{LayoutConfig, Severity, ViewReport};
use lineagelens_graph::GraphInput;
use lineagelens_view::{load_graph, TransitionOutcome, TransitionRequest, ViewState};

/// LineageLens - Column-level lineage diagrams for dbt projects
#[derive(Parser)]
#[command(name = "lineagelens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: lineagelens.toml)
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
    /// Lay out a graph and write the view report
    Layout {
        /// Graph JSON produced by the lineage loader
        graph: PathBuf,

        /// Output file for view.json
        #[arg(short, long, default_value = "view.json")]
        output: PathBuf,

        /// Reveal every entity instead of the focus neighborhood
        #[arg(long)]
        all: bool,
    },

    /// Print entities grouped by layer
    Levels {
        graph: PathBuf,
    },

    /// Show upstream and downstream lineage of a column
    Lineage {
        graph: PathBuf,

        /// Column id (e.g., orders.customer_id)
        column: String,
    },

    /// Show what a change to a column would reach
    Impact {
        graph: PathBuf,

        /// Column id (e.g., orders.customer_id)
        column: String,
    },

    /// Replay expand/collapse steps and print the resulting view
    Explore {
        graph: PathBuf,

        /// Step such as expand-down:orders, collapse-up:customers
        #[arg(short, long = "step")]
        steps: Vec<Step>,

        /// Also write the view report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// One visibility transition given on the command line
#[derive(Debug, Clone)]
struct Step(TransitionRequest);

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, entity) = s
            .split_once(':')
            .ok_or_else(|| format!("expected ACTION:ENTITY, got '{}'", s))?;

        let request = match action {
            "expand-down" => TransitionRequest::expand_downstream(entity),
            "expand-up" => TransitionRequest::expand_upstream(entity),
            "collapse-down" => TransitionRequest::collapse_downstream(entity),
            "collapse-up" => TransitionRequest::collapse_upstream(entity),
            other => {
                return Err(format!(
                    "unknown action '{}' (expand-down, expand-up, collapse-down, collapse-up)",
                    other
                ))
            }
        };

        Ok(Step(request))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        LayoutConfig::from_file(config_path)?
    } else if Path::new("lineagelens.toml").exists() {
        LayoutConfig::from_file(Path::new("lineagelens.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        LayoutConfig::default()
    };

    match cli.command {
        Commands::Layout { graph, output, all } => layout_command(config, &graph, &output, all, cli.verbose),
        Commands::Levels { graph } => levels_command(config, &graph),
        Commands::Lineage { graph, column } => lineage_command(config, &graph, &column),
        Commands::Impact { graph, column } => impact_command(config, &graph, &column),
        Commands::Explore { graph, steps, output } => {
            explore_command(config, &graph, &steps, output.as_deref(), cli.verbose)
        }
    }
}

fn load(config: LayoutConfig, graph: &Path) -> Result<ViewState> {
    debug!(path = %graph.display(), "loading graph");
    let input = GraphInput::from_file(graph)
        .with_context(|| format!("Failed to load graph from {}", graph.display()))?;

    Ok(load_graph(&input, config))
}

/// Layout command - write view.json for the initial (or full) view
fn layout_command(config: LayoutConfig, graph: &Path, output: &Path, all: bool, verbose: bool) -> Result<()> {
    let mut state = load(config, graph)?;
    if all {
        state.show_all();
    }

    let report = state.report();
    report.save_to_file(output)?;

    if verbose {
        eprintln!("{} {}", "View saved to:".green(), output.display());
    }

    print_view_summary(&report);
    Ok(())
}

/// Levels command - entities grouped by topological layer
fn levels_command(config: LayoutConfig, graph: &Path) -> Result<()> {
    let state = load(config, graph)?;
    let entities = state.index().entities();

    print_banner("Entity Layers");

    let Some(max_layer) = state.leveling().max_layer() else {
        println!("{}", "No entities in graph".yellow());
        return Ok(());
    };

    for layer in 0..=max_layer {
        let names: Vec<String> = entities
            .iter()
            .filter(|e| e.layer == layer)
            .map(|e| {
                let name = if state.leveling().is_reached(&e.name) {
                    e.name.normal()
                } else {
                    e.name.dimmed()
                };
                if state.index().focus_entity() == Some(e.name.as_str()) {
                    name.bold().green().to_string()
                } else {
                    name.to_string()
                }
            })
            .collect();

        if !names.is_empty() {
            println!("  {} {}", format!("{:>3}", layer).cyan(), names.join(", "));
        }
    }

    println!();
    Ok(())
}

/// Lineage command - upstream and downstream closures of a column
fn lineage_command(config: LayoutConfig, graph: &Path, column: &str) -> Result<()> {
    let state = load(config, graph)?;

    let upstream = state.get_upstream(column);
    if upstream.is_empty() {
        anyhow::bail!("Column '{}' not found in graph", column);
    }
    let downstream = state.get_downstream(column);

    print_banner("Column Lineage");
    println!("{} {}", "Column:".bold(), column.green());
    println!();

    println!("{} ({})", "Upstream:".bold(), upstream.len() - 1);
    for id in upstream.iter().filter(|id| id.as_str() != column) {
        println!("  {}", id.cyan());
    }
    println!();

    println!("{} ({})", "Downstream:".bold(), downstream.len() - 1);
    for id in downstream.iter().filter(|id| id.as_str() != column) {
        println!("  {}", id.yellow());
    }
    println!();

    Ok(())
}

/// Impact command - blast radius of changing a column
fn impact_command(config: LayoutConfig, graph: &Path, column: &str) -> Result<()> {
    let state = load(config, graph)?;
    let impact = state
        .impact_summary(column)
        .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in graph", column))?;

    print_banner("Downstream Impact Analysis");
    println!("{} {} ({})", "Column:".bold(), impact.column_id.green(), impact.entity);
    println!("{} {}", "Downstream columns:".bold(), impact.downstream_columns);
    println!();

    if impact.is_isolated() {
        println!("{}", "✓ No downstream dependencies".green());
        println!("This column can be modified without affecting other models.");
    } else {
        if !impact.affected_models.is_empty() {
            println!("{}", "Affected models:".bold());
            for model in &impact.affected_models {
                println!("  - {}", model.yellow());
            }
            println!();
        }
        if !impact.affected_exposures.is_empty() {
            println!("{}", "Affected exposures:".bold());
            for exposure in &impact.affected_exposures {
                println!("  - {}", exposure.red());
            }
            println!();
        }
        println!("{}", "⚠ Changes to this column may break downstream consumers!".yellow().bold());
    }

    println!();
    Ok(())
}

/// Explore command - replay visibility transitions
fn explore_command(
    config: LayoutConfig,
    graph: &Path,
    steps: &[Step],
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let mut state = load(config, graph)?;

    for Step(request) in steps {
        let label = format!("{:?} {} {}", request.action, request.direction, request.entity);
        match state.transition(request.clone()) {
            TransitionOutcome::Applied { shown, hidden } => {
                println!("{} {}", "✓".green(), label);
                for name in shown {
                    println!("    + {}", name.green());
                }
                for name in hidden {
                    println!("    - {}", name.red());
                }
            }
            TransitionOutcome::NoOp => println!("{} {} (nothing to do)", "·".dimmed(), label),
            TransitionOutcome::Rejected => println!("{} {} (rejected)", "✗".red(), label),
        }
    }

    let report = state.report();
    if let Some(path) = output {
        report.save_to_file(path)?;
        if verbose {
            eprintln!("{} {}", "View saved to:".green(), path.display());
        }
    }

    print_view_summary(&report);
    Ok(())
}

fn print_banner(title: &str) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", title.bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();
}

fn print_view_summary(report: &ViewReport) {
    print_banner("Lineage View");

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("{}", "Summary:".bold());
    println!(
        "  Entities: {} of {} visible",
        report.summary.visible_entities, report.summary.total_entities
    );
    println!("  Edges:    {}", report.summary.visible_edges);
    println!("  Layers:   {}", report.summary.visible_layers);
    println!();

    for entity in &report.view.entities {
        println!(
            "  {:<30} {:>8.1} {:>8.1}  {}",
            entity.name,
            entity.x,
            entity.y,
            entity.resource_type.dimmed()
        );
    }
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            println!("  [{}] {}: {}", severity_str, diag.code, diag.message);
        }
    }

    println!();
}
