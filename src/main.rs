//! Flowboard command line
//!
//! Loads a workflow JSON file, applies an edit or computes its layout, and
//! prints the result as JSON on stdout. Logs go to stderr (`RUST_LOG`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowboard::config::Config;
use flowboard::editor::Editor;
use flowboard::graph::Direction;
use flowboard::workflow::{load_workflow, save_workflow, ActionCatalogue};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flowboard", version, about = "Workflow graph synthesis and auto-layout")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the laid-out graph of a workflow
    Layout {
        /// Workflow JSON file
        file: PathBuf,
        /// Flow direction: down or right
        #[arg(long, env = "FLOWBOARD_DIRECTION")]
        direction: Option<Direction>,
    },
    /// Append an action from the built-in catalogue
    Append {
        file: PathBuf,
        /// Catalogue kind (email, delay, agent)
        #[arg(long)]
        kind: String,
        /// Insert after this action instead of at the end
        #[arg(long)]
        after: Option<String>,
    },
    /// Delete an action and the edges referencing it
    Delete {
        file: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Change the workflow name and/or description
    Rename {
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List the built-in action catalogue
    Catalogue,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flowboard=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::default();

    match cli.command {
        Commands::Layout { file, direction } => {
            let direction = direction.unwrap_or(config.layout.direction);
            let editor = open(&file, &config)?;
            let graph = editor.graph(direction);
            tracing::info!("📐 Laid out '{}' ({}): {} nodes, {} edges",
                editor.workflow().id, direction, graph.nodes.len(), graph.edges.len());
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }
        Commands::Append { file, kind, after } => {
            let mut editor = open(&file, &config)?;
            let entry = editor
                .available_actions()
                .get(&kind)
                .cloned()
                .with_context(|| format!("'{}' is not in the action catalogue", kind))?;
            let id = editor.append_action(&entry, after.as_deref(), None)?;
            save(&file, &editor)?;
            println!("{}", id);
        }
        Commands::Delete { file, id } => {
            let mut editor = open(&file, &config)?;
            if editor.delete_action(&id) {
                save(&file, &editor)?;
            } else {
                tracing::info!("Nothing to delete: no action '{}'", id);
            }
        }
        Commands::Rename { file, name, description } => {
            let mut editor = open(&file, &config)?;
            if let Some(name) = name {
                editor.set_name(name);
            }
            if let Some(description) = description {
                editor.set_description(description);
            }
            save(&file, &editor)?;
        }
        Commands::Catalogue => {
            println!("{}", serde_json::to_string_pretty(&ActionCatalogue::builtin())?);
        }
    }

    Ok(())
}

fn open(file: &Path, config: &Config) -> Result<Editor> {
    let workflow = load_workflow(file)
        .with_context(|| format!("Failed to load workflow from {}", file.display()))?;
    Ok(Editor::new(workflow, ActionCatalogue::builtin(), config))
}

fn save(file: &Path, editor: &Editor) -> Result<()> {
    save_workflow(file, editor.workflow())
        .with_context(|| format!("Failed to save workflow to {}", file.display()))
}
