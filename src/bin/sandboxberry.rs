//! # Sandboxberry CLI
//!
//! Validate manifests, preview the queries a run would issue, rehearse a full migration
//! against an in-memory destination, and write starter manifests.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sandboxberry::client::{InMemoryOrg, StaticUserRemapSource, UserRemap};
use sandboxberry::config::ConfigManager;
use sandboxberry::logging::init_structured_logging;
use sandboxberry::manifest::Manifest;
use sandboxberry::orchestration::{DependencyGraph, MigrationOrchestrator};
use sandboxberry::query_builder::build_query;

#[derive(Parser)]
#[command(name = "sandboxberry")]
#[command(about = "Copy related records between organizations")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (YAML); SANDBOXBERRY__* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write structured JSON logs under ./log in addition to the console
    #[arg(long, global = true)]
    structured_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a manifest and the configuration, then print the processing order
    Validate {
        manifest: PathBuf,
    },

    /// Print the query each object type would run
    Plan {
        manifest: PathBuf,
    },

    /// Run a full migration from a JSON snapshot into an in-memory destination
    Rehearse {
        manifest: PathBuf,

        /// JSON array of source records
        #[arg(short, long)]
        snapshot: PathBuf,

        /// JSON document with inactive/missing users and known user mappings
        #[arg(short, long)]
        users: Option<PathBuf>,

        /// Destination user id used when no fallback user is configured
        #[arg(long)]
        current_user: Option<String>,

        /// Exit with status 2 when the run has failures or orphans
        #[arg(long)]
        strict: bool,
    },

    /// Write a starter manifest listing the given object types
    InitManifest {
        /// Output file (.yaml, .yml or .json)
        output: PathBuf,

        #[arg(required = true)]
        objects: Vec<String>,
    },
}

fn init_logging(cli: &Cli) {
    if cli.structured_logs {
        init_structured_logging();
        return;
    }

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already installed");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    match execute(&cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

async fn execute(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Validate { manifest } => validate(cli, manifest),
        Commands::Plan { manifest } => plan(cli, manifest),
        Commands::Rehearse {
            manifest,
            snapshot,
            users,
            current_user,
            strict,
        } => {
            rehearse(
                cli,
                manifest,
                snapshot,
                users.as_deref(),
                current_user.as_deref(),
                *strict,
            )
            .await
        }
        Commands::InitManifest { output, objects } => init_manifest(output, objects),
    }
}

fn load_config(cli: &Cli) -> Result<Arc<ConfigManager>> {
    ConfigManager::load(cli.config.as_deref()).context("failed to load configuration")
}

fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::load_from_file(path)
        .with_context(|| format!("failed to load manifest {}", path.display()))
}

fn validate(cli: &Cli, manifest_path: &Path) -> Result<i32> {
    let config = load_config(cli)?;
    let manifest = load_manifest(manifest_path)?;
    let plan = DependencyGraph::from_manifest(&manifest).plan();

    println!(
        "Manifest {} is valid ({} object types, environment {})",
        manifest_path.display(),
        manifest.objects.len(),
        config.environment()
    );
    for (index, level) in plan.levels.iter().enumerate() {
        println!("  level {}: {}", index + 1, level.join(", "));
    }
    if !plan.cycle_breaks.is_empty() {
        println!(
            "  cycles broken at: {} (references resolved by patching)",
            plan.cycle_breaks.join(", ")
        );
    }
    Ok(0)
}

fn plan(cli: &Cli, manifest_path: &Path) -> Result<i32> {
    let config = load_config(cli)?;
    let manifest = load_manifest(manifest_path)?;
    let default_row_limit = config.config().migration.default_row_limit;

    for name in DependencyGraph::from_manifest(&manifest).plan().order() {
        let Some(object) = manifest.object(name) else {
            continue;
        };
        let query = build_query(
            &object.api_name,
            &object.queryable_columns(),
            object.filter.as_deref(),
            object.row_limit.or(default_row_limit),
        )?;
        println!("{query}");
    }
    Ok(0)
}

async fn rehearse(
    cli: &Cli,
    manifest_path: &Path,
    snapshot: &Path,
    users: Option<&Path>,
    current_user: Option<&str>,
    strict: bool,
) -> Result<i32> {
    let config = load_config(cli)?;
    let manifest = load_manifest(manifest_path)?;

    let source = InMemoryOrg::from_snapshot_file("source", snapshot)
        .with_context(|| format!("failed to read snapshot {}", snapshot.display()))?;
    let mut destination = InMemoryOrg::new("destination");
    if let Some(user_id) = current_user {
        destination = destination.with_current_user(user_id);
    }

    let mut orchestrator =
        MigrationOrchestrator::new(Arc::new(source), Arc::new(destination), config);
    if let Some(path) = users {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read users file {}", path.display()))?;
        let remap: UserRemap = serde_json::from_str(&content)
            .with_context(|| format!("invalid users file {}", path.display()))?;
        orchestrator = orchestrator.with_user_remap_source(Arc::new(StaticUserRemapSource::new(remap)));
    }

    let report = orchestrator.run(&manifest).await?;
    info!(run_id = %report.run_id, "Rehearsal finished");
    println!("{}", report.to_json_pretty()?);

    Ok(if strict && !report.is_clean() { 2 } else { 0 })
}

fn init_manifest(output: &Path, objects: &[String]) -> Result<i32> {
    let manifest = Manifest::starter(objects);
    manifest
        .save_to_file(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Wrote starter manifest with {} object types to {}",
        objects.len(),
        output.display()
    );
    Ok(0)
}
