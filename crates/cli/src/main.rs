//! Recall CLI
//!
//! Main entry point for the recall command-line tool.
//! Builds and queries a provenance-aware index over documentation,
//! audit logs, and incident-tracker records.

mod commands;

use clap::{Parser, Subcommand};
use commands::{QueryCommand, RebuildCommand, StatsCommand};
use recall_core::{config::RecallConfig, logging, RecallResult};
use std::path::PathBuf;

/// Recall CLI - retrieval over docs, audit logs, and incidents
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(about = "Retrieval over docs, audit logs, and incidents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RECALL_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RECALL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the index from all configured sources
    Rebuild(RebuildCommand),

    /// Query the index with free text
    Query(QueryCommand),

    /// Show index statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> RecallResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment and config file
    let config = RecallConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Recall CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Embedding: {}/{} ({}d)",
        config.embedding.provider,
        config.embedding.model,
        config.embedding.dimensions
    );

    config.validate()?;
    config.ensure_recall_dir()?;

    let command_name = match &cli.command {
        Commands::Rebuild(_) => "rebuild",
        Commands::Query(_) => "query",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Rebuild(cmd) => cmd.execute(&config).await,
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
