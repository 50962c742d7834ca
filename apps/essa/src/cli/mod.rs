//! # ESSA CLI Module
//!
//! This module implements the CLI interface for ESSA. Every command works
//! on one project snapshot file (`--project`).
//!
//! ## Available Commands
//!
//! - `new` - Start a new assessment
//! - `status` - Show wizard progress
//! - `trl` - Show the TRL table or select a level (step 1)
//! - `stages` - Edit and scope lifecycle stages (step 2)
//! - `factors` - Select factors (step 3)
//! - `score` / `unscore` - Fill the scoring grid (step 4)
//! - `grid` - Show the scoring grid
//! - `results` - Show results (step 5)
//! - `export` - Write the results table as CSV or JSON
//! - `verify` - Check an exported table
//! - `import` - Rebuild a project from an exported table
//! - `step` - Move the wizard
//! - `catalog` - Show the reference tables
//! - `hash` - Checksum and BLAKE3 hash of the results table
//! - `server` - Start the HTTP server

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use essa_core::EssaError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// ESSA - Early-Stage Sustainability Assessment
///
/// A guided questionnaire that scores how a new material changes the
/// environmental, social and economic impact of each lifecycle stage.
#[derive(Parser, Debug)]
#[command(name = "essa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the project snapshot (".json" extension saves as JSON)
    #[arg(short = 'P', long, global = true, default_value = "essa-project.essa")]
    pub project: PathBuf,

    /// Path to the TOML config file (default: essa.toml if present)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new assessment
    New {
        /// Project name
        name: String,

        /// Short description
        #[arg(short, long)]
        description: Option<String>,

        /// Overwrite an existing project file
        #[arg(short, long)]
        force: bool,
    },

    /// Show wizard progress
    Status,

    /// Show the TRL table, or select a level
    Trl {
        /// Level to select (1-9)
        level: Option<u8>,
    },

    /// Edit and scope lifecycle stages
    Stages {
        #[command(subcommand)]
        action: StageCommand,
    },

    /// Select three factors per category
    Factors {
        /// Select the suggested factors in every category
        #[arg(long)]
        defaults: bool,

        /// Category to select (environmental, social, economic)
        #[arg(short, long)]
        category: Option<String>,

        /// Factor name (repeat three times)
        #[arg(short, long = "factor")]
        factors: Vec<String>,
    },

    /// Score a stage/factor pair (1 = Much Better .. 5 = Much Worse)
    Score {
        stage: String,
        factor: String,
        score: u8,

        /// Justification for the score
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// Remove the score of a stage/factor pair
    Unscore { stage: String, factor: String },

    /// Show the scoring grid
    Grid,

    /// Show averages, worst stage and overall score
    Results,

    /// Export the results table
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (csv, json)
        #[arg(short = 't', long, default_value = "csv")]
        format: String,
    },

    /// Check that an exported table is internally consistent
    Verify {
        /// Input file path (CSV or JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Rebuild a project from an exported table
    Import {
        /// Input file path (CSV or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Overwrite an existing project file
        #[arg(short, long)]
        force: bool,
    },

    /// Move the wizard
    Step {
        #[command(subcommand)]
        direction: StepCommand,
    },

    /// Show the reference tables
    Catalog {
        /// Only list factors of this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Compute checksum and BLAKE3 hash of the results table
    Hash,

    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Lifecycle stage edits.
#[derive(Subcommand, Debug)]
pub enum StageCommand {
    /// List stages and their scoping
    List,
    /// Append a stage
    Add { name: String },
    /// Rename a stage (its scores follow)
    Rename { from: String, to: String },
    /// Remove a stage and its scores
    Remove { name: String },
    /// Move a stage one position earlier
    Up { name: String },
    /// Restore the default lifecycle
    Reset,
    /// Mark a stage as changed by the new material
    Mark {
        name: String,

        /// Mark as unchanged instead
        #[arg(long)]
        unchanged: bool,

        /// Scoping notes
        #[arg(long)]
        notes: Option<String>,
    },
}

/// Wizard navigation.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum StepCommand {
    Next,
    Back,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), EssaError> {
    let config = Config::load(cli.config.as_deref())?;
    let catalog = config.catalog()?;
    let project = cli.project.as_path();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::New {
            name,
            description,
            force,
        }) => cmd_new(project, &catalog, json_mode, &name, description, force),
        Some(Commands::Status) => cmd_status(project, &catalog, json_mode),
        Some(Commands::Trl { level }) => cmd_trl(project, &catalog, json_mode, level),
        Some(Commands::Stages { action }) => cmd_stages(project, &catalog, json_mode, action),
        Some(Commands::Factors {
            defaults,
            category,
            factors,
        }) => cmd_factors(
            project,
            &catalog,
            json_mode,
            defaults,
            category.as_deref(),
            &factors,
        ),
        Some(Commands::Score {
            stage,
            factor,
            score,
            note,
        }) => cmd_score(project, &catalog, json_mode, &stage, &factor, score, note),
        Some(Commands::Unscore { stage, factor }) => {
            cmd_unscore(project, &catalog, json_mode, &stage, &factor)
        },
        Some(Commands::Grid) => cmd_grid(project, &catalog, json_mode),
        Some(Commands::Results) => cmd_results(project, &catalog, json_mode),
        Some(Commands::Export { output, format }) => {
            cmd_export(project, &catalog, &output, &format)
        },
        Some(Commands::Verify { input }) => cmd_verify(&input, json_mode),
        Some(Commands::Import { input, force }) => cmd_import(project, &catalog, &input, force),
        Some(Commands::Step { direction }) => cmd_step(project, &catalog, json_mode, direction),
        Some(Commands::Catalog { category }) => cmd_catalog(&catalog, json_mode, category.as_deref()),
        Some(Commands::Hash) => cmd_hash(project, &catalog, json_mode),
        Some(Commands::Server { host, port }) => {
            let mut server = config.server;
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            cmd_server(project, catalog, server).await
        }
        None => {
            // No subcommand - show status by default
            cmd_status(project, &catalog, json_mode)
        }
    }
}
