//! # ScienceSource CLI Module
//!
//! ## Available Commands
//!
//! - `labels` - List the labels the record schemas use
//! - `resolve` - Resolve labels against the wiki
//! - `upload` - Push an article graph, saving it after each stage
//! - `status` - Show the stage and record-level progress of an article

mod commands;

use clap::{Parser, Subcommand};
use sciencesource::Config;
use sciencesource_core::SyncError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// ScienceSource uploader
///
/// Pushes annotated scientific articles to a ScienceSource Wikibase
/// instance as linked annotation, anchor point and article items.
#[derive(Parser, Debug)]
#[command(name = "sciencesource")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List property and item labels used by the record schemas
    Labels,

    /// Resolve every label to its id on the wiki
    Resolve {
        /// Write the resolved vocabulary to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload an article graph, resuming from its recorded stage
    Upload {
        /// Article graph (JSON), rewritten after each stage
        #[arg(short, long)]
        article: PathBuf,

        /// Article text (HTML); needed while the article is unsubmitted
        #[arg(short = 't', long)]
        content: Option<PathBuf>,

        /// Previously resolved vocabulary instead of resolving again
        #[arg(short = 'V', long)]
        vocabulary: Option<PathBuf>,

        /// Advance a single stage and stop
        #[arg(short, long)]
        step: bool,
    },

    /// Show stage and progress of an article graph
    Status {
        /// Article graph (JSON)
        #[arg(short, long)]
        article: PathBuf,

        /// Resolved vocabulary, used to verify the anchor chain
        #[arg(short = 'V', long)]
        vocabulary: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), SyncError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Labels => cmd_labels(json_mode),
        Commands::Resolve { output } => {
            let config = Config::load(cli.config.as_deref())?;
            cmd_resolve(&config, json_mode, output.as_deref())
        }
        Commands::Upload {
            article,
            content,
            vocabulary,
            step,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            cmd_upload(
                &config,
                json_mode,
                &article,
                content.as_deref(),
                vocabulary.as_deref(),
                step,
            )
        }
        Commands::Status {
            article,
            vocabulary,
        } => cmd_status(json_mode, &article, vocabulary.as_deref()),
    }
}
