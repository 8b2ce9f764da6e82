//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// recap - Summarize long transcripts with a local LLM
#[derive(Parser, Debug)]
#[command(name = "recap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a transcript and save the result as JSON
    Summarize {
        /// Transcript file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Source URL recorded in the summary metadata
        #[arg(short, long)]
        url: String,

        /// Directory for the summary file (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,

        /// Skip the model runtime check
        #[arg(long)]
        skip_check: bool,
    },

    /// Parse raw model output into a summary (debug aid)
    Parse {
        /// File with model output (defaults to stdin)
        file: Option<PathBuf>,

        /// Print the parsed summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview how a transcript would be chunked
    Chunks {
        /// Transcript file (defaults to stdin)
        file: Option<PathBuf>,
    },

    /// Check that the model runtime is ready
    Doctor {
        /// Output diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
