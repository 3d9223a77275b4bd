//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate UML diagrams from C and C++ codebases
#[derive(Parser, Debug)]
#[command(name = "draughtsman")]
#[command(about = "Generate UML diagrams from C and C++ codebases")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the diagrams defined in the configuration
    Generate {
        /// Config file path
        #[arg(short, long, default_value = "draughtsman.toml")]
        config: PathBuf,

        /// Diagram names to generate (all when omitted, can be repeated)
        #[arg(short = 'n', long = "name")]
        names: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output dialect (plantuml, mermaid, json, graphml)
        #[arg(short, long, default_value = "plantuml")]
        generator: String,

        /// Worker pool size (defaults to hardware concurrency)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Produce empty artifacts instead of failing on empty diagrams
        #[arg(long)]
        allow_empty_diagrams: bool,

        /// Skip the metadata block in generated artifacts
        #[arg(long)]
        no_metadata: bool,

        /// Emit logs as JSON
        #[arg(long)]
        log_json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a starter configuration file
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show version information
    Version,
}
