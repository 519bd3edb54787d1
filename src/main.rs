use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cellpress_lib::{commands, VERSION};

#[derive(Parser)]
#[command(name = "cellpress")]
#[command(about = "Compress notebook cells and source files into compact prompt documents")]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a prompt document from files and notebooks
    Pack {
        /// Files or glob patterns, in document order
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Include this file in full instead of compressing it (repeatable)
        #[arg(long)]
        full: Vec<PathBuf>,
        /// Text for the PREAMBLE section
        #[arg(long, env = "CELLPRESS_PREAMBLE")]
        preamble: Option<String>,
        /// Text for the GOAL section
        #[arg(long)]
        goal: Option<String>,
        /// Write the document to a file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Print the skeleton of one file (every code cell for notebooks)
    Skeleton {
        /// File to compress
        file: PathBuf,
    },

    /// Print bucket, hash and signature key per code cell
    Classify {
        /// Files to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show a line diff between two files
    Diff {
        /// Previous version
        old: PathBuf,
        /// Current version
        new: PathBuf,
    },

    /// Record two versions of a cell and print the change payload as JSON
    History {
        /// Previous version
        old: PathBuf,
        /// Current version
        new: PathBuf,
        /// Cell identity to record under (defaults to the new file's path)
        #[arg(long)]
        path: Option<String>,
    },

    /// Show the resolved configuration
    Config {
        /// Write a default .cellpress/config.json
        #[arg(long)]
        init: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CELLPRESS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Pack {
            patterns,
            full,
            preamble,
            goal,
            out,
        } => commands::pack::run(patterns, full, preamble, goal, out),
        Commands::Skeleton { file } => commands::skeleton::run(&file),
        Commands::Classify { files } => commands::classify::run(files),
        Commands::Diff { old, new } => commands::diff::run(&old, &new),
        Commands::History { old, new, path } => commands::history::run(&old, &new, path),
        Commands::Config { init } => commands::config::run(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
