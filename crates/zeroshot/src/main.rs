//! Zeroshot CLI - zero-shot image classification with SigLIP 2.
//!
//! Upload an image, type comma-separated candidate labels, and get an
//! independent score for every label.
//!
//! # Usage
//!
//! ```bash
//! # Download the model files
//! zeroshot models download
//!
//! # Start the web demo on http://127.0.0.1:7860
//! zeroshot serve
//!
//! # Classify a local image from the terminal
//! zeroshot classify cat.png --labels "two sleeping cats, two cats playing"
//!
//! # View configuration
//! zeroshot config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod web;

/// Zeroshot - zero-shot image classification with SigLIP 2.
#[derive(Parser, Debug)]
#[command(name = "zeroshot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "ZEROSHOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web interface
    Serve(cli::serve::ServeArgs),

    /// Classify a single image from the command line
    Classify(cli::classify::ClassifyArgs),

    /// Manage model files (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let loaded = match &cli.config {
        Some(path) => zeroshot_core::Config::load_from(path),
        None => zeroshot_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `zeroshot config path`."
            );
            zeroshot_core::Config::default()
        }
    };

    let debug = matches!(&cli.command, Commands::Serve(args) if args.debug);
    logging::init_from_config(&config, cli.verbose || debug, cli.json_logs);

    tracing::debug!("zeroshot v{}", zeroshot_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Classify(args) => cli::classify::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}
