//! Prism CLI - content-aware photo enhancement.
//!
//! Prism analyzes each photo (vision model, local metrics, or a supplied
//! analysis file), picks an aesthetic preset, and applies the resulting
//! color transform.
//!
//! # Usage
//!
//! ```bash
//! # Enhance a directory, writing outputs next to a JSONL report
//! prism enhance ./photos -o ./enhanced -f jsonl --report report.jsonl
//!
//! # Use a vision model for analysis
//! prism enhance beach.jpg --provider anthropic
//!
//! # What would the planner do with this analysis?
//! prism recommend analysis.json
//!
//! # Score a before/after pair
//! prism quality before.jpg after.jpg
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Prism - content-aware photo enhancement.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze and enhance images
    Enhance(cli::enhance::EnhanceArgs),

    /// Show the preset, filter recommendations, and editing config for an analysis
    Recommend(cli::recommend::RecommendArgs),

    /// List aesthetic presets and filters
    Presets(cli::presets::PresetsArgs),

    /// Score an image, or compare a before/after pair
    Quality(cli::quality::QualityArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't up yet, so config warnings go through eprintln.
    let config = match prism_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `prism config path`."
            );
            prism_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Prism v{}", prism_core::VERSION);

    match cli.command {
        Commands::Enhance(args) => cli::enhance::execute(args, config).await,
        Commands::Recommend(args) => cli::recommend::execute(args),
        Commands::Presets(args) => cli::presets::execute(args),
        Commands::Quality(args) => cli::quality::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args),
    }
}
