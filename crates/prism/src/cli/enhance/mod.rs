//! The `prism enhance` command.

mod batch;
mod setup;
pub mod types;

pub use types::{IntensityArg, ProviderArg, ReportFormatArg};

use clap::Args;
use prism_core::{Config, FileDiscovery};
use std::path::PathBuf;

/// Arguments for the `enhance` command.
#[derive(Args, Debug)]
pub struct EnhanceArgs {
    /// Image file or directory to enhance
    #[arg(required = true)]
    pub input: PathBuf,

    /// Directory for enhanced images
    #[arg(short, long, default_value = "./enhanced")]
    pub output: PathBuf,

    /// Apply this preset instead of the content-selected one
    #[arg(long)]
    pub preset: Option<String>,

    /// Preset strength
    #[arg(long, value_enum)]
    pub intensity: Option<IntensityArg>,

    /// Use a fixed analysis JSON file for every image
    #[arg(long, conflicts_with = "provider")]
    pub analysis: Option<PathBuf>,

    /// Analyze images with a vision model (default: local metrics)
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Vision model name (provider-specific)
    #[arg(long, requires = "provider")]
    pub model: Option<String>,

    /// Images processed concurrently (default: [processing] parallel_workers)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Write the report here instead of stdout
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format (default: [output] format)
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormatArg>,

    /// Keep records and originals under the state dir so a rerun resumes
    #[arg(long)]
    pub resume: bool,
}

pub async fn execute(args: EnhanceArgs, config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }

    let discovery = FileDiscovery::new(&config.processing, &config.limits).discover(&args.input);
    if discovery.files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!(
        "Found {} image(s) to enhance ({:.1} MB)",
        discovery.files.len(),
        discovery.total_size() as f64 / 1_000_000.0
    );

    let ctx = setup::build_context(&args, config)?;
    batch::run(ctx, discovery).await
}
