//! The `prism quality` command: metrics for one image, or a before/after
//! comparison for two.

use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use prism_core::engine::{BitmapCodec, ImageCodec};
use prism_core::{quality, Config, PixelBuffer};

#[derive(Args, Debug)]
pub struct QualityArgs {
    /// Image to score (the "before" image when AFTER is given)
    pub before: PathBuf,

    /// Enhanced image to compare against BEFORE
    pub after: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pub pretty: bool,
}

pub async fn execute(args: QualityArgs, config: &Config) -> anyhow::Result<()> {
    let codec = Arc::new(ImageCodec::new(
        config.limits.max_image_dimension,
        config.enhancement.jpeg_quality,
    ));
    let timeout = Duration::from_millis(config.limits.decode_timeout_ms);

    let before = decode(&codec, &args.before, timeout).await?;
    let value = match &args.after {
        Some(after) => {
            let after = decode(&codec, after, timeout).await?;
            if (before.width, before.height) != (after.width, after.height) {
                tracing::warn!(
                    "Comparing images of different sizes ({}x{} vs {}x{})",
                    before.width,
                    before.height,
                    after.width,
                    after.height
                );
            }
            serde_json::to_value(quality::compare_buffers(&before, &after))?
        }
        None => serde_json::to_value(quality::analyze(&before))?,
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{json}");
    Ok(())
}

/// Decode on a blocking thread, bounded by `timeout`.
async fn decode(codec: &Arc<ImageCodec>, path: &Path, timeout: Duration) -> anyhow::Result<PixelBuffer> {
    let bytes = tokio::fs::read(path).await?;
    let codec = codec.clone();
    let task = tokio::task::spawn_blocking(move || codec.decode(&bytes));
    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => Ok(joined??.buffer),
        Err(_) => anyhow::bail!(
            "Decoding {:?} timed out after {}ms",
            path,
            timeout.as_millis()
        ),
    }
}
