//! Batch run: submit discovered files, drive them with a progress bar,
//! then write the report and a summary.

use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use prism_core::discovery::Discovery;
use prism_core::orchestrator::DriveOutcome;
use prism_core::{ImageId, ImageRecord, ImageStatus, ReportWriter};

use super::setup::EnhanceContext;

/// One report entry per input file.
#[derive(Debug, Serialize)]
pub struct ReportLine {
    pub id: String,
    pub source: PathBuf,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_before: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_after: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportLine {
    fn failed(id: &ImageId, source: &Path, error: impl std::fmt::Display) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_path_buf(),
            status: ImageStatus::Failed.to_string(),
            output: None,
            preset_id: None,
            style: None,
            image_type: None,
            quality_before: None,
            quality_after: None,
            degradations: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    fn from_record(record: &ImageRecord, source: &Path, output_dir: &Path) -> Self {
        Self {
            id: record.id.to_string(),
            source: source.to_path_buf(),
            status: record.status.to_string(),
            output: record.processed.as_ref().map(|loc| output_dir.join(&loc.0)),
            preset_id: record.enhancement.as_ref().and_then(|e| e.preset_id.clone()),
            style: record.editing_config.as_ref().map(|c| c.style.clone()),
            image_type: record.analysis.as_ref().map(|a| a.image_type.clone()),
            quality_before: record.quality.as_ref().map(|q| q.before.overall()),
            quality_after: record.quality.as_ref().map(|q| q.after.overall()),
            degradations: record
                .quality
                .as_ref()
                .map(|q| q.degradations.clone())
                .unwrap_or_default(),
            error: record.error.clone(),
        }
    }

    fn from_outcome(outcome: &DriveOutcome, source: &Path, output_dir: &Path) -> Self {
        match &outcome.result {
            Ok(record) => Self::from_record(record, source, output_dir),
            Err(e) => Self::failed(&outcome.id, source, e),
        }
    }

    fn succeeded(&self) -> bool {
        self.status == ImageStatus::Processed.as_str()
    }
}

pub async fn run(ctx: EnhanceContext, discovery: Discovery) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let sources: HashMap<ImageId, PathBuf> = discovery
        .files
        .iter()
        .map(|f| (f.id.clone(), f.path.clone()))
        .collect();

    let mut lines = Vec::with_capacity(discovery.files.len());
    let mut ids = Vec::with_capacity(discovery.files.len());
    let mut total_bytes = 0u64;
    for file in &discovery.files {
        let submitted = match tokio::fs::read(&file.path).await {
            Ok(bytes) => ctx
                .orchestrator
                .submit(file.id.clone(), &bytes)
                .await
                .map_err(anyhow::Error::from),
            Err(e) => Err(e.into()),
        };
        match submitted {
            Ok(_) => {
                total_bytes += file.size;
                ids.push(file.id.clone());
            }
            Err(e) => {
                tracing::error!("Failed to submit {:?}: {e}", file.path);
                lines.push(ReportLine::failed(&file.id, &file.path, e));
            }
        }
    }

    let progress = create_progress_bar(ids.len() as u64);
    let bar = progress.clone();
    let outcomes = ctx
        .orchestrator
        .drive_all(ids, ctx.parallel, move |outcome| {
            bar.inc(1);
            let elapsed = start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                bar.set_message(format!("{:.1} img/sec", bar.position() as f64 / elapsed));
            }
            if let Some(ImageStatus::Failed) = outcome.status() {
                tracing::warn!("{} failed", outcome.id);
            }
        })
        .await;
    progress.finish_and_clear();

    for outcome in &outcomes {
        let source = sources.get(&outcome.id).map(PathBuf::as_path).unwrap_or(Path::new(""));
        lines.push(ReportLine::from_outcome(outcome, source, &ctx.output_dir));
    }
    lines.sort_by(|a, b| a.source.cmp(&b.source));

    match &ctx.report {
        Some(path) => {
            let file = BufWriter::new(File::create(path)?);
            write_report(file, &ctx, &lines)?;
            tracing::info!("Report written to {:?}", path);
        }
        None => write_report(std::io::stdout().lock(), &ctx, &lines)?,
    }

    let succeeded = lines.iter().filter(|l| l.succeeded()).count() as u64;
    print_summary(
        succeeded,
        lines.len() as u64 - succeeded,
        discovery.skipped.len() as u64,
        total_bytes,
        start_time.elapsed(),
    );
    Ok(())
}

fn write_report<W: Write>(writer: W, ctx: &EnhanceContext, lines: &[ReportLine]) -> anyhow::Result<()> {
    let mut report = ReportWriter::new(writer, ctx.report_format, ctx.pretty);
    for line in lines {
        report.push(line)?;
    }
    report.finish()?;
    Ok(())
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

fn print_summary(succeeded: u64, failed: u64, skipped: u64, total_bytes: u64, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 { succeeded as f64 / secs } else { 0.0 };
    let throughput = if secs > 0.0 {
        total_bytes as f64 / 1_000_000.0 / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Enhanced:     {:>8}", succeeded);
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    if skipped > 0 {
        eprintln!("    Skipped:      {:>8}", skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", succeeded + failed + skipped);
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("    Throughput:   {:>7.1} MB/sec", throughput);
    eprintln!("  ====================================");
}
