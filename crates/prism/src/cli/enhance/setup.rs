//! Assembles the orchestrator from config and flags.

use std::path::PathBuf;
use std::sync::Arc;

use prism_core::analysis::VisionProviderFactory;
use prism_core::engine::ConfigPlanner;
use prism_core::storage::{
    BlobStore, FsBlobStore, FsRecordStore, MemoryBlobStore, MemoryRecordStore, RecordStore,
};
use prism_core::{
    AnalysisCache, Config, ContentAnalyzer, EnhancementEngine, Intensity, LocalAnalyzer,
    Orchestrator, OrchestratorSettings, ReportFormat, StaticAnalyzer, VisionAnalyzer,
};

use super::EnhanceArgs;

/// Everything the batch run needs.
pub(crate) struct EnhanceContext {
    pub orchestrator: Orchestrator,
    pub parallel: usize,
    pub report: Option<PathBuf>,
    pub report_format: ReportFormat,
    pub pretty: bool,
    pub output_dir: PathBuf,
}

pub fn build_context(args: &EnhanceArgs, config: Config) -> anyhow::Result<EnhanceContext> {
    let analyzer = build_analyzer(args, &config)?;
    tracing::info!("Analyzer: {}", analyzer.name());

    let engine = EnhancementEngine::from_config(&config);
    let planner = build_planner(args, &config, &engine)?;

    let output_dir = PathBuf::from(shellexpand::tilde(&args.output.to_string_lossy()).into_owned());
    std::fs::create_dir_all(&output_dir)?;
    let outputs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&output_dir));

    let (records, originals): (Arc<dyn RecordStore>, Arc<dyn BlobStore>) = if args.resume {
        let state_dir = config.state_dir();
        tracing::info!("Resumable run, state in {:?}", state_dir);
        (
            Arc::new(FsRecordStore::new(state_dir.join("records"))),
            Arc::new(FsBlobStore::new(state_dir)),
        )
    } else {
        (Arc::new(MemoryRecordStore::new()), Arc::new(MemoryBlobStore::new()))
    };

    let orchestrator = Orchestrator::new(records, outputs, analyzer, engine)
        .with_original_store(originals)
        .with_planner(planner)
        .with_settings(OrchestratorSettings::from_config(&config))
        .with_cache(AnalysisCache::from_config(&config.cache).map(Arc::new));

    let report_format: ReportFormat = match args.format {
        Some(format) => format.into(),
        None => config.output.format.parse()?,
    };

    Ok(EnhanceContext {
        orchestrator,
        parallel: args.parallel.unwrap_or(config.processing.parallel_workers).max(1),
        report: args.report.clone(),
        report_format,
        pretty: config.output.pretty,
        output_dir,
    })
}

/// `--analysis` file, then `--provider`, then local metrics.
fn build_analyzer(args: &EnhanceArgs, config: &Config) -> anyhow::Result<Arc<dyn ContentAnalyzer>> {
    if let Some(path) = &args.analysis {
        return Ok(Arc::new(StaticAnalyzer::from_file(path)?));
    }
    if let Some(provider) = args.provider {
        let provider = VisionProviderFactory::create(
            &provider.to_string(),
            &config.analysis,
            args.model.as_deref(),
        )?;
        return Ok(Arc::new(VisionAnalyzer::new(provider)));
    }
    Ok(Arc::new(LocalAnalyzer::default()))
}

/// A `--preset` without `--intensity` uses `[enhancement] default_intensity`.
fn build_planner(
    args: &EnhanceArgs,
    config: &Config,
    engine: &EnhancementEngine,
) -> anyhow::Result<ConfigPlanner> {
    let intensity: Option<Intensity> = match (args.intensity, &args.preset) {
        (Some(intensity), _) => Some(intensity.into()),
        (None, Some(_)) => Some(config.enhancement.default_intensity),
        (None, None) => None,
    };
    Ok(ConfigPlanner::new(*engine.catalog()).with_style(args.preset.as_deref(), intensity)?)
}
