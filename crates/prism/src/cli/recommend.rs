//! The `prism recommend` command: what the planner makes of an analysis.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use prism_core::catalog::select_aesthetic_for_content;
use prism_core::engine::{resolve_config, ConfigPlanner};
use prism_core::{
    AestheticCatalog, AnalysisResult, EditingConfig, FilterRecommendation, StaticAnalyzer,
    TransformOptions,
};

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// AnalysisResult JSON file
    pub analysis: PathBuf,

    /// Maximum filter recommendations to show
    #[arg(short, long, default_value = "8")]
    pub limit: usize,

    /// Pretty-print the JSON
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Serialize)]
struct Recommendation {
    preset_id: &'static str,
    preset_name: &'static str,
    vibe: &'static str,
    filters: Vec<FilterRecommendation>,
    config: EditingConfig,
    /// Options the config resolves to, `None` if it does not resolve
    options: Option<TransformOptions>,
}

fn recommend(analysis: &AnalysisResult, limit: usize) -> Recommendation {
    let catalog = AestheticCatalog::builtin();
    let preset_id = select_aesthetic_for_content(
        &analysis.image_type,
        &analysis.mood,
        &analysis.detected_objects,
    );
    let preset = catalog.preset(preset_id).or_else(|| catalog.default_preset());

    let mut filters = prism_core::recommend_filters(analysis);
    filters.truncate(limit);

    let config = ConfigPlanner::new(catalog).plan_or_default(analysis);
    let options = match resolve_config(&catalog, &config) {
        Ok(options) => Some(options),
        Err(e) => {
            tracing::warn!("Planned config does not resolve: {e}");
            None
        }
    };

    Recommendation {
        preset_id: preset.map_or(preset_id, |p| p.id),
        preset_name: preset.map_or("", |p| p.display_name),
        vibe: preset.map_or("", |p| p.vibe_tag),
        filters,
        config,
        options,
    }
}

pub fn execute(args: RecommendArgs) -> anyhow::Result<()> {
    let analyzer = StaticAnalyzer::from_file(&args.analysis)?;
    let rec = recommend(analyzer.result(), args.limit);
    let json = if args.pretty {
        serde_json::to_string_pretty(&rec)?
    } else {
        serde_json::to_string(&rec)?
    };
    println!("{json}");
    Ok(())
}
