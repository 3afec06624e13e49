//! Resolution of an [`Adjustment`] into one validated `TransformOptions`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{select_aesthetic_for_content, AestheticCatalog, DEFAULT_PRESET_ID};
use crate::color::TransformOptions;
use crate::error::EngineResult;
use crate::types::{AnalysisResult, EditingConfig, EditingStep, Intensity};

/// What to apply to an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adjustment {
    /// Explicit step list, usually produced by the planner
    Config(EditingConfig),
    /// A named catalog preset
    Preset { id: String, intensity: Intensity },
    /// Pick a preset from the analysis; `None` intensity follows the
    /// analysis' editing intensity
    Auto { intensity: Option<Intensity> },
}

/// Options ready for the pixel pipeline plus the preset they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub options: TransformOptions,
    pub preset_id: Option<String>,
}

/// Ratio of vibrance amount applied as saturation.
const VIBRANCE_FACTOR: f64 = 0.5;

fn amount(step: &EditingStep) -> Option<f64> {
    step.number("amount").or_else(|| step.number("value"))
}

/// Translate one step into an options fragment.
///
/// Returns `Ok(None)` for unknown algorithms and for steps missing their
/// required parameter.
fn step_fragment(
    catalog: &AestheticCatalog,
    step: &EditingStep,
) -> EngineResult<Option<TransformOptions>> {
    let none = TransformOptions::NONE;
    let fragment = match step.algorithm.as_str() {
        "brightness" => amount(step).map(|v| TransformOptions {
            brightness: Some(v),
            ..none
        }),
        "contrast" => amount(step).map(|v| TransformOptions {
            contrast: Some(v),
            ..none
        }),
        "saturation" => amount(step).map(|v| TransformOptions {
            saturation: Some(v),
            ..none
        }),
        "vibrance" => amount(step).map(|v| TransformOptions {
            saturation: Some(v * VIBRANCE_FACTOR),
            ..none
        }),
        "hue" => step
            .number("degrees")
            .or_else(|| amount(step))
            .map(|v| TransformOptions {
                hue: Some(v),
                ..none
            }),
        "gamma" => step.number("value").map(|v| TransformOptions {
            gamma: Some(v),
            ..none
        }),
        "channel_balance" => Some(TransformOptions {
            red_channel: step.number("red"),
            green_channel: step.number("green"),
            blue_channel: step.number("blue"),
            ..none
        }),
        "warmth" => amount(step).map(|v| TransformOptions {
            red_channel: Some(v),
            blue_channel: Some(-v),
            ..none
        }),
        "aesthetic" => match step.text("preset") {
            Some(id) => {
                let intensity = step
                    .text("intensity")
                    .map(|text| {
                        text.parse::<Intensity>().unwrap_or_else(|e| {
                            warn!("{}; using medium", e);
                            Intensity::Medium
                        })
                    })
                    .unwrap_or_default();
                Some(catalog.preset_options(id, intensity)?)
            }
            None => None,
        },
        "filter" => match step.text("id") {
            Some(id) => Some(catalog.filter_options(id)?),
            None => None,
        },
        other => {
            debug!(algorithm = other, "Ignoring unknown editing algorithm");
            return Ok(None);
        }
    };

    if fragment.is_none() {
        debug!(algorithm = %step.algorithm, "Step has no usable parameters, skipping");
    }
    Ok(fragment)
}

/// Merge the enabled steps of `config` in order and scale by strength.
///
/// Every fragment and the merged total are validated before scaling, so an
/// out-of-range delta is reported rather than clamped.
pub fn resolve_config(
    catalog: &AestheticCatalog,
    config: &EditingConfig,
) -> EngineResult<TransformOptions> {
    config.validate()?;

    let mut merged = TransformOptions::NONE;
    for step in config.ordered_steps() {
        if let Some(fragment) = step_fragment(catalog, step)? {
            fragment.validate()?;
            merged = merged.merge(&fragment);
        }
    }
    merged.validate()?;

    Ok(merged.scaled(config.strength))
}

/// Resolve any [`Adjustment`] into validated options.
pub fn resolve_options(
    catalog: &AestheticCatalog,
    analysis: Option<&AnalysisResult>,
    adjustment: &Adjustment,
) -> EngineResult<ResolvedOptions> {
    let resolved = match adjustment {
        Adjustment::Config(config) => ResolvedOptions {
            options: resolve_config(catalog, config)?,
            preset_id: config.preset_id.clone(),
        },
        Adjustment::Preset { id, intensity } => ResolvedOptions {
            options: catalog.preset_options(id, *intensity)?,
            preset_id: Some(id.clone()),
        },
        Adjustment::Auto { intensity } => {
            let (id, intensity) = match analysis {
                Some(a) => (
                    select_aesthetic_for_content(&a.image_type, &a.mood, &a.detected_objects),
                    intensity.unwrap_or_else(|| a.editing_intensity.into()),
                ),
                None => (DEFAULT_PRESET_ID, intensity.unwrap_or_default()),
            };
            ResolvedOptions {
                options: catalog.preset_options(id, intensity)?,
                preset_id: Some(id.to_string()),
            }
        }
    };

    resolved.options.validate()?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::analysis;
    use crate::error::EngineError;
    use crate::types::{EditingIntensity, Priority};

    fn config(steps: Vec<EditingStep>, strength: f64) -> EditingConfig {
        EditingConfig {
            steps,
            strength,
            priority: Priority::Quality,
            style: "test".to_string(),
            preset_id: None,
        }
    }

    #[test]
    fn test_config_merges_steps_and_scales() {
        let catalog = AestheticCatalog::builtin();
        let cfg = config(
            vec![
                EditingStep::new("brightness", 0).with_param("amount", 10.0),
                EditingStep::new("brightness", 1).with_param("amount", 10.0),
                EditingStep::new("warmth", 2).with_param("amount", 8.0),
            ],
            0.5,
        );
        let opts = resolve_config(&catalog, &cfg).unwrap();
        assert_eq!(opts.brightness, Some(10.0));
        assert_eq!(opts.red_channel, Some(4.0));
        assert_eq!(opts.blue_channel, Some(-4.0));
    }

    #[test]
    fn test_unknown_algorithm_ignored() {
        let catalog = AestheticCatalog::builtin();
        let cfg = config(
            vec![
                EditingStep::new("sharpen", 0).with_param("amount", 50.0),
                EditingStep::new("contrast", 1).with_param("amount", 20.0),
            ],
            1.0,
        );
        let opts = resolve_config(&catalog, &cfg).unwrap();
        assert_eq!(opts.contrast, Some(20.0));
        assert_eq!(opts.brightness, None);
    }

    #[test]
    fn test_out_of_range_rejected_not_clamped() {
        let catalog = AestheticCatalog::builtin();
        let cfg = config(
            vec![EditingStep::new("brightness", 0).with_param("amount", 140.0)],
            1.0,
        );
        assert!(matches!(
            resolve_config(&catalog, &cfg),
            Err(EngineError::InvalidParameter { ref name, .. }) if name == "brightness"
        ));

        let cfg = config(vec![], 1.5);
        assert!(matches!(
            resolve_config(&catalog, &cfg),
            Err(EngineError::InvalidParameter { ref name, .. }) if name == "strength"
        ));
    }

    #[test]
    fn test_merged_total_validated() {
        let catalog = AestheticCatalog::builtin();
        let cfg = config(
            vec![
                EditingStep::new("saturation", 0).with_param("amount", 70.0),
                EditingStep::new("saturation", 1).with_param("amount", 70.0),
            ],
            0.5,
        );
        assert!(resolve_config(&catalog, &cfg).is_err());
    }

    #[test]
    fn test_aesthetic_and_filter_steps() {
        let catalog = AestheticCatalog::builtin();
        let cfg = config(
            vec![
                EditingStep::new("aesthetic", 0)
                    .with_param("preset", "nature_vivid")
                    .with_param("intensity", "light"),
                EditingStep::new("filter", 1).with_param("id", "clarity_boost"),
            ],
            1.0,
        );
        let opts = resolve_config(&catalog, &cfg).unwrap();
        // 15 * 0.6 + 18
        assert!((opts.contrast.unwrap() - 27.0).abs() < 1e-9);

        let bad = config(
            vec![EditingStep::new("filter", 0).with_param("id", "nope")],
            1.0,
        );
        assert_eq!(
            resolve_config(&catalog, &bad),
            Err(EngineError::UnknownFilter("nope".to_string()))
        );
    }

    #[test]
    fn test_preset_adjustment() {
        let catalog = AestheticCatalog::builtin();
        let resolved = resolve_options(
            &catalog,
            None,
            &Adjustment::Preset {
                id: "moody_dark".to_string(),
                intensity: Intensity::Strong,
            },
        )
        .unwrap();
        assert_eq!(resolved.preset_id.as_deref(), Some("moody_dark"));
        assert!((resolved.options.contrast.unwrap() - 35.0).abs() < 1e-9);

        let unknown = resolve_options(
            &catalog,
            None,
            &Adjustment::Preset {
                id: "nope".to_string(),
                intensity: Intensity::Medium,
            },
        );
        assert!(matches!(unknown, Err(EngineError::UnknownPreset(_))));
    }

    #[test]
    fn test_auto_adjustment_uses_analysis() {
        let catalog = AestheticCatalog::builtin();
        let mut a = analysis("food", "neutral", &[]);
        a.editing_intensity = EditingIntensity::Light;
        let resolved =
            resolve_options(&catalog, Some(&a), &Adjustment::Auto { intensity: None }).unwrap();
        assert_eq!(resolved.preset_id.as_deref(), Some("food_fresh"));
        assert!((resolved.options.saturation.unwrap() - 12.0).abs() < 1e-9);

        let fallback =
            resolve_options(&catalog, None, &Adjustment::Auto { intensity: None }).unwrap();
        assert_eq!(fallback.preset_id.as_deref(), Some("natural"));
    }
}
