//! Builds an [`EditingConfig`] from an analysis.
//!
//! The planner combines the content-selected preset with corrective steps
//! derived from the technical quality scores and the analyzer's suggested
//! improvements. Planning is synchronous; [`ConfigPlanner::plan_or_default`]
//! never fails, so a broken analysis can always be processed.

use tracing::{debug, warn};

use crate::catalog::{select_aesthetic_for_content, AestheticCatalog, FilterCategory};
use crate::error::{EngineError, EngineResult};
use crate::recommend::FilterRecommender;
use crate::types::{
    AnalysisResult, EditingConfig, EditingIntensity, EditingStep, Intensity, ParamValue, Priority,
};

use super::options::resolve_config;

/// Overall quality below which strength is boosted.
const LOW_QUALITY: f64 = 0.4;
/// Overall quality above which strength is reduced.
const HIGH_QUALITY: f64 = 0.8;
/// Overall quality below which the config prioritizes quality.
const QUALITY_PRIORITY_BELOW: f64 = 0.5;

const LOW_QUALITY_BOOST: f64 = 0.15;
const LOW_QUALITY_BOUNDS: (f64, f64) = (0.8, 0.9);
const HIGH_QUALITY_FACTOR: f64 = 0.8;

const UNDEREXPOSED_BELOW: f64 = 0.35;
const OVEREXPOSED_ABOVE: f64 = 0.9;

fn base_strength(intensity: EditingIntensity) -> f64 {
    match intensity {
        EditingIntensity::Light => 0.5,
        EditingIntensity::Medium => 0.7,
        EditingIntensity::Heavy => 0.85,
    }
}

/// Global strength for an analysis.
pub fn plan_strength(analysis: &AnalysisResult) -> f64 {
    let base = base_strength(analysis.editing_intensity);
    let overall = analysis.technical_quality.overall;
    if overall < LOW_QUALITY {
        (base + LOW_QUALITY_BOOST).clamp(LOW_QUALITY_BOUNDS.0, LOW_QUALITY_BOUNDS.1)
    } else if overall > HIGH_QUALITY {
        base * HIGH_QUALITY_FACTOR
    } else {
        base
    }
}

pub fn plan_priority(analysis: &AnalysisResult) -> Priority {
    if analysis.technical_quality.overall < QUALITY_PRIORITY_BELOW {
        Priority::Quality
    } else if analysis.editing_intensity == EditingIntensity::Heavy {
        Priority::Artistic
    } else {
        Priority::Speed
    }
}

/// Config used whenever planning fails.
pub fn default_config() -> EditingConfig {
    EditingConfig {
        steps: vec![EditingStep::new("aesthetic", 0)
            .with_param("preset", crate::catalog::DEFAULT_PRESET_ID)
            .with_param("intensity", Intensity::Medium.as_str())],
        strength: 0.7,
        priority: Priority::Quality,
        style: "Natural".to_string(),
        preset_id: Some(crate::catalog::DEFAULT_PRESET_ID.to_string()),
    }
}

/// Turns analyses into editing configs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigPlanner {
    catalog: AestheticCatalog,
    recommender: FilterRecommender,
    preset_override: Option<&'static str>,
    intensity_override: Option<Intensity>,
}

impl ConfigPlanner {
    pub fn new(catalog: AestheticCatalog) -> Self {
        Self {
            catalog,
            recommender: FilterRecommender::new(catalog),
            preset_override: None,
            intensity_override: None,
        }
    }

    /// Pin the aesthetic step of every planned config to `preset` and/or
    /// `intensity`, whatever the analysis selects.
    pub fn with_style(
        mut self,
        preset: Option<&str>,
        intensity: Option<Intensity>,
    ) -> EngineResult<Self> {
        if let Some(id) = preset {
            let found = self
                .catalog
                .preset(id)
                .ok_or_else(|| EngineError::UnknownPreset(id.to_string()))?;
            self.preset_override = Some(found.id);
        }
        self.intensity_override = intensity;
        Ok(self)
    }

    fn apply_style(&self, config: &mut EditingConfig) {
        if self.preset_override.is_none() && self.intensity_override.is_none() {
            return;
        }
        let Some(step) = config.steps.iter_mut().find(|s| s.algorithm == "aesthetic") else {
            return;
        };
        let preset_id = self
            .preset_override
            .or_else(|| step.text("preset").and_then(|id| self.catalog.preset(id)).map(|p| p.id))
            .unwrap_or(crate::catalog::DEFAULT_PRESET_ID);
        let intensity = self
            .intensity_override
            .or_else(|| step.text("intensity").and_then(|i| i.parse().ok()))
            .unwrap_or_default();

        *step = EditingStep::new("aesthetic", step.order)
            .with_param("preset", preset_id)
            .with_param("intensity", intensity.as_str());
        if let Some(preset) = self.catalog.preset(preset_id) {
            config.style = preset.display_name.to_string();
        }
        config.preset_id = Some(preset_id.to_string());
    }

    /// Build and validate a config for `analysis`.
    pub fn plan(&self, analysis: &AnalysisResult) -> EngineResult<EditingConfig> {
        for (name, value) in analysis.scores() {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::invalid(name, value, 0.0, 1.0));
            }
        }

        let preset_id = select_aesthetic_for_content(
            &analysis.image_type,
            &analysis.mood,
            &analysis.detected_objects,
        );
        let preset = self
            .catalog
            .preset(preset_id)
            .ok_or_else(|| EngineError::UnknownPreset(preset_id.to_string()))?;
        let intensity = Intensity::from(analysis.editing_intensity);

        let mut steps = vec![EditingStep::new("aesthetic", 0)
            .with_param("preset", preset_id)
            .with_param("intensity", intensity.as_str())];
        // Corrections run after the look, in the order they are added
        let mut correct = |algorithm: &str, key: &str, value: ParamValue| {
            let order = steps.len() as u32;
            steps.push(EditingStep::new(algorithm, order).with_param(key, value));
        };

        let exposure = analysis.technical_quality.exposure;
        if exposure < UNDEREXPOSED_BELOW {
            correct("brightness", "amount", 12.0.into());
        } else if exposure > OVEREXPOSED_ABOVE {
            correct("brightness", "amount", (-8.0).into());
        }

        let mentions = |words: &[&str]| {
            analysis.suggested_improvements.iter().any(|s| {
                let s = s.to_lowercase();
                words.iter().any(|w| s.contains(w))
            })
        };
        if mentions(&["contrast"]) {
            correct("contrast", "amount", 10.0.into());
        }
        if mentions(&["saturation", "color", "colour"]) {
            correct("saturation", "amount", 10.0.into());
        }
        if mentions(&["warm"]) {
            correct("warmth", "amount", 8.0.into());
        }

        if let Some(rec) = self
            .recommender
            .recommend(analysis)
            .into_iter()
            .find(|r| r.category == FilterCategory::Correction)
        {
            correct("filter", "id", rec.filter_id.as_str().into());
        }

        let mut config = EditingConfig {
            steps,
            strength: plan_strength(analysis),
            priority: plan_priority(analysis),
            style: preset.display_name.to_string(),
            preset_id: Some(preset_id.to_string()),
        };
        self.apply_style(&mut config);

        // Resolving checks every step and the merged total against legal ranges
        resolve_config(&self.catalog, &config)?;
        debug!(
            preset = preset_id,
            steps = config.steps.len(),
            strength = config.strength,
            "Planned editing config"
        );
        Ok(config)
    }

    /// Like [`plan`](Self::plan), falling back to [`default_config`].
    pub fn plan_or_default(&self, analysis: &AnalysisResult) -> EditingConfig {
        match self.plan(analysis) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config planning failed, using default: {}", e);
                let mut config = default_config();
                self.apply_style(&mut config);
                config
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::analysis;

    #[test]
    fn test_low_quality_portrait_strength() {
        let mut a = analysis("portrait", "neutral", &[]);
        a.technical_quality.overall = 0.3;
        let config = ConfigPlanner::default().plan(&a).unwrap();
        assert!((0.8..=0.9).contains(&config.strength));
        assert_eq!(config.priority, Priority::Quality);
        assert_eq!(config.preset_id.as_deref(), Some("film_portrait"));
        assert_eq!(config.style, "Film Portrait");
    }

    #[test]
    fn test_strength_rules() {
        let mut a = analysis("general", "neutral", &[]);
        a.editing_intensity = EditingIntensity::Light;
        a.technical_quality.overall = 0.2;
        assert_eq!(plan_strength(&a), 0.8);

        a.editing_intensity = EditingIntensity::Heavy;
        assert_eq!(plan_strength(&a), 0.9);

        a.technical_quality.overall = 0.9;
        assert!((plan_strength(&a) - 0.68).abs() < 1e-12);

        a.editing_intensity = EditingIntensity::Medium;
        a.technical_quality.overall = 0.6;
        assert_eq!(plan_strength(&a), 0.7);
    }

    #[test]
    fn test_priority_rules() {
        let mut a = analysis("general", "neutral", &[]);
        a.technical_quality.overall = 0.45;
        a.editing_intensity = EditingIntensity::Heavy;
        assert_eq!(plan_priority(&a), Priority::Quality);
        a.technical_quality.overall = 0.7;
        assert_eq!(plan_priority(&a), Priority::Artistic);
        a.editing_intensity = EditingIntensity::Medium;
        assert_eq!(plan_priority(&a), Priority::Speed);
    }

    #[test]
    fn test_correction_steps() {
        let mut a = analysis("landscape", "calm", &[]);
        a.technical_quality.exposure = 0.2;
        a.technical_quality.overall = 0.45;
        a.suggested_improvements = vec![
            "Boost contrast".to_string(),
            "More vivid color".to_string(),
            "Warmer tones".to_string(),
        ];
        let config = ConfigPlanner::default().plan(&a).unwrap();
        let algos: Vec<_> = config.steps.iter().map(|s| s.algorithm.as_str()).collect();
        assert_eq!(
            algos,
            vec!["aesthetic", "brightness", "contrast", "saturation", "warmth", "filter"]
        );
        let orders: Vec<_> = config.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(config.steps[1].number("amount"), Some(12.0));
    }

    #[test]
    fn test_overexposed_darkens() {
        let mut a = analysis("general", "neutral", &[]);
        a.technical_quality.exposure = 0.95;
        a.technical_quality.overall = 0.9;
        let config = ConfigPlanner::default().plan(&a).unwrap();
        let bright = config
            .steps
            .iter()
            .find(|s| s.algorithm == "brightness")
            .unwrap();
        assert_eq!(bright.number("amount"), Some(-8.0));
        // corrections score below the cutoff on a high-quality image
        assert!(config.steps.iter().all(|s| s.algorithm != "filter"));
    }

    #[test]
    fn test_plan_or_default_falls_back() {
        let planner = ConfigPlanner::new(AestheticCatalog::from_tables(&[], &[]));
        let a = analysis("portrait", "neutral", &[]);
        assert!(planner.plan(&a).is_err());
        assert_eq!(planner.plan_or_default(&a), default_config());

        let mut bad = analysis("portrait", "neutral", &[]);
        bad.confidence = 3.0;
        assert_eq!(ConfigPlanner::default().plan_or_default(&bad), default_config());
    }

    #[test]
    fn test_style_override_pins_preset_and_intensity() {
        let planner = ConfigPlanner::default()
            .with_style(Some("vintage_fade"), Some(Intensity::Strong))
            .unwrap();
        let config = planner.plan(&analysis("food", "warm", &[])).unwrap();
        assert_eq!(config.preset_id.as_deref(), Some("vintage_fade"));
        assert_eq!(config.steps[0].text("preset"), Some("vintage_fade"));
        assert_eq!(config.steps[0].text("intensity"), Some("strong"));

        let only_intensity = ConfigPlanner::default()
            .with_style(None, Some(Intensity::Light))
            .unwrap();
        let config = only_intensity.plan(&analysis("food", "warm", &[])).unwrap();
        assert_eq!(config.steps[0].text("preset"), Some("food_fresh"));
        assert_eq!(config.steps[0].text("intensity"), Some("light"));
    }

    #[test]
    fn test_style_override_rejects_unknown_preset() {
        let err = ConfigPlanner::default().with_style(Some("sepia_dream"), None);
        assert!(matches!(err, Err(EngineError::UnknownPreset(_))));
    }

    #[test]
    fn test_default_config_resolves() {
        let catalog = AestheticCatalog::builtin();
        assert!(resolve_config(&catalog, &default_config()).is_ok());
    }
}
