//! Core data types shared across the engine and the orchestrator.
//!
//! `AnalysisResult` is the contract with the content-analysis collaborator;
//! `EditingConfig` is what the planner hands to the enhancement engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AnalysisError, EngineError, EngineResult};

/// Identifier of an image unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque reference to binary data held by a blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(pub String);

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Technical quality scores reported by the analysis collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalQuality {
    pub exposure: f64,
    pub sharpness: f64,
    pub composition: f64,
    pub overall: f64,
}

impl Default for TechnicalQuality {
    fn default() -> Self {
        Self {
            exposure: 0.5,
            sharpness: 0.5,
            composition: 0.5,
            overall: 0.5,
        }
    }
}

/// How heavily the analysis suggests editing the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditingIntensity {
    Light,
    #[default]
    Medium,
    Heavy,
}

/// Strength at which a preset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    #[default]
    Medium,
    Strong,
}

impl Intensity {
    /// Multiplier applied to every preset delta.
    pub fn multiplier(self) -> f64 {
        match self {
            Intensity::Light => 0.6,
            Intensity::Medium => 1.0,
            Intensity::Strong => 1.4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Light => "light",
            Intensity::Medium => "medium",
            Intensity::Strong => "strong",
        }
    }
}

impl From<EditingIntensity> for Intensity {
    fn from(value: EditingIntensity) -> Self {
        match value {
            EditingIntensity::Light => Intensity::Light,
            EditingIntensity::Medium => Intensity::Medium,
            EditingIntensity::Heavy => Intensity::Strong,
        }
    }
}

impl std::str::FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Intensity::Light),
            "medium" => Ok(Intensity::Medium),
            "strong" | "heavy" => Ok(Intensity::Strong),
            other => Err(format!(
                "unknown intensity '{other}', expected light/medium/strong"
            )),
        }
    }
}

/// Structured output of the content-analysis collaborator.
///
/// Produced once per image and immutable thereafter; a retry replaces it
/// wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Scene classification ("portrait", "landscape", "food", ...)
    pub image_type: String,

    /// Classifier confidence in `[0, 1]`
    pub confidence: f64,

    pub technical_quality: TechnicalQuality,

    #[serde(default)]
    pub detected_objects: Vec<String>,

    /// Dominant mood ("warm", "neutral", "moody", ...)
    pub mood: String,

    #[serde(default)]
    pub suggested_improvements: Vec<String>,

    #[serde(default)]
    pub editing_intensity: EditingIntensity,
}

impl AnalysisResult {
    /// Every score that must lie in `[0, 1]`, with its field name.
    pub fn scores(&self) -> [(&'static str, f64); 5] {
        let q = &self.technical_quality;
        [
            ("confidence", self.confidence),
            ("technical_quality.exposure", q.exposure),
            ("technical_quality.sharpness", q.sharpness),
            ("technical_quality.composition", q.composition),
            ("technical_quality.overall", q.overall),
        ]
    }

    /// Reject scores outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, value) in self.scores() {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::unrecoverable(format!(
                    "{name} out of range: {value}"
                )));
            }
        }
        Ok(())
    }

    /// Case-insensitive check whether any detected object contains `needle`.
    pub fn has_subject(&self, needle: &str) -> bool {
        self.detected_objects
            .iter()
            .any(|s| s.to_lowercase().contains(needle))
    }
}

/// A single value in an editing step's parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// One algorithm invocation inside an [`EditingConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditingStep {
    /// Algorithm name; unknown names are skipped by the engine
    pub algorithm: String,
    pub enabled: bool,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
    /// Application order; ties keep list order
    pub order: u32,
}

impl EditingStep {
    pub fn new(algorithm: impl Into<String>, order: u32) -> Self {
        Self {
            algorithm: algorithm.into(),
            enabled: true,
            params: BTreeMap::new(),
            order,
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(ParamValue::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(ParamValue::as_str)
    }
}

/// What the config generator optimizes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Quality,
    Speed,
    Artistic,
}

/// Ordered list of editing steps plus global strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditingConfig {
    pub steps: Vec<EditingStep>,
    /// Global scale applied to the merged deltas, `[0, 1]`
    pub strength: f64,
    pub priority: Priority,
    /// Human-readable look name
    pub style: String,
    /// Preset the config was built around, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_id: Option<String>,
}

impl EditingConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(EngineError::invalid("strength", self.strength, 0.0, 1.0));
        }
        Ok(())
    }

    /// Enabled steps in application order (stable on ties).
    pub fn ordered_steps(&self) -> Vec<&EditingStep> {
        let mut steps: Vec<&EditingStep> = self.steps.iter().filter(|s| s.enabled).collect();
        steps.sort_by_key(|s| s.order);
        steps
    }
}
