//! Builtin aesthetic presets and filters, and the rules that pick them.
//!
//! - **presets**: named looks applied as a whole
//! - **filters**: single-purpose transforms scored by the recommender
//! - **select**: content-driven preset selection
//! - **intensity**: light/medium/strong scaling of deltas

pub mod filters;
pub mod intensity;
pub mod presets;
pub mod select;

pub use filters::{FilterCategory, FilterDefinition};
pub use intensity::apply_intensity;
pub use presets::{AestheticPreset, DEFAULT_PRESET_ID};
pub use select::select_aesthetic_for_content;

use crate::color::TransformOptions;
use crate::error::{EngineError, EngineResult};
use crate::types::Intensity;

/// Read-only view over the static preset and filter tables.
#[derive(Debug, Clone, Copy)]
pub struct AestheticCatalog {
    presets: &'static [AestheticPreset],
    filters: &'static [FilterDefinition],
}

impl Default for AestheticCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AestheticCatalog {
    pub fn builtin() -> Self {
        Self {
            presets: presets::PRESETS,
            filters: filters::FILTERS,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_tables(
        presets: &'static [AestheticPreset],
        filters: &'static [FilterDefinition],
    ) -> Self {
        Self { presets, filters }
    }

    /// Presets in declaration order.
    pub fn presets(&self) -> &'static [AestheticPreset] {
        self.presets
    }

    /// Filters in declaration order.
    pub fn filters(&self) -> &'static [FilterDefinition] {
        self.filters
    }

    pub fn preset(&self, id: &str) -> Option<&'static AestheticPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    pub fn filter(&self, id: &str) -> Option<&'static FilterDefinition> {
        self.filters.iter().find(|f| f.id == id)
    }

    pub fn default_preset(&self) -> Option<&'static AestheticPreset> {
        self.preset(DEFAULT_PRESET_ID)
    }

    /// Preset deltas scaled for `intensity`.
    pub fn preset_options(&self, id: &str, intensity: Intensity) -> EngineResult<TransformOptions> {
        let preset = self
            .preset(id)
            .ok_or_else(|| EngineError::UnknownPreset(id.to_string()))?;
        Ok(apply_intensity(&preset.options, intensity))
    }

    pub fn filter_options(&self, id: &str) -> EngineResult<TransformOptions> {
        self.filter(id)
            .map(|f| f.options)
            .ok_or_else(|| EngineError::UnknownFilter(id.to_string()))
    }
}
