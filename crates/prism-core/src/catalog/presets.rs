//! Builtin aesthetic presets.
//!
//! Presets are authored here and never derived at runtime. Declaration
//! order is the catalog iteration order.

use serde::Serialize;

use crate::color::TransformOptions;

/// Named bundle of transform deltas representing a stylistic look.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AestheticPreset {
    pub id: &'static str,
    pub display_name: &'static str,
    pub vibe_tag: &'static str,
    pub options: TransformOptions,
    pub formula_description: &'static str,
}

/// Id of the preset used when no selection rule matches.
pub const DEFAULT_PRESET_ID: &str = "natural";

const fn opts(
    brightness: Option<f64>,
    contrast: Option<f64>,
    saturation: Option<f64>,
    hue: Option<f64>,
    gamma: Option<f64>,
    channels: Option<(f64, f64, f64)>,
) -> TransformOptions {
    let (red_channel, green_channel, blue_channel) = match channels {
        Some((r, g, b)) => (Some(r), Some(g), Some(b)),
        None => (None, None, None),
    };
    TransformOptions {
        brightness,
        contrast,
        saturation,
        hue,
        gamma,
        red_channel,
        green_channel,
        blue_channel,
    }
}

pub(crate) static PRESETS: &[AestheticPreset] = &[
    AestheticPreset {
        id: "natural",
        display_name: "Natural",
        vibe_tag: "true-to-life",
        options: opts(Some(3.0), Some(5.0), Some(5.0), None, None, None),
        formula_description: "Gentle lift: +3 brightness, +5 contrast, +5 saturation",
    },
    AestheticPreset {
        id: "golden_hour",
        display_name: "Golden Hour",
        vibe_tag: "warm",
        options: opts(
            Some(8.0),
            Some(10.0),
            Some(15.0),
            Some(-5.0),
            Some(0.95),
            Some((12.0, 4.0, -10.0)),
        ),
        formula_description: "Warm shift: R x1.12, B x0.90, hue -5deg, slight gamma deepening",
    },
    AestheticPreset {
        id: "film_portrait",
        display_name: "Film Portrait",
        vibe_tag: "soft",
        options: opts(
            Some(5.0),
            Some(-8.0),
            Some(-10.0),
            None,
            Some(1.05),
            Some((6.0, 2.0, 0.0)),
        ),
        formula_description: "Low-contrast skin-friendly tone: contrast -8, saturation -10, gamma 1.05",
    },
    AestheticPreset {
        id: "moody_dark",
        display_name: "Moody Dark",
        vibe_tag: "moody",
        options: opts(
            Some(-15.0),
            Some(25.0),
            Some(-20.0),
            None,
            Some(0.85),
            Some((0.0, 0.0, 8.0)),
        ),
        formula_description: "Crushed shadows: brightness -15, contrast +25, gamma 0.85, cool blue",
    },
    AestheticPreset {
        id: "night_neon",
        display_name: "Night Neon",
        vibe_tag: "electric",
        options: opts(
            None,
            Some(18.0),
            Some(35.0),
            Some(10.0),
            Some(0.9),
            Some((0.0, -4.0, 15.0)),
        ),
        formula_description: "Saturated night: saturation +35, hue +10deg, B x1.15",
    },
    AestheticPreset {
        id: "nature_vivid",
        display_name: "Nature Vivid",
        vibe_tag: "vibrant",
        options: opts(
            Some(2.0),
            Some(15.0),
            Some(30.0),
            None,
            None,
            Some((0.0, 10.0, 4.0)),
        ),
        formula_description: "Lush greens: contrast +15, saturation +30, G x1.10",
    },
    AestheticPreset {
        id: "food_fresh",
        display_name: "Food Fresh",
        vibe_tag: "appetizing",
        options: opts(
            Some(6.0),
            Some(12.0),
            Some(20.0),
            None,
            Some(1.05),
            Some((6.0, 2.0, -4.0)),
        ),
        formula_description: "Bright and warm: saturation +20, R x1.06, gamma 1.05",
    },
    AestheticPreset {
        id: "urban_teal",
        display_name: "Urban Teal",
        vibe_tag: "cinematic",
        options: opts(
            None,
            Some(20.0),
            Some(5.0),
            Some(-8.0),
            None,
            Some((-6.0, 2.0, 12.0)),
        ),
        formula_description: "Teal cast: R x0.94, B x1.12, contrast +20",
    },
    AestheticPreset {
        id: "vintage_fade",
        display_name: "Vintage Fade",
        vibe_tag: "nostalgic",
        options: opts(
            Some(6.0),
            Some(-20.0),
            Some(-25.0),
            None,
            Some(1.15),
            Some((8.0, 4.0, -8.0)),
        ),
        formula_description: "Faded film: contrast -20, saturation -25, gamma 1.15, warm cast",
    },
    AestheticPreset {
        id: "clean_minimal",
        display_name: "Clean Minimal",
        vibe_tag: "airy",
        options: opts(
            Some(10.0),
            Some(-5.0),
            Some(-15.0),
            None,
            Some(1.1),
            None,
        ),
        formula_description: "Airy whites: brightness +10, saturation -15, gamma 1.1",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_ids_unique() {
        let mut ids: Vec<_> = PRESETS.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), PRESETS.len());
    }

    #[test]
    fn test_all_presets_valid() {
        for preset in PRESETS {
            assert!(
                preset.options.validate().is_ok(),
                "preset {} has invalid options",
                preset.id
            );
        }
    }

    #[test]
    fn test_default_preset_present() {
        assert!(PRESETS.iter().any(|p| p.id == DEFAULT_PRESET_ID));
    }
}
