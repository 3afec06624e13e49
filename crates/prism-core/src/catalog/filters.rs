//! Builtin filter definitions.

use serde::{Deserialize, Serialize};

use crate::color::TransformOptions;

/// Broad grouping used by the recommender's scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCategory {
    Aesthetic,
    Correction,
    Creative,
    Mood,
}

impl FilterCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterCategory::Aesthetic => "aesthetic",
            FilterCategory::Correction => "correction",
            FilterCategory::Creative => "creative",
            FilterCategory::Mood => "mood",
        }
    }
}

impl std::fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-purpose transform the recommender can suggest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub category: FilterCategory,
    pub options: TransformOptions,
    pub description: &'static str,
}

const fn filter(
    id: &'static str,
    name: &'static str,
    category: FilterCategory,
    options: TransformOptions,
    description: &'static str,
) -> FilterDefinition {
    FilterDefinition {
        id,
        name,
        category,
        options,
        description,
    }
}

const NONE: TransformOptions = TransformOptions::NONE;

use FilterCategory::{Aesthetic, Correction, Creative, Mood};

pub(crate) static FILTERS: &[FilterDefinition] = &[
    filter(
        "soft_portrait",
        "Soft Portrait",
        Aesthetic,
        TransformOptions {
            brightness: Some(6.0),
            contrast: Some(-12.0),
            saturation: Some(-8.0),
            gamma: Some(1.08),
            red_channel: Some(4.0),
            ..NONE
        },
        "Lowers contrast and lifts midtones for flattering skin",
    ),
    filter(
        "golden_glow",
        "Golden Glow",
        Aesthetic,
        TransformOptions {
            brightness: Some(5.0),
            saturation: Some(10.0),
            red_channel: Some(10.0),
            green_channel: Some(4.0),
            blue_channel: Some(-10.0),
            ..NONE
        },
        "Warm sunset cast",
    ),
    filter(
        "cool_breeze",
        "Cool Breeze",
        Aesthetic,
        TransformOptions {
            saturation: Some(-5.0),
            red_channel: Some(-8.0),
            blue_channel: Some(10.0),
            ..NONE
        },
        "Cool, airy blue cast",
    ),
    filter(
        "vintage_fade",
        "Vintage Fade",
        Aesthetic,
        TransformOptions {
            contrast: Some(-18.0),
            saturation: Some(-20.0),
            gamma: Some(1.12),
            red_channel: Some(6.0),
            blue_channel: Some(-6.0),
            ..NONE
        },
        "Faded blacks and muted color",
    ),
    filter(
        "clean_bright",
        "Clean Bright",
        Aesthetic,
        TransformOptions {
            brightness: Some(10.0),
            contrast: Some(5.0),
            saturation: Some(-5.0),
            ..NONE
        },
        "Bright, neutral and crisp",
    ),
    filter(
        "auto_fix",
        "Auto Fix",
        Correction,
        TransformOptions {
            brightness: Some(5.0),
            contrast: Some(10.0),
            saturation: Some(8.0),
            ..NONE
        },
        "General-purpose tonal correction",
    ),
    filter(
        "exposure_fix",
        "Exposure Fix",
        Correction,
        TransformOptions {
            brightness: Some(15.0),
            gamma: Some(1.15),
            ..NONE
        },
        "Recovers underexposed images",
    ),
    filter(
        "shadow_lift",
        "Shadow Lift",
        Correction,
        TransformOptions {
            contrast: Some(-10.0),
            gamma: Some(1.25),
            ..NONE
        },
        "Opens up crushed shadows",
    ),
    filter(
        "color_balance",
        "Color Balance",
        Correction,
        TransformOptions {
            saturation: Some(5.0),
            red_channel: Some(-3.0),
            blue_channel: Some(3.0),
            ..NONE
        },
        "Neutralizes a warm color cast",
    ),
    filter(
        "clarity_boost",
        "Clarity Boost",
        Correction,
        TransformOptions {
            contrast: Some(18.0),
            saturation: Some(4.0),
            ..NONE
        },
        "Adds midtone punch",
    ),
    filter(
        "soft_glow",
        "Soft Glow",
        Creative,
        TransformOptions {
            brightness: Some(10.0),
            contrast: Some(-15.0),
            gamma: Some(1.1),
            ..NONE
        },
        "Dreamy diffused highlights",
    ),
    filter(
        "neon_pop",
        "Neon Pop",
        Creative,
        TransformOptions {
            contrast: Some(20.0),
            saturation: Some(40.0),
            hue: Some(12.0),
            ..NONE
        },
        "Electric saturated color",
    ),
    filter(
        "teal_orange",
        "Teal & Orange",
        Creative,
        TransformOptions {
            contrast: Some(15.0),
            red_channel: Some(10.0),
            green_channel: Some(-2.0),
            blue_channel: Some(12.0),
            ..NONE
        },
        "Cinematic complementary grade",
    ),
    filter(
        "noir",
        "Noir",
        Creative,
        TransformOptions {
            contrast: Some(35.0),
            saturation: Some(-100.0),
            gamma: Some(0.9),
            ..NONE
        },
        "High-contrast black and white",
    ),
    filter(
        "moody_dark",
        "Moody Dark",
        Mood,
        TransformOptions {
            brightness: Some(-12.0),
            contrast: Some(20.0),
            saturation: Some(-15.0),
            gamma: Some(0.88),
            ..NONE
        },
        "Deep shadows and restrained color",
    ),
    filter(
        "dreamy_pastel",
        "Dreamy Pastel",
        Mood,
        TransformOptions {
            brightness: Some(12.0),
            contrast: Some(-20.0),
            saturation: Some(-10.0),
            gamma: Some(1.15),
            ..NONE
        },
        "Light, low-contrast pastel tones",
    ),
    filter(
        "vivid_nature",
        "Vivid Nature",
        Mood,
        TransformOptions {
            contrast: Some(12.0),
            saturation: Some(28.0),
            green_channel: Some(8.0),
            ..NONE
        },
        "Rich greens and blues",
    ),
    filter(
        "dramatic_contrast",
        "Dramatic Contrast",
        Mood,
        TransformOptions {
            brightness: Some(-5.0),
            contrast: Some(30.0),
            saturation: Some(5.0),
            ..NONE
        },
        "Punchy tonal separation",
    ),
];
