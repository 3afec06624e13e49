//! Sparse transform parameters and their legal ranges.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Legal range for brightness, contrast, saturation, and channel deltas.
pub const DELTA_RANGE: (f64, f64) = (-100.0, 100.0);

/// Legal range for hue rotation in degrees.
pub const HUE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Gamma must be strictly positive and at most this value.
pub const GAMMA_MAX: f64 = 3.0;

/// Absolute bounds applied when scaling a gamma value by intensity.
pub const GAMMA_SCALE_BOUNDS: (f64, f64) = (0.3, 3.0);

/// Named color deltas. `None` means "leave this aspect alone", not zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,

    /// Degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<f64>,

    /// Exponent denominator: output = 255 * (c/255)^(1/gamma)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_channel: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub green_channel: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub blue_channel: Option<f64>,
}

/// Sum two optional deltas; absence on both sides stays absent.
fn add(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (x, None) => x,
        (None, y) => y,
    }
}

fn scale_delta(v: Option<f64>, factor: f64, (min, max): (f64, f64)) -> Option<f64> {
    v.map(|x| (x * factor).clamp(min, max))
}

/// Scale a gamma value's distance from 1 by `multiplier`.
///
/// Values below 1 are pulled toward (or pushed past) 1 by `(1 - g) * m`,
/// values above 1 by `(g - 1) * m`; the result is bounded to
/// [`GAMMA_SCALE_BOUNDS`].
pub fn scale_gamma(g: f64, multiplier: f64) -> f64 {
    let scaled = if g < 1.0 {
        1.0 - (1.0 - g) * multiplier
    } else if g > 1.0 {
        1.0 + (g - 1.0) * multiplier
    } else {
        g
    };
    scaled.clamp(GAMMA_SCALE_BOUNDS.0, GAMMA_SCALE_BOUNDS.1)
}

impl TransformOptions {
    /// No fields set.
    pub const NONE: Self = Self {
        brightness: None,
        contrast: None,
        saturation: None,
        hue: None,
        gamma: None,
        red_channel: None,
        green_channel: None,
        blue_channel: None,
    };

    /// Check every present field against its legal range.
    pub fn validate(&self) -> EngineResult<()> {
        let (lo, hi) = DELTA_RANGE;
        let deltas = [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
            ("red_channel", self.red_channel),
            ("green_channel", self.green_channel),
            ("blue_channel", self.blue_channel),
        ];
        for (name, value) in deltas {
            if let Some(v) = value {
                if !v.is_finite() || v < lo || v > hi {
                    return Err(EngineError::invalid(name, v, lo, hi));
                }
            }
        }

        if let Some(h) = self.hue {
            let (lo, hi) = HUE_RANGE;
            if !h.is_finite() || h < lo || h > hi {
                return Err(EngineError::invalid("hue", h, lo, hi));
            }
        }

        if let Some(g) = self.gamma {
            // (0, 3]: report the lower bound as 0 since it is exclusive
            if !g.is_finite() || g <= 0.0 || g > GAMMA_MAX {
                return Err(EngineError::invalid("gamma", g, 0.0, GAMMA_MAX));
            }
        }

        Ok(())
    }

    /// Combine two fragments: deltas add, gammas multiply.
    pub fn merge(&self, other: &TransformOptions) -> TransformOptions {
        TransformOptions {
            brightness: add(self.brightness, other.brightness),
            contrast: add(self.contrast, other.contrast),
            saturation: add(self.saturation, other.saturation),
            hue: add(self.hue, other.hue),
            gamma: match (self.gamma, other.gamma) {
                (Some(a), Some(b)) => Some(a * b),
                (a, None) => a,
                (None, b) => b,
            },
            red_channel: add(self.red_channel, other.red_channel),
            green_channel: add(self.green_channel, other.green_channel),
            blue_channel: add(self.blue_channel, other.blue_channel),
        }
    }

    /// Multiply every delta by `factor`, re-clamping to legal ranges.
    ///
    /// Gamma follows [`scale_gamma`].
    pub fn scaled(&self, factor: f64) -> TransformOptions {
        TransformOptions {
            brightness: scale_delta(self.brightness, factor, DELTA_RANGE),
            contrast: scale_delta(self.contrast, factor, DELTA_RANGE),
            saturation: scale_delta(self.saturation, factor, DELTA_RANGE),
            hue: scale_delta(self.hue, factor, HUE_RANGE),
            gamma: self.gamma.map(|g| scale_gamma(g, factor)),
            red_channel: scale_delta(self.red_channel, factor, DELTA_RANGE),
            green_channel: scale_delta(self.green_channel, factor, DELTA_RANGE),
            blue_channel: scale_delta(self.blue_channel, factor, DELTA_RANGE),
        }
    }

    pub fn has_channel_scale(&self) -> bool {
        [self.red_channel, self.green_channel, self.blue_channel]
            .iter()
            .any(|v| matches!(v, Some(x) if *x != 0.0))
    }

    /// True when applying these options cannot change any pixel.
    pub fn is_identity(&self) -> bool {
        let zero = |v: Option<f64>| v.map_or(true, |x| x == 0.0);
        zero(self.brightness)
            && zero(self.contrast)
            && zero(self.saturation)
            && zero(self.hue)
            && !self.has_channel_scale()
            && self.gamma.map_or(true, |g| g == 1.0)
    }
}
