//! Intensity scaling of preset and filter deltas.

use crate::color::TransformOptions;
use crate::types::Intensity;

/// Scale `options` by the multiplier of `intensity`.
///
/// Deltas are multiplied and re-clamped to their legal ranges; gamma moves
/// away from or toward 1 per [`crate::color::scale_gamma`].
pub fn apply_intensity(options: &TransformOptions, intensity: Intensity) -> TransformOptions {
    options.scaled(intensity.multiplier())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medium_is_unchanged() {
        let opts = TransformOptions {
            brightness: Some(10.0),
            gamma: Some(0.9),
            ..Default::default()
        };
        assert_eq!(apply_intensity(&opts, Intensity::Medium), opts);
    }

    #[test]
    fn test_light_and_strong() {
        let opts = TransformOptions {
            contrast: Some(25.0),
            gamma: Some(0.85),
            ..Default::default()
        };
        let light = apply_intensity(&opts, Intensity::Light);
        assert!((light.contrast.unwrap() - 15.0).abs() < 1e-12);
        assert!((light.gamma.unwrap() - 0.91).abs() < 1e-12);

        let strong = apply_intensity(&opts, Intensity::Strong);
        assert!((strong.contrast.unwrap() - 35.0).abs() < 1e-12);
        assert!((strong.gamma.unwrap() - 0.79).abs() < 1e-12);
    }
}
