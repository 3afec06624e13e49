//! Technical quality metrics and before/after comparison.
//!
//! All metrics are deterministic statistics over an RGBA8 buffer, each in
//! `[0, 1]` with higher meaning better. The weighted `overall` score is
//! computed once in [`QualityMetrics::new`] so it can never drift from its
//! components.

use serde::{Deserialize, Serialize};

use crate::engine::PixelBuffer;
use crate::types::EditingConfig;

const EXPOSURE_WEIGHT: f64 = 0.25;
const CONTRAST_WEIGHT: f64 = 0.20;
const SHARPNESS_WEIGHT: f64 = 0.25;
const COLOR_BALANCE_WEIGHT: f64 = 0.15;
const NOISE_WEIGHT: f64 = 0.15;

/// Luma below which a pixel counts as shadow.
const SHADOW_LUMA: f64 = 32.0;
/// Mean luma at which the brightness half of exposure saturates.
const TARGET_MEAN_LUMA: f64 = 118.0;
/// RMS deviation from mid-gray that scores full contrast.
const FULL_CONTRAST_RMS: f64 = 80.0;
/// Mean gradient magnitude that scores full sharpness.
const FULL_SHARPNESS_GRADIENT: f64 = 40.0;
/// Local gradient below which a pixel is considered flat.
const FLAT_GRADIENT: f64 = 24.0;
/// Mean flat-region residual that scores zero.
const NOISE_SCALE: f64 = 24.0;

/// Improvement above which a metric change is significant.
pub const SIGNIFICANT_IMPROVEMENT: f64 = 0.10;
/// Change below which a metric counts as degraded.
pub const DEGRADATION_THRESHOLD: f64 = -0.05;

/// Quality scores for one image.
///
/// Deserializing recomputes `overall` from the components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "MetricComponents")]
pub struct QualityMetrics {
    exposure: f64,
    contrast: f64,
    sharpness: f64,
    color_balance: f64,
    noise: f64,
    overall: f64,
}

impl QualityMetrics {
    /// Build metrics from components, clamping each to `[0, 1]`.
    pub fn new(exposure: f64, contrast: f64, sharpness: f64, color_balance: f64, noise: f64) -> Self {
        let c = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        let (exposure, contrast, sharpness, color_balance, noise) =
            (c(exposure), c(contrast), c(sharpness), c(color_balance), c(noise));
        let overall = EXPOSURE_WEIGHT * exposure
            + CONTRAST_WEIGHT * contrast
            + SHARPNESS_WEIGHT * sharpness
            + COLOR_BALANCE_WEIGHT * color_balance
            + NOISE_WEIGHT * noise;
        Self {
            exposure,
            contrast,
            sharpness,
            color_balance,
            noise,
            overall,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0.0)
    }

    pub fn exposure(&self) -> f64 {
        self.exposure
    }

    pub fn contrast(&self) -> f64 {
        self.contrast
    }

    pub fn sharpness(&self) -> f64 {
        self.sharpness
    }

    pub fn color_balance(&self) -> f64 {
        self.color_balance
    }

    /// Higher means cleaner.
    pub fn noise(&self) -> f64 {
        self.noise
    }

    pub fn overall(&self) -> f64 {
        self.overall
    }

    /// Named component scores, excluding `overall`.
    pub fn components(&self) -> [(&'static str, f64); 5] {
        [
            ("exposure", self.exposure),
            ("contrast", self.contrast),
            ("sharpness", self.sharpness),
            ("color_balance", self.color_balance),
            ("noise", self.noise),
        ]
    }
}

#[derive(Deserialize)]
struct MetricComponents {
    exposure: f64,
    contrast: f64,
    sharpness: f64,
    color_balance: f64,
    noise: f64,
}

impl From<MetricComponents> for QualityMetrics {
    fn from(m: MetricComponents) -> Self {
        QualityMetrics::new(m.exposure, m.contrast, m.sharpness, m.color_balance, m.noise)
    }
}

/// Per-metric deltas (`after - before`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDeltas {
    pub exposure: f64,
    pub contrast: f64,
    pub sharpness: f64,
    pub color_balance: f64,
    pub noise: f64,
}

/// Result of scoring an image before and after enhancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityComparison {
    pub before: QualityMetrics,
    pub after: QualityMetrics,
    pub improvement: MetricDeltas,
    pub overall_improvement: f64,
    /// Metrics that improved by more than [`SIGNIFICANT_IMPROVEMENT`]
    pub significant_improvements: Vec<String>,
    /// Metrics that dropped below [`DEGRADATION_THRESHOLD`]
    pub degradations: Vec<String>,
}

fn luma_plane(buffer: &PixelBuffer) -> Vec<f64> {
    buffer.pixels().map(|p| p.luma()).collect()
}

fn exposure(luma: &[f64]) -> f64 {
    let n = luma.len() as f64;
    let shadows = luma.iter().filter(|&&l| l < SHADOW_LUMA).count() as f64;
    let mean = luma.iter().sum::<f64>() / n;
    0.5 * (1.0 - shadows / n) + 0.5 * (mean / TARGET_MEAN_LUMA).min(1.0)
}

fn contrast(buffer: &PixelBuffer) -> f64 {
    let n = buffer.pixel_count() as f64;
    let mut sum_sq = [0.0f64; 3];
    for p in buffer.pixels() {
        for (acc, c) in sum_sq.iter_mut().zip([p.r, p.g, p.b]) {
            let d = c as f64 - 128.0;
            *acc += d * d;
        }
    }
    let rms = sum_sq.iter().map(|s| (s / n).sqrt()).sum::<f64>() / 3.0;
    rms / FULL_CONTRAST_RMS
}

/// Absolute forward differences at `(x, y)`; zero at the right/bottom edge.
fn gradient_at(luma: &[f64], width: usize, height: usize, x: usize, y: usize) -> f64 {
    let i = y * width + x;
    let dx = if x + 1 < width { (luma[i + 1] - luma[i]).abs() } else { 0.0 };
    let dy = if y + 1 < height { (luma[i + width] - luma[i]).abs() } else { 0.0 };
    dx + dy
}

fn sharpness(luma: &[f64], width: usize, height: usize) -> f64 {
    let mut total = 0.0;
    for y in 0..height {
        for x in 0..width {
            total += gradient_at(luma, width, height, x, y);
        }
    }
    total / luma.len() as f64 / FULL_SHARPNESS_GRADIENT
}

fn color_balance(buffer: &PixelBuffer) -> f64 {
    let n = buffer.pixel_count() as f64;
    let mut sums = [0.0f64; 3];
    for p in buffer.pixels() {
        sums[0] += p.r as f64;
        sums[1] += p.g as f64;
        sums[2] += p.b as f64;
    }
    let means = sums.map(|s| s / n);
    let max = means.iter().cloned().fold(f64::MIN, f64::max);
    let min = means.iter().cloned().fold(f64::MAX, f64::min);
    1.0 - (max - min) / 128.0
}

fn noise(luma: &[f64], width: usize, height: usize) -> f64 {
    let mut residual = 0.0;
    let mut samples = 0usize;

    for y in 0..height {
        for x in 0..width {
            if gradient_at(luma, width, height, x, y) >= FLAT_GRADIENT {
                continue;
            }
            let i = y * width + x;
            let mut sum = 0.0;
            let mut count = 0.0;
            if x > 0 {
                sum += luma[i - 1];
                count += 1.0;
            }
            if x + 1 < width {
                sum += luma[i + 1];
                count += 1.0;
            }
            if y > 0 {
                sum += luma[i - width];
                count += 1.0;
            }
            if y + 1 < height {
                sum += luma[i + width];
                count += 1.0;
            }
            if count > 0.0 {
                residual += (luma[i] - sum / count).abs();
                samples += 1;
            }
        }
    }

    if samples == 0 {
        return 1.0;
    }
    1.0 - residual / samples as f64 / NOISE_SCALE
}

/// Score a buffer. Empty buffers, and buffers whose data does not match
/// their dimensions, score all zeros.
pub fn analyze(buffer: &PixelBuffer) -> QualityMetrics {
    if buffer.is_empty() || buffer.width == 0 || buffer.height == 0 || !buffer.is_consistent() {
        return QualityMetrics::zero();
    }
    let width = buffer.width as usize;
    let height = buffer.height as usize;
    let luma = luma_plane(buffer);

    QualityMetrics::new(
        exposure(&luma),
        contrast(buffer),
        sharpness(&luma, width, height),
        color_balance(buffer),
        noise(&luma, width, height),
    )
}

/// Compare two metric sets.
pub fn compare(before: &QualityMetrics, after: &QualityMetrics) -> QualityComparison {
    let mut significant = Vec::new();
    let mut degradations = Vec::new();

    for ((name, b), (_, a)) in before.components().into_iter().zip(after.components()) {
        let delta = a - b;
        if delta > SIGNIFICANT_IMPROVEMENT {
            significant.push(name.to_string());
        } else if delta < DEGRADATION_THRESHOLD {
            degradations.push(name.to_string());
        }
    }

    QualityComparison {
        before: *before,
        after: *after,
        improvement: MetricDeltas {
            exposure: after.exposure - before.exposure,
            contrast: after.contrast - before.contrast,
            sharpness: after.sharpness - before.sharpness,
            color_balance: after.color_balance - before.color_balance,
            noise: after.noise - before.noise,
        },
        overall_improvement: after.overall - before.overall,
        significant_improvements: significant,
        degradations,
    }
}

/// Score both buffers and compare them.
pub fn compare_buffers(before: &PixelBuffer, after: &PixelBuffer) -> QualityComparison {
    compare(&analyze(before), &analyze(after))
}

/// Strength factor applied when any metric degraded.
const BACK_OFF: f64 = 0.8;
/// Strength factor applied when the edit barely helped.
const PUSH_HARDER: f64 = 1.2;
/// Overall improvement below which the edit counts as too timid.
const MIN_USEFUL_IMPROVEMENT: f64 = 0.05;

/// Adjust a config's strength based on how the last attempt scored.
pub fn suggest_optimal_config(
    config: &EditingConfig,
    comparison: &QualityComparison,
) -> EditingConfig {
    let mut next = config.clone();
    if !comparison.degradations.is_empty() {
        next.strength = config.strength * BACK_OFF;
    } else if comparison.overall_improvement < MIN_USEFUL_IMPROVEMENT {
        next.strength = (config.strength * PUSH_HARDER).min(1.0);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{pixel, Pixel, TransformOptions};
    use crate::engine::apply_options;
    use crate::test_support::gradient;
    use crate::types::Priority;
    use proptest::prelude::*;

    /// Deterministic pseudo-random pixels derived from `seed`.
    fn noisy(seed: u64, w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::from_fn(w, h, |x, y| {
            let v = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(((y * w + x) as u64).wrapping_mul(1442695040888963407));
            Pixel::rgb((v >> 8) as u8, (v >> 24) as u8, (v >> 40) as u8)
        })
    }

    fn solid(v: u8) -> PixelBuffer {
        PixelBuffer::from_fn(8, 8, |_, _| Pixel::gray(v))
    }

    #[test]
    fn test_empty_buffer_scores_zero() {
        let empty = PixelBuffer::new(0, 0, vec![]).unwrap();
        assert_eq!(analyze(&empty), QualityMetrics::zero());
        assert_eq!(analyze(&empty).overall(), 0.0);
    }

    #[test]
    fn test_mismatched_buffer_scores_zero() {
        let short = PixelBuffer {
            width: 4,
            height: 4,
            data: vec![0; 8],
        };
        assert!(!short.is_consistent());
        assert_eq!(analyze(&short), QualityMetrics::zero());
    }

    #[test]
    fn test_solid_gray() {
        let m = analyze(&solid(128));
        assert_eq!(m.contrast(), 0.0);
        assert_eq!(m.sharpness(), 0.0);
        assert_eq!(m.color_balance(), 1.0);
        assert!(m.noise() > 0.999_999);
        assert_eq!(m.exposure(), 1.0);
    }

    #[test]
    fn test_black_image_underexposed() {
        let m = analyze(&solid(0));
        assert_eq!(m.exposure(), 0.0);
    }

    #[test]
    fn test_color_cast_lowers_balance() {
        let red = PixelBuffer::from_fn(4, 4, |_, _| Pixel::rgb(200, 72, 72));
        let m = analyze(&red);
        assert!((m.color_balance() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_checkerboard_is_sharp_and_not_flat() {
        let checker =
            PixelBuffer::from_fn(8, 8, |x, y| Pixel::gray(if (x + y) % 2 == 0 { 0 } else { 255 }));
        let m = analyze(&checker);
        assert_eq!(m.sharpness(), 1.0);
        // only the bottom-right corner is flat, and it differs from both neighbours
        assert_eq!(m.noise(), 0.0);
    }

    #[test]
    fn test_brightening_does_not_lower_exposure() {
        let dark = gradient(16, 16).map_pixels(|p| pixel::brightness(p, -40.0));
        let brighter = apply_options(
            &dark,
            &TransformOptions {
                brightness: Some(20.0),
                ..Default::default()
            },
        );
        assert!(analyze(&brighter).exposure() >= analyze(&dark).exposure());
    }

    #[test]
    fn test_compare_classifies_changes() {
        let before = QualityMetrics::new(0.3, 0.5, 0.5, 0.9, 0.8);
        let after = QualityMetrics::new(0.6, 0.52, 0.5, 0.8, 0.8);
        let cmp = compare(&before, &after);
        assert_eq!(cmp.significant_improvements, vec!["exposure".to_string()]);
        assert_eq!(cmp.degradations, vec!["color_balance".to_string()]);
        assert!((cmp.improvement.exposure - 0.3).abs() < 1e-12);
        assert!((cmp.overall_improvement - (after.overall() - before.overall())).abs() < 1e-12);
    }

    fn config(strength: f64) -> EditingConfig {
        EditingConfig {
            steps: vec![],
            strength,
            priority: Priority::Quality,
            style: "t".to_string(),
            preset_id: None,
        }
    }

    #[test]
    fn test_suggest_backs_off_on_degradation() {
        let before = QualityMetrics::new(0.5, 0.5, 0.5, 0.9, 0.5);
        let after = QualityMetrics::new(0.9, 0.9, 0.5, 0.5, 0.5);
        let next = suggest_optimal_config(&config(0.5), &compare(&before, &after));
        assert!((next.strength - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_suggest_pushes_when_timid() {
        let m = QualityMetrics::new(0.5, 0.5, 0.5, 0.5, 0.5);
        let next = suggest_optimal_config(&config(0.9), &compare(&m, &m));
        assert_eq!(next.strength, 1.0);
        let next = suggest_optimal_config(&config(0.5), &compare(&m, &m));
        assert!((next.strength - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_suggest_keeps_good_result() {
        let before = QualityMetrics::new(0.3, 0.3, 0.5, 0.5, 0.5);
        let after = QualityMetrics::new(0.6, 0.6, 0.5, 0.5, 0.5);
        let next = suggest_optimal_config(&config(0.7), &compare(&before, &after));
        assert_eq!(next.strength, 0.7);
    }

    #[test]
    fn test_deserialize_recomputes_overall() {
        let json = r#"{"exposure":1.0,"contrast":1.0,"sharpness":1.0,"color_balance":1.0,"noise":1.0,"overall":0.1}"#;
        let m: QualityMetrics = serde_json::from_str(json).unwrap();
        assert!((m.overall() - 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_overall_is_weighted_sum(
            e in 0.0..=1.0f64, c in 0.0..=1.0f64, s in 0.0..=1.0f64,
            b in 0.0..=1.0f64, n in 0.0..=1.0f64,
        ) {
            let m = QualityMetrics::new(e, c, s, b, n);
            let expected = 0.25 * e + 0.20 * c + 0.25 * s + 0.15 * b + 0.15 * n;
            prop_assert!((m.overall() - expected).abs() < 1e-12);
        }

        #[test]
        fn prop_metrics_in_unit_range(seed in any::<u64>(), w in 1u32..12, h in 1u32..12) {
            let m = analyze(&noisy(seed, w, h));
            for (_, v) in m.components() {
                prop_assert!((0.0..=1.0).contains(&v));
            }
            prop_assert!((0.0..=1.0).contains(&m.overall()));
        }

        #[test]
        fn prop_brightening_never_lowers_exposure(
            seed in any::<u64>(), w in 2u32..10, h in 2u32..10, d in 0.0..=100.0f64,
        ) {
            let buffer = noisy(seed, w, h);
            let brighter = buffer.map_pixels(|p| pixel::brightness(p, d));
            prop_assert!(analyze(&brighter).exposure() >= analyze(&buffer).exposure() - 1e-12);
        }

        #[test]
        fn prop_more_contrast_never_lowers_contrast(
            seed in any::<u64>(), w in 2u32..10, h in 2u32..10, d in 0.0..=100.0f64,
        ) {
            let buffer = noisy(seed, w, h);
            let punchier = buffer.map_pixels(|p| pixel::contrast(p, d));
            prop_assert!(analyze(&punchier).contrast() >= analyze(&buffer).contrast() - 1e-12);
        }
    }
}
