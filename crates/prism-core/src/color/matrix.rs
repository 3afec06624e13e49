//! Affine 4x5 color matrices.
//!
//! Each row produces one output channel (R, G, B, A) as a linear
//! combination of the input R, G, B, A plus a constant offset in 0..=255
//! units. Matrices compose by [`ColorMatrix::concat`]; composition is
//! associative but not commutative, so callers must keep authored order.
//!
//! Gamma is nonlinear and deliberately absent here; see [`GammaLut`].

use serde::{Deserialize, Serialize};

use super::options::TransformOptions;
use super::pixel::{self, Pixel};

/// Rec. 601 luminance weights used by the saturation matrix.
pub const LUMINANCE: [f64; 3] = [0.299, 0.587, 0.114];

/// Row-major 4x5 affine color transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorMatrix {
    m: [f64; 20],
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorMatrix {
    #[rustfmt::skip]
    const IDENTITY: [f64; 20] = [
        1.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0, 0.0,
    ];

    /// Build a matrix from 20 row-major coefficients.
    pub const fn from_array(m: [f64; 20]) -> Self {
        Self { m }
    }

    /// The no-op transform.
    pub const fn identity() -> Self {
        Self { m: Self::IDENTITY }
    }

    /// Raw coefficients, row-major.
    pub fn as_array(&self) -> &[f64; 20] {
        &self.m
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> f64 {
        self.m[row * 5 + col]
    }

    pub fn is_identity(&self) -> bool {
        self.m == Self::IDENTITY
    }

    /// Add `b/100 * 255` to each color channel.
    pub fn brightness(b: f64) -> Self {
        let offset = b / 100.0 * 255.0;
        let mut m = Self::IDENTITY;
        m[4] = offset;
        m[9] = offset;
        m[14] = offset;
        Self { m }
    }

    /// Scale around mid-gray: factor `1 + c/100`, offset `128 * (1 - factor)`.
    pub fn contrast(c: f64) -> Self {
        let factor = 1.0 + c / 100.0;
        let offset = 128.0 * (1.0 - factor);
        Self::diagonal(factor, factor, factor, offset)
    }

    /// Blend each row toward the luminance vector.
    ///
    /// `row_i = lum * (1 - sat) + sat * unit_i` where `sat = 1 + s/100`.
    pub fn saturation(s: f64) -> Self {
        let sat = 1.0 + s / 100.0;
        let inv = 1.0 - sat;
        let [lr, lg, lb] = LUMINANCE;
        #[rustfmt::skip]
        let m = [
            lr * inv + sat, lg * inv,       lb * inv,       0.0, 0.0,
            lr * inv,       lg * inv + sat, lb * inv,       0.0, 0.0,
            lr * inv,       lg * inv,       lb * inv + sat, 0.0, 0.0,
            0.0,            0.0,            0.0,            1.0, 0.0,
        ];
        Self { m }
    }

    /// Rotate hue around the luminance axis (SVG `feColorMatrix` hueRotate).
    ///
    /// Rows sum to 1, so neutral grays are unchanged.
    pub fn hue_rotate(deg: f64) -> Self {
        let (sin, cos) = deg.to_radians().sin_cos();
        #[rustfmt::skip]
        let m = [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
            0.0, 0.0,

            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
            0.0, 0.0,

            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
            0.0, 0.0,

            0.0, 0.0, 0.0, 1.0, 0.0,
        ];
        Self { m }
    }

    /// Per-channel gain of `1 + delta/100`; diagonal only.
    pub fn channel_scale(r: f64, g: f64, b: f64) -> Self {
        let mut m = Self::IDENTITY;
        m[0] = 1.0 + r / 100.0;
        m[6] = 1.0 + g / 100.0;
        m[12] = 1.0 + b / 100.0;
        Self { m }
    }

    fn diagonal(r: f64, g: f64, b: f64, offset: f64) -> Self {
        let mut m = Self::IDENTITY;
        m[0] = r;
        m[6] = g;
        m[12] = b;
        m[4] = offset;
        m[9] = offset;
        m[14] = offset;
        Self { m }
    }

    /// Compose two transforms: `b` is applied first, then `a`.
    pub fn concat(a: &ColorMatrix, b: &ColorMatrix) -> ColorMatrix {
        let mut m = [0.0; 20];
        for row in 0..4 {
            for col in 0..5 {
                let mut sum: f64 = (0..4).map(|k| a.at(row, k) * b.at(k, col)).sum();
                if col == 4 {
                    sum += a.at(row, 4);
                }
                m[row * 5 + col] = sum;
            }
        }
        ColorMatrix { m }
    }

    /// Return a matrix equivalent to applying `self` and then `next`.
    pub fn then(&self, next: &ColorMatrix) -> ColorMatrix {
        Self::concat(next, self)
    }

    /// Fold a list of matrices given in application order.
    pub fn compose(matrices: &[ColorMatrix]) -> ColorMatrix {
        matrices
            .iter()
            .fold(ColorMatrix::identity(), |acc, m| acc.then(m))
    }

    /// Build the canonical affine pipeline for a set of options.
    ///
    /// Order is fixed: brightness, contrast, saturation, hue, channel scale.
    /// Gamma is not included.
    pub fn from_options(options: &TransformOptions) -> ColorMatrix {
        let mut stages = Vec::with_capacity(5);
        if let Some(b) = options.brightness.filter(|v| *v != 0.0) {
            stages.push(Self::brightness(b));
        }
        if let Some(c) = options.contrast.filter(|v| *v != 0.0) {
            stages.push(Self::contrast(c));
        }
        if let Some(s) = options.saturation.filter(|v| *v != 0.0) {
            stages.push(Self::saturation(s));
        }
        if let Some(h) = options.hue.filter(|v| *v != 0.0) {
            stages.push(Self::hue_rotate(h));
        }
        if options.has_channel_scale() {
            stages.push(Self::channel_scale(
                options.red_channel.unwrap_or(0.0),
                options.green_channel.unwrap_or(0.0),
                options.blue_channel.unwrap_or(0.0),
            ));
        }
        Self::compose(&stages)
    }

    /// Transform one pixel, clamping each output channel.
    #[inline]
    pub fn apply(&self, p: Pixel) -> Pixel {
        let input = [p.r as f64, p.g as f64, p.b as f64, p.a as f64];
        let channel = |row: usize| {
            let base = row * 5;
            pixel::clamp(
                self.m[base] * input[0]
                    + self.m[base + 1] * input[1]
                    + self.m[base + 2] * input[2]
                    + self.m[base + 3] * input[3]
                    + self.m[base + 4],
            )
        };
        Pixel {
            r: channel(0),
            g: channel(1),
            b: channel(2),
            a: channel(3),
        }
    }

    /// Largest absolute coefficient difference, for tolerance checks.
    pub fn max_abs_diff(&self, other: &ColorMatrix) -> f64 {
        self.m
            .iter()
            .zip(other.m.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

/// Precomputed 256-entry table for the nonlinear gamma pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaLut {
    table: [u8; 256],
}

impl GammaLut {
    pub fn new(gamma: f64) -> Self {
        let mut table = [0u8; 256];
        let gray = |v: u8| pixel::gamma(Pixel::gray(v), gamma).r;
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = gray(i as u8);
        }
        Self { table }
    }

    /// Build a table only when the gamma actually changes something.
    pub fn for_options(options: &TransformOptions) -> Option<Self> {
        options
            .gamma
            .filter(|g| (*g - 1.0).abs() > f64::EPSILON)
            .map(Self::new)
    }

    #[inline]
    pub fn apply(&self, p: Pixel) -> Pixel {
        p.map_rgb(|c| self.table[c as usize])
    }
}
