//! Per-pixel color math.
//!
//! Every function here is total: out-of-range inputs are clamped, never
//! rejected. Deltas follow the `TransformOptions` convention (percent-style
//! values where `0` means no change).

use serde::{Deserialize, Serialize};

/// An 8-bit RGBA pixel. Channels are in range by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// Opaque pixel from RGB.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Gray pixel with all color channels set to `v`.
    pub const fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }

    /// Apply `f` to the three color channels, keeping alpha.
    #[inline]
    pub fn map_rgb(self, mut f: impl FnMut(u8) -> u8) -> Self {
        Self {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
            a: self.a,
        }
    }

    /// Rec. 601 luma in 0..=255.
    #[inline]
    pub fn luma(self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }
}

/// HSV re-encoding of a pixel used by saturation and hue operations.
///
/// `h` in `[0, 360)`, `s` and `v` in `[0, 1]`. Alpha rides along so the
/// round trip does not drop it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvPixel {
    pub h: f64,
    pub s: f64,
    pub v: f64,
    pub a: u8,
}

/// Round and clamp a channel value into `0..=255`. NaN maps to 0.
#[inline]
pub fn clamp(x: f64) -> u8 {
    if x.is_nan() {
        return 0;
    }
    x.round().clamp(0.0, 255.0) as u8
}

#[inline]
fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Shift every color channel by `b/100 * 255`.
pub fn brightness(p: Pixel, b: f64) -> Pixel {
    let offset = b / 100.0 * 255.0;
    p.map_rgb(|c| clamp(c as f64 + offset))
}

/// Scale channel distance from mid-gray (128) by `1 + c/100`.
///
/// 128 is the fixed point for any `c`.
pub fn contrast(p: Pixel, c: f64) -> Pixel {
    let factor = 1.0 + c / 100.0;
    p.map_rgb(|ch| clamp((ch as f64 - 128.0) * factor + 128.0))
}

/// Smallest gamma accepted before the exponent blows up.
const MIN_GAMMA: f64 = 1e-3;

/// `255 * (c/255)^(1/g)`. Endpoints 0 and 255 are invariant.
pub fn gamma(p: Pixel, g: f64) -> Pixel {
    let exponent = 1.0 / g.max(MIN_GAMMA);
    p.map_rgb(|c| gamma_channel(c, exponent))
}

#[inline]
pub(crate) fn gamma_channel(c: u8, exponent: f64) -> u8 {
    clamp(255.0 * (c as f64 / 255.0).powf(exponent))
}

/// Standard RGB to HSV conversion.
pub fn to_hsv(p: Pixel) -> HsvPixel {
    let r = p.r as f64 / 255.0;
    let g = p.g as f64 / 255.0;
    let b = p.b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    HsvPixel {
        h: h.rem_euclid(360.0),
        s,
        v: max,
        a: p.a,
    }
}

/// Standard HSV to RGB conversion. Inputs are wrapped/clamped first.
pub fn from_hsv(hsv: HsvPixel) -> Pixel {
    let h = hsv.h.rem_euclid(360.0);
    let s = clamp01(hsv.s);
    let v = clamp01(hsv.v);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    Pixel {
        r: clamp((r + m) * 255.0),
        g: clamp((g + m) * 255.0),
        b: clamp((b + m) * 255.0),
        a: hsv.a,
    }
}

/// Scale HSV saturation by `1 + s_delta/100`.
pub fn saturation(p: Pixel, s_delta: f64) -> Pixel {
    let mut hsv = to_hsv(p);
    hsv.s = clamp01(hsv.s * (1.0 + s_delta / 100.0));
    from_hsv(hsv)
}

/// Rotate hue by `deg` degrees.
pub fn hue(p: Pixel, deg: f64) -> Pixel {
    let mut hsv = to_hsv(p);
    hsv.h = (hsv.h + deg).rem_euclid(360.0);
    from_hsv(hsv)
}

/// Multiply each channel by `1 + delta/100`.
pub fn channel_scale(p: Pixel, r: f64, g: f64, b: f64) -> Pixel {
    Pixel {
        r: clamp(p.r as f64 * (1.0 + r / 100.0)),
        g: clamp(p.g as f64 * (1.0 + g / 100.0)),
        b: clamp(p.b as f64 * (1.0 + b / 100.0)),
        a: p.a,
    }
}
