//! Color conversion between encoded sRGB, linear RGB, and OKLCH.
//!
//! OKLCH is the cylindrical form of Björn Ottosson's Oklab space
//! (<https://bottosson.github.io/posts/oklab/>). Chroma is carried on a
//! per-mille scale (×1000), which puts a typical display gamut at roughly
//! 0–400 and lets the boundary search work with a tolerance of 1 unit.
//!
//! All conversions are analytic: two fixed 3×3 matrices and a component-wise
//! cube root, plus the standard two-segment sRGB transfer function. Everything
//! is f64; the round-trip contract below is tighter than f32 can hold through
//! a cube root and a 2.4 power.
//!
//! Round-trip contract: for any encoded color with channels in [0, 1],
//! `lch_to_srgb(&srgb_to_lch(r, g, b))` reproduces the input within 1e-6 per
//! channel. Later stages rely on this.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hue::normalize_hue;

/// A color in OKLCH: lightness, chroma (per mille), hue (degrees).
///
/// `l` is perceptual lightness in [0, 1], `c` is chroma ≥ 0 on the per-mille
/// scale, `h` is hue in degrees, kept normalized to [0, 360).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Lch {
    /// Perceptual lightness, 0 (black) to 1 (white)
    pub l: f64,
    /// Chroma, per mille (0 = grey, ~400 = most saturated displayable)
    pub c: f64,
    /// Hue in degrees, [0, 360)
    pub h: f64,
}

impl Lch {
    /// Create an OKLCH color, normalizing the hue to [0, 360).
    pub fn new(l: f64, c: f64, h: f64) -> Self {
        Lch {
            l,
            c,
            h: normalize_hue(h),
        }
    }
}

// ============================================================================
// sRGB transfer function
// ============================================================================

/// Convert an encoded sRGB channel (0-1) to linear RGB
#[inline]
pub fn srgb_to_linear(x: f64) -> f64 {
    if x >= 0.04045 {
        ((x + 0.055) / 1.055).powf(2.4)
    } else {
        x / 12.92
    }
}

/// Convert a linear RGB channel to encoded sRGB, clamped to [0, 1].
///
/// The clamp is intentional: colors marginally outside the gamut from
/// rounding encode to a valid channel instead of raising.
#[inline]
pub fn linear_to_srgb(x: f64) -> f64 {
    let y = if x >= 0.0031308 {
        1.055 * x.max(0.0).powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * x
    };
    y.clamp(0.0, 1.0)
}

// ============================================================================
// Linear RGB ↔ OKLCH
// ============================================================================

/// Convert linear RGB (0-1) to OKLCH.
///
/// Linear sRGB → LMS → Oklab per Ottosson, then to cylindrical form with
/// chroma scaled ×1000 and hue normalized to [0, 360).
#[inline]
pub fn linear_rgb_to_lch(r: f64, g: f64, b: f64) -> Lch {
    // Linear sRGB to LMS
    let l = 0.4122214708 * r + 0.5363325363 * g + 0.0514459929 * b;
    let m = 0.2119034982 * r + 0.6806995451 * g + 0.1073969566 * b;
    let s = 0.0883024619 * r + 0.2817188376 * g + 0.6299787005 * b;

    let l_ = l.cbrt();
    let m_ = m.cbrt();
    let s_ = s.cbrt();

    // LMS' to Oklab
    let ok_l = 0.2104542553 * l_ + 0.7936177850 * m_ - 0.0040720468 * s_;
    let ok_a = 1.9779984951 * l_ - 2.4285922050 * m_ + 0.4505937099 * s_;
    let ok_b = 0.0259040371 * l_ + 0.7827717662 * m_ - 0.8086757660 * s_;

    let c = 1000.0 * ok_a.hypot(ok_b);
    let h = ok_b.atan2(ok_a).to_degrees();

    Lch::new(ok_l, c, h)
}

/// Convert OKLCH to linear RGB.
///
/// The inverse of [`linear_rgb_to_lch`]. The result may leave [0, 1] when the
/// input lies outside the sRGB gamut; [`in_gamut`] is the probe for that.
///
/// The two matrices here are the forward matrices inverted at full f64
/// precision, not the 10-digit published inverses: those are only ~1e-8
/// mutual inverses of the forward constants, and the 12.92 slope of the
/// linear sRGB segment stretches that residual past the 1e-6 round-trip
/// contract on dark channels.
#[inline]
pub fn lch_to_linear_rgb(color: &Lch) -> (f64, f64, f64) {
    let c = color.c / 1000.0;
    let a = c * color.h.to_radians().cos();
    let b = c * color.h.to_radians().sin();

    // Oklab to LMS'
    let l_ = 0.9999999984505198 * color.l + 0.3963377921737679 * a + 0.2158037580607588 * b;
    let m_ = 1.0000000088817609 * color.l - 0.1055613423236564 * a - 0.0638541747717059 * b;
    let s_ = 1.0000000546724108 * color.l - 0.0894841820949658 * a - 1.2914855378640917 * b;

    let l = l_ * l_ * l_;
    let m = m_ * m_ * m_;
    let s = s_ * s_ * s_;

    // LMS to linear sRGB
    let r = 4.0767416613479943 * l - 3.3077115904081933 * m + 0.2309699287294279 * s;
    let g = -1.2684380040921761 * l + 2.6097574006633715 * m - 0.3413193963102196 * s;
    let b_out = -0.0041960865418371 * l - 0.7034186144594496 * m + 1.7076147009309448 * s;

    (r, g, b_out)
}

/// Convert encoded sRGB (0-1) to OKLCH
#[inline]
pub fn srgb_to_lch(r: f64, g: f64, b: f64) -> Lch {
    linear_rgb_to_lch(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
}

/// Convert OKLCH to encoded sRGB, each channel clamped to [0, 1]
#[inline]
pub fn lch_to_srgb(color: &Lch) -> (f64, f64, f64) {
    let (r, g, b) = lch_to_linear_rgb(color);
    (linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b))
}

/// True if the linear RGB triple is strictly inside the sRGB cube.
///
/// Strict bounds: a channel exactly at 0 or 1 counts as on the boundary, not
/// inside, which is what the bisection in the gamut search needs.
#[inline]
pub fn in_gamut(r: f64, g: f64, b: f64) -> bool {
    r.min(g).min(b) > 0.0 && r.max(g).max(b) < 1.0
}
