//! Circular (hue) arithmetic and color separation metrics.
//!
//! Hue lives on a 360° circle, so differences, averages, and interpolation
//! must go through vector space and `atan2` rather than raw degree
//! arithmetic. A linear average of 350° and 10° gives 180° — the exact
//! opposite of the correct answer, 0°.

use crate::color::Lch;

/// Default lightness weight for [`perceptual_distance`].
pub const DEFAULT_LIGHTNESS_WEIGHT: f64 = 0.4;

/// Reduce a hue in degrees to [0, 360)
#[inline]
pub fn normalize_hue(h: f64) -> f64 {
    let h = h.rem_euclid(360.0);
    // rem_euclid of a tiny negative rounds up to exactly 360.0, which would
    // leak out of the half-open range.
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Signed shortest angular distance from `h2` to `h1`, in (-180, 180].
#[inline]
pub fn hue_difference(h1: f64, h2: f64) -> f64 {
    let d = (h1 - h2 + 180.0).rem_euclid(360.0) - 180.0;
    if d == -180.0 {
        180.0
    } else {
        d
    }
}

/// Weighted circular average of two hues, in [0, 360).
///
/// Both hues become unit vectors, the weighted vector sum is taken, and the
/// result comes back through `atan2`. Weights need not be normalized.
pub fn weighted_hue_average(h1: f64, h2: f64, weight1: f64, weight2: f64) -> f64 {
    let a1 = h1.to_radians();
    let a2 = h2.to_radians();
    let y = weight1 * a1.sin() + weight2 * a2.sin();
    let x = weight1 * a1.cos() + weight2 * a2.cos();
    normalize_hue(y.atan2(x).to_degrees())
}

/// `n` hues evenly spaced along the shortest angular path from `h1` to `h2`,
/// endpoints included, each normalized to [0, 360).
///
/// A path that crosses the 0°/360° seam stays continuous: the walk happens in
/// vector space, never on the raw degree values.
pub fn evenly_spaced_hues(h1: f64, h2: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![normalize_hue(h1)];
    }
    let r1 = h1.to_radians();
    let dr = hue_difference(h2, h1).to_radians();
    (0..n)
        .map(|i| {
            let r = r1 + dr * i as f64 / (n - 1) as f64;
            normalize_hue(r.sin().atan2(r.cos()).to_degrees())
        })
        .collect()
}

/// Euclidean distance in the (chroma, hue) plane, hue-wrap aware.
///
/// With chroma per mille and hue in degrees the two axes have comparable
/// magnitudes, so this is a sensible separation measure for boundary colors.
/// It is not a perceptual metric; see [`perceptual_distance`] for that.
pub fn chroma_hue_distance(color1: &Lch, color2: &Lch) -> f64 {
    let dh = hue_difference(color1.h, color2.h);
    let dc = color1.c - color2.c;
    dh.hypot(dc)
}

/// Minimum pairwise [`chroma_hue_distance`] over a set of colors.
///
/// Returns infinity for fewer than two colors.
pub fn min_chroma_hue_distance(colors: &[Lch]) -> f64 {
    let mut min_dist = f64::INFINITY;
    for i in 0..colors.len() {
        for j in (i + 1)..colors.len() {
            let d = chroma_hue_distance(&colors[i], &colors[j]);
            if d < min_dist {
                min_dist = d;
            }
        }
    }
    min_dist
}

/// Perceptual distance between two colors in Oklab.
///
/// Uses the norm `|color|² = wL·L² + |(a, b)|²` with the Euclidean norm on
/// the (a, b) plane; `lightness_weight` is `wL`
/// ([`DEFAULT_LIGHTNESS_WEIGHT`] discounts lightness, which suits
/// nearest-named-color lookup). The (a, b) term expands via the law of
/// cosines so no conversion out of LCH is needed.
pub fn perceptual_distance(color1: &Lch, color2: &Lch, lightness_weight: f64) -> f64 {
    let a1 = color1.h.to_radians();
    let a2 = color2.h.to_radians();
    let c1 = color1.c / 1000.0;
    let c2 = color2.c / 1000.0;
    let dab2 = c1 * c1 + c2 * c2 - 2.0 * c1 * c2 * (a1 - a2).cos();
    let dl = color1.l - color2.l;
    (lightness_weight * dl * dl + dab2).sqrt()
}
