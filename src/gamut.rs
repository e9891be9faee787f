//! Gamut boundary location by bisection.
//!
//! At a fixed lightness and hue, chroma-vs-in-gamut is empirically monotone:
//! grey is inside, huge chroma is outside, and the indicator flips exactly
//! once in between. That makes plain bisection on the in-gamut indicator the
//! whole algorithm. The bracket tolerance of 1 per-mille chroma unit is
//! deliberately coarse — differences below it are imperceptible, and finer
//! precision just slows the hue sweep down.

use crate::color::{in_gamut, lch_to_linear_rgb, Lch};
use crate::hue::chroma_hue_distance;

/// Chroma search range upper bound, safely above any sRGB chroma.
const CHROMA_UPPER_BOUND: f64 = 360.0;

/// Bracket tolerance for the chroma bisection, in per-mille units.
const CHROMA_TOLERANCE: f64 = 1.0;

/// Hue bracket tolerance for [`move_along_boundary`], in degrees.
const BOUNDARY_HUE_TOLERANCE: f64 = 0.1;

/// Find a root of `f` between `a` and `b` by bisection.
///
/// `a` and `b` are swapped first if given in the wrong order. The search
/// narrows by sign comparison and stops once the bracket is no wider than
/// `tol`, returning the end that kept the sign of `f(a)`.
///
/// `f` must change sign exactly once over the bracket; the sign-change
/// precondition is checked in debug builds only.
pub fn bisect<F>(a: f64, b: f64, f: F, tol: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = if a > b { (b, a) } else { (a, b) };
    debug_assert!(
        f(a).signum() != f(b).signum(),
        "bisect: f must change sign over [{a}, {b}]"
    );
    let sign_at_a = f(a).signum();
    while (b - a).abs() > tol {
        let mid = 0.5 * (a + b);
        if f(mid).signum() == sign_at_a {
            a = mid;
        } else {
            b = mid;
        }
    }
    a
}

/// Maximum chroma inside the sRGB gamut at the given lightness and hue.
///
/// `(l, max_chroma(l, h), h)` is the highest-chroma OKLCH point on that hue
/// ray that still converts to linear RGB strictly inside the unit cube,
/// up to the 1-unit bracket tolerance.
pub fn max_chroma(l: f64, h: f64) -> f64 {
    max_chroma_with_margin(l, h, 0.0)
}

/// [`max_chroma`] minus a fixed safety margin, for callers that want to stay
/// strictly inside the boundary rather than exactly on it.
pub fn max_chroma_with_margin(l: f64, h: f64, margin: f64) -> f64 {
    let f = |c: f64| {
        let (r, g, b) = lch_to_linear_rgb(&Lch::new(l, c, h));
        if in_gamut(r, g, b) {
            0.5
        } else {
            -0.5
        }
    };
    bisect(0.0, CHROMA_UPPER_BOUND, f, CHROMA_TOLERANCE) - margin
}

/// Clamp a chroma value to the gamut boundary at its lightness and hue.
pub fn clamp_to_gamut(l: f64, c: f64, h: f64) -> Lch {
    Lch::new(l, c.min(max_chroma(l, h)), h)
}

/// Find the boundary color at a given chroma-hue distance from `origin`.
///
/// Bisects hue between `origin.h` and `hue_guess` until the boundary point's
/// [`chroma_hue_distance`] from `origin` matches `distance`. `hue_guess` is
/// taken as unwrapped degrees relative to the origin hue (e.g. `origin.h +
/// 40.0`), and the separation must cross `distance` exactly once between the
/// two — the usual case when the origin sits on or near the boundary and the
/// guess overshoots. Places a color purely by separation, independent of hue
/// position.
pub fn move_along_boundary(origin: &Lch, distance: f64, hue_guess: f64) -> Lch {
    let l = origin.l;
    let boundary = |h: f64| Lch::new(l, max_chroma(l, h), h);
    let h = bisect(
        origin.h,
        hue_guess,
        |h| chroma_hue_distance(origin, &boundary(h)) - distance,
        BOUNDARY_HUE_TOLERANCE,
    );
    boundary(h)
}
