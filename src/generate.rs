//! Boundary color generation.
//!
//! The orchestrator: detect the primary chroma peaks at a lightness, place
//! secondary colors between them, and return the lot sorted by hue from the
//! green anchor. Two secondary-color policies exist side by side:
//!
//! * [`SecondaryPolicy::InterpolatedMidpoint`] — magentas evenly spaced
//!   between blue and red, cyans between blue and green, each re-clamped to
//!   the gamut boundary.
//! * [`SecondaryPolicy::NeighborBlend`] — the midpoint placement plus a
//!   per-color shift in (-1, 1) that blends each color toward its left
//!   (negative) or right (positive) hue neighbor.
//!
//! Every color that comes out of here satisfies `c ≤ max_chroma(l, h)`.

use std::cmp::Ordering;

use tracing::debug;

use crate::color::Lch;
use crate::gamut::clamp_to_gamut;
use crate::hue::{evenly_spaced_hues, normalize_hue, weighted_hue_average};
use crate::peaks::{
    expect_anchors, find_peaks, PeakDetectionError, PeakDetectionParams, DEFAULT_START_HUE,
};

/// Lowest lightness the generator accepts. Below this the gamut boundary
/// flattens toward black and peak detection becomes unreliable.
pub const MIN_LIGHTNESS: f64 = 0.3;

/// Highest lightness the generator accepts (boundary flattens toward white).
pub const MAX_LIGHTNESS: f64 = 0.7;

/// Sort-key offset so a color exactly at the reference hue sorts first
/// instead of wrapping to last.
const SORT_EPSILON: f64 = 0.1;

/// How the secondary colors between the anchors are placed.
#[derive(Clone, Debug, PartialEq)]
pub enum SecondaryPolicy {
    /// Evenly spaced hues between the anchors, clamped to the boundary.
    InterpolatedMidpoint,
    /// Midpoint placement followed by a per-color blend toward a hue
    /// neighbor. One shift per generated color, in (-1, 1): 0 leaves the
    /// color unchanged, negative values blend toward the left (previous)
    /// neighbor, positive toward the right, and the magnitude is the blend
    /// strength.
    NeighborBlend {
        /// One shift per generated color, `3 + n_magenta + n_cyan` in total
        shifts: Vec<f64>,
    },
}

/// Options for [`generate_with`].
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    /// Colors placed between the blue and red anchors
    pub n_magenta: usize,
    /// Colors placed between the blue and green anchors
    pub n_cyan: usize,
    /// Secondary-color placement policy
    pub policy: SecondaryPolicy,
    /// Peak detector tuning, overridable per call for diagnostic retries
    pub params: PeakDetectionParams,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            n_magenta: 1,
            n_cyan: 1,
            policy: SecondaryPolicy::InterpolatedMidpoint,
            params: PeakDetectionParams::default(),
        }
    }
}

/// Generation failed before producing a color list.
#[derive(Clone, Debug, thiserror::Error)]
pub enum GenerateError {
    /// Lightness outside the supported band; rejected before any sampling.
    #[error("lightness {lightness} is outside the supported range [0.3, 0.7]")]
    LightnessOutOfRange { lightness: f64 },
    /// The peak detector found a peak count outside 3–4.
    #[error(transparent)]
    PeakDetection(#[from] PeakDetectionError),
    /// The shift list does not have one entry per generated color.
    #[error("expected {expected} shifts (one per generated color), got {actual}")]
    ShiftCount { expected: usize, actual: usize },
    /// A shift fell outside (-1, 1).
    #[error("shift {value} at index {index} is outside (-1, 1)")]
    ShiftOutOfRange { index: usize, value: f64 },
}

/// Generate boundary colors at lightness `l` with default options: one
/// magenta, one cyan, midpoint placement.
///
/// Returns 5 colors sorted by hue from the green anchor.
pub fn generate(l: f64) -> Result<Vec<Lch>, GenerateError> {
    generate_with(l, &GenerateOptions::default())
}

/// Generate boundary colors at lightness `l`.
///
/// Detects the green, blue, and red chroma peaks, places `n_magenta` colors
/// between blue and red and `n_cyan` between blue and green, applies the
/// secondary-color policy, and returns `3 + n_magenta + n_cyan` colors
/// sorted by hue starting from the green anchor. Every returned color lies
/// on or inside the gamut boundary.
pub fn generate_with(l: f64, options: &GenerateOptions) -> Result<Vec<Lch>, GenerateError> {
    if !(MIN_LIGHTNESS..=MAX_LIGHTNESS).contains(&l) {
        return Err(GenerateError::LightnessOutOfRange { lightness: l });
    }
    let expected = 3 + options.n_magenta + options.n_cyan;
    if let SecondaryPolicy::NeighborBlend { shifts } = &options.policy {
        if shifts.len() != expected {
            return Err(GenerateError::ShiftCount {
                expected,
                actual: shifts.len(),
            });
        }
        for (index, &value) in shifts.iter().enumerate() {
            if value <= -1.0 || value >= 1.0 {
                return Err(GenerateError::ShiftOutOfRange { index, value });
            }
        }
    }

    let (peaks, diagnostics) = find_peaks(l, DEFAULT_START_HUE, &options.params);
    let anchors = expect_anchors(l, peaks, diagnostics, &options.params)?;

    let mut colors = vec![anchors.green, anchors.blue, anchors.red];
    colors.extend(between(&anchors.blue, &anchors.red, options.n_magenta));
    colors.extend(between(&anchors.blue, &anchors.green, options.n_cyan));
    let colors = hue_sorted(&colors, anchors.green.h);

    let colors = match &options.policy {
        SecondaryPolicy::InterpolatedMidpoint => colors,
        SecondaryPolicy::NeighborBlend { shifts } => apply_shifts(&colors, shifts),
    };
    debug!(
        lightness = l,
        count = colors.len(),
        "generated boundary colors"
    );
    Ok(colors)
}

/// Colors sorted by hue starting from `start_hue`.
///
/// The sort key offsets the reference by [`SORT_EPSILON`] so a color exactly
/// at the start hue sorts first rather than wrapping around to last.
pub fn hue_sorted(colors: &[Lch], start_hue: f64) -> Vec<Lch> {
    let key = |color: &Lch| normalize_hue(color.h - (start_hue - SORT_EPSILON));
    let mut sorted = colors.to_vec();
    sorted.sort_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal));
    sorted
}

/// Evenly spaced boundary colors from `color1` to `color2` in the chroma-hue
/// plane, both endpoints included.
///
/// Chroma interpolates linearly and hue circularly along the shortest path;
/// each point is clamped back to the gamut boundary, since a straight chord
/// between two boundary points can leave the gamut. Lightness is taken from
/// `color1`.
pub fn evenly_spaced_colors(color1: &Lch, color2: &Lch, n: usize) -> Vec<Lch> {
    let l = color1.l;
    let hues = evenly_spaced_hues(color1.h, color2.h, n);
    hues.into_iter()
        .enumerate()
        .map(|(i, h)| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            let c = color1.c + (color2.c - color1.c) * t;
            clamp_to_gamut(l, c, h)
        })
        .collect()
}

/// Weighted blend of two colors in the chroma-hue plane, clamped to the
/// boundary. Lightness is taken from `color1`; weights should sum to 1.
pub fn blend(color1: &Lch, color2: &Lch, weight1: f64, weight2: f64) -> Lch {
    clamp_to_gamut(
        color1.l,
        weight1 * color1.c + weight2 * color2.c,
        weighted_hue_average(color1.h, color2.h, weight1, weight2),
    )
}

/// `n` interior colors between two anchors (endpoints dropped).
fn between(from: &Lch, to: &Lch, n: usize) -> Vec<Lch> {
    let mut colors = evenly_spaced_colors(from, to, n + 2);
    colors.pop();
    colors.remove(0);
    colors
}

/// Blend each color toward a hue neighbor according to its shift.
fn apply_shifts(colors: &[Lch], shifts: &[f64]) -> Vec<Lch> {
    let n = colors.len();
    (0..n)
        .map(|i| {
            let s = shifts[i];
            let neighbor = if s < 0.0 {
                colors[(i + n - 1) % n]
            } else {
                colors[(i + 1) % n]
            };
            let w_neighbor = s.abs();
            let w_self = 1.0 - s.abs();
            blend(&neighbor, &colors[i], w_neighbor, w_self)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::gamut::max_chroma;
    use crate::hue::{hue_difference, min_chroma_hue_distance};

    #[test]
    fn test_hue_sorted_tie_break() {
        let colors = [
            Lch::new(0.5, 100.0, 0.0),
            Lch::new(0.5, 100.0, 90.0),
            Lch::new(0.5, 100.0, 180.0),
        ];
        let sorted = hue_sorted(&colors, 0.0);
        let hues: Vec<f64> = sorted.iter().map(|c| c.h).collect();
        assert_eq!(hues, vec![0.0, 90.0, 180.0]);
    }

    #[test]
    fn test_hue_sorted_wraps_from_reference() {
        let colors = [
            Lch::new(0.5, 100.0, 10.0),
            Lch::new(0.5, 100.0, 200.0),
            Lch::new(0.5, 100.0, 140.0),
        ];
        let sorted = hue_sorted(&colors, 140.0);
        let hues: Vec<f64> = sorted.iter().map(|c| c.h).collect();
        assert_eq!(hues, vec![140.0, 200.0, 10.0]);
    }

    #[test]
    fn test_evenly_spaced_colors_stay_in_gamut() {
        let from = Lch::new(0.5, max_chroma(0.5, 264.0), 264.0);
        let to = Lch::new(0.5, max_chroma(0.5, 29.0), 29.0);
        let colors = evenly_spaced_colors(&from, &to, 7);
        assert_eq!(colors.len(), 7);
        for c in &colors {
            assert!(c.c <= max_chroma(c.l, c.h) + 1e-9);
        }
        // Endpoints survive (up to the clamp).
        assert_abs_diff_eq!(colors[0].h, from.h, epsilon = 1e-9);
        assert_abs_diff_eq!(colors[6].h, to.h, epsilon = 1e-9);
    }

    #[test]
    fn test_generate_default() {
        let colors = generate(0.5).unwrap();
        assert_eq!(colors.len(), 5);
        for c in &colors {
            assert_abs_diff_eq!(c.l, 0.5, epsilon = 1e-12);
            assert!(c.c <= max_chroma(c.l, c.h) + 1e-9, "out of gamut: {c:?}");
        }
        // Hue-sorted from the green anchor.
        assert!(
            colors[0].h > 130.0 && colors[0].h < 170.0,
            "first color at hue {}",
            colors[0].h
        );
        // Well separated under default spacing.
        assert!(min_chroma_hue_distance(&colors) > 10.0);
    }

    #[test]
    fn test_generate_counts() {
        let options = GenerateOptions {
            n_magenta: 2,
            n_cyan: 3,
            ..GenerateOptions::default()
        };
        let colors = generate_with(0.45, &options).unwrap();
        assert_eq!(colors.len(), 8);
    }

    #[test]
    fn test_generate_rejects_lightness() {
        assert!(matches!(
            generate(0.2),
            Err(GenerateError::LightnessOutOfRange { .. })
        ));
        assert!(matches!(
            generate(0.75),
            Err(GenerateError::LightnessOutOfRange { .. })
        ));
        assert!(generate(0.3).is_ok());
        assert!(generate(0.7).is_ok());
    }

    #[test]
    fn test_generate_validates_shifts() {
        let options = GenerateOptions {
            policy: SecondaryPolicy::NeighborBlend {
                shifts: vec![0.0; 4],
            },
            ..GenerateOptions::default()
        };
        assert!(matches!(
            generate_with(0.5, &options),
            Err(GenerateError::ShiftCount {
                expected: 5,
                actual: 4
            })
        ));

        let options = GenerateOptions {
            policy: SecondaryPolicy::NeighborBlend {
                shifts: vec![0.0, 0.0, 1.0, 0.0, 0.0],
            },
            ..GenerateOptions::default()
        };
        assert!(matches!(
            generate_with(0.5, &options),
            Err(GenerateError::ShiftOutOfRange { index: 2, .. })
        ));
    }

    #[test]
    fn test_zero_shifts_match_midpoint_policy() {
        let midpoint = generate(0.5).unwrap();
        let options = GenerateOptions {
            policy: SecondaryPolicy::NeighborBlend {
                shifts: vec![0.0; 5],
            },
            ..GenerateOptions::default()
        };
        let blended = generate_with(0.5, &options).unwrap();
        for (a, b) in midpoint.iter().zip(&blended) {
            assert_abs_diff_eq!(a.c, b.c, epsilon = 1e-9);
            assert_abs_diff_eq!(a.h, b.h, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_shift_moves_toward_neighbor() {
        let midpoint = generate(0.5).unwrap();
        let mut shifts = vec![0.0; 5];
        shifts[1] = 0.5; // toward the right neighbor
        let options = GenerateOptions {
            policy: SecondaryPolicy::NeighborBlend { shifts },
            ..GenerateOptions::default()
        };
        let shifted = generate_with(0.5, &options).unwrap();
        let right = &midpoint[2];
        let before = hue_difference(midpoint[1].h, right.h).abs();
        let after = hue_difference(shifted[1].h, right.h).abs();
        assert!(after < before, "hue gap {before} -> {after}");

        let mut shifts = vec![0.0; 5];
        shifts[1] = -0.5; // toward the left neighbor
        let options = GenerateOptions {
            policy: SecondaryPolicy::NeighborBlend { shifts },
            ..GenerateOptions::default()
        };
        let shifted = generate_with(0.5, &options).unwrap();
        let left = &midpoint[0];
        let before = hue_difference(midpoint[1].h, left.h).abs();
        let after = hue_difference(shifted[1].h, left.h).abs();
        assert!(after < before, "hue gap {before} -> {after}");
    }

    #[test]
    fn test_blend_weights() {
        let a = Lch::new(0.5, 100.0, 20.0);
        let b = Lch::new(0.5, 200.0, 60.0);
        let mid = blend(&a, &b, 0.5, 0.5);
        assert_abs_diff_eq!(mid.h, 40.0, epsilon = 1e-9);
        assert!(mid.c <= 150.0 + 1e-9);
        // Fully weighted to one side reproduces that side (modulo the clamp).
        let full = blend(&a, &b, 1.0, 0.0);
        assert_abs_diff_eq!(full.h, a.h, epsilon = 1e-9);
    }
}
