//! Chroma peak detection along the gamut boundary.
//!
//! At a fixed lightness, sweeping hue over a full rotation and recording the
//! boundary chroma gives a curve whose local maxima are the "purest" hues the
//! display can show — intuitively purest green, blue, and red. The sweep is
//! sampled (one bisection per hue), smoothed with a Savitzky–Golay filter to
//! knock down the jitter the coarse 1-unit bisection tolerance leaves behind,
//! and the maxima are extracted with a prominence threshold.
//!
//! The physical shape of the sRGB gamut means the curve has 3 peaks, or 4
//! when a secondary maximum appears between two primaries at extreme
//! lightness. Any other count means the detection parameters are off for
//! this lightness, and [`expect_anchors`] reports that as a structured error
//! carrying everything an operator needs to pick a new prominence value.

use rayon::prelude::*;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::color::Lch;
use crate::gamut::max_chroma;

/// Default sweep start hue. Starting at 100° makes green the first peak in
/// hue order, the ordering convention the generator's role labels rely on.
/// A convention of the default, not a property of the algorithm.
pub const DEFAULT_START_HUE: f64 = 100.0;

/// Step applied to the prominence when suggesting a retry value.
const PROMINENCE_STEP: f64 = 0.05;

/// Tuning knobs for the peak detector.
///
/// The defaults are tuned empirically and hold across the supported
/// lightness range; they are what an operator adjusts when detection fails
/// for an unusual lightness.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakDetectionParams {
    /// Minimum prominence for a local maximum to count as a peak
    pub prominence: f64,
    /// Number of hue samples over one full rotation
    pub resolution: usize,
    /// Savitzky–Golay window length, in samples
    pub window_length: usize,
    /// Savitzky–Golay polynomial order
    pub polyorder: usize,
}

impl Default for PeakDetectionParams {
    fn default() -> Self {
        PeakDetectionParams {
            prominence: 0.2,
            resolution: 360,
            window_length: 10,
            polyorder: 3,
        }
    }
}

/// Per-peak measurements from the detector, for diagnostics.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakDiagnostics {
    /// Prominence of each detected peak, measured on the smoothed curve
    pub prominences: Vec<f64>,
}

/// The three primary chroma peaks, labeled by hue order from
/// [`DEFAULT_START_HUE`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Anchors {
    pub green: Lch,
    pub blue: Lch,
    pub red: Lch,
}

/// Peak detection found a peak count outside the expected 3–4.
///
/// Carries the full detection state so an operator can decide on a new
/// prominence value and retry manually; callers are not expected to catch
/// this and retry automatically.
#[derive(Clone, Debug, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[error(
    "expected 3 or 4 chroma peaks at lightness {lightness}, found {found} \
     (prominences: {prominences:?}, params: {params:?}); \
     retrying with prominence {suggested_prominence:.2} may help",
    found = .peaks.len()
)]
pub struct PeakDetectionError {
    /// Lightness level the sweep ran at
    pub lightness: f64,
    /// The raw peaks that were detected
    pub peaks: Vec<Lch>,
    /// Prominence of each detected peak
    pub prominences: Vec<f64>,
    /// Parameters the detector ran with
    pub params: PeakDetectionParams,
    /// Prominence value to try next: one step up when too many peaks were
    /// found, one step down (floored at zero) when too few
    pub suggested_prominence: f64,
}

impl PeakDetectionError {
    fn new(
        lightness: f64,
        peaks: Vec<Lch>,
        diagnostics: PeakDiagnostics,
        params: PeakDetectionParams,
    ) -> Self {
        let suggested_prominence = if peaks.len() > 4 {
            params.prominence + PROMINENCE_STEP
        } else {
            (params.prominence - PROMINENCE_STEP).max(0.0)
        };
        PeakDetectionError {
            lightness,
            peaks,
            prominences: diagnostics.prominences,
            params,
            suggested_prominence,
        }
    }
}

/// Find the chroma peaks at lightness `l`.
///
/// Samples the boundary chroma at `params.resolution` hues spanning
/// `[start_hue, start_hue + 360]` inclusive, smooths, and extracts the
/// prominent local maxima. Peak colors carry the raw (unsmoothed) sampled
/// chroma at the detected index, with the hue reduced to [0, 360).
///
/// `start_hue` determines the order of the peaks; [`DEFAULT_START_HUE`]
/// puts green first. No count validation happens here — see
/// [`expect_anchors`].
pub fn find_peaks(
    l: f64,
    start_hue: f64,
    params: &PeakDetectionParams,
) -> (Vec<Lch>, PeakDiagnostics) {
    let n = params.resolution;
    if n < 2 {
        // A sweep needs at least two samples to span the rotation; a single
        // sample would put NaN in every hue. Zero peaks turns into the
        // structured detection error at the validation step.
        warn!(
            lightness = l,
            resolution = n,
            "peak sweep skipped: resolution below 2"
        );
        return (Vec::new(), PeakDiagnostics::default());
    }
    let hues: Vec<f64> = (0..n)
        .map(|i| start_hue + 360.0 * i as f64 / (n - 1) as f64)
        .collect();
    // Each sample is an independent bisection; rayon keeps index order on
    // collect, which the smoothing pass requires.
    let chromas: Vec<f64> = hues.par_iter().map(|&h| max_chroma(l, h)).collect();

    let smoothed = savgol_filter(&chromas, params.window_length, params.polyorder);
    let (indices, prominences) = prominent_maxima(&smoothed, params.prominence);

    let peaks: Vec<Lch> = indices
        .iter()
        .map(|&i| Lch::new(l, chromas[i], hues[i]))
        .collect();
    debug!(
        lightness = l,
        peak_count = peaks.len(),
        ?prominences,
        "chroma peak sweep finished"
    );
    (peaks, PeakDiagnostics { prominences })
}

/// Validate a peak list and label the primary anchors.
///
/// Exactly 3 peaks from [`DEFAULT_START_HUE`] are green, blue, red in hue
/// order. With 4, the extra maximum sits between blue and red and is
/// discarded. Any other count returns [`PeakDetectionError`].
pub fn expect_anchors(
    l: f64,
    peaks: Vec<Lch>,
    diagnostics: PeakDiagnostics,
    params: &PeakDetectionParams,
) -> Result<Anchors, PeakDetectionError> {
    match peaks.len() {
        3 => Ok(Anchors {
            green: peaks[0],
            blue: peaks[1],
            red: peaks[2],
        }),
        // The extra maximum sits third, between blue and red.
        4 => Ok(Anchors {
            green: peaks[0],
            blue: peaks[1],
            red: peaks[3],
        }),
        _ => Err(PeakDetectionError::new(l, peaks, diagnostics, *params)),
    }
}

// ============================================================================
// Savitzky–Golay smoothing
// ============================================================================

/// Smooth a signal with a Savitzky–Golay (local least-squares polynomial)
/// filter.
///
/// Handles any window length, even ones included. Interior samples use a
/// window centered on the sample; near the ends the window slides inside the
/// signal and the fitted polynomial is evaluated at the sample's offset, so
/// the ends are smoothed by polynomial fit rather than padded.
///
/// Degenerate inputs (window shorter than 2 or longer than the signal) pass
/// the signal through unchanged; an order at or above the window length is
/// reduced to fit.
pub fn savgol_filter(y: &[f64], window_length: usize, polyorder: usize) -> Vec<f64> {
    let n = y.len();
    if window_length < 2 || window_length > n {
        return y.to_vec();
    }
    let order = polyorder.min(window_length - 1);

    // One weight vector per evaluation offset within the window; interior
    // samples all share the centered one.
    let weights: Vec<Vec<f64>> = (0..window_length)
        .map(|pos| savgol_weights(window_length, order, pos as f64))
        .collect();

    (0..n)
        .map(|i| {
            let start = i.saturating_sub(window_length / 2).min(n - window_length);
            let w = &weights[i - start];
            w.iter()
                .zip(&y[start..start + window_length])
                .map(|(wk, yk)| wk * yk)
                .sum()
        })
        .collect()
}

/// Weights that evaluate a least-squares polynomial fit of the window at
/// sample offset `pos`.
///
/// Solves the normal equations (AᵀA)x = e₀ for the Vandermonde matrix A of
/// offsets relative to `pos`; the smoothed value is then `Ax · y`, i.e. the
/// fitted polynomial's constant term.
fn savgol_weights(window_length: usize, order: usize, pos: f64) -> Vec<f64> {
    let m = order + 1;

    // Moments s_k = Σ d^k over the window, d = offset from pos.
    let mut moments = vec![0.0; 2 * m - 1];
    for i in 0..window_length {
        let d = i as f64 - pos;
        let mut p = 1.0;
        for s in moments.iter_mut() {
            *s += p;
            p *= d;
        }
    }

    let mut gram = vec![vec![0.0; m]; m];
    for (j, row) in gram.iter_mut().enumerate() {
        for (k, v) in row.iter_mut().enumerate() {
            *v = moments[j + k];
        }
    }
    let mut rhs = vec![0.0; m];
    rhs[0] = 1.0;
    let x = solve_linear(gram, rhs);

    (0..window_length)
        .map(|i| {
            let d = i as f64 - pos;
            let mut p = 1.0;
            let mut w = 0.0;
            for &xj in &x {
                w += xj * p;
                p *= d;
            }
            w
        })
        .collect()
}

/// Solve `a·x = b` by Gaussian elimination with partial pivoting.
///
/// The Gram matrices here are tiny (order+1 square) and well conditioned for
/// sane window/order combinations.
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        a.swap(col, pivot);
        b.swap(col, pivot);
        let diag = a[col][col];
        for row in (col + 1)..n {
            let factor = a[row][col] / diag;
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for col in (0..n).rev() {
        let mut v = b[col];
        for k in (col + 1)..n {
            v -= a[col][k] * x[k];
        }
        x[col] = v / a[col][col];
    }
    x
}

// ============================================================================
// Local maxima with prominence
// ============================================================================

/// Indices and prominences of local maxima whose prominence reaches
/// `min_prominence`.
///
/// A maximum is a sample strictly above both neighbors; a plateau counts
/// once, at its midpoint. Endpoints are never maxima — the hue sweep starts
/// away from any expected peak, so nothing is lost at the seam. Prominence
/// is the peak height over the higher of the two interval minima found by
/// walking outward to the nearest strictly higher sample (or the border).
fn prominent_maxima(y: &[f64], min_prominence: f64) -> (Vec<usize>, Vec<f64>) {
    let n = y.len();
    let mut indices = Vec::new();
    let mut prominences = Vec::new();
    if n < 3 {
        return (indices, prominences);
    }

    let mut i = 1;
    while i < n - 1 {
        if y[i - 1] < y[i] {
            // Skip over a plateau of equal samples.
            let mut ahead = i + 1;
            while ahead < n - 1 && y[ahead] == y[i] {
                ahead += 1;
            }
            if y[ahead] < y[i] {
                let peak = (i + ahead - 1) / 2;
                let prominence = peak_prominence(y, peak);
                if prominence >= min_prominence {
                    indices.push(peak);
                    prominences.push(prominence);
                }
                i = ahead;
                continue;
            }
            i = ahead;
        } else {
            i += 1;
        }
    }
    (indices, prominences)
}

fn peak_prominence(y: &[f64], peak: usize) -> f64 {
    let height = y[peak];

    let mut left_min = height;
    let mut i = peak;
    while i > 0 && y[i - 1] <= height {
        i -= 1;
        if y[i] < left_min {
            left_min = y[i];
        }
    }

    let mut right_min = height;
    let mut i = peak;
    while i + 1 < y.len() && y[i + 1] <= height {
        i += 1;
        if y[i] < right_min {
            right_min = y[i];
        }
    }

    height - left_min.max(right_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_savgol_reproduces_polynomial() {
        // A cubic is in the model space of an order-3 fit, so smoothing must
        // be exact everywhere, ends included.
        let y: Vec<f64> = (0..40)
            .map(|i| {
                let t = i as f64 * 0.1;
                1.0 + 2.0 * t - 0.5 * t * t + 0.03 * t * t * t
            })
            .collect();
        for window in [7, 10] {
            let s = savgol_filter(&y, window, 3);
            for (a, b) in y.iter().zip(&s) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_savgol_flattens_noise() {
        // Alternating jitter on a constant level mostly averages out.
        let y: Vec<f64> = (0..60)
            .map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let s = savgol_filter(&y, 10, 3);
        let worst = y
            .iter()
            .zip(&s)
            .skip(10)
            .take(40)
            .map(|(_, &v)| (v - 100.0).abs())
            .fold(0.0, f64::max);
        assert!(worst < 0.3, "residual jitter {worst}");
    }

    #[test]
    fn test_savgol_degenerate_passthrough() {
        let y = [1.0, 2.0, 3.0];
        assert_eq!(savgol_filter(&y, 1, 3), y.to_vec());
        assert_eq!(savgol_filter(&y, 5, 3), y.to_vec());
    }

    #[test]
    fn test_prominent_maxima_basic() {
        let y = [0.0, 1.0, 0.0, 5.0, 0.0, 0.15, 0.0];
        let (idx, prom) = prominent_maxima(&y, 0.2);
        assert_eq!(idx, vec![1, 3]);
        assert_abs_diff_eq!(prom[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(prom[1], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_prominent_maxima_plateau_midpoint() {
        let y = [0.0, 2.0, 2.0, 2.0, 0.0, 0.0];
        let (idx, _) = prominent_maxima(&y, 0.5);
        assert_eq!(idx, vec![2]);
    }

    #[test]
    fn test_prominence_uses_higher_valley() {
        // The peak at 5 is bounded by valleys at 3 (left) and 1 (right);
        // prominence measures against the higher one.
        let y = [0.0, 6.0, 3.0, 5.0, 1.0, 7.0, 0.0];
        let (idx, prom) = prominent_maxima(&y, 0.0);
        let pos = idx.iter().position(|&i| i == 3).unwrap();
        assert_abs_diff_eq!(prom[pos], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_endpoints_are_not_peaks() {
        let y = [9.0, 1.0, 2.0, 1.0, 9.0];
        let (idx, _) = prominent_maxima(&y, 0.0);
        assert_eq!(idx, vec![2]);
    }

    #[test]
    fn test_find_peaks_midrange() {
        let params = PeakDetectionParams::default();
        let (peaks, diags) = find_peaks(0.5, DEFAULT_START_HUE, &params);
        assert!(
            peaks.len() == 3 || peaks.len() == 4,
            "found {} peaks",
            peaks.len()
        );
        assert_eq!(diags.prominences.len(), peaks.len());
        // Green first by the start-hue convention.
        assert!(
            peaks[0].h > 130.0 && peaks[0].h < 170.0,
            "first peak at hue {}",
            peaks[0].h
        );
        for p in &peaks {
            assert_abs_diff_eq!(p.l, 0.5, epsilon = 1e-12);
            assert!(p.h >= 0.0 && p.h < 360.0);
            assert!(p.c > 50.0);
        }
    }

    #[test]
    fn test_degenerate_resolution_yields_no_peaks() {
        // Too few samples to sweep: no NaN hues, just an empty result that
        // the anchor validation turns into the structured error.
        for resolution in [0, 1] {
            let params = PeakDetectionParams {
                resolution,
                ..PeakDetectionParams::default()
            };
            let (peaks, diags) = find_peaks(0.5, DEFAULT_START_HUE, &params);
            assert!(peaks.is_empty());
            assert!(diags.prominences.is_empty());
            let err = expect_anchors(0.5, peaks, diags, &params).unwrap_err();
            assert_eq!(err.peaks.len(), 0);
        }
    }

    #[test]
    fn test_peak_count_across_lightness_range() {
        // Regression guard against parameter drift: the defaults must hold
        // over the whole supported lightness range.
        let params = PeakDetectionParams::default();
        for i in 0..100 {
            let l = 0.3 + 0.4 * i as f64 / 99.0;
            let (peaks, _) = find_peaks(l, DEFAULT_START_HUE, &params);
            assert!(
                peaks.len() == 3 || peaks.len() == 4,
                "found {} peaks at L={l}",
                peaks.len()
            );
        }
    }

    #[test]
    fn test_expect_anchors_labels() {
        let p = |h: f64| Lch::new(0.5, 100.0, h);
        let params = PeakDetectionParams::default();
        let three = vec![p(142.0), p(264.0), p(29.0)];
        let a = expect_anchors(0.5, three, PeakDiagnostics::default(), &params).unwrap();
        assert_abs_diff_eq!(a.green.h, 142.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.blue.h, 264.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.red.h, 29.0, epsilon = 1e-12);

        // With four, the extra maximum between blue and red drops out.
        let four = vec![p(142.0), p(264.0), p(310.0), p(29.0)];
        let a = expect_anchors(0.5, four, PeakDiagnostics::default(), &params).unwrap();
        assert_abs_diff_eq!(a.blue.h, 264.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.red.h, 29.0, epsilon = 1e-12);
    }

    #[test]
    fn test_expect_anchors_error_payload() {
        let p = |h: f64| Lch::new(0.45, 100.0, h);
        let params = PeakDetectionParams::default();

        let err = expect_anchors(
            0.45,
            vec![p(142.0), p(264.0)],
            PeakDiagnostics {
                prominences: vec![3.0, 2.0],
            },
            &params,
        )
        .unwrap_err();
        assert_eq!(err.peaks.len(), 2);
        assert_eq!(err.prominences, vec![3.0, 2.0]);
        assert_abs_diff_eq!(err.lightness, 0.45, epsilon = 1e-12);
        // Too few peaks: suggest lowering the prominence.
        assert_abs_diff_eq!(err.suggested_prominence, 0.15, epsilon = 1e-12);

        let err = expect_anchors(
            0.45,
            (0..5).map(|i| p(60.0 * i as f64)).collect(),
            PeakDiagnostics::default(),
            &params,
        )
        .unwrap_err();
        // Too many: suggest raising it.
        assert_abs_diff_eq!(err.suggested_prominence, 0.25, epsilon = 1e-12);
        let msg = err.to_string();
        assert!(msg.contains("found 5"), "message was: {msg}");
    }
}
