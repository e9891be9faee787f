//! Maximally saturated, perceptually well-separated boundary colors at a
//! fixed lightness, for use as the hue anchors of a syntax-highlighting
//! palette.
//!
//! Given a lightness in [0.3, 0.7], [`generate`] locates the hue angles where
//! the sRGB gamut boundary reaches its chroma maxima in OKLCH — purest green,
//! blue, and red — and derives secondary colors between them, every result
//! clamped to the boundary and sorted by hue from the green anchor.
//!
//! ```no_run
//! let colors = gamutpeaks::generate(0.5)?;
//! for c in &colors {
//!     let (r, g, b) = gamutpeaks::lch_to_srgb(c);
//!     println!("L={:.2} C={:>5.1} H={:>5.1} -> rgb({r:.3}, {g:.3}, {b:.3})", c.l, c.c, c.h);
//! }
//! # Ok::<(), gamutpeaks::GenerateError>(())
//! ```
//!
//! The pieces compose bottom-up and are all public: analytic sRGB ↔ OKLCH
//! conversion ([`color`]), hue-circle arithmetic ([`hue`]), boundary location
//! by bisection ([`gamut`]), and chroma peak detection with Savitzky–Golay
//! smoothing and prominence filtering ([`peaks`]).
//!
//! Everything is a pure computation over values; there is no shared state,
//! and detector parameters travel by value in [`PeakDetectionParams`].
//! Failures surface as structured errors — [`PeakDetectionError`] carries the
//! raw peaks, their prominences, the parameters used, and a suggested
//! prominence to retry with.

pub mod color;
pub mod gamut;
pub mod generate;
pub mod hue;
pub mod peaks;

pub use color::{
    in_gamut, lch_to_linear_rgb, lch_to_srgb, linear_rgb_to_lch, linear_to_srgb, srgb_to_lch,
    srgb_to_linear, Lch,
};
pub use gamut::{bisect, clamp_to_gamut, max_chroma, max_chroma_with_margin, move_along_boundary};
pub use generate::{
    generate, generate_with, hue_sorted, GenerateError, GenerateOptions, SecondaryPolicy,
    MAX_LIGHTNESS, MIN_LIGHTNESS,
};
pub use hue::{
    chroma_hue_distance, evenly_spaced_hues, hue_difference, min_chroma_hue_distance,
    normalize_hue, perceptual_distance, weighted_hue_average,
};
pub use peaks::{
    expect_anchors, find_peaks, Anchors, PeakDetectionError, PeakDetectionParams, PeakDiagnostics,
    DEFAULT_START_HUE,
};
