//! Harmonics-to-noise ratio (HNR) contour.
//!
//! Harmonicity is not a standalone algorithm: the pitch tracker runs
//! with a longer window (typically 4.5 periods) and its octave cost
//! disabled, and each frame's raw correlation strength r becomes
//!
//! ```text
//! HNR (dB) = 10 · log₁₀(r / (1 − r))
//! ```
//!
//! per the Praat manual (Harmonicity.html): r is the fraction of energy
//! in the periodic part, 1 − r the fraction in noise. A clean vowel with
//! r = 0.99 therefore reads 20 dB. Unvoiced frames carry the −200 dB
//! marker value.

use ndarray::Array1;

use crate::pitch::{self, FrameTiming, TrackerSettings};
use crate::sound::Sound;

/// Marker value for unvoiced or silent frames.
const UNVOICED_DB: f64 = -200.0;

/// HNR contour in dB.
#[derive(Debug, Clone)]
pub struct Harmonicity {
    /// Frame center times in seconds.
    times: Array1<f64>,
    /// HNR values in dB; −200 marks unvoiced frames.
    values: Array1<f64>,
    /// Time step between frames.
    time_step: f64,
    /// Minimum pitch used for the analysis.
    min_pitch: f64,
}

impl Harmonicity {
    pub fn new(times: Array1<f64>, values: Array1<f64>, time_step: f64, min_pitch: f64) -> Self {
        Self {
            times,
            values,
            time_step,
            min_pitch,
        }
    }

    /// Frame center times in seconds.
    #[inline]
    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    /// HNR values in dB, −200 for unvoiced frames.
    #[inline]
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Number of frames.
    #[inline]
    pub fn n_frames(&self) -> usize {
        self.times.len()
    }

    /// Time step between frames in seconds.
    #[inline]
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Minimum pitch used for the analysis.
    #[inline]
    pub fn min_pitch(&self) -> f64 {
        self.min_pitch
    }

    /// Values of the voiced frames (everything above the marker).
    pub fn voiced_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .copied()
            .filter(|&v| v > -100.0)
            .collect()
    }
}

/// Correlation strength to HNR in dB.
///
/// r is clamped to [1e-10, 1 − 1e-10]: interpolation can push the
/// normalized correlation slightly past 1, which would otherwise produce
/// a log of zero or of a negative number.
#[inline]
pub fn strength_to_hnr(r: f64) -> f64 {
    let r = r.clamp(1e-10, 1.0 - 1e-10);
    10.0 * (r / (1.0 - r)).log10()
}

/// HNR contour by the autocorrelation method.
///
/// `periods_per_window` is typically 4.5: the longer window trades
/// temporal resolution for more stable correlation estimates than the
/// 3-period window pitch tracking uses.
pub fn sound_to_harmonicity_ac(
    sound: &Sound,
    time_step: f64,
    min_pitch: f64,
    silence_threshold: f64,
    periods_per_window: f64,
) -> Harmonicity {
    let settings = TrackerSettings {
        silence_threshold,
        periods_per_window,
        timing: FrameTiming::Left,
        // Raw strengths feed the HNR formula; the octave cost would
        // distort them.
        apply_octave_cost: false,
        ..TrackerSettings::default()
    };
    let pitch = pitch::track(sound, time_step, min_pitch, 600.0, settings);

    let times = pitch.times();
    let hnr_values: Vec<f64> = pitch
        .frames()
        .iter()
        .map(|frame| {
            if frame.voiced() {
                strength_to_hnr(frame.strength())
            } else {
                UNVOICED_DB
            }
        })
        .collect();

    Harmonicity::new(
        times,
        Array1::from_vec(hnr_values),
        pitch.time_step(),
        min_pitch,
    )
}
