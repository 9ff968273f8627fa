//! Intensity contour: windowed RMS energy in dB.
//!
//! Values are relative to the standard air reference pressure of
//! 2×10⁻⁵ Pa, so 0 dB is the nominal threshold of hearing. Frames with
//! zero energy carry −∞; statistics layers are expected to filter
//! non-finite values before summarizing.
//!
//! Algorithm per frame (Praat manual, Sound: To Intensity...):
//! extract samples centered on the frame time, subtract the mean (DC),
//! apply a Gaussian window, take the window-weighted mean square, and
//! convert to dB. The effective window duration is 3.2 / min_pitch with
//! a physical/effective ratio of 2.25 and window shape α = 13.2.

use ndarray::Array1;

use crate::sound::Sound;

/// Intensity (loudness) contour in dB.
#[derive(Debug, Clone)]
pub struct Intensity {
    /// Frame center times in seconds.
    times: Array1<f64>,
    /// Intensity per frame in dB; −∞ marks silent frames.
    values: Array1<f64>,
    /// Time step between frames.
    time_step: f64,
    /// Minimum pitch the window length was derived from.
    min_pitch: f64,
}

impl Intensity {
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

    /// Intensity values in dB.
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

    /// The finite (non-silent) frame values.
    pub fn finite_values(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| v.is_finite()).collect()
    }
}

/// Gaussian analysis window, zero at the edges, unity at the center:
/// w(x) = (exp(-αx²) - exp(-α)) / (1 - exp(-α)) for x in [-1, 1].
fn gauss_window(n: usize, alpha: f64) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0];
    }
    let mid = (n - 1) as f64 / 2.0;
    let exp_edge = (-alpha).exp();
    let norm = 1.0 - exp_edge;
    (0..n)
        .map(|i| {
            let x = (i as f64 - mid) / mid;
            ((-alpha * x * x).exp() - exp_edge) / norm
        })
        .collect()
}

/// Compute the intensity contour of a sound.
///
/// `min_pitch` determines the window length (longer windows for lower
/// floors, smoother contours); a `time_step` of 0 selects the default
/// 0.8 / min_pitch.
pub fn sound_to_intensity(sound: &Sound, min_pitch: f64, time_step: f64) -> Intensity {
    let samples = sound.as_slice();
    let sample_rate = sound.sample_rate();
    let duration = sound.duration();

    let time_step = if time_step <= 0.0 {
        0.8 / min_pitch
    } else {
        time_step
    };

    // Physical window: effective 3.2 / min_pitch times the 2.25 ratio.
    let physical_window_duration = 7.2 / min_pitch;
    let half_window_duration = physical_window_duration / 2.0;

    let mut window_samples = (physical_window_duration * sample_rate).round() as usize;
    if window_samples % 2 == 0 {
        window_samples += 1;
    }
    let half_window_samples = window_samples / 2;

    let window = gauss_window(window_samples, 13.2);
    let window_sum: f64 = window.iter().sum();

    // Frames run from half a window in to half a window before the end.
    let t1 = half_window_duration;
    let t_max = duration - half_window_duration;
    let n_frames = (((t_max - t1) / time_step + 1e-9).floor() as usize + 1).max(1);

    // Reference pressure squared: (2×10⁻⁵ Pa)².
    let p_ref = 4e-10;

    let n_samples = samples.len();
    let mut times = Vec::with_capacity(n_frames);
    let mut values = Vec::with_capacity(n_frames);

    for i in 0..n_frames {
        let t = t1 + i as f64 * time_step;
        times.push(t);

        let center_sample = (t * sample_rate).round() as isize;
        let start_sample = center_sample - half_window_samples as isize;

        let mut frame_samples = vec![0.0; window_samples];
        for (j, dst) in frame_samples.iter_mut().enumerate() {
            let src_idx = start_sample + j as isize;
            if src_idx >= 0 && (src_idx as usize) < n_samples {
                *dst = samples[src_idx as usize];
            }
        }

        // DC removal, then window-weighted mean square.
        let mean: f64 = frame_samples.iter().sum::<f64>() / frame_samples.len() as f64;
        let mean_square: f64 = frame_samples
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| (s - mean) * (s - mean) * w)
            .sum::<f64>()
            / window_sum;

        let intensity_db = if mean_square <= 0.0 {
            f64::NEG_INFINITY
        } else {
            10.0 * (mean_square / p_ref).log10()
        };
        values.push(intensity_db);
    }

    Intensity::new(
        Array1::from_vec(times),
        Array1::from_vec(values),
        time_step,
        min_pitch,
    )
}
