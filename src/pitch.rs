//! Pitch (F0) contour by the autocorrelation method of Boersma (1993),
//! "Accurate short-term analysis of the fundamental frequency and the
//! harmonics-to-noise ratio of a sampled sound".
//!
//! Per analysis frame the windowed autocorrelation is normalized by the
//! window's own autocorrelation (Boersma Eq. 9), peaks become voiced
//! candidates with strengths per Eq. 23/24, and a Viterbi pass with the
//! Eq. 27 transition costs picks the final path through the candidates.

use ndarray::Array1;

use crate::sound::Sound;

/// One pitch candidate of a frame: a frequency (0 = unvoiced) and the
/// correlation strength backing it.
#[derive(Debug, Clone)]
pub struct PitchCandidate {
    /// Frequency in Hz (0 = unvoiced).
    pub frequency: f64,
    /// Correlation strength, nominally 0-1.
    pub strength: f64,
}

impl PitchCandidate {
    pub fn new(frequency: f64, strength: f64) -> Self {
        Self {
            frequency,
            strength,
        }
    }
}

/// Candidates for one analysis frame; the first candidate is the one the
/// Viterbi pass selected.
#[derive(Debug, Clone)]
pub struct PitchFrame {
    /// Frame center time in seconds.
    pub time: f64,
    /// Candidates, best path first.
    pub candidates: Vec<PitchCandidate>,
    /// Local peak amplitude relative to the global peak (0-1).
    pub intensity: f64,
}

impl PitchFrame {
    pub fn new(time: f64, candidates: Vec<PitchCandidate>, intensity: f64) -> Self {
        Self {
            time,
            candidates,
            intensity,
        }
    }

    /// Selected frequency, 0 when unvoiced.
    #[inline]
    pub fn frequency(&self) -> f64 {
        self.candidates.first().map_or(0.0, |c| c.frequency)
    }

    /// Strength of the selected candidate.
    #[inline]
    pub fn strength(&self) -> f64 {
        self.candidates.first().map_or(0.0, |c| c.strength)
    }

    /// Whether the selected candidate is voiced.
    #[inline]
    pub fn voiced(&self) -> bool {
        self.frequency() > 0.0
    }
}

/// Frame placement relative to the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTiming {
    /// Frames centered in the signal (pitch tracking).
    Centered,
    /// Left-aligned with a centering remainder (harmonicity).
    Left,
}

/// Tracker thresholds and path costs.
///
/// Defaults are the Boersma (1993) values for plain pitch tracking.
/// Harmonicity reuses the tracker with a longer window and the octave
/// cost disabled so raw correlation strengths survive.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrackerSettings {
    pub voicing_threshold: f64,
    pub silence_threshold: f64,
    pub octave_cost: f64,
    pub octave_jump_cost: f64,
    pub voiced_unvoiced_cost: f64,
    pub periods_per_window: f64,
    pub timing: FrameTiming,
    pub apply_octave_cost: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            voicing_threshold: 0.45,
            silence_threshold: 0.03,
            octave_cost: 0.01,
            octave_jump_cost: 0.35,
            voiced_unvoiced_cost: 0.14,
            periods_per_window: 3.0,
            timing: FrameTiming::Centered,
            apply_octave_cost: true,
        }
    }
}

/// Pitch (F0) contour.
#[derive(Debug, Clone)]
pub struct Pitch {
    frames: Vec<PitchFrame>,
    time_step: f64,
    pitch_floor: f64,
    pitch_ceiling: f64,
}

impl Pitch {
    pub fn new(frames: Vec<PitchFrame>, time_step: f64, pitch_floor: f64, pitch_ceiling: f64) -> Self {
        Self {
            frames,
            time_step,
            pitch_floor,
            pitch_ceiling,
        }
    }

    /// The analysis frames.
    #[inline]
    pub fn frames(&self) -> &[PitchFrame] {
        &self.frames
    }

    /// Number of frames.
    #[inline]
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Time step between frames in seconds.
    #[inline]
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Pitch floor used for the analysis, in Hz.
    #[inline]
    pub fn pitch_floor(&self) -> f64 {
        self.pitch_floor
    }

    /// Pitch ceiling used for the analysis, in Hz.
    #[inline]
    pub fn pitch_ceiling(&self) -> f64 {
        self.pitch_ceiling
    }

    /// Frame times.
    pub fn times(&self) -> Array1<f64> {
        Array1::from_iter(self.frames.iter().map(|f| f.time))
    }

    /// Number of voiced frames.
    pub fn count_voiced_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.voiced()).count()
    }

    /// Frequencies of the voiced frames only.
    pub fn voiced_values(&self) -> Vec<f64> {
        self.frames
            .iter()
            .filter(|f| f.voiced())
            .map(|f| f.frequency())
            .collect()
    }

    /// F0 at an arbitrary time by linear interpolation between frames.
    ///
    /// Falls back to the nearer voiced neighbor when one side is
    /// unvoiced; `None` outside the contour or where both neighbors are
    /// unvoiced.
    pub fn value_at_time(&self, time: f64) -> Option<f64> {
        if self.frames.is_empty() {
            return None;
        }

        let t0 = self.frames[0].time;
        let idx_float = (time - t0) / self.time_step;
        if idx_float < -0.5 || idx_float > self.n_frames() as f64 - 0.5 {
            return None;
        }

        let idx = idx_float.floor() as isize;
        let frac = idx_float - idx as f64;
        let i1 = idx.clamp(0, self.n_frames() as isize - 1) as usize;
        let i2 = (idx + 1).clamp(0, self.n_frames() as isize - 1) as usize;

        let f1 = &self.frames[i1];
        let f2 = &self.frames[i2];
        match (f1.voiced(), f2.voiced()) {
            (true, true) => Some(f1.frequency() * (1.0 - frac) + f2.frequency() * frac),
            (true, false) => Some(f1.frequency()),
            (false, true) => Some(f2.frequency()),
            (false, false) => None,
        }
    }
}

/// Hanning window of length n.
fn hanning_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Autocorrelation of `samples` for lags 0..=max_lag.
fn autocorrelation(samples: &[f64], max_lag: usize) -> Vec<f64> {
    let n = samples.len();
    let mut r = vec![0.0; max_lag + 1];
    for (lag, r_lag) in r.iter_mut().enumerate().take(max_lag.min(n - 1) + 1) {
        *r_lag = samples[..n - lag]
            .iter()
            .zip(samples[lag..].iter())
            .map(|(&a, &b)| a * b)
            .sum();
    }
    r
}

/// Peaks of the window-normalized autocorrelation, with parabolic
/// interpolation of the peak lag for sub-sample frequency precision.
///
/// Returns up to `max_candidates` (frequency, strength) pairs sorted by
/// strength. The strength is the raw peak value; interpolating it too
/// tends to overshoot past 1.
fn correlation_peaks(
    r: &[f64],
    r_w: &[f64],
    min_lag: usize,
    max_lag: usize,
    sample_rate: f64,
    max_candidates: usize,
) -> Vec<(f64, f64)> {
    if max_lag >= r.len() || max_lag >= r_w.len() {
        return Vec::new();
    }
    let r_0 = r[0];
    if r_0 <= 0.0 {
        return Vec::new();
    }

    // Normalized autocorrelation: (r/r0) / (rw/rw0), Boersma Eq. 9.
    let mut r_norm = vec![0.0; max_lag + 1];
    for lag in 0..=max_lag {
        if r_w[lag] > 0.0 && r_w[0] > 0.0 {
            r_norm[lag] = (r[lag] / r_0) / (r_w[lag] / r_w[0]);
        }
    }

    let mut candidates = Vec::new();
    for lag in min_lag..max_lag.min(r_norm.len() - 1) {
        if r_norm[lag] > r_norm[lag - 1] && r_norm[lag] > r_norm[lag + 1] {
            let (prev, curr, next) = (r_norm[lag - 1], r_norm[lag], r_norm[lag + 1]);
            let denom = prev - 2.0 * curr + next;
            let refined_lag = if denom.abs() > 1e-10 {
                let delta = 0.5 * (prev - next) / denom;
                if delta.abs() < 1.0 {
                    lag as f64 + delta
                } else {
                    lag as f64
                }
            } else {
                lag as f64
            };
            candidates.push((sample_rate / refined_lag, curr));
        }
    }

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(max_candidates);
    candidates
}

/// Viterbi pass over the candidate lattice (Boersma Eq. 27).
///
/// Transition cost is 0 between unvoiced frames, `voiced_unvoiced_cost`
/// on a voicing flip, and `octave_jump_cost × |log2(f1/f2)|` between
/// voiced frames; all scaled by 0.01/time_step. Reorders each frame's
/// candidates so the chosen one comes first.
fn viterbi_path(
    frames: &mut [PitchFrame],
    time_step: f64,
    octave_jump_cost: f64,
    voiced_unvoiced_cost: f64,
) {
    let n_frames = frames.len();
    if n_frames <= 1 {
        return;
    }

    let time_correction = 0.01 / time_step;
    let n_cands: Vec<usize> = frames.iter().map(|f| f.candidates.len()).collect();

    let mut best_cost: Vec<Vec<f64>> = n_cands.iter().map(|&n| vec![f64::INFINITY; n]).collect();
    let mut best_prev: Vec<Vec<usize>> = n_cands.iter().map(|&n| vec![0; n]).collect();

    for (j, cand) in frames[0].candidates.iter().enumerate() {
        best_cost[0][j] = -cand.strength;
    }

    for i in 1..n_frames {
        for j in 0..n_cands[i] {
            let cand_j = &frames[i].candidates[j];
            for k in 0..n_cands[i - 1] {
                let f_k = frames[i - 1].candidates[k].frequency;
                let f_j = cand_j.frequency;

                let trans_cost = if f_k == 0.0 && f_j == 0.0 {
                    0.0
                } else if f_k == 0.0 || f_j == 0.0 {
                    voiced_unvoiced_cost
                } else {
                    octave_jump_cost * (f_j / f_k).log2().abs()
                };

                let total =
                    best_cost[i - 1][k] + trans_cost * time_correction - cand_j.strength;
                if total < best_cost[i][j] {
                    best_cost[i][j] = total;
                    best_prev[i][j] = k;
                }
            }
        }
    }

    let mut path = vec![0usize; n_frames];
    path[n_frames - 1] = best_cost[n_frames - 1]
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);
    for i in (0..n_frames - 1).rev() {
        path[i] = best_prev[i + 1][path[i + 1]];
    }

    for (frame, &best_idx) in frames.iter_mut().zip(path.iter()) {
        if best_idx > 0 {
            frame.candidates.swap(0, best_idx);
        }
    }
}

/// Pitch contour by the autocorrelation method with default settings.
///
/// A `time_step` of 0 selects the default 0.75 / pitch_floor.
pub fn sound_to_pitch_ac(
    sound: &Sound,
    time_step: f64,
    pitch_floor: f64,
    pitch_ceiling: f64,
) -> Pitch {
    track(
        sound,
        time_step,
        pitch_floor,
        pitch_ceiling,
        TrackerSettings::default(),
    )
}

/// Full tracker; harmonicity calls this with its own settings.
pub(crate) fn track(
    sound: &Sound,
    time_step: f64,
    pitch_floor: f64,
    pitch_ceiling: f64,
    settings: TrackerSettings,
) -> Pitch {
    let samples = sound.as_slice();
    let sample_rate = sound.sample_rate();
    let duration = sound.duration();

    let time_step = if time_step <= 0.0 {
        0.75 / pitch_floor
    } else {
        time_step
    };

    let window_duration = settings.periods_per_window / pitch_floor;
    let min_lag = (sample_rate / pitch_ceiling).ceil() as usize;
    let max_lag = (sample_rate / pitch_floor).floor() as usize;

    let mut window_samples = (window_duration * sample_rate).round() as usize;
    if window_samples % 2 == 0 {
        window_samples += 1;
    }
    let half_window_samples = window_samples / 2;

    let window = hanning_window(window_samples);
    let r_w = autocorrelation(&window, max_lag);

    let (n_frames, t1) = match settings.timing {
        FrameTiming::Left => {
            let n = ((duration - 2.0 * window_duration) / time_step + 1e-9).floor() as usize + 1;
            let n = n.max(1);
            let remaining = duration - 2.0 * window_duration - (n - 1) as f64 * time_step;
            (n, window_duration + remaining / 2.0)
        }
        FrameTiming::Centered => {
            let n = ((duration - window_duration) / time_step + 1e-9).floor() as usize + 1;
            let n = n.max(1);
            (n, (duration - (n - 1) as f64 * time_step) / 2.0)
        }
    };

    let global_peak = samples.iter().map(|&s| s.abs()).fold(0.0f64, f64::max);
    let n_samples = samples.len();

    let mut frames = Vec::with_capacity(n_frames);
    for i in 0..n_frames {
        let t = t1 + i as f64 * time_step;

        // Frame samples centered at t, zero-padded at the signal edges.
        let center_sample = (t * sample_rate).round() as isize;
        let start_sample = center_sample - half_window_samples as isize;
        let end_sample = start_sample + window_samples as isize;

        let mut frame_samples = vec![0.0; window_samples];
        let src_start = start_sample.max(0) as usize;
        let src_end = end_sample.min(n_samples as isize).max(0) as usize;
        if src_start < src_end {
            let dst_start = (src_start as isize - start_sample) as usize;
            frame_samples[dst_start..dst_start + (src_end - src_start)]
                .copy_from_slice(&samples[src_start..src_end]);
        }

        let local_peak = frame_samples.iter().map(|&s| s.abs()).fold(0.0f64, f64::max);
        let local_intensity = local_peak / (global_peak + 1e-30);

        let windowed: Vec<f64> = frame_samples
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| s * w)
            .collect();
        let r = autocorrelation(&windowed, max_lag);
        let peaks = correlation_peaks(&r, &r_w, min_lag, max_lag, sample_rate, 15);

        // Unvoiced candidate strength, Boersma Eq. 23.
        let unvoiced_strength = settings.voicing_threshold
            + (2.0 - local_intensity / settings.silence_threshold).max(0.0)
                * (1.0 + settings.voicing_threshold);
        let mut candidates = vec![PitchCandidate::new(0.0, unvoiced_strength)];

        for (freq, strength) in peaks {
            if freq > 0.0 && strength > 0.0 {
                let adjusted = if settings.apply_octave_cost {
                    // Octave cost, Boersma Eq. 24.
                    strength - settings.octave_cost * (pitch_floor / freq + 1e-30).log2()
                } else {
                    strength
                };
                candidates.push(PitchCandidate::new(freq, adjusted));
            }
        }

        candidates.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        frames.push(PitchFrame::new(t, candidates, local_intensity));
    }

    viterbi_path(
        &mut frames,
        time_step,
        settings.octave_jump_cost,
        settings.voiced_unvoiced_cost,
    );

    Pitch::new(frames, time_step, pitch_floor, pitch_ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, duration: f64, sample_rate: f64) -> Sound {
        let n = (duration * sample_rate) as usize;
        let samples: Vec<f64> = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate).sin())
            .collect();
        Sound::from_slice(&samples, sample_rate)
    }

    #[test]
    fn sine_is_voiced_at_its_frequency() {
        let sound = sine(220.0, 0.5, 16000.0);
        let pitch = sound.to_pitch_ac(0.0, 75.0, 500.0);

        let voiced = pitch.voiced_values();
        assert!(!voiced.is_empty());
        let mean = voiced.iter().sum::<f64>() / voiced.len() as f64;
        assert!((mean - 220.0).abs() < 5.0, "mean pitch {} Hz", mean);
    }

    #[test]
    fn silence_is_unvoiced() {
        let sound = Sound::from_slice(&vec![0.0; 16000], 16000.0);
        let pitch = sound.to_pitch_ac(0.0, 75.0, 500.0);
        assert!(pitch.n_frames() > 0);
        assert_eq!(pitch.count_voiced_frames(), 0);
        assert!(pitch.voiced_values().is_empty());
    }

    #[test]
    fn value_at_time_interpolates_voiced_frames() {
        let sound = sine(150.0, 0.5, 16000.0);
        let pitch = sound.to_pitch_ac(0.0, 75.0, 500.0);
        let mid = sound.duration() / 2.0;
        let f = pitch.value_at_time(mid).expect("voiced at midpoint");
        assert!((f - 150.0).abs() < 5.0);
        assert!(pitch.value_at_time(-1.0).is_none());
        assert!(pitch.value_at_time(10.0).is_none());
    }
}
