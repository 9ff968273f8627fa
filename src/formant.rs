//! Formant tracks by Burg's LPC method.
//!
//! Pipeline per Praat's Sound: To Formant (burg)...: resample to twice
//! the formant ceiling, pre-emphasize, then per frame apply a Gaussian
//! window, fit LPC coefficients of order 2 × max formants with Burg's
//! recursion (Childers 1978, pp. 252-255), take the polynomial roots via
//! companion-matrix eigenvalues (Numerical Recipes Ch. 9.5), and convert
//! upper-half-plane roots to frequency/bandwidth pairs (Markel & Gray
//! 1976). Formants below 50 Hz or within 50 Hz of the ceiling are
//! discarded.

use ndarray::Array1;
use num_complex::Complex64;
use rubato::{FftFixedIn, Resampler};

use crate::sound::Sound;

/// One formant: frequency and bandwidth in Hz.
#[derive(Debug, Clone)]
pub struct FormantPoint {
    pub frequency: f64,
    pub bandwidth: f64,
}

impl FormantPoint {
    pub fn new(frequency: f64, bandwidth: f64) -> Self {
        Self {
            frequency,
            bandwidth,
        }
    }
}

/// Formants of one analysis frame, ordered by frequency (F1 first).
#[derive(Debug, Clone)]
pub struct FormantFrame {
    /// Frame center time in seconds.
    pub time: f64,
    /// Formants found in this frame.
    pub formants: Vec<FormantPoint>,
}

impl FormantFrame {
    pub fn new(time: f64, formants: Vec<FormantPoint>) -> Self {
        Self { time, formants }
    }

    /// Number of formants found in this frame.
    #[inline]
    pub fn n_formants(&self) -> usize {
        self.formants.len()
    }

    /// Formant `n`, 1-based (1 = F1).
    pub fn get_formant(&self, n: usize) -> Option<&FormantPoint> {
        if n >= 1 {
            self.formants.get(n - 1)
        } else {
            None
        }
    }
}

/// Formant tracks over time.
#[derive(Debug, Clone)]
pub struct Formant {
    frames: Vec<FormantFrame>,
    time_step: f64,
    max_formant_hz: f64,
    max_num_formants: usize,
}

impl Formant {
    pub fn new(
        frames: Vec<FormantFrame>,
        time_step: f64,
        max_formant_hz: f64,
        max_num_formants: usize,
    ) -> Self {
        Self {
            frames,
            time_step,
            max_formant_hz,
            max_num_formants,
        }
    }

    /// The analysis frames.
    #[inline]
    pub fn frames(&self) -> &[FormantFrame] {
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

    /// Formant ceiling in Hz.
    #[inline]
    pub fn max_formant_hz(&self) -> f64 {
        self.max_formant_hz
    }

    /// Maximum number of formants per frame.
    #[inline]
    pub fn max_num_formants(&self) -> usize {
        self.max_num_formants
    }

    /// Frame times.
    pub fn times(&self) -> Array1<f64> {
        Array1::from_iter(self.frames.iter().map(|f| f.time))
    }

    /// Frequency track of formant `n` (1 = F1); NaN where absent.
    pub fn formant_values(&self, formant_number: usize) -> Array1<f64> {
        Array1::from_iter(self.frames.iter().map(|frame| {
            frame
                .get_formant(formant_number)
                .map_or(f64::NAN, |fp| fp.frequency)
        }))
    }

    /// Bandwidth track of formant `n` (1 = B1); NaN where absent.
    pub fn bandwidth_values(&self, formant_number: usize) -> Array1<f64> {
        Array1::from_iter(self.frames.iter().map(|frame| {
            frame
                .get_formant(formant_number)
                .map_or(f64::NAN, |fp| fp.bandwidth)
        }))
    }
}

/// Gaussian window for formant frames (α = 12, not edge-normalized).
fn gaussian_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0];
    }
    let alpha = 12.0;
    let mid = (n - 1) as f64 / 2.0;
    (0..n)
        .map(|i| {
            let x = (i as f64 - mid) / mid;
            (-alpha * x * x).exp()
        })
        .collect()
}

/// Burg's recursion for LPC coefficients (a[0] = 1).
fn burg_lpc(samples: &[f64], order: usize) -> Vec<f64> {
    let n = samples.len();
    if n <= order {
        return vec![0.0; order + 1];
    }

    let mut a = vec![0.0; order + 1];
    a[0] = 1.0;

    // Forward and backward prediction errors.
    let mut ef: Vec<f64> = samples.to_vec();
    let mut eb: Vec<f64> = samples.to_vec();

    for k in 1..=order {
        let mut num = 0.0;
        let mut den = 0.0;
        for i in k..n {
            num += ef[i] * eb[i - 1];
            den += ef[i] * ef[i] + eb[i - 1] * eb[i - 1];
        }
        if den < 1e-30 {
            break;
        }
        let reflection = -2.0 * num / den;

        let mut ef_new = vec![0.0; n];
        let mut eb_new = vec![0.0; n];
        for i in k..n {
            ef_new[i] = ef[i] + reflection * eb[i - 1];
            eb_new[i] = eb[i - 1] + reflection * ef[i];
        }
        ef = ef_new;
        eb = eb_new;

        // Levinson update of the coefficients.
        let mut a_new = vec![0.0; order + 1];
        a_new[0] = 1.0;
        for i in 1..k {
            a_new[i] = a[i] + reflection * a[k - i];
        }
        a_new[k] = reflection;
        a = a_new;
    }

    a
}

/// Evaluate P(z) = z^p + a[1]z^{p-1} + ... + a[p] and P'(z) by Horner.
fn eval_polynomial(a: &[f64], z: Complex64) -> (Complex64, Complex64) {
    let order = a.len() - 1;
    if order < 1 {
        return (Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0));
    }
    let mut p_val = Complex64::new(1.0, 0.0);
    let mut dp_val = Complex64::new(0.0, 0.0);
    for coeff in a.iter().skip(1) {
        dp_val = p_val + z * dp_val;
        p_val = p_val * z + Complex64::new(*coeff, 0.0);
    }
    (p_val, dp_val)
}

/// Newton-Raphson polish of one root.
fn polish_root(a: &[f64], mut z: Complex64, max_iter: usize, tol: f64) -> Complex64 {
    for _ in 0..max_iter {
        let (p_val, dp_val) = eval_polynomial(a, z);
        if dp_val.norm() < 1e-30 {
            break;
        }
        let delta = p_val / dp_val;
        z -= delta;
        if delta.norm() < tol * z.norm() {
            break;
        }
    }
    z
}

/// Roots of the LPC polynomial, unstable ones reflected into the unit
/// circle and all of them Newton-polished.
fn lpc_roots(a: &[f64]) -> Vec<Complex64> {
    let order = a.len() - 1;
    if order < 1 {
        return Vec::new();
    }

    // Companion matrix: -coefficients in the first row, 1s under the
    // diagonal; its eigenvalues are the polynomial roots.
    let mut companion = ndarray::Array2::<f64>::zeros((order, order));
    for i in 0..order {
        companion[[0, i]] = -a[i + 1];
    }
    for i in 1..order {
        companion[[i, i - 1]] = 1.0;
    }

    let mut roots = eigenvalues(&companion);

    for root in roots.iter_mut() {
        // Reflect |z| > 1 to 1/conj(z).
        let r = root.norm();
        if r > 1.0 {
            *root = root.conj() / (r * r);
        }
        *root = polish_root(a, *root, 10, 1e-10);
    }

    roots
}

/// Eigenvalues by unshifted QR iteration.
fn eigenvalues(matrix: &ndarray::Array2<f64>) -> Vec<Complex64> {
    let n = matrix.nrows();
    if n == 0 {
        return Vec::new();
    }

    let mut h = matrix.clone();
    let max_iter = 100;
    let tol = 1e-10;

    for _ in 0..max_iter {
        let (q, r) = qr_decomposition(&h);
        h = r.dot(&q);

        let converged = (1..n).all(|i| h[[i, i - 1]].abs() <= tol);
        if converged {
            break;
        }
    }

    // Read eigenvalues off the quasi-triangular result: 1x1 blocks are
    // real, 2x2 blocks may hold a complex conjugate pair.
    let mut eigenvalues = Vec::with_capacity(n);
    let mut i = 0;
    while i < n {
        if i == n - 1 || h[[i + 1, i]].abs() < tol {
            eigenvalues.push(Complex64::new(h[[i, i]], 0.0));
            i += 1;
        } else {
            let (a, b) = (h[[i, i]], h[[i, i + 1]]);
            let (c, d) = (h[[i + 1, i]], h[[i + 1, i + 1]]);
            let trace = a + d;
            let det = a * d - b * c;
            let disc = trace * trace - 4.0 * det;
            if disc < 0.0 {
                let re = trace / 2.0;
                let im = (-disc).sqrt() / 2.0;
                eigenvalues.push(Complex64::new(re, im));
                eigenvalues.push(Complex64::new(re, -im));
            } else {
                let sqrt_disc = disc.sqrt();
                eigenvalues.push(Complex64::new((trace + sqrt_disc) / 2.0, 0.0));
                eigenvalues.push(Complex64::new((trace - sqrt_disc) / 2.0, 0.0));
            }
            i += 2;
        }
    }

    eigenvalues
}

/// QR decomposition by Householder reflections.
fn qr_decomposition(a: &ndarray::Array2<f64>) -> (ndarray::Array2<f64>, ndarray::Array2<f64>) {
    let n = a.nrows();
    let mut q = ndarray::Array2::<f64>::eye(n);
    let mut r = a.clone();

    for k in 0..n.saturating_sub(1) {
        let mut x = Vec::with_capacity(n - k);
        for i in k..n {
            x.push(r[[i, k]]);
        }

        let norm_x: f64 = x.iter().map(|&v| v * v).sum::<f64>().sqrt();
        if norm_x < 1e-30 {
            continue;
        }
        let sign = if x[0] >= 0.0 { 1.0 } else { -1.0 };
        x[0] += sign * norm_x;

        let norm_v: f64 = x.iter().map(|&v| v * v).sum::<f64>().sqrt();
        if norm_v < 1e-30 {
            continue;
        }
        for v in x.iter_mut() {
            *v /= norm_v;
        }

        for j in k..n {
            let mut dot = 0.0;
            for i in 0..(n - k) {
                dot += x[i] * r[[k + i, j]];
            }
            for i in 0..(n - k) {
                r[[k + i, j]] -= 2.0 * dot * x[i];
            }
        }
        for j in 0..n {
            let mut dot = 0.0;
            for i in 0..(n - k) {
                dot += x[i] * q[[j, k + i]];
            }
            for i in 0..(n - k) {
                q[[j, k + i]] -= 2.0 * dot * x[i];
            }
        }
    }

    (q, r)
}

/// Upper-half-plane roots to formants:
/// frequency = arg(z) · fs / 2π, bandwidth = −ln|z| · fs / π.
fn roots_to_formants(
    roots: &[Complex64],
    sample_rate: f64,
    min_freq: f64,
    max_freq: f64,
) -> Vec<FormantPoint> {
    let mut formants = Vec::new();
    for root in roots {
        if root.im <= 0.0 {
            continue;
        }
        let r = root.norm();
        let freq = root.arg() * sample_rate / (2.0 * std::f64::consts::PI);
        let bandwidth = if r > 0.0 {
            -r.ln() * sample_rate / std::f64::consts::PI
        } else {
            f64::INFINITY
        };
        if freq >= min_freq && freq <= max_freq && bandwidth > 0.0 {
            formants.push(FormantPoint::new(freq, bandwidth));
        }
    }
    formants.sort_by(|a, b| {
        a.frequency
            .partial_cmp(&b.frequency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    formants
}

/// FFT-based resampling, falling back to linear interpolation if the
/// resampler cannot be constructed for the rate pair.
fn resample(samples: &[f64], old_rate: f64, new_rate: f64) -> Vec<f64> {
    if (old_rate - new_rate).abs() < 1e-6 {
        return samples.to_vec();
    }

    let ratio = new_rate / old_rate;
    let new_length = (samples.len() as f64 * ratio).round() as usize;
    if new_length == 0 {
        return Vec::new();
    }

    let chunk_size = 1024.min(samples.len());
    let mut resampler =
        match FftFixedIn::<f64>::new(old_rate as usize, new_rate as usize, chunk_size, 2, 1) {
            Ok(r) => r,
            Err(_) => return linear_resample(samples, new_length),
        };

    let mut output = Vec::with_capacity(new_length);
    let mut pos = 0;
    while pos < samples.len() {
        let end = (pos + chunk_size).min(samples.len());
        let mut chunk = samples[pos..end].to_vec();
        chunk.resize(chunk_size, 0.0);

        match resampler.process(&[chunk], None) {
            Ok(result) => {
                if let Some(channel) = result.first() {
                    output.extend(channel);
                }
            }
            Err(_) => break,
        }
        pos += chunk_size;
    }

    output.truncate(new_length);
    output
}

/// Linear-interpolation resampling.
fn linear_resample(samples: &[f64], new_length: usize) -> Vec<f64> {
    if samples.is_empty() || new_length == 0 {
        return Vec::new();
    }
    let ratio = (samples.len() - 1) as f64 / (new_length - 1).max(1) as f64;
    (0..new_length)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos.floor() as usize;
            let frac = pos - idx as f64;
            if idx >= samples.len() - 1 {
                samples[samples.len() - 1]
            } else {
                samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
            }
        })
        .collect()
}

/// Track formants with Burg's LPC method.
///
/// `window_length` follows the Praat convention: the physical window is
/// twice this value. A `time_step` of 0 selects window_length / 4.
pub fn sound_to_formant_burg(
    sound: &Sound,
    time_step: f64,
    max_num_formants: usize,
    max_formant_hz: f64,
    window_length: f64,
    pre_emphasis_from: f64,
) -> Formant {
    let original_rate = sound.sample_rate();
    let duration = sound.duration();

    // Resample so the formant ceiling sits at the new Nyquist.
    let target_rate = 2.0 * max_formant_hz;
    let (samples, sample_rate) = if target_rate < original_rate {
        (
            resample(sound.as_slice(), original_rate, target_rate),
            target_rate,
        )
    } else {
        (sound.as_slice().to_vec(), original_rate)
    };

    // Pre-emphasis: x'[i] = x[i] − α·x[i−1], α = exp(−2π·F·Δt).
    let dt = 1.0 / sample_rate;
    let alpha = (-2.0 * std::f64::consts::PI * pre_emphasis_from * dt).exp();
    let mut pre_emphasized = vec![0.0; samples.len()];
    if !samples.is_empty() {
        pre_emphasized[0] = samples[0];
        for i in 1..samples.len() {
            pre_emphasized[i] = samples[i] - alpha * samples[i - 1];
        }
    }

    let physical_window_duration = 2.0 * window_length;
    let mut window_samples = (physical_window_duration * sample_rate).round() as usize;
    if window_samples % 2 == 0 {
        window_samples += 1;
    }
    let half_window = window_samples / 2;

    let time_step = if time_step <= 0.0 {
        window_length / 4.0
    } else {
        time_step
    };

    let lpc_order = 2 * max_num_formants;
    let window = gaussian_window(window_samples);

    let n_frames = (((duration - physical_window_duration) / time_step).floor() as usize + 1).max(1);
    let t1 = (duration - (n_frames - 1) as f64 * time_step) / 2.0;

    let mut frames = Vec::with_capacity(n_frames);
    for i in 0..n_frames {
        let t = t1 + i as f64 * time_step;

        let center_sample = (t * sample_rate).round() as isize;
        let start_sample = center_sample - half_window as isize;
        let end_sample = start_sample + window_samples as isize;

        let mut frame_samples = vec![0.0; window_samples];
        let src_start = start_sample.max(0) as usize;
        let src_end = end_sample.min(pre_emphasized.len() as isize).max(0) as usize;
        if src_start < src_end {
            let dst_start = (src_start as isize - start_sample) as usize;
            frame_samples[dst_start..dst_start + (src_end - src_start)]
                .copy_from_slice(&pre_emphasized[src_start..src_end]);
        }

        let windowed: Vec<f64> = frame_samples
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| s * w)
            .collect();

        let lpc_coeffs = burg_lpc(&windowed, lpc_order);
        let roots = lpc_roots(&lpc_coeffs);
        let mut formant_points =
            roots_to_formants(&roots, sample_rate, 50.0, max_formant_hz - 50.0);
        formant_points.truncate(max_num_formants);

        frames.push(FormantFrame::new(t, formant_points));
    }

    Formant::new(frames, time_step, max_formant_hz, max_num_formants)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_conversion_matches_the_closed_form() {
        // A root at radius 0.95, angle for 1000 Hz at fs = 10 kHz.
        let sample_rate = 10000.0;
        let theta = 2.0 * std::f64::consts::PI * 1000.0 / sample_rate;
        let root = Complex64::from_polar(0.95, theta);

        let formants = roots_to_formants(&[root], sample_rate, 50.0, 4950.0);
        assert_eq!(formants.len(), 1);
        assert!((formants[0].frequency - 1000.0).abs() < 1e-6);

        let expected_bw = -0.95f64.ln() * sample_rate / std::f64::consts::PI;
        assert!((formants[0].bandwidth - expected_bw).abs() < 1e-6);
    }

    #[test]
    fn lower_half_plane_roots_are_ignored() {
        let root = Complex64::new(0.5, -0.5);
        assert!(roots_to_formants(&[root], 10000.0, 50.0, 4950.0).is_empty());
    }

    #[test]
    fn tracking_a_short_sine_produces_frames() {
        let sample_rate = 16000.0;
        let samples: Vec<f64> = (0..8000)
            .map(|i| (2.0 * std::f64::consts::PI * 300.0 * i as f64 / sample_rate).sin())
            .collect();
        let sound = Sound::from_slice(&samples, sample_rate);

        let formant = sound.to_formant_burg(0.0, 5, 5500.0, 0.025, 50.0);
        assert!(formant.n_frames() > 0);
        assert_eq!(formant.max_num_formants(), 5);
        assert_eq!(formant.formant_values(1).len(), formant.n_frames());
    }
}
