//! Single-frame FFT spectrum and its moments.
//!
//! The spectrum holds complex bins from DC to Nyquist (negative
//! frequencies are redundant for real input). The DFT output is scaled
//! by the sample period so it approximates the continuous transform, the
//! convention the spectral-moment formulas in the Praat manual assume.
//!
//! Moments (center of gravity, standard deviation, skewness, kurtosis)
//! weight each bin frequency by |S|^p; they are undefined for a spectrum
//! with no energy and come back as `None` in that case.

use ndarray::Array1;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::sound::Sound;

/// Single-frame spectrum, bins from DC to Nyquist.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Real parts of the bins.
    real: Array1<f64>,
    /// Imaginary parts of the bins.
    imag: Array1<f64>,
    /// Bin width in Hz (sample_rate / FFT size).
    df: f64,
    /// Nyquist frequency in Hz.
    f_max: f64,
}

impl Spectrum {
    pub fn new(real: Array1<f64>, imag: Array1<f64>, df: f64, f_max: f64) -> Self {
        Self {
            real,
            imag,
            df,
            f_max,
        }
    }

    /// Real parts of the bins.
    #[inline]
    pub fn real(&self) -> &Array1<f64> {
        &self.real
    }

    /// Imaginary parts of the bins.
    #[inline]
    pub fn imag(&self) -> &Array1<f64> {
        &self.imag
    }

    /// Bin width in Hz.
    #[inline]
    pub fn df(&self) -> f64 {
        self.df
    }

    /// Nyquist frequency in Hz.
    #[inline]
    pub fn f_max(&self) -> f64 {
        self.f_max
    }

    /// Number of bins (FFT size / 2 + 1).
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.real.len()
    }

    /// |S|^power weight of one bin.
    #[inline]
    fn weight(&self, i: usize, power: f64) -> f64 {
        let magnitude = (self.real[i].powi(2) + self.imag[i].powi(2)).sqrt();
        magnitude.powf(power)
    }

    /// Center of gravity and total weight, shared by every moment query.
    ///
    /// `None` when the spectrum carries no energy.
    fn gravity(&self, power: f64) -> Option<(f64, f64)> {
        let mut weighted_sum = 0.0;
        let mut freq_weighted_sum = 0.0;
        for i in 0..self.n_bins() {
            let w = self.weight(i, power);
            weighted_sum += w;
            freq_weighted_sum += i as f64 * self.df * w;
        }
        if weighted_sum == 0.0 {
            None
        } else {
            Some((freq_weighted_sum / weighted_sum, weighted_sum))
        }
    }

    /// n-th central moment: Σ (f − CoG)ⁿ |S|^p / Σ |S|^p.
    fn central_moment(&self, n: i32, power: f64) -> Option<f64> {
        let (cog, total) = self.gravity(power)?;
        let numerator: f64 = (0..self.n_bins())
            .map(|i| (i as f64 * self.df - cog).powi(n) * self.weight(i, power))
            .sum();
        Some(numerator / total)
    }

    /// Center of gravity (spectral centroid) in Hz.
    ///
    /// First spectral moment; `power` of 2 weights by the power spectrum.
    pub fn center_of_gravity(&self, power: f64) -> Option<f64> {
        self.gravity(power).map(|(cog, _)| cog)
    }

    /// Standard deviation around the center of gravity, in Hz.
    pub fn standard_deviation(&self, power: f64) -> Option<f64> {
        self.central_moment(2, power).map(f64::sqrt)
    }

    /// Skewness: μ₃ / μ₂^1.5 (dimensionless asymmetry).
    pub fn skewness(&self, power: f64) -> Option<f64> {
        let mu2 = self.central_moment(2, power)?;
        let mu3 = self.central_moment(3, power)?;
        if mu2 == 0.0 {
            None
        } else {
            Some(mu3 / mu2.powf(1.5))
        }
    }

    /// Excess kurtosis: μ₄ / μ₂² − 3 (zero for a Gaussian shape).
    pub fn kurtosis(&self, power: f64) -> Option<f64> {
        let mu2 = self.central_moment(2, power)?;
        let mu4 = self.central_moment(4, power)?;
        if mu2 == 0.0 {
            None
        } else {
            Some(mu4 / mu2.powi(2) - 3.0)
        }
    }
}

/// Compute the spectrum of a whole sound.
///
/// With `fast` the input is zero-padded to the next power of 2 before
/// the FFT. Bins are scaled by the sample period dt, turning the DFT sum
/// into a Riemann approximation of the continuous transform.
pub fn sound_to_spectrum(sound: &Sound, fast: bool) -> Spectrum {
    let samples = sound.samples();
    let n_samples = samples.len();
    let sample_rate = sound.sample_rate();
    let dt = 1.0 / sample_rate;

    let fft_size = if fast {
        let mut size = 1;
        while size < n_samples {
            size *= 2;
        }
        size
    } else {
        n_samples
    };

    let mut buffer: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); fft_size];
    for (i, &sample) in samples.iter().enumerate() {
        buffer[i] = Complex::new(sample, 0.0);
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    for c in buffer.iter_mut() {
        *c *= dt;
    }

    let n_positive = fft_size / 2 + 1;
    let real: Vec<f64> = buffer[..n_positive].iter().map(|c| c.re).collect();
    let imag: Vec<f64> = buffer[..n_positive].iter().map(|c| c.im).collect();

    Spectrum::new(
        Array1::from_vec(real),
        Array1::from_vec(imag),
        sample_rate / fft_size as f64,
        sample_rate / 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_centroid_sits_at_its_frequency() {
        let sample_rate = 16000.0;
        let samples: Vec<f64> = (0..16384)
            .map(|i| (2.0 * std::f64::consts::PI * 1000.0 * i as f64 / sample_rate).sin())
            .collect();
        let spectrum = Sound::from_slice(&samples, sample_rate).to_spectrum(true);

        let cog = spectrum.center_of_gravity(2.0).expect("energy present");
        assert!((cog - 1000.0).abs() < 20.0, "centroid {} Hz", cog);
        assert!(spectrum.standard_deviation(2.0).expect("defined") >= 0.0);
    }

    #[test]
    fn moments_are_undefined_for_silence() {
        let spectrum = Sound::from_slice(&vec![0.0; 4096], 16000.0).to_spectrum(true);
        assert!(spectrum.center_of_gravity(2.0).is_none());
        assert!(spectrum.standard_deviation(2.0).is_none());
        assert!(spectrum.skewness(2.0).is_none());
        assert!(spectrum.kurtosis(2.0).is_none());
    }
}
