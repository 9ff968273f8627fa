//! Mono audio container.
//!
//! `Sound` is the foundation type every analysis starts from: a 1-D array
//! of f64 samples plus a sample rate. Integer WAV formats are normalized
//! to [-1.0, 1.0] on load; float formats are taken as-is.
//!
//! Only mono audio is supported. Multi-channel files must go through
//! [`Sound::from_file_channel`] so the channel choice is explicit rather
//! than an undocumented mixdown.

use std::path::Path;

use ndarray::Array1;

use crate::error::{Error, Result};
use crate::formant::Formant;
use crate::harmonicity::Harmonicity;
use crate::intensity::Intensity;
use crate::pitch::Pitch;
use crate::pulses::PointProcess;
use crate::spectrum::Spectrum;

/// Audio samples with a sample rate.
///
/// # Example
///
/// ```no_run
/// use vocalysis::Sound;
///
/// let sound = Sound::from_file("speech.wav").unwrap();
/// println!("{:.3}s at {} Hz", sound.duration(), sound.sample_rate());
/// ```
#[derive(Debug, Clone)]
pub struct Sound {
    /// Samples, nominally in [-1.0, 1.0] for integer source formats.
    samples: Array1<f64>,
    /// Sample rate in Hz.
    sample_rate: f64,
}

/// Read every interleaved sample of a WAV file as f64.
///
/// Integer formats are scaled by 2^(bits-1) so full scale maps to ±1.0.
fn read_wav_samples(
    reader: hound::WavReader<std::io::BufReader<std::fs::File>>,
) -> Result<Vec<f64>> {
    let spec = reader.spec();
    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<std::result::Result<Vec<f64>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / max_val))
                .collect::<std::result::Result<Vec<f64>, _>>()?
        }
    };
    Ok(samples)
}

impl Sound {
    /// Create a Sound from an existing sample array.
    pub fn new(samples: Array1<f64>, sample_rate: f64) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a Sound by copying a slice of samples.
    pub fn from_slice(samples: &[f64], sample_rate: f64) -> Self {
        Self::new(Array1::from_vec(samples.to_vec()), sample_rate)
    }

    /// Load a mono WAV file.
    ///
    /// # Errors
    ///
    /// [`Error::NotMono`] for multi-channel files, [`Error::AudioRead`]
    /// when the file is missing, truncated, or not WAV data.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        if spec.channels != 1 {
            return Err(Error::NotMono(spec.channels));
        }
        let sample_rate = spec.sample_rate as f64;
        let samples = read_wav_samples(reader)?;
        log::debug!("loaded {} mono samples at {} Hz", samples.len(), sample_rate);
        Ok(Self::new(Array1::from_vec(samples), sample_rate))
    }

    /// Load one channel of a possibly multi-channel WAV file.
    ///
    /// WAV stores frames interleaved (`[L0, R0, L1, R1, ...]`), so channel
    /// `c` of an `n`-channel file is every n-th sample starting at `c`.
    pub fn from_file_channel<P: AsRef<Path>>(path: P, channel: usize) -> Result<Self> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let n_channels = spec.channels as usize;
        if channel >= n_channels {
            return Err(Error::InvalidParameter(format!(
                "channel {} does not exist, file has {} channels",
                channel, n_channels
            )));
        }
        let sample_rate = spec.sample_rate as f64;
        let interleaved = read_wav_samples(reader)?;
        let samples: Vec<f64> = interleaved
            .iter()
            .skip(channel)
            .step_by(n_channels)
            .copied()
            .collect();
        Ok(Self::new(Array1::from_vec(samples), sample_rate))
    }

    /// The sample array.
    #[inline]
    pub fn samples(&self) -> &Array1<f64> {
        &self.samples
    }

    /// Samples as a contiguous slice.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        // An Array1 built from a Vec is always contiguous.
        self.samples.as_slice().expect("sample buffer is contiguous")
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Total duration in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.n_samples() as f64 / self.sample_rate
    }

    /// Sample period (1 / sample rate) in seconds.
    #[inline]
    pub fn dx(&self) -> f64 {
        1.0 / self.sample_rate
    }

    // ----- analysis conveniences -----
    //
    // Each method delegates to the module implementing the algorithm;
    // parameter conventions follow Praat where a counterpart exists.

    /// Single-frame spectrum of the whole sound.
    ///
    /// With `fast` the signal is zero-padded to a power-of-2 FFT size.
    pub fn to_spectrum(&self, fast: bool) -> Spectrum {
        crate::spectrum::sound_to_spectrum(self, fast)
    }

    /// Intensity contour in dB.
    ///
    /// `min_pitch` sets the analysis window length; `time_step` of 0
    /// selects the default of 0.8 / min_pitch.
    pub fn to_intensity(&self, min_pitch: f64, time_step: f64) -> Intensity {
        crate::intensity::sound_to_intensity(self, min_pitch, time_step)
    }

    /// Pitch (F0) contour by the autocorrelation method.
    ///
    /// `time_step` of 0 selects the default of 0.75 / pitch_floor.
    pub fn to_pitch_ac(&self, time_step: f64, pitch_floor: f64, pitch_ceiling: f64) -> Pitch {
        crate::pitch::sound_to_pitch_ac(self, time_step, pitch_floor, pitch_ceiling)
    }

    /// Harmonics-to-noise ratio contour by the autocorrelation method.
    pub fn to_harmonicity_ac(
        &self,
        time_step: f64,
        min_pitch: f64,
        silence_threshold: f64,
        periods_per_window: f64,
    ) -> Harmonicity {
        crate::harmonicity::sound_to_harmonicity_ac(
            self,
            time_step,
            min_pitch,
            silence_threshold,
            periods_per_window,
        )
    }

    /// Glottal pulse train derived from this sound and its pitch contour.
    pub fn to_point_process_cc(&self, pitch: &Pitch) -> PointProcess {
        crate::pulses::sound_to_point_process_cc(self, pitch)
    }

    /// Formant tracks by Burg's LPC method.
    pub fn to_formant_burg(
        &self,
        time_step: f64,
        max_num_formants: usize,
        max_formant_hz: f64,
        window_length: f64,
        pre_emphasis_from: f64,
    ) -> Formant {
        crate::formant::sound_to_formant_burg(
            self,
            time_step,
            max_num_formants,
            max_formant_hz,
            window_length,
            pre_emphasis_from,
        )
    }
}

impl std::fmt::Display for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sound({} samples, {} Hz, {:.3}s)",
            self.n_samples(),
            self.sample_rate,
            self.duration()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let sound = Sound::from_slice(&[0.0, 0.5, -0.5, 0.25], 4.0);
        assert_eq!(sound.n_samples(), 4);
        assert_eq!(sound.sample_rate(), 4.0);
        assert!((sound.duration() - 1.0).abs() < 1e-12);
        assert!((sound.dx() - 0.25).abs() < 1e-12);
        assert_eq!(sound.as_slice(), &[0.0, 0.5, -0.5, 0.25]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Sound::from_file("definitely/not/here.wav").is_err());
    }
}
