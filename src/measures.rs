//! Voice measurement functions.
//!
//! Every function here has the same shape: a tagged source (a file path
//! or pre-built analysis handles), one or more engine calls, and a flat
//! result struct whose values are unit-annotated strings. Handle
//! variants exist so several measurements can share one expensive
//! decode or analysis pass instead of repeating it; the aggregator in
//! [`crate::report`] relies on that.
//!
//! Statistics that are undefined for the input at hand (no voiced
//! frames, fewer than two admissible periods, a silent signal) are
//! `None` fields, serialized as explicit nulls rather than formatted
//! zeros. The key set of every result struct is fixed by construction.

use std::borrow::Cow;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::formant::Formant;
use crate::harmonicity::Harmonicity;
use crate::intensity::Intensity;
use crate::pitch::Pitch;
use crate::pulses::{self, PerturbationParams, PointProcess};
use crate::sound::Sound;
use crate::spectrum::Spectrum;

/// Silence threshold for the harmonicity analysis.
pub(crate) const HARMONICITY_SILENCE_THRESHOLD: f64 = 0.1;
/// Window length for the harmonicity analysis, in pitch periods.
pub(crate) const HARMONICITY_PERIODS_PER_WINDOW: f64 = 4.5;
/// Formant analysis window length parameter in seconds.
pub(crate) const FORMANT_WINDOW_LENGTH: f64 = 0.025;
/// Pre-emphasis start frequency for formant analysis, in Hz.
pub(crate) const PRE_EMPHASIS_FROM: f64 = 50.0;
/// An inter-pulse interval longer than this many maximum pitch periods
/// counts as a voice break.
pub(crate) const VOICE_BREAK_FACTOR: f64 = 1.25;

/// Spectral moments weight bins by the power spectrum.
const MOMENT_POWER: f64 = 2.0;

/// Default analysis parameters shared by every measurement.
///
/// Explicit rather than ambient: the same struct value always produces
/// the same report.
#[derive(Debug, Clone, Copy)]
pub struct VoiceParams {
    /// Pitch floor in Hz; also the minimum pitch for intensity and
    /// harmonicity windows and the voice-break threshold base.
    pub pitch_floor: f64,
    /// Pitch ceiling in Hz.
    pub pitch_ceiling: f64,
    /// Time step for intensity and harmonicity contours in seconds.
    pub time_step: f64,
    /// Formant ceiling in Hz.
    pub max_formant_hz: f64,
    /// Number of formants tracked per frame.
    pub max_formants: usize,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            pitch_floor: 75.0,
            pitch_ceiling: 500.0,
            time_step: 0.01,
            max_formant_hz: 5500.0,
            max_formants: 5,
        }
    }
}

impl VoiceParams {
    /// Reject parameter combinations no analysis can honor.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.pitch_floor <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "pitch floor must be positive, got {}",
                self.pitch_floor
            )));
        }
        if self.pitch_ceiling <= self.pitch_floor {
            return Err(Error::InvalidParameter(format!(
                "pitch ceiling {} must exceed the floor {}",
                self.pitch_ceiling, self.pitch_floor
            )));
        }
        if self.time_step <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "time step must be positive, got {}",
                self.time_step
            )));
        }
        if self.max_formant_hz <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "formant ceiling must be positive, got {}",
                self.max_formant_hz
            )));
        }
        if self.max_formants == 0 {
            return Err(Error::InvalidParameter(
                "at least one formant must be tracked".into(),
            ));
        }
        Ok(())
    }
}

// ----- sources -----
//
// One enum per measurement, listing exactly the handle combinations
// that measurement can start from. Supplying nothing, or a handle the
// measurement cannot use, is unrepresentable.

/// Input for [`measure_pitch`].
#[derive(Debug, Clone, Copy)]
pub enum PitchSource<'a> {
    /// Decode this file and derive the pitch contour.
    Path(&'a Path),
    /// Derive the pitch contour from a decoded sound.
    Sound(&'a Sound),
    /// Use a pre-built pitch contour directly.
    Pitch(&'a Pitch),
}

/// Input for [`measure_pulses`] and [`measure_jitter`].
#[derive(Debug, Clone, Copy)]
pub enum PulseSource<'a> {
    Path(&'a Path),
    Sound(&'a Sound),
    /// Reuse a pitch contour already derived from the sound.
    SoundPitch(&'a Sound, &'a Pitch),
    /// Use a pre-built pulse train directly.
    Pulses(&'a PointProcess),
}

/// Input for [`measure_voicing`].
#[derive(Debug, Clone, Copy)]
pub enum VoicingSource<'a> {
    Path(&'a Path),
    Sound(&'a Sound),
    SoundPitch(&'a Sound, &'a Pitch),
    /// Pre-built pitch contour and pulse train.
    PitchPulses(&'a Pitch, &'a PointProcess),
}

/// Input for [`measure_shimmer`]; shimmer always needs the waveform.
#[derive(Debug, Clone, Copy)]
pub enum ShimmerSource<'a> {
    Path(&'a Path),
    Sound(&'a Sound),
    SoundPitch(&'a Sound, &'a Pitch),
    SoundPulses(&'a Sound, &'a PointProcess),
}

/// Input for [`measure_intensity`].
#[derive(Debug, Clone, Copy)]
pub enum IntensitySource<'a> {
    Path(&'a Path),
    Sound(&'a Sound),
    Intensity(&'a Intensity),
}

/// Input for [`measure_harmonicity`].
#[derive(Debug, Clone, Copy)]
pub enum HarmonicitySource<'a> {
    Path(&'a Path),
    Sound(&'a Sound),
    Harmonicity(&'a Harmonicity),
}

/// Input for [`measure_spectral_shape`].
#[derive(Debug, Clone, Copy)]
pub enum SpectrumSource<'a> {
    Path(&'a Path),
    Sound(&'a Sound),
    Spectrum(&'a Spectrum),
}

/// Input for [`measure_formant_statistics`].
#[derive(Debug, Clone, Copy)]
pub enum FormantSource<'a> {
    Path(&'a Path),
    Sound(&'a Sound),
    Formant(&'a Formant),
}

// ----- results -----

/// Pitch statistics over the voiced frames, as Hz strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchMeasures {
    pub median: Option<String>,
    pub mean: Option<String>,
    pub std: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Pulse counts and period statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PulseMeasures {
    pub num_pulses: usize,
    pub num_periods: usize,
    pub mean_period: Option<String>,
    pub std_period: Option<String>,
}

/// Voicing statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoicingMeasures {
    pub unvoiced_fraction: Option<String>,
    pub num_voice_breaks: usize,
    pub degree_voice_breaks: Option<String>,
}

/// Jitter quotients as percentage strings; the absolute variant is a
/// bare seconds value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JitterMeasures {
    pub jitter_local: Option<String>,
    pub jitter_local_absolute: Option<String>,
    pub jitter_rap: Option<String>,
    pub jitter_ppq5: Option<String>,
    pub jitter_ddp: Option<String>,
}

/// Shimmer quotients as percentage strings; the dB variant keeps its
/// unit suffix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShimmerMeasures {
    pub shimmer_local: Option<String>,
    #[serde(rename = "shimmer_local_dB")]
    pub shimmer_local_db: Option<String>,
    pub shimmer_apq3: Option<String>,
    pub shimmer_apq5: Option<String>,
    pub shimmer_apq11: Option<String>,
    pub shimmer_dda: Option<String>,
}

/// Intensity statistics over the non-silent frames, as dB strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityMeasures {
    pub intensity_median: Option<String>,
    pub intensity_mean: Option<String>,
    pub intensity_std: Option<String>,
    pub intensity_min: Option<String>,
    pub intensity_max: Option<String>,
}

/// Harmonics-to-noise statistics over the voiced frames, as dB strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonicityMeasures {
    pub hnr_mean: Option<String>,
    pub hnr_std: Option<String>,
    pub hnr_min: Option<String>,
    pub hnr_max: Option<String>,
}

/// Spectral moments: Hz strings for the first two, bare numbers for the
/// dimensionless shape measures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralShapeMeasures {
    pub center_of_gravity: Option<String>,
    pub std: Option<String>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

/// Statistics of one formant track, as Hz strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormantTrackStats {
    pub mean: Option<String>,
    pub std: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub median: Option<String>,
    pub bandwidth_median: Option<String>,
}

/// Statistics of the first four formant tracks.
///
/// Serializes flat, `F1_mean` through `F4_bandwidth_median`, so the key
/// set is the same 24 names for every input.
#[derive(Debug, Clone, PartialEq)]
pub struct FormantMeasures {
    pub tracks: [FormantTrackStats; 4],
}

impl Serialize for FormantMeasures {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.tracks.len() * 6))?;
        for (i, track) in self.tracks.iter().enumerate() {
            let n = i + 1;
            map.serialize_entry(&format!("F{n}_mean"), &track.mean)?;
            map.serialize_entry(&format!("F{n}_std"), &track.std)?;
            map.serialize_entry(&format!("F{n}_min"), &track.min)?;
            map.serialize_entry(&format!("F{n}_max"), &track.max)?;
            map.serialize_entry(&format!("F{n}_median"), &track.median)?;
            map.serialize_entry(&format!("F{n}_bandwidth_median"), &track.bandwidth_median)?;
        }
        map.end()
    }
}

// ----- formatting -----

fn fmt_hz(v: f64) -> String {
    format!("{:.3} Hz", v)
}

fn fmt_db(v: f64) -> String {
    format!("{:.3} dB", v)
}

fn fmt_percent(v: f64) -> String {
    format!("{:.3}%", v)
}

fn fmt_seconds(v: f64) -> String {
    format!("{:.10} seconds", v)
}

fn fmt_bare(v: f64) -> String {
    format!("{:.6}", v)
}

/// A fraction as a percentage string.
fn fmt_fraction_percent(v: f64) -> String {
    fmt_percent(v * 100.0)
}

// ----- statistics -----
//
// Population standard deviation, matching the convention of the
// contour statistics this crate reports.

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn std_pop(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    }
}

fn min_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

fn max_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

// ----- resolution helpers -----

fn load(path: &Path) -> Result<Sound> {
    log::debug!("decoding {}", path.display());
    Sound::from_file(path)
}

fn derive_pulses(sound: &Sound, params: &VoiceParams) -> PointProcess {
    let pitch = sound.to_pitch_ac(0.0, params.pitch_floor, params.pitch_ceiling);
    sound.to_point_process_cc(&pitch)
}

fn resolve_pulses<'a>(
    source: PulseSource<'a>,
    params: &VoiceParams,
) -> Result<Cow<'a, PointProcess>> {
    Ok(match source {
        PulseSource::Pulses(p) => Cow::Borrowed(p),
        PulseSource::SoundPitch(sound, pitch) => Cow::Owned(sound.to_point_process_cc(pitch)),
        PulseSource::Sound(sound) => Cow::Owned(derive_pulses(sound, params)),
        PulseSource::Path(path) => Cow::Owned(derive_pulses(&load(path)?, params)),
    })
}

// ----- measurements -----

/// Pitch statistics (median, mean, std, min, max) in Hz.
///
/// All fields are null when the input has no voiced frames.
pub fn measure_pitch(source: PitchSource<'_>, params: &VoiceParams) -> Result<PitchMeasures> {
    params.validate()?;

    let owned;
    let pitch = match source {
        PitchSource::Pitch(p) => p,
        PitchSource::Sound(sound) => {
            owned = sound.to_pitch_ac(0.0, params.pitch_floor, params.pitch_ceiling);
            &owned
        }
        PitchSource::Path(path) => {
            owned = load(path)?.to_pitch_ac(0.0, params.pitch_floor, params.pitch_ceiling);
            &owned
        }
    };

    let voiced = pitch.voiced_values();
    Ok(PitchMeasures {
        median: median(&voiced).map(fmt_hz),
        mean: mean(&voiced).map(fmt_hz),
        std: std_pop(&voiced).map(fmt_hz),
        min: min_value(&voiced).map(fmt_hz),
        max: max_value(&voiced).map(fmt_hz),
    })
}

/// Pulse counts plus mean and standard deviation of the period.
///
/// `num_periods` counts every inter-pulse interval; the period
/// statistics only admit intervals within the conventional period range
/// and are null when fewer than one (mean) or two (std) remain.
pub fn measure_pulses(source: PulseSource<'_>, params: &VoiceParams) -> Result<PulseMeasures> {
    params.validate()?;
    let pulses = resolve_pulses(source, params)?;
    let perturbation = PerturbationParams::default();

    Ok(PulseMeasures {
        num_pulses: pulses.n_points(),
        num_periods: pulses.intervals().len(),
        mean_period: pulses.mean_period(&perturbation).map(fmt_seconds),
        std_period: pulses.stdev_period(&perturbation).map(fmt_seconds),
    })
}

/// Unvoiced fraction, voice-break count, and voice-break degree.
///
/// A voice break is an inter-pulse interval longer than 1.25 maximum
/// pitch periods (1.25 / pitch_floor); the degree is the broken time as
/// a share of the total signal duration.
pub fn measure_voicing(source: VoicingSource<'_>, params: &VoiceParams) -> Result<VoicingMeasures> {
    params.validate()?;

    let owned_pitch;
    let owned_pulses;
    let (pitch, pulses) = match source {
        VoicingSource::PitchPulses(pitch, pulses) => (pitch, pulses),
        VoicingSource::SoundPitch(sound, pitch) => {
            owned_pulses = sound.to_point_process_cc(pitch);
            (pitch, &owned_pulses)
        }
        VoicingSource::Sound(sound) => {
            owned_pitch = sound.to_pitch_ac(0.0, params.pitch_floor, params.pitch_ceiling);
            owned_pulses = sound.to_point_process_cc(&owned_pitch);
            (&owned_pitch, &owned_pulses)
        }
        VoicingSource::Path(path) => {
            let sound = load(path)?;
            owned_pitch = sound.to_pitch_ac(0.0, params.pitch_floor, params.pitch_ceiling);
            owned_pulses = sound.to_point_process_cc(&owned_pitch);
            (&owned_pitch, &owned_pulses)
        }
    };

    let total_frames = pitch.n_frames();
    let unvoiced_fraction = if total_frames > 0 {
        let voiced = pitch.count_voiced_frames() as f64;
        Some((1.0 - voiced / total_frames as f64) * 100.0)
    } else {
        None
    };

    let break_threshold = VOICE_BREAK_FACTOR / params.pitch_floor;
    let breaks: Vec<f64> = pulses
        .intervals()
        .into_iter()
        .filter(|&interval| interval > break_threshold)
        .collect();
    let duration = pulses.total_duration();
    let degree = if duration > 0.0 {
        Some(breaks.iter().sum::<f64>() / duration * 100.0)
    } else {
        None
    };

    Ok(VoicingMeasures {
        unvoiced_fraction: unvoiced_fraction.map(fmt_percent),
        num_voice_breaks: breaks.len(),
        degree_voice_breaks: degree.map(fmt_percent),
    })
}

/// Jitter: local, local absolute, rap, ppq5, and ddp.
pub fn measure_jitter(source: PulseSource<'_>, params: &VoiceParams) -> Result<JitterMeasures> {
    params.validate()?;
    let pulses = resolve_pulses(source, params)?;
    let jitter = pulses::jitter_measures(&pulses, &PerturbationParams::default());

    Ok(JitterMeasures {
        jitter_local: jitter.local.map(fmt_fraction_percent),
        jitter_local_absolute: jitter.local_absolute.map(fmt_bare),
        jitter_rap: jitter.rap.map(fmt_fraction_percent),
        jitter_ppq5: jitter.ppq5.map(fmt_fraction_percent),
        jitter_ddp: jitter.ddp.map(fmt_fraction_percent),
    })
}

/// Shimmer: local, local dB, apq3, apq5, apq11, and dda.
pub fn measure_shimmer(source: ShimmerSource<'_>, params: &VoiceParams) -> Result<ShimmerMeasures> {
    params.validate()?;

    let owned_sound;
    let (sound, pulses) = match source {
        ShimmerSource::SoundPulses(sound, pulses) => (sound, Cow::Borrowed(pulses)),
        ShimmerSource::SoundPitch(sound, pitch) => {
            (sound, Cow::Owned(sound.to_point_process_cc(pitch)))
        }
        ShimmerSource::Sound(sound) => (sound, Cow::Owned(derive_pulses(sound, params))),
        ShimmerSource::Path(path) => {
            owned_sound = load(path)?;
            let pulses = derive_pulses(&owned_sound, params);
            (&owned_sound, Cow::Owned(pulses))
        }
    };

    let shimmer = pulses::shimmer_measures(sound, &pulses, &PerturbationParams::default());
    Ok(ShimmerMeasures {
        shimmer_local: shimmer.local.map(fmt_fraction_percent),
        shimmer_local_db: shimmer.local_db.map(fmt_db),
        shimmer_apq3: shimmer.apq3.map(fmt_fraction_percent),
        shimmer_apq5: shimmer.apq5.map(fmt_fraction_percent),
        shimmer_apq11: shimmer.apq11.map(fmt_fraction_percent),
        shimmer_dda: shimmer.dda.map(fmt_fraction_percent),
    })
}

/// Intensity statistics (median, mean, std, min, max) in dB.
///
/// Silent frames carry no finite intensity and are excluded; a fully
/// silent signal reports all fields as null.
pub fn measure_intensity(
    source: IntensitySource<'_>,
    params: &VoiceParams,
) -> Result<IntensityMeasures> {
    params.validate()?;

    let owned;
    let intensity = match source {
        IntensitySource::Intensity(i) => i,
        IntensitySource::Sound(sound) => {
            owned = sound.to_intensity(params.pitch_floor, params.time_step);
            &owned
        }
        IntensitySource::Path(path) => {
            owned = load(path)?.to_intensity(params.pitch_floor, params.time_step);
            &owned
        }
    };

    let values = intensity.finite_values();
    Ok(IntensityMeasures {
        intensity_median: median(&values).map(fmt_db),
        intensity_mean: mean(&values).map(fmt_db),
        intensity_std: std_pop(&values).map(fmt_db),
        intensity_min: min_value(&values).map(fmt_db),
        intensity_max: max_value(&values).map(fmt_db),
    })
}

/// Harmonics-to-noise ratio statistics in dB over the voiced frames.
pub fn measure_harmonicity(
    source: HarmonicitySource<'_>,
    params: &VoiceParams,
) -> Result<HarmonicityMeasures> {
    params.validate()?;

    let owned;
    let harmonicity = match source {
        HarmonicitySource::Harmonicity(h) => h,
        HarmonicitySource::Sound(sound) => {
            owned = sound.to_harmonicity_ac(
                params.time_step,
                params.pitch_floor,
                HARMONICITY_SILENCE_THRESHOLD,
                HARMONICITY_PERIODS_PER_WINDOW,
            );
            &owned
        }
        HarmonicitySource::Path(path) => {
            owned = load(path)?.to_harmonicity_ac(
                params.time_step,
                params.pitch_floor,
                HARMONICITY_SILENCE_THRESHOLD,
                HARMONICITY_PERIODS_PER_WINDOW,
            );
            &owned
        }
    };

    let values = harmonicity.voiced_values();
    Ok(HarmonicityMeasures {
        hnr_mean: mean(&values).map(fmt_db),
        hnr_std: std_pop(&values).map(fmt_db),
        hnr_min: min_value(&values).map(fmt_db),
        hnr_max: max_value(&values).map(fmt_db),
    })
}

/// Spectral moments: center of gravity and spread in Hz, skewness and
/// excess kurtosis as bare numbers.
pub fn measure_spectral_shape(
    source: SpectrumSource<'_>,
    params: &VoiceParams,
) -> Result<SpectralShapeMeasures> {
    params.validate()?;

    let owned;
    let spectrum = match source {
        SpectrumSource::Spectrum(s) => s,
        SpectrumSource::Sound(sound) => {
            owned = sound.to_spectrum(true);
            &owned
        }
        SpectrumSource::Path(path) => {
            owned = load(path)?.to_spectrum(true);
            &owned
        }
    };

    Ok(SpectralShapeMeasures {
        center_of_gravity: spectrum.center_of_gravity(MOMENT_POWER).map(fmt_hz),
        std: spectrum.standard_deviation(MOMENT_POWER).map(fmt_hz),
        skewness: spectrum.skewness(MOMENT_POWER),
        kurtosis: spectrum.kurtosis(MOMENT_POWER),
    })
}

/// Per-track formant statistics for F1 through F4.
///
/// One tracking pass covers all four tracks; each is then summarized by
/// mean, std, min, max, median, and the median bandwidth, in Hz. Tracks
/// the analysis never populated report all-null statistics.
pub fn measure_formant_statistics(
    source: FormantSource<'_>,
    params: &VoiceParams,
) -> Result<FormantMeasures> {
    params.validate()?;

    let owned;
    let formant = match source {
        FormantSource::Formant(f) => f,
        FormantSource::Sound(sound) => {
            owned = sound.to_formant_burg(
                0.0,
                params.max_formants,
                params.max_formant_hz,
                FORMANT_WINDOW_LENGTH,
                PRE_EMPHASIS_FROM,
            );
            &owned
        }
        FormantSource::Path(path) => {
            owned = load(path)?.to_formant_burg(
                0.0,
                params.max_formants,
                params.max_formant_hz,
                FORMANT_WINDOW_LENGTH,
                PRE_EMPHASIS_FROM,
            );
            &owned
        }
    };

    let mut tracks: [FormantTrackStats; 4] = Default::default();
    for (i, stats) in tracks.iter_mut().enumerate() {
        let n = i + 1;
        let freqs: Vec<f64> = formant
            .formant_values(n)
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();
        let bandwidths: Vec<f64> = formant
            .bandwidth_values(n)
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();

        *stats = FormantTrackStats {
            mean: mean(&freqs).map(fmt_hz),
            std: std_pop(&freqs).map(fmt_hz),
            min: min_value(&freqs).map(fmt_hz),
            max: max_value(&freqs).map(fmt_hz),
            median: median(&freqs).map(fmt_hz),
            bandwidth_median: median(&bandwidths).map(fmt_hz),
        };
    }

    Ok(FormantMeasures { tracks })
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
    fn statistics_helpers() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        let std = std_pop(&[1.0, 2.0, 3.0]).unwrap();
        assert!((std - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(min_value(&[2.0, 1.0, 3.0]), Some(1.0));
        assert_eq!(max_value(&[2.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn formatting_carries_units() {
        assert_eq!(fmt_hz(142.5371), "142.537 Hz");
        assert_eq!(fmt_db(81.8333), "81.833 dB");
        assert_eq!(fmt_percent(4.789_123), "4.789%");
        assert_eq!(fmt_seconds(0.0050364095), "0.0050364095 seconds");
        assert_eq!(fmt_bare(0.000023456), "0.000023");
        assert_eq!(fmt_fraction_percent(0.04123), "4.123%");
    }

    #[test]
    fn invalid_parameters_fail_before_analysis() {
        let params = VoiceParams {
            pitch_floor: 0.0,
            ..VoiceParams::default()
        };
        let sound = sine(220.0, 0.2, 16000.0);
        let err = measure_pitch(PitchSource::Sound(&sound), &params);
        assert!(matches!(err, Err(Error::InvalidParameter(_))));

        let params = VoiceParams {
            pitch_ceiling: 50.0,
            ..VoiceParams::default()
        };
        let err = measure_jitter(PulseSource::Sound(&sound), &params);
        assert!(matches!(err, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn silence_reports_nulls_not_zeros() {
        let silence = Sound::from_slice(&vec![0.0; 16000], 16000.0);
        let params = VoiceParams::default();

        let pitch = measure_pitch(PitchSource::Sound(&silence), &params).unwrap();
        assert_eq!(pitch.mean, None);
        assert_eq!(pitch.median, None);

        let pulses = measure_pulses(PulseSource::Sound(&silence), &params).unwrap();
        assert_eq!(pulses.num_pulses, 0);
        assert_eq!(pulses.std_period, None);

        let intensity = measure_intensity(IntensitySource::Sound(&silence), &params).unwrap();
        assert_eq!(intensity.intensity_mean, None);

        let shape = measure_spectral_shape(SpectrumSource::Sound(&silence), &params).unwrap();
        assert_eq!(shape.center_of_gravity, None);
        assert_eq!(shape.skewness, None);
    }

    #[test]
    fn prebuilt_handles_match_the_derived_path() {
        let sound = sine(220.0, 0.5, 16000.0);
        let params = VoiceParams::default();

        let pitch = sound.to_pitch_ac(0.0, params.pitch_floor, params.pitch_ceiling);
        let from_handle = measure_pitch(PitchSource::Pitch(&pitch), &params).unwrap();
        let from_sound = measure_pitch(PitchSource::Sound(&sound), &params).unwrap();
        assert_eq!(from_handle, from_sound);

        let pulses = sound.to_point_process_cc(&pitch);
        let jitter_handle = measure_jitter(PulseSource::Pulses(&pulses), &params).unwrap();
        let jitter_sound = measure_jitter(PulseSource::Sound(&sound), &params).unwrap();
        assert_eq!(jitter_handle, jitter_sound);
    }

    #[test]
    fn formant_statistics_serialize_to_24_flat_keys() {
        let sound = sine(220.0, 0.3, 16000.0);
        let params = VoiceParams::default();
        let formants =
            measure_formant_statistics(FormantSource::Sound(&sound), &params).unwrap();

        let json = serde_json::to_value(&formants).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 24);
        for n in 1..=4 {
            for stat in ["mean", "std", "min", "max", "median", "bandwidth_median"] {
                assert!(object.contains_key(&format!("F{n}_{stat}")));
            }
        }
    }

    #[test]
    fn sine_pitch_values_carry_the_hz_suffix() {
        let sound = sine(220.0, 0.5, 16000.0);
        let measures = measure_pitch(PitchSource::Sound(&sound), &VoiceParams::default()).unwrap();
        let mean = measures.mean.expect("voiced");
        assert!(mean.ends_with(" Hz"), "{mean}");
        let value: f64 = mean.trim_end_matches(" Hz").parse().unwrap();
        assert!((value - 220.0).abs() < 5.0, "mean pitch {value}");
    }
}
