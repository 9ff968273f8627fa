//! Composite voice report.
//!
//! [`get_voice_report`] runs every measurement category exactly once
//! over a single audio source. The sound is decoded once and each
//! derived handle (pitch contour, pulse train, intensity, harmonicity,
//! spectrum, formant tracks) is computed once and shared, so the report
//! equals what the standalone measurement functions produce while doing
//! the expensive analyses only one time each.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::measures::{
    self, FormantMeasures, FormantSource, HarmonicityMeasures, HarmonicitySource,
    IntensityMeasures, IntensitySource, JitterMeasures, PitchMeasures, PitchSource, PulseMeasures,
    PulseSource, ShimmerMeasures, ShimmerSource, SpectralShapeMeasures, SpectrumSource,
    VoiceParams, VoicingMeasures, VoicingSource,
};
use crate::sound::Sound;

/// Input for [`get_voice_report`].
#[derive(Debug, Clone, Copy)]
pub enum ReportSource<'a> {
    /// Decode this file and analyze it.
    Path(&'a Path),
    /// Analyze an already-decoded sound.
    Sound(&'a Sound),
}

/// One report per audio source: every measurement category keyed by its
/// display name. Serializes to the nested mapping shape, e.g.
/// `{"Pitch": {"mean": "142.537 Hz", ...}, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceReport {
    #[serde(rename = "Pitch")]
    pub pitch: PitchMeasures,
    #[serde(rename = "Pulses")]
    pub pulses: PulseMeasures,
    #[serde(rename = "Voicing")]
    pub voicing: VoicingMeasures,
    #[serde(rename = "Jitter")]
    pub jitter: JitterMeasures,
    #[serde(rename = "Shimmer")]
    pub shimmer: ShimmerMeasures,
    #[serde(rename = "Intensity")]
    pub intensity: IntensityMeasures,
    #[serde(rename = "Harmonicity")]
    pub harmonicity: HarmonicityMeasures,
    #[serde(rename = "Spectral Shape")]
    pub spectral_shape: SpectralShapeMeasures,
    #[serde(rename = "Formants")]
    pub formants: FormantMeasures,
}

/// Build the full voice report for one audio source.
///
/// # Failure policy
///
/// The report is all-or-nothing: if any category fails, the whole call
/// fails with that category's error. Every category reads the same
/// decoded signal, so a failure is practically always a decode or
/// parameter problem that would poison every slot anyway; no category is
/// ever silently omitted and no partial report is returned.
///
/// # Determinism
///
/// The same source and parameters always produce a byte-identical
/// serialized report.
pub fn get_voice_report(source: ReportSource<'_>, params: &VoiceParams) -> Result<VoiceReport> {
    params.validate()?;

    let owned;
    let sound = match source {
        ReportSource::Sound(s) => s,
        ReportSource::Path(path) => {
            owned = Sound::from_file(path)?;
            &owned
        }
    };

    log::debug!("building voice report for {}", sound);

    // One pass per derived handle, shared across the categories below.
    let pitch = sound.to_pitch_ac(0.0, params.pitch_floor, params.pitch_ceiling);
    let pulses = sound.to_point_process_cc(&pitch);
    let intensity = sound.to_intensity(params.pitch_floor, params.time_step);
    let harmonicity = sound.to_harmonicity_ac(
        params.time_step,
        params.pitch_floor,
        measures::HARMONICITY_SILENCE_THRESHOLD,
        measures::HARMONICITY_PERIODS_PER_WINDOW,
    );
    let spectrum = sound.to_spectrum(true);
    let formant = sound.to_formant_burg(
        0.0,
        params.max_formants,
        params.max_formant_hz,
        measures::FORMANT_WINDOW_LENGTH,
        measures::PRE_EMPHASIS_FROM,
    );

    Ok(VoiceReport {
        pitch: measures::measure_pitch(PitchSource::Pitch(&pitch), params)?,
        pulses: measures::measure_pulses(PulseSource::Pulses(&pulses), params)?,
        voicing: measures::measure_voicing(VoicingSource::PitchPulses(&pitch, &pulses), params)?,
        jitter: measures::measure_jitter(PulseSource::Pulses(&pulses), params)?,
        shimmer: measures::measure_shimmer(ShimmerSource::SoundPulses(sound, &pulses), params)?,
        intensity: measures::measure_intensity(IntensitySource::Intensity(&intensity), params)?,
        harmonicity: measures::measure_harmonicity(
            HarmonicitySource::Harmonicity(&harmonicity),
            params,
        )?,
        spectral_shape: measures::measure_spectral_shape(
            SpectrumSource::Spectrum(&spectrum),
            params,
        )?,
        formants: measures::measure_formant_statistics(FormantSource::Formant(&formant), params)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_fails_fast_on_a_missing_file() {
        let path = Path::new("nowhere/voice.wav");
        let err = get_voice_report(ReportSource::Path(path), &VoiceParams::default());
        assert!(err.is_err());
    }

    #[test]
    fn report_fails_fast_on_invalid_parameters() {
        let sound = Sound::from_slice(&vec![0.0; 1600], 16000.0);
        let params = VoiceParams {
            time_step: -1.0,
            ..VoiceParams::default()
        };
        assert!(get_voice_report(ReportSource::Sound(&sound), &params).is_err());
    }
}
