//! # vocalysis
//!
//! Acoustic voice measurements from audio recordings: pitch, glottal
//! pulses, voicing, jitter, shimmer, intensity, harmonics-to-noise
//! ratio, spectral shape, and formant statistics, individually or
//! aggregated into a single voice report.
//!
//! The crate has two layers:
//!
//! - an **engine layer** of analysis types and conversion functions
//!   ([`Sound`], [`Pitch`], [`PointProcess`], [`Intensity`],
//!   [`Spectrum`], [`Formant`], [`Harmonicity`]) implementing the
//!   classic algorithms (Boersma 1993 autocorrelation pitch tracking,
//!   pulse detection by period walking, Burg-method formant tracking,
//!   spectral moments), with parameter conventions matching Praat
//!   where a counterpart exists;
//! - a **report layer** of measurement functions ([`measure_pitch`],
//!   [`measure_jitter`], [`measure_shimmer`], ...) that accept either a
//!   file path or pre-built engine handles, format every statistic as a
//!   unit-annotated string, and aggregate into a [`VoiceReport`].
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use vocalysis::{get_voice_report, ReportSource, VoiceParams};
//!
//! let params = VoiceParams::default();
//! let report = get_voice_report(
//!     ReportSource::Path(Path::new("speech.wav")),
//!     &params,
//! ).unwrap();
//! println!("{:?}", report.pitch.mean); // e.g. Some("142.537 Hz")
//! ```
//!
//! Sharing one decode across several measurements:
//!
//! ```no_run
//! use vocalysis::{measure_jitter, measure_pitch, PitchSource, PulseSource,
//!                 Sound, VoiceParams};
//!
//! let params = VoiceParams::default();
//! let sound = Sound::from_file("speech.wav").unwrap();
//! let pitch = sound.to_pitch_ac(0.0, params.pitch_floor, params.pitch_ceiling);
//! let pulses = sound.to_point_process_cc(&pitch);
//!
//! let pitch_stats = measure_pitch(PitchSource::Pitch(&pitch), &params).unwrap();
//! let jitter = measure_jitter(PulseSource::Pulses(&pulses), &params).unwrap();
//! ```
//!
//! Every analysis is a pure, synchronous function of its input: no
//! global state, no caching, and identical input always yields a
//! byte-identical formatted result. Handles are plain owned values, so
//! concurrent calls are safe as long as each call uses its own (or a
//! shared, read-only) handle.

pub mod error;
pub mod formant;
pub mod harmonicity;
pub mod intensity;
pub mod measures;
pub mod pitch;
pub mod pulses;
pub mod report;
pub mod sound;
pub mod spectrum;

pub use error::{Error, Result};
pub use formant::{sound_to_formant_burg, Formant, FormantFrame, FormantPoint};
pub use harmonicity::{sound_to_harmonicity_ac, strength_to_hnr, Harmonicity};
pub use intensity::{sound_to_intensity, Intensity};
pub use measures::{
    measure_formant_statistics, measure_harmonicity, measure_intensity, measure_jitter,
    measure_pitch, measure_pulses, measure_shimmer, measure_spectral_shape, measure_voicing,
    FormantMeasures, FormantSource, FormantTrackStats, HarmonicityMeasures, HarmonicitySource,
    IntensityMeasures, IntensitySource, JitterMeasures, PitchMeasures, PitchSource, PulseMeasures,
    PulseSource, ShimmerMeasures, ShimmerSource, SpectralShapeMeasures, SpectrumSource,
    VoiceParams, VoicingMeasures, VoicingSource,
};
pub use pitch::{sound_to_pitch_ac, Pitch, PitchCandidate, PitchFrame};
pub use pulses::{
    jitter_measures, shimmer_measures, sound_to_point_process_cc, Jitter, PerturbationParams,
    PointProcess, Shimmer,
};
pub use report::{get_voice_report, ReportSource, VoiceReport};
pub use sound::Sound;
pub use spectrum::{sound_to_spectrum, Spectrum};
