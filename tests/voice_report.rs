//! End-to-end tests for the measurement functions and the voice report,
//! driven by synthesized WAV fixtures.

use std::path::Path;

use vocalysis::{
    get_voice_report, measure_formant_statistics, measure_harmonicity, measure_intensity,
    measure_jitter, measure_pitch, measure_pulses, measure_shimmer, measure_spectral_shape,
    measure_voicing, FormantSource, HarmonicitySource, IntensitySource, PitchSource, PulseSource,
    ReportSource, ShimmerSource, Sound, SpectrumSource, VoiceParams, VoicingSource,
};

const SAMPLE_RATE: u32 = 16000;

/// One second of a 220 Hz sine at 0.9 amplitude.
fn sine_samples() -> Vec<f64> {
    (0..SAMPLE_RATE)
        .map(|i| 0.9 * (2.0 * std::f64::consts::PI * 220.0 * i as f64 / SAMPLE_RATE as f64).sin())
        .collect()
}

/// One second of a 125 Hz tone with ten 1/k-weighted harmonics.
///
/// 125 Hz divides the sample rate exactly, so every cycle is sampled
/// identically and the perturbation measures should sit near zero.
fn voiced_samples() -> Vec<f64> {
    let norm: f64 = (1..=10).map(|k| 1.0 / k as f64).sum();
    (0..SAMPLE_RATE)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            let sum: f64 = (1..=10)
                .map(|k| (2.0 * std::f64::consts::PI * 125.0 * k as f64 * t).sin() / k as f64)
                .sum();
            0.9 * sum / norm
        })
        .collect()
}

fn write_wav(path: &Path, samples: &[f64], channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for &s in samples {
        writer
            .write_sample((s * i16::MAX as f64) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

fn parse(value: &Option<String>, suffix: &str) -> f64 {
    let s = value.as_deref().expect("value present");
    assert!(s.ends_with(suffix), "{s:?} should end with {suffix:?}");
    s[..s.len() - suffix.len()].trim().parse().expect("numeric prefix")
}

#[test]
fn report_covers_every_category_with_correct_units() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voiced.wav");
    write_wav(&path, &voiced_samples(), 1);

    let report =
        get_voice_report(ReportSource::Path(&path), &VoiceParams::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    let object = json.as_object().unwrap();

    let categories = [
        "Pitch",
        "Pulses",
        "Voicing",
        "Jitter",
        "Shimmer",
        "Intensity",
        "Harmonicity",
        "Spectral Shape",
        "Formants",
    ];
    assert_eq!(object.len(), categories.len());
    for category in categories {
        assert!(object.contains_key(category), "missing {category}");
    }

    // Every formatted value carries its unit; the absolute jitter is the
    // one deliberately bare value.
    for (category, entry) in object {
        for (key, value) in entry.as_object().unwrap() {
            if let Some(s) = value.as_str() {
                let ok = s.ends_with(" Hz")
                    || s.ends_with(" dB")
                    || s.ends_with(" seconds")
                    || s.ends_with('%')
                    || (key == "jitter_local_absolute" && s.parse::<f64>().is_ok());
                assert!(ok, "{category}.{key} = {s:?} has no recognized unit");
            }
        }
    }
}

#[test]
fn key_sets_do_not_depend_on_the_input() {
    let dir = tempfile::tempdir().unwrap();
    let voiced_path = dir.path().join("voiced.wav");
    let silent_path = dir.path().join("silent.wav");
    write_wav(&voiced_path, &voiced_samples(), 1);
    write_wav(&silent_path, &vec![0.0; SAMPLE_RATE as usize], 1);

    let params = VoiceParams::default();
    let voiced = get_voice_report(ReportSource::Path(&voiced_path), &params).unwrap();
    let silent = get_voice_report(ReportSource::Path(&silent_path), &params).unwrap();

    let voiced_json = serde_json::to_value(&voiced).unwrap();
    let silent_json = serde_json::to_value(&silent).unwrap();
    for (category, entry) in voiced_json.as_object().unwrap() {
        let voiced_keys: Vec<&String> = entry.as_object().unwrap().keys().collect();
        let silent_keys: Vec<&String> =
            silent_json[category].as_object().unwrap().keys().collect();
        assert_eq!(voiced_keys, silent_keys, "key set differs for {category}");
    }
}

#[test]
fn aggregation_matches_the_standalone_functions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voiced.wav");
    write_wav(&path, &voiced_samples(), 1);

    let params = VoiceParams::default();
    let report = get_voice_report(ReportSource::Path(&path), &params).unwrap();

    assert_eq!(
        report.pitch,
        measure_pitch(PitchSource::Path(&path), &params).unwrap()
    );
    assert_eq!(
        report.jitter,
        measure_jitter(PulseSource::Path(&path), &params).unwrap()
    );
    assert_eq!(
        report.voicing,
        measure_voicing(VoicingSource::Path(&path), &params).unwrap()
    );
    assert_eq!(
        report.intensity,
        measure_intensity(IntensitySource::Path(&path), &params).unwrap()
    );
    assert_eq!(
        report.formants,
        measure_formant_statistics(FormantSource::Path(&path), &params).unwrap()
    );
}

#[test]
fn reports_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voiced.wav");
    write_wav(&path, &voiced_samples(), 1);

    let params = VoiceParams::default();
    let first = get_voice_report(ReportSource::Path(&path), &params).unwrap();
    let second = get_voice_report(ReportSource::Path(&path), &params).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn voiced_tone_measurements_are_plausible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voiced.wav");
    write_wav(&path, &voiced_samples(), 1);

    let params = VoiceParams::default();
    let report = get_voice_report(ReportSource::Path(&path), &params).unwrap();

    let mean_pitch = parse(&report.pitch.mean, " Hz");
    assert!((mean_pitch - 125.0).abs() < 5.0, "mean pitch {mean_pitch}");

    assert!(report.pulses.num_pulses > 80, "{}", report.pulses.num_pulses);
    assert_eq!(report.pulses.num_periods, report.pulses.num_pulses - 1);
    let mean_period = parse(&report.pulses.mean_period, " seconds");
    assert!((mean_period - 0.008).abs() < 2e-4, "mean period {mean_period}");

    let unvoiced = parse(&report.voicing.unvoiced_fraction, "%");
    assert!(unvoiced < 25.0, "unvoiced fraction {unvoiced}%");
    assert_eq!(report.voicing.num_voice_breaks, 0);
    assert_eq!(report.voicing.degree_voice_breaks.as_deref(), Some("0.000%"));

    // Identically sampled cycles: perturbation is essentially zero.
    let jitter_local = parse(&report.jitter.jitter_local, "%");
    assert!(jitter_local < 0.5, "jitter {jitter_local}%");
    let shimmer_local = parse(&report.shimmer.shimmer_local, "%");
    assert!(shimmer_local < 2.0, "shimmer {shimmer_local}%");

    let mean_intensity = parse(&report.intensity.intensity_mean, " dB");
    assert!(
        (70.0..100.0).contains(&mean_intensity),
        "mean intensity {mean_intensity} dB"
    );

    let mean_hnr = parse(&report.harmonicity.hnr_mean, " dB");
    assert!(mean_hnr > 10.0, "mean HNR {mean_hnr} dB");

    let cog = parse(&report.spectral_shape.center_of_gravity, " Hz");
    assert!((100.0..2000.0).contains(&cog), "centroid {cog} Hz");

    // Formant statistics exist for the first track and carry Hz units.
    let f1_mean = parse(&report.formants.tracks[0].mean, " Hz");
    assert!(f1_mean > 50.0, "F1 mean {f1_mean} Hz");
}

#[test]
fn sine_pitch_statistics_sit_at_the_tone_frequency() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sine.wav");
    write_wav(&path, &sine_samples(), 1);

    let params = VoiceParams::default();
    let pitch = measure_pitch(PitchSource::Path(&path), &params).unwrap();
    for field in [&pitch.median, &pitch.mean, &pitch.min, &pitch.max] {
        let value = parse(field, " Hz");
        assert!((value - 220.0).abs() < 5.0, "pitch stat {value} Hz");
    }
    let std = parse(&pitch.std, " Hz");
    assert!(std < 5.0, "pitch std {std} Hz");
}

#[test]
fn silent_clip_yields_nulls_and_full_unvoicing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("silent.wav");
    write_wav(&path, &vec![0.0; SAMPLE_RATE as usize], 1);

    let params = VoiceParams::default();
    let report = get_voice_report(ReportSource::Path(&path), &params).unwrap();

    assert_eq!(
        report.voicing.unvoiced_fraction.as_deref(),
        Some("100.000%")
    );
    assert_eq!(report.pulses.num_pulses, 0);
    assert_eq!(report.pulses.num_periods, 0);
    assert_eq!(report.pulses.mean_period, None);
    assert_eq!(report.pulses.std_period, None);

    assert_eq!(report.pitch.mean, None);
    assert_eq!(report.jitter.jitter_local, None);
    assert_eq!(report.shimmer.shimmer_local, None);
    assert_eq!(report.intensity.intensity_mean, None);
    assert_eq!(report.harmonicity.hnr_mean, None);
    assert_eq!(report.spectral_shape.center_of_gravity, None);
    assert_eq!(report.formants.tracks[0].mean, None);
}

#[test]
fn a_nonexistent_path_is_an_error_for_every_measurement() {
    let path = Path::new("no/such/fixture.wav");
    let params = VoiceParams::default();

    assert!(measure_pitch(PitchSource::Path(path), &params).is_err());
    assert!(measure_pulses(PulseSource::Path(path), &params).is_err());
    assert!(measure_voicing(VoicingSource::Path(path), &params).is_err());
    assert!(measure_jitter(PulseSource::Path(path), &params).is_err());
    assert!(measure_shimmer(ShimmerSource::Path(path), &params).is_err());
    assert!(measure_intensity(IntensitySource::Path(path), &params).is_err());
    assert!(measure_harmonicity(HarmonicitySource::Path(path), &params).is_err());
    assert!(measure_spectral_shape(SpectrumSource::Path(path), &params).is_err());
    assert!(measure_formant_statistics(FormantSource::Path(path), &params).is_err());
    assert!(get_voice_report(ReportSource::Path(path), &params).is_err());
}

#[test]
fn stereo_files_require_an_explicit_channel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    // Interleave two copies of the same tone.
    let mono = voiced_samples();
    let interleaved: Vec<f64> = mono.iter().flat_map(|&s| [s, s]).collect();
    write_wav(&path, &interleaved, 2);

    assert!(matches!(
        Sound::from_file(&path),
        Err(vocalysis::Error::NotMono(2))
    ));

    let sound = Sound::from_file_channel(&path, 0).unwrap();
    assert_eq!(sound.n_samples(), mono.len());
    assert!(Sound::from_file_channel(&path, 2).is_err());
}
