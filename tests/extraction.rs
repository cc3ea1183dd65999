use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::TempDir;
use vocalyzer::features::schedule::{vectorize, FEATURE_SCHEDULE, PITCH_KEYS};
use vocalyzer::features::FeatureExtractor;
use vocalyzer::types::FeatureMap;

const SAMPLE_RATE: u32 = 22_050;

#[test]
fn sine_tone_yields_a_full_schedule_and_accurate_pitch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, &sine(220.0, 1.2));

    let features = FeatureExtractor::new().extract(&path).expect("extraction");
    assert_eq!(features.len(), FEATURE_SCHEDULE.len());

    let vector = vectorize(&features);
    assert_eq!(vector.len(), FEATURE_SCHEDULE.len());

    let pitch_mean = features["pitch_mean"];
    assert!(
        (pitch_mean - 220.0).abs() < 220.0 * 0.05,
        "pitch_mean should land within 5% of the tone, got {pitch_mean}"
    );
    assert!(
        features["pitch_std"] < 220.0 * 0.05,
        "a steady tone should have near-zero pitch spread, got {}",
        features["pitch_std"]
    );

    // A loud periodic signal is energetic and strongly harmonic.
    assert!(features["rms_mean"] > 0.1);
    assert!(features["hnr_mean"].is_finite());
    assert!(features["spec_centroid_mean"] > 0.0);
}

#[test]
fn silence_degenerates_pitch_but_not_energy() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("silence.wav");
    write_wav(&path, &vec![0.0; SAMPLE_RATE as usize]);

    let features = FeatureExtractor::new().extract(&path).expect("extraction");

    for key in PITCH_KEYS {
        assert!(features[*key].is_nan(), "{key} should be the sentinel");
    }
    assert_eq!(features["rms_mean"], 0.0);
    assert_eq!(features["rms_std"], 0.0);
    assert_eq!(features["rms_max"], 0.0);

    // The vector stays structurally intact for degenerate audio.
    assert_eq!(vectorize(&features).len(), FEATURE_SCHEDULE.len());
}

#[test]
fn extraction_is_deterministic_for_an_unchanged_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("speechy.wav");
    // A tone with a little amplitude modulation, closer to speech than a
    // bare sine.
    let samples: Vec<f32> = sine(180.0, 1.0)
        .iter()
        .enumerate()
        .map(|(i, s)| s * (0.6 + 0.4 * (i as f32 / 2_000.0).sin()))
        .collect();
    write_wav(&path, &samples);

    let extractor = FeatureExtractor::new();
    let first = extractor.extract(&path).expect("first run");
    let second = extractor.extract(&path).expect("second run");

    assert_maps_identical(&first, &second);
    assert_eq!(vectorize(&first), vectorize(&second));
}

#[test]
fn decode_failures_abort_while_stage_failures_do_not() {
    let err = FeatureExtractor::new().extract(Path::new("missing.wav"));
    assert!(err.is_err(), "a vanished input must fail the request");
}

fn assert_maps_identical(lhs: &FeatureMap, rhs: &FeatureMap) {
    assert_eq!(lhs.len(), rhs.len());
    for (key, a) in lhs {
        let b = rhs[key];
        assert!(
            (a.is_nan() && b.is_nan()) || *a == b,
            "{key} differs between runs: {a} vs {b}"
        );
    }
}

fn sine(freq: f32, seconds: f32) -> Vec<f32> {
    let total = (SAMPLE_RATE as f32 * seconds) as usize;
    (0..total)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * freq * t).sin() * 0.5
        })
        .collect()
}

fn write_wav(path: &Path, samples: &[f32]) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("create wav");
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}
