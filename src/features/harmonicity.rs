//! Harmonics-to-noise ratio from a cross-correlation harmonicity analysis.
//!
//! Unlike the other stages this one analyzes the raw file, decoding it
//! independently of the shared buffer. Whatever goes wrong here, including a
//! failed re-read, stays contained to the hnr_* outputs: the executor turns
//! this stage's errors into sentinels without touching the rest.

use anyhow::{ensure, Context, Result};

use super::{stats, StageInput};
use crate::audio::loader;
use crate::types::FeatureMap;

/// Praat-convention analysis geometry: a 75 Hz pitch floor, 4.5 pitch
/// periods per window, 10 ms steps.
const PITCH_FLOOR_HZ: f64 = 75.0;
const PITCH_CEILING_HZ: f64 = 600.0;
const PERIODS_PER_WINDOW: f64 = 4.5;
const STEP_SECONDS: f64 = 0.01;

pub(super) fn features(input: &StageInput) -> Result<FeatureMap> {
    let clip = loader::load_audio(input.path)
        .context("re-reading the source file for harmonicity analysis")?;
    let contour = harmonicity_contour(&clip.samples, clip.sample_rate)?;

    // Silent and aperiodic frames come back infinite; only finite frame
    // values carry information.
    let finite: Vec<f64> = contour.into_iter().filter(|v| v.is_finite()).collect();

    let mut map = FeatureMap::new();
    if finite.is_empty() {
        map.insert("hnr_mean".to_string(), f64::NAN);
        map.insert("hnr_std".to_string(), f64::NAN);
    } else {
        map.insert("hnr_mean".to_string(), stats::mean(&finite));
        map.insert("hnr_std".to_string(), stats::std_dev(&finite));
    }
    Ok(map)
}

/// Per-frame HNR in dB from the normalized autocorrelation peak inside the
/// voice pitch band.
fn harmonicity_contour(samples: &[f32], sample_rate: u32) -> Result<Vec<f64>> {
    ensure!(sample_rate > 0, "sample rate must be positive");
    let rate = sample_rate as f64;
    let window = (PERIODS_PER_WINDOW / PITCH_FLOOR_HZ * rate) as usize;
    let step = ((STEP_SECONDS * rate) as usize).max(1);
    let min_lag = ((rate / PITCH_CEILING_HZ) as usize).max(1);
    let max_lag = (rate / PITCH_FLOOR_HZ).ceil() as usize;
    ensure!(
        window > max_lag,
        "analysis window shorter than the longest pitch period"
    );

    let mut contour = Vec::new();
    let mut start = 0;
    while start + window <= samples.len() {
        contour.push(frame_hnr(&samples[start..start + window], min_lag, max_lag));
        start += step;
    }
    Ok(contour)
}

fn frame_hnr(frame: &[f32], min_lag: usize, max_lag: usize) -> f64 {
    let mean = frame.iter().map(|&s| s as f64).sum::<f64>() / frame.len() as f64;
    let centered: Vec<f64> = frame.iter().map(|&s| s as f64 - mean).collect();
    let energy: f64 = centered.iter().map(|v| v * v).sum();
    if energy <= f64::EPSILON {
        // Silent frame: no harmonic content at all.
        return f64::NEG_INFINITY;
    }

    let mut best = 0.0f64;
    for lag in min_lag..=max_lag.min(centered.len() - 1) {
        let mut correlation = 0.0;
        for i in 0..centered.len() - lag {
            correlation += centered[i] * centered[i + lag];
        }
        best = best.max(correlation / energy);
    }

    if best <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if best >= 1.0 {
        return f64::INFINITY;
    }
    10.0 * (best / (1.0 - best)).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: u32, seconds: f64) -> Vec<f32> {
        let total = (sample_rate as f64 * seconds) as usize;
        (0..total)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                ((2.0 * std::f64::consts::PI * freq * t).sin() * 0.5) as f32
            })
            .collect()
    }

    #[test]
    fn periodic_signal_scores_high() {
        let samples = sine(150.0, 22_050, 0.5);
        let contour = harmonicity_contour(&samples, 22_050).unwrap();
        let finite: Vec<f64> = contour.into_iter().filter(|v| v.is_finite()).collect();
        assert!(!finite.is_empty());
        assert!(
            stats::mean(&finite) > 5.0,
            "pure tone should be strongly harmonic, got {}",
            stats::mean(&finite)
        );
    }

    #[test]
    fn silence_has_no_finite_frames() {
        let samples = vec![0.0f32; 22_050];
        let contour = harmonicity_contour(&samples, 22_050).unwrap();
        assert!(contour.iter().all(|v| !v.is_finite()));
    }

    #[test]
    fn clip_shorter_than_a_window_yields_an_empty_contour() {
        let contour = harmonicity_contour(&[0.1, -0.1, 0.1], 22_050).unwrap();
        assert!(contour.is_empty());
    }

    #[test]
    fn zero_sample_rate_is_an_error() {
        assert!(harmonicity_contour(&[0.0; 100], 0).is_err());
    }
}
