//! Spectral-shape measures: centroid and bandwidth over the short-time
//! spectrum, zero-crossing rate over the waveform. Three independent stages
//! that share only their aggregation shape (mean and standard deviation).

use anyhow::Result;
use aus::spectrum;
use aus::WindowType;

use super::{frames, schedule, stats, StageInput};
use crate::types::{AudioClip, FeatureMap};

pub(super) fn centroid_features(input: &StageInput) -> Result<FeatureMap> {
    let Some((magnitude, freqs)) = magnitude_spectrogram(input.clip) else {
        return Ok(sentinel_map(schedule::CENTROID_KEYS));
    };
    let centroids: Vec<f64> = magnitude
        .iter()
        .map(|frame| centroid(frame, &freqs))
        .collect();
    Ok(mean_std_map("spec_centroid", &centroids))
}

pub(super) fn bandwidth_features(input: &StageInput) -> Result<FeatureMap> {
    let Some((magnitude, freqs)) = magnitude_spectrogram(input.clip) else {
        return Ok(sentinel_map(schedule::BANDWIDTH_KEYS));
    };
    let bandwidths: Vec<f64> = magnitude
        .iter()
        .map(|frame| bandwidth(frame, &freqs))
        .collect();
    Ok(mean_std_map("spec_bandwidth", &bandwidths))
}

pub(super) fn zcr_features(input: &StageInput) -> Result<FeatureMap> {
    let rates: Vec<f64> =
        frames::frame_signal(&input.clip.samples, frames::FRAME_LENGTH, frames::HOP_LENGTH)
            .iter()
            .map(|frame| zero_crossing_rate(frame))
            .collect();
    Ok(mean_std_map("zcr", &rates))
}

/// Magnitude spectrogram (frames by bins) with per-bin center frequencies,
/// or None when the clip is shorter than one analysis frame.
fn magnitude_spectrogram(clip: &AudioClip) -> Option<(Vec<Vec<f64>>, Vec<f64>)> {
    if clip.samples.len() < frames::FRAME_LENGTH {
        return None;
    }
    let audio: Vec<f64> = clip.samples.iter().map(|&s| s as f64).collect();
    let stft = spectrum::rstft(
        &audio,
        frames::FRAME_LENGTH,
        frames::HOP_LENGTH,
        WindowType::Hanning,
    );
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let freqs = spectrum::rfftfreq(frames::FRAME_LENGTH, clip.sample_rate);
    Some((magnitude, freqs))
}

/// Magnitude-weighted mean frequency. A silent frame contributes 0.0.
fn centroid(frame: &[f64], freqs: &[f64]) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (&mag, &freq) in frame.iter().zip(freqs.iter()) {
        weighted += freq * mag;
        total += mag;
    }
    if total > 1e-10 {
        weighted / total
    } else {
        0.0
    }
}

/// Magnitude-weighted standard deviation around the frame's centroid.
fn bandwidth(frame: &[f64], freqs: &[f64]) -> f64 {
    let center = centroid(frame, freqs);
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (&mag, &freq) in frame.iter().zip(freqs.iter()) {
        weighted += mag * (freq - center).powi(2);
        total += mag;
    }
    if total > 1e-10 {
        (weighted / total).sqrt()
    } else {
        0.0
    }
}

/// Fraction of sample intervals that cross zero.
fn zero_crossing_rate(frame: &[f32]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f64 / (frame.len() - 1) as f64
}

fn mean_std_map(prefix: &str, values: &[f64]) -> FeatureMap {
    let mut map = FeatureMap::new();
    map.insert(format!("{prefix}_mean"), stats::mean(values));
    map.insert(format!("{prefix}_std"), stats::std_dev(values));
    map
}

fn sentinel_map(keys: &[&str]) -> FeatureMap {
    keys.iter().map(|key| (key.to_string(), f64::NAN)).collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn centroid_of_a_single_active_bin_is_its_frequency() {
        let freqs = [0.0, 100.0, 200.0, 300.0];
        let frame = [0.0, 0.0, 2.0, 0.0];
        assert_abs_diff_eq!(centroid(&frame, &freqs), 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bandwidth(&frame, &freqs), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn bandwidth_spreads_with_the_spectrum() {
        let freqs = [0.0, 100.0, 200.0, 300.0];
        let frame = [0.0, 1.0, 0.0, 1.0];
        assert_abs_diff_eq!(centroid(&frame, &freqs), 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bandwidth(&frame, &freqs), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn silent_frame_measures_zero() {
        let freqs = [0.0, 100.0];
        let frame = [0.0, 0.0];
        assert_eq!(centroid(&frame, &freqs), 0.0);
        assert_eq!(bandwidth(&frame, &freqs), 0.0);
    }

    #[test]
    fn alternating_signal_crosses_every_interval() {
        let frame = [1.0f32, -1.0, 1.0, -1.0];
        assert_eq!(zero_crossing_rate(&frame), 1.0);
    }

    #[test]
    fn constant_signal_never_crosses() {
        let frame = [0.3f32; 64];
        assert_eq!(zero_crossing_rate(&frame), 0.0);
    }
}
