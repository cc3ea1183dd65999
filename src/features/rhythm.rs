//! Rhythm measures from the onset-strength envelope: a global tempo estimate
//! and the rate of detected onset events per second of audio.
//!
//! Onsets are instants, not a continuous signal; the rate is a scalar
//! summary of how densely sound events start.

use anyhow::Result;
use aus::spectrum;
use aus::WindowType;

use super::{frames, StageInput};
use crate::types::{AudioClip, FeatureMap};

/// Autocorrelation search band for the tempo estimate.
const TEMPO_MIN_BPM: f64 = 30.0;
const TEMPO_MAX_BPM: f64 = 240.0;
/// Fraction of the envelope peak a local maximum must clear to count as an
/// onset event.
const ONSET_PEAK_FRACTION: f64 = 0.1;

pub(super) fn features(input: &StageInput) -> Result<FeatureMap> {
    let clip = input.clip;
    let envelope = onset_envelope(clip);
    let hop_seconds = frames::HOP_LENGTH as f64 / clip.sample_rate.max(1) as f64;

    let mut map = FeatureMap::new();
    map.insert(
        "tempo_bpm".to_string(),
        estimate_tempo(&envelope, hop_seconds),
    );

    let duration = clip.duration_seconds();
    let onset_rate = if duration > 0.0 {
        detect_onsets(&envelope).len() as f64 / duration
    } else {
        f64::NAN
    };
    map.insert("onset_rate_per_s".to_string(), onset_rate);
    Ok(map)
}

/// Positive spectral flux per frame: summed magnitude increase across bins.
fn onset_envelope(clip: &AudioClip) -> Vec<f64> {
    if clip.samples.len() < frames::FRAME_LENGTH {
        return Vec::new();
    }
    let audio: Vec<f64> = clip.samples.iter().map(|&s| s as f64).collect();
    let stft = spectrum::rstft(
        &audio,
        frames::FRAME_LENGTH,
        frames::HOP_LENGTH,
        WindowType::Hanning,
    );
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);

    let bins = magnitude.first().map_or(0, |frame| frame.len());
    let mut previous = vec![0.0f64; bins];
    let mut envelope = Vec::with_capacity(magnitude.len());
    for frame in &magnitude {
        let mut flux = 0.0;
        for (bin, &mag) in frame.iter().enumerate() {
            flux += (mag - previous[bin]).max(0.0);
            previous[bin] = mag;
        }
        envelope.push(flux);
    }
    envelope
}

/// Best autocorrelation lag of the envelope inside the tempo band, converted
/// to BPM. The sentinel when the envelope is too short or carries no energy
/// at any candidate lag.
fn estimate_tempo(envelope: &[f64], hop_seconds: f64) -> f64 {
    if envelope.len() < 3 || hop_seconds <= 0.0 {
        return f64::NAN;
    }
    let min_lag = ((60.0 / TEMPO_MAX_BPM) / hop_seconds).floor().max(1.0) as usize;
    let max_lag = ((60.0 / TEMPO_MIN_BPM) / hop_seconds).ceil() as usize;
    let max_lag = max_lag.min(envelope.len() - 1);

    let mut best: Option<(usize, f64)> = None;
    for lag in min_lag..=max_lag {
        let mut correlation = 0.0;
        for i in 0..envelope.len() - lag {
            correlation += envelope[i] * envelope[i + lag];
        }
        if correlation > 0.0 && best.is_none_or(|(_, c)| correlation > c) {
            best = Some((lag, correlation));
        }
    }

    match best {
        Some((lag, _)) => 60.0 / (lag as f64 * hop_seconds),
        None => f64::NAN,
    }
}

/// Local envelope maxima above a fraction of the global peak.
fn detect_onsets(envelope: &[f64]) -> Vec<usize> {
    let peak = envelope.iter().copied().fold(0.0, f64::max);
    if peak <= 0.0 {
        return Vec::new();
    }
    let threshold = ONSET_PEAK_FRACTION * peak;

    let mut onsets = Vec::new();
    for i in 1..envelope.len().saturating_sub(1) {
        let value = envelope[i];
        if value > threshold && value >= envelope[i - 1] && value > envelope[i + 1] {
            onsets.push(i);
        }
    }
    onsets
}
