//! Fundamental-frequency statistics over the voiced portion of the clip.
//!
//! pYIN classifies each frame voiced or unvoiced; unvoiced frames carry no
//! pitch. All five outputs are the sentinel when nothing is voiced, which is
//! the expected, non-error outcome for silence or pure noise.

use anyhow::Result;
use aus::analysis;

use super::{schedule, stats, StageInput};
use crate::types::FeatureMap;

/// Search band in Hz, musical notes C2 through C7. Speech F0 lives well
/// inside this range; the headroom keeps expressive voices trackable.
const F0_MIN_HZ: f64 = 65.406;
const F0_MAX_HZ: f64 = 2093.005;
/// Samples per pYIN analysis frame.
const FRAME_LENGTH: usize = 2048;

pub(super) fn features(input: &StageInput) -> Result<FeatureMap> {
    let clip = input.clip;
    if clip.samples.len() < FRAME_LENGTH {
        // Not enough signal for a single analysis frame: no voiced frames.
        return Ok(summarize(&[]));
    }

    let audio: Vec<f64> = clip.samples.iter().map(|&s| s as f64).collect();
    let (_timestamps, pitches, voiced, _confidence) = analysis::pyin_pitch_estimator(
        &audio,
        clip.sample_rate,
        F0_MIN_HZ,
        F0_MAX_HZ,
        FRAME_LENGTH,
    );

    let voiced_f0: Vec<f64> = pitches
        .iter()
        .zip(voiced.iter())
        .filter_map(|(&f0, &flag)| (flag && f0.is_finite() && f0 > 0.0).then_some(f0))
        .collect();
    Ok(summarize(&voiced_f0))
}

fn summarize(voiced_f0: &[f64]) -> FeatureMap {
    let mut map = FeatureMap::new();
    if voiced_f0.is_empty() {
        for key in schedule::PITCH_KEYS {
            map.insert(key.to_string(), f64::NAN);
        }
        return map;
    }
    let min = stats::min(voiced_f0);
    let max = stats::max(voiced_f0);
    map.insert("pitch_mean".to_string(), stats::mean(voiced_f0));
    map.insert("pitch_std".to_string(), stats::std_dev(voiced_f0));
    map.insert("pitch_min".to_string(), min);
    map.insert("pitch_max".to_string(), max);
    map.insert("pitch_range".to_string(), max - min);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_voiced_frames_means_all_sentinels() {
        let map = summarize(&[]);
        assert_eq!(map.len(), schedule::PITCH_KEYS.len());
        assert!(map.values().all(|v| v.is_nan()));
    }

    #[test]
    fn aggregates_over_voiced_frames() {
        let map = summarize(&[100.0, 110.0, 120.0]);
        assert_eq!(map["pitch_mean"], 110.0);
        assert_eq!(map["pitch_min"], 100.0);
        assert_eq!(map["pitch_max"], 120.0);
        assert_eq!(map["pitch_range"], 20.0);
        assert!(map["pitch_std"] > 0.0);
    }
}
