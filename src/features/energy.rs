//! Short-time RMS energy over the whole signal, voiced and unvoiced alike.

use anyhow::Result;

use super::{frames, stats, StageInput};
use crate::types::FeatureMap;

pub(super) fn features(input: &StageInput) -> Result<FeatureMap> {
    let per_frame: Vec<f64> =
        frames::frame_signal(&input.clip.samples, frames::FRAME_LENGTH, frames::HOP_LENGTH)
            .iter()
            .map(|frame| rms(frame))
            .collect();

    let mut map = FeatureMap::new();
    map.insert("rms_mean".to_string(), stats::mean(&per_frame));
    map.insert("rms_std".to_string(), stats::std_dev(&per_frame));
    map.insert("rms_max".to_string(), stats::max(&per_frame));
    Ok(map)
}

fn rms(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f64 = frame.iter().map(|&s| s as f64 * s as f64).sum();
    (sum / frame.len() as f64).sqrt()
}
