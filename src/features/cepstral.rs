//! Mel-frequency cepstral coefficients: rSTFT, power spectrogram, mel
//! filterbank, then the cosine transform, with per-coefficient mean and
//! standard deviation across frames.

use anyhow::Result;
use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;
use ndarray::{Array2, Axis};

use super::{frames, schedule, stats, StageInput};
use crate::types::FeatureMap;

const MFCC_COUNT: usize = 13;
const MEL_BANDS: usize = 128;
/// Filterbank floor; keeps the lowest filters off the DC bin.
const MEL_MIN_FREQ: f64 = 20.0;

pub(super) fn features(input: &StageInput) -> Result<FeatureMap> {
    let clip = input.clip;
    if clip.samples.len() < frames::FRAME_LENGTH {
        return Ok(sentinel_map());
    }

    let audio: Vec<f64> = clip.samples.iter().map(|&s| s as f64).collect();
    let stft = spectrum::rstft(
        &audio,
        frames::FRAME_LENGTH,
        frames::HOP_LENGTH,
        WindowType::Hanning,
    );
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);

    let freqs = spectrum::rfftfreq(frames::FRAME_LENGTH, clip.sample_rate);
    let filterbank = MelFilterbank::new(
        MEL_MIN_FREQ,
        clip.sample_rate as f64 / 2.0,
        MEL_BANDS,
        &freqs,
        true,
    );
    let mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);
    let mfcc = analysis::mel::mfcc_spectrogram(&mel, MFCC_COUNT, None);

    Ok(aggregate(&mfcc))
}

/// Per-coefficient mean/std across frames (rows are frames).
fn aggregate(mfcc: &[Vec<f64>]) -> FeatureMap {
    let matrix = matrix_from_frames(mfcc);
    if matrix.len_of(Axis(0)) == 0 || matrix.len_of(Axis(1)) < MFCC_COUNT {
        return sentinel_map();
    }

    let mut map = FeatureMap::new();
    for coeff in 0..MFCC_COUNT {
        let series: Vec<f64> = matrix.index_axis(Axis(1), coeff).iter().copied().collect();
        map.insert(format!("mfcc{}_mean", coeff + 1), stats::mean(&series));
        map.insert(format!("mfcc{}_std", coeff + 1), stats::std_dev(&series));
    }
    map
}

fn matrix_from_frames(data: &[Vec<f64>]) -> Array2<f64> {
    if data.is_empty() {
        return Array2::zeros((0, 0));
    }
    let rows = data.len();
    let cols = data[0].len();
    let mut flat = Vec::with_capacity(rows * cols);
    for row in data {
        flat.extend(row.iter().copied());
    }
    Array2::from_shape_vec((rows, cols), flat).expect("rectangular cepstral frames")
}

fn sentinel_map() -> FeatureMap {
    schedule::CEPSTRAL_KEYS
        .iter()
        .map(|key| (key.to_string(), f64::NAN))
        .collect()
}
