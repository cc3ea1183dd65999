//! Feature-extraction stages and the pipeline facade.
//!
//! Eight independent stages each own a disjoint set of schedule keys. The
//! executor isolates them: a stage error is logged and downgraded to sentinel
//! values for exactly that stage's keys, so one misbehaving analysis can
//! never abort the rest of the extraction. Only decoding the input file is
//! allowed to fail the request as a whole.

pub mod cepstral;
pub mod energy;
pub mod harmonicity;
pub mod pitch;
pub mod rhythm;
pub mod schedule;
pub mod spectral;

pub(crate) mod frames;
pub(crate) mod stats;

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::audio::loader::{self, DecodeError};
use crate::types::{AudioClip, FeatureMap};

/// Input handed to every stage: the decoded clip plus the path of the source
/// file, for the one stage that analyzes the raw file itself.
pub struct StageInput<'a> {
    pub clip: &'a AudioClip,
    pub path: &'a Path,
}

struct Stage {
    name: &'static str,
    keys: &'static [&'static str],
    run: fn(&StageInput<'_>) -> Result<FeatureMap>,
}

const STAGES: &[Stage] = &[
    Stage {
        name: "pitch",
        keys: schedule::PITCH_KEYS,
        run: pitch::features,
    },
    Stage {
        name: "energy",
        keys: schedule::ENERGY_KEYS,
        run: energy::features,
    },
    Stage {
        name: "cepstral",
        keys: schedule::CEPSTRAL_KEYS,
        run: cepstral::features,
    },
    Stage {
        name: "spectral_centroid",
        keys: schedule::CENTROID_KEYS,
        run: spectral::centroid_features,
    },
    Stage {
        name: "spectral_bandwidth",
        keys: schedule::BANDWIDTH_KEYS,
        run: spectral::bandwidth_features,
    },
    Stage {
        name: "zcr",
        keys: schedule::ZCR_KEYS,
        run: spectral::zcr_features,
    },
    Stage {
        name: "rhythm",
        keys: schedule::RHYTHM_KEYS,
        run: rhythm::features,
    },
    Stage {
        name: "harmonicity",
        keys: schedule::HARMONICITY_KEYS,
        run: harmonicity::features,
    },
];

/// Runs the full analysis for one audio file.
#[derive(Debug, Default)]
pub struct FeatureExtractor {}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `path` and run every stage over the result.
    ///
    /// Only decoding can fail. Each stage's internal errors are absorbed into
    /// sentinel values for that stage's keys.
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<FeatureMap, DecodeError> {
        let path = path.as_ref();
        let clip = loader::load_audio(path)?;
        info!(
            samples = clip.samples.len(),
            sample_rate = clip.sample_rate,
            "decoded input audio"
        );
        Ok(self.extract_from_clip(&clip, path))
    }

    /// Run the stages over an already-decoded clip. Total: always yields a
    /// map covering every stage's keys.
    pub fn extract_from_clip(&self, clip: &AudioClip, path: &Path) -> FeatureMap {
        let input = StageInput { clip, path };
        let mut map = FeatureMap::new();
        for stage in STAGES {
            match (stage.run)(&input) {
                Ok(values) => {
                    debug!(stage = stage.name, count = values.len(), "stage complete");
                    map.extend(values);
                }
                Err(err) => {
                    warn!(stage = stage.name, error = %err, "stage failed; emitting sentinels");
                    map.extend(stage.keys.iter().map(|key| (key.to_string(), f64::NAN)));
                }
            }
        }
        map
    }
}
