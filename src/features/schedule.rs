//! Canonical feature ordering shared with the trained classifier.
//!
//! The schedule is the wire contract between extraction and any classifier
//! artifact: 44 names in a fixed order. Reordering or resizing it invalidates
//! every artifact trained against it, so the schedule carries a version that
//! artifacts must echo back at load time.

use crate::types::FeatureMap;

/// Bumped whenever [`FEATURE_SCHEDULE`] changes in content or order.
pub const SCHEDULE_VERSION: u32 = 1;

/// Keys owned by the pitch stage.
pub const PITCH_KEYS: &[&str] = &[
    "pitch_mean",
    "pitch_std",
    "pitch_min",
    "pitch_max",
    "pitch_range",
];

/// Keys owned by the energy stage.
pub const ENERGY_KEYS: &[&str] = &["rms_mean", "rms_std", "rms_max"];

/// Keys owned by the cepstral stage, one mean/std pair per coefficient.
pub const CEPSTRAL_KEYS: &[&str] = &[
    "mfcc1_mean",
    "mfcc1_std",
    "mfcc2_mean",
    "mfcc2_std",
    "mfcc3_mean",
    "mfcc3_std",
    "mfcc4_mean",
    "mfcc4_std",
    "mfcc5_mean",
    "mfcc5_std",
    "mfcc6_mean",
    "mfcc6_std",
    "mfcc7_mean",
    "mfcc7_std",
    "mfcc8_mean",
    "mfcc8_std",
    "mfcc9_mean",
    "mfcc9_std",
    "mfcc10_mean",
    "mfcc10_std",
    "mfcc11_mean",
    "mfcc11_std",
    "mfcc12_mean",
    "mfcc12_std",
    "mfcc13_mean",
    "mfcc13_std",
];

/// Keys owned by the spectral-centroid stage.
pub const CENTROID_KEYS: &[&str] = &["spec_centroid_mean", "spec_centroid_std"];

/// Keys owned by the spectral-bandwidth stage.
pub const BANDWIDTH_KEYS: &[&str] = &["spec_bandwidth_mean", "spec_bandwidth_std"];

/// Keys owned by the zero-crossing-rate stage.
pub const ZCR_KEYS: &[&str] = &["zcr_mean", "zcr_std"];

/// Keys owned by the rhythm stage.
pub const RHYTHM_KEYS: &[&str] = &["tempo_bpm", "onset_rate_per_s"];

/// Keys owned by the harmonicity stage.
pub const HARMONICITY_KEYS: &[&str] = &["hnr_mean", "hnr_std"];

/// The full ordered schedule. Index i of every produced vector corresponds
/// to `FEATURE_SCHEDULE[i]`.
pub const FEATURE_SCHEDULE: [&str; 44] = [
    "pitch_mean",
    "pitch_std",
    "pitch_min",
    "pitch_max",
    "pitch_range",
    "rms_mean",
    "rms_std",
    "rms_max",
    "mfcc1_mean",
    "mfcc1_std",
    "mfcc2_mean",
    "mfcc2_std",
    "mfcc3_mean",
    "mfcc3_std",
    "mfcc4_mean",
    "mfcc4_std",
    "mfcc5_mean",
    "mfcc5_std",
    "mfcc6_mean",
    "mfcc6_std",
    "mfcc7_mean",
    "mfcc7_std",
    "mfcc8_mean",
    "mfcc8_std",
    "mfcc9_mean",
    "mfcc9_std",
    "mfcc10_mean",
    "mfcc10_std",
    "mfcc11_mean",
    "mfcc11_std",
    "mfcc12_mean",
    "mfcc12_std",
    "mfcc13_mean",
    "mfcc13_std",
    "spec_centroid_mean",
    "spec_centroid_std",
    "spec_bandwidth_mean",
    "spec_bandwidth_std",
    "zcr_mean",
    "zcr_std",
    "tempo_bpm",
    "onset_rate_per_s",
    "hnr_mean",
    "hnr_std",
];

/// Project `map` onto the schedule. Total: every absent name (a single
/// missing measurement or a whole stage that never ran) becomes `f64::NAN`,
/// and the result always has exactly the schedule's length.
pub fn vectorize(map: &FeatureMap) -> Vec<f64> {
    FEATURE_SCHEDULE
        .iter()
        .map(|name| map.get(*name).copied().unwrap_or(f64::NAN))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_key_groups() -> Vec<&'static [&'static str]> {
        vec![
            PITCH_KEYS,
            ENERGY_KEYS,
            CEPSTRAL_KEYS,
            CENTROID_KEYS,
            BANDWIDTH_KEYS,
            ZCR_KEYS,
            RHYTHM_KEYS,
            HARMONICITY_KEYS,
        ]
    }

    #[test]
    fn stage_keys_concatenate_to_the_schedule() {
        let concatenated: Vec<&str> = stage_key_groups().into_iter().flatten().copied().collect();
        assert_eq!(concatenated, FEATURE_SCHEDULE.to_vec());
    }

    #[test]
    fn vectorize_is_total_over_an_empty_map() {
        let vector = vectorize(&FeatureMap::new());
        assert_eq!(vector.len(), FEATURE_SCHEDULE.len());
        assert!(vector.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn vectorize_fills_only_the_missing_stage() {
        let mut map = FeatureMap::new();
        for key in FEATURE_SCHEDULE {
            map.insert(key.to_string(), 1.0);
        }
        for key in CEPSTRAL_KEYS {
            map.remove(*key);
        }

        let vector = vectorize(&map);
        assert_eq!(vector.len(), FEATURE_SCHEDULE.len());
        for (name, value) in FEATURE_SCHEDULE.iter().zip(vector.iter()) {
            if CEPSTRAL_KEYS.contains(name) {
                assert!(value.is_nan(), "{name} should be the sentinel");
            } else {
                assert_eq!(*value, 1.0, "{name} should be untouched");
            }
        }
    }

    #[test]
    fn vector_order_follows_the_schedule() {
        let mut map = FeatureMap::new();
        for (index, key) in FEATURE_SCHEDULE.iter().enumerate() {
            map.insert(key.to_string(), index as f64);
        }
        let vector = vectorize(&map);
        for (index, value) in vector.iter().enumerate() {
            assert_eq!(*value, index as f64);
        }
    }
}
