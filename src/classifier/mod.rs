//! The trained-classifier collaborator.
//!
//! The pipeline treats the classifier as an opaque artifact: it consumes one
//! ordered feature vector matching the schedule and returns one label.
//! Prediction is strictly single-vector-in, single-label-out; batching is
//! deliberately not part of the contract.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::features::schedule::{FEATURE_SCHEDULE, SCHEDULE_VERSION};

/// One prediction over one schedule-ordered vector.
pub trait Classifier {
    fn predict(&self, vector: &[f64]) -> Result<String, ModelError>;
}

#[derive(Debug)]
pub enum ModelError {
    /// The artifact file does not exist or cannot be read.
    Missing(std::io::Error),
    /// The artifact exists but cannot be parsed or is internally
    /// inconsistent.
    Invalid(String),
    /// The artifact was derived against a different feature schedule.
    ScheduleMismatch { expected: u32, found: u32 },
    /// The input vector does not have the schedule's length.
    BadInput { expected: usize, found: usize },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Missing(err) => write!(f, "could not load the model: {err}"),
            ModelError::Invalid(detail) => write!(f, "invalid model artifact: {detail}"),
            ModelError::ScheduleMismatch { expected, found } => write!(
                f,
                "model was trained against schedule version {found}, expected {expected}"
            ),
            ModelError::BadInput { expected, found } => write!(
                f,
                "feature vector has {found} entries, the schedule requires {expected}"
            ),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Missing(err) => Some(err),
            _ => None,
        }
    }
}

/// Linear one-vs-rest model with a feature standardizer, loaded from a JSON
/// artifact exported at training time.
///
/// Sentinel (`NaN`) vector entries become 0.0 after standardization, i.e.
/// they are imputed as the training-set mean for that feature. This keeps
/// prediction total for degenerate audio.
#[derive(Debug, Deserialize)]
pub struct LinearModel {
    schedule_version: u32,
    feature_names: Vec<String>,
    classes: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl LinearModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let file = File::open(path.as_ref()).map_err(ModelError::Missing)?;
        let model: LinearModel =
            serde_json::from_reader(file).map_err(|err| ModelError::Invalid(err.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.schedule_version != SCHEDULE_VERSION {
            return Err(ModelError::ScheduleMismatch {
                expected: SCHEDULE_VERSION,
                found: self.schedule_version,
            });
        }
        if self.feature_names.len() != FEATURE_SCHEDULE.len()
            || self
                .feature_names
                .iter()
                .zip(FEATURE_SCHEDULE.iter())
                .any(|(name, expected)| name != expected)
        {
            return Err(ModelError::Invalid(
                "artifact feature names do not match the schedule".to_string(),
            ));
        }

        let features = FEATURE_SCHEDULE.len();
        let classes = self.classes.len();
        if classes == 0
            || self.means.len() != features
            || self.scales.len() != features
            || self.intercepts.len() != classes
            || self.coefficients.len() != classes
            || self.coefficients.iter().any(|row| row.len() != features)
        {
            return Err(ModelError::Invalid(
                "artifact weight shapes are inconsistent".to_string(),
            ));
        }
        Ok(())
    }

    fn standardize(&self, vector: &[f64]) -> Vec<f64> {
        vector
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                if value.is_nan() {
                    0.0
                } else {
                    let scale = if self.scales[i].abs() > f64::EPSILON {
                        self.scales[i]
                    } else {
                        1.0
                    };
                    (value - self.means[i]) / scale
                }
            })
            .collect()
    }
}

impl Classifier for LinearModel {
    fn predict(&self, vector: &[f64]) -> Result<String, ModelError> {
        if vector.len() != FEATURE_SCHEDULE.len() {
            return Err(ModelError::BadInput {
                expected: FEATURE_SCHEDULE.len(),
                found: vector.len(),
            });
        }

        let standardized = self.standardize(vector);
        let mut best_index = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (index, (row, intercept)) in self
            .coefficients
            .iter()
            .zip(self.intercepts.iter())
            .enumerate()
        {
            let score: f64 = row
                .iter()
                .zip(standardized.iter())
                .map(|(weight, x)| weight * x)
                .sum::<f64>()
                + intercept;
            if score > best_score {
                best_score = score;
                best_index = index;
            }
        }
        Ok(self.classes[best_index].clone())
    }
}
