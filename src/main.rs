use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vocalyzer::classifier::{Classifier, LinearModel};
use vocalyzer::config::{AppConfig, MAX_INPUT_BYTES};
use vocalyzer::features::schedule::{vectorize, FEATURE_SCHEDULE};
use vocalyzer::features::FeatureExtractor;

/// Vocalyzer - speech acoustic feature extraction
///
/// Decodes a speech recording, extracts its acoustic feature vector (pitch,
/// energy, spectral shape, rhythm, harmonicity) and, when a classifier
/// artifact is available, prints the predicted label.
#[derive(Parser, Debug)]
#[command(name = "vocalyzer")]
#[command(version = "0.1.0")]
#[command(about = "Speech feature extraction and emotion prediction", long_about = None)]
struct Args {
    /// Input speech recording (.wav)
    #[arg(value_name = "INPUT")]
    input_file: PathBuf,

    /// Path to a serialized classifier artifact (JSON)
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// Print the named feature map and skip prediction
    #[arg(long)]
    features_only: bool,
}

impl Args {
    /// Validate CLI arguments
    fn validate(&self) -> Result<()> {
        if !self.input_file.exists() {
            anyhow::bail!("Input file does not exist: {:?}", self.input_file);
        }
        if !self.input_file.is_file() {
            anyhow::bail!("Input path is not a file: {:?}", self.input_file);
        }
        let is_wav = self
            .input_file
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if !is_wav {
            anyhow::bail!("Only .wav files are accepted: {:?}", self.input_file);
        }
        let size = std::fs::metadata(&self.input_file)
            .with_context(|| format!("Failed to stat input file {:?}", self.input_file))?
            .len();
        if size > MAX_INPUT_BYTES {
            anyhow::bail!(
                "File too large: {} bytes exceeds the {} byte limit",
                size,
                MAX_INPUT_BYTES
            );
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    args.validate()
        .context("Failed to validate command-line arguments")?;

    let extractor = FeatureExtractor::new();
    let features = extractor
        .extract(&args.input_file)
        .with_context(|| format!("Could not read audio at {:?}", args.input_file))?;
    let vector = vectorize(&features);
    info!(features = vector.len(), "extraction complete");

    if args.features_only {
        println!("{}", serde_json::to_string_pretty(&features)?);
        return Ok(());
    }

    let config = AppConfig::from_override(args.model.clone())?;
    match config.model_path {
        Some(path) => {
            let model = LinearModel::load(&path)
                .with_context(|| format!("Could not load the model at {:?}", path))?;
            let label = model.predict(&vector)?;
            println!("{}", serde_json::json!({ "prediction": label }));
        }
        None => {
            // No artifact around: emit the schedule-ordered vector so a
            // downstream consumer can run its own model over it.
            let named: Vec<(&str, f64)> = FEATURE_SCHEDULE
                .iter()
                .copied()
                .zip(vector.iter().copied())
                .collect();
            println!("{}", serde_json::to_string_pretty(&named)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Args;

    #[test]
    fn rejects_missing_input() {
        let args = Args {
            input_file: "no/such/file.wav".into(),
            model: None,
            features_only: false,
        };
        let err = args.validate().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
