use crate::error::PhishguardError;
use crate::features::UrlFeatures;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Classifier output, already mapped from the raw binary label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Phishing,
    Safe,
}

/// Logistic-regression classifier over the URL feature schema.
///
/// `feature_names` records the column order the model was trained with;
/// inference reorders its input to match, so a schema drift surfaces as an
/// error instead of silently misaligned weights. Written once by the
/// trainer, loaded read-only by the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhishingModel {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub bias: f64,
    pub training_examples: usize,
    pub version: u32,
}

impl PhishingModel {
    /// Zero-weight model over the given columns (pre-training state).
    pub fn initial(feature_names: Vec<String>) -> Self {
        let n = feature_names.len();
        Self {
            feature_names,
            weights: vec![0.0; n],
            bias: 0.0,
            training_examples: 0,
            version: 1,
        }
    }

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    /// Probability of the benign class for an already-ordered row.
    pub fn score(&self, row: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(row.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        Self::sigmoid(z)
    }

    /// Binary label for an ordered row: 0 = phishing, 1 = benign.
    pub fn predict_label(&self, row: &[f64]) -> u8 {
        u8::from(self.score(row) > 0.5)
    }

    /// Classify a feature vector, reordering its columns to the
    /// training-time order first.
    pub fn predict(&self, features: &UrlFeatures) -> Result<Verdict, PhishguardError> {
        let row = features.ordered(&self.feature_names)?;
        match self.predict_label(&row) {
            0 => Ok(Verdict::Phishing),
            _ => Ok(Verdict::Safe),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("failed to open model: {}", path.as_ref().display()))?;
        let model: PhishingModel = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse model: {}", path.as_ref().display()))?;

        if model.weights.len() != model.feature_names.len() {
            anyhow::bail!(
                "corrupt model: {} weights for {} feature columns",
                model.weights.len(),
                model.feature_names.len()
            );
        }

        log::info!(
            "loaded model v{} ({} features, {} training examples)",
            model.version,
            model.feature_names.len(),
            model.training_examples
        );
        Ok(model)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("failed to create model file: {}", path.as_ref().display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .context("failed to serialize model")?;
        log::info!("saved model to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_COLUMNS;

    fn schema() -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sigmoid_range() {
        assert!((PhishingModel::sigmoid(0.0) - 0.5).abs() < 1e-9);
        assert!(PhishingModel::sigmoid(20.0) > 0.99);
        assert!(PhishingModel::sigmoid(-20.0) < 0.01);
    }

    #[test]
    fn test_initial_model_is_neutral_and_benign() {
        let model = PhishingModel::initial(schema());
        let row = vec![1.0; FEATURE_COLUMNS.len()];
        assert!((model.score(&row) - 0.5).abs() < 1e-9);
        // 0.5 is not > 0.5, so the untrained model labels phishing
        assert_eq!(model.predict_label(&row), 0);
    }

    #[test]
    fn test_biased_model_labels() {
        let mut model = PhishingModel::initial(schema());
        model.bias = 5.0;
        assert_eq!(model.predict_label(&vec![0.0; FEATURE_COLUMNS.len()]), 1);
        model.bias = -5.0;
        assert_eq!(model.predict_label(&vec![0.0; FEATURE_COLUMNS.len()]), 0);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut model = PhishingModel::initial(schema());
        model.bias = -1.25;
        model.weights[8] = 0.5; // HTTPS column
        model.training_examples = 42;
        model.version = 3;

        let path = std::env::temp_dir().join("phishguard_model_roundtrip.json");
        model.save(&path).unwrap();
        let loaded = PhishingModel::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.version, 3);
        assert_eq!(loaded.training_examples, 42);
        assert_eq!(loaded.feature_names, model.feature_names);
        assert!((loaded.bias - model.bias).abs() < 1e-12);
        assert!((loaded.weights[8] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_load_rejects_weight_mismatch() {
        let path = std::env::temp_dir().join("phishguard_model_corrupt.json");
        std::fs::write(
            &path,
            r#"{"feature_names":["A","B"],"weights":[0.1],"bias":0.0,"training_examples":0,"version":1}"#,
        )
        .unwrap();
        let result = PhishingModel::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
