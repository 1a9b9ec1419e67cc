use crate::features::FEATURE_COLUMNS;
use crate::model::PhishingModel;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

/// Fixed seed for the 80/20 split so reported accuracy is reproducible.
pub const SPLIT_SEED: u64 = 42;
const TEST_FRACTION: f64 = 0.2;
const LEARNING_RATE: f64 = 0.01;
const EPOCHS: usize = 200;

/// Labeled rows loaded from the training CSV. Labels are 0.0 (phishing)
/// or 1.0 (benign).
#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub accuracy: f64,
    pub train_examples: usize,
    pub test_examples: usize,
}

/// Parse the training CSV: a header row with a `class` label column and
/// feature columns matching the schema exactly, then integer-valued rows.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read dataset: {}", path.as_ref().display()))?;
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());

    let header: Vec<&str> = lines
        .next()
        .context("dataset is empty")?
        .split(',')
        .map(str::trim)
        .collect();

    let class_idx = header
        .iter()
        .position(|&c| c == "class")
        .context("dataset has no 'class' column")?;

    let feature_names: Vec<String> = header
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != class_idx)
        .map(|(_, &c)| c.to_string())
        .collect();

    if feature_names.len() != FEATURE_COLUMNS.len()
        || feature_names
            .iter()
            .any(|n| !FEATURE_COLUMNS.contains(&n.as_str()))
    {
        anyhow::bail!(
            "dataset feature columns do not match the {}-column schema",
            FEATURE_COLUMNS.len()
        );
    }

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        if cells.len() != header.len() {
            anyhow::bail!(
                "row {}: expected {} cells, got {}",
                line_no + 2,
                header.len(),
                cells.len()
            );
        }

        let mut row = Vec::with_capacity(feature_names.len());
        for (i, cell) in cells.iter().enumerate() {
            let value: f64 = cell
                .parse()
                .with_context(|| format!("row {}: bad value '{cell}'", line_no + 2))?;
            if i == class_idx {
                // Original dataset labels phishing as a non-positive class value
                labels.push(if value > 0.0 { 1.0 } else { 0.0 });
            } else {
                row.push(value);
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        anyhow::bail!("dataset has no data rows");
    }

    log::info!(
        "loaded {} rows x {} features from {}",
        rows.len(),
        feature_names.len(),
        path.as_ref().display()
    );

    Ok(Dataset {
        feature_names,
        rows,
        labels,
    })
}

/// Shuffle with the given seed and split 80/20 into (train, test) index sets.
pub fn split_indices(len: usize, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((len as f64) * TEST_FRACTION).floor() as usize;
    let test = indices.split_off(len - test_len);
    (indices, test)
}

/// Fit logistic regression by gradient descent with the fixed default
/// hyperparameters. No cross-validation, no hyperparameter search.
pub fn fit(feature_names: Vec<String>, rows: &[Vec<f64>], labels: &[f64]) -> PhishingModel {
    let mut model = PhishingModel::initial(feature_names);

    for epoch in 0..EPOCHS {
        let mut total_error = 0.0;
        for (row, &label) in rows.iter().zip(labels.iter()) {
            let prediction = model.score(row);
            let error = prediction - label;
            total_error += error.abs();

            for (w, &x) in model.weights.iter_mut().zip(row.iter()) {
                *w -= LEARNING_RATE * error * x;
            }
            model.bias -= LEARNING_RATE * error;
        }

        if epoch % 50 == 0 {
            log::debug!(
                "epoch {epoch}: mean abs error {:.4}",
                total_error / rows.len().max(1) as f64
            );
        }
    }

    model.training_examples = rows.len();
    model
}

/// Fraction of rows the model labels correctly.
pub fn evaluate(model: &PhishingModel, rows: &[Vec<f64>], labels: &[f64]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let correct = rows
        .iter()
        .zip(labels.iter())
        .filter(|&(row, &label)| f64::from(model.predict_label(row)) == label)
        .count();
    correct as f64 / rows.len() as f64
}

/// Full training run: load, split, fit, report held-out accuracy, persist.
pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(dataset_path: P, output_path: Q) -> Result<TrainingReport> {
    let dataset = load_dataset(dataset_path)?;
    let (train_idx, test_idx) = split_indices(dataset.rows.len(), SPLIT_SEED);

    let select = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
        (
            idx.iter().map(|&i| dataset.rows[i].clone()).collect(),
            idx.iter().map(|&i| dataset.labels[i]).collect(),
        )
    };
    let (train_rows, train_labels) = select(&train_idx);
    let (test_rows, test_labels) = select(&test_idx);

    log::info!(
        "training on {} rows, holding out {}",
        train_rows.len(),
        test_rows.len()
    );

    let model = fit(dataset.feature_names.clone(), &train_rows, &train_labels);
    let accuracy = evaluate(&model, &test_rows, &test_labels);
    log::info!("held-out accuracy: {accuracy:.4}");

    model.save(output_path)?;

    Ok(TrainingReport {
        accuracy,
        train_examples: train_rows.len(),
        test_examples: test_rows.len(),
    })
}
