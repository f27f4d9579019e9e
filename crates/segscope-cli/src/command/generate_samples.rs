use std::path::PathBuf;

use anyhow::Context;
use rand::Rng;
use rand_distr::Normal;
use segscope_dataset::{
    seed::{RngStream, Seed},
    task::{Label, TaskType},
};

use crate::{
    schema::{
        predictions::PredictionsFile,
        samples::{ColumnFile, SampleSetFile},
    },
    util::Output,
};

const CLASSES: [&str; 2] = ["no", "yes"];
const CATEGORIES: [&str; 2] = ["A", "B"];
const REGIONS: [&str; 4] = ["north", "south", "east", "west"];
const MISSING_RATE: f64 = 0.02;
/// Confidence in the true class inside and outside the weak segment.
const WEAK_CONFIDENCE: f64 = 0.35;
const STRONG_CONFIDENCE: f64 = 0.85;
const CONFIDENCE_NOISE: f64 = 0.05;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct GenerateSamplesArg {
    /// Number of samples to generate
    #[arg(long, default_value_t = 1000)]
    rows: usize,
    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Output file path for matching model predictions
    #[arg(long)]
    predictions_output: Option<PathBuf>,
}

/// One synthetic row.
///
/// The model is weak where `category == "B"` and `numeric > 5`.
#[derive(Debug, Clone)]
struct Row {
    category: &'static str,
    numeric: Option<f64>,
    noise: f64,
    region: &'static str,
    label: usize,
    confidence: f64,
}

impl Row {
    fn generate<R>(rng: &mut R, noise: Normal<f64>) -> Self
    where
        R: Rng + ?Sized,
    {
        let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
        let value = rng.random_range(0.0..10.0);
        let numeric = (!rng.random_bool(MISSING_RATE)).then_some(value);
        let weak = category == "B" && value > 5.0;
        let base = if weak { WEAK_CONFIDENCE } else { STRONG_CONFIDENCE };
        Self {
            category,
            numeric,
            noise: rng.sample(noise),
            region: REGIONS[rng.random_range(0..REGIONS.len())],
            label: usize::from(rng.random_bool(0.5)),
            confidence: (base + rng.sample(noise) * CONFIDENCE_NOISE).clamp(0.01, 0.99),
        }
    }

    fn probabilities(&self) -> Vec<f64> {
        let mut probabilities = vec![1.0 - self.confidence; CLASSES.len()];
        probabilities[self.label] = self.confidence;
        probabilities
    }

    fn predicted(&self) -> &'static str {
        if self.confidence >= 0.5 {
            CLASSES[self.label]
        } else {
            CLASSES[1 - self.label]
        }
    }
}

pub(crate) fn run(arg: &GenerateSamplesArg) -> anyhow::Result<()> {
    let GenerateSamplesArg {
        rows,
        seed,
        output,
        predictions_output,
    } = arg;

    eprintln!("Generating {rows} samples (seed {seed})...");
    let mut rng = Seed(*seed).rng(RngStream::Synthetic);
    let noise = Normal::new(0.0, 1.0).context("Invalid noise distribution")?;
    let rows = (0..*rows)
        .map(|_| Row::generate(&mut rng, noise))
        .collect::<Vec<_>>();
    let num_weak = rows.iter().filter(|r| r.confidence < 0.5).count();
    eprintln!("  Mispredicted samples: {num_weak}");

    let samples = SampleSetFile {
        task_type: TaskType::Classification,
        labels: Some(rows.iter().map(|r| Label::from(CLASSES[r.label])).collect()),
        texts: None,
        features: vec![
            ColumnFile::Categorical {
                name: "category".to_owned(),
                values: rows.iter().map(|r| Some(r.category.to_owned())).collect(),
            },
            ColumnFile::Numerical {
                name: "numeric".to_owned(),
                values: rows.iter().map(|r| r.numeric).collect(),
            },
            ColumnFile::Numerical {
                name: "noise".to_owned(),
                values: rows.iter().map(|r| Some(r.noise)).collect(),
            },
        ],
        properties: vec![],
        metadata: vec![ColumnFile::Categorical {
            name: "region".to_owned(),
            values: rows.iter().map(|r| Some(r.region.to_owned())).collect(),
        }],
    };
    Output::save_json(&samples, output.clone())?;
    if let Some(path) = output {
        eprintln!("Samples saved to {}", path.display());
    }

    if let Some(path) = predictions_output {
        let predictions = PredictionsFile {
            classes: CLASSES.map(str::to_owned).to_vec(),
            predictions: rows.iter().map(|r| r.predicted().to_owned()).collect(),
            probabilities: Some(rows.iter().map(Row::probabilities).collect()),
        };
        Output::save_json(&predictions, Some(path.clone()))?;
        eprintln!("Predictions saved to {}", path.display());
    }
    Ok(())
}
