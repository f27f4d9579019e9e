//! Alternative segment metrics
//!
//! By default a segment is judged by the mean of its per-sample scores. A
//! [`Metric`] replaces that aggregate with a classification metric computed
//! over the segment's predictions.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::model::ModelError;

/// Smallest probability used when taking a logarithm.
pub const PROBABILITY_EPSILON: f64 = 1e-15;

/// Natural log of a probability, clipped away from 0 and 1.
#[must_use]
pub fn clipped_ln(probability: f64) -> f64 {
    probability
        .clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
        .ln()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy,
    NegLogLoss,
    F1Macro,
}

impl Metric {
    pub const ALL: [Self; 3] = [Self::Accuracy, Self::NegLogLoss, Self::F1Macro];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::NegLogLoss => "neg_log_loss",
            Self::F1Macro => "f1_macro",
        }
    }

    /// Evaluates the metric on `rows` of `predictions`.
    ///
    /// Higher is better for every metric. Returns `NaN` for an empty row set.
    #[must_use]
    pub fn evaluate(self, predictions: &PredictionSet, rows: &[usize]) -> f64 {
        if rows.is_empty() {
            return f64::NAN;
        }
        match self {
            Self::Accuracy => accuracy(predictions, rows),
            Self::NegLogLoss => neg_log_loss(predictions, rows),
            Self::F1Macro => f1_macro(predictions, rows),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("unknown metric '{name}' (expected one of: accuracy, neg_log_loss, f1_macro)")]
pub struct ParseMetricError {
    #[error(not(source))]
    name: String,
}

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ParseMetricError { name: s.to_owned() })
    }
}

/// Model output for a sample set, expressed as class indices.
#[derive(Debug, Clone)]
pub struct PredictionSet {
    num_classes: usize,
    true_class: Vec<usize>,
    predicted_class: Vec<usize>,
    probabilities: Vec<Vec<f64>>,
}

impl PredictionSet {
    /// All vectors are row-aligned; class indices must be below `num_classes`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PredictionCount`] when the predictions or
    /// probabilities do not have one row per true class.
    pub fn new(
        num_classes: usize,
        true_class: Vec<usize>,
        predicted_class: Vec<usize>,
        probabilities: Vec<Vec<f64>>,
    ) -> Result<Self, ModelError> {
        for actual in [predicted_class.len(), probabilities.len()] {
            if actual != true_class.len() {
                return Err(ModelError::PredictionCount {
                    expected: true_class.len(),
                    actual,
                });
            }
        }
        Ok(Self {
            num_classes,
            true_class,
            predicted_class,
            probabilities,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.true_class.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.true_class.is_empty()
    }

    /// Probability the model assigned to the true class of `row`.
    #[must_use]
    pub fn true_class_probability(&self, row: usize) -> f64 {
        self.probabilities[row][self.true_class[row]]
    }
}

#[expect(clippy::cast_precision_loss)]
fn accuracy(predictions: &PredictionSet, rows: &[usize]) -> f64 {
    let correct = rows
        .iter()
        .filter(|&&r| predictions.true_class[r] == predictions.predicted_class[r])
        .count();
    correct as f64 / rows.len() as f64
}

#[expect(clippy::cast_precision_loss)]
fn neg_log_loss(predictions: &PredictionSet, rows: &[usize]) -> f64 {
    let sum = rows
        .iter()
        .map(|&r| clipped_ln(predictions.true_class_probability(r)))
        .sum::<f64>();
    sum / rows.len() as f64
}

/// Unweighted mean of per-class F1 over the classes present in either the
/// true or the predicted labels of `rows`.
#[expect(clippy::cast_precision_loss)]
fn f1_macro(predictions: &PredictionSet, rows: &[usize]) -> f64 {
    let mut tp = vec![0_usize; predictions.num_classes];
    let mut fp = vec![0_usize; predictions.num_classes];
    let mut fn_ = vec![0_usize; predictions.num_classes];
    for &r in rows {
        let (truth, pred) = (predictions.true_class[r], predictions.predicted_class[r]);
        if truth == pred {
            tp[truth] += 1;
        } else {
            fp[pred] += 1;
            fn_[truth] += 1;
        }
    }
    let per_class = (0..predictions.num_classes)
        .filter(|&c| tp[c] + fp[c] + fn_[c] > 0)
        .map(|c| (2 * tp[c]) as f64 / (2 * tp[c] + fp[c] + fn_[c]) as f64)
        .collect::<Vec<_>>();
    per_class.iter().sum::<f64>() / per_class.len() as f64
}
