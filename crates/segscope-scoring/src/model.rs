//! Model capability interfaces
//!
//! A model is anything that can predict a class for every sample of a
//! [`SampleSet`]. Probability output is a separate, optional capability:
//! callers ask for it through [`Model::as_probabilistic`] and must handle its
//! absence.

use std::fmt;

use segscope_dataset::sample::SampleSet;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ModelError {
    #[display("model returned {actual} predictions for {expected} samples")]
    PredictionCount { expected: usize, actual: usize },
    #[display("probability row {row} has {actual} entries but the model has {expected} classes")]
    ProbabilityWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[display("probability row {row} holds {value}, which is not a probability")]
    InvalidProbability { row: usize, value: f64 },
    #[display("sample position {position} has no precomputed prediction (only {len} available)")]
    PositionOutOfRange { position: usize, len: usize },
}

/// Checks that every row has one finite entry in `[0, 1]` per class.
pub fn check_probability_rows(
    probabilities: &[Vec<f64>],
    num_classes: usize,
) -> Result<(), ModelError> {
    for (row, proba) in probabilities.iter().enumerate() {
        if proba.len() != num_classes {
            return Err(ModelError::ProbabilityWidth {
                row,
                expected: num_classes,
                actual: proba.len(),
            });
        }
        if let Some(&value) = proba.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(ModelError::InvalidProbability { row, value });
        }
    }
    Ok(())
}

/// Required model capability: class predictions.
pub trait Model: fmt::Debug {
    /// Classes known to the model, in the column order of probability output.
    fn classes(&self) -> &[String];

    /// Predicts one class per sample, in row order.
    fn predict(&self, samples: &SampleSet) -> Result<Vec<String>, ModelError>;

    /// Returns the probability capability, if the model has one.
    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticModel> {
        None
    }
}

/// Optional model capability: class probabilities.
pub trait ProbabilisticModel: Model {
    /// Predicts one probability row per sample; row `i` has one entry per
    /// element of [`Model::classes`].
    fn predict_proba(&self, samples: &SampleSet) -> Result<Vec<Vec<f64>>, ModelError>;
}

/// Model adapter over predictions computed ahead of time.
///
/// Predictions are aligned with the original dataset, so the adapter answers
/// for any sampled subset by looking up each sample's original position.
#[derive(Debug, Clone)]
pub struct PrecomputedModel {
    classes: Vec<String>,
    predictions: Vec<String>,
    probabilities: Option<Vec<Vec<f64>>>,
}

impl PrecomputedModel {
    /// Creates an adapter without probability output.
    #[must_use]
    pub fn new(classes: Vec<String>, predictions: Vec<String>) -> Self {
        Self {
            classes,
            predictions,
            probabilities: None,
        }
    }

    /// Adds probability output.
    ///
    /// # Errors
    ///
    /// Fails if the number of rows differs from the number of predictions, a
    /// row's width differs from the number of classes, or an entry is not a
    /// finite value in `[0, 1]`.
    pub fn with_probabilities(mut self, probabilities: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        if probabilities.len() != self.predictions.len() {
            return Err(ModelError::PredictionCount {
                expected: self.predictions.len(),
                actual: probabilities.len(),
            });
        }
        check_probability_rows(&probabilities, self.classes.len())?;
        self.probabilities = Some(probabilities);
        Ok(self)
    }

    fn lookup<'a, T>(values: &'a [T], samples: &SampleSet) -> Result<Vec<&'a T>, ModelError> {
        samples
            .positions()
            .iter()
            .map(|&position| {
                values.get(position).ok_or(ModelError::PositionOutOfRange {
                    position,
                    len: values.len(),
                })
            })
            .collect()
    }
}

impl Model for PrecomputedModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, samples: &SampleSet) -> Result<Vec<String>, ModelError> {
        Ok(Self::lookup(&self.predictions, samples)?
            .into_iter()
            .cloned()
            .collect())
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticModel> {
        self.probabilities.is_some().then_some(self as &dyn ProbabilisticModel)
    }
}

impl ProbabilisticModel for PrecomputedModel {
    fn predict_proba(&self, samples: &SampleSet) -> Result<Vec<Vec<f64>>, ModelError> {
        let probabilities = self.probabilities.as_deref().unwrap_or_default();
        Ok(Self::lookup(probabilities, samples)?
            .into_iter()
            .cloned()
            .collect())
    }
}
