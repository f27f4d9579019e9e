//! Per-sample scores and segment aggregation
//!
//! [`PerSampleScorer::score`] resolves the score source for a sample set and
//! returns [`SampleScores`], which the segment search queries for the score of
//! any subset of rows.

use segscope_dataset::{sample::SampleSet, task::TaskType};
use segscope_stats::descriptive::{mean, round_to};

use crate::{
    metric::{Metric, PredictionSet, clipped_ln},
    model::{Model, ModelError, check_probability_rows},
};

/// Decimal places kept in reported average scores.
pub const AVERAGE_SCORE_DECIMALS: i32 = 3;

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ScoreError {
    #[display("either per-sample scores or a model must be supplied")]
    NoScoreSource,
    #[display("weak segment scoring with a model is not supported for {task} tasks")]
    UnsupportedTask { task: TaskType },
    #[display(
        "predicted probabilities not supplied. The weak segment search requires a model with \
         probability output, or precomputed per-sample scores"
    )]
    MissingProbabilities,
    #[display("labels are required to score model predictions")]
    MissingLabels,
    #[display("label '{label}' is not a single class label")]
    NonClassLabel { label: String },
    #[display("label '{label}' is not one of the model classes")]
    UnknownLabel { label: String },
    #[display("predicted class '{class}' is not one of the model classes")]
    UnknownPrediction { class: String },
    #[display("per-sample scores have {len} entries but sample position {position} is required")]
    ScoreOutOfRange { position: usize, len: usize },
    #[display("per-sample score at position {position} is not finite")]
    NonFiniteScore { position: usize },
    #[display("model prediction failed: {_0}")]
    #[from]
    Model(ModelError),
}

/// Scoring strategy for one task type.
///
/// Only classification has a model-based strategy; other task types fail when
/// the strategy is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringTask {
    Classification,
}

impl ScoringTask {
    /// Selects the strategy for `task`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::UnsupportedTask`] for anything but classification.
    pub fn for_task(task: TaskType) -> Result<Self, ScoreError> {
        match task {
            TaskType::Classification => Ok(Self::Classification),
            task => Err(ScoreError::UnsupportedTask { task }),
        }
    }

    /// Runs the model on `samples` and collects its predictions as class indices.
    ///
    /// The probability capability is checked before any prediction is made.
    pub fn predict(
        self,
        samples: &SampleSet,
        model: &dyn Model,
    ) -> Result<PredictionSet, ScoreError> {
        match self {
            Self::Classification => predict_classification(samples, model),
        }
    }
}

fn class_index(classes: &[String], class: &str) -> Option<usize> {
    classes.iter().position(|c| c == class)
}

fn predict_classification(
    samples: &SampleSet,
    model: &dyn Model,
) -> Result<PredictionSet, ScoreError> {
    let probabilistic = model.as_probabilistic().ok_or(ScoreError::MissingProbabilities)?;
    let labels = samples.labels().ok_or(ScoreError::MissingLabels)?;
    let classes = model.classes();

    let true_class = labels
        .iter()
        .map(|label| {
            let class = label.as_class().ok_or_else(|| ScoreError::NonClassLabel {
                label: label.to_string(),
            })?;
            class_index(classes, class).ok_or_else(|| ScoreError::UnknownLabel {
                label: class.to_owned(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let probabilities = probabilistic.predict_proba(samples)?;
    check_count(samples.len(), probabilities.len())?;
    check_probability_rows(&probabilities, classes.len())?;

    let predicted = model.predict(samples)?;
    check_count(samples.len(), predicted.len())?;
    let predicted_class = predicted
        .into_iter()
        .map(|class| class_index(classes, &class).ok_or(ScoreError::UnknownPrediction { class }))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PredictionSet::new(
        classes.len(),
        true_class,
        predicted_class,
        probabilities,
    )?)
}

fn check_count(expected: usize, actual: usize) -> Result<(), ModelError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ModelError::PredictionCount { expected, actual })
    }
}

/// How a subset of rows is turned into one score.
#[derive(Debug, Clone)]
pub enum SegmentScorer {
    /// Mean of the per-sample scores.
    MeanScore,
    /// A classification metric over the subset's predictions.
    Metric {
        metric: Metric,
        predictions: PredictionSet,
    },
}

impl SegmentScorer {
    /// Name reported alongside scores.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::MeanScore => "Average Score Per Sample".to_owned(),
            Self::Metric { metric, .. } => metric.to_string(),
        }
    }
}

/// Per-sample scores of a sample set.
#[derive(Debug, Clone)]
pub struct SampleScores {
    per_sample: Vec<f64>,
    average: f64,
    scorer: SegmentScorer,
}

impl SampleScores {
    /// Scores in row order of the scored sample set.
    #[must_use]
    pub fn per_sample(&self) -> &[f64] {
        &self.per_sample
    }

    /// Score of the whole sample set, rounded to [`AVERAGE_SCORE_DECIMALS`].
    #[must_use]
    pub fn average(&self) -> f64 {
        self.average
    }

    #[must_use]
    pub fn scorer(&self) -> &SegmentScorer {
        &self.scorer
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.per_sample.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.per_sample.is_empty()
    }

    /// Aggregate score of `rows`. `NaN` when `rows` is empty.
    #[must_use]
    pub fn segment_score(&self, rows: &[usize]) -> f64 {
        match &self.scorer {
            SegmentScorer::MeanScore => {
                mean(rows.iter().map(|&r| self.per_sample[r])).unwrap_or(f64::NAN)
            }
            SegmentScorer::Metric {
                metric,
                predictions,
            } => metric.evaluate(predictions, rows),
        }
    }
}

/// Resolves per-sample scores from provided values or a model.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerSampleScorer {
    /// Metric to aggregate segments with instead of the mean score.
    ///
    /// Only used when scores come from a model; provided scores are always
    /// aggregated by their mean.
    pub alternative: Option<Metric>,
}

impl PerSampleScorer {
    /// Scores every row of `samples`.
    ///
    /// `provided` takes precedence over `model`. It must be aligned with the
    /// original dataset: row `i` of `samples` takes the value at
    /// `samples.positions()[i]`.
    ///
    /// Model scores are the natural log of the probability assigned to the true
    /// label, clipped to `[1e-15, 1 - 1e-15]` before the logarithm.
    pub fn score(
        &self,
        samples: &SampleSet,
        model: Option<&dyn Model>,
        provided: Option<&[f64]>,
    ) -> Result<SampleScores, ScoreError> {
        if let Some(provided) = provided {
            return Self::from_provided(samples, provided);
        }
        let model = model.ok_or(ScoreError::NoScoreSource)?;
        let task = ScoringTask::for_task(samples.task_type())?;
        let predictions = task.predict(samples, model)?;

        let per_sample = (0..predictions.len())
            .map(|row| clipped_ln(predictions.true_class_probability(row)))
            .collect::<Vec<_>>();
        let scorer = match self.alternative {
            Some(metric) => SegmentScorer::Metric {
                metric,
                predictions,
            },
            None => SegmentScorer::MeanScore,
        };
        Ok(Self::finish(per_sample, scorer))
    }

    fn from_provided(samples: &SampleSet, provided: &[f64]) -> Result<SampleScores, ScoreError> {
        let per_sample = samples
            .positions()
            .iter()
            .map(|&position| {
                let score = *provided.get(position).ok_or(ScoreError::ScoreOutOfRange {
                    position,
                    len: provided.len(),
                })?;
                if score.is_finite() {
                    Ok(score)
                } else {
                    Err(ScoreError::NonFiniteScore { position })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::finish(per_sample, SegmentScorer::MeanScore))
    }

    fn finish(per_sample: Vec<f64>, scorer: SegmentScorer) -> SampleScores {
        let mut scores = SampleScores {
            per_sample,
            average: 0.0,
            scorer,
        };
        let all_rows = (0..scores.len()).collect::<Vec<_>>();
        let average = scores.segment_score(&all_rows);
        scores.average = if average.is_nan() {
            average
        } else {
            round_to(average, AVERAGE_SCORE_DECIMALS)
        };
        scores
    }
}

#[cfg(test)]
mod tests {
    use segscope_dataset::{seed::Seed, task::Label};

    use super::*;
    use crate::model::{PrecomputedModel, ProbabilisticModel};

    fn classes() -> Vec<String> {
        vec!["cat".into(), "dog".into()]
    }

    fn labelled(labels: &[&str]) -> SampleSet {
        SampleSet::new(TaskType::Classification, labels.len())
            .with_labels(labels.iter().copied().map(Label::from).collect())
            .unwrap()
    }

    fn model(predictions: &[&str], probabilities: Vec<Vec<f64>>) -> PrecomputedModel {
        PrecomputedModel::new(
            classes(),
            predictions.iter().map(|&p| p.to_owned()).collect(),
        )
        .with_probabilities(probabilities)
        .unwrap()
    }

    #[test]
    fn test_provided_scores_take_precedence() {
        let samples = labelled(&["cat", "dog"]);
        let model = PrecomputedModel::new(classes(), vec!["cat".into(), "cat".into()]);
        let scores = PerSampleScorer::default()
            .score(&samples, Some(&model), Some(&[1.0, 0.0]))
            .unwrap();
        assert_eq!(scores.per_sample(), [1.0, 0.0]);
        assert_eq!(scores.average(), 0.5);
        assert!(matches!(scores.scorer(), SegmentScorer::MeanScore));
    }

    #[test]
    #[expect(clippy::cast_precision_loss)]
    fn test_provided_scores_follow_sampled_positions() {
        let provided = (0..100).map(f64::from).collect::<Vec<_>>();
        let samples = SampleSet::new(TaskType::Classification, 100).sample(20, Seed(9));
        let scores = PerSampleScorer::default()
            .score(&samples, None, Some(&provided))
            .unwrap();
        for (&pos, &score) in samples.positions().iter().zip(scores.per_sample()) {
            assert_eq!(score, pos as f64);
        }
    }

    #[test]
    fn test_provided_scores_must_cover_positions() {
        let samples = SampleSet::new(TaskType::Classification, 3);
        let err = PerSampleScorer::default()
            .score(&samples, None, Some(&[1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            ScoreError::ScoreOutOfRange { position: 2, len: 2 }
        ));

        let err = PerSampleScorer::default()
            .score(&samples, None, Some(&[1.0, f64::NAN, 2.0]))
            .unwrap_err();
        assert!(matches!(err, ScoreError::NonFiniteScore { position: 1 }));
    }

    #[test]
    fn test_no_source() {
        let samples = labelled(&["cat"]);
        let err = PerSampleScorer::default().score(&samples, None, None).unwrap_err();
        assert!(matches!(err, ScoreError::NoScoreSource));
    }

    #[test]
    fn test_negative_cross_entropy() {
        let samples = labelled(&["cat", "dog", "dog"]);
        let model = model(
            &["cat", "cat", "dog"],
            vec![vec![0.9, 0.1], vec![0.75, 0.25], vec![0.0, 1.0]],
        );
        let scores = PerSampleScorer::default()
            .score(&samples, Some(&model), None)
            .unwrap();
        let expected = [0.9_f64.ln(), 0.25_f64.ln(), (1.0 - 1e-15_f64).ln()];
        for (a, b) in scores.per_sample().iter().zip(expected) {
            assert!((a - b).abs() < 1e-12);
        }
        let mean = expected.iter().sum::<f64>() / 3.0;
        assert_eq!(scores.average(), round_to(mean, 3));
    }

    #[test]
    fn test_average_is_rounded() {
        let samples = SampleSet::new(TaskType::Classification, 3);
        let scores = PerSampleScorer::default()
            .score(&samples, None, Some(&[0.1, 0.2, 0.4]))
            .unwrap();
        assert_eq!(scores.average(), 0.233);
    }

    #[test]
    fn test_model_without_probabilities_is_rejected() {
        let samples = labelled(&["cat", "dog"]);
        let model = PrecomputedModel::new(classes(), vec!["cat".into(), "dog".into()]);
        let err = PerSampleScorer::default()
            .score(&samples, Some(&model), None)
            .unwrap_err();
        assert!(matches!(err, ScoreError::MissingProbabilities));
    }

    #[test]
    fn test_non_classification_task_is_rejected() {
        for task in [
            TaskType::Regression,
            TaskType::MultiLabel,
            TaskType::TokenClassification,
        ] {
            let samples = SampleSet::new(task, 1)
                .with_labels(vec![Label::from("cat")])
                .unwrap();
            let model = model(&["cat"], vec![vec![0.5, 0.5]]);
            let err = PerSampleScorer::default()
                .score(&samples, Some(&model), None)
                .unwrap_err();
            assert!(matches!(err, ScoreError::UnsupportedTask { task: t } if t == task));
        }
    }

    /// Model passing its probability rows through unvalidated.
    #[derive(Debug)]
    struct RawProbabilities {
        classes: Vec<String>,
        probabilities: Vec<Vec<f64>>,
    }

    impl Model for RawProbabilities {
        fn classes(&self) -> &[String] {
            &self.classes
        }

        fn predict(&self, samples: &SampleSet) -> Result<Vec<String>, ModelError> {
            Ok(vec!["cat".to_owned(); samples.len()])
        }

        fn as_probabilistic(&self) -> Option<&dyn ProbabilisticModel> {
            Some(self)
        }
    }

    impl ProbabilisticModel for RawProbabilities {
        fn predict_proba(&self, _: &SampleSet) -> Result<Vec<Vec<f64>>, ModelError> {
            Ok(self.probabilities.clone())
        }
    }

    #[test]
    fn test_invalid_probabilities_are_model_errors() {
        let samples = labelled(&["cat", "dog"]);
        for value in [f64::NAN, f64::NEG_INFINITY, 2.0] {
            let model = RawProbabilities {
                classes: classes(),
                probabilities: vec![vec![0.5, 0.5], vec![value, value]],
            };
            let err = PerSampleScorer::default()
                .score(&samples, Some(&model), None)
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    ScoreError::Model(ModelError::InvalidProbability { row: 1, .. })
                ),
                "{err}"
            );
        }
    }

    #[test]
    fn test_unknown_label() {
        let samples = labelled(&["bird"]);
        let model = model(&["cat"], vec![vec![0.5, 0.5]]);
        let err = PerSampleScorer::default()
            .score(&samples, Some(&model), None)
            .unwrap_err();
        assert!(matches!(err, ScoreError::UnknownLabel { label } if label == "bird"));
    }

    #[test]
    fn test_alternative_metric_drives_segment_scores() {
        let samples = labelled(&["cat", "dog", "dog", "cat"]);
        let model = model(
            &["cat", "cat", "dog", "cat"],
            vec![
                vec![0.9, 0.1],
                vec![0.6, 0.4],
                vec![0.2, 0.8],
                vec![0.7, 0.3],
            ],
        );
        let scorer = PerSampleScorer {
            alternative: Some(Metric::Accuracy),
        };
        let scores = scorer.score(&samples, Some(&model), None).unwrap();
        assert_eq!(scores.scorer().name(), "accuracy");
        assert_eq!(scores.average(), 0.75);
        assert_eq!(scores.segment_score(&[0, 2]), 1.0);
        assert_eq!(scores.segment_score(&[1]), 0.0);
        // per-sample scores are still cross-entropy
        assert!((scores.per_sample()[1] - 0.4_f64.ln()).abs() < 1e-12);
    }
}
