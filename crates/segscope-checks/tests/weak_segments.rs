use std::collections::BTreeSet;

use rand::Rng as _;
use segscope_checks::{
    error::{CheckError, ConfigError},
    weak_segments::{
        WeakSegmentsCheck, WeakSegmentsConfig, WeakSegmentsResult,
        report::{PredicateRecord, SegmentRecord},
    },
};
use segscope_dataset::{
    sample::{Column, ColumnGroup, SampleSet},
    seed::{RngStream, Seed},
    task::{Label, TaskType},
};
use segscope_scoring::{metric::Metric, model::PrecomputedModel};
use segscope_stats::descriptive::{mean, round_to};

/// Rows with `category == "B"` and `numeric > 5` are the weak ones.
struct Scenario {
    samples: SampleSet,
    weak: BTreeSet<usize>,
    scores: Vec<f64>,
}

fn scenario(n: usize, seed: u64) -> Scenario {
    let mut rng = Seed(seed).rng(RngStream::Synthetic);
    let mut category = vec![];
    let mut numeric = vec![];
    let mut labels = vec![];
    for _ in 0..n {
        category.push(Some(if rng.random_bool(0.5) { "A" } else { "B" }));
        numeric.push(Some(rng.random_range(0.0..10.0)));
        labels.push(Label::from(if rng.random_bool(0.5) { "yes" } else { "no" }));
    }
    let weak = (0..n)
        .filter(|&i| category[i] == Some("B") && numeric[i].is_some_and(|x| x > 5.0))
        .collect::<BTreeSet<_>>();
    let scores = (0..n)
        .map(|i| if weak.contains(&i) { -1.5 } else { -0.2 })
        .collect();
    let samples = SampleSet::new(TaskType::Classification, n)
        .with_labels(labels)
        .unwrap()
        .with_features(vec![
            Column::categorical("category", category),
            Column::numerical("numeric", numeric),
        ])
        .unwrap();
    Scenario {
        samples,
        weak,
        scores,
    }
}

/// Model agreeing with the labels, with low confidence on the weak rows.
fn model(scenario: &Scenario) -> PrecomputedModel {
    let classes = vec!["no".to_owned(), "yes".to_owned()];
    let labels = scenario.samples.labels().unwrap();
    let predictions = labels.iter().map(ToString::to_string).collect();
    let probabilities = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let p_true = if scenario.weak.contains(&i) { 0.3 } else { 0.9 };
            if label.as_class() == Some("yes") {
                vec![1.0 - p_true, p_true]
            } else {
                vec![p_true, 1.0 - p_true]
            }
        })
        .collect();
    PrecomputedModel::new(classes, predictions)
        .with_probabilities(probabilities)
        .unwrap()
}

#[expect(clippy::cast_precision_loss)]
fn jaccard(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> f64 {
    a.intersection(b).count() as f64 / a.union(b).count() as f64
}

fn assert_identifies_injected_segment(result: &WeakSegmentsResult, weak: &BTreeSet<usize>) {
    let top = &result.weak_segments[0];
    let members = top.sample_positions.iter().copied().collect::<BTreeSet<_>>();
    assert!(jaccard(&members, weak) >= 0.9, "{}", top.description());

    let category = top
        .predicates
        .iter()
        .find(|p| p.column() == "category")
        .unwrap();
    assert!(matches!(
        category,
        PredicateRecord::Categorical { categories, .. } if categories == &["B"]
    ));
    let numeric = top
        .predicates
        .iter()
        .find(|p| p.column() == "numeric")
        .unwrap();
    let PredicateRecord::Numerical { lower, upper, .. } = numeric else {
        panic!("unexpected predicate {numeric}");
    };
    assert!(lower.is_some_and(|l| (4.5..=5.5).contains(&l)), "{numeric}");
    assert_eq!(*upper, None);
}

fn assert_ranked_and_distinct(segments: &[SegmentRecord], similarity_threshold: f64) {
    for pair in segments.windows(2) {
        assert!(
            pair[0].weakness > pair[1].weakness
                || (pair[0].weakness == pair[1].weakness && pair[0].size >= pair[1].size)
        );
    }
    let sets = segments
        .iter()
        .map(|s| s.sample_positions.iter().copied().collect::<BTreeSet<_>>())
        .collect::<Vec<_>>();
    for (i, a) in sets.iter().enumerate() {
        for b in &sets[i + 1..] {
            assert!(jaccard(a, b) < similarity_threshold);
        }
    }
}

mod injected_segment {
    use super::*;

    #[test]
    fn test_found_from_provided_scores() {
        let scenario = scenario(1000, 1);
        let result = WeakSegmentsCheck::features()
            .run(&scenario.samples, None, Some(&scenario.scores))
            .unwrap();
        assert_identifies_injected_segment(&result, &scenario.weak);
    }

    #[test]
    fn test_found_from_model_probabilities() {
        let scenario = scenario(1000, 2);
        let model = model(&scenario);
        let result = WeakSegmentsCheck::features()
            .run(&scenario.samples, Some(&model), None)
            .unwrap();
        assert_identifies_injected_segment(&result, &scenario.weak);
        assert_eq!(result.scorer, "Average Score Per Sample");
    }

    #[test]
    fn test_found_with_alternative_scorer() {
        let scenario = scenario(1000, 3);
        let model = model(&scenario);
        let check = WeakSegmentsCheck::features().with_config(WeakSegmentsConfig {
            alternative_scorer: Some(Metric::NegLogLoss),
            ..WeakSegmentsConfig::default()
        });
        let result = check.run(&scenario.samples, Some(&model), None).unwrap();
        assert_identifies_injected_segment(&result, &scenario.weak);
        assert_eq!(result.scorer, "neg_log_loss");
    }
}

mod properties {
    use super::*;

    #[test]
    fn test_segments_respect_minimum_size() {
        let scenario = scenario(600, 4);
        for ratio in [0.05, 0.1, 0.2] {
            let check = WeakSegmentsCheck::features().with_config(WeakSegmentsConfig {
                segment_minimum_size_ratio: ratio,
                ..WeakSegmentsConfig::default()
            });
            let result = check
                .run(&scenario.samples, None, Some(&scenario.scores))
                .unwrap();
            #[expect(clippy::cast_precision_loss)]
            let minimum = ratio * result.num_samples as f64;
            assert!(
                result
                    .weak_segments
                    .iter()
                    .all(|s| s.size as f64 >= minimum - 1e-9)
            );
        }
    }

    #[test]
    fn test_runs_are_deterministic() {
        let scenario = scenario(800, 5);
        let model = model(&scenario);
        let check = WeakSegmentsCheck::features().with_config(WeakSegmentsConfig {
            n_samples: 500,
            ..WeakSegmentsConfig::default()
        });
        let a = check.run(&scenario.samples, Some(&model), None).unwrap();
        let b = check.run(&scenario.samples, Some(&model), None).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert_eq!(a.num_samples, 500);
    }

    #[test]
    fn test_average_score_is_rounded_mean() {
        let scenario = scenario(300, 6);
        let noisy = scenario
            .scores
            .iter()
            .enumerate()
            .map(|(i, s)| s + f64::from(u8::try_from(i % 7).unwrap()) * 0.0137)
            .collect::<Vec<_>>();
        let result = WeakSegmentsCheck::features()
            .run(&scenario.samples, None, Some(&noisy))
            .unwrap();
        let expected = round_to(mean(noisy.iter().copied()).unwrap(), 3);
        assert_eq!(result.avg_score, expected);
    }

    #[test]
    fn test_segments_are_ranked_and_distinct() {
        let scenario = scenario(1000, 7);
        // two weak regions of different strength
        let scores = scenario
            .scores
            .iter()
            .enumerate()
            .map(|(i, &s)| if i % 4 == 0 { s - 0.5 } else { s })
            .collect::<Vec<_>>();
        let config = WeakSegmentsConfig::default();
        let threshold = config.similarity_threshold;
        let result = WeakSegmentsCheck::features()
            .with_config(config)
            .run(&scenario.samples, None, Some(&scores))
            .unwrap();
        assert!(!result.weak_segments.is_empty());
        assert_ranked_and_distinct(&result.weak_segments, threshold);
    }
}

mod failures {
    use super::*;

    #[test]
    fn test_zero_samples_is_config_error() {
        let scenario = scenario(100, 8);
        let check = WeakSegmentsCheck::features().with_config(WeakSegmentsConfig {
            n_samples: 0,
            ..WeakSegmentsConfig::default()
        });
        let err = check
            .run(&scenario.samples, None, Some(&scenario.scores))
            .unwrap_err();
        assert!(matches!(err, CheckError::Config(ConfigError::ZeroSamples)));
    }

    #[test]
    fn test_model_without_probabilities_is_unsupported() {
        let scenario = scenario(100, 9);
        let labels = scenario.samples.labels().unwrap();
        let model = PrecomputedModel::new(
            vec!["no".into(), "yes".into()],
            labels.iter().map(ToString::to_string).collect(),
        );
        let err = WeakSegmentsCheck::features()
            .run(&scenario.samples, Some(&model), None)
            .unwrap_err();
        assert!(err.is_unsupported(), "{err}");
    }

    #[test]
    fn test_large_minimum_size_is_processing_failure() {
        let scenario = scenario(100, 10);
        let check = WeakSegmentsCheck::features().with_config(WeakSegmentsConfig {
            segment_minimum_size_ratio: 0.9,
            ..WeakSegmentsConfig::default()
        });
        let err = check
            .run(&scenario.samples, None, Some(&scenario.scores))
            .unwrap_err();
        assert!(err.is_processing(), "{err}");
        assert!(err.to_string().contains("Try increasing n_samples or supply more features"));
    }

    #[test]
    fn test_regression_model_scoring_is_config_error() {
        let scenario = scenario(50, 11);
        let samples = SampleSet::new(TaskType::Regression, 50)
            .with_features(scenario.samples.columns(ColumnGroup::Features).to_vec())
            .unwrap()
            .with_labels(scenario.samples.labels().unwrap().to_vec())
            .unwrap();
        let model = model(&scenario);
        let err = WeakSegmentsCheck::features()
            .run(&samples, Some(&model), None)
            .unwrap_err();
        assert!(err.is_config(), "{err}");
    }
}

mod categorical_round_trip {
    use super::*;

    /// `C` and `D` are rare enough to be merged into "Other"; their rows are weak.
    fn rare_scenario() -> (SampleSet, Vec<f64>, BTreeSet<usize>) {
        let n = 1000;
        let category = (0..n)
            .map(|i| {
                Some(match i % 100 {
                    0..3 => "C",
                    3..6 => "D",
                    6..50 => "A",
                    _ => "B",
                })
            })
            .collect::<Vec<_>>();
        let numeric = (0..n)
            .map(|i| Some(f64::from(u32::try_from(i % 13).unwrap())))
            .collect::<Vec<_>>();
        let weak = (0..n)
            .filter(|i| matches!(category[*i], Some("C" | "D")))
            .collect::<BTreeSet<_>>();
        let scores = (0..n)
            .map(|i| if weak.contains(&i) { -3.0 } else { -0.1 })
            .collect();
        let samples = SampleSet::new(TaskType::Classification, n)
            .with_labels(
                (0..n)
                    .map(|i| Label::from(if i % 2 == 0 { "no" } else { "yes" }))
                    .collect(),
            )
            .unwrap()
            .with_features(vec![
                Column::categorical("category", category),
                Column::numerical("numeric", numeric),
            ])
            .unwrap();
        (samples, scores, weak)
    }

    #[test]
    fn test_other_bucket_maps_back_to_its_categories() {
        let (samples, scores, weak) = rare_scenario();
        let result = WeakSegmentsCheck::features()
            .run(&samples, None, Some(&scores))
            .unwrap();
        let top = &result.weak_segments[0];
        let members = top.sample_positions.iter().copied().collect::<BTreeSet<_>>();
        assert_eq!(members, weak);
        assert_eq!(
            top.predicates,
            [PredicateRecord::Categorical {
                column: "category".into(),
                categories: vec!["C".into(), "D".into()],
                includes_other: true,
                includes_missing: false,
            }]
        );
    }
}
