//! Conflicting labels check
//!
//! Samples whose normalized texts are identical but whose labels differ point
//! at labeling mistakes or genuinely ambiguous inputs.

use std::collections::{BTreeSet, HashMap};

use segscope_dataset::{sample::SampleSet, seed::Seed, task::Label};
use serde::{Deserialize, Serialize};

use crate::error::{CheckError, ConfigError};

/// Maps a text to the key duplicates are detected by.
pub trait TextNormalizer {
    fn normalize(&self, text: &str) -> String;
}

/// Compares texts exactly as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl TextNormalizer for IdentityNormalizer {
    fn normalize(&self, text: &str) -> String {
        text.to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConflictingLabelsConfig {
    /// Number of conflict groups in the display section.
    pub n_to_show: usize,
    pub n_samples: usize,
    pub random_state: Seed,
    /// Displayed texts are cut to this many characters.
    pub max_text_length_for_display: usize,
    pub with_display: bool,
}

impl Default for ConflictingLabelsConfig {
    fn default() -> Self {
        Self {
            n_to_show: 5,
            n_samples: 10_000_000,
            random_state: Seed::default(),
            max_text_length_for_display: 30,
            with_display: true,
        }
    }
}

/// One sample of a conflict group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictingSample {
    /// Original position of the sample.
    pub sample_id: usize,
    pub label: Label,
    pub text: String,
}

/// Samples sharing one normalized text with more than one distinct label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictGroup {
    /// Ordinal of the group, in order of first appearance.
    pub duplicate: usize,
    pub samples: Vec<ConflictingSample>,
}

impl ConflictGroup {
    /// Distinct labels of the group, in order of appearance.
    #[must_use]
    pub fn observed_labels(&self) -> Vec<&Label> {
        let mut labels: Vec<&Label> = vec![];
        for sample in &self.samples {
            if !labels.contains(&&sample.label) {
                labels.push(&sample.label);
            }
        }
        labels
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictDisplayRow {
    pub observed_labels: Vec<Label>,
    pub sample_ids: Vec<usize>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictingLabelsResult {
    /// Share of samples belonging to a conflict group.
    pub percent_of_conflicting_samples: f64,
    pub conflicting_samples: Vec<ConflictGroup>,
    pub display: Option<Vec<ConflictDisplayRow>>,
}

#[derive(Debug, Clone)]
pub struct ConflictingLabelsCheck<N = IdentityNormalizer> {
    pub config: ConflictingLabelsConfig,
    pub normalizer: N,
}

impl Default for ConflictingLabelsCheck<IdentityNormalizer> {
    fn default() -> Self {
        Self::new(ConflictingLabelsConfig::default(), IdentityNormalizer)
    }
}

impl<N> ConflictingLabelsCheck<N>
where
    N: TextNormalizer,
{
    #[must_use]
    pub fn new(config: ConflictingLabelsConfig, normalizer: N) -> Self {
        Self { config, normalizer }
    }

    /// Runs the check.
    ///
    /// Both single-class labels and label tuples (multi-label and token tasks)
    /// are compared as whole values.
    #[expect(clippy::cast_precision_loss)]
    pub fn run(&self, samples: &SampleSet) -> Result<ConflictingLabelsResult, CheckError> {
        if self.config.n_samples == 0 {
            return Err(ConfigError::ZeroSamples.into());
        }
        let samples = samples.sample(self.config.n_samples, self.config.random_state);
        if samples.is_empty() {
            return Err(ConfigError::EmptySampleSet.into());
        }
        let texts = samples
            .texts()
            .ok_or(ConfigError::MissingData { what: "texts" })?;
        let labels = samples
            .labels()
            .ok_or(ConfigError::MissingData { what: "labels" })?;

        // normalized text -> rows, groups in order of first appearance
        let mut index = HashMap::<String, usize>::new();
        let mut groups = Vec::<Vec<usize>>::new();
        for (row, text) in texts.iter().enumerate() {
            let key = self.normalizer.normalize(text);
            let group = *index.entry(key).or_insert_with(|| {
                groups.push(vec![]);
                groups.len() - 1
            });
            groups[group].push(row);
        }

        let conflicting_samples = groups
            .into_iter()
            .filter(|rows| rows.iter().map(|&r| &labels[r]).collect::<BTreeSet<_>>().len() > 1)
            .enumerate()
            .map(|(duplicate, rows)| ConflictGroup {
                duplicate,
                samples: rows
                    .into_iter()
                    .map(|r| ConflictingSample {
                        sample_id: samples.positions()[r],
                        label: labels[r].clone(),
                        text: texts[r].clone(),
                    })
                    .collect(),
            })
            .collect::<Vec<_>>();

        let num_conflicting = conflicting_samples
            .iter()
            .map(|g| g.samples.len())
            .sum::<usize>();
        let display = self.config.with_display.then(|| {
            conflicting_samples
                .iter()
                .take(self.config.n_to_show)
                .map(|group| ConflictDisplayRow {
                    observed_labels: group.observed_labels().into_iter().cloned().collect(),
                    sample_ids: group.samples.iter().map(|s| s.sample_id).collect(),
                    text: truncate(&group.samples[0].text, self.config.max_text_length_for_display),
                })
                .collect()
        });

        Ok(ConflictingLabelsResult {
            percent_of_conflicting_samples: num_conflicting as f64 / samples.len() as f64,
            conflicting_samples,
            display,
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use segscope_dataset::task::TaskType;

    use super::*;

    fn text_samples(task: TaskType, rows: &[(&str, Label)]) -> SampleSet {
        SampleSet::new(task, rows.len())
            .with_texts(rows.iter().map(|(t, _)| (*t).to_owned()).collect())
            .unwrap()
            .with_labels(rows.iter().map(|(_, l)| l.clone()).collect())
            .unwrap()
    }

    #[test]
    fn test_groups_conflicting_texts() {
        let samples = text_samples(
            TaskType::Classification,
            &[
                ("good movie", "pos".into()),
                ("bad movie", "neg".into()),
                ("good movie", "neg".into()),
                ("meh", "neg".into()),
                ("meh", "neg".into()),
                ("bad movie", "pos".into()),
                ("good movie", "pos".into()),
            ],
        );
        let result = ConflictingLabelsCheck::default().run(&samples).unwrap();

        assert!((result.percent_of_conflicting_samples - 5.0 / 7.0).abs() < 1e-12);
        let groups = &result.conflicting_samples;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].duplicate, 0);
        let ids = groups[0].samples.iter().map(|s| s.sample_id).collect::<Vec<_>>();
        assert_eq!(ids, [0, 2, 6]);
        assert_eq!(groups[1].samples[0].text, "bad movie");
        assert_eq!(
            groups[0].observed_labels(),
            [&Label::from("pos"), &Label::from("neg")]
        );
    }

    #[test]
    fn test_label_tuples_are_compared_whole() {
        let tags = |t: &[&str]| Label::Tuple(t.iter().map(|&s| s.to_owned()).collect());
        let samples = text_samples(
            TaskType::MultiLabel,
            &[
                ("a", tags(&["x", "y"])),
                ("a", tags(&["x", "y"])),
                ("b", tags(&["x"])),
                ("b", tags(&["x", "y"])),
            ],
        );
        let result = ConflictingLabelsCheck::default().run(&samples).unwrap();
        assert_eq!(result.conflicting_samples.len(), 1);
        assert_eq!(result.conflicting_samples[0].samples[0].text, "b");
        assert!((result.percent_of_conflicting_samples - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_custom_normalizer() {
        struct Lowercase;
        impl TextNormalizer for Lowercase {
            fn normalize(&self, text: &str) -> String {
                text.to_lowercase()
            }
        }

        let samples = text_samples(
            TaskType::Classification,
            &[("Hello", "a".into()), ("hello", "b".into())],
        );
        let identity = ConflictingLabelsCheck::default().run(&samples).unwrap();
        assert!(identity.conflicting_samples.is_empty());

        let check = ConflictingLabelsCheck::new(ConflictingLabelsConfig::default(), Lowercase);
        let result = check.run(&samples).unwrap();
        assert_eq!(result.conflicting_samples.len(), 1);
    }

    #[test]
    fn test_display_is_limited_and_truncated() {
        let long = "a very long review text that goes on and on";
        let samples = text_samples(
            TaskType::Classification,
            &[
                (long, "pos".into()),
                (long, "neg".into()),
                ("x", "pos".into()),
                ("x", "neg".into()),
            ],
        );
        let check = ConflictingLabelsCheck {
            config: ConflictingLabelsConfig {
                n_to_show: 1,
                ..ConflictingLabelsConfig::default()
            },
            normalizer: IdentityNormalizer,
        };
        let display = check.run(&samples).unwrap().display.unwrap();
        assert_eq!(display.len(), 1);
        assert_eq!(display[0].text, "a very long review text that g...");
        assert_eq!(display[0].sample_ids, [0, 1]);
    }

    #[test]
    fn test_empty_sample_set_is_config_error() {
        let samples = SampleSet::new(TaskType::Classification, 0);
        let err = ConflictingLabelsCheck::default().run(&samples).unwrap_err();
        assert!(matches!(err, CheckError::Config(ConfigError::EmptySampleSet)));
    }

    #[test]
    fn test_texts_are_required() {
        let samples = SampleSet::new(TaskType::Classification, 1)
            .with_labels(vec!["a".into()])
            .unwrap();
        let err = ConflictingLabelsCheck::default().run(&samples).unwrap_err();
        assert!(err.is_config());
    }
}
