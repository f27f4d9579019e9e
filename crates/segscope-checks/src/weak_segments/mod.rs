//! Weak segments performance check
//!
//! Finds the sub-populations of a sample set where the model performs worst.
//! The check runs the full pipeline:
//!
//! 1. Sample at most `n_samples` rows
//! 2. Select the columns of the active group ([`ColumnGroup`])
//! 3. Score every sample (provided scores, or the model's negative
//!    cross-entropy)
//! 4. Encode categorical columns against the labels
//! 5. Search for weak segments
//! 6. Report the segments in the original column domain, with an optional
//!    heatmap over the top segments

pub mod heatmap;
pub mod report;

use segscope_dataset::{
    encoding::{CategoricalEncoder, EncodingTarget},
    sample::{ColumnGroup, SampleSet},
    seed::Seed,
    table::{ColumnSelection, FeatureTableBuilder},
    task::TaskType,
};
use segscope_scoring::{metric::Metric, model::Model, scorer::PerSampleScorer};
use segscope_search::segment::SegmentSearch;
use segscope_stats::descriptive::DescriptiveStats;
use serde::{Deserialize, Serialize};

use self::{heatmap::Heatmap, report::SegmentRecord};
use crate::error::{CheckError, ConfigError};

/// Settings of a weak segments run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeakSegmentsConfig {
    /// Allow/deny lists over the active column group.
    #[serde(flatten)]
    pub selection: ColumnSelection,
    /// Number of columns to search over; `None` uses every column.
    pub n_top_features: Option<usize>,
    /// Smallest reported segment, as a fraction of the sampled rows.
    pub segment_minimum_size_ratio: f64,
    /// Metric to score segments with instead of the mean per-sample score.
    pub alternative_scorer: Option<Metric>,
    /// Maximum number of rows used.
    pub n_samples: usize,
    /// Categories rarer than this share are merged into "Other".
    pub categorical_aggregation_threshold: f64,
    /// Number of weakest segments in the display section.
    pub n_to_show: usize,
    pub random_state: Seed,
    pub max_depth: usize,
    pub max_members: usize,
    /// Segments at least this similar (Jaccard) to a weaker one are dropped.
    pub similarity_threshold: f64,
    pub with_display: bool,
}

impl Default for WeakSegmentsConfig {
    fn default() -> Self {
        Self {
            selection: ColumnSelection::default(),
            n_top_features: Some(10),
            segment_minimum_size_ratio: 0.05,
            alternative_scorer: None,
            n_samples: 10_000,
            categorical_aggregation_threshold: 0.05,
            n_to_show: 3,
            random_state: Seed::default(),
            max_depth: 5,
            max_members: 45,
            similarity_threshold: 0.8,
            with_display: true,
        }
    }
}

/// Result value of a weak segments run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeakSegmentsResult {
    pub segment_by: ColumnGroup,
    /// Score of all sampled rows, rounded to 3 decimals.
    pub avg_score: f64,
    pub scorer: String,
    /// Number of rows searched.
    pub num_samples: usize,
    /// Segments scoring below `avg_score`, weakest first.
    pub weak_segments: Vec<SegmentRecord>,
    /// Distribution of the per-sample scores.
    pub score_summary: Option<DescriptiveStats>,
    pub display: Option<WeakSegmentsDisplay>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeakSegmentsDisplay {
    pub message: String,
    pub top_segments: Vec<SegmentRecord>,
    pub heatmap: Option<Heatmap>,
}

/// Searches one column group for weak segments.
#[derive(Debug, Clone, Default)]
pub struct WeakSegmentsCheck {
    pub segment_by: ColumnGroup,
    pub config: WeakSegmentsConfig,
}

impl WeakSegmentsCheck {
    /// Segments over model features.
    #[must_use]
    pub fn features() -> Self {
        Self::new(ColumnGroup::Features)
    }

    /// Segments over text properties.
    #[must_use]
    pub fn properties() -> Self {
        Self::new(ColumnGroup::Properties)
    }

    /// Segments over metadata columns.
    #[must_use]
    pub fn metadata() -> Self {
        Self::new(ColumnGroup::Metadata)
    }

    #[must_use]
    pub fn new(segment_by: ColumnGroup) -> Self {
        Self {
            segment_by,
            config: WeakSegmentsConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: WeakSegmentsConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the check.
    ///
    /// `scores` are per-sample scores aligned with `samples`; when given, the
    /// model is not used.
    ///
    /// # Errors
    ///
    /// - [`CheckError::Config`]: `n_samples` is zero, the sample set is empty,
    ///   the task is multi-label or token classification, the column selection
    ///   is invalid, or neither scores nor a scorable model are supplied
    /// - [`CheckError::Unsupported`]: the model has no probability output
    /// - [`CheckError::Processing`]: no segment satisfies the size constraint
    /// - [`CheckError::Model`]: the model failed to predict
    pub fn run(
        &self,
        samples: &SampleSet,
        model: Option<&dyn Model>,
        scores: Option<&[f64]>,
    ) -> Result<WeakSegmentsResult, CheckError> {
        let config = &self.config;
        if config.n_samples == 0 {
            return Err(ConfigError::ZeroSamples.into());
        }
        if let task @ (TaskType::TokenClassification | TaskType::MultiLabel) = samples.task_type() {
            return Err(ConfigError::UnsupportedTask { task }.into());
        }
        if samples.is_empty() {
            return Err(ConfigError::EmptySampleSet.into());
        }

        let samples = samples.sample(config.n_samples, config.random_state);
        let table = FeatureTableBuilder {
            selection: config.selection.clone(),
            n_top_features: config.n_top_features,
            seed: config.random_state,
        }
        .build(&samples, self.segment_by)?;

        let sample_scores = PerSampleScorer {
            alternative: config.alternative_scorer,
        }
        .score(&samples, model, scores)?;

        let target = samples
            .labels()
            .map_or(EncodingTarget::Absent, EncodingTarget::Categorical);
        let encoded = CategoricalEncoder {
            aggregation_threshold: config.categorical_aggregation_threshold,
            ..CategoricalEncoder::default()
        }
        .encode(&table, target)?;

        let search = SegmentSearch {
            min_size_ratio: config.segment_minimum_size_ratio,
            max_depth: config.max_depth,
            max_members: config.max_members,
            similarity_threshold: config.similarity_threshold,
            seed: config.random_state,
        };
        let segments = search.search(&encoded, &sample_scores, &encoded.feature_rank())?;
        if segments.is_empty() {
            return Err(CheckError::Processing {
                message: format!(
                    "weak segments search was unable to train an error model to find weak \
                     segments. Try increasing n_samples or supply more {}",
                    self.segment_by
                ),
            });
        }

        let weak = segments
            .into_iter()
            .filter(|s| s.weakness > 0.0)
            .collect::<Vec<_>>();
        let weak_segments = weak
            .iter()
            .map(|s| SegmentRecord::new(s, &encoded, samples.positions()))
            .collect::<Vec<_>>();

        let display = config.with_display.then(|| {
            let shown = weak.len().min(config.n_to_show);
            WeakSegmentsDisplay {
                message: format!(
                    "Showcasing intersections of {} with weakest detected segments. The full list \
                     of weak segments can be observed in the check result value.",
                    self.segment_by
                ),
                top_segments: weak_segments[..shown].to_vec(),
                heatmap: heatmap::build(&encoded, &sample_scores, &weak[..shown]),
            }
        });

        Ok(WeakSegmentsResult {
            segment_by: self.segment_by,
            avg_score: sample_scores.average(),
            scorer: sample_scores.scorer().name(),
            num_samples: samples.len(),
            weak_segments,
            score_summary: DescriptiveStats::new(sample_scores.per_sample().iter().copied()),
            display,
        })
    }
}
