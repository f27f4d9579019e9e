//! Weak segment search
//!
//! [`SegmentSearch::search`] trains one shallow tree per ensemble member on the
//! per-sample scores, reads every leaf off as a candidate segment, and returns
//! the candidates ranked by weakness with near-duplicates removed.

use std::{cmp::Ordering, thread};

use arrayvec::ArrayVec;
use segscope_dataset::{encoding::EncodedTable, seed::Seed};
use segscope_scoring::scorer::SampleScores;
use serde::{Deserialize, Serialize};

use crate::{
    ensemble::{self, Member, WeightError},
    tree::{FeatureBound, RegressionTree, TreeParams},
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SearchError {
    #[display("encoded table has {table} rows but {scores} scores were supplied")]
    ScoreLengthMismatch { table: usize, scores: usize },
    #[display("invalid minimum segment size ratio {ratio}; expected a value in [0, 1]")]
    InvalidSizeRatio { ratio: f64 },
    #[display("failed to sample ensemble members: {_0}")]
    #[from]
    MemberSampling(WeightError),
}

/// Range over one encoded column: `lower < value <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Predicate {
    /// Column index in the encoded table.
    pub column: usize,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Predicate {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower.is_none_or(|l| value > l) && self.upper.is_none_or(|u| value <= u)
    }
}

/// A candidate sub-population and its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// One or two predicates, all of which a member row satisfies.
    pub predicates: ArrayVec<Predicate, 2>,
    /// Member rows of the searched table, ascending.
    pub rows: Vec<usize>,
    pub score: f64,
    /// Global score minus segment score; positive means weaker than average.
    pub weakness: f64,
}

impl Segment {
    #[must_use]
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Jaccard similarity of the member rows of two segments.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn similarity(&self, other: &Segment) -> f64 {
        let (mut i, mut j, mut shared) = (0, 0, 0_usize);
        while i < self.rows.len() && j < other.rows.len() {
            match self.rows[i].cmp(&other.rows[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        let union = self.rows.len() + other.rows.len() - shared;
        if union == 0 {
            return 1.0;
        }
        shared as f64 / union as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SegmentSearch {
    /// Smallest segment, as a fraction of the searched rows.
    pub min_size_ratio: f64,
    pub max_depth: usize,
    /// Upper bound on the number of trees trained.
    pub max_members: usize,
    /// Segments at least this similar to a weaker one are dropped.
    pub similarity_threshold: f64,
    pub seed: Seed,
}

impl Default for SegmentSearch {
    fn default() -> Self {
        Self {
            min_size_ratio: 0.05,
            max_depth: 5,
            max_members: 45,
            similarity_threshold: 0.8,
            seed: Seed::default(),
        }
    }
}

impl SegmentSearch {
    /// Minimum number of rows a segment over `num_rows` rows must hold.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn min_segment_size(&self, num_rows: usize) -> usize {
        // products such as 0.07 * 100 land just above the integer they stand for
        const ROUNDING_SLACK: f64 = 1e-9;
        let exact = self.min_size_ratio * num_rows as f64;
        ((exact - ROUNDING_SLACK).ceil().max(0.0) as usize).max(1)
    }

    /// Searches `table` for segments scoring below the global score.
    ///
    /// Every returned segment holds at least [`Self::min_segment_size`] rows.
    /// The list is sorted by weakness, then size, both descending; no two
    /// segments are [`Self::similarity_threshold`] or more similar. An empty
    /// list means no valid segment could be formed.
    pub fn search(
        &self,
        table: &EncodedTable,
        scores: &SampleScores,
        feature_rank: &[usize],
    ) -> Result<Vec<Segment>, SearchError> {
        if !(0.0..=1.0).contains(&self.min_size_ratio) {
            return Err(SearchError::InvalidSizeRatio {
                ratio: self.min_size_ratio,
            });
        }
        let num_rows = table.num_rows();
        if scores.len() != num_rows {
            return Err(SearchError::ScoreLengthMismatch {
                table: num_rows,
                scores: scores.len(),
            });
        }
        if num_rows == 0 {
            return Ok(vec![]);
        }

        let members = ensemble::select_members(feature_rank, self.max_members, self.seed)?;
        let params = TreeParams {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_segment_size(num_rows),
        };
        let trees = train_members(table, scores.per_sample(), &members, params);

        let all_rows = (0..num_rows).collect::<Vec<_>>();
        let global_score = scores.segment_score(&all_rows);
        let mut candidates = vec![];
        for (member, tree) in members.iter().zip(trees) {
            for leaf in tree.into_leaves() {
                if leaf.bounds.is_empty() || leaf.rows.len() < params.min_samples_leaf {
                    continue;
                }
                let predicates = leaf
                    .bounds
                    .iter()
                    .map(|&FeatureBound { feature, lower, upper }| Predicate {
                        column: member.columns[feature],
                        lower,
                        upper,
                    })
                    .collect();
                let score = scores.segment_score(&leaf.rows);
                candidates.push(Segment {
                    predicates,
                    rows: leaf.rows,
                    score,
                    weakness: global_score - score,
                });
            }
        }

        // stable: equal candidates keep generation order
        candidates.sort_by(|a, b| {
            b.weakness
                .total_cmp(&a.weakness)
                .then_with(|| b.size().cmp(&a.size()))
        });
        Ok(self.deduplicate(candidates))
    }

    fn deduplicate(&self, ranked: Vec<Segment>) -> Vec<Segment> {
        let mut kept: Vec<Segment> = vec![];
        for segment in ranked {
            if kept
                .iter()
                .all(|k| k.similarity(&segment) < self.similarity_threshold)
            {
                kept.push(segment);
            }
        }
        kept
    }
}

/// Trains one tree per member in parallel; trees are returned in member order.
fn train_members(
    table: &EncodedTable,
    target: &[f64],
    members: &[Member],
    params: TreeParams,
) -> Vec<RegressionTree> {
    let mut trees = members.iter().map(|_| None).collect::<Vec<_>>();
    thread::scope(|s| {
        for (slot, member) in trees.iter_mut().zip(members) {
            s.spawn(move || {
                let features = member
                    .columns
                    .iter()
                    .map(|&c| table.column(c).values.as_slice())
                    .collect::<Vec<_>>();
                let rows = (0..target.len()).collect();
                *slot = Some(RegressionTree::fit(&features, target, rows, params));
            });
        }
    });
    trees.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use segscope_dataset::{
        encoding::{CategoricalEncoder, EncodingTarget},
        sample::{Column, ColumnGroup, SampleSet},
        table::FeatureTableBuilder,
        task::TaskType,
    };
    use segscope_scoring::scorer::PerSampleScorer;

    use super::*;

    struct Fixture {
        table: EncodedTable,
        scores: SampleScores,
    }

    /// `x` in 0..n, `y` alternating; score is low where `x >= low_from`.
    fn fixture(n: usize, low_from: usize) -> Fixture {
        #[expect(clippy::cast_precision_loss)]
        let x = (0..n).map(|i| Some(i as f64)).collect::<Vec<_>>();
        let y = (0..n)
            .map(|i| Some(if i % 2 == 0 { 0.0 } else { 1.0 }))
            .collect::<Vec<_>>();
        let provided = (0..n)
            .map(|i| if i >= low_from { -1.0 } else { 0.0 })
            .collect::<Vec<_>>();
        let samples = SampleSet::new(TaskType::Classification, n)
            .with_features(vec![Column::numerical("x", x), Column::numerical("y", y)])
            .unwrap();
        let table = FeatureTableBuilder::default()
            .build(&samples, ColumnGroup::Features)
            .unwrap();
        let table = CategoricalEncoder::default()
            .encode(&table, EncodingTarget::Absent)
            .unwrap();
        let scores = PerSampleScorer::default()
            .score(&samples, None, Some(&provided))
            .unwrap();
        Fixture { table, scores }
    }

    fn search(fixture: &Fixture, search: &SegmentSearch) -> Vec<Segment> {
        search
            .search(&fixture.table, &fixture.scores, &fixture.table.feature_rank())
            .unwrap()
    }

    #[test]
    fn test_finds_low_scoring_range() {
        let f = fixture(100, 70);
        let segments = search(&f, &SegmentSearch::default());
        let top = &segments[0];
        assert_eq!(top.rows, (70..100).collect::<Vec<_>>());
        assert!((top.score + 1.0).abs() < 1e-12);
        assert_eq!(
            top.predicates.as_slice(),
            [Predicate {
                column: 0,
                lower: Some(69.5),
                upper: None
            }]
        );
        assert!(top.weakness > 0.0);
    }

    #[test]
    fn test_segments_respect_minimum_size() {
        let f = fixture(100, 97);
        let params = SegmentSearch {
            min_size_ratio: 0.1,
            ..SegmentSearch::default()
        };
        let segments = search(&f, &params);
        assert!(segments.iter().all(|s| s.size() >= 10));
    }

    #[test]
    fn test_ranking_and_deduplication() {
        let f = fixture(200, 150);
        let params = SegmentSearch::default();
        let segments = search(&f, &params);
        assert!(!segments.is_empty());
        for pair in segments.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.weakness > b.weakness || (a.weakness == b.weakness && a.size() >= b.size())
            );
        }
        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                assert!(a.similarity(b) < params.similarity_threshold);
            }
        }
    }

    #[test]
    fn test_constant_scores_yield_no_segments() {
        let f = fixture(100, 100);
        assert!(search(&f, &SegmentSearch::default()).is_empty());
    }

    #[test]
    fn test_large_size_ratio_yields_no_segments() {
        let f = fixture(100, 50);
        let params = SegmentSearch {
            min_size_ratio: 0.9,
            ..SegmentSearch::default()
        };
        assert!(search(&f, &params).is_empty());
    }

    #[test]
    fn test_search_is_deterministic() {
        let f = fixture(150, 40);
        let a = search(&f, &SegmentSearch::default());
        let b = search(&f, &SegmentSearch::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_inputs() {
        let f = fixture(10, 5);
        let err = SegmentSearch {
            min_size_ratio: 1.5,
            ..SegmentSearch::default()
        }
        .search(&f.table, &f.scores, &[0, 1])
        .unwrap_err();
        assert!(matches!(err, SearchError::InvalidSizeRatio { .. }));

        let other = fixture(12, 5);
        let err = SegmentSearch::default()
            .search(&f.table, &other.scores, &[0, 1])
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::ScoreLengthMismatch {
                table: 10,
                scores: 12
            }
        ));
    }

    #[test]
    fn test_similarity() {
        let segment = |rows: Vec<usize>| Segment {
            predicates: ArrayVec::new(),
            rows,
            score: 0.0,
            weakness: 0.0,
        };
        let a = segment(vec![1, 2, 3, 4]);
        let b = segment(vec![3, 4, 5, 6]);
        assert!((a.similarity(&b) - 2.0 / 6.0).abs() < 1e-12);
        assert!((a.similarity(&a) - 1.0).abs() < 1e-12);
        assert_eq!(a.similarity(&segment(vec![9])), 0.0);
    }

    #[test]
    fn test_min_segment_size_rounding() {
        let search = |min_size_ratio| SegmentSearch {
            min_size_ratio,
            ..SegmentSearch::default()
        };
        assert_eq!(search(0.07).min_segment_size(100), 7);
        assert_eq!(search(0.05).min_segment_size(100), 5);
        assert_eq!(search(0.055).min_segment_size(100), 6);
        assert_eq!(search(0.05).min_segment_size(10), 1);
        assert_eq!(search(0.001).min_segment_size(10), 1);
    }

    #[test]
    fn test_predicate_is_half_open() {
        let predicate = Predicate {
            column: 0,
            lower: Some(1.0),
            upper: Some(2.0),
        };
        assert!(!predicate.contains(1.0));
        assert!(predicate.contains(1.5));
        assert!(predicate.contains(2.0));
        assert!(!predicate.contains(2.5));
        assert_eq!(
            serde_json::to_value(predicate).unwrap(),
            serde_json::json!({ "column": 0, "lower": 1.0, "upper": 2.0 })
        );
    }
}
