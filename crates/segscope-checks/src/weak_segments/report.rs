//! Human-readable segment records
//!
//! Segments found by the search are expressed over encoded columns. The
//! records here map them back to the original column domain: numerical
//! ranges keep their bounds, categorical ranges become the list of original
//! categories (rare categories merged into "Other" are listed individually).

use std::fmt;

use segscope_dataset::encoding::{ColumnDescriptor, EncodedKind, EncodedTable};
use segscope_search::segment::{Predicate, Segment};
use serde::Serialize;

/// A segment predicate in the original column domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateRecord {
    /// `lower < value <= upper`; a missing bound is unbounded.
    Numerical {
        column: String,
        lower: Option<f64>,
        upper: Option<f64>,
        includes_missing: bool,
    },
    /// Value is one of `categories`.
    Categorical {
        column: String,
        categories: Vec<String>,
        includes_other: bool,
        includes_missing: bool,
    },
}

impl PredicateRecord {
    /// Reverses `predicate` through the encoding recorded in `descriptor`.
    #[must_use]
    pub fn from_encoded(predicate: &Predicate, descriptor: &ColumnDescriptor) -> Self {
        Self::from_range(descriptor, predicate.lower, predicate.upper)
    }

    pub(crate) fn from_range(
        descriptor: &ColumnDescriptor,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Self {
        let includes_missing = descriptor.missing_in(lower, upper);
        match &descriptor.kind {
            EncodedKind::Numerical => {
                // A lower bound between the sentinel and the smallest real
                // value only separates missing cells.
                let lower = lower.filter(|&l| l >= descriptor.min_value);
                Self::Numerical {
                    column: descriptor.name.clone(),
                    lower,
                    upper,
                    includes_missing,
                }
            }
            EncodedKind::Categorical { .. } => {
                let buckets = descriptor.categories_in(lower, upper);
                let includes_other = buckets.iter().any(|c| c.bucket.is_other());
                let mut categories = buckets
                    .iter()
                    .flat_map(|c| c.bucket.categories())
                    .map(str::to_owned)
                    .collect::<Vec<_>>();
                categories.sort();
                Self::Categorical {
                    column: descriptor.name.clone(),
                    categories,
                    includes_other,
                    includes_missing,
                }
            }
        }
    }

    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Numerical { column, .. } | Self::Categorical { column, .. } => column,
        }
    }
}

impl fmt::Display for PredicateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let includes_missing = match self {
            Self::Numerical {
                column,
                lower,
                upper,
                includes_missing,
            } => {
                match (lower, upper) {
                    (Some(l), Some(u)) => write!(f, "{l:.3} < {column} <= {u:.3}")?,
                    (Some(l), None) => write!(f, "{column} > {l:.3}")?,
                    (None, Some(u)) => write!(f, "{column} <= {u:.3}")?,
                    (None, None) => write!(f, "{column} is any value")?,
                }
                *includes_missing
            }
            Self::Categorical {
                column,
                categories,
                includes_missing,
                ..
            } => {
                write!(f, "{column} in [{}]", categories.join(", "))?;
                *includes_missing
            }
        };
        if includes_missing {
            f.write_str(" or missing")?;
        }
        Ok(())
    }
}

/// A reported weak segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRecord {
    pub predicates: Vec<PredicateRecord>,
    /// Number of searched samples in the segment.
    pub size: usize,
    /// `size` as a fraction of the searched samples.
    pub data_ratio: f64,
    pub score: f64,
    /// Average score minus segment score.
    pub weakness: f64,
    /// Original positions of the member samples, ascending.
    pub sample_positions: Vec<usize>,
}

impl SegmentRecord {
    #[expect(clippy::cast_precision_loss)]
    pub(crate) fn new(segment: &Segment, table: &EncodedTable, positions: &[usize]) -> Self {
        let predicates = segment
            .predicates
            .iter()
            .map(|p| PredicateRecord::from_encoded(p, &table.column(p.column).descriptor))
            .collect();
        Self {
            predicates,
            size: segment.size(),
            data_ratio: segment.size() as f64 / table.num_rows() as f64,
            score: segment.score,
            weakness: segment.weakness,
            sample_positions: segment.rows.iter().map(|&r| positions[r]).collect(),
        }
    }

    /// Predicates joined with "and".
    #[must_use]
    pub fn description(&self) -> String {
        self.predicates
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" and ")
    }
}
