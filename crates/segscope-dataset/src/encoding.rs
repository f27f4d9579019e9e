//! Numeric encoding of feature tables
//!
//! The segment search treats every column as an ordered numeric axis. This
//! module produces that representation from a [`FeatureTable`]:
//!
//! - **Numerical columns** keep their values.
//! - **Categorical columns** are target encoded: each category is replaced by
//!   a smoothed mean of the label conditioned on that category. Categories
//!   rarer than `aggregation_threshold` are first merged into one
//!   [`CategoryBucket::Other`] bucket.
//! - **Missing cells** receive a per-column sentinel strictly below every real
//!   value of that column. Rows are never dropped.
//!
//! The resulting [`ColumnDescriptor`]s keep enough information to map an
//! encoded range back to original category names and to tell whether the
//! range covers missing cells.
//!
//! # Smoothing
//!
//! For a bucket with `n` rows and label mean `m`, and a global label mean
//! `p`, the encoding is
//!
//! ```text
//! w = 1 / (1 + exp(-(n - min_samples_leaf) / smoothing))
//! encoded = p * (1 - w) + m * w
//! ```
//!
//! Categorical labels are mapped to the ordinal of the class in sorted class
//! order before the mean is taken. Without any label, the bucket share of
//! non-missing rows is used instead.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    sample::{Column, ColumnValues},
    table::FeatureTable,
    task::Label,
};

/// Minimal gap between two distinct category encodings.
const TIE_STEP: f64 = 1e-6;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EncodeError {
    #[display("target has {actual} entries but the feature table has {expected} rows")]
    TargetLengthMismatch { expected: usize, actual: usize },
}

/// The label column used to compute target statistics.
#[derive(Debug, Clone, Copy)]
pub enum EncodingTarget<'a> {
    /// Class labels.
    Categorical(&'a [Label]),
    /// Continuous labels.
    Numerical(&'a [f64]),
    /// No label available; categories are encoded by frequency.
    Absent,
}

impl EncodingTarget<'_> {
    fn len(&self) -> Option<usize> {
        match self {
            EncodingTarget::Categorical(labels) => Some(labels.len()),
            EncodingTarget::Numerical(values) => Some(values.len()),
            EncodingTarget::Absent => None,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn to_values(self) -> Option<Vec<f64>> {
        match self {
            EncodingTarget::Categorical(labels) => {
                let classes = labels.iter().collect::<BTreeSet<_>>();
                let codes = classes
                    .into_iter()
                    .enumerate()
                    .map(|(code, label)| (label, code as f64))
                    .collect::<BTreeMap<_, _>>();
                Some(labels.iter().map(|label| codes[label]).collect())
            }
            EncodingTarget::Numerical(values) => Some(values.to_vec()),
            EncodingTarget::Absent => None,
        }
    }
}

/// A group of original categories sharing one encoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryBucket {
    /// A single category frequent enough to keep its own encoding.
    Named(String),
    /// Rare categories merged together, sorted by name.
    Other(Vec<String>),
}

impl CategoryBucket {
    /// Original category names covered by this bucket.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        let names: &[String] = match self {
            CategoryBucket::Named(name) => std::slice::from_ref(name),
            CategoryBucket::Other(names) => names,
        };
        names.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_other(&self) -> bool {
        matches!(self, CategoryBucket::Other(_))
    }
}

/// Encoding of one category bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedCategory {
    pub bucket: CategoryBucket,
    /// Number of rows in the bucket.
    pub count: usize,
    /// Smoothed target statistic of the bucket.
    pub statistic: f64,
    /// Value written into the encoded column.
    pub value: f64,
}

/// Encoding details of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncodedKind {
    Numerical,
    Categorical {
        /// Buckets in ascending order of their encoded value.
        categories: Vec<EncodedCategory>,
    },
}

/// Immutable description of an encoded column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: EncodedKind,
    /// Smallest encoded value of a non-missing cell.
    pub min_value: f64,
    /// Sentinel written into missing cells, strictly below `min_value`.
    pub missing_value: f64,
    /// Whether any cell of the column was missing.
    pub has_missing: bool,
}

impl ColumnDescriptor {
    #[must_use]
    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, EncodedKind::Categorical { .. })
    }

    /// Whether an encoded value lies in the half-open range `(lower, upper]`.
    ///
    /// Unbounded ends are given as `None`.
    #[must_use]
    pub fn in_range(value: f64, lower: Option<f64>, upper: Option<f64>) -> bool {
        lower.is_none_or(|lo| value > lo) && upper.is_none_or(|hi| value <= hi)
    }

    /// Categories whose encoding lies in `(lower, upper]`.
    ///
    /// Empty for numerical columns.
    #[must_use]
    pub fn categories_in(&self, lower: Option<f64>, upper: Option<f64>) -> Vec<&EncodedCategory> {
        match &self.kind {
            EncodedKind::Numerical => vec![],
            EncodedKind::Categorical { categories } => categories
                .iter()
                .filter(|c| Self::in_range(c.value, lower, upper))
                .collect(),
        }
    }

    /// Whether missing cells fall in `(lower, upper]`.
    #[must_use]
    pub fn missing_in(&self, lower: Option<f64>, upper: Option<f64>) -> bool {
        self.has_missing && Self::in_range(self.missing_value, lower, upper)
    }
}

/// An encoded column.
#[derive(Debug, Clone)]
pub struct EncodedColumn {
    pub descriptor: ColumnDescriptor,
    pub values: Vec<f64>,
}

/// All selected columns in numeric form, plus the target column.
#[derive(Debug, Clone)]
pub struct EncodedTable {
    columns: Vec<EncodedColumn>,
    target: Option<Vec<f64>>,
    num_rows: usize,
}

impl EncodedTable {
    #[must_use]
    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, index: usize) -> &EncodedColumn {
        &self.columns[index]
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Target column appended after the feature columns, if a target was given.
    #[must_use]
    pub fn target(&self) -> Option<&[f64]> {
        self.target.as_deref()
    }

    /// Column indices in the order the search should prioritize them.
    #[must_use]
    pub fn feature_rank(&self) -> Vec<usize> {
        (0..self.columns.len()).collect()
    }

    #[must_use]
    pub fn descriptors(&self) -> Vec<&ColumnDescriptor> {
        self.columns.iter().map(|c| &c.descriptor).collect()
    }
}

/// Target encoder for categorical columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoricalEncoder {
    /// Categories with a share of non-missing rows below this are merged
    /// into the "Other" bucket.
    pub aggregation_threshold: f64,
    pub min_samples_leaf: f64,
    pub smoothing: f64,
}

impl Default for CategoricalEncoder {
    fn default() -> Self {
        Self {
            aggregation_threshold: 0.05,
            min_samples_leaf: 20.0,
            smoothing: 10.0,
        }
    }
}

impl CategoricalEncoder {
    /// Encodes every column of `table`.
    ///
    /// Output columns follow the table's column order; the target (if any) is
    /// kept as the trailing column reported by [`EncodedTable::target`].
    pub fn encode(
        &self,
        table: &FeatureTable,
        target: EncodingTarget<'_>,
    ) -> Result<EncodedTable, EncodeError> {
        let num_rows = table.num_rows();
        if let Some(actual) = target.len()
            && actual != num_rows
        {
            return Err(EncodeError::TargetLengthMismatch {
                expected: num_rows,
                actual,
            });
        }
        let target = target.to_values();

        let columns = table
            .columns()
            .iter()
            .map(|column| self.encode_column(column, target.as_deref()))
            .collect();

        Ok(EncodedTable {
            columns,
            target,
            num_rows,
        })
    }

    fn encode_column(&self, column: &Column, target: Option<&[f64]>) -> EncodedColumn {
        match column.values() {
            ColumnValues::Numerical(values) => encode_numerical(column.name(), values),
            ColumnValues::Categorical(values) => {
                self.encode_categorical(column.name(), values, target)
            }
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn encode_categorical(
        &self,
        name: &str,
        values: &[Option<String>],
        target: Option<&[f64]>,
    ) -> EncodedColumn {
        let mut counts = BTreeMap::<&str, usize>::new();
        for value in values.iter().flatten() {
            *counts.entry(value.as_str()).or_default() += 1;
        }
        let non_missing = counts.values().sum::<usize>();

        let rare = counts
            .iter()
            .filter(|&(_, &count)| (count as f64) < self.aggregation_threshold * non_missing as f64)
            .map(|(&name, _)| name.to_owned())
            .collect::<Vec<_>>();
        let bucket_of = |category: &str| {
            if rare.iter().any(|r| r == category) {
                CategoryBucket::Other(rare.clone())
            } else {
                CategoryBucket::Named(category.to_owned())
            }
        };

        // bucket -> (row count, target sum)
        let mut stats = BTreeMap::<CategoryBucket, (usize, f64)>::new();
        for (row, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            let entry = stats.entry(bucket_of(value)).or_default();
            entry.0 += 1;
            entry.1 += target.map_or(0.0, |t| t[row]);
        }

        let prior = target.map(|t| t.iter().sum::<f64>() / t.len().max(1) as f64);
        let mut categories = stats
            .into_iter()
            .map(|(bucket, (count, sum))| {
                let statistic = match prior {
                    Some(prior) => {
                        let mean = sum / count as f64;
                        let exponent = -(count as f64 - self.min_samples_leaf) / self.smoothing;
                        let weight = 1.0 / (1.0 + exponent.exp());
                        prior * (1.0 - weight) + mean * weight
                    }
                    None => count as f64 / non_missing as f64,
                };
                EncodedCategory {
                    bucket,
                    count,
                    statistic,
                    value: statistic,
                }
            })
            .collect::<Vec<_>>();

        categories.sort_by(|a, b| {
            a.statistic
                .total_cmp(&b.statistic)
                .then_with(|| a.bucket.cmp(&b.bucket))
        });
        // Distinct buckets must stay separable by a threshold.
        for i in 1..categories.len() {
            let previous = categories[i - 1].value;
            if categories[i].value <= previous {
                categories[i].value = previous + TIE_STEP;
            }
        }

        let lowest = categories.first().map_or(0.0, |c| c.value);
        let missing_value = missing_sentinel(lowest);
        let has_missing = non_missing < values.len();

        let encoded = values
            .iter()
            .map(|value| match value {
                Some(value) => {
                    let bucket = bucket_of(value);
                    categories
                        .iter()
                        .find(|c| c.bucket == bucket)
                        .map_or(missing_value, |c| c.value)
                }
                None => missing_value,
            })
            .collect();

        EncodedColumn {
            descriptor: ColumnDescriptor {
                name: name.to_owned(),
                kind: EncodedKind::Categorical { categories },
                min_value: lowest,
                missing_value,
                has_missing,
            },
            values: encoded,
        }
    }
}

/// A value strictly below `lowest`: `lowest - 1` where that is representable
/// as a distinct value, a larger step for large magnitudes.
fn missing_sentinel(lowest: f64) -> f64 {
    let sentinel = lowest - 1.0;
    if sentinel < lowest {
        return sentinel;
    }
    let sentinel = lowest - lowest.abs();
    if sentinel < lowest {
        sentinel
    } else {
        f64::NEG_INFINITY
    }
}

fn encode_numerical(name: &str, values: &[Option<f64>]) -> EncodedColumn {
    let lowest = values
        .iter()
        .flatten()
        .copied()
        .min_by(f64::total_cmp)
        .unwrap_or(0.0);
    let missing_value = missing_sentinel(lowest);
    let has_missing = values.iter().any(Option::is_none);
    EncodedColumn {
        descriptor: ColumnDescriptor {
            name: name.to_owned(),
            kind: EncodedKind::Numerical,
            min_value: lowest,
            missing_value,
            has_missing,
        },
        values: values.iter().map(|v| v.unwrap_or(missing_value)).collect(),
    }
}
