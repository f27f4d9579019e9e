//! In-memory sample sets
//!
//! A [`SampleSet`] is an ordered sequence of rows. Every row has a position in
//! the original dataset, an optional label, an optional text and one cell in
//! every column of the three column groups:
//!
//! - **Features**: the columns the model consumes
//! - **Properties**: values derived from the sample text (length, language, ...)
//! - **Metadata**: side-channel information (user age, source, ...)
//!
//! Sample sets are never mutated in place. [`SampleSet::sample`] and
//! [`SampleSet::select`] return new sets that remember the original row
//! positions, so arrays aligned with the full dataset (scores, predictions)
//! can be re-indexed to the subset.

use std::collections::BTreeSet;

use rand::seq::index;
use serde::{Deserialize, Serialize};

use crate::{
    seed::{RngStream, Seed},
    task::{Label, TaskType},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DatasetError {
    #[display("{what} has {actual} entries but the sample set has {expected} rows")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },
    #[display("duplicate {group} column '{name}'")]
    DuplicateColumn { group: ColumnGroup, name: String },
}

/// The column group a search runs over.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum ColumnGroup {
    #[default]
    #[display("features")]
    Features,
    #[display("properties")]
    Properties,
    #[display("metadata")]
    Metadata,
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[display("numerical")]
    Numerical,
    #[display("categorical")]
    Categorical,
}

/// Cell values of a column; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numerical(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    /// Creates a numerical column. NaN cells are treated as missing.
    pub fn numerical<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let values = values
            .into_iter()
            .map(|v| v.filter(|v| !v.is_nan()))
            .collect();
        Self {
            name: name.into(),
            values: ColumnValues::Numerical(values),
        }
    }

    /// Creates a categorical column.
    pub fn categorical<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let values = values.into_iter().map(|v| v.map(Into::into)).collect();
        Self {
            name: name.into(),
            values: ColumnValues::Categorical(values),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self.values {
            ColumnValues::Numerical(_) => ColumnKind::Numerical,
            ColumnValues::Categorical(_) => ColumnKind::Categorical,
        }
    }

    #[must_use]
    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numerical(v) => v.len(),
            ColumnValues::Categorical(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct non-missing values.
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numerical(v) => v
                .iter()
                .flatten()
                .map(|x| x.to_bits())
                .collect::<BTreeSet<_>>()
                .len(),
            ColumnValues::Categorical(v) => v.iter().flatten().collect::<BTreeSet<_>>().len(),
        }
    }

    /// Returns a column holding the cells at `rows`, in that order.
    #[must_use]
    pub fn select(&self, rows: &[usize]) -> Self {
        let values = match &self.values {
            ColumnValues::Numerical(v) => {
                ColumnValues::Numerical(rows.iter().map(|&i| v[i]).collect())
            }
            ColumnValues::Categorical(v) => {
                ColumnValues::Categorical(rows.iter().map(|&i| v[i].clone()).collect())
            }
        };
        Self {
            name: self.name.clone(),
            values,
        }
    }
}

/// An ordered set of samples.
#[derive(Debug, Clone)]
pub struct SampleSet {
    task_type: TaskType,
    positions: Vec<usize>,
    labels: Option<Vec<Label>>,
    texts: Option<Vec<String>>,
    features: Vec<Column>,
    properties: Vec<Column>,
    metadata: Vec<Column>,
}

impl SampleSet {
    /// Creates a sample set of `len` rows with no labels and no columns.
    ///
    /// Rows are numbered `0..len`; these numbers are the original positions
    /// reported by [`Self::positions`].
    #[must_use]
    pub fn new(task_type: TaskType, len: usize) -> Self {
        Self {
            task_type,
            positions: (0..len).collect(),
            labels: None,
            texts: None,
            features: vec![],
            properties: vec![],
            metadata: vec![],
        }
    }

    pub fn with_labels(mut self, labels: Vec<Label>) -> Result<Self, DatasetError> {
        self.check_len("labels", labels.len())?;
        self.labels = Some(labels);
        Ok(self)
    }

    pub fn with_texts(mut self, texts: Vec<String>) -> Result<Self, DatasetError> {
        self.check_len("texts", texts.len())?;
        self.texts = Some(texts);
        Ok(self)
    }

    pub fn with_features(self, columns: Vec<Column>) -> Result<Self, DatasetError> {
        self.with_columns(ColumnGroup::Features, columns)
    }

    pub fn with_properties(self, columns: Vec<Column>) -> Result<Self, DatasetError> {
        self.with_columns(ColumnGroup::Properties, columns)
    }

    pub fn with_metadata(self, columns: Vec<Column>) -> Result<Self, DatasetError> {
        self.with_columns(ColumnGroup::Metadata, columns)
    }

    /// Replaces the columns of `group`.
    pub fn with_columns(
        mut self,
        group: ColumnGroup,
        columns: Vec<Column>,
    ) -> Result<Self, DatasetError> {
        let mut names = BTreeSet::new();
        for column in &columns {
            self.check_len(&format!("{group} column '{}'", column.name), column.len())?;
            if !names.insert(column.name.as_str()) {
                return Err(DatasetError::DuplicateColumn {
                    group,
                    name: column.name.clone(),
                });
            }
        }
        *self.group_mut(group) = columns;
        Ok(self)
    }

    fn check_len(&self, what: &str, actual: usize) -> Result<(), DatasetError> {
        if actual == self.len() {
            Ok(())
        } else {
            Err(DatasetError::LengthMismatch {
                what: what.to_owned(),
                expected: self.len(),
                actual,
            })
        }
    }

    fn group_mut(&mut self, group: ColumnGroup) -> &mut Vec<Column> {
        match group {
            ColumnGroup::Features => &mut self.features,
            ColumnGroup::Properties => &mut self.properties,
            ColumnGroup::Metadata => &mut self.metadata,
        }
    }

    #[must_use]
    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Original row positions of the samples, in row order.
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[must_use]
    pub fn labels(&self) -> Option<&[Label]> {
        self.labels.as_deref()
    }

    #[must_use]
    pub fn texts(&self) -> Option<&[String]> {
        self.texts.as_deref()
    }

    #[must_use]
    pub fn columns(&self, group: ColumnGroup) -> &[Column] {
        match group {
            ColumnGroup::Features => &self.features,
            ColumnGroup::Properties => &self.properties,
            ColumnGroup::Metadata => &self.metadata,
        }
    }

    /// Returns a new sample set holding the rows at `rows` (indices into this set).
    #[must_use]
    pub fn select(&self, rows: &[usize]) -> Self {
        let select_columns =
            |columns: &[Column]| columns.iter().map(|c| c.select(rows)).collect::<Vec<_>>();
        Self {
            task_type: self.task_type,
            positions: rows.iter().map(|&i| self.positions[i]).collect(),
            labels: self
                .labels
                .as_ref()
                .map(|labels| rows.iter().map(|&i| labels[i].clone()).collect()),
            texts: self
                .texts
                .as_ref()
                .map(|texts| rows.iter().map(|&i| texts[i].clone()).collect()),
            features: select_columns(&self.features),
            properties: select_columns(&self.properties),
            metadata: select_columns(&self.metadata),
        }
    }

    /// Draws a seeded subsample of at most `n` rows.
    ///
    /// If the set has `n` rows or fewer it is returned unchanged. Otherwise
    /// exactly `n` rows are drawn without replacement and kept in their
    /// original order.
    #[must_use]
    pub fn sample(&self, n: usize, seed: Seed) -> Self {
        if n >= self.len() {
            return self.clone();
        }
        let mut rng = seed.rng(RngStream::RowSampling);
        let mut rows = index::sample(&mut rng, self.len(), n).into_vec();
        rows.sort_unstable();
        self.select(&rows)
    }
}
