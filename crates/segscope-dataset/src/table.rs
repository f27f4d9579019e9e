//! Selection of the columns a segment search runs over
//!
//! [`FeatureTableBuilder`] turns one column group of a [`SampleSet`] into a
//! [`FeatureTable`]:
//!
//! 1. Apply the allow list (`columns`) or the deny list (`ignore_columns`)
//! 2. Drop degenerate columns (entirely missing, or a single distinct value)
//! 3. If more than `n_top_features` columns remain, keep a seeded random
//!    subset of that size (original column order is preserved)
//!
//! Column kinds come from the declared column type, never from inspecting
//! the values.

use rand::seq::index;
use serde::{Deserialize, Serialize};

use crate::{
    sample::{Column, ColumnGroup, ColumnKind, SampleSet},
    seed::{RngStream, Seed},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("columns and ignore_columns are mutually exclusive; supply only one of them")]
    ConflictingSelection,
    #[display("unknown {group} column(s): {}", names.join(", "))]
    UnknownColumns {
        group: ColumnGroup,
        names: Vec<String>,
    },
    #[display("no usable {group} columns remain after filtering")]
    NoUsableColumns { group: ColumnGroup },
}

/// Allow/deny lists for column selection.
///
/// At most one of the two lists may be supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSelection {
    /// Columns to use. `None` means every column of the group.
    pub columns: Option<Vec<String>>,
    /// Columns to skip.
    pub ignore_columns: Option<Vec<String>>,
}

impl ColumnSelection {
    #[must_use]
    pub fn only<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: Some(columns.into_iter().map(Into::into).collect()),
            ignore_columns: None,
        }
    }

    #[must_use]
    pub fn ignoring<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: None,
            ignore_columns: Some(columns.into_iter().map(Into::into).collect()),
        }
    }

    fn apply<'a>(
        &self,
        group: ColumnGroup,
        available: &'a [Column],
    ) -> Result<Vec<&'a Column>, TableError> {
        let unknown = |names: &[String]| {
            names
                .iter()
                .filter(|name| !available.iter().any(|c| c.name() == name.as_str()))
                .cloned()
                .collect::<Vec<_>>()
        };
        match (&self.columns, &self.ignore_columns) {
            (Some(_), Some(_)) => Err(TableError::ConflictingSelection),
            (Some(columns), None) => {
                let names = unknown(columns);
                if !names.is_empty() {
                    return Err(TableError::UnknownColumns { group, names });
                }
                Ok(available
                    .iter()
                    .filter(|c| columns.iter().any(|name| name == c.name()))
                    .collect())
            }
            (None, Some(ignore)) => {
                let names = unknown(ignore);
                if !names.is_empty() {
                    return Err(TableError::UnknownColumns { group, names });
                }
                Ok(available
                    .iter()
                    .filter(|c| !ignore.iter().any(|name| name == c.name()))
                    .collect())
            }
            (None, None) => Ok(available.iter().collect()),
        }
    }
}

/// The columns selected for one search, with their declared kinds.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    group: ColumnGroup,
    num_rows: usize,
    columns: Vec<Column>,
}

impl FeatureTable {
    #[must_use]
    pub fn group(&self) -> ColumnGroup {
        self.group
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Names of the categorical columns, in column order.
    #[must_use]
    pub fn categorical_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::Categorical)
            .map(Column::name)
            .collect()
    }
}

/// Builds a [`FeatureTable`] from one column group of a sample set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTableBuilder {
    pub selection: ColumnSelection,
    /// Upper bound on the number of columns kept. `None` keeps all.
    pub n_top_features: Option<usize>,
    pub seed: Seed,
}

impl Default for FeatureTableBuilder {
    fn default() -> Self {
        Self {
            selection: ColumnSelection::default(),
            n_top_features: Some(10),
            seed: Seed::default(),
        }
    }
}

impl FeatureTableBuilder {
    /// Selects and filters the columns of `group`.
    ///
    /// # Errors
    ///
    /// - [`TableError::ConflictingSelection`] if both lists are supplied
    /// - [`TableError::UnknownColumns`] if a list names a column the group lacks
    /// - [`TableError::NoUsableColumns`] if no column survives filtering
    pub fn build(
        &self,
        samples: &SampleSet,
        group: ColumnGroup,
    ) -> Result<FeatureTable, TableError> {
        let selected = self.selection.apply(group, samples.columns(group))?;
        let mut usable = selected
            .into_iter()
            .filter(|c| c.distinct_count() > 1)
            .collect::<Vec<_>>();

        if let Some(limit) = self.n_top_features
            && usable.len() > limit
        {
            let mut rng = self.seed.rng(RngStream::ColumnSampling);
            let mut keep = index::sample(&mut rng, usable.len(), limit).into_vec();
            keep.sort_unstable();
            usable = keep.into_iter().map(|i| usable[i]).collect();
        }

        if usable.is_empty() {
            return Err(TableError::NoUsableColumns { group });
        }

        Ok(FeatureTable {
            group,
            num_rows: samples.len(),
            columns: usable.into_iter().cloned().collect(),
        })
    }
}
