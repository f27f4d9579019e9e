use anyhow::Context;
use segscope_dataset::{
    sample::{Column, ColumnGroup, SampleSet},
    task::{Label, TaskType},
};
use serde::{Deserialize, Serialize};

/// Sample set document.
///
/// ```json
/// {
///   "task_type": "classification",
///   "labels": ["yes", "no"],
///   "features": [
///     { "kind": "numerical", "name": "amount", "values": [1.5, null] },
///     { "kind": "categorical", "name": "channel", "values": ["web", "store"] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSetFile {
    pub task_type: TaskType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<ColumnFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<ColumnFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<ColumnFile>,
}

/// A named column; `null` cells are missing values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnFile {
    Numerical {
        name: String,
        values: Vec<Option<f64>>,
    },
    Categorical {
        name: String,
        values: Vec<Option<String>>,
    },
}

impl ColumnFile {
    fn len(&self) -> usize {
        match self {
            ColumnFile::Numerical { values, .. } => values.len(),
            ColumnFile::Categorical { values, .. } => values.len(),
        }
    }

    fn into_column(self) -> Column {
        match self {
            ColumnFile::Numerical { name, values } => Column::numerical(name, values),
            ColumnFile::Categorical { name, values } => Column::categorical(name, values),
        }
    }
}

impl SampleSetFile {
    /// Number of samples, taken from the first of labels, texts or columns.
    pub fn num_samples(&self) -> anyhow::Result<usize> {
        self.labels
            .as_ref()
            .map(Vec::len)
            .or_else(|| self.texts.as_ref().map(Vec::len))
            .or_else(|| {
                [&self.features, &self.properties, &self.metadata]
                    .into_iter()
                    .flatten()
                    .map(ColumnFile::len)
                    .next()
            })
            .context("Sample set has no labels, texts or columns")
    }

    pub fn into_sample_set(self) -> anyhow::Result<SampleSet> {
        let len = self.num_samples()?;
        let mut samples = SampleSet::new(self.task_type, len);
        if let Some(labels) = self.labels {
            samples = samples.with_labels(labels).context("Invalid labels")?;
        }
        if let Some(texts) = self.texts {
            samples = samples.with_texts(texts).context("Invalid texts")?;
        }
        for (group, columns) in [
            (ColumnGroup::Features, self.features),
            (ColumnGroup::Properties, self.properties),
            (ColumnGroup::Metadata, self.metadata),
        ] {
            let columns = columns.into_iter().map(ColumnFile::into_column).collect();
            samples = samples
                .with_columns(group, columns)
                .with_context(|| format!("Invalid {group} columns"))?;
        }
        Ok(samples)
    }
}
