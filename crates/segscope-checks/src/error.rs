use segscope_dataset::{encoding::EncodeError, table::TableError, task::TaskType};
use segscope_scoring::{model::ModelError, scorer::ScoreError};
use segscope_search::segment::SearchError;

use crate::session_drift::DriftError;

/// Failure of a check run.
///
/// Configuration and capability errors are raised before any search work;
/// a processing failure means the run completed without a usable result and
/// may succeed with relaxed settings.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum CheckError {
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("not supported: {_0}")]
    Unsupported(ScoreError),
    #[display("{message}")]
    Processing {
        #[error(not(source))]
        message: String,
    },
    #[display("model failure: {_0}")]
    Model(ModelError),
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ConfigError {
    #[display("n_samples must be greater than zero")]
    ZeroSamples,
    #[display("sample set is empty")]
    EmptySampleSet,
    #[display("{task} tasks are not supported by this check")]
    UnsupportedTask { task: TaskType },
    #[display("sample set has no {what}")]
    MissingData {
        #[error(not(source))]
        what: &'static str,
    },
    #[display("{_0}")]
    #[from]
    Table(TableError),
    #[display("{_0}")]
    #[from]
    Encode(EncodeError),
    #[display("{_0}")]
    #[from]
    Score(ScoreError),
    #[display("{_0}")]
    #[from]
    Search(SearchError),
    #[display("{_0}")]
    #[from]
    Drift(DriftError),
}

impl From<ConfigError> for CheckError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Score(ScoreError::MissingProbabilities) => {
                CheckError::Unsupported(ScoreError::MissingProbabilities)
            }
            ConfigError::Score(ScoreError::Model(err)) => CheckError::Model(err),
            err => CheckError::Config(err),
        }
    }
}

macro_rules! config_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CheckError {
                fn from(err: $ty) -> Self {
                    ConfigError::from(err).into()
                }
            }
        )*
    };
}

config_error_from!(TableError, EncodeError, ScoreError, SearchError, DriftError);

#[cfg(test)]
mod tests {
    use segscope_dataset::sample::ColumnGroup;

    use super::*;

    #[test]
    fn test_score_errors_are_classified() {
        let err = CheckError::from(ScoreError::MissingProbabilities);
        assert!(err.is_unsupported());

        let err = CheckError::from(ScoreError::UnsupportedTask {
            task: TaskType::Regression,
        });
        assert!(err.is_config());

        let err = CheckError::from(ScoreError::Model(ModelError::PredictionCount {
            expected: 2,
            actual: 1,
        }));
        assert!(err.is_model());
    }

    #[test]
    fn test_table_errors_are_config() {
        let err = CheckError::from(TableError::NoUsableColumns {
            group: ColumnGroup::Metadata,
        });
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "invalid configuration: no usable metadata columns remain after filtering"
        );
    }
}
