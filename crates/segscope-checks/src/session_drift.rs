//! User session length drift between two interaction sets
//!
//! The session length of a user is the number of interactions they have in a
//! split. The check compares the distribution of session lengths in the train
//! and test splits through a [`DriftCalculator`].

use segscope_dataset::{interaction::InteractionSet, sample::ColumnKind};
use segscope_stats::distribution::ks_statistic;
use serde::{Deserialize, Serialize};

use crate::error::CheckError;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DriftError {
    #[display("{side} has {actual} values but at least {required} are required to compute drift")]
    NotEnoughSamples {
        side: &'static str,
        actual: usize,
        required: usize,
    },
    #[display("{method} cannot compute drift of {kind} columns")]
    UnsupportedKind {
        method: &'static str,
        kind: ColumnKind,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftScore {
    pub score: f64,
    pub method: String,
}

/// Computes a drift score between two samples of one column.
pub trait DriftCalculator {
    fn calculate(
        &self,
        train: &[f64],
        test: &[f64],
        kind: ColumnKind,
    ) -> Result<DriftScore, DriftError>;
}

/// Kolmogorov-Smirnov drift for numerical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KsDriftCalculator {
    /// Fewest values either side may have.
    pub min_samples: usize,
}

impl Default for KsDriftCalculator {
    fn default() -> Self {
        Self { min_samples: 10 }
    }
}

impl DriftCalculator for KsDriftCalculator {
    fn calculate(
        &self,
        train: &[f64],
        test: &[f64],
        kind: ColumnKind,
    ) -> Result<DriftScore, DriftError> {
        const METHOD: &str = "Kolmogorov-Smirnov";
        if kind != ColumnKind::Numerical {
            return Err(DriftError::UnsupportedKind {
                method: METHOD,
                kind,
            });
        }
        for (side, values) in [("train", train), ("test", test)] {
            if values.len() < self.min_samples.max(1) {
                return Err(DriftError::NotEnoughSamples {
                    side,
                    actual: values.len(),
                    required: self.min_samples.max(1),
                });
            }
        }
        let score = ks_statistic(train, test).ok_or(DriftError::NotEnoughSamples {
            side: "train or test",
            actual: 0,
            required: 1,
        })?;
        Ok(DriftScore {
            score,
            method: METHOD.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionDriftResult {
    pub drift: DriftScore,
    pub train_users: usize,
    pub test_users: usize,
}

#[derive(Debug, Clone)]
pub struct UserSessionDriftCheck<C = KsDriftCalculator> {
    pub calculator: C,
}

impl Default for UserSessionDriftCheck<KsDriftCalculator> {
    fn default() -> Self {
        Self::new(KsDriftCalculator::default())
    }
}

impl<C> UserSessionDriftCheck<C>
where
    C: DriftCalculator,
{
    #[must_use]
    pub fn new(calculator: C) -> Self {
        Self { calculator }
    }

    #[expect(clippy::cast_precision_loss)]
    pub fn run(
        &self,
        train: &InteractionSet,
        test: &InteractionSet,
    ) -> Result<SessionDriftResult, CheckError> {
        let lengths = |set: &InteractionSet| {
            set.session_lengths()
                .into_iter()
                .map(|len| len as f64)
                .collect::<Vec<_>>()
        };
        let drift = self
            .calculator
            .calculate(&lengths(train), &lengths(test), ColumnKind::Numerical)?;
        Ok(SessionDriftResult {
            drift,
            train_users: train.num_users(),
            test_users: test.num_users(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One interaction set with `users` users, user `u` having `length(u)` interactions.
    fn interactions(users: usize, length: impl Fn(usize) -> usize) -> InteractionSet {
        let ids = (0..users)
            .flat_map(|u| std::iter::repeat_n(format!("user-{u}"), length(u)))
            .collect();
        InteractionSet::new(ids)
    }

    #[test]
    fn test_identical_sessions_have_no_drift() {
        let train = interactions(20, |u| u % 4 + 1);
        let test = interactions(20, |u| u % 4 + 1);
        let result = UserSessionDriftCheck::default().run(&train, &test).unwrap();
        assert_eq!(result.drift.score, 0.0);
        assert_eq!(result.drift.method, "Kolmogorov-Smirnov");
        assert_eq!(result.train_users, 20);
    }

    #[test]
    fn test_longer_sessions_drift() {
        let train = interactions(20, |_| 1);
        let test = interactions(20, |_| 5);
        let result = UserSessionDriftCheck::default().run(&train, &test).unwrap();
        assert_eq!(result.drift.score, 1.0);
    }

    #[test]
    fn test_too_few_users() {
        let train = interactions(20, |_| 1);
        let test = interactions(5, |_| 1);
        let err = UserSessionDriftCheck::default()
            .run(&train, &test)
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("test has 5 values"));
    }

    #[derive(Debug)]
    struct MeanShift;

    impl DriftCalculator for MeanShift {
        fn calculate(
            &self,
            train: &[f64],
            test: &[f64],
            _: ColumnKind,
        ) -> Result<DriftScore, DriftError> {
            #[expect(clippy::cast_precision_loss)]
            let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
            Ok(DriftScore {
                score: (mean(test) - mean(train)).abs(),
                method: "mean shift".to_owned(),
            })
        }
    }

    #[test]
    fn test_custom_calculator() {
        let train = interactions(4, |_| 2);
        let test = interactions(4, |_| 3);
        let result = UserSessionDriftCheck::new(MeanShift).run(&train, &test).unwrap();
        assert_eq!(result.drift.score, 1.0);
        assert_eq!(result.drift.method, "mean shift");
    }
}
