//! Per-sample performance scores for segment analysis
//!
//! The weak-segment search needs one score per sample, where a higher score
//! means the model did better on that sample. This crate produces those
//! scores and the aggregate score a segment is judged by.
//!
//! # Score Sources
//!
//! Exactly one source is used per run:
//!
//! - **Provided scores**: a caller-supplied array aligned with the original
//!   dataset; it is re-indexed to the sampled rows and used as is.
//! - **Model scores**: the model's class probabilities are turned into negative
//!   cross-entropy per sample. Only classification tasks can be scored this
//!   way, and only by models exposing probability output.
//!
//! # Model Capabilities
//!
//! Models are accessed through [`model::Model`] (class predictions). Probability
//! output is an optional capability reached through
//! [`model::Model::as_probabilistic`]; its absence is reported as
//! [`scorer::ScoreError::MissingProbabilities`] before any prediction is made.
//!
//! # Aggregation
//!
//! [`scorer::SampleScores::segment_score`] aggregates a subset of rows either
//! as the mean per-sample score or, when an alternative
//! [`metric::Metric`] was requested, as that metric over the subset's
//! predictions.
//!
//! # Example
//!
//! ```
//! use segscope_dataset::{sample::SampleSet, task::TaskType};
//! use segscope_scoring::scorer::PerSampleScorer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let samples = SampleSet::new(TaskType::Classification, 4);
//! let provided = [0.5, -0.25, 1.0, 0.0];
//! let scores = PerSampleScorer::default().score(&samples, None, Some(&provided))?;
//! assert_eq!(scores.average(), 0.313);
//! # Ok(())
//! # }
//! ```

pub mod metric;
pub mod model;
pub mod scorer;
