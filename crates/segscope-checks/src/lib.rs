//! Model and data checks built on the segscope pipeline
//!
//! # Checks
//!
//! - [`weak_segments::WeakSegmentsCheck`]: sub-populations where the model
//!   scores worst, over features, text properties or metadata
//! - [`conflicting_labels::ConflictingLabelsCheck`]: identical texts carrying
//!   different labels
//! - [`session_drift::UserSessionDriftCheck`]: drift of per-user session
//!   lengths between two interaction sets
//!
//! Every check returns a serializable result value or a [`error::CheckError`].
//! Configuration mistakes and missing model capabilities are reported before
//! any work is done; a run that completes without a usable result is a
//! [`error::CheckError::Processing`] failure, distinct from an empty result.
//!
//! # Example
//!
//! ```
//! use segscope_checks::weak_segments::WeakSegmentsCheck;
//! use segscope_dataset::{
//!     sample::{Column, SampleSet},
//!     task::TaskType,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let n = 100;
//! let samples = SampleSet::new(TaskType::Classification, n)
//!     .with_features(vec![Column::numerical("x", (0..100).map(|i| Some(f64::from(i))))])?;
//! // the model does badly on the upper fifth
//! let scores = (0..100).map(|i| if i >= 80 { -2.0 } else { -0.1 }).collect::<Vec<_>>();
//!
//! let result = WeakSegmentsCheck::features().run(&samples, None, Some(&scores))?;
//! assert_eq!(result.weak_segments[0].size, 20);
//! # Ok(())
//! # }
//! ```

pub mod conflicting_labels;
pub mod error;
pub mod session_drift;
pub mod weak_segments;
