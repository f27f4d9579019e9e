//! Sample sets and feature preparation for segment analysis
//!
//! This crate holds the data side of the weak-segment pipeline: the in-memory
//! sample set, the selection of the columns a search runs over, and the
//! numeric encoding those columns receive before the search.
//!
//! # Overview
//!
//! 1. **Sample Set** ([`sample::SampleSet`]): rows with labels, optional texts, and three
//!    column groups (features, properties, metadata)
//! 2. **Row Sampling** ([`sample::SampleSet::sample`]): seeded subsample, keeping
//!    original row positions
//! 3. **Feature Table** ([`table::FeatureTableBuilder`]): allow/deny lists, degenerate
//!    column removal, seeded column cap
//! 4. **Encoding** ([`encoding::CategoricalEncoder`]): target encoding with rare-category
//!    aggregation and missing-value sentinels
//!
//! Recommender data (one row per user/item interaction) is modeled separately by
//! [`interaction::InteractionSet`].
//!
//! # Randomness
//!
//! Every random step takes a [`seed::Seed`] explicitly and draws from its own
//! [`seed::RngStream`], so the same seed reproduces the same rows, columns and
//! downstream search results.
//!
//! # Example
//!
//! ```
//! use segscope_dataset::{
//!     encoding::{CategoricalEncoder, EncodingTarget},
//!     sample::{Column, ColumnGroup, SampleSet},
//!     table::FeatureTableBuilder,
//!     task::{Label, TaskType},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let labels = ["a", "b", "a", "b"].map(Label::from).to_vec();
//! let samples = SampleSet::new(TaskType::Classification, 4)
//!     .with_labels(labels)?
//!     .with_metadata(vec![
//!         Column::categorical("source", ["web", "app", "web", "app"].map(Some)),
//!         Column::numerical("age", [Some(21.0), Some(35.0), None, Some(60.0)]),
//!     ])?;
//!
//! let table = FeatureTableBuilder::default().build(&samples, ColumnGroup::Metadata)?;
//! let encoded = CategoricalEncoder::default()
//!     .encode(&table, EncodingTarget::Categorical(samples.labels().unwrap()))?;
//! assert_eq!(encoded.num_columns(), 2);
//! assert_eq!(encoded.num_rows(), 4);
//! # Ok(())
//! # }
//! ```

pub mod encoding;
pub mod interaction;
pub mod sample;
pub mod seed;
pub mod table;
pub mod task;
