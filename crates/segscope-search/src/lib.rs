//! Weak segment search over encoded feature tables
//!
//! Finding the sub-populations where a model underperforms is turned into
//! reading off the leaves of small regression trees trained to predict the
//! per-sample score. Each tree sees one pair of columns, so every leaf is a
//! conjunction of at most two range predicates.
//!
//! # Pipeline
//!
//! 1. **Members** ([`ensemble::select_members`]): column pairs in feature-rank
//!    order, sampled with rank-based weights when there are too many
//! 2. **Trees** ([`tree::RegressionTree`]): squared-error trees whose leaves
//!    all hold at least the minimum segment size, trained in parallel
//! 3. **Segments** ([`segment::SegmentSearch::search`]): leaves scored,
//!    ranked by weakness then size, and deduplicated by row overlap
//!
//! The result depends only on the inputs and the [`Seed`](segscope_dataset::seed::Seed)
//! in [`segment::SegmentSearch`]; thread scheduling never affects it.

pub mod ensemble;
pub mod segment;
pub mod tree;
