//! Statistical utilities shared by the segscope crates.
//!
//! This crate provides the small set of numeric routines the checks rely on:
//!
//! - **Descriptive statistics**: mean, median, variance, standard deviation
//! - **Rounding**: fixed-decimal rounding used for reported scores
//! - **Distribution comparison**: two-sample Kolmogorov-Smirnov statistic
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`distribution`]: Empirical distribution comparison between two samples
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use segscope_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Rounding a reported score
//!
//! ```
//! use segscope_stats::descriptive::round_to;
//!
//! assert_eq!(round_to(0.12345, 3), 0.123);
//! ```
//!
//! ## Comparing two distributions
//!
//! ```
//! use segscope_stats::distribution::ks_statistic;
//!
//! let train = [1.0, 2.0, 3.0, 4.0];
//! let test = [1.0, 2.0, 3.0, 4.0];
//! assert_eq!(ks_statistic(&train, &test), Some(0.0));
//! ```

pub mod descriptive;
pub mod distribution;
