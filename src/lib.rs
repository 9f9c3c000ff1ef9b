//! Funnel-stats - statistical inference for e-commerce A/B experiments
//!
//! This library provides the hypothesis tests and power analysis used to
//! validate an experiment split and to read its outcome:
//!
//! - two-proportion z-test for conversion rates
//! - Mann-Whitney U rank-sum test for revenue per user
//! - chi-square Sample Ratio Mismatch check
//! - sample-size and duration calculator
//!
//! The [`inference`] module is pure and synchronous. The remaining modules
//! load funnel data, apply an [`config::AnalysisConfig`] policy, and render
//! reports for the command line.

pub mod cli;
pub mod config;
pub mod csv_output;
pub mod dataset;
pub mod descriptive;
pub mod error;
pub mod funnel;
pub mod inference;
pub mod json_output;
pub mod sizing;
pub mod verdict;

pub use error::StatsError;
