// Statistical inference core for A/B experiments
//
// Four independent, pure functions over plain numeric summaries:
// - proportions_z_test: two-proportion z-test for conversion rates
// - mann_whitney_u: rank-based comparison of per-user metrics (revenue)
// - check_srm: chi-square Sample Ratio Mismatch guard
// - required_sample_size / experiment_duration: power analysis
//
// No I/O, no logging, no configuration. Callers resolve alpha/power policy
// and decide what a p-value means for them; the core only signals invalid
// or degenerate input through StatsError.
//
// Distribution functions (normal CDF/quantile, chi-square survival) come
// from statrs.

mod distributions;
mod power;
mod proportion;
mod rank_sum;
mod srm;
mod types;

pub use power::{experiment_duration, required_sample_size, sample_size_estimate};
pub use proportion::proportions_z_test;
pub use rank_sum::mann_whitney_u;
pub use srm::{check_srm, DEFAULT_EXPECTED_RATIO};
pub use types::{
    GroupMetric, PowerAnalysisInput, ProportionSample, SampleWarning, TestResult, DEFAULT_ALPHA,
    DEFAULT_POWER, LOW_SAMPLE_THRESHOLD,
};
