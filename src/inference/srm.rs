// Sample Ratio Mismatch (SRM) check
//
// Chi-square goodness-of-fit of observed group sizes against the intended
// allocation. A mismatch points at a bucketing or logging bug, so this check
// gates every effect-size conclusion.

use crate::error::{Result, StatsError};
use crate::inference::distributions::chi_squared_sf;
use crate::inference::types::TestResult;

/// Intended share of group A for an even split
pub const DEFAULT_EXPECTED_RATIO: f64 = 0.5;

/// Test observed unique-user counts against the expected share of group A
///
/// Returns the chi-square statistic (1 degree of freedom) and its p-value.
/// A small p-value means the split deviates from `expected_ratio_a` by more
/// than chance allows.
///
/// # Errors
/// `InvalidArgument` if both counts are zero or `expected_ratio_a` is not in
/// (0, 1).
///
/// # Example
/// ```
/// use funnel_stats::inference::{check_srm, DEFAULT_EXPECTED_RATIO};
///
/// let balanced = check_srm(500, 500, DEFAULT_EXPECTED_RATIO).unwrap();
/// assert!((balanced.p_value - 1.0).abs() < 1e-9);
///
/// let skewed = check_srm(900, 100, DEFAULT_EXPECTED_RATIO).unwrap();
/// assert!(skewed.p_value < 1e-10);
/// ```
pub fn check_srm(n_a: u64, n_b: u64, expected_ratio_a: f64) -> Result<TestResult> {
    if !expected_ratio_a.is_finite() || expected_ratio_a <= 0.0 || expected_ratio_a >= 1.0 {
        return Err(StatsError::invalid(
            "expected_ratio_a",
            format!("must be in (0, 1), got {}", expected_ratio_a),
        ));
    }

    let total = n_a as f64 + n_b as f64;
    if total == 0.0 {
        return Err(StatsError::invalid(
            "n_a + n_b",
            "total number of users must be > 0",
        ));
    }

    let expected_a = total * expected_ratio_a;
    let expected_b = total * (1.0 - expected_ratio_a);

    let chi2 = [(n_a as f64, expected_a), (n_b as f64, expected_b)]
        .iter()
        .map(|(observed, expected)| (observed - expected).powi(2) / expected)
        .sum::<f64>();

    let p_value = chi_squared_sf(chi2, 1.0)?;

    Ok(TestResult::new(chi2, p_value))
}
