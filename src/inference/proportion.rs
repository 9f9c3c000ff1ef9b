// Two-proportion z-test for conversion rates
//
// Uses the unpooled standard error:
//   se = sqrt(r1(1-r1)/n1 + r2(1-r2)/n2)
//   z  = (r1 - r2) / se
//   p  = 2 * (1 - Φ(|z|))

use crate::error::{Result, StatsError};
use crate::inference::distributions::two_sided_normal_p;
use crate::inference::types::{ProportionSample, TestResult};

/// Compare the conversion rates of two groups
///
/// Returns the z-statistic (positive when `a` converts better than `b`) and
/// the two-sided p-value. Swapping the arguments negates z and leaves the
/// p-value unchanged.
///
/// # Errors
/// `DegenerateInput` when the standard error is zero, i.e. both rates are 0
/// or 1.
///
/// # Example
/// ```
/// use funnel_stats::inference::{proportions_z_test, ProportionSample};
///
/// let control = ProportionSample::new(0.60, 1_000).unwrap();
/// let treatment = ProportionSample::new(0.66, 1_000).unwrap();
///
/// let result = proportions_z_test(&treatment, &control).unwrap();
/// assert!(result.statistic > 0.0);
/// assert!(result.is_significant(0.05));
/// ```
pub fn proportions_z_test(a: &ProportionSample, b: &ProportionSample) -> Result<TestResult> {
    let se = (a.variance() / a.count() as f64 + b.variance() / b.count() as f64).sqrt();

    if se == 0.0 {
        return Err(StatsError::DegenerateInput(format!(
            "standard error is zero (rates {} and {} have no variance)",
            a.rate(),
            b.rate()
        )));
    }

    let z = (a.rate() - b.rate()) / se;
    let p_value = two_sided_normal_p(z)?;

    Ok(TestResult::new(z, p_value))
}
