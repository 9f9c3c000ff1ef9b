// Distribution functions backed by statrs
//
// Thin adapters so the test modules never touch statrs directly and backend
// errors become StatsError::Numeric.

use crate::error::{Result, StatsError};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| StatsError::Numeric(e.to_string()))
}

/// Two-sided p-value of a standard normal statistic, `2 * (1 - Φ(|z|))`
///
/// Evaluated as `2 * Φ(-|z|)` so large |z| does not cancel to zero early.
pub(crate) fn two_sided_normal_p(z: f64) -> Result<f64> {
    let normal = standard_normal()?;
    Ok((2.0 * normal.cdf(-z.abs())).clamp(0.0, 1.0))
}

/// Standard normal quantile `Φ⁻¹(p)`
pub(crate) fn normal_quantile(p: f64) -> Result<f64> {
    Ok(standard_normal()?.inverse_cdf(p))
}

/// Chi-square survival function `P(X > x)` with `dof` degrees of freedom
pub(crate) fn chi_squared_sf(x: f64, dof: f64) -> Result<f64> {
    let dist = ChiSquared::new(dof).map_err(|e| StatsError::Numeric(e.to_string()))?;
    Ok(dist.sf(x).clamp(0.0, 1.0))
}
