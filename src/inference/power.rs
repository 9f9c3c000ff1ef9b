// Minimum sample size for a two-sample comparison of means
//
//   z_alpha = Φ⁻¹(1 - alpha/2)
//   z_beta  = Φ⁻¹(power)
//   n       = 2 σ² (z_alpha + z_beta)² / MDE²
//
// The result is per group. Duration is a separate function so that the power
// formula never depends on traffic data.

use crate::error::{Result, StatsError};
use crate::inference::distributions::normal_quantile;
use crate::inference::types::PowerAnalysisInput;

/// Unrounded per-group sample size
///
/// Strictly increasing in the variance and strictly decreasing in |MDE| for a
/// positive variance. Prefer [`required_sample_size`] unless the fractional
/// value is needed.
pub fn sample_size_estimate(input: &PowerAnalysisInput) -> Result<f64> {
    input.validate()?;

    let z_alpha = normal_quantile(1.0 - input.alpha / 2.0)?;
    let z_beta = normal_quantile(input.power)?;

    let n = 2.0 * input.historical_variance * (z_alpha + z_beta).powi(2)
        / input.minimum_detectable_effect.powi(2);

    if !n.is_finite() {
        return Err(StatsError::invalid(
            "minimum_detectable_effect",
            format!(
                "{} is too small: required sample size overflows",
                input.minimum_detectable_effect
            ),
        ));
    }

    Ok(n)
}

/// Required per-group sample size, rounded up and never below 1
///
/// # Example
/// ```
/// use funnel_stats::inference::{required_sample_size, PowerAnalysisInput};
///
/// // variance 25, MDE 1, alpha 0.05, power 0.8
/// let n = required_sample_size(&PowerAnalysisInput::new(25.0, 1.0)).unwrap();
/// assert_eq!(n, 393);
/// ```
pub fn required_sample_size(input: &PowerAnalysisInput) -> Result<u64> {
    let n = sample_size_estimate(input)?.ceil();

    if n > u64::MAX as f64 {
        return Err(StatsError::invalid(
            "minimum_detectable_effect",
            format!(
                "{} is too small: required sample size exceeds u64",
                input.minimum_detectable_effect
            ),
        ));
    }

    Ok((n as u64).max(1))
}

/// Expected experiment duration in the time unit of `mean_traffic_per_unit`
///
/// Both groups need `sample_size` users, so the total is `2 * sample_size`
/// divided by the traffic observed per time unit.
pub fn experiment_duration(sample_size: u64, mean_traffic_per_unit: f64) -> Result<f64> {
    if sample_size == 0 {
        return Err(StatsError::invalid("sample_size", "must be > 0, got 0"));
    }
    if !mean_traffic_per_unit.is_finite() || mean_traffic_per_unit <= 0.0 {
        return Err(StatsError::invalid(
            "mean_traffic_per_unit",
            format!("must be finite and > 0, got {}", mean_traffic_per_unit),
        ));
    }

    Ok(2.0 * sample_size as f64 / mean_traffic_per_unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        let input = PowerAnalysisInput::new(25.0, 1.0);
        let estimate = sample_size_estimate(&input).unwrap();
        // 2 * 25 * (1.959964 + 0.841621)^2 = 392.44
        assert!((estimate - 392.44).abs() < 0.01, "n = {}", estimate);
        assert_eq!(required_sample_size(&input).unwrap(), 393);
    }

    #[test]
    fn test_negative_mde_same_as_positive() {
        let up = required_sample_size(&PowerAnalysisInput::new(4.0, 0.5)).unwrap();
        let down = required_sample_size(&PowerAnalysisInput::new(4.0, -0.5)).unwrap();
        assert_eq!(up, down);
    }

    #[test]
    fn test_zero_variance_needs_one_user() {
        let n = required_sample_size(&PowerAnalysisInput::new(0.0, 1.0)).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_stricter_alpha_and_power_need_more_users() {
        let base = required_sample_size(&PowerAnalysisInput::new(25.0, 1.0)).unwrap();
        let strict_alpha =
            required_sample_size(&PowerAnalysisInput::new(25.0, 1.0).with_alpha(0.01)).unwrap();
        let high_power =
            required_sample_size(&PowerAnalysisInput::new(25.0, 1.0).with_power(0.9)).unwrap();
        assert!(strict_alpha > base);
        assert!(high_power > base);
    }

    #[test]
    fn test_conversion_rate_sizing() {
        // CR 0.6 with a 5% relative MDE: variance 0.24, MDE 0.03
        let n = required_sample_size(&PowerAnalysisInput::new(0.24, 0.03)).unwrap();
        // 0.48 * 7.848879 / 0.0009 = 4186.07
        assert_eq!(n, 4187);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(required_sample_size(&PowerAnalysisInput::new(25.0, 0.0))
            .unwrap_err()
            .is_invalid_argument());
        assert!(required_sample_size(&PowerAnalysisInput::new(-1.0, 1.0))
            .unwrap_err()
            .is_invalid_argument());
        assert!(
            required_sample_size(&PowerAnalysisInput::new(25.0, 1.0).with_alpha(0.0))
                .unwrap_err()
                .is_invalid_argument()
        );
        assert!(
            required_sample_size(&PowerAnalysisInput::new(25.0, 1.0).with_power(1.0))
                .unwrap_err()
                .is_invalid_argument()
        );
    }

    #[test]
    fn test_tiny_mde_overflow_rejected() {
        let err = required_sample_size(&PowerAnalysisInput::new(1e300, 1e-300)).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_duration() {
        assert_eq!(experiment_duration(393, 786.0).unwrap(), 1.0);
        assert_eq!(experiment_duration(1000, 500.0).unwrap(), 4.0);
    }

    #[test]
    fn test_duration_invalid() {
        assert!(experiment_duration(0, 100.0).is_err());
        assert!(experiment_duration(10, 0.0).is_err());
        assert!(experiment_duration(10, -5.0).is_err());
        assert!(experiment_duration(10, f64::NAN).is_err());
    }
}
