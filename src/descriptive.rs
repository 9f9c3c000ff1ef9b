// Descriptive statistics for per-user metric samples
//
// Uses trueno::Vector for SIMD mean/variance and aprender's DescriptiveStats
// for the median. Both work on f32: about 7 significant digits, so revenue
// near 1e6 with cent-level spread loses precision in the variance. Values
// beyond f32::MAX are rejected when a data file is loaded.

use anyhow::{Context, Result};
use aprender::stats::DescriptiveStats;
use trueno::Vector;

/// Finite and within f32 range, so narrowing cannot produce `inf`
pub fn is_representable(value: f64) -> bool {
    value.is_finite() && value.abs() <= f32::MAX as f64
}

fn to_vector(values: &[f64]) -> Vector<f32> {
    let narrowed: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    Vector::from_slice(&narrowed)
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        anyhow::bail!("Cannot compute mean of an empty sample");
    }
    let mean = to_vector(values)
        .mean()
        .context("Failed to compute mean")?;
    Ok(mean as f64)
}

/// Sample variance with Bessel's correction (divide by n - 1)
///
/// trueno returns the population variance, which is rescaled by n / (n - 1).
pub fn sample_variance(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        anyhow::bail!(
            "Need at least 2 observations for sample variance, got {}",
            values.len()
        );
    }
    let n = values.len() as f64;
    let population = to_vector(values)
        .variance()
        .context("Failed to compute variance")?;
    Ok(population as f64 * n / (n - 1.0))
}

/// Median via aprender's quantile(0.5)
pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        anyhow::bail!("Cannot compute median of an empty sample");
    }
    let vector = to_vector(values);
    let stats = DescriptiveStats::new(&vector);
    stats
        .quantile(0.5)
        .map(|m| m as f64)
        .map_err(|e| anyhow::anyhow!("Failed to compute median: {}", e))
}
