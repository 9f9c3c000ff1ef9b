// Mann-Whitney U (Wilcoxon rank-sum) test for per-user metrics
//
// Revenue per user is heavily skewed and zero-inflated, so group means are
// compared without a normality assumption:
//
// 1. Pool both samples and rank them, ties get the average rank
// 2. U_a = R_a - n_a(n_a+1)/2
// 3. z = (|U_a - n_a n_b / 2| - 0.5) / σ, with the tie-corrected
//    σ² = n_a n_b / 12 * ((N+1) - Σ(t³ - t) / (N(N-1)))
// 4. p = 2 * (1 - Φ(z))
//
// Reference: Mann & Whitney (1947), Annals of Mathematical Statistics 18(1).

use crate::error::Result;
use crate::inference::distributions::two_sided_normal_p;
use crate::inference::types::{GroupMetric, SampleWarning, TestResult, LOW_SAMPLE_THRESHOLD};

/// Continuity correction applied to |U - μ|
const CONTINUITY_CORRECTION: f64 = 0.5;

/// Two-sided Mann-Whitney U test comparing two groups
///
/// The returned statistic is U for group `a`. Samples of unequal size are
/// fine. When either group has fewer than 8 observations the p-value is still
/// computed but the result carries [`SampleWarning::LowSampleSize`].
///
/// # Errors
/// `InvalidArgument` if either group is empty or holds a non-finite value.
///
/// # Example
/// ```
/// use funnel_stats::inference::{mann_whitney_u, GroupMetric};
///
/// let a = GroupMetric::new("A", vec![10.0; 20]);
/// let b = GroupMetric::new("B", vec![100.0; 20]);
///
/// let result = mann_whitney_u(&a, &b).unwrap();
/// assert!(result.p_value < 1e-6);
/// assert!(result.warning.is_none());
/// ```
pub fn mann_whitney_u(a: &GroupMetric, b: &GroupMetric) -> Result<TestResult> {
    a.validate()?;
    b.validate()?;

    let n_a = a.len() as f64;
    let n_b = b.len() as f64;
    let n = n_a + n_b;

    let mut pooled: Vec<(f64, bool)> = Vec::with_capacity(a.len() + b.len());
    pooled.extend(a.values.iter().map(|&v| (v, true)));
    pooled.extend(b.values.iter().map(|&v| (v, false)));
    pooled.sort_by(|x, y| x.0.total_cmp(&y.0));

    let (ranks, tie_term) = average_ranks(&pooled);

    let rank_sum_a: f64 = pooled
        .iter()
        .zip(&ranks)
        .filter(|((_, in_a), _)| *in_a)
        .map(|(_, &rank)| rank)
        .sum();

    let u_a = rank_sum_a - n_a * (n_a + 1.0) / 2.0;
    let mu = n_a * n_b / 2.0;
    let sigma_sq = n_a * n_b / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    let p_value = if sigma_sq > 0.0 {
        let z = ((u_a - mu).abs() - CONTINUITY_CORRECTION).max(0.0) / sigma_sq.sqrt();
        two_sided_normal_p(z)?
    } else {
        // Every pooled observation is identical: ranks carry no information
        1.0
    };

    let mut result = TestResult::new(u_a, p_value);
    let smallest = a.len().min(b.len());
    if smallest < LOW_SAMPLE_THRESHOLD {
        result.warning = Some(SampleWarning::LowSampleSize { smallest });
    }

    Ok(result)
}

/// Average ranks (1-based) of sorted pooled values, plus the tie term Σ(t³ - t)
fn average_ranks(sorted: &[(f64, bool)]) -> (Vec<f64>, f64) {
    let n = sorted.len();
    let mut ranks = vec![0.0; n];
    let mut tie_term = 0.0;

    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && sorted[j].0 == sorted[i].0 {
            j += 1;
        }
        // positions i..j share ranks i+1..=j
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for rank in &mut ranks[i..j] {
            *rank = avg_rank;
        }
        let t = (j - i) as f64;
        tie_term += t * t * t - t;
        i = j;
    }

    (ranks, tie_term)
}
