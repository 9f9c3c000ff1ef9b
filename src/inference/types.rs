// Value records consumed and produced by the inference core
//
// Every record is built fresh per call from caller-supplied numbers. Bounds
// are checked at construction so that a bad rate or an empty sample surfaces
// as an error at the boundary instead of a NaN further down.

use crate::error::{Result, StatsError};
use serde::{Deserialize, Serialize};

/// Significance level used when the caller does not choose one
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Statistical power used when the caller does not choose one
pub const DEFAULT_POWER: f64 = 0.8;

/// Below this many observations per group the rank-sum normal approximation
/// is flagged with [`SampleWarning::LowSampleSize`]
pub const LOW_SAMPLE_THRESHOLD: usize = 8;

/// Check that `value` lies in the open interval (0, 1)
pub(crate) fn check_open_unit(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(StatsError::invalid(
            name,
            format!("must be in (0, 1), got {}", value),
        ))
    }
}

/// A group's observed conversion rate and the unique-user denominator it was
/// computed over
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProportionSample {
    rate: f64,
    count: u64,
}

impl ProportionSample {
    /// Create a sample, rejecting rates outside [0, 1] and a zero count
    ///
    /// # Example
    /// ```
    /// use funnel_stats::inference::ProportionSample;
    ///
    /// let sample = ProportionSample::new(0.12, 1_000).unwrap();
    /// assert_eq!(sample.count(), 1_000);
    /// assert!(ProportionSample::new(1.5, 10).is_err());
    /// ```
    pub fn new(rate: f64, count: u64) -> Result<Self> {
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(StatsError::invalid(
                "rate",
                format!("must be in [0, 1], got {}", rate),
            ));
        }
        if count == 0 {
            return Err(StatsError::invalid("count", "must be > 0, got 0"));
        }
        Ok(Self { rate, count })
    }

    /// Build a sample from raw counts: `successes / trials`
    pub fn from_counts(successes: u64, trials: u64) -> Result<Self> {
        if trials == 0 {
            return Err(StatsError::invalid("trials", "must be > 0, got 0"));
        }
        if successes > trials {
            return Err(StatsError::invalid(
                "successes",
                format!("{} exceeds trials {}", successes, trials),
            ));
        }
        Self::new(successes as f64 / trials as f64, trials)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Bernoulli variance of one observation, `rate * (1 - rate)`
    pub fn variance(&self) -> f64 {
        self.rate * (1.0 - self.rate)
    }
}

/// Raw per-user measurements (e.g. revenue) for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetric {
    pub group_label: String,
    pub values: Vec<f64>,
}

impl GroupMetric {
    pub fn new(group_label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            group_label: group_label.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(StatsError::invalid(
                "values",
                format!("group `{}` has no observations", self.group_label),
            ));
        }
        if let Some(bad) = self.values.iter().find(|v| !v.is_finite()) {
            return Err(StatsError::invalid(
                "values",
                format!("group `{}` contains non-finite value {}", self.group_label, bad),
            ));
        }
        Ok(())
    }
}

/// Inputs of the two-sample power analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerAnalysisInput {
    /// Variance of the metric estimated on historical data
    pub historical_variance: f64,

    /// Smallest absolute effect the experiment should detect
    pub minimum_detectable_effect: f64,

    /// Two-sided significance level
    pub alpha: f64,

    /// Probability of rejecting a false null hypothesis
    pub power: f64,
}

impl PowerAnalysisInput {
    /// Input with the conventional alpha = 0.05 and power = 0.8
    pub fn new(historical_variance: f64, minimum_detectable_effect: f64) -> Self {
        Self {
            historical_variance,
            minimum_detectable_effect,
            alpha: DEFAULT_ALPHA,
            power: DEFAULT_POWER,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    /// Validate domain constraints
    pub fn validate(&self) -> Result<()> {
        if !self.historical_variance.is_finite() || self.historical_variance < 0.0 {
            return Err(StatsError::invalid(
                "historical_variance",
                format!("must be finite and >= 0, got {}", self.historical_variance),
            ));
        }
        if !self.minimum_detectable_effect.is_finite() || self.minimum_detectable_effect == 0.0 {
            return Err(StatsError::invalid(
                "minimum_detectable_effect",
                format!(
                    "must be finite and non-zero, got {}",
                    self.minimum_detectable_effect
                ),
            ));
        }
        check_open_unit("alpha", self.alpha)?;
        check_open_unit("power", self.power)?;
        Ok(())
    }
}

/// Non-fatal annotation on a test result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleWarning {
    /// The smaller group has fewer than [`LOW_SAMPLE_THRESHOLD`] observations,
    /// so the normal approximation is unreliable
    LowSampleSize { smallest: usize },
}

impl std::fmt::Display for SampleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleWarning::LowSampleSize { smallest } => write!(
                f,
                "low sample size: {} observations (< {}), normal approximation degraded",
                smallest, LOW_SAMPLE_THRESHOLD
            ),
        }
    }
}

/// Outcome of a significance test
///
/// Whether the result is significant depends on an alpha chosen by the
/// caller, see [`TestResult::is_significant`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test-specific statistic (z, U or chi-square)
    pub statistic: f64,

    /// p-value in [0, 1]
    pub p_value: f64,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub warning: Option<SampleWarning>,
}

impl TestResult {
    pub(crate) fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
            warning: None,
        }
    }

    /// `p_value < alpha`
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    pub fn has_low_sample_warning(&self) -> bool {
        matches!(self.warning, Some(SampleWarning::LowSampleSize { .. }))
    }
}
