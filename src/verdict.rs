// Experiment verdicts built on the inference core
//
// Two checks, mirroring how an experiment is run:
// - A/A validation on history: groups must be balanced (SRM) and must not
//   already differ in conversion before the treatment ships
// - A/B analysis on the test period: SRM first, then effect tests on CR1,
//   CR2 (z-test) and revenue per user (rank-sum)
//
// The SRM result is always computed and reported first. An SRM verdict
// overrides any effect conclusion because the split itself is not trusted.

use crate::config::AnalysisConfig;
use crate::funnel::GroupFunnel;
use crate::inference::{
    check_srm, mann_whitney_u, proportions_z_test, ProportionSample, TestResult,
};
use anyhow::Result;
use serde::Serialize;

/// Outcome of one metric comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricOutcome {
    /// The test ran
    Tested { result: TestResult, significant: bool },
    /// The statistic is undefined (e.g. no conversions in either group);
    /// treated as "no measurable difference"
    Degenerate { reason: String },
    /// The metric could not be tested with the available data
    Skipped { reason: String },
}

impl MetricOutcome {
    pub fn is_significant(&self) -> bool {
        matches!(self, MetricOutcome::Tested { significant: true, .. })
    }
}

/// A named metric and its comparison outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTest {
    pub metric: String,
    pub outcome: MetricOutcome,
}

fn conversion_test(
    metric: &str,
    control: Result<ProportionSample>,
    treatment: Result<ProportionSample>,
    alpha: f64,
) -> MetricTest {
    let outcome = match (control, treatment) {
        (Ok(a), Ok(b)) => match proportions_z_test(&b, &a) {
            Ok(result) => MetricOutcome::Tested {
                significant: result.is_significant(alpha),
                result,
            },
            Err(e) if e.is_degenerate() => {
                tracing::warn!("{} z-test is degenerate: {}", metric, e);
                MetricOutcome::Degenerate {
                    reason: e.to_string(),
                }
            }
            Err(e) => MetricOutcome::Skipped {
                reason: e.to_string(),
            },
        },
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!("Skipping {}: {:#}", metric, e);
            MetricOutcome::Skipped {
                reason: format!("{:#}", e),
            }
        }
    };

    MetricTest {
        metric: metric.to_string(),
        outcome,
    }
}

fn revenue_test(control: &GroupFunnel, treatment: &GroupFunnel, alpha: f64) -> MetricTest {
    let outcome = match (control.revenue_metric(), treatment.revenue_metric()) {
        (Some(a), Some(b)) => match mann_whitney_u(&b, &a) {
            Ok(result) => {
                if let Some(warning) = result.warning {
                    tracing::warn!("Revenue rank-sum test: {}", warning);
                }
                MetricOutcome::Tested {
                    significant: result.is_significant(alpha),
                    result,
                }
            }
            Err(e) => MetricOutcome::Skipped {
                reason: e.to_string(),
            },
        },
        _ => MetricOutcome::Skipped {
            reason: "revenue_per_user not collected for both groups".to_string(),
        },
    };

    MetricTest {
        metric: "revenue_per_user".to_string(),
        outcome,
    }
}

/// SRM check on unique viewers
fn srm_check(
    control: &GroupFunnel,
    treatment: &GroupFunnel,
    config: &AnalysisConfig,
) -> Result<(TestResult, bool)> {
    let srm = check_srm(control.view, treatment.view, config.expected_ratio_a)?;
    let mismatch = srm.p_value <= config.srm_alpha;
    if mismatch {
        tracing::warn!(
            "SRM detected: {} vs {} viewers (p={:.4})",
            control.view,
            treatment.view,
            srm.p_value
        );
    }
    Ok((srm, mismatch))
}

// ---------------------------------------------------------------------------
// A/A validation
// ---------------------------------------------------------------------------

/// Verdict of an A/A validation on history data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ValidationVerdict {
    /// Groups are balanced and indistinguishable
    Passed,
    /// Observed split deviates from the intended allocation
    SampleRatioMismatch,
    /// Groups already differ before treatment: re-sample
    GroupsDiffer { metrics: Vec<String> },
}

/// Detailed A/A validation result
#[derive(Debug, Clone, Serialize)]
pub struct ValidationAssessment {
    pub verdict: ValidationVerdict,
    pub control: String,
    pub treatment: String,
    pub srm: TestResult,
    pub tests: Vec<MetricTest>,
    pub config: AnalysisConfig,
}

impl ValidationAssessment {
    pub fn passed(&self) -> bool {
        self.verdict == ValidationVerdict::Passed
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        match &self.verdict {
            ValidationVerdict::Passed => {
                report.push_str("✅ A/A TEST PASSED\n\n");
                report.push_str(&format!(
                    "Groups {} and {} show no significant difference on history data.\n",
                    self.control, self.treatment
                ));
            }
            ValidationVerdict::SampleRatioMismatch => {
                report.push_str("❌ SRM DETECTED, check assignment for bugs\n\n");
            }
            ValidationVerdict::GroupsDiffer { metrics } => {
                report.push_str("❌ A/A TEST FAILED, re-sample groups\n\n");
                report.push_str(&format!("Differing metrics: {}\n", metrics.join(", ")));
            }
        }

        push_srm_section(&mut report, &self.srm, self.config.srm_alpha);
        push_tests_section(&mut report, &self.tests, self.config.alpha);
        report
    }
}

/// Run an A/A check: SRM on viewers and a CR2 z-test that must NOT be significant
pub fn validate_split(
    control: &GroupFunnel,
    treatment: &GroupFunnel,
    config: &AnalysisConfig,
) -> Result<ValidationAssessment> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let (srm, mismatch) = srm_check(control, treatment, config)?;

    let tests = vec![conversion_test(
        "cr2",
        control.checkout_conversion(),
        treatment.checkout_conversion(),
        config.alpha,
    )];

    let differing: Vec<String> = tests
        .iter()
        .filter(|t| t.outcome.is_significant())
        .map(|t| t.metric.clone())
        .collect();

    let verdict = if mismatch {
        ValidationVerdict::SampleRatioMismatch
    } else if !differing.is_empty() {
        ValidationVerdict::GroupsDiffer { metrics: differing }
    } else {
        ValidationVerdict::Passed
    };

    tracing::info!("A/A validation {} vs {}: {:?}", control.label, treatment.label, verdict);

    Ok(ValidationAssessment {
        verdict,
        control: control.label.clone(),
        treatment: treatment.label.clone(),
        srm,
        tests,
        config: config.clone(),
    })
}

// ---------------------------------------------------------------------------
// A/B analysis
// ---------------------------------------------------------------------------

/// Verdict of an A/B analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ExperimentVerdict {
    /// Split is broken; effect tests must not be trusted
    SampleRatioMismatch,
    /// At least one metric differs significantly
    Significant { metrics: Vec<String> },
    /// Null hypothesis cannot be rejected for any metric
    NotSignificant,
}

/// Detailed A/B analysis result
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentAssessment {
    pub verdict: ExperimentVerdict,
    pub control: String,
    pub treatment: String,
    pub srm: TestResult,
    pub tests: Vec<MetricTest>,
    pub config: AnalysisConfig,
}

impl ExperimentAssessment {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        match &self.verdict {
            ExperimentVerdict::SampleRatioMismatch => {
                report.push_str("⚠️  SRM DETECTED, effect tests are not trustworthy\n\n");
            }
            ExperimentVerdict::Significant { metrics } => {
                report.push_str(&format!(
                    "✅ SIGNIFICANT DIFFERENCE ({} metrics)\n\n",
                    metrics.len()
                ));
                report.push_str(&format!("Significant metrics: {}\n", metrics.join(", ")));
            }
            ExperimentVerdict::NotSignificant => {
                report.push_str("❌ NO SIGNIFICANT DIFFERENCE\n\n");
                report.push_str("Null hypothesis can NOT be rejected.\n");
            }
        }

        report.push_str(&format!(
            "Control: {}, treatment: {}\n",
            self.control, self.treatment
        ));
        push_srm_section(&mut report, &self.srm, self.config.srm_alpha);
        push_tests_section(&mut report, &self.tests, self.config.alpha);
        report
    }
}

/// Analyse an A/B test: SRM guard, then CR1, CR2 and revenue per user
///
/// # Example
/// ```
/// use funnel_stats::config::AnalysisConfig;
/// use funnel_stats::funnel::GroupFunnel;
/// use funnel_stats::verdict::{assess_experiment, ExperimentVerdict};
///
/// let control = GroupFunnel::new("A", 5000, 1000, 600);
/// let treatment = GroupFunnel::new("B", 5000, 1000, 690);
///
/// let assessment = assess_experiment(&control, &treatment, &AnalysisConfig::default()).unwrap();
/// assert!(matches!(assessment.verdict, ExperimentVerdict::Significant { .. }));
/// ```
pub fn assess_experiment(
    control: &GroupFunnel,
    treatment: &GroupFunnel,
    config: &AnalysisConfig,
) -> Result<ExperimentAssessment> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    // Step 1: data-quality guard
    let (srm, mismatch) = srm_check(control, treatment, config)?;

    // Step 2: effect tests, reported regardless of SRM
    let tests = vec![
        conversion_test(
            "cr1",
            control.view_conversion(),
            treatment.view_conversion(),
            config.alpha,
        ),
        conversion_test(
            "cr2",
            control.checkout_conversion(),
            treatment.checkout_conversion(),
            config.alpha,
        ),
        revenue_test(control, treatment, config.alpha),
    ];

    // Step 3: verdict
    let significant: Vec<String> = tests
        .iter()
        .filter(|t| t.outcome.is_significant())
        .map(|t| t.metric.clone())
        .collect();

    let verdict = if mismatch {
        ExperimentVerdict::SampleRatioMismatch
    } else if significant.is_empty() {
        ExperimentVerdict::NotSignificant
    } else {
        ExperimentVerdict::Significant {
            metrics: significant,
        }
    };

    tracing::info!("A/B analysis {} vs {}: {:?}", control.label, treatment.label, verdict);

    Ok(ExperimentAssessment {
        verdict,
        control: control.label.clone(),
        treatment: treatment.label.clone(),
        srm,
        tests,
        config: config.clone(),
    })
}

fn push_srm_section(report: &mut String, srm: &TestResult, srm_alpha: f64) {
    report.push_str("\n🔍 Sample Ratio Mismatch:\n");
    report.push_str(&format!(
        "  chi2={:.4}, p={:.4} (threshold {})\n",
        srm.statistic, srm.p_value, srm_alpha
    ));
}

fn push_tests_section(report: &mut String, tests: &[MetricTest], alpha: f64) {
    report.push_str(&format!(
        "\n📊 Statistical Tests (alpha={}, {}% confidence):\n",
        alpha,
        (1.0 - alpha) * 100.0
    ));
    for test in tests {
        match &test.outcome {
            MetricOutcome::Tested {
                result,
                significant,
            } => {
                report.push_str(&format!(
                    "  {} (statistic={:.4}, p={:.4}){}\n",
                    test.metric,
                    result.statistic,
                    result.p_value,
                    if *significant { " *" } else { "" }
                ));
                if let Some(warning) = result.warning {
                    report.push_str(&format!("    ⚠️  {}\n", warning));
                }
            }
            MetricOutcome::Degenerate { reason } => {
                report.push_str(&format!("  {} (no measurable difference: {})\n", test.metric, reason));
            }
            MetricOutcome::Skipped { reason } => {
                report.push_str(&format!("  {} (skipped: {})\n", test.metric, reason));
            }
        }
    }
}
