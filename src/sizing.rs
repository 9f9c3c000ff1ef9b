//! Sample-size planning from historical baselines
//!
//! For each metric the historical mean and variance are averaged over the
//! periods listed in the data file, the MDE is taken as a fraction of the
//! mean, and the power calculator gives the users needed per group:
//!
//! | metric | per-period variance                  | MDE                        |
//! |--------|--------------------------------------|----------------------------|
//! | ARPU   | sample variance of revenue per user  | `arpu_relative_mde * mean` |
//! | CR1    | `cr * (1 - cr)`, cr = purchase/view  | `cr_relative_mde * mean`   |
//! | CR2    | `cr * (1 - cr)`, cr = purchase/checkout | `cr_relative_mde * mean` |
//!
//! Duration is expressed in periods: `2 * size / mean views per period`.

use crate::config::AnalysisConfig;
use crate::dataset::HistoricalPeriod;
use crate::descriptive;
use crate::inference::{experiment_duration, required_sample_size, PowerAnalysisInput};
use anyhow::{Context, Result};
use serde::Serialize;

/// Sizing of one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSizing {
    pub metric: String,
    pub history_mean: f64,
    pub history_var: f64,
    /// Absolute minimum detectable effect
    pub mde: f64,
    /// Users required per group
    pub size: u64,
    /// Expected duration in periods
    pub num_periods: f64,
}

/// Sizing of every metric the history supports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingPlan {
    pub periods: usize,
    pub mean_views: f64,
    pub metrics: Vec<MetricSizing>,
}

impl SizingPlan {
    pub fn metric(&self, name: &str) -> Option<&MetricSizing> {
        self.metrics.iter().find(|m| m.metric == name)
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "📐 SAMPLE SIZE PLAN ({} periods, {:.1} views per period)\n\n",
            self.periods, self.mean_views
        ));
        report.push_str(&format!(
            "{:<8} {:>14} {:>16} {:>12} {:>10} {:>10}\n",
            "metric", "history_mean", "history_var", "mde", "size", "periods"
        ));
        for m in &self.metrics {
            report.push_str(&format!(
                "{:<8} {:>14.4} {:>16.6} {:>12.6} {:>10} {:>10.2}\n",
                m.metric, m.history_mean, m.history_var, m.mde, m.size, m.num_periods
            ));
        }
        report
    }
}

/// (mean, variance) averaged over periods
fn averaged(baselines: &[(f64, f64)]) -> (f64, f64) {
    let n = baselines.len() as f64;
    let mean = baselines.iter().map(|(m, _)| m).sum::<f64>() / n;
    let var = baselines.iter().map(|(_, v)| v).sum::<f64>() / n;
    (mean, var)
}

fn size_metric(
    metric: &str,
    baselines: &[(f64, f64)],
    relative_mde: f64,
    mean_views: f64,
    config: &AnalysisConfig,
) -> Result<MetricSizing> {
    let (history_mean, history_var) = averaged(baselines);
    let mde = relative_mde * history_mean;

    let input = PowerAnalysisInput::new(history_var, mde)
        .with_alpha(config.alpha)
        .with_power(config.power);
    let size = required_sample_size(&input)
        .with_context(|| format!("Failed to size {} (history mean {})", metric, history_mean))?;
    let num_periods = experiment_duration(size, mean_views)
        .with_context(|| format!("Failed to compute duration for {}", metric))?;

    tracing::debug!(
        "{}: mean={:.6} var={:.6} mde={:.6} size={} periods={:.2}",
        metric,
        history_mean,
        history_var,
        mde,
        size,
        num_periods
    );

    Ok(MetricSizing {
        metric: metric.to_string(),
        history_mean,
        history_var,
        mde,
        size,
        num_periods,
    })
}

fn conversion_baselines(
    history: &[HistoricalPeriod],
    denominator: impl Fn(&HistoricalPeriod) -> u64,
    metric: &str,
) -> Vec<(f64, f64)> {
    history
        .iter()
        .filter_map(|p| {
            let d = denominator(p);
            if d == 0 {
                tracing::warn!("{}: period `{}` has a zero denominator, skipped", metric, p.period);
                return None;
            }
            let cr = p.purchase as f64 / d as f64;
            Some((cr, cr * (1.0 - cr)))
        })
        .collect()
}

fn revenue_baselines(history: &[HistoricalPeriod]) -> Result<Vec<(f64, f64)>> {
    let mut baselines = Vec::new();
    for period in history {
        if period.revenue_per_user.len() < 2 {
            tracing::warn!(
                "arpu: period `{}` has {} revenue observations, skipped",
                period.period,
                period.revenue_per_user.len()
            );
            continue;
        }
        let mean = descriptive::mean(&period.revenue_per_user)
            .with_context(|| format!("Revenue mean of period `{}`", period.period))?;
        let var = descriptive::sample_variance(&period.revenue_per_user)
            .with_context(|| format!("Revenue variance of period `{}`", period.period))?;
        baselines.push((mean, var));
    }
    Ok(baselines)
}

/// Size ARPU, CR1 and CR2 from historical periods
///
/// Metrics without usable history (no revenue data, all denominators zero)
/// are left out of the plan.
pub fn plan_sample_sizes(
    history: &[HistoricalPeriod],
    config: &AnalysisConfig,
) -> Result<SizingPlan> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    if history.is_empty() {
        anyhow::bail!("Cannot plan sample sizes without historical periods");
    }

    let mean_views = history.iter().map(|p| p.view as f64).sum::<f64>() / history.len() as f64;

    let candidates = [
        ("arpu", revenue_baselines(history)?, config.arpu_relative_mde),
        (
            "cr1",
            conversion_baselines(history, |p| p.view, "cr1"),
            config.cr_relative_mde,
        ),
        (
            "cr2",
            conversion_baselines(history, |p| p.checkout, "cr2"),
            config.cr_relative_mde,
        ),
    ];

    let mut metrics = Vec::new();
    for (metric, baselines, relative_mde) in &candidates {
        if baselines.is_empty() {
            tracing::warn!("{}: no usable history, metric left out of the plan", metric);
            continue;
        }
        metrics.push(size_metric(
            metric,
            baselines,
            *relative_mde,
            mean_views,
            config,
        )?);
    }

    if metrics.is_empty() {
        anyhow::bail!("No metric could be sized from {} historical periods", history.len());
    }

    Ok(SizingPlan {
        periods: history.len(),
        mean_views,
        metrics,
    })
}
