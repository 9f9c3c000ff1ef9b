//! Per-group funnel counts and the metrics derived from them
//!
//! A funnel is `view → add_to_basket → checkout → purchase`, counted in unique
//! users per group. From it come the conversion rates used by the z-test and
//! the revenue metric used by the rank-sum test:
//!
//! - CR1 = purchase / view
//! - CR2 = purchase / checkout
//! - ARPU = revenue / view

use crate::descriptive;
use crate::inference::{GroupMetric, ProportionSample};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Unique-user funnel counts of one experiment group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFunnel {
    /// Group label, e.g. "A" or "B"
    pub label: String,
    pub view: u64,
    #[serde(default)]
    pub add_to_basket: u64,
    pub checkout: u64,
    pub purchase: u64,
    /// Total revenue; summed from `revenue_per_user` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    /// Revenue of every viewing user, zeros included
    ///
    /// Summaries run in f32, so values must stay within `f32::MAX` in magnitude.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revenue_per_user: Vec<f64>,
}

impl GroupFunnel {
    /// Funnel with counts only
    pub fn new(label: impl Into<String>, view: u64, checkout: u64, purchase: u64) -> Self {
        Self {
            label: label.into(),
            view,
            add_to_basket: 0,
            checkout,
            purchase,
            revenue: None,
            revenue_per_user: Vec::new(),
        }
    }

    /// Validate that every step is a subset of the previous one
    pub fn validate(&self) -> Result<(), String> {
        if self.label.is_empty() {
            return Err("group label must not be empty".to_string());
        }
        if self.checkout > self.view {
            return Err(format!(
                "group `{}`: checkout ({}) exceeds view ({})",
                self.label, self.checkout, self.view
            ));
        }
        if self.add_to_basket > 0
            && (self.add_to_basket > self.view || self.checkout > self.add_to_basket)
        {
            return Err(format!(
                "group `{}`: add_to_basket ({}) must lie between checkout ({}) and view ({})",
                self.label, self.add_to_basket, self.checkout, self.view
            ));
        }
        if self.purchase > self.checkout {
            return Err(format!(
                "group `{}`: purchase ({}) exceeds checkout ({})",
                self.label, self.purchase, self.checkout
            ));
        }
        if let Some(revenue) = self.revenue {
            if !revenue.is_finite() || revenue < 0.0 {
                return Err(format!(
                    "group `{}`: revenue must be finite and >= 0, got {}",
                    self.label, revenue
                ));
            }
        }
        if let Some(bad) = self
            .revenue_per_user
            .iter()
            .find(|r| !descriptive::is_representable(**r))
        {
            return Err(format!(
                "group `{}`: revenue_per_user value {} is not a finite f32",
                self.label, bad
            ));
        }
        Ok(())
    }

    pub fn total_revenue(&self) -> f64 {
        self.revenue
            .unwrap_or_else(|| self.revenue_per_user.iter().sum())
    }

    /// CR1 = purchase / view
    pub fn view_conversion(&self) -> Result<ProportionSample> {
        ProportionSample::from_counts(self.purchase, self.view)
            .with_context(|| format!("CR1 of group `{}`", self.label))
    }

    /// CR2 = purchase / checkout
    pub fn checkout_conversion(&self) -> Result<ProportionSample> {
        ProportionSample::from_counts(self.purchase, self.checkout)
            .with_context(|| format!("CR2 of group `{}`", self.label))
    }

    /// ARPU = revenue / view, `None` without viewers
    pub fn arpu(&self) -> Option<f64> {
        (self.view > 0).then(|| self.total_revenue() / self.view as f64)
    }

    /// Per-user revenue for the rank-sum test, `None` when not collected
    pub fn revenue_metric(&self) -> Option<GroupMetric> {
        (!self.revenue_per_user.is_empty())
            .then(|| GroupMetric::new(self.label.clone(), self.revenue_per_user.clone()))
    }
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

/// One row of the per-group summary table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelSummary {
    pub label: String,
    pub view: u64,
    pub add_to_basket: u64,
    pub checkout: u64,
    pub purchase: u64,
    pub cr1: Option<f64>,
    pub cr2: Option<f64>,
    pub arpu: Option<f64>,
    pub median_revenue: Option<f64>,
}

/// Summarize every group: counts, CR1, CR2, ARPU and median revenue per user
pub fn summarize(groups: &[GroupFunnel]) -> Result<Vec<FunnelSummary>> {
    groups
        .iter()
        .map(|group| -> Result<FunnelSummary> {
            let median_revenue = if group.revenue_per_user.is_empty() {
                None
            } else {
                Some(
                    descriptive::median(&group.revenue_per_user)
                        .with_context(|| format!("median revenue of group `{}`", group.label))?,
                )
            };

            Ok(FunnelSummary {
                label: group.label.clone(),
                view: group.view,
                add_to_basket: group.add_to_basket,
                checkout: group.checkout,
                purchase: group.purchase,
                cr1: ratio(group.purchase, group.view),
                cr2: ratio(group.purchase, group.checkout),
                arpu: group.arpu(),
                median_revenue,
            })
        })
        .collect()
}
