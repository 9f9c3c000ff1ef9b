//! Experiment data files
//!
//! The inference core never reads data. This module is the acquisition side:
//! a TOML or JSON file with per-group funnel counts for the experiment
//! period and per-period baselines for sizing. Which periods count as
//! "history" is up to whoever exports the file.
//!
//! ```toml
//! [experiment]
//! name = "green_checkout_button"
//! hypothesis = "Green checkout button does not change CR"
//!
//! [[groups]]
//! label = "A"
//! view = 5000
//! checkout = 1000
//! purchase = 600
//!
//! [[history]]
//! period = "2024-01"
//! view = 4800
//! checkout = 960
//! purchase = 575
//! ```

use crate::descriptive;
use crate::funnel::GroupFunnel;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Experiment metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentInfo {
    pub name: String,
    #[serde(default)]
    pub hypothesis: String,
}

/// Funnel baseline of one historical period (e.g. a month)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPeriod {
    pub period: String,
    pub view: u64,
    pub checkout: u64,
    pub purchase: u64,
    /// Revenue of every viewing user in the period, zeros included,
    /// each within `f32::MAX` in magnitude
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revenue_per_user: Vec<f64>,
}

impl HistoricalPeriod {
    pub fn validate(&self) -> Result<(), String> {
        if self.checkout > self.view {
            return Err(format!(
                "period `{}`: checkout ({}) exceeds view ({})",
                self.period, self.checkout, self.view
            ));
        }
        if self.purchase > self.checkout {
            return Err(format!(
                "period `{}`: purchase ({}) exceeds checkout ({})",
                self.period, self.purchase, self.checkout
            ));
        }
        if let Some(bad) = self
            .revenue_per_user
            .iter()
            .find(|r| !descriptive::is_representable(**r))
        {
            return Err(format!(
                "period `{}`: revenue_per_user value {} is not a finite f32",
                self.period, bad
            ));
        }
        Ok(())
    }
}

/// Contents of an experiment data file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment: Option<ExperimentInfo>,
    #[serde(default)]
    pub groups: Vec<GroupFunnel>,
    #[serde(default)]
    pub history: Vec<HistoricalPeriod>,
}

impl Dataset {
    /// Load a `.toml` or `.json` file and validate it
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read data file {}", path.display()))?;

        let dataset = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => anyhow::bail!(
                "Unsupported data file {}: expected a .toml or .json extension",
                path.display()
            ),
        };

        dataset.with_context(|| format!("Invalid data file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let dataset: Dataset = toml::from_str(content).context("Failed to parse TOML")?;
        dataset.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(dataset)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(content).context("Failed to parse JSON")?;
        dataset.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(dataset)
    }

    /// Validate every group and period; group labels must be unique
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for group in &self.groups {
            group.validate()?;
            if !seen.insert(group.label.as_str()) {
                return Err(format!("duplicate group label `{}`", group.label));
            }
        }
        for period in &self.history {
            period.validate()?;
        }
        Ok(())
    }

    pub fn group(&self, label: &str) -> Option<&GroupFunnel> {
        self.groups.iter().find(|g| g.label == label)
    }

    /// Fetch the control and treatment groups
    pub fn pair(&self, control: &str, treatment: &str) -> Result<(&GroupFunnel, &GroupFunnel)> {
        if control == treatment {
            anyhow::bail!("Control and treatment must differ, both are `{}`", control);
        }
        let available = || {
            self.groups
                .iter()
                .map(|g| g.label.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let a = self.group(control).with_context(|| {
            format!("Group `{}` not found (available: {})", control, available())
        })?;
        let b = self.group(treatment).with_context(|| {
            format!("Group `{}` not found (available: {})", treatment, available())
        })?;
        Ok((a, b))
    }
}
