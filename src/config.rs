// Analysis policy: significance level, power and sizing MDEs
//
// The inference core takes resolved numbers only. This struct is where the
// caller's policy lives, loaded from TOML and overridden by CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Policy for validating, analysing and sizing experiments
///
/// # Example
/// ```
/// use funnel_stats::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.alpha, 0.05); // 95% confidence
/// assert_eq!(config.srm_alpha, 0.01);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Significance level for effect tests (CR z-test, ARPU rank-sum)
    ///
    /// - 0.05 (default): 95% confidence
    /// - 0.01: stricter, fewer false positives
    /// - 0.10: looser, fewer false negatives
    pub alpha: f64,

    /// Target power for sample sizing (default 0.8)
    pub power: f64,

    /// Significance level of the SRM guard
    ///
    /// Kept stricter than `alpha` because a false SRM alarm blocks the whole
    /// experiment. Default: 0.01
    pub srm_alpha: f64,

    /// Intended share of traffic in the control group (default 0.5)
    pub expected_ratio_a: f64,

    /// ARPU MDE as a fraction of the historical mean (default 0.10)
    pub arpu_relative_mde: f64,

    /// CR MDE as a fraction of the historical mean (default 0.05)
    pub cr_relative_mde: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,             // 95% confidence
            power: 0.8,              // 20% false negative rate
            srm_alpha: 0.01,         // SRM alarms must be rare
            expected_ratio_a: 0.5,   // even split
            arpu_relative_mde: 0.10, // 10% ARPU uplift
            cr_relative_mde: 0.05,   // 5% CR uplift
        }
    }
}

impl AnalysisConfig {
    /// Strict policy: 99% confidence and 90% power
    pub fn strict() -> Self {
        Self {
            alpha: 0.01,
            power: 0.9,
            ..Self::default()
        }
    }

    /// Permissive policy: 90% confidence, catches effects early
    pub fn permissive() -> Self {
        Self {
            alpha: 0.10,
            ..Self::default()
        }
    }

    /// Load a (possibly partial) TOML file; missing keys keep their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("alpha", self.alpha),
            ("power", self.power),
            ("srm_alpha", self.srm_alpha),
            ("expected_ratio_a", self.expected_ratio_a),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(format!("{} must be in (0, 1), got {}", name, value));
            }
        }

        for (name, value) in [
            ("arpu_relative_mde", self.arpu_relative_mde),
            ("cr_relative_mde", self.cr_relative_mde),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be positive, got {}", name, value));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.power, 0.8);
        assert_eq!(config.srm_alpha, 0.01);
        assert_eq!(config.expected_ratio_a, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_config() {
        let config = AnalysisConfig::strict();
        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.power, 0.9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_permissive_config() {
        let config = AnalysisConfig::permissive();
        assert_eq!(config.alpha, 0.10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str("alpha = 0.1\ncr_relative_mde = 0.02\n").unwrap();
        assert_eq!(config.alpha, 0.1);
        assert_eq!(config.cr_relative_mde, 0.02);
        assert_eq!(config.power, 0.8);
        assert_eq!(config.arpu_relative_mde, 0.10);
    }

    #[test]
    fn test_invalid_toml_values() {
        assert!(AnalysisConfig::from_toml_str("alpha = 1.5").is_err());
        assert!(AnalysisConfig::from_toml_str("power = 0.0").is_err());
        assert!(AnalysisConfig::from_toml_str("arpu_relative_mde = -0.1").is_err());
        assert!(AnalysisConfig::from_toml_str("alpha = \"high\"").is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_expected_ratio() {
        let mut config = AnalysisConfig::default();
        config.expected_ratio_a = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        std::fs::write(&path, "srm_alpha = 0.001\n").unwrap();
        assert_eq!(AnalysisConfig::from_toml_file(&path).unwrap().srm_alpha, 0.001);
        assert!(AnalysisConfig::from_toml_file(&dir.path().join("nope.toml")).is_err());
    }
}
