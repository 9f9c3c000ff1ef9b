//! JSON output for machine parsing
//!
//! Every command result is wrapped in the same envelope so downstream
//! tooling can dispatch on `command`.

use serde::Serialize;

/// Envelope around a command result
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a, T: Serialize> {
    /// Tool version
    pub version: &'static str,
    /// Format identifier
    pub format: &'static str,
    /// Subcommand that produced the result
    pub command: &'a str,
    /// Experiment name from the data file, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment: Option<&'a str>,
    pub result: &'a T,
}

impl<'a, T: Serialize> JsonOutput<'a, T> {
    pub fn new(command: &'a str, result: &'a T) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            format: "funnel-stats-json-v1",
            command,
            experiment: None,
            result,
        }
    }

    pub fn with_experiment(mut self, name: Option<&'a str>) -> Self {
        self.experiment = name;
        self
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
