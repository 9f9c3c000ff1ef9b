//! CSV output for spreadsheet analysis
//!
//! Floats are written with two decimals except p-values and statistics,
//! which keep six so small p-values stay distinguishable.

use crate::funnel::FunnelSummary;
use crate::sizing::SizingPlan;
use crate::verdict::{MetricOutcome, MetricTest};

/// CSV table builder
#[derive(Debug)]
pub struct CsvOutput {
    header: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl CsvOutput {
    /// Create an empty table with the given header
    pub fn new(header: Vec<&'static str>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Add a row; fields are escaped on output
    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.header.join(","));
        output.push('\n');

        for row in &self.rows {
            let fields: Vec<String> = row.iter().map(|f| Self::escape_field(f)).collect();
            output.push_str(&fields.join(","));
            output.push('\n');
        }

        output
    }

    /// Sizing plan: one row per metric
    pub fn from_sizing(plan: &SizingPlan) -> Self {
        let mut output = Self::new(vec![
            "metric",
            "history_mean",
            "history_var",
            "mde",
            "size",
            "num_periods",
        ]);
        for m in &plan.metrics {
            output.add_row(vec![
                m.metric.clone(),
                format!("{:.2}", m.history_mean),
                format!("{:.2}", m.history_var),
                format!("{:.2}", m.mde),
                m.size.to_string(),
                format!("{:.2}", m.num_periods),
            ]);
        }
        output
    }

    /// Per-group funnel summary: one row per group
    pub fn from_summaries(rows: &[FunnelSummary]) -> Self {
        let opt = |v: Option<f64>| v.map(|x| format!("{:.2}", x)).unwrap_or_default();

        let mut output = Self::new(vec![
            "group",
            "view",
            "add_to_basket",
            "checkout",
            "purchase",
            "cr1",
            "cr2",
            "arpu",
            "median_revenue",
        ]);
        for row in rows {
            output.add_row(vec![
                row.label.clone(),
                row.view.to_string(),
                row.add_to_basket.to_string(),
                row.checkout.to_string(),
                row.purchase.to_string(),
                opt(row.cr1),
                opt(row.cr2),
                opt(row.arpu),
                opt(row.median_revenue),
            ]);
        }
        output
    }

    /// Metric tests of an assessment, SRM row first
    pub fn from_tests(srm: &crate::inference::TestResult, tests: &[MetricTest]) -> Self {
        let mut output = Self::new(vec!["metric", "status", "statistic", "p_value", "note"]);

        output.add_row(vec![
            "srm".to_string(),
            "tested".to_string(),
            format!("{:.6}", srm.statistic),
            format!("{:.6}", srm.p_value),
            String::new(),
        ]);

        for test in tests {
            let row = match &test.outcome {
                MetricOutcome::Tested {
                    result,
                    significant,
                } => vec![
                    test.metric.clone(),
                    if *significant { "significant" } else { "not_significant" }.to_string(),
                    format!("{:.6}", result.statistic),
                    format!("{:.6}", result.p_value),
                    result.warning.map(|w| w.to_string()).unwrap_or_default(),
                ],
                MetricOutcome::Degenerate { reason } => vec![
                    test.metric.clone(),
                    "degenerate".to_string(),
                    String::new(),
                    String::new(),
                    reason.clone(),
                ],
                MetricOutcome::Skipped { reason } => vec![
                    test.metric.clone(),
                    "skipped".to_string(),
                    String::new(),
                    String::new(),
                    reason.clone(),
                ],
            };
            output.add_row(row);
        }
        output
    }
}
