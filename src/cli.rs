//! CLI argument parsing for funnel-stats

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "funnel-stats")]
#[command(version)]
#[command(about = "A/B experiment statistics for e-commerce funnels", long_about = None)]
pub struct Cli {
    /// Analysis policy file (TOML: alpha, power, srm_alpha, ...)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Control/treatment group selection
#[derive(clap::Args, Debug, Clone)]
pub struct GroupArgs {
    /// Experiment data file (.toml or .json)
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// Control group label
    #[arg(long = "group-a", default_value = "A")]
    pub group_a: String,

    /// Treatment group label
    #[arg(long = "group-b", default_value = "B")]
    pub group_b: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Two-proportion z-test on conversion rates
    Ztest {
        /// Conversion rate of group A
        #[arg(long = "rate-a")]
        rate_a: f64,
        /// Users behind the rate of group A
        #[arg(long = "count-a")]
        count_a: u64,
        /// Conversion rate of group B
        #[arg(long = "rate-b")]
        rate_b: f64,
        /// Users behind the rate of group B
        #[arg(long = "count-b")]
        count_b: u64,
        /// Significance level (overrides config)
        #[arg(long)]
        alpha: Option<f64>,
    },

    /// Sample Ratio Mismatch check on group sizes
    Srm {
        /// Unique users in group A
        #[arg(long = "count-a")]
        count_a: u64,
        /// Unique users in group B
        #[arg(long = "count-b")]
        count_b: u64,
        /// Intended share of group A (overrides config)
        #[arg(long)]
        ratio: Option<f64>,
    },

    /// Required users per group for a given variance and MDE
    SampleSize {
        /// Historical variance of the metric
        #[arg(long)]
        variance: f64,
        /// Absolute minimum detectable effect
        #[arg(long, allow_hyphen_values = true)]
        mde: f64,
        /// Significance level (overrides config)
        #[arg(long)]
        alpha: Option<f64>,
        /// Statistical power (overrides config)
        #[arg(long)]
        power: Option<f64>,
        /// Mean traffic per time unit, adds the expected duration
        #[arg(long)]
        traffic: Option<f64>,
    },

    /// Expected duration for a per-group sample size
    Duration {
        /// Users required per group
        #[arg(long)]
        size: u64,
        /// Mean traffic per time unit
        #[arg(long)]
        traffic: f64,
    },

    /// Mann-Whitney U test on revenue per user
    RankSum {
        #[command(flatten)]
        groups: GroupArgs,
    },

    /// A/A check: SRM and conversion sanity on history data
    Validate {
        #[command(flatten)]
        groups: GroupArgs,
    },

    /// A/B analysis: SRM guard, CR z-tests and revenue rank-sum test
    Analyse {
        #[command(flatten)]
        groups: GroupArgs,
    },

    /// Per-group funnel table (CR1, CR2, ARPU)
    Summary {
        /// Experiment data file (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        data: PathBuf,
    },

    /// Sample-size plan for ARPU, CR1 and CR2 from historical periods
    Plan {
        /// Experiment data file (.toml or .json)
        #[arg(short, long, value_name = "FILE")]
        data: PathBuf,
    },
}
