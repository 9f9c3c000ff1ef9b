use anyhow::{Context, Result};
use clap::Parser;
use funnel_stats::cli::{Cli, Command, GroupArgs, OutputFormat};
use funnel_stats::config::AnalysisConfig;
use funnel_stats::csv_output::CsvOutput;
use funnel_stats::dataset::Dataset;
use funnel_stats::funnel::summarize;
use funnel_stats::inference::{
    check_srm, experiment_duration, mann_whitney_u, proportions_z_test, required_sample_size,
    PowerAnalysisInput, ProportionSample, TestResult,
};
use funnel_stats::json_output::JsonOutput;
use funnel_stats::sizing::plan_sample_sizes;
use funnel_stats::verdict::{assess_experiment, validate_split};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; warnings always reach stderr, `--debug` shows everything
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Single test result with the decision at the configured level
#[derive(Debug, Serialize)]
struct Decision<'a> {
    #[serde(flatten)]
    result: &'a TestResult,
    alpha: f64,
    significant: bool,
}

#[derive(Debug, Serialize)]
struct SampleSizeReport {
    historical_variance: f64,
    minimum_detectable_effect: f64,
    alpha: f64,
    power: f64,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
}

#[derive(Debug, Serialize)]
struct DurationReport {
    size: u64,
    traffic: f64,
    duration: f64,
}

/// Render `value` in the requested format and print it to stdout
fn emit<T: Serialize>(
    format: OutputFormat,
    command: &str,
    experiment: Option<&str>,
    value: &T,
    text: impl FnOnce() -> String,
    csv: impl FnOnce() -> CsvOutput,
) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", text()),
        OutputFormat::Json => println!(
            "{}",
            JsonOutput::new(command, value)
                .with_experiment(experiment)
                .to_json()?
        ),
        OutputFormat::Csv => print!("{}", csv().to_csv()),
    }
    Ok(())
}

/// Verdict lines of a command, for a significant and a non-significant result
struct Verdicts {
    significant: &'static str,
    not_significant: &'static str,
}

/// Effect tests (z-test, rank-sum)
const EFFECT_VERDICTS: Verdicts = Verdicts {
    significant: "✅ SIGNIFICANT DIFFERENCE",
    not_significant: "❌ NO SIGNIFICANT DIFFERENCE",
};

/// SRM check: significance means a broken split
const SRM_VERDICTS: Verdicts = Verdicts {
    significant: "❌ SRM DETECTED, check assignment for bugs",
    not_significant: "✅ NO SRM",
};

fn decision_text(title: &str, decision: &Decision, verdicts: &Verdicts) -> String {
    let verdict = if decision.significant {
        verdicts.significant
    } else {
        verdicts.not_significant
    };
    let mut text = format!(
        "{} (alpha={})\n{}\n  statistic: {:.6}\n  p-value:   {:.6}\n",
        title, decision.alpha, verdict, decision.result.statistic, decision.result.p_value
    );
    if let Some(warning) = decision.result.warning {
        text.push_str(&format!("  ⚠️  {}\n", warning));
    }
    text
}

fn decision_csv(metric: &str, decision: &Decision) -> CsvOutput {
    let mut output = CsvOutput::new(vec!["metric", "statistic", "p_value", "alpha", "significant", "note"]);
    output.add_row(vec![
        metric.to_string(),
        format!("{:.6}", decision.result.statistic),
        format!("{:.6}", decision.result.p_value),
        decision.alpha.to_string(),
        decision.significant.to_string(),
        decision
            .result
            .warning
            .map(|w| w.to_string())
            .unwrap_or_default(),
    ]);
    output
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    match &cli.config {
        Some(path) => AnalysisConfig::from_toml_file(path),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_pair(groups: &GroupArgs) -> Result<Dataset> {
    let dataset = Dataset::from_path(&groups.data)?;
    // fail early on unknown labels
    dataset.pair(&groups.group_a, &groups.group_b)?;
    Ok(dataset)
}

fn experiment_name(dataset: &Dataset) -> Option<&str> {
    dataset.experiment.as_ref().map(|e| e.name.as_str())
}

fn run(cli: &Cli, mut config: AnalysisConfig) -> Result<()> {
    let format = cli.format;

    match &cli.command {
        Command::Ztest {
            rate_a,
            count_a,
            rate_b,
            count_b,
            alpha,
        } => {
            if let Some(alpha) = alpha {
                config.alpha = *alpha;
            }
            config.validate().map_err(|e| anyhow::anyhow!(e))?;

            let a = ProportionSample::new(*rate_a, *count_a)?;
            let b = ProportionSample::new(*rate_b, *count_b)?;
            let result = proportions_z_test(&a, &b)?;
            let decision = Decision {
                result: &result,
                alpha: config.alpha,
                significant: result.is_significant(config.alpha),
            };
            emit(
                format,
                "ztest",
                None,
                &decision,
                || decision_text("Two-proportion z-test", &decision, &EFFECT_VERDICTS),
                || decision_csv("proportion", &decision),
            )
        }

        Command::Srm {
            count_a,
            count_b,
            ratio,
        } => {
            if let Some(ratio) = ratio {
                config.expected_ratio_a = *ratio;
            }
            config.validate().map_err(|e| anyhow::anyhow!(e))?;

            let result = check_srm(*count_a, *count_b, config.expected_ratio_a)?;
            // mismatch is flagged at p <= srm_alpha
            let decision = Decision {
                result: &result,
                alpha: config.srm_alpha,
                significant: result.p_value <= config.srm_alpha,
            };
            emit(
                format,
                "srm",
                None,
                &decision,
                || decision_text("Sample Ratio Mismatch check", &decision, &SRM_VERDICTS),
                || decision_csv("srm", &decision),
            )
        }

        Command::SampleSize {
            variance,
            mde,
            alpha,
            power,
            traffic,
        } => {
            let input = PowerAnalysisInput::new(*variance, *mde)
                .with_alpha(alpha.unwrap_or(config.alpha))
                .with_power(power.unwrap_or(config.power));
            let size = required_sample_size(&input)?;
            let duration = traffic
                .map(|t| experiment_duration(size, t))
                .transpose()?;

            let report = SampleSizeReport {
                historical_variance: input.historical_variance,
                minimum_detectable_effect: input.minimum_detectable_effect,
                alpha: input.alpha,
                power: input.power,
                size,
                duration,
            };
            emit(
                format,
                "sample-size",
                None,
                &report,
                || {
                    let mut text = format!(
                        "📐 Sample size: {} users per group (alpha={}, power={})\n",
                        report.size, report.alpha, report.power
                    );
                    if let Some(d) = report.duration {
                        text.push_str(&format!("   Duration: {:.2} time units\n", d));
                    }
                    text
                },
                || {
                    let mut output =
                        CsvOutput::new(vec!["variance", "mde", "alpha", "power", "size", "duration"]);
                    output.add_row(vec![
                        report.historical_variance.to_string(),
                        report.minimum_detectable_effect.to_string(),
                        report.alpha.to_string(),
                        report.power.to_string(),
                        report.size.to_string(),
                        report
                            .duration
                            .map(|d| format!("{:.2}", d))
                            .unwrap_or_default(),
                    ]);
                    output
                },
            )
        }

        Command::Duration { size, traffic } => {
            let report = DurationReport {
                size: *size,
                traffic: *traffic,
                duration: experiment_duration(*size, *traffic)?,
            };
            emit(
                format,
                "duration",
                None,
                &report,
                || format!("⏱️  Duration: {:.2} time units\n", report.duration),
                || {
                    let mut output = CsvOutput::new(vec!["size", "traffic", "duration"]);
                    output.add_row(vec![
                        report.size.to_string(),
                        report.traffic.to_string(),
                        format!("{:.2}", report.duration),
                    ]);
                    output
                },
            )
        }

        Command::RankSum { groups } => {
            let dataset = load_pair(groups)?;
            let (a, b) = dataset.pair(&groups.group_a, &groups.group_b)?;
            let metric_a = a
                .revenue_metric()
                .with_context(|| format!("Group `{}` has no revenue_per_user data", a.label))?;
            let metric_b = b
                .revenue_metric()
                .with_context(|| format!("Group `{}` has no revenue_per_user data", b.label))?;

            let result = mann_whitney_u(&metric_a, &metric_b)?;
            if let Some(warning) = result.warning {
                tracing::warn!("rank-sum {} vs {}: {}", a.label, b.label, warning);
            }
            let decision = Decision {
                result: &result,
                alpha: config.alpha,
                significant: result.is_significant(config.alpha),
            };
            emit(
                format,
                "rank-sum",
                experiment_name(&dataset),
                &decision,
                || decision_text(
                        "Mann-Whitney U test (revenue per user)",
                        &decision,
                        &EFFECT_VERDICTS,
                    ),
                || decision_csv("revenue_per_user", &decision),
            )
        }

        Command::Validate { groups } => {
            let dataset = load_pair(groups)?;
            let (a, b) = dataset.pair(&groups.group_a, &groups.group_b)?;
            let assessment = validate_split(a, b, &config)?;
            emit(
                format,
                "validate",
                experiment_name(&dataset),
                &assessment,
                || assessment.to_report_string(),
                || CsvOutput::from_tests(&assessment.srm, &assessment.tests),
            )
        }

        Command::Analyse { groups } => {
            let dataset = load_pair(groups)?;
            let (a, b) = dataset.pair(&groups.group_a, &groups.group_b)?;
            let assessment = assess_experiment(a, b, &config)?;
            emit(
                format,
                "analyse",
                experiment_name(&dataset),
                &assessment,
                || assessment.to_report_string(),
                || CsvOutput::from_tests(&assessment.srm, &assessment.tests),
            )
        }

        Command::Summary { data } => {
            let dataset = Dataset::from_path(data)?;
            let rows = summarize(&dataset.groups)?;
            emit(
                format,
                "summary",
                experiment_name(&dataset),
                &rows,
                || {
                    let opt = |v: Option<f64>, digits: usize| {
                        v.map(|x| format!("{:.*}", digits, x))
                            .unwrap_or_else(|| "-".to_string())
                    };
                    let mut text = String::from("📊 FUNNEL SUMMARY\n\n");
                    text.push_str(&format!(
                        "{:<10} {:>10} {:>10} {:>10} {:>10} {:>8} {:>8} {:>10}\n",
                        "group", "view", "basket", "checkout", "purchase", "cr1", "cr2", "arpu"
                    ));
                    for row in &rows {
                        text.push_str(&format!(
                            "{:<10} {:>10} {:>10} {:>10} {:>10} {:>8} {:>8} {:>10}\n",
                            row.label,
                            row.view,
                            row.add_to_basket,
                            row.checkout,
                            row.purchase,
                            opt(row.cr1, 4),
                            opt(row.cr2, 4),
                            opt(row.arpu, 2)
                        ));
                    }
                    text
                },
                || CsvOutput::from_summaries(&rows),
            )
        }

        Command::Plan { data } => {
            let dataset = Dataset::from_path(data)?;
            let plan = plan_sample_sizes(&dataset.history, &config)?;
            emit(
                format,
                "plan",
                experiment_name(&dataset),
                &plan,
                || plan.to_report_string(),
                || CsvOutput::from_sizing(&plan),
            )
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing before anything can warn
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    tracing::debug!("Analysis config: {:?}", config);

    run(&cli, config)
}
