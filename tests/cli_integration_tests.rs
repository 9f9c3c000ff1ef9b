// Integration tests for the funnel-stats binary
// Every subcommand is driven end to end through the three output formats

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const AB_DATA: &str = r#"
[experiment]
name = "green_button"
hypothesis = "green checkout button lifts CR2"

[[groups]]
label = "A"
view = 5000
add_to_basket = 2000
checkout = 1000
purchase = 600

[[groups]]
label = "B"
view = 5000
add_to_basket = 2000
checkout = 1000
purchase = 690

[[history]]
period = "2024-01"
view = 5000
checkout = 1000
purchase = 600
revenue_per_user = [0.0, 0.0, 0.0, 12.0, 40.0, 0.0, 25.0, 0.0, 0.0, 31.0]

[[history]]
period = "2024-02"
view = 5000
checkout = 1000
purchase = 600
revenue_per_user = [0.0, 18.0, 0.0, 0.0, 22.0, 0.0, 0.0, 35.0, 0.0, 14.0]
"#;

fn funnel_stats() -> Command {
    Command::cargo_bin("funnel-stats").unwrap()
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// Core tests
// ============================================================================

#[test]
fn test_ztest_text_output() {
    funnel_stats()
        .args([
            "ztest", "--rate-a", "0.5", "--count-a", "100", "--rate-b", "0.3", "--count-b", "100",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Two-proportion z-test (alpha=0.05)"))
        .stdout(predicate::str::contains("✅ SIGNIFICANT DIFFERENCE"))
        .stdout(predicate::str::contains("statistic: 2.9488"))
        .stdout(predicate::str::contains("p-value:   0.0031"));
}

#[test]
fn test_ztest_json_output() {
    let output = funnel_stats()
        .args([
            "--format", "json", "ztest", "--rate-a", "0.5", "--count-a", "100", "--rate-b",
            "0.3", "--count-b", "100",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["command"], "ztest");
    assert_eq!(value["result"]["significant"], true);
    assert_eq!(value["result"]["alpha"], 0.05);
    let p = value["result"]["p_value"].as_f64().unwrap();
    assert!((p - 0.00319).abs() < 1e-4);
}

#[test]
fn test_ztest_invalid_rate_fails() {
    funnel_stats()
        .args([
            "ztest", "--rate-a", "1.5", "--count-a", "100", "--rate-b", "0.3", "--count-b", "100",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument"));
}

#[test]
fn test_ztest_degenerate_fails() {
    funnel_stats()
        .args([
            "ztest", "--rate-a", "0", "--count-a", "100", "--rate-b", "0", "--count-b", "100",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Degenerate input"));
}

#[test]
fn test_srm_balanced() {
    funnel_stats()
        .args(["srm", "--count-a", "500", "--count-b", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample Ratio Mismatch check"))
        .stdout(predicate::str::contains("✅ NO SRM"))
        .stdout(predicate::str::contains("p-value:   1.000000"));
}

#[test]
fn test_ztest_equal_rates_not_significant_text() {
    funnel_stats()
        .args([
            "ztest", "--rate-a", "0.6", "--count-a", "1000", "--rate-b", "0.6", "--count-b", "1000",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("❌ NO SIGNIFICANT DIFFERENCE"))
        .stdout(predicate::str::contains("SIGNIFICANT DIFFERENCE\n").count(1));
}

#[test]
fn test_srm_mismatch_text() {
    funnel_stats()
        .args(["srm", "--count-a", "5000", "--count-b", "4500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("❌ SRM DETECTED"))
        .stdout(predicate::str::contains("✅").not());
}

#[test]
fn test_srm_mismatch_csv() {
    funnel_stats()
        .args(["--format", "csv", "srm", "--count-a", "5000", "--count-b", "4500"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "metric,statistic,p_value,alpha,significant,note\n",
        ))
        .stdout(predicate::str::contains("srm,26.315789,"))
        .stdout(predicate::str::contains(",0.01,true,"));
}

#[test]
fn test_srm_rejects_bad_ratio() {
    funnel_stats()
        .args(["srm", "--count-a", "5", "--count-b", "5", "--ratio", "1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected_ratio_a"));
}

#[test]
fn test_sample_size_text() {
    funnel_stats()
        .args(["sample-size", "--variance", "25", "--mde", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("393 users per group"));
}

#[test]
fn test_sample_size_with_traffic_json() {
    let output = funnel_stats()
        .args([
            "--format", "json", "sample-size", "--variance", "25", "--mde", "1", "--traffic",
            "100",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["result"]["size"], 393);
    let duration = value["result"]["duration"].as_f64().unwrap();
    assert!((duration - 7.86).abs() < 1e-9);
}

#[test]
fn test_sample_size_zero_mde_fails() {
    funnel_stats()
        .args(["sample-size", "--variance", "25", "--mde", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("minimum_detectable_effect"));
}

#[test]
fn test_sample_size_power_override() {
    // stricter power needs more users than the default 393
    let output = funnel_stats()
        .args([
            "--format", "json", "sample-size", "--variance", "25", "--mde", "1", "--power", "0.9",
        ])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value["result"]["size"].as_u64().unwrap() > 393);
}

#[test]
fn test_duration() {
    funnel_stats()
        .args(["duration", "--size", "393", "--traffic", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7.86"));
}

#[test]
fn test_duration_zero_traffic_fails() {
    funnel_stats()
        .args(["duration", "--size", "393", "--traffic", "0"])
        .assert()
        .failure();
}

// ============================================================================
// Data file commands
// ============================================================================

#[test]
fn test_analyse_significant_lift() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "exp.toml", AB_DATA);

    funnel_stats()
        .arg("analyse")
        .arg("--data")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("SIGNIFICANT DIFFERENCE"))
        .stdout(predicate::str::contains("cr2"))
        .stdout(predicate::str::contains("revenue_per_user (skipped"));
}

#[test]
fn test_analyse_json_includes_experiment() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "exp.toml", AB_DATA);

    let output = funnel_stats()
        .args(["--format", "json", "analyse", "-d"])
        .arg(&data)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["experiment"], "green_button");
    assert_eq!(value["result"]["verdict"]["verdict"], "significant");
    assert_eq!(value["result"]["tests"][1]["metric"], "cr2");
    assert_eq!(value["result"]["tests"][1]["outcome"]["status"], "tested");
}

#[test]
fn test_analyse_srm_overrides_effect() {
    let dir = TempDir::new().unwrap();
    let data = write_file(
        &dir,
        "srm.json",
        r#"{"groups": [
            {"label": "A", "view": 5500, "checkout": 1100, "purchase": 660},
            {"label": "B", "view": 4500, "checkout": 900, "purchase": 630}
        ]}"#,
    );

    funnel_stats()
        .arg("analyse")
        .arg("--data")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("SRM DETECTED"));
}

#[test]
fn test_analyse_csv_rows() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "exp.toml", AB_DATA);

    funnel_stats()
        .args(["--format", "csv", "analyse", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("metric,status,statistic,p_value,note\n"))
        .stdout(predicate::str::contains("srm,tested,0.000000,1.000000,"))
        .stdout(predicate::str::contains("cr2,significant,"))
        .stdout(predicate::str::contains("revenue_per_user,skipped,"));
}

#[test]
fn test_analyse_unknown_group() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "exp.toml", AB_DATA);

    funnel_stats()
        .args(["analyse", "--group-b", "C", "--data"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Group `C` not found"));
}

#[test]
fn test_validate_aa_passes() {
    let dir = TempDir::new().unwrap();
    let data = write_file(
        &dir,
        "aa.toml",
        r#"
[[groups]]
label = "A"
view = 5030
checkout = 1006
purchase = 605

[[groups]]
label = "B"
view = 4970
checkout = 994
purchase = 596
"#,
    );

    funnel_stats()
        .arg("validate")
        .arg("--data")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("A/A TEST PASSED"));
}

#[test]
fn test_rank_sum_low_sample_warning() {
    let dir = TempDir::new().unwrap();
    let data = write_file(
        &dir,
        "revenue.json",
        r#"{"groups": [
            {"label": "A", "view": 3, "checkout": 2, "purchase": 1, "revenue_per_user": [0.0, 0.0, 20.0]},
            {"label": "B", "view": 3, "checkout": 2, "purchase": 2, "revenue_per_user": [0.0, 15.0, 30.0]}
        ]}"#,
    );

    funnel_stats()
        .arg("rank-sum")
        .arg("--data")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("Mann-Whitney U test"))
        .stdout(predicate::str::contains("low sample size"));
}

#[test]
fn test_rank_sum_requires_revenue() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "exp.toml", AB_DATA);

    funnel_stats()
        .arg("rank-sum")
        .arg("--data")
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no revenue_per_user data"));
}

#[test]
fn test_summary_csv() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "exp.toml", AB_DATA);

    funnel_stats()
        .args(["summary", "--format", "csv", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "group,view,add_to_basket,checkout,purchase,cr1,cr2,arpu,median_revenue",
        ))
        .stdout(predicate::str::contains("A,5000,2000,1000,600,0.12,0.60,"))
        .stdout(predicate::str::contains("B,5000,2000,1000,690,0.14,0.69,"));
}

#[test]
fn test_plan_text() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "exp.toml", AB_DATA);

    funnel_stats()
        .arg("plan")
        .arg("--data")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("SAMPLE SIZE PLAN (2 periods"))
        .stdout(predicate::str::contains("arpu"))
        .stdout(predicate::str::contains("4187"));
}

#[test]
fn test_plan_without_history_fails() {
    let dir = TempDir::new().unwrap();
    let data = write_file(
        &dir,
        "nohist.json",
        r#"{"groups": [{"label": "A", "view": 10, "checkout": 5, "purchase": 2}]}"#,
    );

    funnel_stats()
        .arg("plan")
        .arg("--data")
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("without historical periods"));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let data = write_file(&dir, "exp.yaml", "groups: []");

    funnel_stats()
        .arg("summary")
        .arg("--data")
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a .toml or .json extension"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_changes_alpha() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "policy.toml", "alpha = 0.001\n");

    // p ~ 0.0032 is significant at 0.05 but not at 0.001
    let output = funnel_stats()
        .args(["--format", "json", "--config"])
        .arg(&config)
        .args([
            "ztest", "--rate-a", "0.5", "--count-a", "100", "--rate-b", "0.3", "--count-b", "100",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["result"]["alpha"], 0.001);
    assert_eq!(value["result"]["significant"], false);
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "policy.toml", "alpha = 2.0\n");

    funnel_stats()
        .arg("--config")
        .arg(&config)
        .args(["srm", "--count-a", "5", "--count-b", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("alpha must be in (0, 1)"));
}

#[test]
fn test_debug_flag_traces_to_stderr() {
    funnel_stats()
        .args(["--debug", "srm", "--count-a", "500", "--count-b", "500"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Analysis config"));
}
