use assert_cmd::Command;
use predicates::prelude::*;
use proptest::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("mw-risk-cli").unwrap();
    cmd.env_remove("MW_RISK_TIERS__HIGH")
        .env_remove("MW_RISK_TIERS__INTERMEDIATE")
        .env("RUST_LOG", "warn")
        .arg("--no-color");
    cmd
}

#[test]
fn evaluate_low_risk_example() {
    cli()
        .args([
            "evaluate", "--sex", "male", "--age", "80", "--nyha", "III", "--hemoglobin", "14",
            "--hba1c", "5.0", "--creatinine", "1.0", "--egfr", "70", "--bmi", "25",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "AHEAD Score: 1 point(s) (age factor contribution: 1 point(s))",
        ))
        .stdout(predicate::str::contains("Overall Score: 5 point(s) (Low Risk)"))
        .stdout(predicate::str::contains("This score indicates: Low Risk"));
}

#[test]
fn evaluate_intermediate_example_as_json() {
    let output = cli()
        .args([
            "evaluate",
            "--sex",
            "female",
            "--age",
            "72",
            "--nyha",
            "II",
            "--atrial-fibrillation",
            "--hemoglobin",
            "11.5",
            "--hba1c",
            "7.0",
            "--creatinine",
            "1.5",
            "--egfr",
            "50",
            "--bmi",
            "21",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["sub_score"], 5);
    assert_eq!(value["sub_score_contribution"], 3);
    assert_eq!(value["overall_score"], 10);
    assert_eq!(value["risk_tier"], "intermediate");
}

#[test]
fn evaluate_high_risk_example_as_markdown() {
    cli()
        .args([
            "evaluate", "--sex", "m", "--age", "90", "--nyha", "4", "--af", "--hemoglobin", "10",
            "--hba1c", "8", "--creatinine", "2.0", "--egfr", "40", "--bmi", "20", "--format",
            "markdown",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Total Score:** 15 point(s), **High Risk**"))
        .stdout(predicate::str::contains("| **BMI** | <= 22.5 kg/m² | **1 Points** |"));
}

#[test]
fn evaluate_uses_form_defaults() {
    cli()
        .arg("evaluate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall Score: 0 point(s) (Low Risk)"));
}

#[test]
fn evaluate_rejects_out_of_range_values() {
    cli()
        .args(["evaluate", "--age", "130"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"))
        .stderr(predicate::str::contains("age must be within 18..=120"));
}

#[test]
fn evaluate_rejects_unknown_nyha_class() {
    cli()
        .args(["evaluate", "--nyha", "V"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown NYHA class"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn json_tier_matches_overall_score(
        age in 18u32..=120,
        nyha in prop::sample::select(vec!["I", "II", "III", "IV"]),
        egfr in 10.0f64..=150.0,
        bmi in 15.0f64..=40.0,
    ) {
        let output = cli()
            .args([
                "evaluate".to_string(),
                "--age".into(), age.to_string(),
                "--nyha".into(), nyha.to_string(),
                "--egfr".into(), format!("{egfr:.2}"),
                "--bmi".into(), format!("{bmi:.2}"),
                "--format".into(), "json".into(),
            ])
            .output()
            .unwrap();
        prop_assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let score = value["overall_score"].as_u64().unwrap();
        let expected = match score {
            0..=6 => "low",
            7..=10 => "intermediate",
            _ => "high",
        };
        prop_assert_eq!(value["risk_tier"].as_str().unwrap(), expected);
    }
}
