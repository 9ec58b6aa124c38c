use std::fmt::Write;

use serde::Serialize;

use crate::calculator::{file_source::PatientRecord, BreakdownEntry, RiskTier, ScoreResult};

pub const REPORT_TITLE: &str = "Predictive Risk Assessment for Muscle Weakness in Heart Failure";

/// Format styles supported by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    Markdown,
}

/// Produce a report string from a `ScoreResult` using the desired format.
pub fn render_report(result: &ScoreResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => {
            let mut out = String::new();
            writeln!(out, "{REPORT_TITLE}")?;
            writeln!(out)?;
            render_human(&mut out, result)?;
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonReport::from(result))?),
        OutputFormat::Markdown => {
            let mut out = String::new();
            writeln!(out, "## {REPORT_TITLE}")?;
            writeln!(out)?;
            render_markdown(&mut out, result)?;
            Ok(out)
        }
    }
}

/// Render several evaluated records, keeping their input order.
pub fn render_batch(
    entries: &[(PatientRecord, ScoreResult)],
    format: OutputFormat,
) -> anyhow::Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            let items: Vec<_> = entries
                .iter()
                .map(|(record, result)| BatchItem {
                    id: record.id.as_deref(),
                    result: JsonReport::from(result),
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Human => {
            writeln!(out, "{REPORT_TITLE}")?;
            for (idx, (record, result)) in entries.iter().enumerate() {
                writeln!(out)?;
                writeln!(out, "=== Patient {} ===", patient_label(idx, record))?;
                render_human(&mut out, result)?;
            }
        }
        OutputFormat::Markdown => {
            writeln!(out, "## {REPORT_TITLE}")?;
            for (idx, (record, result)) in entries.iter().enumerate() {
                writeln!(out)?;
                writeln!(out, "### Patient {}", patient_label(idx, record))?;
                writeln!(out)?;
                render_markdown(&mut out, result)?;
            }
        }
    }
    Ok(out)
}

fn patient_label(idx: usize, record: &PatientRecord) -> String {
    record
        .id
        .clone()
        .unwrap_or_else(|| format!("#{}", idx + 1))
}

fn render_human(out: &mut String, result: &ScoreResult) -> anyhow::Result<()> {
    writeln!(
        out,
        "AHEAD Score: {} point(s) (age factor contribution: {} point(s))",
        result.sub_score, result.sub_score_age_points
    )?;
    write_entries(out, &result.sub_score_breakdown)?;
    writeln!(out)?;
    writeln!(
        out,
        "Overall Score: {} point(s) ({})",
        result.overall_score,
        result.risk_tier.label()
    )?;
    writeln!(out, "Overall Score Breakdown:")?;
    write_entries(out, &result.breakdown)?;
    Ok(())
}

fn write_entries(out: &mut String, entries: &[BreakdownEntry]) -> anyhow::Result<()> {
    for entry in entries {
        writeln!(
            out,
            "  - {factor:<20} {condition:<40} {points:>2}",
            factor = entry.factor,
            condition = entry.condition,
            points = entry.points
        )?;
    }
    Ok(())
}

fn render_markdown(out: &mut String, result: &ScoreResult) -> anyhow::Result<()> {
    writeln!(
        out,
        "**AHEAD Score:** {} point(s) (age factor contribution: {} point(s))",
        result.sub_score, result.sub_score_age_points
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "**Total Score:** {} point(s), **{}**",
        result.overall_score,
        result.risk_tier.label()
    )?;
    writeln!(out)?;
    writeln!(out, "| Risk Factor | Trigger Condition | Score Contribution |")?;
    writeln!(out, "| :--- | :--- | :--- |")?;
    for entry in &result.breakdown {
        writeln!(
            out,
            "| **{}** | {} | **{} Points** |",
            entry.factor,
            escape_markdown(&entry.condition),
            entry.points
        )?;
    }
    Ok(())
}

fn escape_markdown(input: &str) -> String {
    input.replace('|', "\\|")
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    sub_score: u32,
    sub_score_age_points: u32,
    sub_score_contribution: u32,
    overall_score: u32,
    risk_tier: RiskTier,
    risk_label: &'static str,
    sub_score_breakdown: &'a [BreakdownEntry],
    breakdown: &'a [BreakdownEntry],
}

impl<'a> From<&'a ScoreResult> for JsonReport<'a> {
    fn from(result: &'a ScoreResult) -> Self {
        Self {
            sub_score: result.sub_score,
            sub_score_age_points: result.sub_score_age_points,
            sub_score_contribution: result.sub_score_contribution,
            overall_score: result.overall_score,
            risk_tier: result.risk_tier,
            risk_label: result.risk_tier.label(),
            sub_score_breakdown: &result.sub_score_breakdown,
            breakdown: &result.breakdown,
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchItem<'a> {
    id: Option<&'a str>,
    result: JsonReport<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{default_calculator::DefaultCalculator, RiskCalculator};
    use crate::patient::{NyhaClass, PatientInput, Sex};

    fn sample_result() -> ScoreResult {
        let input = PatientInput {
            sex: Sex::Female,
            age: 72,
            nyha: NyhaClass::II,
            atrial_fibrillation: true,
            hemoglobin: 11.5,
            hba1c: 7.0,
            creatinine: 1.5,
            egfr: 50.0,
            bmi: 21.0,
        };
        DefaultCalculator::new().evaluate(&input)
    }

    #[test]
    fn human_report_contains_scores_and_breakdown() {
        let output = render_report(&sample_result(), OutputFormat::Human).unwrap();
        assert!(output.contains(REPORT_TITLE));
        assert!(output.contains("AHEAD Score: 5 point(s) (age factor contribution: 1 point(s))"));
        assert!(output.contains("Overall Score: 10 point(s) (Intermediate Risk)"));
        assert!(output.contains("Overall Score Breakdown"));
        assert!(output.contains("eGFR"));
    }

    #[test]
    fn json_report_serializes() {
        let result = sample_result();
        let output = render_report(&result, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["overall_score"], serde_json::json!(10));
        assert_eq!(value["risk_tier"], serde_json::json!("intermediate"));
        assert_eq!(value["risk_label"], serde_json::json!("Intermediate Risk"));
        assert_eq!(value["breakdown"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn markdown_report_renders_breakdown_table() {
        let output = render_report(&sample_result(), OutputFormat::Markdown).unwrap();
        assert!(output.contains("| Risk Factor | Trigger Condition | Score Contribution |"));
        assert!(output.contains("| **NYHA** | class II or IV | **4 Points** |"));
        assert!(output.contains("| **Age** | > 75 years | **0 Points** |"));
    }

    #[test]
    fn batch_report_labels_patients_by_id_or_position() {
        let result = sample_result();
        let entries = vec![
            (
                PatientRecord {
                    id: Some("ward-3".into()),
                    input: PatientInput::default(),
                },
                result.clone(),
            ),
            (
                PatientRecord {
                    id: None,
                    input: PatientInput::default(),
                },
                result,
            ),
        ];
        let human = render_batch(&entries, OutputFormat::Human).unwrap();
        assert!(human.contains("=== Patient ward-3 ==="));
        assert!(human.contains("=== Patient #2 ==="));

        let json = render_batch(&entries, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["id"], serde_json::json!("ward-3"));
        assert!(value[1]["id"].is_null());
        assert_eq!(value[1]["result"]["overall_score"], serde_json::json!(10));

        let markdown = render_batch(&entries, OutputFormat::Markdown).unwrap();
        assert!(markdown.contains("### Patient ward-3"));
        assert!(markdown.contains("### Patient #2"));
        assert_eq!(
            markdown
                .matches("| Risk Factor | Trigger Condition | Score Contribution |")
                .count(),
            2
        );
    }
}
