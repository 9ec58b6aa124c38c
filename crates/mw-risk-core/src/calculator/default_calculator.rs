use tracing::{debug, instrument};

use super::{BreakdownEntry, RiskCalculator, RiskTier, ScoreResult, ScoringConfig};
use crate::patient::{NyhaClass, PatientInput, Sex};

/// Calculator applying a [`ScoringConfig`] threshold table.
#[derive(Debug, Clone, Default)]
pub struct DefaultCalculator {
    config: ScoringConfig,
}

impl DefaultCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// AHEAD factors in display order; each entry awards 0 or 1 point.
    fn ahead_factors(&self, input: &PatientInput) -> Vec<BreakdownEntry> {
        let c = &self.config.ahead;
        let hemoglobin_low = match input.sex {
            Sex::Male => input.hemoglobin < c.male_hemoglobin_below,
            Sex::Female => input.hemoglobin < c.female_hemoglobin_below,
        };
        vec![
            BreakdownEntry::new(
                "Age",
                format!("> {} years", c.age_over),
                u32::from(input.age > c.age_over),
            ),
            BreakdownEntry::new(
                "Atrial fibrillation",
                "present",
                u32::from(input.atrial_fibrillation),
            ),
            BreakdownEntry::new(
                "Hemoglobin",
                format!(
                    "male < {:.1} g/dL or female < {:.1} g/dL",
                    c.male_hemoglobin_below, c.female_hemoglobin_below
                ),
                u32::from(hemoglobin_low),
            ),
            BreakdownEntry::new(
                "Creatinine",
                format!("> {:.2} mg/dL", c.creatinine_over),
                u32::from(input.creatinine > c.creatinine_over),
            ),
            BreakdownEntry::new(
                "HbA1C",
                format!(">= {:.1} %", c.hba1c_at_least),
                u32::from(input.hba1c >= c.hba1c_at_least),
            ),
        ]
    }

    fn overall_factors(&self, input: &PatientInput, sub_score: u32) -> Vec<BreakdownEntry> {
        let c = &self.config.overall;
        let award = |hit: bool, points: u32| if hit { points } else { 0 };
        let nyha_classes = c
            .nyha_classes
            .iter()
            .map(|class| class.as_str())
            .collect::<Vec<_>>()
            .join(" or ");
        vec![
            BreakdownEntry::new(
                "Age",
                format!("> {} years", c.age_over),
                award(input.age > c.age_over, c.age_points),
            ),
            BreakdownEntry::new(
                "NYHA",
                format!("class {nyha_classes}"),
                award(nyha_matches(&c.nyha_classes, input.nyha), c.nyha_points),
            ),
            BreakdownEntry::new(
                "AHEAD score",
                format!("> {} points", c.ahead_over),
                award(f64::from(sub_score) > c.ahead_over, c.ahead_points),
            ),
            BreakdownEntry::new(
                "eGFR",
                format!("<= {:.2} mL/min/1.73m²", c.egfr_at_most),
                award(input.egfr <= c.egfr_at_most, c.egfr_points),
            ),
            BreakdownEntry::new(
                "BMI",
                format!("<= {:.1} kg/m²", c.bmi_at_most),
                award(input.bmi <= c.bmi_at_most, c.bmi_points),
            ),
        ]
    }
}

/// Validated tables cannot overflow; saturate for tables built without `validate()`.
fn total_points(entries: &[BreakdownEntry]) -> u32 {
    entries
        .iter()
        .fold(0, |total: u32, entry| total.saturating_add(entry.points))
}

fn nyha_matches(classes: &[NyhaClass], nyha: NyhaClass) -> bool {
    classes.contains(&nyha)
}

impl RiskCalculator for DefaultCalculator {
    #[instrument(
        name = "evaluate_patient",
        skip(self, input),
        fields(age = input.age, nyha = %input.nyha)
    )]
    fn evaluate(&self, input: &PatientInput) -> ScoreResult {
        let sub_score_breakdown = self.ahead_factors(input);
        let sub_score = total_points(&sub_score_breakdown);
        let sub_score_age_points = sub_score_breakdown[0].points;

        let breakdown = self.overall_factors(input, sub_score);
        let sub_score_contribution = breakdown[2].points;
        let overall_score = total_points(&breakdown);
        let risk_tier = RiskTier::from_score_with_thresholds(overall_score, &self.config.tiers);
        debug!(sub_score, overall_score, ?risk_tier, "evaluation completed");

        ScoreResult {
            sub_score,
            sub_score_age_points,
            sub_score_contribution,
            overall_score,
            risk_tier,
            sub_score_breakdown,
            breakdown,
        }
    }
}
