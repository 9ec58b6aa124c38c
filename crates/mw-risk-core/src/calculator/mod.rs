use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patient::{NyhaClass, PatientInput, PatientValidationError};

pub mod default_calculator;
/// Batch loading of patient records from JSON, JSON5 or YAML files.
pub mod file_source;

/// Score bands that map the overall score into risk tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Lowest overall score classified as intermediate risk.
    pub intermediate: u32,
    /// Lowest overall score classified as high risk.
    pub high: u32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            intermediate: 7,
            high: 11,
        }
    }
}

/// Classification buckets for the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Intermediate,
    High,
}

impl RiskTier {
    /// Map an overall score into a tier using the published bands.
    pub fn from_score(score: u32) -> Self {
        Self::from_score_with_thresholds(score, &TierThresholds::default())
    }

    /// Map an overall score using caller-provided bands.
    pub fn from_score_with_thresholds(score: u32, thresholds: &TierThresholds) -> Self {
        if score >= thresholds.high {
            Self::High
        } else if score >= thresholds.intermediate {
            Self::Intermediate
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Intermediate => "Intermediate Risk",
            Self::High => "High Risk",
        }
    }
}

/// Cut-offs for the five AHEAD factors. Each triggered factor adds one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AheadCriteria {
    pub age_over: u32,
    pub male_hemoglobin_below: f64,
    pub female_hemoglobin_below: f64,
    pub creatinine_over: f64,
    pub hba1c_at_least: f64,
}

impl Default for AheadCriteria {
    fn default() -> Self {
        Self {
            age_over: 70,
            male_hemoglobin_below: 13.0,
            female_hemoglobin_below: 12.0,
            creatinine_over: 1.47,
            hba1c_at_least: 6.5,
        }
    }
}

/// Cut-offs and weights for the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverallCriteria {
    pub age_over: u32,
    pub age_points: u32,
    pub nyha_classes: Vec<NyhaClass>,
    pub nyha_points: u32,
    /// Compared against the AHEAD total as a real number.
    pub ahead_over: f64,
    pub ahead_points: u32,
    pub egfr_at_most: f64,
    pub egfr_points: u32,
    pub bmi_at_most: f64,
    pub bmi_points: u32,
}

impl Default for OverallCriteria {
    fn default() -> Self {
        Self {
            age_over: 75,
            age_points: 5,
            nyha_classes: vec![NyhaClass::II, NyhaClass::IV],
            nyha_points: 4,
            ahead_over: 1.5,
            ahead_points: 3,
            egfr_at_most: 56.45,
            egfr_points: 2,
            bmi_at_most: 22.5,
            bmi_points: 1,
        }
    }
}

/// Complete threshold table driving the calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub ahead: AheadCriteria,
    pub overall: OverallCriteria,
    pub tiers: TierThresholds,
}

impl ScoringConfig {
    /// Validate invariants for a (possibly user-supplied) threshold table.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let cutoffs = [
            ("ahead.male_hemoglobin_below", self.ahead.male_hemoglobin_below),
            ("ahead.female_hemoglobin_below", self.ahead.female_hemoglobin_below),
            ("ahead.creatinine_over", self.ahead.creatinine_over),
            ("ahead.hba1c_at_least", self.ahead.hba1c_at_least),
            ("overall.ahead_over", self.overall.ahead_over),
            ("overall.egfr_at_most", self.overall.egfr_at_most),
            ("overall.bmi_at_most", self.overall.bmi_at_most),
        ];
        for (key, value) in cutoffs {
            if !value.is_finite() {
                return Err(ConfigValidationError::NonFiniteCutoff {
                    key: key.into(),
                    value,
                });
            }
        }
        if self.overall.nyha_classes.is_empty() {
            return Err(ConfigValidationError::EmptyNyhaClasses);
        }
        let o = &self.overall;
        [o.nyha_points, o.ahead_points, o.egfr_points, o.bmi_points]
            .into_iter()
            .try_fold(o.age_points, u32::checked_add)
            .ok_or(ConfigValidationError::PointsOverflow)?;
        if self.tiers.intermediate == 0 || self.tiers.intermediate >= self.tiers.high {
            return Err(ConfigValidationError::InvalidTiers {
                intermediate: self.tiers.intermediate,
                high: self.tiers.high,
            });
        }
        Ok(())
    }

    /// Highest overall score reachable with these weights, saturating for unvalidated tables.
    pub fn max_overall_score(&self) -> u32 {
        let o = &self.overall;
        [o.nyha_points, o.ahead_points, o.egfr_points, o.bmi_points]
            .into_iter()
            .fold(o.age_points, u32::saturating_add)
    }
}

/// Errors emitted while validating a scoring configuration.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigValidationError {
    #[error("cut-off `{key}` must be a finite number (got {value})")]
    NonFiniteCutoff { key: String, value: f64 },
    #[error("overall.nyha_classes must list at least one class")]
    EmptyNyhaClasses,
    #[error("overall factor points must sum to at most {} in total", u32::MAX)]
    PointsOverflow,
    #[error(
        "tier thresholds must satisfy 0 < intermediate < high (got intermediate {intermediate}, high {high})"
    )]
    InvalidTiers { intermediate: u32, high: u32 },
}

/// One row of a score breakdown table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub factor: String,
    /// Trigger condition rendered from the active cut-offs.
    pub condition: String,
    /// Points actually awarded for this factor.
    pub points: u32,
}

impl BreakdownEntry {
    pub fn new(factor: impl Into<String>, condition: impl Into<String>, points: u32) -> Self {
        Self {
            factor: factor.into(),
            condition: condition.into(),
            points,
        }
    }
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// AHEAD total (0–5 with the published criteria).
    pub sub_score: u32,
    /// Points the AHEAD age factor contributed to `sub_score`.
    pub sub_score_age_points: u32,
    /// Points the AHEAD total contributed to the overall score.
    pub sub_score_contribution: u32,
    pub overall_score: u32,
    pub risk_tier: RiskTier,
    pub sub_score_breakdown: Vec<BreakdownEntry>,
    pub breakdown: Vec<BreakdownEntry>,
}

/// Primary scoring interface mapping patient measurements to a result.
pub trait RiskCalculator: Send + Sync {
    /// Score an already validated input. Never fails.
    fn evaluate(&self, input: &PatientInput) -> ScoreResult;

    /// Validate the input first, rejecting out-of-range values instead of clamping them.
    fn try_evaluate(&self, input: &PatientInput) -> Result<ScoreResult, PatientValidationError> {
        input.validate()?;
        Ok(self.evaluate(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_tier_boundaries_match_published_bands() {
        assert_eq!(RiskTier::from_score(0), RiskTier::Low);
        assert_eq!(RiskTier::from_score(6), RiskTier::Low);
        assert_eq!(RiskTier::from_score(7), RiskTier::Intermediate);
        assert_eq!(RiskTier::from_score(10), RiskTier::Intermediate);
        assert_eq!(RiskTier::from_score(11), RiskTier::High);
        assert_eq!(RiskTier::from_score(15), RiskTier::High);
    }

    #[test]
    fn custom_tier_thresholds_are_respected() {
        let thresholds = TierThresholds {
            intermediate: 3,
            high: 5,
        };
        assert_eq!(
            RiskTier::from_score_with_thresholds(2, &thresholds),
            RiskTier::Low
        );
        assert_eq!(
            RiskTier::from_score_with_thresholds(4, &thresholds),
            RiskTier::Intermediate
        );
        assert_eq!(
            RiskTier::from_score_with_thresholds(5, &thresholds),
            RiskTier::High
        );
    }

    #[test]
    fn default_config_is_valid_and_caps_at_fifteen() {
        let config = ScoringConfig::default();
        config.validate().expect("published table should validate");
        assert_eq!(config.max_overall_score(), 15);
    }

    #[test]
    fn config_validation_rejects_inverted_tiers() {
        let config = ScoringConfig {
            tiers: TierThresholds {
                intermediate: 11,
                high: 7,
            },
            ..ScoringConfig::default()
        };
        let err = config.validate().expect_err("inverted tiers should fail");
        assert!(matches!(
            err,
            ConfigValidationError::InvalidTiers {
                intermediate: 11,
                high: 7
            }
        ));
    }

    #[test]
    fn config_validation_rejects_nan_and_empty_nyha() {
        let mut config = ScoringConfig::default();
        config.overall.egfr_at_most = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::NonFiniteCutoff { ref key, .. }) if key == "overall.egfr_at_most"
        ));

        let mut config = ScoringConfig::default();
        config.overall.nyha_classes.clear();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyNyhaClasses)
        );
    }

    #[test]
    fn config_validation_rejects_point_totals_that_overflow() {
        let config = ScoringConfig {
            overall: OverallCriteria {
                age_points: u32::MAX,
                ..OverallCriteria::default()
            },
            ..ScoringConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigValidationError::PointsOverflow));
        assert_eq!(config.max_overall_score(), u32::MAX);

        let config = ScoringConfig {
            overall: OverallCriteria {
                age_points: u32::MAX - 10,
                ..OverallCriteria::default()
            },
            ..ScoringConfig::default()
        };
        config.validate().expect("total of exactly u32::MAX is representable");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"tiers": {"high": 12}}"#).expect("partial config parses");
        assert_eq!(config.tiers.high, 12);
        assert_eq!(config.tiers.intermediate, 7);
        assert_eq!(config.overall, OverallCriteria::default());
    }
}
