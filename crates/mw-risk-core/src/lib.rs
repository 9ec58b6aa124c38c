pub mod calculator;
pub mod patient;
pub mod report;

use once_cell::sync::Lazy;

pub use calculator::{
    default_calculator::DefaultCalculator,
    file_source::{FilePatientSource, PatientRecord, PatientSource},
    AheadCriteria, BreakdownEntry, ConfigValidationError, OverallCriteria, RiskCalculator,
    RiskTier, ScoreResult, ScoringConfig, TierThresholds,
};
pub use patient::{NyhaClass, ParseFieldError, PatientInput, PatientValidationError, Sex};

static PUBLISHED: Lazy<DefaultCalculator> = Lazy::new(DefaultCalculator::new);

/// Score a validated input against the published thresholds.
pub fn evaluate(input: &PatientInput) -> ScoreResult {
    PUBLISHED.evaluate(input)
}
