use std::{fmt, ops::RangeInclusive, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const AGE_RANGE: RangeInclusive<u32> = 18..=120;
pub const HEMOGLOBIN_RANGE: RangeInclusive<f64> = 5.0..=20.0;
pub const HBA1C_RANGE: RangeInclusive<f64> = 4.0..=15.0;
/// Creatinine has a floor but no ceiling.
pub const CREATININE_MIN: f64 = 0.5;
pub const EGFR_RANGE: RangeInclusive<f64> = 10.0..=150.0;
pub const BMI_RANGE: RangeInclusive<f64> = 15.0..=40.0;

/// Biological sex, used by the sex-specific hemoglobin cut-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => f.write_str("male"),
            Self::Female => f.write_str("female"),
        }
    }
}

impl FromStr for Sex {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            _ => Err(ParseFieldError::Sex(s.to_string())),
        }
    }
}

/// New York Heart Association functional classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NyhaClass {
    I,
    II,
    III,
    IV,
}

impl NyhaClass {
    pub const ALL: [NyhaClass; 4] = [Self::I, Self::II, Self::III, Self::IV];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::IV => "IV",
        }
    }
}

impl fmt::Display for NyhaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NyhaClass {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" | "1" => Ok(Self::I),
            "II" | "2" => Ok(Self::II),
            "III" | "3" => Ok(Self::III),
            "IV" | "4" => Ok(Self::IV),
            _ => Err(ParseFieldError::Nyha(s.to_string())),
        }
    }
}

/// Errors raised when parsing categorical fields from free text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseFieldError {
    #[error("unknown sex `{0}` (expected male or female)")]
    Sex(String),
    #[error("unknown NYHA class `{0}` (expected I, II, III or IV)")]
    Nyha(String),
}

/// The nine measurements collected for a single evaluation.
///
/// Values coming from files are validated while deserializing; values built
/// in code should go through [`PatientInput::validated`] before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPatientInput")]
pub struct PatientInput {
    pub sex: Sex,
    /// Age in whole years.
    pub age: u32,
    pub nyha: NyhaClass,
    pub atrial_fibrillation: bool,
    /// Hemoglobin in g/dL.
    pub hemoglobin: f64,
    /// HbA1C in %.
    pub hba1c: f64,
    /// Serum creatinine in mg/dL.
    pub creatinine: f64,
    /// eGFR in mL/min/1.73m².
    pub egfr: f64,
    /// Body-mass index in kg/m².
    pub bmi: f64,
}

impl Default for PatientInput {
    fn default() -> Self {
        Self {
            sex: Sex::Male,
            age: 65,
            nyha: NyhaClass::I,
            atrial_fibrillation: false,
            hemoglobin: 14.0,
            hba1c: 5.5,
            creatinine: 1.0,
            egfr: 70.0,
            bmi: 25.0,
        }
    }
}

impl PatientInput {
    /// Validate every measurement against its accepted domain.
    pub fn validate(&self) -> Result<(), PatientValidationError> {
        if !AGE_RANGE.contains(&self.age) {
            return Err(PatientValidationError::OutOfRange {
                field: "age".into(),
                value: f64::from(self.age),
                min: f64::from(*AGE_RANGE.start()),
                max: f64::from(*AGE_RANGE.end()),
            });
        }
        check_range("hemoglobin", self.hemoglobin, &HEMOGLOBIN_RANGE)?;
        check_range("hba1c", self.hba1c, &HBA1C_RANGE)?;
        check_finite("creatinine", self.creatinine)?;
        if self.creatinine < CREATININE_MIN {
            return Err(PatientValidationError::BelowMinimum {
                field: "creatinine".into(),
                value: self.creatinine,
                min: CREATININE_MIN,
            });
        }
        check_range("egfr", self.egfr, &EGFR_RANGE)?;
        check_range("bmi", self.bmi, &BMI_RANGE)?;
        Ok(())
    }

    /// Consume the input, returning it only if it passes [`validate`](Self::validate).
    pub fn validated(self) -> Result<Self, PatientValidationError> {
        self.validate()?;
        Ok(self)
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), PatientValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PatientValidationError::NonFinite {
            field: field.into(),
            value,
        })
    }
}

fn check_range(
    field: &str,
    value: f64,
    range: &RangeInclusive<f64>,
) -> Result<(), PatientValidationError> {
    check_finite(field, value)?;
    if range.contains(&value) {
        Ok(())
    } else {
        Err(PatientValidationError::OutOfRange {
            field: field.into(),
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Errors emitted while validating patient measurements.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatientValidationError {
    #[error("{field} must be a finite number (got {value})")]
    NonFinite { field: String, value: f64 },
    #[error("{field} must be within {min}..={max} (got {value})")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be at least {min} (got {value})")]
    BelowMinimum { field: String, value: f64, min: f64 },
}

impl PatientValidationError {
    pub fn field(&self) -> &str {
        match self {
            Self::NonFinite { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::BelowMinimum { field, .. } => field,
        }
    }
}

#[derive(Deserialize)]
struct RawPatientInput {
    sex: Sex,
    age: u32,
    nyha: NyhaClass,
    #[serde(default)]
    atrial_fibrillation: bool,
    hemoglobin: f64,
    hba1c: f64,
    creatinine: f64,
    egfr: f64,
    bmi: f64,
}

impl TryFrom<RawPatientInput> for PatientInput {
    type Error = PatientValidationError;

    fn try_from(raw: RawPatientInput) -> Result<Self, Self::Error> {
        PatientInput {
            sex: raw.sex,
            age: raw.age,
            nyha: raw.nyha,
            atrial_fibrillation: raw.atrial_fibrillation,
            hemoglobin: raw.hemoglobin,
            hba1c: raw.hba1c,
            creatinine: raw.creatinine,
            egfr: raw.egfr,
            bmi: raw.bmi,
        }
        .validated()
    }
}
