use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::patient::PatientInput;

/// A patient entry read from a batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Optional caller-side identifier, echoed back in reports.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub input: PatientInput,
}

/// Abstraction over where batch inputs come from (files, stdin, in-memory fixtures).
pub trait PatientSource: Send + Sync {
    /// Retrieve every patient record in the source.
    fn load_patients(&self) -> Result<Vec<PatientRecord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Json5,
    Yaml,
}

impl FileFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "json5" => Ok(Self::Json5),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(anyhow!(
                "unsupported patient file extension for {} (expected .json, .json5, .yaml or .yml)",
                path.display()
            )),
        }
    }
}

/// Loads patient records from a `.json`, `.json5` or `.yaml` file holding a list of records.
pub struct FilePatientSource {
    path: PathBuf,
    cache: OnceCell<Vec<PatientRecord>>,
}

impl FilePatientSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<Vec<PatientRecord>> {
        let format = FileFormat::from_path(&self.path)?;
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read patient file at {}", self.path.display()))?;
        let values: Vec<serde_json::Value> = match format {
            FileFormat::Json => serde_json::from_str(&raw).map_err(anyhow::Error::from),
            FileFormat::Json5 => json5::from_str(&raw).map_err(anyhow::Error::from),
            FileFormat::Yaml => serde_yaml::from_str(&raw).map_err(anyhow::Error::from),
        }
        .with_context(|| {
            format!(
                "patient file at {} must contain a list of records",
                self.path.display()
            )
        })?;

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(values.len());
        for (idx, value) in values.into_iter().enumerate() {
            let record: PatientRecord = serde_json::from_value(value).with_context(|| {
                format!("invalid patient record #{} in {}", idx + 1, self.path.display())
            })?;
            if let Some(id) = &record.id {
                if !seen.insert(id.clone()) {
                    return Err(anyhow!("duplicate patient id `{id}`"));
                }
            }
            trace!(index = idx, id = ?record.id, "loaded patient record");
            records.push(record);
        }
        Ok(records)
    }
}

impl PatientSource for FilePatientSource {
    fn load_patients(&self) -> Result<Vec<PatientRecord>> {
        let records = self.cache.get_or_try_init(|| self.read_records())?;
        Ok(records.clone())
    }
}
