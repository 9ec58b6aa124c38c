use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use mw_risk_core::ScoringConfig;

pub const ENV_PREFIX: &str = "MW_RISK";

/// Build the scoring table from the published defaults, an optional file, then environment overrides.
///
/// * `--config <FILE>` — TOML, YAML, JSON or JSON5, picked by extension.
/// * `MW_RISK_<SECTION>__<KEY>` — e.g. `MW_RISK_TIERS__HIGH=12`. Scalar keys only:
///   list keys such as `overall.nyha_classes` can only be set from the file.
pub fn load_scoring_config(path: Option<&Path>) -> Result<ScoringConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let source = match path {
        Some(path) => format!("config file {}", path.display()),
        None => "environment".to_string(),
    };
    let scoring: ScoringConfig = builder
        .build()
        .with_context(|| format!("failed to read scoring configuration from {source}"))?
        .try_deserialize()
        .with_context(|| format!("invalid scoring configuration in {source}"))?;
    scoring
        .validate()
        .with_context(|| format!("invalid scoring configuration in {source}"))?;
    Ok(scoring)
}
