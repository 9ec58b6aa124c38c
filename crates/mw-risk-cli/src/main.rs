mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::{ColoredString, Colorize};
use mw_risk_core::{
    report::{render_batch, render_report, OutputFormat},
    DefaultCalculator, FilePatientSource, NyhaClass, PatientInput, PatientSource, RiskCalculator,
    RiskTier, ScoringConfig, Sex,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mw-risk",
    author,
    version,
    about = "Muscle weakness risk calculator for heart failure patients"
)]
struct Cli {
    /// Scoring configuration file overriding the published thresholds (TOML, YAML, JSON, JSON5)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a single patient from command-line measurements
    Evaluate {
        #[command(flatten)]
        patient: PatientArgs,

        /// Output format for the report
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },
    /// Score every patient listed in a JSON, JSON5 or YAML file
    Batch {
        /// Patient file containing a list of records
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Output format for the batch report
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },
    /// Show the active scoring thresholds
    Thresholds {
        /// Emit thresholds as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct PatientArgs {
    /// Sex (male or female)
    #[arg(long, default_value = "male")]
    sex: Sex,

    /// Age in years (18-120)
    #[arg(long, default_value_t = 65)]
    age: u32,

    /// NYHA class (I, II, III or IV)
    #[arg(long, default_value = "I")]
    nyha: NyhaClass,

    /// Patient has atrial fibrillation
    #[arg(long = "atrial-fibrillation", visible_alias = "af")]
    atrial_fibrillation: bool,

    /// Hemoglobin in g/dL (5.0-20.0)
    #[arg(long, default_value_t = 14.0)]
    hemoglobin: f64,

    /// HbA1C in % (4.0-15.0)
    #[arg(long, default_value_t = 5.5)]
    hba1c: f64,

    /// Creatinine in mg/dL (>= 0.5)
    #[arg(long, default_value_t = 1.0)]
    creatinine: f64,

    /// eGFR in mL/min/1.73m² (10.0-150.0)
    #[arg(long, default_value_t = 70.0)]
    egfr: f64,

    /// BMI in kg/m² (15.0-40.0)
    #[arg(long, default_value_t = 25.0)]
    bmi: f64,
}

impl From<PatientArgs> for PatientInput {
    fn from(args: PatientArgs) -> Self {
        Self {
            sex: args.sex,
            age: args.age,
            nyha: args.nyha,
            atrial_fibrillation: args.atrial_fibrillation,
            hemoglobin: args.hemoglobin,
            hba1c: args.hba1c,
            creatinine: args.creatinine,
            egfr: args.egfr,
            bmi: args.bmi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
    Markdown,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Human => OutputFormat::Human,
            Format::Json => OutputFormat::Json,
            Format::Markdown => OutputFormat::Markdown,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    let scoring = settings::load_scoring_config(cli.config.as_deref())?;
    let calculator = DefaultCalculator::with_config(scoring);

    match cli.command.unwrap_or(Commands::Thresholds { json: false }) {
        Commands::Evaluate { patient, format } => evaluate(&calculator, patient.into(), format)?,
        Commands::Batch { path, format } => batch(&calculator, &path, format)?,
        Commands::Thresholds { json } => thresholds(calculator.config(), json)?,
    }
    Ok(())
}

fn evaluate(calculator: &DefaultCalculator, input: PatientInput, format: Format) -> Result<()> {
    let result = calculator
        .try_evaluate(&input)
        .context("patient measurements are out of range")?;
    print!("{}", render_report(&result, format.into())?);
    if format == Format::Human {
        println!();
        println!("This score indicates: {}", tier_badge(result.risk_tier));
    } else if format == Format::Json {
        println!();
    }
    Ok(())
}

fn batch(calculator: &DefaultCalculator, path: &Path, format: Format) -> Result<()> {
    let source = FilePatientSource::new(path);
    let records = source
        .load_patients()
        .with_context(|| format!("failed to load patients from {}", path.display()))?;
    info!(count = records.len(), path = %path.display(), "scoring patient batch");

    let entries: Vec<_> = records
        .into_iter()
        .map(|record| {
            let result = calculator.evaluate(&record.input);
            (record, result)
        })
        .collect();
    print!("{}", render_batch(&entries, format.into())?);
    if format == Format::Json {
        println!();
    }
    Ok(())
}

fn thresholds(config: &ScoringConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let ahead = &config.ahead;
    println!("AHEAD score (1 point each):");
    println!("- {:<20} > {} years", "Age", ahead.age_over);
    println!("- {:<20} present", "Atrial fibrillation");
    println!(
        "- {:<20} male < {:.1} g/dL, female < {:.1} g/dL",
        "Hemoglobin", ahead.male_hemoglobin_below, ahead.female_hemoglobin_below
    );
    println!("- {:<20} > {:.2} mg/dL", "Creatinine", ahead.creatinine_over);
    println!("- {:<20} >= {:.1} %", "HbA1C", ahead.hba1c_at_least);

    let overall = &config.overall;
    let nyha: Vec<_> = overall.nyha_classes.iter().map(|c| c.as_str()).collect();
    println!();
    println!("Overall score (max {} points):", config.max_overall_score());
    println!(
        "- {:<20} > {} years{:>10}",
        "Age",
        overall.age_over,
        points(overall.age_points)
    );
    println!(
        "- {:<20} class {}{:>10}",
        "NYHA",
        nyha.join(" or "),
        points(overall.nyha_points)
    );
    println!(
        "- {:<20} > {} points{:>10}",
        "AHEAD score",
        overall.ahead_over,
        points(overall.ahead_points)
    );
    println!(
        "- {:<20} <= {:.2} mL/min/1.73m²{:>10}",
        "eGFR",
        overall.egfr_at_most,
        points(overall.egfr_points)
    );
    println!(
        "- {:<20} <= {:.1} kg/m²{:>10}",
        "BMI",
        overall.bmi_at_most,
        points(overall.bmi_points)
    );

    let tiers = &config.tiers;
    println!();
    println!("Risk tiers:");
    println!(
        "- {}: score <= {}",
        tier_badge(RiskTier::Low),
        tiers.intermediate - 1
    );
    println!(
        "- {}: {} <= score <= {}",
        tier_badge(RiskTier::Intermediate),
        tiers.intermediate,
        tiers.high - 1
    );
    println!("- {}: score >= {}", tier_badge(RiskTier::High), tiers.high);
    Ok(())
}

fn points(value: u32) -> String {
    format!("+{value}")
}

fn tier_badge(tier: RiskTier) -> ColoredString {
    let label = tier.label().bold();
    match tier {
        RiskTier::Low => label.green(),
        RiskTier::Intermediate => label.truecolor(255, 165, 0),
        RiskTier::High => label.red(),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
