//! Tiercheck: validation and correction of time-aligned linguistic annotations.
//!
//! Tiercheck works on recordings segmented into parallel tiers (`phone`,
//! `word`, `phrase`, `notes`) as produced by Praat. It checks annotations
//! against an orthography and the IPA, looks up what is being said at a given
//! time, and applies logged, reversible-by-inspection label corrections.
//!
//! # Modules
//!
//! - [`ir`]: The annotation model and its TextGrid / JSON codecs
//! - [`index`]: Cross-tier temporal lookup
//! - [`reference`]: Orthography and IPA inventory
//! - [`validation`]: Structure, spelling and IPA checks with CSV/TSV reports
//! - [`correction`]: Grapheme, pattern, spelling and degenerate-entry fixes
//! - [`config`]: YAML run configuration
//! - [`batch`]: Input discovery and parallel processing
//! - [`error`]: Error types for tiercheck operations

pub mod batch;
pub mod config;
pub mod correction;
pub mod error;
pub mod index;
pub mod ir;
pub mod reference;
pub mod validation;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use batch::FileOutcome;
use config::{Config, LogPrefix};
use correction::AuditLog;
use ir::{Annotation, LoadOptions, ShapeRequirement};
use reference::Orthography;
use validation::{ReportFormat, ValidityReport};

pub use error::TiercheckError;

/// The tiercheck CLI application.
#[derive(Parser)]
#[command(name = "tiercheck")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML config file; command line flags take precedence.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Check tier structure, word spellings and IPA phones.
    Validate(ValidateArgs),
    /// Replace lookalike graphemes with proper IPA sequences.
    FixIpa(FixIpaArgs),
    /// Clean word and phrase tiers and recover misspelled words.
    FixTiers(FixTiersArgs),
    /// Show which intervals are active at a point in time.
    Lookup(LookupArgs),
    /// List vowels followed by a long silence.
    Finals(FinalsArgs),
}

/// Where to find the annotation files.
#[derive(clap::Args)]
struct InputArgs {
    /// Praat TextGrid file.
    #[arg(short = 't', long, value_name = "FILE")]
    textgrid: Option<PathBuf>,

    /// Directory of TextGrid files (not searched recursively).
    #[arg(short, long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Keep empty-labelled intervals when loading.
    #[arg(long)]
    include_empty: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormatArg {
    Csv,
    Tsv,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Csv => ReportFormat::Csv,
            ReportFormatArg::Tsv => ReportFormat::Tsv,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogPrefixArg {
    FileStem,
    FirstUnderscore,
}

impl From<LogPrefixArg> for LogPrefix {
    fn from(arg: LogPrefixArg) -> Self {
        match arg {
            LogPrefixArg::FileStem => LogPrefix::FileStem,
            LogPrefixArg::FirstUnderscore => LogPrefix::FirstUnderscore,
        }
    }
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Tab-separated orthography; first column is the word. Without it,
    /// words are not checked.
    #[arg(short, long, env = "TIERCHECK_ORTHOGRAPHY", value_name = "FILE")]
    orthography: Option<PathBuf>,

    /// Directory for validation_report and invalid_items_report.
    #[arg(long, default_value = ".", value_name = "DIR")]
    report_dir: PathBuf,

    /// Delimiter of the report files.
    #[arg(long, value_enum, default_value_t = ReportFormatArg::Csv)]
    report_format: ReportFormatArg,

    /// Output format for the per-file summaries.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Exit non-zero if any file is invalid.
    #[arg(long)]
    strict: bool,
}

/// Arguments for the fix-ipa subcommand.
#[derive(clap::Args)]
struct FixIpaArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Tier to correct; repeat for several (default: phone).
    #[arg(long = "tier", value_name = "NAME")]
    tiers: Vec<String>,

    #[command(flatten)]
    output: CorrectionOutputArgs,
}

/// Arguments for the fix-tiers subcommand.
#[derive(clap::Args)]
struct FixTiersArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Tab-separated orthography; first column is the word.
    #[arg(short, long, env = "TIERCHECK_ORTHOGRAPHY", value_name = "FILE")]
    orthography: PathBuf,

    #[command(flatten)]
    output: CorrectionOutputArgs,
}

/// Where corrected files and audit logs go.
#[derive(clap::Args)]
struct CorrectionOutputArgs {
    /// Directory for corrected files, written as `_<name>`.
    #[arg(long, default_value = ".", value_name = "DIR")]
    out_dir: PathBuf,

    /// Directory for audit logs (default: --out-dir).
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// How audit log names are prefixed.
    #[arg(long, value_enum)]
    log_prefix: Option<LogPrefixArg>,

    /// Replace corrected files that already exist.
    #[arg(long)]
    overwrite: bool,
}

/// Arguments for the lookup subcommand.
#[derive(clap::Args)]
struct LookupArgs {
    /// Annotation file (TextGrid or JSON model).
    input: PathBuf,

    /// Time in seconds.
    #[arg(long, allow_hyphen_values = true)]
    time: f64,

    /// Restrict the lookup to one tier.
    #[arg(long)]
    tier: Option<String>,

    /// Find the interval whose end is within --tolerance of --time.
    #[arg(long, requires = "tier", conflicts_with = "nearest")]
    end: bool,

    /// Find the interval with an endpoint closest to --time.
    #[arg(long, requires = "tier")]
    nearest: bool,

    /// Tolerance for --end, in seconds (default from config: 0.01).
    #[arg(long)]
    tolerance: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Arguments for the finals subcommand.
#[derive(clap::Args)]
struct FinalsArgs {
    /// Annotation file (TextGrid or JSON model).
    input: PathBuf,

    /// Minimum silence after the vowel, in seconds (default from config: 0.3).
    #[arg(long)]
    min_silence: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Run the tiercheck CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), TiercheckError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Some(Commands::Validate(args)) => run_validate(args, config),
        Some(Commands::FixIpa(args)) => run_fix_ipa(args, config),
        Some(Commands::FixTiers(args)) => run_fix_tiers(args, config),
        Some(Commands::Lookup(args)) => run_lookup(args, config),
        Some(Commands::Finals(args)) => run_finals(args, config),
        None => {
            println!("tiercheck {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Validation and correction of time-aligned annotations.");
            println!();
            println!("Run 'tiercheck --help' for usage information.");
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when run() is embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn collect_inputs(input: &InputArgs, config: &Config) -> Result<Vec<PathBuf>, TiercheckError> {
    batch::collect_input_paths(
        input.textgrid.as_deref(),
        input.directory.as_deref(),
        &config.suffix,
    )
}

fn create_dir(path: &Path) -> Result<(), TiercheckError> {
    fs::create_dir_all(path).map_err(|source| TiercheckError::Write {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// validate
// ============================================================================

fn run_validate(args: ValidateArgs, mut config: Config) -> Result<(), TiercheckError> {
    config.include_empty |= args.input.include_empty;
    let paths = collect_inputs(&args.input, &config)?;

    let orthography = match &args.orthography {
        None => {
            tracing::warn!(
                "no orthography given with --orthography; words will not be checked for spelling"
            );
            None
        }
        Some(path) if !path.exists() => {
            tracing::warn!(path = %path.display(), "orthography does not exist; words will not be checked");
            None
        }
        Some(path) => Some(Orthography::load(path)?),
    };
    let ipa = config.ipa_inventory();
    let opts = LoadOptions::new(config.include_empty, ShapeRequirement::Unchecked);

    let outcomes = batch::process_files(&paths, |path| {
        let annotation = Annotation::load(path, &opts)?;
        Ok(validation::validate_annotation(
            &annotation,
            orthography.as_ref(),
            &ipa,
        ))
    });
    let failed = batch::failure_count(&outcomes);
    let reports: Vec<ValidityReport> = outcomes.into_iter().filter_map(|o| o.result.ok()).collect();

    let format = ReportFormat::from(args.report_format);
    create_dir(&args.report_dir)?;
    let rows: Vec<_> = reports.iter().map(ValidityReport::to_row).collect();
    let items: Vec<_> = reports.iter().flat_map(ValidityReport::invalid_items).collect();
    validation::write_validity_rows(
        &args.report_dir.join(validation::validity_report_name(format)),
        &rows,
        format,
    )?;
    validation::write_invalid_items(
        &args.report_dir.join(validation::invalid_items_report_name(format)),
        &items,
        format,
    )?;

    match args.output {
        OutputFormat::Json => {
            let views: Vec<_> = reports.iter().map(ValidityReport::with_issues).collect();
            let json = serde_json::to_string_pretty(&views).map_err(|source| {
                TiercheckError::JsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for report in &reports {
                println!("{}", report);
            }
        }
    }

    let invalid = reports.iter().filter(|r| !r.is_valid()).count();
    tracing::info!(
        files = paths.len(),
        invalid,
        failed,
        report_dir = %args.report_dir.display(),
        "validation finished"
    );

    if failed > 0 {
        return Err(TiercheckError::BatchFailed {
            failed,
            total: paths.len(),
        });
    }
    if args.strict && invalid > 0 {
        return Err(TiercheckError::ValidationFailed {
            invalid,
            total: reports.len(),
        });
    }
    Ok(())
}

// ============================================================================
// fix-ipa / fix-tiers
// ============================================================================

struct CorrectionSettings {
    out_dir: PathBuf,
    log_dir: PathBuf,
    log_prefix: LogPrefix,
    overwrite: bool,
    load: LoadOptions,
}

impl CorrectionSettings {
    fn new(args: &CorrectionOutputArgs, input: &InputArgs, config: &Config) -> Self {
        Self {
            out_dir: args.out_dir.clone(),
            log_dir: args.log_dir.clone().unwrap_or_else(|| args.out_dir.clone()),
            log_prefix: args.log_prefix.map(LogPrefix::from).unwrap_or(config.log_prefix),
            overwrite: args.overwrite,
            load: LoadOptions::new(
                config.include_empty || input.include_empty,
                ShapeRequirement::Strict,
            ),
        }
    }

    /// Loads, corrects, saves the corrected copy and writes the logs.
    fn correct_file<F>(&self, path: &Path, correct: F) -> Result<CorrectedFile, TiercheckError>
    where
        F: Fn(&mut Annotation) -> Result<Vec<AuditLog>, correction::CorrectionError>,
    {
        let mut annotation = Annotation::load(path, &self.load)?;
        let output = batch::corrected_output_path(path, &self.out_dir);
        if !self.overwrite && output.exists() {
            return Err(TiercheckError::OutputExists { path: output });
        }

        let logs = correct(&mut annotation).map_err(|source| TiercheckError::Correction {
            path: path.to_path_buf(),
            source,
        })?;
        annotation.save(&output, self.overwrite)?;

        let prefix = self.log_prefix.for_path(path);
        for log in &logs {
            log.save(&self.log_dir, &prefix)?;
        }
        Ok(CorrectedFile {
            output,
            changes: logs.iter().map(AuditLog::len).sum(),
        })
    }

    fn prepare_dirs(&self) -> Result<(), TiercheckError> {
        create_dir(&self.out_dir)?;
        create_dir(&self.log_dir)
    }
}

struct CorrectedFile {
    output: PathBuf,
    changes: usize,
}

fn report_corrections(outcomes: &[FileOutcome<CorrectedFile>]) -> Result<(), TiercheckError> {
    for outcome in outcomes {
        if let Ok(file) = &outcome.result {
            println!(
                "{}: {} change(s) -> {}",
                outcome.path.display(),
                file.changes,
                file.output.display()
            );
        }
    }
    let failed = batch::failure_count(outcomes);
    if failed > 0 {
        return Err(TiercheckError::BatchFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}

fn run_fix_ipa(args: FixIpaArgs, config: Config) -> Result<(), TiercheckError> {
    let paths = collect_inputs(&args.input, &config)?;
    let map = config.grapheme_map()?;
    let tiers = if args.tiers.is_empty() {
        config.grapheme_tiers.clone()
    } else {
        args.tiers
    };
    let settings = CorrectionSettings::new(&args.output, &args.input, &config);
    settings.prepare_dirs()?;

    let outcomes = batch::process_files(&paths, |path| {
        settings.correct_file(path, |annotation| {
            correction::fix_ipa(annotation, &map, &tiers)
        })
    });
    report_corrections(&outcomes)
}

fn run_fix_tiers(args: FixTiersArgs, config: Config) -> Result<(), TiercheckError> {
    let paths = collect_inputs(&args.input, &config)?;
    let orthography = Orthography::load(&args.orthography)?;
    let opts = config.tier_fix_options();
    let settings = CorrectionSettings::new(&args.output, &args.input, &config);
    settings.prepare_dirs()?;

    let outcomes = batch::process_files(&paths, |path| {
        settings.correct_file(path, |annotation| {
            correction::fix_tiers(annotation, &orthography, &opts)
        })
    });
    report_corrections(&outcomes)
}

// ============================================================================
// lookup / finals
// ============================================================================

fn load_for_lookup(path: &Path, config: &Config) -> Result<Annotation, TiercheckError> {
    Annotation::load(
        path,
        &LoadOptions::new(config.include_empty, ShapeRequirement::Lenient),
    )
}

fn run_lookup(args: LookupArgs, config: Config) -> Result<(), TiercheckError> {
    let annotation = load_for_lookup(&args.input, &config)?;
    let temporal = index::build_index(&annotation);

    let hits: Vec<&index::IndexHit> = match args.tier.as_deref() {
        Some(tier) if args.end => {
            let tolerance = args.tolerance.unwrap_or(config.end_tolerance);
            temporal.find_at_endtime(tier, args.time, tolerance).into_iter().collect()
        }
        Some(tier) if args.nearest => temporal.nearest_boundary(tier, args.time).into_iter().collect(),
        Some(tier) => temporal.hit_at(tier, args.time).into_iter().collect(),
        None => temporal.query_at(args.time),
    };
    tracing::debug!(time = args.time, hits = hits.len(), "lookup finished");

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&hits).map_err(|source| {
                TiercheckError::JsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for hit in hits {
                println!("{}\t{}\t{}\t{}", hit.tier, hit.start, hit.end, hit.label);
            }
        }
    }
    Ok(())
}

fn run_finals(args: FinalsArgs, config: Config) -> Result<(), TiercheckError> {
    let annotation = load_for_lookup(&args.input, &config)?;
    let mut opts = config.final_vowel_options();
    if let Some(min_silence) = args.min_silence {
        opts.min_silence = min_silence;
    }

    let finals = index::phrase_final_vowels(&annotation, &opts)
        .map_err(|source| TiercheckError::structural(&args.input, source))?;

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&finals).map_err(|source| {
                TiercheckError::JsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for vowel in &finals {
                println!(
                    "{}\t{}\t{}\t{:.3}",
                    vowel.interval.start(),
                    vowel.interval.end(),
                    vowel.interval.label(),
                    vowel.silence
                );
            }
        }
    }
    Ok(())
}
