//! hmm-stream CLI.
//!
//! Loads a model set and classifies discrete observation streams online:
//! - `check`: validate the model set
//! - `classify`: push symbols from a file or stdin, one decision per sequence
//! - `peek`: lookahead decisions for every next symbol after a prefix

use clap::{Args, Parser, Subcommand};
use hs_common::error::format_error_human;
use hs_common::{Error, OutputFormat, StructuredError, SCHEMA_VERSION};
use hs_config::resolve::ENV_MODELS_PATH;
use hs_config::{load_model_set, resolve_model_path, ConfigSource, ModelSet, ValidationError};
use hs_core::exit_codes::ExitCode;
use hs_core::input::{parse_symbols, InputError};
use hs_core::logging::{generate_run_id, init_logging, LogConfig};
use hs_core::{Decision, MarkovClassifier, RunningMarkovClassifier};
use serde::Serialize;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::{Path, PathBuf};

/// hmm-stream - online HMM sequence classification
#[derive(Parser)]
#[command(name = "hs-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Model-set file (JSON, or TOML by extension)
    #[arg(long, short = 'm', global = true)]
    models: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the model set and print its shape
    Check,

    /// Classify observation sequences; blank lines separate sequences
    Classify(ClassifyArgs),

    /// Predict the decision for every possible next symbol after a prefix
    Peek(PeekArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Input file of whitespace-separated symbols; stdin when absent or "-"
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PeekArgs {
    /// Observed prefix as symbol indices
    prefix: Vec<usize>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error(transparent)]
    Input(#[from] InputError),
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Core(Error::Io(err))
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::Core(err.into())
    }
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Core(err) => ExitCode::from(err),
            CliError::Input(_) => ExitCode::ArgsError,
        }
    }
}

type CliResult = Result<ExitCode, CliError>;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(None, None);
    let level = log_config
        .level
        .adjusted(cli.global.verbose, cli.global.quiet);
    init_logging(&log_config.with_level(level));

    let run_id = generate_run_id();
    tracing::debug!(%run_id, format = %cli.global.format, "starting");

    let result = match &cli.command {
        Commands::Check => run_check(&cli.global),
        Commands::Classify(args) => run_classify(&cli.global, args, &run_id),
        Commands::Peek(args) => run_peek(&cli.global, args),
        Commands::Version => print_version(&cli.global),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(err) => report_error(&cli.global, &err),
    };
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Model loading
// ============================================================================

struct Loaded {
    set: ModelSet,
    classifier: MarkovClassifier,
    path: PathBuf,
    source: ConfigSource,
}

fn load(global: &GlobalOpts) -> Result<Loaded, CliError> {
    if let Some(path) = &global.models {
        if !path.exists() {
            return Err(Error::Config(format!("model set not found: {}", path.display())).into());
        }
    }

    let resolved = resolve_model_path(global.models.as_deref());
    let path = resolved.path.ok_or_else(|| {
        Error::Config(format!(
            "no model set found; pass --models or set {}",
            ENV_MODELS_PATH
        ))
    })?;
    let set = load_model_set(&path)?;
    let classifier = MarkovClassifier::from_model_set(&set)?;

    tracing::info!(
        path = %path.display(),
        source = %resolved.source,
        classes = classifier.classes(),
        threshold = classifier.threshold().is_some(),
        "loaded model set"
    );
    Ok(Loaded {
        set,
        classifier,
        path,
        source: resolved.source,
    })
}

fn label_of(set: &ModelSet, decision: Decision) -> Option<&str> {
    decision.class().and_then(|i| set.label(i))
}

fn write_json<W: Write, T: Serialize>(
    out: &mut W,
    value: &T,
    format: OutputFormat,
) -> Result<(), CliError> {
    let text = if format.is_streaming() {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .map_err(Error::from)?;
    writeln!(out, "{}", text)?;
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn run_check(global: &GlobalOpts) -> CliResult {
    let loaded = load(global)?;
    let set = &loaded.set;
    let mut out = io::stdout().lock();

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let classes: Vec<_> = set
                .classes
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "label": c.label,
                        "prior": c.prior,
                        "states": c.model.states(),
                    })
                })
                .collect();
            let threshold = set.threshold.as_ref().map(|t| {
                serde_json::json!({
                    "sensitivity": t.sensitivity,
                    "states": t.model.states(),
                })
            });
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "command": "check",
                "status": "ok",
                "path": loaded.path.display().to_string(),
                "source": loaded.source.to_string(),
                "alphabet": set.alphabet(),
                "classes": classes,
                "threshold": threshold,
            });
            write_json(&mut out, &response, global.format)?;
        }
        OutputFormat::Summary => {
            writeln!(
                out,
                "ok: {} classes over {} symbols, {} ({})",
                set.classes.len(),
                set.alphabet(),
                if set.threshold.is_some() {
                    "with threshold"
                } else {
                    "no threshold"
                },
                loaded.path.display()
            )?;
        }
    }
    Ok(ExitCode::Clean)
}

#[derive(Serialize)]
struct StepRecord<'a> {
    sequence: usize,
    step: usize,
    symbol: usize,
    decision: Decision,
    label: Option<&'a str>,
    log_likelihood: f64,
}

#[derive(Serialize)]
struct SequenceRecord<'a> {
    sequence: usize,
    length: usize,
    decision: Decision,
    label: Option<&'a str>,
    log_likelihood: f64,
    responses: Vec<f64>,
    threshold_score: Option<f64>,
}

/// Record the committed decision of a non-empty sequence and clear for the next.
fn finish_sequence<'a>(
    running: &mut RunningMarkovClassifier,
    set: &'a ModelSet,
    records: &mut Vec<SequenceRecord<'a>>,
) {
    if running.observations() == 0 {
        return;
    }
    let prediction = running.prediction();
    records.push(SequenceRecord {
        sequence: records.len(),
        length: running.observations(),
        decision: prediction.decision,
        label: label_of(set, prediction.decision),
        log_likelihood: prediction.log_likelihood,
        responses: running.responses().to_vec(),
        threshold_score: running.threshold_score(),
    });
    running.clear();
}

fn run_classify(global: &GlobalOpts, args: &ClassifyArgs, run_id: &str) -> CliResult {
    let loaded = load(global)?;
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) if path != Path::new("-") => {
            Box::new(BufReader::new(std::fs::File::open(path)?))
        }
        _ => Box::new(io::stdin().lock()),
    };

    let mut running = loaded.classifier.running();
    let mut records = Vec::new();
    let mut out = io::stdout().lock();

    for (idx, line) in reader.lines().enumerate() {
        let symbols = parse_symbols(&line?, idx + 1)?;
        if symbols.is_empty() {
            finish_sequence(&mut running, &loaded.set, &mut records);
            continue;
        }
        for symbol in symbols {
            running.push(symbol)?;
            if global.format.is_streaming() {
                let prediction = running.prediction();
                let step = StepRecord {
                    sequence: records.len(),
                    step: running.observations(),
                    symbol,
                    decision: prediction.decision,
                    label: label_of(&loaded.set, prediction.decision),
                    log_likelihood: prediction.log_likelihood,
                };
                write_json(&mut out, &step, global.format)?;
            }
        }
    }
    finish_sequence(&mut running, &loaded.set, &mut records);

    let rejected = records.iter().filter(|r| r.decision.is_reject()).count();
    tracing::info!(
        %run_id,
        sequences = records.len(),
        rejected,
        "classification finished"
    );

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": run_id,
                "command": "classify",
                "models": loaded.path.display().to_string(),
                "sequences": records,
                "rejected": rejected,
            });
            write_json(&mut out, &response, global.format)?;
        }
        OutputFormat::Jsonl => {}
        OutputFormat::Summary => {
            for record in &records {
                writeln!(
                    out,
                    "sequence {}: {} (log-likelihood {:.4}, {} observations)",
                    record.sequence,
                    record.label.unwrap_or("reject"),
                    record.log_likelihood,
                    record.length
                )?;
            }
        }
    }

    Ok(if rejected > 0 {
        ExitCode::Rejected
    } else {
        ExitCode::Clean
    })
}

#[derive(Serialize)]
struct PeekRecord<'a> {
    symbol: usize,
    decision: Decision,
    label: Option<&'a str>,
    log_likelihood: f64,
}

fn run_peek(global: &GlobalOpts, args: &PeekArgs) -> CliResult {
    let loaded = load(global)?;
    let set = &loaded.set;
    let mut running = loaded.classifier.running();
    running.push_all(&args.prefix)?;

    let current = running.prediction();
    let candidates = (0..set.alphabet())
        .map(|symbol| {
            running.peek(symbol).map(|p| PeekRecord {
                symbol,
                decision: p.decision,
                label: label_of(set, p.decision),
                log_likelihood: p.log_likelihood,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut out = io::stdout().lock();
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "command": "peek",
                "prefix_length": running.observations(),
                "current": {
                    "decision": current.decision,
                    "label": label_of(set, current.decision),
                    "log_likelihood": current.log_likelihood,
                },
                "candidates": candidates,
            });
            write_json(&mut out, &response, global.format)?;
        }
        OutputFormat::Jsonl => {
            for candidate in &candidates {
                write_json(&mut out, candidate, global.format)?;
            }
        }
        OutputFormat::Summary => {
            writeln!(
                out,
                "after {} observations: {}",
                running.observations(),
                label_of(set, current.decision).unwrap_or("reject")
            )?;
            for candidate in &candidates {
                writeln!(
                    out,
                    "  {} -> {} ({:.4})",
                    candidate.symbol,
                    candidate.label.unwrap_or("reject"),
                    candidate.log_likelihood
                )?;
            }
        }
    }
    Ok(ExitCode::Clean)
}

fn print_version(global: &GlobalOpts) -> CliResult {
    let mut out = io::stdout().lock();
    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let version_info = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "hs_core_version": env!("CARGO_PKG_VERSION"),
                "rust_version": env!("CARGO_PKG_RUST_VERSION"),
            });
            write_json(&mut out, &version_info, global.format)?;
        }
        OutputFormat::Summary => {
            writeln!(out, "hs-core {}", env!("CARGO_PKG_VERSION"))?;
            writeln!(out, "schema version: {}", SCHEMA_VERSION)?;
        }
    }
    Ok(ExitCode::Clean)
}

fn report_error(global: &GlobalOpts, err: &CliError) -> ExitCode {
    let exit_code = err.exit_code();
    let use_color = !global.no_color && io::stderr().is_terminal();

    match (err, global.format) {
        (CliError::Core(e), OutputFormat::Json | OutputFormat::Jsonl) => {
            eprintln!("{}", StructuredError::from(e).to_json());
        }
        (CliError::Core(e), OutputFormat::Summary) => {
            eprintln!("{}", format_error_human(e, use_color));
        }
        (CliError::Input(e), OutputFormat::Json | OutputFormat::Jsonl) => {
            let response = serde_json::json!({
                "code": exit_code.code_name(),
                "message": e.to_string(),
            });
            eprintln!("{}", response);
        }
        (CliError::Input(e), OutputFormat::Summary) => {
            eprintln!("✗ Invalid input\n  Reason: {}", e);
        }
    }

    if exit_code.is_internal_error() {
        tracing::error!(exit = %exit_code, error = %err, "command failed");
    } else {
        tracing::debug!(exit = %exit_code, "command failed");
    }
    exit_code
}
