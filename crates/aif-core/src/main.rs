//! Active Inference Core - command line front end
//!
//! Runs the engine over observation streams and exposes the model and
//! configuration for inspection:
//! - `step`: one perception-action cycle per JSON line
//! - `model`: dump the default generative model
//! - `config show` / `config validate`: inspect configuration
//!
//! stdout carries JSON payloads only; logs and events go to stderr.

use aif_core::config::{load_config, load_engine_config, LoadedConfig, CONFIG_SCHEMA_VERSION};
use aif_core::events::JsonlSink;
use aif_core::exit_codes::ExitCode;
use aif_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogFormat, LogLevel, Stage,
};
use aif_core::{Engine, GenerativeModel, Observation, TrueState};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// Error code for a line that is not a valid observation record.
const ERR_CODE_MALFORMED_INPUT: u32 = 34;
/// Error code for an unreadable input stream or file.
const ERR_CODE_INPUT_IO: u32 = 35;
/// Error code for a failed write to stdout.
const ERR_CODE_OUTPUT_IO: u32 = 50;

/// Active Inference Core - belief updating and action selection
#[derive(Parser)]
#[command(name = "aif-core")]
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
    /// Engine config file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one perception-action cycle per observation line
    Step(StepArgs),

    /// Print the default generative model as JSON
    Model,

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct StepArgs {
    /// Read observations from FILE instead of stdin
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Seed for action sampling (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Stream engine events as JSONL to stderr
    #[arg(long)]
    events: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration and its snapshot
    Show,

    /// Validate a configuration file
    Validate {
        /// Config file to validate
        path: PathBuf,
    },
}

/// One input line: a bare observation, or an observation with the hidden
/// state that produced it (which also triggers a likelihood update).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StepLine {
    Supervised {
        observation: Observation,
        #[serde(alias = "trueState")]
        true_state: TrueState,
    },
    Plain(Observation),
}

impl StepLine {
    fn observation(&self) -> &Observation {
        match self {
            StepLine::Supervised { observation, .. } => observation,
            StepLine::Plain(observation) => observation,
        }
    }

    fn true_state(&self) -> Option<&TrueState> {
        match self {
            StepLine::Supervised { true_state, .. } => Some(true_state),
            StepLine::Plain(_) => None,
        }
    }
}

#[derive(Serialize)]
struct StepRecord<'a> {
    line: usize,
    #[serde(flatten)]
    outcome: &'a aif_core::StepOutcome,
    learned: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = cli
        .global
        .log_level
        .or_else(|| LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet));
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let run_id = generate_run_id();
    let span = tracing::info_span!("run", run_id = %run_id, stage = %Stage::Init);
    let _guard = span.enter();

    let exit_code = match &cli.command {
        Commands::Step(args) => run_step(&cli.global, args, &run_id),
        Commands::Model => print_model(),
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => run_config_show(&cli.global),
            ConfigCommands::Validate { path } => run_config_validate(path),
        },
        Commands::Version => print_version(),
    };

    tracing::debug!(
        target: event_names::RUN_FINISHED,
        exit_code = exit_code.as_i32(),
        "run finished"
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_step(global: &GlobalOpts, args: &StepArgs, run_id: &str) -> ExitCode {
    let loaded = match load_engine_config(global.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => return output_error(e.code(), &e.to_string(), e.exit_code(), None),
    };
    let mut config = loaded.config;
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let mut engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => return output_error(e.code(), &e.to_string(), e.exit_code(), None),
    };
    if args.events {
        engine.on(
            JsonlSink::new(std::io::stderr())
                .with_run_id(run_id)
                .into_handler(),
        );
    }

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => match std::fs::File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                return output_error(
                    ERR_CODE_INPUT_IO,
                    &format!("cannot open {}: {}", path.display(), e),
                    ExitCode::ArgsError,
                    None,
                )
            }
        },
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    tracing::info!(
        target: event_names::RUN_STARTED,
        input = %args.input.as_ref().map_or("-".to_string(), |p| p.display().to_string()),
        config_source = %loaded.source,
        "processing observations"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                return output_error(
                    ERR_CODE_INPUT_IO,
                    &format!("failed to read input: {}", e),
                    ExitCode::InputError,
                    Some(line_no),
                )
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let record: StepLine = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    target: event_names::INPUT_REJECTED,
                    line = line_no,
                    error = %e,
                    "malformed observation"
                );
                return output_error(
                    ERR_CODE_MALFORMED_INPUT,
                    &format!("malformed observation: {}", e),
                    ExitCode::InputError,
                    Some(line_no),
                );
            }
        };

        let outcome = match engine.step_detailed(record.observation()) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    target: event_names::INPUT_REJECTED,
                    line = line_no,
                    error = %e,
                    "observation rejected"
                );
                return output_error(e.code(), &e.to_string(), e.exit_code(), Some(line_no));
            }
        };

        let learned = match record.true_state() {
            Some(truth) => match engine.update_a_matrix(record.observation(), truth) {
                Ok(()) => true,
                Err(e) => {
                    return output_error(e.code(), &e.to_string(), e.exit_code(), Some(line_no))
                }
            },
            None => false,
        };

        let payload = StepRecord {
            line: line_no,
            outcome: &outcome,
            learned,
        };
        if let Err(e) = write_json_line(&mut out, &payload) {
            return output_error(
                ERR_CODE_OUTPUT_IO,
                &format!("failed to write output: {}", e),
                ExitCode::InternalError,
                Some(line_no),
            );
        }
    }

    let stats = engine.stats();
    tracing::info!(
        target: event_names::RUN_FINISHED,
        steps = stats.inference_count,
        average_surprise = stats.average_surprise,
        learning_updates = stats.learning_updates,
        "observations processed"
    );
    ExitCode::Clean
}

fn print_model() -> ExitCode {
    print_json(&GenerativeModel::default())
}

/// Display the resolved configuration (defaults if no file is found).
fn run_config_show(global: &GlobalOpts) -> ExitCode {
    match load_engine_config(global.config.as_deref()) {
        Ok(loaded) => print_json(&config_response("ok", &loaded)),
        Err(e) => output_error(e.code(), &e.to_string(), e.exit_code(), None),
    }
}

fn run_config_validate(path: &std::path::Path) -> ExitCode {
    match load_config(Some(path)) {
        Ok(loaded) => print_json(&config_response("valid", &loaded)),
        Err(e) => output_error(e.code(), &e.to_string(), ExitCode::ConfigError, None),
    }
}

fn config_response(status: &str, loaded: &LoadedConfig) -> serde_json::Value {
    serde_json::json!({
        "status": status,
        "source": loaded.source.to_string(),
        "path": loaded.path.as_ref().map(|p| p.display().to_string()),
        "config": loaded.config,
        "snapshot": loaded.snapshot,
    })
}

fn print_version() -> ExitCode {
    print_json(&serde_json::json!({
        "aif_core_version": env!("CARGO_PKG_VERSION"),
        "config_schema_version": CONFIG_SCHEMA_VERSION,
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    }))
}

// ============================================================================
// Output helpers
// ============================================================================

fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> std::io::Result<()> {
    let line = serde_json::to_string(value).map_err(std::io::Error::other)?;
    writeln!(out, "{}", line)?;
    out.flush()
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::Clean
        }
        Err(e) => output_error(
            ERR_CODE_OUTPUT_IO,
            &format!("failed to serialize output: {}", e),
            ExitCode::InternalError,
            None,
        ),
    }
}

/// Report an error as a JSON object on stderr and return its exit code.
fn output_error(code: u32, message: &str, exit_code: ExitCode, line: Option<usize>) -> ExitCode {
    let mut response = serde_json::json!({
        "status": "error",
        "error": {
            "code": code,
            "kind": exit_code.code_name(),
            "message": message,
        }
    });
    if let Some(line) = line {
        response["line"] = serde_json::json!(line);
    }
    eprintln!("{}", response);
    exit_code
}
