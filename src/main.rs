use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use pin_restoration::config::{ConfigError, EngineConfig};
use pin_restoration::logging::{Stage, init_logger, log_batch_summary};
use pin_restoration::{RestorationOutcome, SiteInput, plan_site};

#[derive(Parser, Debug)]
#[command(
    name = "pin-planner",
    about = "Score water-quality severity and plan PIN treatment deployments",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan one or more sites from SiteInput JSON documents
    Plan(PlanArgs),
    /// List the active threshold profiles
    Profiles(ConfigArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Engine config file; missing file means defaults
    #[arg(long, default_value = "pin.toml")]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// SiteInput JSON file (repeatable)
    #[arg(long = "site", required = true)]
    sites: Vec<PathBuf>,
    #[command(flatten)]
    config: ConfigArgs,
    /// Assessment time, RFC 3339 (defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<DateTime<Utc>>,
    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Logging(pin_restoration::logging::LoggingError),
    Site { path: PathBuf, reason: String },
    Output(serde_json::Error),
    Invalid { failed: usize },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(err) => write!(f, "{}", err),
            CliError::Logging(err) => write!(f, "{}", err),
            CliError::Site { path, reason } => write!(f, "{}: {}", path.display(), reason),
            CliError::Output(err) => write!(f, "could not serialize outcome: {}", err),
            CliError::Invalid { failed } => write!(f, "{} site(s) failed validation", failed),
        }
    }
}

impl std::error::Error for CliError {}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as RFC 3339 ({err})"))
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pin-planner: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Plan(args) => run_plan(args),
        Command::Profiles(args) => run_profiles(args),
    }
}

fn load_config(path: &Path) -> Result<EngineConfig, CliError> {
    let config = EngineConfig::resolve(path).map_err(CliError::Config)?;
    let level = config.level().map_err(CliError::Config)?;
    init_logger(level, config.log_file.as_deref(), false).map_err(CliError::Logging)?;
    Ok(config)
}

fn read_site(path: &Path) -> Result<SiteInput, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CliError::Site {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| CliError::Site {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(CliError::Output)?;
    println!("{}", text);
    Ok(())
}

fn run_plan(args: PlanArgs) -> Result<(), CliError> {
    let config = load_config(&args.config.config)?;
    let registry = config.registry().map_err(CliError::Config)?;
    let now = args.at.unwrap_or_else(Utc::now);
    info!(stage = %Stage::Engine, sites = args.sites.len(), at = %now, "planning run started");

    let (mut planned, mut healthy, mut failed) = (0, 0, 0);
    for path in &args.sites {
        let input = match read_site(path) {
            Ok(input) => input,
            Err(err) => {
                eprintln!("{}", err);
                failed += 1;
                continue;
            }
        };
        match plan_site(input, &registry, config.parameter_slots, now) {
            Ok(outcome) => {
                match outcome {
                    RestorationOutcome::Planned(_) => planned += 1,
                    RestorationOutcome::NoActionRequired { .. } => healthy += 1,
                }
                print_json(&outcome, args.pretty)?;
            }
            Err(err) => {
                eprintln!("{}: {}", path.display(), err);
                failed += 1;
            }
        }
    }

    log_batch_summary(args.sites.len(), planned, healthy, failed);
    if failed > 0 {
        return Err(CliError::Invalid { failed });
    }
    Ok(())
}

fn run_profiles(args: ConfigArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let registry = config.registry().map_err(CliError::Config)?;

    for profile in registry.profiles() {
        let states = if profile.states.is_empty() {
            "(fallback)".to_string()
        } else {
            profile.states.join(", ")
        };
        println!("{:<14} {:<20} {}", profile.id, states, profile.source);
    }
    Ok(())
}
