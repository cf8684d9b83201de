mod terminal;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use edutrack_core::model::{QuestionBank, Student};
use edutrack_core::time::DEFAULT_ASSESSMENT_SECS;
use services::{AssessmentSettings, Clock, ExplanationGateway, GenerativeTextConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDuration { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDuration { raw } => write!(f, "invalid --duration value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  edutrack quiz  [--bank <questions.json>] [--duration <secs>]");
    eprintln!("  edutrack tutor");
    eprintln!();
    eprintln!("Defaults for quiz:");
    eprintln!("  built-in question bank, --duration {DEFAULT_ASSESSMENT_SECS}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EDUTRACK_API_KEY (unset = demo mode), EDUTRACK_AI_BASE_URL, EDUTRACK_AI_MODEL,");
    eprintln!("  EDUTRACK_DURATION_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Tutor,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "tutor" => Some(Self::Tutor),
            _ => None,
        }
    }
}

struct Args {
    bank: Option<PathBuf>,
    duration_secs: u32,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut bank = None;
        let mut duration_secs = std::env::var("EDUTRACK_DURATION_SECS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(DEFAULT_ASSESSMENT_SECS);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => {
                    let value = require_value(args, "--bank")?;
                    bank = Some(PathBuf::from(value));
                }
                "--duration" => {
                    let value = require_value(args, "--duration")?;
                    duration_secs = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDuration { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bank,
            duration_secs,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_bank(path: Option<&PathBuf>) -> Result<QuestionBank, Box<dyn std::error::Error>> {
    match path {
        None => Ok(QuestionBank::builtin()?),
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(QuestionBank::from_json(&raw)?)
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: start an assessment when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Quiz,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Quiz,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = GenerativeTextConfig::from_env();
    if config.api_key.is_none() {
        tracing::info!("no API key configured, running in demo mode");
    }
    let gateway = ExplanationGateway::from_config(&config);

    match cmd {
        Command::Quiz => {
            let bank = Arc::new(load_bank(parsed.bank.as_ref())?);
            let settings = AssessmentSettings {
                duration_secs: parsed.duration_secs,
                ..AssessmentSettings::default()
            };
            terminal::run_assessment(bank, gateway, config.api_key, settings).await?;
        }
        Command::Tutor => {
            terminal::run_tutor(
                &Student::demo(),
                &gateway,
                config.api_key.as_ref(),
                Clock::default_clock(),
            )
            .await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
