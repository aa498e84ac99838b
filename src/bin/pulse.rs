//! Pulse CLI - Command-line interface for the Pulse Ledger engine
//!
//! Commands:
//! - report: Replay a producer log and print day/week statistics
//! - run: Ingest producer events from stdin and print live daily reports
//! - validate: Validate producer events
//! - doctor: Check configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::thread;

use chrono::{Duration, Local, NaiveDate};
use pulse_ledger::schema::ValidationError;
use pulse_ledger::store::PruneOutcome;
use pulse_ledger::types::{DailyReport, SleepSummary, WeeklyTrend};
use pulse_ledger::{
    EngineConfig, IngestSummary, Ingested, ProducerEvent, ProducerLog, TelemetryEngine,
    TelemetryError, PULSE_VERSION,
};

/// Pulse - local telemetry statistics for a fitness tracker
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version = PULSE_VERSION)]
#[command(about = "Aggregate heart-rate, step and sleep telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a producer log and print statistics
    Report {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Day to report (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// First day of the trend window (default: six days before --date)
        #[arg(long)]
        week_start: Option<NaiveDate>,

        /// Engine configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Apply the retention window before reporting
        #[arg(long)]
        prune: bool,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Ingest events from stdin and print a daily report after each one
    Run {
        /// Engine configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Leave stdout buffered instead of flushing after each report
        #[arg(long)]
        no_flush: bool,
    },

    /// Validate producer events
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check configuration and environment
    Doctor {
        /// Engine configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one event per line)
    Ndjson,
    /// JSON array of events
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Single-line JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Report {
            input,
            input_format,
            date,
            week_start,
            config,
            prune,
            output_format,
        } => cmd_report(
            &input,
            input_format,
            date,
            week_start,
            config.as_deref(),
            prune,
            output_format,
        ),

        Commands::Run { config, no_flush } => cmd_run(config.as_deref(), !no_flush),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_report(
    input: &Path,
    input_format: InputFormat,
    date: Option<NaiveDate>,
    week_start: Option<NaiveDate>,
    config: Option<&Path>,
    prune: bool,
    output_format: OutputFormat,
) -> Result<(), PulseCliError> {
    let events = read_events(input, &input_format)?;
    if events.is_empty() {
        return Err(PulseCliError::NoEvents);
    }

    let engine = TelemetryEngine::with_config(load_config(config)?);
    let ingested = engine.ingest_events(events)?;
    let pruned = prune.then(|| engine.prune_expired());

    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let week_start = week_start.unwrap_or(date - Duration::days(6));

    let report = StatisticsReport {
        ingested,
        pruned,
        day: engine.daily_report(date),
        heart_rate_trend: engine.weekly_heart_rate_trend(week_start),
        steps_trend: engine.weekly_steps_trend(week_start),
        sleep: engine.recent_sleep_statistics(),
    };

    println!("{}", format_output(&report, &output_format)?);
    Ok(())
}

fn cmd_run(config: Option<&Path>, flush: bool) -> Result<(), PulseCliError> {
    let engine = Arc::new(TelemetryEngine::with_config(load_config(config)?));
    let (tx, rx) = mpsc::channel::<NaiveDate>();

    let producer_engine = Arc::clone(&engine);
    let producer = thread::spawn(move || -> Result<(), PulseCliError> {
        let stdin = io::stdin();
        for (line_num, line) in stdin.lock().lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let event: ProducerEvent = serde_json::from_str(trimmed).map_err(|e| {
                PulseCliError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            let date = event_date(&event);

            match producer_engine.ingest_event(event)? {
                Ingested::Skipped(_) => continue,
                _ => {
                    if let Some(date) = date {
                        // Receiver only goes away when the reporter fails
                        if tx.send(date).is_err() {
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    });

    let mut stdout = io::stdout();
    for date in rx {
        let report = engine.daily_report(date);
        writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
        if flush {
            stdout.flush()?;
        }
    }

    producer.join().map_err(|_| PulseCliError::ProducerPanicked)?
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), PulseCliError> {
    let events = read_events(input, &input_format)?;
    let results = ProducerLog::validate_events(&events);

    let report = ValidationReport {
        total_events: events.len(),
        valid_events: events.len() - results.len(),
        invalid_events: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                kind: r.kind.to_string(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events:   {}", report.total_events);
        println!("Valid events:   {}", report.valid_events);
        println!("Invalid events: {}", report.invalid_events);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} event (index {}): {}", err.kind, err.index, err.error);
            }
        }
    }

    if report.invalid_events > 0 {
        Err(PulseCliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "pulse_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Pulse version {}", PULSE_VERSION),
    });

    let effective = match config {
        Some(path) if !path.exists() => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: format!("{} does not exist, defaults will be used", path.display()),
            });
            Some(EngineConfig::default())
        }
        Some(path) => match EngineConfig::load(path) {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                });
                None
            }
        },
        None => Some(EngineConfig::default()),
    };

    if let Some(engine_config) = effective {
        checks.push(DoctorCheck {
            name: "retention".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} days of samples, sleep summaries over {} records",
                engine_config.retention_days, engine_config.sleep_period_days
            ),
        });
        if !engine_config.prune_step_accumulator {
            checks.push(DoctorCheck {
                name: "step_totals".to_string(),
                status: CheckStatus::Warning,
                message: "per-day step totals are never pruned and grow without bound"
                    .to_string(),
            });
        }
    }

    if atty::is(atty::Stream::Stdin) {
        checks.push(DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Warning,
            message: "stdin is a terminal; `pulse run` expects a piped producer".to_string(),
        });
    }

    let report = DoctorReport {
        version: PULSE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pulse Doctor Report");
        println!("===================");
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, PulseCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_events(input: &Path, format: &InputFormat) -> Result<Vec<ProducerEvent>, PulseCliError> {
    let data = read_input(input)?;
    let events = match format {
        InputFormat::Ndjson => ProducerLog::parse_ndjson(&data)?,
        InputFormat::Json => ProducerLog::parse_array(&data)?,
    };
    Ok(events)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, PulseCliError> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

/// Calendar day an event contributes to, if it has one
fn event_date(event: &ProducerEvent) -> Option<NaiveDate> {
    match event {
        ProducerEvent::Telemetry(reading) => Some(reading.timestamp.date()),
        ProducerEvent::Sleep(payload) => payload.start_time.map(|ts| ts.date()),
    }
}

fn format_output<T: Serialize>(value: &T, format: &OutputFormat) -> Result<String, PulseCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Engine(TelemetryError),
    Json(serde_json::Error),
    Validation(ValidationError),
    NoEvents,
    ValidationFailed(usize),
    DoctorFailed,
    ProducerPanicked,
    ParseError(String),
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<TelemetryError> for PulseCliError {
    fn from(e: TelemetryError) -> Self {
        match e {
            TelemetryError::Validation(e) => PulseCliError::Validation(e),
            TelemetryError::Io(e) => PulseCliError::Io(e),
            other => PulseCliError::Engine(other),
        }
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the input log and configuration file".to_string()),
            },
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'pulse validate' for details".to_string()),
            },
            PulseCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            PulseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} events failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            PulseCliError::ProducerPanicked => CliError {
                code: "PRODUCER_PANICKED".to_string(),
                message: "The ingestion thread stopped unexpectedly".to_string(),
                hint: None,
            },
            PulseCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatisticsReport {
    ingested: IngestSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pruned: Option<PruneOutcome>,
    day: DailyReport,
    heart_rate_trend: Option<WeeklyTrend>,
    steps_trend: Option<WeeklyTrend>,
    sleep: Option<SleepSummary>,
}

#[derive(Serialize)]
struct ValidationReport {
    total_events: usize,
    valid_events: usize,
    invalid_events: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    kind: String,
    error: String,
}

#[derive(Serialize)]
struct DoctorReport {
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
