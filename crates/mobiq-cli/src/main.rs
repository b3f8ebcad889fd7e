//! Command-line runner for the mobiq scenario catalogue.
//!
//! # Usage
//!
//! ```bash
//! # List every scenario with its tags
//! mobiq list
//!
//! # Only the drag scenarios
//! mobiq list --tag drag
//!
//! # Run everything against the default Appium server
//! mobiq run
//!
//! # Run the forms scenarios against another server, keeping old results
//! mobiq run --tag forms --server-url http://10.0.0.5:4723/wd/hub --keep-results
//!
//! # Clear the results directory
//! mobiq clean
//! ```
//!
//! Exit codes: 0 when every selected scenario passed, 1 when any failed,
//! 2 on configuration errors, 4 on I/O errors.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mobiq_core::appium::AppiumSessions;
use mobiq_core::config::{ConfigError, MobiqConfig};
use mobiq_core::report::{ReportError, Reporter};
use mobiq_core::scenario::{select, Runner};
use mobiq_core::scenarios::catalogue;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Run end-to-end scenarios against the demo app through Appium.
#[derive(Parser)]
#[command(name = "mobiq")]
#[command(about = "Run mobile UI scenarios through an Appium server")]
#[command(version)]
struct Cli {
    /// Output format: text or json
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List scenarios and their tags
    List {
        /// Only scenarios carrying this tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Run the selected scenarios
    Run {
        /// Only scenarios carrying this tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Config file (defaults to ./mobiq.json, then ~/.mobiq/config.json)
        #[arg(short, long, env = "MOBIQ_CONFIG")]
        config: Option<PathBuf>,
        /// Appium server URL
        #[arg(long, env = "MOBIQ_SERVER_URL")]
        server_url: Option<String>,
        /// Directory for result files
        #[arg(long)]
        report_dir: Option<PathBuf>,
        /// Do not clear the result directory first
        #[arg(long)]
        keep_results: bool,
    },

    /// Clear the result directory
    Clean {
        /// Config file (defaults to ./mobiq.json, then ~/.mobiq/config.json)
        #[arg(short, long, env = "MOBIQ_CONFIG")]
        config: Option<PathBuf>,
        /// Directory for result files
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Io(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Config(_) => ExitCode::from(2),
            CliError::Io(_) => ExitCode::from(4),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<ReportError> for CliError {
    fn from(e: ReportError) -> Self {
        CliError::Io(e.to_string())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// Installs stderr logging, plus a log file next to the result directory
/// when one can be created.
fn init_logging(report_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer().with_writer(std::io::stderr);

    let log_dir = report_dir.map(|dir| match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    });
    let file = log_dir
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .map(|dir| {
            let appender = tracing_appender::rolling::never(dir, "mobiq.log");
            tracing_appender::non_blocking(appender)
        });

    match file {
        Some((writer, guard)) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

fn load_config(
    path: Option<&Path>,
    server_url: Option<String>,
    report_dir: Option<PathBuf>,
) -> Result<MobiqConfig, CliError> {
    let mut config = MobiqConfig::load(path)?;
    if let Some(url) = server_url {
        config.server_url = url;
    }
    if let Some(dir) = report_dir {
        config.report_dir = dir;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Command::List { ref tags } => {
            let _guard = init_logging(None);
            let scenarios = catalogue();
            let selected = select(&scenarios, tags);
            if cli.format == OutputFormat::Json {
                let entries: Vec<_> = selected
                    .iter()
                    .map(|s| serde_json::json!({ "name": s.name(), "tags": s.tags() }))
                    .collect();
                println!("{}", serde_json::json!({ "scenarios": entries }));
            } else if selected.is_empty() {
                eprintln!("No scenarios match the given tags");
            } else {
                for scenario in selected {
                    println!("{} [{}]", scenario.name(), scenario.tags().join(", "));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Clean { config, report_dir } => {
            let config = load_config(config.as_deref(), None, report_dir)?;
            let _guard = init_logging(None);
            Reporter::from_config(&config).reset().await?;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "cleared": config.report_dir }));
            } else {
                eprintln!("Cleared {}", config.report_dir.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            tags,
            config,
            server_url,
            report_dir,
            keep_results,
        } => {
            let config = load_config(config.as_deref(), server_url, report_dir)?;
            config.validate()?;
            let _guard = init_logging(Some(config.report_dir.as_path()));

            let scenarios = catalogue();
            let selected = select(&scenarios, &tags);
            if selected.is_empty() {
                eprintln!("No scenarios match the given tags");
                return Ok(ExitCode::SUCCESS);
            }

            let runner = Runner::from_config(&config, Arc::new(AppiumSessions::new(&config)));
            if !keep_results {
                if let Err(e) = runner.reporter().reset().await {
                    warn!(error = %e, "Could not clean result directory");
                }
            }
            info!(count = selected.len(), server = %config.server_url, "Running scenarios");
            let summary = runner.run_all(selected).await;

            if cli.format == OutputFormat::Json {
                let results: Vec<_> = summary
                    .reports
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "name": r.name,
                            "status": r.status,
                            "message": r.status_message,
                            "durationMs": r.duration_ms(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::json!({ "results": results }));
            } else {
                for report in &summary.reports {
                    match &report.status_message {
                        Some(message) => println!("{:<8} {} ({})", report.status, report.name, message),
                        None => println!("{:<8} {}", report.status, report.name),
                    }
                }
                println!(
                    "{} passed, {} failed, {} broken",
                    summary.passed(),
                    summary.failed(),
                    summary.broken()
                );
            }

            Ok(if summary.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
    }
}
