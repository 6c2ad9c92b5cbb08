//! envreport - logs a diagnostic report of the process environment.
//!
//! Each facet (runtime, memory, locale, network interfaces, ...) is written
//! as one INFO block through `tracing`. Which facets run by default comes
//! from `ENVREPORT_*` variables or a JSON file.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use envreport_core::config::{self, ReportConfig};
use envreport_core::db::PostgresConnection;
use envreport_core::{Executor, ReportKind, Reporter, SameThreadExecutor, ThreadPoolExecutor};

/// Environment diagnostics reporter.
#[derive(Parser)]
#[command(name = "envreport", about = "Logs a diagnostic report of the process environment", version)]
struct Args {
    /// Run reports on a thread pool with this many workers (0 = one per CPU).
    /// Reports run on the calling thread when omitted.
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Case-insensitive regex of keys whose values are masked.
    /// An empty pattern disables redaction.
    #[arg(long, value_name = "REGEX")]
    redact_pattern: Option<String>,

    /// Logger name attached to every report.
    #[arg(long, value_name = "NAME")]
    logger_name: Option<String>,

    /// Load configuration from a JSON file instead of ENVREPORT_* variables.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors. Reports are not written.
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reports enabled by configuration.
    Defaults,
    /// Run every report regardless of configuration.
    All,
    /// Run the reports named by path suffix (e.g. `memory`, `/sslcontext`).
    Report {
        #[arg(required = true, value_name = "SUFFIX")]
        suffixes: Vec<String>,
    },
    /// Report on a PostgreSQL connection configured through PG* variables.
    Connection {
        /// Include the type map.
        #[arg(long)]
        type_map: bool,
    },
    /// Print the effective configuration as JSON.
    Config,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["envreport", "envreport_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Builds the effective configuration: file or environment, then flags.
fn load_config(args: &Args) -> Result<ReportConfig, String> {
    let mut cfg = match &args.config {
        Some(path) => ReportConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => {
            let (cfg, errors) = ReportConfig::from_env();
            for e in &errors {
                warn!("Ignoring configuration value: {}", e);
            }
            cfg
        }
    };
    if let Some(pattern) = &args.redact_pattern {
        cfg.redact_pattern = pattern.clone();
    }
    if let Some(name) = &args.logger_name {
        cfg.logger_name = name.clone();
    }
    if let Command::Connection { type_map: true } = args.command {
        cfg.connection_type_map = true;
    }
    Ok(cfg)
}

fn executor(threads: Option<usize>) -> Result<Box<dyn Executor>, String> {
    match threads {
        Some(n) => {
            let pool = ThreadPoolExecutor::new(n).map_err(|e| e.to_string())?;
            info!("Running reports on {} threads", pool.threads());
            Ok(Box::new(pool))
        }
        None => Ok(Box::new(SameThreadExecutor)),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let cfg = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Command::Config = args.command {
        return match serde_json::to_string_pretty(&cfg) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to serialize configuration: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    // Resolve suffixes before doing any work so a typo reports nothing.
    let kinds = match &args.command {
        Command::Report { suffixes } => {
            let mut kinds = Vec::with_capacity(suffixes.len());
            for suffix in suffixes {
                match ReportKind::from_path_suffix(suffix) {
                    Some(kind) => kinds.push(kind),
                    None => {
                        eprintln!("envreport: unknown report '{}'", suffix);
                        let names: Vec<&str> =
                            ReportKind::ALL.iter().map(|k| k.path_segment()).collect();
                        eprintln!("available: {}", names.join(", "));
                        return ExitCode::from(2);
                    }
                }
            }
            kinds
        }
        _ => Vec::new(),
    };

    let executor = match executor(args.threads) {
        Ok(e) => e,
        Err(e) => {
            error!("Failed to start thread pool: {}", e);
            return ExitCode::FAILURE;
        }
    };

    config::set_global(cfg.clone());
    let reporter = Reporter::from_config(&cfg);

    match args.command {
        Command::Defaults => reporter.log_default_reports(executor.as_ref()),
        Command::All => reporter.log_all_reports(executor.as_ref()),
        Command::Report { .. } => {
            for kind in kinds {
                reporter.log_report(kind, executor.as_ref());
            }
        }
        Command::Connection { .. } => match PostgresConnection::from_env() {
            Ok(conn) => reporter.log_connection_report(Arc::new(conn), executor.as_ref()),
            Err(e) => {
                error!("PostgreSQL connection failed: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Command::Config => {}
    }

    // Dropping a pool executor waits for outstanding reports.
    drop(executor);
    ExitCode::SUCCESS
}
