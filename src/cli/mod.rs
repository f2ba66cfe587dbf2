//! CLI module for the data-validator conformance harness
//!
//! ## Flags
//!
//! - `--log <LEVEL>` - verbosity (`DEBUG`, `INFO`, `WARNING`, `ERROR`, `CRITICAL`)
//! - `-t <INDEX>` - run only the given registry index (repeatable)
//! - `--root`, `--jar`, `--timeout`, `--max-output-bytes` - run configuration
//! - `--list` - print the registry and exit
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.
//!
//! The log subscriber is built from `--log` and installed with
//! `tracing::subscriber::with_default` for the duration of the command only.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::config::HarnessConfig;
use crate::controller::Selection;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// A case failed, or the artifact could not be located
    pub const FAILURE: ExitCode = ExitCode(1);
    /// Bad command-line usage (same code clap uses)
    pub const USAGE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create a usage error (exit code 2).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::USAGE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Log verbosity accepted by `--log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    #[value(name = "DEBUG")]
    Debug,
    #[default]
    #[value(name = "INFO")]
    Info,
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "ERROR")]
    Error,
    /// Same as ERROR; `tracing` has no separate critical level
    #[value(name = "CRITICAL")]
    Critical,
}

impl LogLevel {
    /// Name as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// `EnvFilter` directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

/// Test data-validator's Main.
#[derive(Parser, Debug)]
#[command(name = "dv-conformance")]
#[command(version = crate::version::HARNESS_VERSION)]
#[command(about = "Test data-validator's Main.", long_about = None)]
pub struct Cli {
    /// Log verbosity
    #[arg(long = "log", value_enum, default_value_t = LogLevel::Info)]
    pub log: LogLevel,

    /// Run individual tests (registry index, repeatable)
    #[arg(short = 't', value_name = "INDEX", action = clap::ArgAction::Append)]
    pub tests: Vec<usize>,

    /// Project root containing `src/test/resources` and `target/`
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Use this jar instead of searching `target/scala-2.11`
    #[arg(long, value_name = "FILE")]
    pub jar: Option<PathBuf>,

    /// Per-case timeout in seconds (0 waits forever)
    #[arg(long, value_name = "SECS", default_value_t = 600)]
    pub timeout: u64,

    /// Output retained per case; older output is dropped first
    #[arg(long, value_name = "BYTES", default_value_t = crate::runner::DEFAULT_MAX_OUTPUT_BYTES)]
    pub max_output_bytes: usize,

    /// Print the registry and exit
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    pub fn config(&self) -> HarnessConfig {
        HarnessConfig::new()
            .with_root(self.root.clone())
            .with_jar(self.jar.clone())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_max_output_bytes(self.max_output_bytes)
    }

    pub fn selection(&self) -> Selection {
        Selection::from_indices(self.tests.clone())
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cli.log.directive()))
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tracing::info!("Setting log_level to {}", cli.log.name());
        execute(&cli)
    });

    match result {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the parsed command line and return the exit code.
pub fn execute(cli: &Cli) -> CliResult<ExitCode> {
    if cli.list {
        return commands::list_cases();
    }
    commands::run_harness(&cli.config(), &cli.selection())
}

// ============================================================================
// Tests
// ============================================================================
