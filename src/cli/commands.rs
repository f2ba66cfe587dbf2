//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use crate::artifact::{check_artifact, locate_artifact};
use crate::config::HarnessConfig;
use crate::controller::{Controller, HarnessError, Selection};
use crate::registry::Registry;
use crate::reporter::LogReporter;

use super::{CliError, CliResult, ExitCode};

/// Run the selected registry cases against the validated program.
///
/// 1. Build the registry and validate the selection
/// 2. Locate the validator jar (fatal if missing; no case runs)
/// 3. Run each case in order and report
pub fn run_harness(config: &HarnessConfig, selection: &Selection) -> CliResult<ExitCode> {
    let registry = Registry::builtin().map_err(|e| CliError::failure(format!("Invalid test registry: {}", e)))?;
    selection.resolve(registry.len()).map_err(harness_error)?;

    tracing::debug!("Root:{}", config.root.display());
    let jar = match &config.jar {
        Some(path) => check_artifact(path),
        None => locate_artifact(&config.root),
    }
    .map_err(harness_error)?;
    tracing::debug!("JAR:{}", jar.display());

    let context = config.substitution_context();
    let runner = config.command_runner(&jar);
    let mut controller =
        Controller::new(&registry, &context, runner, LogReporter::new()).map_err(harness_error)?;

    let summary = controller.run(selection).map_err(harness_error)?;
    if summary.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Summary already reported
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

/// Print every registry case with its index.
pub fn list_cases() -> CliResult<ExitCode> {
    let registry = Registry::builtin().map_err(|e| CliError::failure(format!("Invalid test registry: {}", e)))?;
    for (index, case) in registry.iter() {
        let expected = case.expected_last_line.as_deref().unwrap_or("-");
        println!(
            "{:>2}  {:<50} rc={:<3} last={}",
            index, case.label, case.expected_return_code, expected
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Map run-wide errors to exit codes: selection problems are usage errors.
fn harness_error(e: HarnessError) -> CliError {
    match e {
        HarnessError::IndexOutOfRange { .. } => CliError::usage(format!("Error: {}", e)),
        HarnessError::MissingArtifact { .. } => {
            tracing::error!("{}", e);
            CliError::failure("")
        }
        HarnessError::Registry(_) => CliError::failure(format!("Error: {}", e)),
    }
}
