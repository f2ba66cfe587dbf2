//! Selection and sequential execution of registry cases
//!
//! One case runs at a time: resolve its arguments, run the validated program,
//! classify the output, evaluate, then count. Nothing carries over between cases
//! except the pass/fail counters held here.

use std::time::Instant;

use thiserror::Error;

use crate::evaluate::{CaseFailure, ExecutionOutcome, Verdict, evaluate};
use crate::registry::{Registry, RegistryError, TestCase};
use crate::reporter::{HarnessReporter, RunSummary};
use crate::runner::ProcessRunner;
use crate::substitution::SubstitutionContext;

/// Errors that stop the whole run before any case executes.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("test index {index} is out of range (registry has {len} cases, valid: 0..{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Could not find data-validator jar in {searched}, try running `sbt assembly`")]
    MissingArtifact { searched: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Which registry indices to run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    /// Explicit indices, run in the order given.
    Indices(Vec<usize>),
}

impl Selection {
    /// An empty list selects everything.
    pub fn from_indices(indices: Vec<usize>) -> Self {
        if indices.is_empty() {
            Selection::All
        } else {
            Selection::Indices(indices)
        }
    }

    /// Concrete indices for a registry of `len` cases.
    pub fn resolve(&self, len: usize) -> Result<Vec<usize>, HarnessError> {
        match self {
            Selection::All => Ok((0..len).collect()),
            Selection::Indices(indices) => {
                if let Some(&index) = indices.iter().find(|&&i| i >= len) {
                    return Err(HarnessError::IndexOutOfRange { index, len });
                }
                Ok(indices.clone())
            }
        }
    }
}

/// Drives selected cases through a runner and a reporter.
pub struct Controller<'a, R, P> {
    registry: &'a Registry,
    context: &'a SubstitutionContext,
    runner: R,
    reporter: P,
}

impl<'a, R: ProcessRunner, P: HarnessReporter> Controller<'a, R, P> {
    /// Fails if `context` leaves any placeholder of the registry unbound.
    pub fn new(
        registry: &'a Registry,
        context: &'a SubstitutionContext,
        runner: R,
        reporter: P,
    ) -> Result<Self, HarnessError> {
        registry.check_context(context)?;
        Ok(Self {
            registry,
            context,
            runner,
            reporter,
        })
    }

    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    pub fn into_reporter(self) -> P {
        self.reporter
    }

    /// Run the selection and return the totals.
    pub fn run(&mut self, selection: &Selection) -> Result<RunSummary, HarnessError> {
        let registry = self.registry;
        let indices = selection.resolve(registry.len())?;
        let start = Instant::now();
        let mut summary = RunSummary::default();

        self.reporter.on_run_start(indices.len());

        for index in indices {
            let Some(case) = registry.get(index) else {
                return Err(HarnessError::IndexOutOfRange {
                    index,
                    len: registry.len(),
                });
            };
            let verdict = self.run_case(case);
            if verdict.failed() {
                summary.failed += 1;
            } else {
                summary.passed += 1;
            }
            self.reporter.on_case_complete(index, case, &verdict);
        }

        summary.duration = start.elapsed();
        self.reporter.on_run_complete(&summary);
        Ok(summary)
    }

    /// Run a single case; every failure is folded into the verdict.
    pub fn run_case(&self, case: &TestCase) -> Verdict {
        let _span = tracing::debug_span!("case", label = %case.label).entered();

        let args = match case.resolve_args(self.context) {
            Ok(args) => args,
            Err(e) => return Verdict::fail(CaseFailure::Unresolved(e)),
        };

        let captured = match self.runner.run(&args) {
            Ok(captured) => captured,
            Err(e) => {
                tracing::debug!("{}", e);
                return Verdict::fail(CaseFailure::Launch(e.to_string()));
            }
        };

        let outcome = ExecutionOutcome::from_capture(captured);
        if outcome.truncated {
            tracing::debug!("output exceeded the capture limit; earliest lines dropped");
        }
        evaluate(case, &outcome)
    }
}
