//! Compare an observed run with a case's expectations

use std::time::Duration;

use thiserror::Error;

use crate::classify::{last_nonblank_line, split_lines};
use crate::registry::TestCase;
use crate::runner::CapturedRun;
use crate::substitution::SubstitutionError;

/// Everything observed about one case run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub exit_code: Option<i32>,
    /// Classified status marker; `None` when the output had no content.
    pub last_line: Option<String>,
    pub timed_out: Option<Duration>,
    pub truncated: bool,
    /// Raw captured lines, kept for debug diagnostics.
    pub lines: Vec<String>,
}

impl ExecutionOutcome {
    pub fn from_capture(run: CapturedRun) -> Self {
        let lines = split_lines(&run.output);
        let last_line = last_nonblank_line(&lines);
        Self {
            exit_code: run.exit_code,
            last_line,
            timed_out: run.timed_out,
            truncated: run.truncated,
            lines,
        }
    }
}

/// Why a case did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseFailure {
    #[error("Unexpected Return code returncode:{} expected:{expected}", display_code(.actual))]
    UnexpectedReturnCode { expected: i32, actual: Option<i32> },

    #[error("Unexpected last line:{} expected:{expected}", display_line(.actual))]
    UnexpectedOutputMarker { expected: String, actual: Option<String> },

    #[error("Timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Could not resolve case arguments: {0}")]
    Unresolved(#[from] SubstitutionError),

    #[error("Could not run case: {0}")]
    Launch(String),
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "<none>".to_string(), |c| c.to_string())
}

fn display_line(line: &Option<String>) -> &str {
    line.as_deref().unwrap_or("<no output>")
}

/// Outcome of evaluating one case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub failures: Vec<CaseFailure>,
}

impl Verdict {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn fail(failure: CaseFailure) -> Self {
        Self {
            failures: vec![failure],
        }
    }

    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn status(&self) -> &'static str {
        if self.failed() { "FAIL" } else { "PASS" }
    }
}

/// Decide whether `outcome` satisfies `case`.
pub fn evaluate(case: &TestCase, outcome: &ExecutionOutcome) -> Verdict {
    let mut failures = Vec::new();

    if let Some(after) = outcome.timed_out {
        failures.push(CaseFailure::Timeout { after });
    }

    if outcome.exit_code != Some(case.expected_return_code) {
        let failure = CaseFailure::UnexpectedReturnCode {
            expected: case.expected_return_code,
            actual: outcome.exit_code,
        };
        tracing::debug!("{}", failure);
        tracing::debug!("stdout:{:?}", outcome.lines);
        failures.push(failure);
    }

    match &case.expected_last_line {
        Some(expected) => {
            tracing::debug!(
                "last_line:{} conf_expected:{}",
                outcome.last_line.as_deref().unwrap_or("<no output>"),
                expected
            );
            if outcome.last_line.as_deref() != Some(expected.as_str()) {
                let failure = CaseFailure::UnexpectedOutputMarker {
                    expected: expected.clone(),
                    actual: outcome.last_line.clone(),
                };
                tracing::debug!("{}", failure);
                if tracing::enabled!(tracing::Level::DEBUG) {
                    for line in &outcome.lines {
                        tracing::debug!("STDOUT:{}", line);
                    }
                }
                failures.push(failure);
            }
        }
        None => tracing::debug!("No expected output!"),
    }

    Verdict { failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{VALIDATOR_FAIL, VALIDATOR_PASS};

    fn case(rc: i32, last: Option<&str>) -> TestCase {
        TestCase::new("case", &[], rc, last).unwrap()
    }

    fn outcome(rc: i32, last: Option<&str>) -> ExecutionOutcome {
        ExecutionOutcome {
            exit_code: Some(rc),
            last_line: last.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_matching_code_and_marker_passes() {
        let v = evaluate(&case(0, Some(VALIDATOR_PASS)), &outcome(0, Some(VALIDATOR_PASS)));
        assert!(!v.failed());
        assert_eq!(v.status(), "PASS");
    }

    #[test]
    fn test_marker_mismatch_fails_even_with_matching_code() {
        let v = evaluate(&case(0, Some(VALIDATOR_PASS)), &outcome(0, Some(VALIDATOR_FAIL)));
        assert_eq!(
            v.failures,
            vec![CaseFailure::UnexpectedOutputMarker {
                expected: VALIDATOR_PASS.to_string(),
                actual: Some(VALIDATOR_FAIL.to_string()),
            }]
        );
    }

    #[test]
    fn test_code_mismatch_fails_regardless_of_output() {
        let v = evaluate(&case(255, Some(VALIDATOR_FAIL)), &outcome(1, Some(VALIDATOR_FAIL)));
        assert_eq!(
            v.failures,
            vec![CaseFailure::UnexpectedReturnCode {
                expected: 255,
                actual: Some(1),
            }]
        );
    }

    #[test]
    fn test_no_expected_line_passes_on_code_alone() {
        let c = case(0, None);
        assert!(!evaluate(&c, &outcome(0, Some("anything at all"))).failed());
        assert!(!evaluate(&c, &outcome(0, None)).failed());
    }

    #[test]
    fn test_no_output_does_not_match_expected_marker() {
        let v = evaluate(&case(0, Some(VALIDATOR_PASS)), &outcome(0, None));
        assert!(v.failed());
    }

    #[test]
    fn test_timeout_is_reported() {
        let o = ExecutionOutcome {
            exit_code: Some(137),
            timed_out: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        let v = evaluate(&case(0, None), &o);
        assert_eq!(v.failures[0], CaseFailure::Timeout {
            after: Duration::from_secs(1)
        });
        assert_eq!(v.failures.len(), 2);
    }

    #[test]
    fn test_outcome_from_capture_classifies_last_line() {
        let run = CapturedRun {
            exit_code: Some(0),
            output: b"log\nDATA_VALIDATOR_STATUS=PASS\n\n  \n".to_vec(),
            truncated: false,
            timed_out: None,
        };
        let o = ExecutionOutcome::from_capture(run);
        assert_eq!(o.last_line.as_deref(), Some(VALIDATOR_PASS));
        assert_eq!(o.lines.len(), 4);
    }

    #[test]
    fn test_failure_messages() {
        let f = CaseFailure::UnexpectedReturnCode {
            expected: 255,
            actual: Some(1),
        };
        assert_eq!(f.to_string(), "Unexpected Return code returncode:1 expected:255");
        let f = CaseFailure::UnexpectedOutputMarker {
            expected: VALIDATOR_PASS.to_string(),
            actual: None,
        };
        assert_eq!(
            f.to_string(),
            "Unexpected last line:<no output> expected:DATA_VALIDATOR_STATUS=PASS"
        );
    }
}
