//! End-to-end runs against real child processes
//!
//! A tiny `sh` script plays the validated program. The harness prefix becomes
//! `sh -c <script> validator`, so the case flags arrive as `"$@"`.

#![cfg(unix)]

use std::time::Duration;

use dv_conformance::controller::{Controller, Selection};
use dv_conformance::registry::{Registry, TestCase, VALIDATOR_FAIL, VALIDATOR_PASS};
use dv_conformance::reporter::LogReporter;
use dv_conformance::runner::{CommandRunner, Invocation, ProcessRunner};
use dv_conformance::substitution::{Placeholder, SubstitutionContext};

/// Fake validator: passes only when given `--config <yaml_dir>/simple.yaml`.
const FAKE_VALIDATOR: &str = r#"
echo "starting validator" >&2
for a in "$@"; do echo "arg: $a"; done
case "$2" in
  */conf/simple.yaml) echo; echo "DATA_VALIDATOR_STATUS=PASS"; echo; echo "   "; exit 0 ;;
  *) echo "DATA_VALIDATOR_STATUS=FAIL"; exit 255 ;;
esac
"#;

fn sh_runner(script: &str) -> CommandRunner {
    CommandRunner::new(Invocation::new("sh").arg("-c").arg(script).arg("validator"))
        .with_timeout(Some(Duration::from_secs(30)))
}

fn context() -> SubstitutionContext {
    SubstitutionContext::new()
        .with(Placeholder::YamlDir, "/proj/conf")
        .with(Placeholder::DataDir, "/proj/data")
}

#[test]
fn test_real_process_verdicts_follow_exit_code_and_marker() {
    let registry = Registry::new(vec![
        TestCase::new("passes", &[("config", "$YAML_DIR/simple.yaml")], 0, Some(VALIDATOR_PASS)).unwrap(),
        TestCase::new("fails as expected", &[("config", "$YAML_DIR/bad.yaml")], 255, Some(VALIDATOR_FAIL)).unwrap(),
        TestCase::new("wrong expectation", &[("config", "$YAML_DIR/bad.yaml")], 0, Some(VALIDATOR_PASS)).unwrap(),
        TestCase::new("code only", &[("config", "$YAML_DIR/bad.yaml")], 255, None).unwrap(),
    ])
    .unwrap();
    let ctx = context();
    let mut controller = Controller::new(&registry, &ctx, sh_runner(FAKE_VALIDATOR), LogReporter::new()).unwrap();

    let summary = controller.run(&Selection::All).unwrap();
    assert_eq!((summary.passed, summary.failed), (3, 1));
}

#[test]
fn test_stderr_is_merged_into_captured_output() {
    let run = sh_runner(FAKE_VALIDATOR).run(&[]).unwrap();
    let text = String::from_utf8(run.output).unwrap();
    assert!(text.starts_with("starting validator\n"));
    assert_eq!(run.exit_code, Some(255));
}

#[test]
fn test_timed_out_case_fails_and_next_case_runs() {
    let script = r#"case "$2" in slow) sleep 30 ;; esac; echo DATA_VALIDATOR_STATUS=PASS"#;
    let registry = Registry::new(vec![
        TestCase::new("hangs", &[("mode", "slow")], 0, Some(VALIDATOR_PASS)).unwrap(),
        TestCase::new("quick", &[("mode", "fast")], 0, Some(VALIDATOR_PASS)).unwrap(),
    ])
    .unwrap();
    let ctx = context();
    let runner = sh_runner(script).with_timeout(Some(Duration::from_millis(300)));
    let mut controller = Controller::new(&registry, &ctx, runner, LogReporter::new()).unwrap();

    let summary = controller.run(&Selection::All).unwrap();
    assert_eq!((summary.passed, summary.failed), (1, 1));
}

#[test]
fn test_marker_survives_output_beyond_capture_limit() {
    let script = r#"i=0; while [ $i -lt 5000 ]; do echo "noise line $i"; i=$((i+1)); done; echo DATA_VALIDATOR_STATUS=PASS"#;
    let run = sh_runner(script).with_max_output_bytes(2048).run(&[]).unwrap();
    assert!(run.truncated);
    assert!(run.output.len() <= 2048);
    let outcome = dv_conformance::evaluate::ExecutionOutcome::from_capture(run);
    assert_eq!(outcome.last_line.as_deref(), Some(VALIDATOR_PASS));
}
