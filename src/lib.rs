#![forbid(unsafe_code)]
//! Conformance harness for the data-validator command line
//!
//! The harness drives the validator through a fixed matrix of argument
//! configurations and judges each run only by what it can observe from the
//! outside: the exit code and the last non-blank line of output.
//!
//! ## Pipeline
//!
//! For each selected case the [`controller`] resolves argument templates
//! ([`substitution`]), launches the program ([`runner`]), extracts the status
//! marker ([`classify`]), compares against expectations ([`evaluate`]) and hands
//! the verdict to a [`reporter`].
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod artifact;
pub mod classify;
pub mod cli;
pub mod config;
pub mod controller;
pub mod evaluate;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod substitution;
pub mod version;

pub use config::HarnessConfig;
pub use controller::{Controller, HarnessError, Selection};
pub use evaluate::{CaseFailure, ExecutionOutcome, Verdict, evaluate};
pub use registry::{Registry, TestCase};
pub use reporter::{HarnessReporter, LogReporter, RunSummary};
pub use runner::{CapturedRun, CommandRunner, Invocation, ProcessRunner};
