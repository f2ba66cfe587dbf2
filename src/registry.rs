//! Built-in conformance cases for the data-validator command line
//!
//! The registry is compiled into the harness and never loaded from disk. Every
//! argument template is parsed when the registry is built, so the index space,
//! labels and placeholders are all fixed before the first case runs.

use std::collections::HashSet;

use thiserror::Error;

use crate::substitution::{Placeholder, SubstitutionContext, SubstitutionError, Template};

/// Final line printed by the validator when validation succeeded.
pub const VALIDATOR_PASS: &str = "DATA_VALIDATOR_STATUS=PASS";
/// Final line printed by the validator when validation failed.
pub const VALIDATOR_FAIL: &str = "DATA_VALIDATOR_STATUS=FAIL";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("case `{label}`, argument `--{flag}`: {source}")]
    Template {
        label: String,
        flag: String,
        #[source]
        source: SubstitutionError,
    },

    #[error("duplicate case label `{0}`")]
    DuplicateLabel(String),

    #[error("placeholder `${placeholder}` used by case `{label}` has no value")]
    UnboundPlaceholder { label: String, placeholder: Placeholder },
}

/// One flag of a case's argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseArg {
    pub flag: String,
    pub value: Template,
}

/// A flag with its value after substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArg {
    pub flag: String,
    pub value: String,
}

/// A declarative conformance case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub label: String,
    pub args: Vec<CaseArg>,
    pub expected_return_code: i32,
    /// `None` means the output is not asserted at all.
    pub expected_last_line: Option<String>,
}

impl TestCase {
    /// Build a case from raw `(flag, template)` pairs.
    pub fn new(
        label: &str,
        args: &[(&str, &str)],
        expected_return_code: i32,
        expected_last_line: Option<&str>,
    ) -> Result<Self, RegistryError> {
        let args = args
            .iter()
            .map(|&(flag, raw)| {
                Template::parse(raw)
                    .map(|value| CaseArg {
                        flag: flag.to_string(),
                        value,
                    })
                    .map_err(|source| RegistryError::Template {
                        label: label.to_string(),
                        flag: flag.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            label: label.to_string(),
            args,
            expected_return_code,
            expected_last_line: expected_last_line.map(str::to_string),
        })
    }

    /// Substitute every argument template, preserving declaration order.
    pub fn resolve_args(&self, context: &SubstitutionContext) -> Result<Vec<ResolvedArg>, SubstitutionError> {
        self.args
            .iter()
            .map(|arg| {
                Ok(ResolvedArg {
                    flag: arg.flag.clone(),
                    value: arg.value.resolve(context)?,
                })
            })
            .collect()
    }
}

/// Immutable, ordered collection of cases. Indices are dense and zero-based.
#[derive(Debug, Clone)]
pub struct Registry {
    cases: Vec<TestCase>,
}

impl Registry {
    pub fn new(cases: Vec<TestCase>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for case in &cases {
            if !seen.insert(case.label.as_str()) {
                return Err(RegistryError::DuplicateLabel(case.label.clone()));
            }
        }
        Ok(Self { cases })
    }

    /// The data-validator conformance matrix.
    pub fn builtin() -> Result<Self, RegistryError> {
        const CONFIG_SIMPLE: (&str, &str) = ("config", "$YAML_DIR/simple.yaml");
        const CONFIG_NULLCHECK: (&str, &str) = ("config", "$YAML_DIR/nullcheck.yaml");
        const VARS_ID: (&str, &str) = ("vars", "DATA_DIR=$DATA_DIR,COL=id");
        const VARS_DATA: (&str, &str) = ("vars", "DATA_DIR=$DATA_DIR");
        const HDFS_HTML: (&str, &str) = ("htmlReport", "hdfs://badnn/very/bad/path.html");
        let fail = Some(VALIDATOR_FAIL);

        Self::new(vec![
            TestCase::new(
                "Bad config path local",
                &[("config", "FileNotFound.yaml"), VARS_DATA],
                255,
                fail,
            )?,
            TestCase::new(
                "Bad local report.json path",
                &[CONFIG_SIMPLE, ("jsonReport", "very/bad/path.json"), VARS_ID],
                255,
                fail,
            )?,
            TestCase::new(
                "Bad hdfs report.json path",
                &[CONFIG_SIMPLE, ("jsonReport", "hdfs://badnn/very/bad/path.json"), VARS_ID],
                255,
                fail,
            )?,
            TestCase::new(
                "Bad local report.html path",
                &[CONFIG_SIMPLE, ("jsonReport", "very/bad/path.html"), VARS_ID],
                255,
                fail,
            )?,
            TestCase::new("Bad hdfs report.html path", &[CONFIG_SIMPLE, HDFS_HTML, VARS_ID], 255, fail)?,
            TestCase::new("Bad cli option", &[CONFIG_SIMPLE, HDFS_HTML, ("badOption", "")], 255, fail)?,
            TestCase::new("Bad (missing) variable in config", &[CONFIG_SIMPLE, HDFS_HTML], 255, fail)?,
            TestCase::new("Bad YAML config", &[("config", "$YAML_DIR/bad.yaml")], 255, fail)?,
            TestCase::new("No problems", &[CONFIG_SIMPLE, VARS_ID], 0, Some(VALIDATOR_PASS))?,
            TestCase::new("nullCheck failures", &[CONFIG_NULLCHECK, VARS_DATA], 255, fail)?,
            TestCase::new(
                "exit error on fail False (with nullCheck failures)",
                &[CONFIG_NULLCHECK, VARS_DATA, ("exitErrorOnFail", "false")],
                0,
                fail,
            )?,
            TestCase::new(
                "Bad column",
                &[CONFIG_SIMPLE, ("vars", "DATA_DIR=$DATA_DIR,COL=BadColumn")],
                255,
                fail,
            )?,
        ])
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TestCase> {
        self.cases.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TestCase)> {
        self.cases.iter().enumerate()
    }

    /// Verify that `context` binds every placeholder any case uses.
    pub fn check_context(&self, context: &SubstitutionContext) -> Result<(), RegistryError> {
        for case in &self.cases {
            for arg in &case.args {
                if let Some(placeholder) = arg.value.placeholders().find(|p| !context.contains(*p)) {
                    return Err(RegistryError::UnboundPlaceholder {
                        label: case.label.clone(),
                        placeholder,
                    });
                }
            }
        }
        Ok(())
    }
}
