//! Harness configuration
//!
//! Everything a run needs besides the registry: where the project lives, how
//! to launch the validated program, and the per-case resource limits.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::runner::{CommandRunner, DEFAULT_MAX_OUTPUT_BYTES, Invocation};
use crate::substitution::{Placeholder, SubstitutionContext};

/// Main class of the validated program inside the assembly jar.
pub const MAIN_CLASS: &str = "com.tgt.edabi.dse.data_validator.Main";
/// Default per-case timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Project root holding `src/test/resources` and `target/`
    pub root: PathBuf,
    /// Jar to run instead of the discovered one
    pub jar: Option<PathBuf>,
    /// Launcher executable
    pub launcher: String,
    pub main_class: String,
    /// Spark master URL
    pub master: String,
    /// `None` waits forever
    pub timeout: Option<Duration>,
    pub max_output_bytes: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            jar: None,
            launcher: "spark-submit".to_string(),
            main_class: MAIN_CLASS.to_string(),
            master: "local".to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_jar(mut self, jar: Option<PathBuf>) -> Self {
        self.jar = jar;
        self
    }

    pub fn with_launcher(mut self, launcher: impl Into<String>) -> Self {
        self.launcher = launcher.into();
        self
    }

    /// A zero duration disables the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    /// Directory of validator YAML configurations (`$YAML_DIR`).
    pub fn yaml_dir(&self) -> PathBuf {
        self.root.join("src/test/resources/conf")
    }

    /// Directory of validator input data (`$DATA_DIR`).
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("src/test/resources/data")
    }

    pub fn substitution_context(&self) -> SubstitutionContext {
        SubstitutionContext::new()
            .with_path(Placeholder::YamlDir, &self.yaml_dir())
            .with_path(Placeholder::DataDir, &self.data_dir())
    }

    /// `spark-submit --class <main> --master <master> <jar>`
    pub fn invocation(&self, jar: &Path) -> Invocation {
        Invocation::new(self.launcher.clone())
            .arg("--class")
            .arg(self.main_class.clone())
            .arg("--master")
            .arg(self.master.clone())
            .arg(jar.to_string_lossy())
    }

    pub fn command_runner(&self, jar: &Path) -> CommandRunner {
        CommandRunner::new(self.invocation(jar))
            .with_timeout(self.timeout)
            .with_max_output_bytes(self.max_output_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.launcher, "spark-submit");
        assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT));
        assert_eq!(config.max_output_bytes, 1024 * 1024);
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = HarnessConfig::new().with_timeout(Duration::ZERO);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_context_points_into_root() {
        let config = HarnessConfig::new().with_root("/proj");
        let ctx = config.substitution_context();
        assert_eq!(ctx.get(Placeholder::YamlDir), Some("/proj/src/test/resources/conf"));
        assert_eq!(ctx.get(Placeholder::DataDir), Some("/proj/src/test/resources/data"));
    }

    #[test]
    fn test_invocation_prefix() {
        let inv = HarnessConfig::new().invocation(Path::new("/proj/app.jar"));
        assert_eq!(inv.program, "spark-submit");
        assert_eq!(inv.prefix, ["--class", MAIN_CLASS, "--master", "local", "/proj/app.jar"]);
    }
}
