//! Locate the data-validator assembly jar

use std::fs;
use std::path::{Path, PathBuf};

use crate::controller::HarnessError;

/// Build output directory, relative to the project root.
pub const JAR_DIR: &str = "target/scala-2.11";
const JAR_PREFIX: &str = "data-validator-assembly";
const JAR_SUFFIX: &str = ".jar";

/// Find the assembly jar under `root`. When several match, the greatest name wins.
pub fn locate_artifact(root: &Path) -> Result<PathBuf, HarnessError> {
    let jar_dir = root.join(JAR_DIR);
    tracing::debug!("jar_dir:{}", jar_dir.display());

    let missing = || HarnessError::MissingArtifact {
        searched: jar_dir.display().to_string(),
    };

    let entries = fs::read_dir(&jar_dir).map_err(|_| missing())?;
    let mut jars: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            name.starts_with(JAR_PREFIX) && name.ends_with(JAR_SUFFIX)
        })
        .collect();
    jars.sort();

    jars.pop().ok_or_else(missing)
}

/// Accept an explicitly supplied jar path if it exists.
pub fn check_artifact(path: &Path) -> Result<PathBuf, HarnessError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(HarnessError::MissingArtifact {
            searched: path.display().to_string(),
        })
    }
}
