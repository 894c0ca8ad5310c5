use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{CodegenError, CodegenResult};

/// What may happen to an existing file at an artifact's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Owned by the generator; rewritten whenever its content changes.
    Overwrite,
    /// Written once, then owned by the user.
    CreateOnly,
}

/// One file the emitter wants on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Relative to the project root.
    pub path: PathBuf,
    pub content: String,
    pub policy: WritePolicy,
}

impl Artifact {
    pub fn overwrite(path: impl Into<PathBuf>, content: String) -> Self {
        Artifact { path: path.into(), content, policy: WritePolicy::Overwrite }
    }

    pub fn create_only(path: impl Into<PathBuf>, content: String) -> Self {
        Artifact { path: path.into(), content, policy: WritePolicy::CreateOnly }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Already had exactly this content; left untouched.
    Unchanged,
    /// A user-owned file that already existed.
    Preserved,
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            WriteOutcome::Written => "written",
            WriteOutcome::Unchanged => "unchanged",
            WriteOutcome::Preserved => "preserved",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

/// Write `artifacts` under `root`, skipping files whose bytes already match
/// and never touching existing create-only files.
pub fn write_artifacts(root: &Path, artifacts: &[Artifact]) -> CodegenResult<Vec<WriteReport>> {
    artifacts.iter().map(|artifact| write_artifact(root, artifact)).collect()
}

fn write_artifact(root: &Path, artifact: &Artifact) -> CodegenResult<WriteReport> {
    let path = root.join(&artifact.path);
    let outcome = if path.exists() {
        match artifact.policy {
            WritePolicy::CreateOnly => WriteOutcome::Preserved,
            WritePolicy::Overwrite => {
                let existing = fs::read(&path).map_err(|source| CodegenError::Read { path: path.clone(), source })?;
                if existing == artifact.content.as_bytes() {
                    WriteOutcome::Unchanged
                } else {
                    write(&path, &artifact.content)?;
                    WriteOutcome::Written
                }
            }
        }
    } else {
        write(&path, &artifact.content)?;
        WriteOutcome::Written
    };
    debug!("{}: {outcome}", artifact.path.display());
    Ok(WriteReport { path: artifact.path.clone(), outcome })
}

fn write(path: &Path, content: &str) -> CodegenResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CodegenError::Write { path: parent.to_path_buf(), source })?;
    }
    fs::write(path, content).map_err(|source| CodegenError::Write { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_policies() {
        let dir = tempfile::tempdir().unwrap();
        let generated = Artifact::overwrite("a/gen.rs", "one".to_string());
        let skeleton = Artifact::create_only("a/impl.rs", "stub".to_string());

        let first = write_artifacts(dir.path(), &[generated.clone(), skeleton.clone()]).unwrap();
        assert!(first.iter().all(|r| r.outcome == WriteOutcome::Written));

        let second = write_artifacts(dir.path(), &[generated, skeleton.clone()]).unwrap();
        assert_eq!(second[0].outcome, WriteOutcome::Unchanged);
        assert_eq!(second[1].outcome, WriteOutcome::Preserved);

        fs::write(dir.path().join("a/impl.rs"), "user code").unwrap();
        let changed = Artifact::overwrite("a/gen.rs", "two".to_string());
        let third = write_artifacts(dir.path(), &[changed, skeleton]).unwrap();
        assert_eq!(third[0].outcome, WriteOutcome::Written);
        assert_eq!(fs::read_to_string(dir.path().join("a/gen.rs")).unwrap(), "two");
        assert_eq!(fs::read_to_string(dir.path().join("a/impl.rs")).unwrap(), "user code");
    }
}
