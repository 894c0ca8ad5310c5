use std::path::{Path, PathBuf};

/// A schema file read from disk.
///
/// `name` is the path relative to the project root with `/` separators. It is
/// what diagnostics and generated headers print, so output does not depend on
/// where the project is checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    name: String,
    contents: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// An in-memory file; the name doubles as the path.
    pub fn virtual_file(name: &str, contents: impl Into<String>) -> Self {
        Self::new(name, name, contents)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }
}
