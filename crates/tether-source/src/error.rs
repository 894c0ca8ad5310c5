use std::path::PathBuf;
use thiserror::Error;
use miette::Diagnostic;

/// Errors raised while locating a project, reading its configuration or
/// scanning its source root.
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    /// No `tether.toml` was found in the directory or any of its ancestors.
    #[error("No tether.toml found in {0} or any parent directory")]
    #[diagnostic(
        code("SOURCE-001"),
        help("Run `tether init <name>` to create a project, or pass --project <dir>")
    )]
    ConfigNotFound(PathBuf),

    #[error("Failed to read {path}")]
    #[diagnostic(
        code("SOURCE-002"),
        help("Check file permissions and ensure the file is not corrupted")
    )]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {message}")]
    #[diagnostic(
        code("SOURCE-003"),
        help("Check your tether.toml syntax; only [project] and [codegen] sections are recognised")
    )]
    ConfigParse { path: PathBuf, message: String },

    /// The configuration parsed but carries a value we cannot work with.
    #[error("Invalid configuration: {0}")]
    #[diagnostic(code("SOURCE-004"))]
    InvalidConfig(String),

    #[error("Source root {0} does not exist")]
    #[diagnostic(
        code("SOURCE-005"),
        help("Set [project] source_dir in tether.toml to the directory holding your schema files")
    )]
    SourceRootMissing(PathBuf),

    #[error("I/O error while {operation} {path}")]
    #[diagnostic(code("SOURCE-006"))]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        SourceError::Io { path: path.into(), operation, source }
    }
}
