use std::path::PathBuf;

use miette::Diagnostic;
use tether_driver::DriverError;
use tether_source::SourceError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error("I/O error while {operation} {path}")]
    #[diagnostic(code(tether::cli::io_error))]
    IoError {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} already contains a tether project")]
    #[diagnostic(
        code(tether::cli::project_exists),
        help("run `tether codegen` there instead, or pick an empty directory")
    )]
    ProjectExists(PathBuf),

    #[error("`{0}` cannot be used as a project name")]
    #[diagnostic(
        code(tether::cli::invalid_name),
        help("use letters, digits, `-` or `_`, starting with a letter")
    )]
    InvalidName(String),

    #[error("failed to run `{program}`")]
    #[diagnostic(code(tether::cli::tool_missing), help("install a Rust toolchain with rustup"))]
    ToolMissing {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("cargo build failed ({status})")]
    #[diagnostic(code(tether::cli::build_failed))]
    BuildFailed { status: String },

    #[error("failed to render the resolved schema as JSON")]
    #[diagnostic(code(tether::cli::json))]
    Json(#[from] serde_json::Error),

    #[error("doctor found {0} problem(s)")]
    #[diagnostic(code(tether::cli::doctor), help("follow the suggestions above"))]
    DoctorFailed(usize),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, operation: impl Into<String>, source: std::io::Error) -> Self {
        CliError::IoError { path: path.into(), operation: operation.into(), source }
    }
}

pub type CliResult<T> = std::result::Result<T, CliError>;
