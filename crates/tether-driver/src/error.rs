use std::path::PathBuf;

use miette::Diagnostic;
use tether_codegen::{CodegenError, Drift};
use tether_resolve::ResolveErrors;
use tether_source::SourceError;
use tether_syntax::SchemaErrors;
use thiserror::Error;

/// Everything the pipeline can fail with.
#[derive(Debug, Error, Diagnostic)]
pub enum DriverError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaErrors),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveErrors),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codegen(#[from] CodegenError),

    #[error("generated bindings are out of date: {}", describe(.0))]
    #[diagnostic(code("DRIFT-001"), help("run `tether codegen` to regenerate them"))]
    Drift(Vec<Drift>),

    #[error("bindings have never been generated for this project")]
    #[diagnostic(code("DRIFT-002"), help("run `tether codegen` first"))]
    NeverGenerated,

    #[error("failed to remove {path}")]
    #[diagnostic(code("DRIVER-001"))]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn describe(drift: &[Drift]) -> String {
    drift.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl DriverError {
    /// Modules named by a drift error.
    pub fn drifted_modules(&self) -> Vec<&str> {
        match self {
            DriverError::Drift(drift) => drift.iter().map(Drift::module).collect(),
            _ => Vec::new(),
        }
    }
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;
