use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CodegenError {
    #[error("failed to write {path}")]
    #[diagnostic(code(tether_codegen::write), help("check that the implementation crate directory is writable"))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}")]
    #[diagnostic(code(tether_codegen::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The resolved model could not be serialized for fingerprinting.
    #[error("failed to serialize the resolved model")]
    #[diagnostic(code(tether_codegen::serialize))]
    Serialize(#[from] serde_json::Error),

    #[error("fingerprint file {path} is malformed: {message}")]
    #[diagnostic(code(tether_codegen::fingerprint), help("run `tether codegen` to rewrite it"))]
    Fingerprint { path: PathBuf, message: String },
}

pub type CodegenResult<T> = std::result::Result<T, CodegenError>;
