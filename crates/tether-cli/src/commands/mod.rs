use std::env;
use std::path::PathBuf;

use tether_driver::Compiler;

use crate::error::{CliError, CliResult};

pub mod build;
pub mod clean;
pub mod codegen;
pub mod doctor;
pub mod init;
pub mod show;

/// The directory given with `--project`, or the current one.
pub fn start_dir(project: Option<PathBuf>) -> CliResult<PathBuf> {
    match project {
        Some(dir) => Ok(dir),
        None => env::current_dir().map_err(|e| CliError::io(".", "getting current directory", e)),
    }
}

pub fn open_compiler(project: Option<PathBuf>) -> CliResult<Compiler> {
    let start = start_dir(project)?;
    Ok(Compiler::open(&start)?)
}
