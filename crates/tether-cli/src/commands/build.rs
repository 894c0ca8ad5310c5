use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::open_compiler;
use crate::error::{CliError, CliResult};

pub fn handle_build(project: Option<PathBuf>, release: bool) -> CliResult<()> {
    let compiler = open_compiler(project)?;
    compiler.check_drift()?;

    let manifest = compiler.project().crate_dir().join("Cargo.toml");
    let mode = if release { "release" } else { "debug" };

    let mut cargo = Command::new("cargo");
    cargo.arg("build").arg("--manifest-path").arg(&manifest);
    if release {
        cargo.arg("--release");
    }
    log::debug!("Running {cargo:?}");

    let output = with_spinner(&format!("Building `{}` ({mode})", compiler.project().name()), || {
        cargo.output()
    })
    .map_err(|source| CliError::ToolMissing { program: "cargo", source })?;

    if !output.status.success() {
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
        return Err(CliError::BuildFailed { status: output.status.to_string() });
    }
    println!("Built `{}` ({mode})", compiler.project().name());
    Ok(())
}

fn with_spinner<T>(message: &str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message.to_string());
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));
    let result = f();
    spinner.finish_and_clear();
    result
}
