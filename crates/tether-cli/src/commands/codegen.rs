use std::path::PathBuf;

use tether_driver::Compiler;

use super::open_compiler;
use crate::error::CliResult;

pub fn handle_codegen(project: Option<PathBuf>) -> CliResult<()> {
    let compiler = open_compiler(project)?;
    run_codegen(&compiler)
}

pub fn run_codegen(compiler: &Compiler) -> CliResult<()> {
    println!("Generating bindings for `{}`", compiler.project().name());
    let report = compiler.generate()?;
    for file in &report.files {
        println!("{:>10} {}", file.outcome, file.path.display());
    }
    for name in &report.missing_mods {
        println!("warning: src/lib.rs does not declare `pub mod {name};`");
    }
    println!(
        "Done: {} module(s), {} file(s) written (fingerprint {})",
        report.fingerprint.modules.len(),
        report.written(),
        report.fingerprint.project.get(..12).unwrap_or_default()
    );
    Ok(())
}
