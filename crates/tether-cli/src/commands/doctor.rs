use std::path::PathBuf;
use std::process::Command;

use tether_driver::{Compiler, Freshness};

use super::start_dir;
use crate::error::{CliError, CliResult};

/// Result of one doctor check.
enum Status {
    Ok(String),
    Failed { detail: String, suggestion: String },
}

fn report(label: &str, status: Status, suggestions: &mut Vec<String>) -> bool {
    match status {
        Status::Ok(detail) => {
            println!("  ok    {label} ({detail})");
            true
        }
        Status::Failed { detail, suggestion } => {
            println!("  FAIL  {label}: {detail}");
            suggestions.push(suggestion);
            false
        }
    }
}

fn tool_version(program: &str) -> Status {
    match Command::new(program).arg("--version").output() {
        Ok(output) if output.status.success() => {
            Status::Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        Ok(output) => Status::Failed {
            detail: format!("`{program} --version` exited with {}", output.status),
            suggestion: format!("Reinstall `{program}` with rustup"),
        },
        Err(e) => Status::Failed {
            detail: e.to_string(),
            suggestion: "Install a Rust toolchain: https://rustup.rs".to_string(),
        },
    }
}

pub fn handle_doctor(project: Option<PathBuf>) -> CliResult<()> {
    let mut suggestions = Vec::new();
    let mut failures = 0;
    let mut check = |label: &str, status: Status, suggestions: &mut Vec<String>| {
        if !report(label, status, suggestions) {
            failures += 1;
        }
    };

    println!("Toolchain");
    check("cargo", tool_version("cargo"), &mut suggestions);
    check("rustc", tool_version("rustc"), &mut suggestions);

    println!("\nProject");
    let compiler = match Compiler::open(&start_dir(project)?) {
        Ok(compiler) => {
            let root = compiler.project().root().display().to_string();
            check("configuration", Status::Ok(root), &mut suggestions);
            Some(compiler)
        }
        Err(e) => {
            let status = Status::Failed {
                detail: e.to_string(),
                suggestion: "Run `tether init <name>` or pass --project <dir>".to_string(),
            };
            check("configuration", status, &mut suggestions);
            None
        }
    };

    if let Some(compiler) = compiler {
        let status = match compiler.project().runtime_dir() {
            Some(dir) if dir.join("Cargo.toml").is_file() => Status::Ok(dir.display().to_string()),
            Some(dir) => Status::Failed {
                detail: format!("{} has no Cargo.toml", dir.display()),
                suggestion: "Point [codegen] runtime in tether.toml at the tether-rt crate".to_string(),
            },
            None => Status::Ok("not pinned; the implementation crate's manifest decides".to_string()),
        };
        check("runtime", status, &mut suggestions);

        let source_root = compiler.project().source_root();
        let status = if source_root.is_dir() {
            Status::Ok(source_root.display().to_string())
        } else {
            Status::Failed {
                detail: format!("{} does not exist", source_root.display()),
                suggestion: "Create the source root or set [project] source_dir in tether.toml".to_string(),
            }
        };
        check("source root", status, &mut suggestions);

        let prefix = &compiler.project().config().codegen.schema_prefix;
        let status = match compiler.discover() {
            Ok(files) if !files.is_empty() => Status::Ok(format!("{} file(s)", files.len())),
            Ok(_) => Status::Failed {
                detail: "no schema files found".to_string(),
                suggestion: format!("Name schema files `{prefix}<Module>.ts`"),
            },
            Err(e) => Status::Failed { detail: e.to_string(), suggestion: "Fix the source root".to_string() },
        };
        check("schema files", status, &mut suggestions);

        let status = match compiler.freshness() {
            Ok(Freshness::Fresh) => Status::Ok("up to date".to_string()),
            Ok(Freshness::Stale(drift)) => Status::Failed {
                detail: drift.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "),
                suggestion: "Run `tether codegen` to regenerate bindings".to_string(),
            },
            Ok(Freshness::NeverGenerated) => Status::Failed {
                detail: "bindings have never been generated".to_string(),
                suggestion: "Run `tether codegen`".to_string(),
            },
            Err(e) => Status::Failed {
                detail: e.to_string(),
                suggestion: "Run `tether codegen` to see every schema diagnostic".to_string(),
            },
        };
        check("bindings", status, &mut suggestions);
    }

    if failures == 0 {
        println!("\nEverything looks good.");
        return Ok(());
    }
    println!("\nSuggestions");
    for suggestion in &suggestions {
        println!("  - {suggestion}");
    }
    Err(CliError::DoctorFailed(failures))
}
