use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tether_driver::Compiler;
use tether_resolve::naming::{to_pascal_case, to_snake_case};
use tether_source::{Project, TetherConfig, CONFIG_FILE_NAME};

use super::codegen::run_codegen;
use super::start_dir;
use crate::error::{CliError, CliResult};

pub fn handle_init(project: Option<PathBuf>, name: &str, runtime: Option<PathBuf>) -> CliResult<()> {
    if !is_valid_name(name) {
        return Err(CliError::InvalidName(name.to_string()));
    }
    let root = start_dir(project)?;
    if root.join(CONFIG_FILE_NAME).exists() {
        return Err(CliError::ProjectExists(root));
    }

    let runtime = match runtime {
        Some(dir) if dir.is_relative() => env::current_dir()
            .map_err(|e| CliError::io(".", "getting current directory", e))?
            .join(dir),
        Some(dir) => dir,
        None => bundled_runtime(),
    };
    if !runtime.join("Cargo.toml").is_file() {
        log::warn!("{} has no Cargo.toml; `tether build` will fail until it does", runtime.display());
    }

    let mut config = TetherConfig::new(name);
    config.codegen.runtime = Some(runtime.clone());
    let module = to_pascal_case(name);
    println!("Creating project `{name}` in {}", root.display());

    write(&root.join(CONFIG_FILE_NAME), &config.to_toml_string()?)?;
    write(
        &root.join(&config.project.source_dir).join(format!("{}{module}.ts", config.codegen.schema_prefix)),
        &sample_schema(&module),
    )?;
    write(&root.join(&config.codegen.crate_dir).join("Cargo.toml"), &crate_manifest(name, &runtime))?;
    write(&root.join(".gitignore"), "target/\n")?;

    run_codegen(&Compiler::new(Project::new(root, config)))
}

/// The tether-rt crate of the workspace this binary was built from.
fn bundled_runtime() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.parent().unwrap_or(manifest_dir).join("tether-rt")
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn write(path: &Path, contents: &str) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CliError::io(parent, "creating directory", e))?;
    }
    fs::write(path, contents).map_err(|e| CliError::io(path, "writing", e))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

fn sample_schema(module: &str) -> String {
    format!(
        "import type {{ NativeModule, Signal }} from 'tether-modules';
import {{ NativeModuleRegistry }} from 'tether-modules';

export interface Spec extends NativeModule {{
  add(a: number, b: number): number;
  sumLater(values: number[]): Promise<number>;
  onComputed: Signal<number>;
}}

export default NativeModuleRegistry.getEnforcing<Spec>('{module}');
"
    )
}

fn crate_manifest(name: &str, runtime: &Path) -> String {
    let runtime = toml::Value::String(runtime.display().to_string());
    format!(
        "[package]
name = \"{}\"
version = \"0.1.0\"
edition = \"2021\"

[dependencies]
tether-rt = {{ path = {} }}

[workspace]
",
        to_snake_case(name),
        runtime
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_names() {
        assert!(is_valid_name("calculator"));
        assert!(is_valid_name("my-module_2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("2fast"));
        assert!(!is_valid_name("a b"));
    }

    #[test]
    fn test_init_creates_a_generated_project() {
        let dir = tempfile::tempdir().unwrap();
        handle_init(Some(dir.path().to_path_buf()), "calculator", None).unwrap();

        assert!(dir.path().join("tether.toml").is_file());
        assert!(dir.path().join("src/NativeCalculator.ts").is_file());
        let manifest = fs::read_to_string(dir.path().join("crates/lib/Cargo.toml")).unwrap();
        assert!(manifest.contains("name = \"calculator\""));
        let runtime = bundled_runtime();
        assert!(runtime.join("Cargo.toml").is_file());
        let dependency = format!("tether-rt = {{ path = {} }}", toml::Value::String(runtime.display().to_string()));
        assert!(manifest.contains(&dependency), "{manifest}");
        assert!(!manifest.contains("tether-rt = \""));

        let config = TetherConfig::load(dir.path()).unwrap();
        assert_eq!(config.codegen.runtime, Some(runtime));
        assert!(dir.path().join("crates/lib/src/calculator_impl.rs").is_file());
        assert!(dir.path().join(".tether/fingerprint.toml").is_file());

        let err = handle_init(Some(dir.path().to_path_buf()), "calculator", None).unwrap_err();
        assert!(matches!(err, CliError::ProjectExists(_)));
    }

    #[test]
    fn test_init_pins_the_given_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = tempfile::tempdir().unwrap();
        fs::write(runtime.path().join("Cargo.toml"), "[package]\nname = \"tether-rt\"\n").unwrap();
        handle_init(Some(dir.path().to_path_buf()), "calc", Some(runtime.path().to_path_buf())).unwrap();

        let manifest: toml::Value =
            toml::from_str(&fs::read_to_string(dir.path().join("crates/lib/Cargo.toml")).unwrap()).unwrap();
        assert_eq!(manifest["package"]["name"].as_str(), Some("calc"));
        assert_eq!(
            manifest["dependencies"]["tether-rt"]["path"].as_str(),
            Some(runtime.path().display().to_string().as_str())
        );
    }
}
