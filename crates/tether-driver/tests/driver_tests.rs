use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tether_codegen::{Drift, WriteOutcome};
use tether_driver::{Compiler, DriverError, Freshness};

const SCHEMA: &str = r#"import type { NativeModule, Signal } from 'tether-modules';
import { NativeModuleRegistry } from 'tether-modules';

export interface Spec extends NativeModule {
  add(a: number, b: number): number;
  total(): Promise<number>;
  onChange: Signal<number[]>;
}

export default NativeModuleRegistry.getEnforcing<Spec>('Calculator');
"#;

fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tether.toml"), "[project]\nname = \"calculator\"\n").unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/NativeCalculator.ts"), SCHEMA).unwrap();
    dir
}

fn compiler(dir: &Path) -> Compiler {
    Compiler::open(dir).unwrap()
}

fn read(dir: &Path, rel: &str) -> String {
    fs::read_to_string(dir.join(rel)).unwrap()
}

#[test]
fn test_generate_writes_layout() {
    let dir = project();
    let report = compiler(dir.path()).generate().unwrap();

    let paths: Vec<String> = report.files.iter().map(|f| f.path.display().to_string()).collect();
    assert_eq!(
        paths,
        vec![
            "crates/lib/src/generated.rs",
            "crates/lib/src/bridging.rs",
            "crates/lib/src/host.rs",
            "crates/lib/src/calculator_impl.rs",
            "crates/lib/src/lib.rs",
            ".tether/fingerprint.toml",
        ]
    );
    assert_eq!(report.written(), 6);
    assert!(report.missing_mods.is_empty());
    assert!(read(dir.path(), "crates/lib/src/generated.rs").contains("pub trait CalculatorSpec"));
}

#[test]
fn test_generation_is_idempotent() {
    let dir = project();
    compiler(dir.path()).generate().unwrap();
    let before = read(dir.path(), "crates/lib/src/host.rs");

    let report = compiler(dir.path()).generate().unwrap();
    assert_eq!(report.written(), 0);
    assert_eq!(read(dir.path(), "crates/lib/src/host.rs"), before);
}

#[test]
fn test_skeleton_is_preserved() {
    let dir = project();
    compiler(dir.path()).generate().unwrap();
    let skeleton = dir.path().join("crates/lib/src/calculator_impl.rs");
    fs::write(&skeleton, "// edited by hand\n").unwrap();

    let report = compiler(dir.path()).generate().unwrap();
    let outcome = report.files.iter().find(|f| f.path.ends_with("calculator_impl.rs")).unwrap().outcome;
    assert_eq!(outcome, WriteOutcome::Preserved);
    assert_eq!(fs::read_to_string(&skeleton).unwrap(), "// edited by hand\n");
}

#[test]
fn test_drift_detected_and_cleared() {
    let dir = project();
    let compiler = compiler(dir.path());
    assert!(matches!(compiler.check_drift(), Err(DriverError::NeverGenerated)));

    compiler.generate().unwrap();
    assert_eq!(compiler.freshness().unwrap(), Freshness::Fresh);
    compiler.check_drift().unwrap();

    fs::write(
        dir.path().join("src/NativeCalculator.ts"),
        SCHEMA.replace("total(): Promise<number>;", "total(round: boolean): Promise<number>;"),
    )
    .unwrap();
    let err = compiler.check_drift().unwrap_err();
    assert_eq!(err.drifted_modules(), vec!["Calculator"]);
    assert!(err.to_string().contains("module `Calculator` changed"), "{err}");

    compiler.generate().unwrap();
    compiler.check_drift().unwrap();
}

#[test]
fn test_new_module_is_drift() {
    let dir = project();
    let compiler = compiler(dir.path());
    compiler.generate().unwrap();

    fs::write(
        dir.path().join("src/NativeClock.ts"),
        SCHEMA.replace("'Calculator'", "'Clock'"),
    )
    .unwrap();
    assert_eq!(compiler.freshness().unwrap(), Freshness::Stale(vec![Drift::Added("Clock".into())]));
}

#[test]
fn test_missing_mod_reported() {
    let dir = project();
    compiler(dir.path()).generate().unwrap();
    fs::write(dir.path().join("crates/lib/src/lib.rs"), "pub mod generated;\npub mod bridging;\npub mod host;\n").unwrap();

    let report = compiler(dir.path()).generate().unwrap();
    assert_eq!(report.missing_mods, vec!["calculator_impl".to_string()]);
}

#[test]
fn test_schema_errors_block_generation() {
    let dir = project();
    fs::write(
        dir.path().join("src/NativeCalculator.ts"),
        SCHEMA.replace("add(a: number, b: number): number;", "add(a: number | string): number;"),
    )
    .unwrap();
    let err = compiler(dir.path()).generate().unwrap_err();
    assert!(matches!(err, DriverError::Schema(_)), "{err:?}");
    assert!(!dir.path().join("crates/lib/src/generated.rs").exists());
}

#[test]
fn test_clean_keeps_user_files() {
    let dir = project();
    let compiler = compiler(dir.path());
    compiler.generate().unwrap();
    fs::create_dir_all(dir.path().join("crates/lib/target/debug")).unwrap();

    let removed = compiler.clean().unwrap();
    assert_eq!(removed.len(), 5);
    assert!(!dir.path().join("crates/lib/src/generated.rs").exists());
    assert!(!dir.path().join(".tether").exists());
    assert!(!dir.path().join("crates/lib/target").exists());
    assert!(dir.path().join("crates/lib/src/calculator_impl.rs").exists());
    assert!(dir.path().join("crates/lib/src/lib.rs").exists());

    assert!(compiler.clean().unwrap().is_empty());
}

#[test]
fn test_open_searches_upwards() {
    let dir = project();
    let nested = dir.path().join("src/deep");
    fs::create_dir_all(&nested).unwrap();
    let compiler = compiler(&nested);
    assert_eq!(compiler.project().name(), "calculator");
}
