//! Builds an implementation crate from emitter output and runs its tests
//! against the workspace's `tether-rt`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tether_driver::Compiler;

const SCHEMA: &str = r#"import type { NativeModule, Signal } from 'tether-modules';
import { NativeModuleRegistry } from 'tether-modules';

export enum Unit { Celsius = 'c', Kelvin = 'k' }

export interface Reading {
  value: number;
  unit: Unit;
  note: string | null;
}

export interface Spec extends NativeModule {
  record(value: number, unit: Unit): Reading;
  average(): Promise<number>;
  fail(): Promise<void>;
  onReading: Signal<Reading>;
  onReset: Signal;
}

export default NativeModuleRegistry.getEnforcing<Spec>('Thermometer');
"#;

const IMPLEMENTATION: &str = r#"use crate::generated::*;

pub struct Thermometer {
    ctx: tether_rt::Context,
    readings: Vec<f64>,
}

impl ThermometerSpec for Thermometer {
    fn new(ctx: tether_rt::Context) -> Self {
        Thermometer { ctx, readings: Vec::new() }
    }

    fn context(&self) -> &tether_rt::Context {
        &self.ctx
    }

    fn record(&mut self, value: f64, unit: Unit) -> Reading {
        self.readings.push(value);
        let reading = Reading { value, unit, note: tether_rt::Nullable::none() };
        self.emit(ThermometerSignal::OnReading(reading.clone()));
        reading
    }

    fn average(&mut self) -> tether_rt::Promise<f64> {
        if self.readings.is_empty() {
            return tether_rt::promise::reject("no readings");
        }
        tether_rt::promise::resolve(self.readings.iter().sum::<f64>() / self.readings.len() as f64)
    }

    fn fail(&mut self) -> tether_rt::Promise<()> {
        tether_rt::throw!("sensor offline")
    }
}
"#;

const HOST_TEST: &str = r#"use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use tether_rt::{Bridge, HostValue, Listener, ModuleHandle, Settlement};

fn settle(bridge: &Bridge, handle: &ModuleHandle, method: &str) -> Settlement {
    let (tx, rx) = mpsc::channel();
    handle
        .call_async(method, vec![], move |settlement| {
            let _ = tx.send(settlement);
        })
        .unwrap();
    let event_loop = bridge.event_loop().unwrap();
    for _ in 0..400 {
        event_loop.turn(Duration::from_millis(10));
        if let Ok(settlement) = rx.try_recv() {
            return settlement;
        }
    }
    panic!("`{method}` never settled");
}

#[test]
fn generated_module_runs_on_the_bridge() {
    let bridge = Bridge::builder().workers(1).build();
    thermometer::register(&bridge);
    let handle = bridge.get_enforcing("Thermometer").unwrap();

    let readings = Arc::new(Mutex::new(Vec::new()));
    let seen = readings.clone();
    let _disposer = handle
        .subscribe("onReading", Listener::value(move |v| seen.lock().unwrap().push(v.clone())))
        .unwrap();

    assert_eq!(settle(&bridge, &handle, "average"), Settlement::Rejected("no readings".to_string()));

    let reading = handle.call("record", vec![HostValue::from(21.5), HostValue::from("c")]).unwrap();
    assert_eq!(reading.get("value").and_then(HostValue::as_f64), Some(21.5));
    assert_eq!(reading.get("unit").and_then(HostValue::as_str), Some("c"));
    assert_eq!(reading.get("note"), Some(&HostValue::Null));
    assert!(handle.call("record", vec![HostValue::from(1.0), HostValue::from("f")]).is_err());

    bridge.event_loop().unwrap().run_pending();
    assert_eq!(*readings.lock().unwrap(), vec![reading]);

    assert_eq!(settle(&bridge, &handle, "average"), Settlement::Resolved(HostValue::from(21.5)));
    assert_eq!(settle(&bridge, &handle, "fail"), Settlement::Rejected("sensor offline".to_string()));
}
"#;

fn workspace_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn crate_manifest(runtime: &Path) -> String {
    format!(
        "[package]\nname = \"thermometer\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n\
         [dependencies]\ntether-rt = {{ path = {:?} }}\n\n[workspace]\n",
        runtime.display().to_string()
    )
}

#[test]
fn test_generated_crate_runs_against_the_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("tether.toml"), "[project]\nname = \"thermometer\"\n").unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/NativeThermometer.ts"), SCHEMA).unwrap();
    Compiler::open(root).unwrap().generate().unwrap();

    let workspace = workspace_dir();
    let crate_dir = root.join("crates/lib");
    fs::write(crate_dir.join("Cargo.toml"), crate_manifest(&workspace.join("crates/tether-rt"))).unwrap();
    fs::write(crate_dir.join("src/thermometer_impl.rs"), IMPLEMENTATION).unwrap();
    fs::create_dir_all(crate_dir.join("tests")).unwrap();
    fs::write(crate_dir.join("tests/bridge.rs"), HOST_TEST).unwrap();
    // Resolve the same versions the workspace already built.
    if workspace.join("Cargo.lock").is_file() {
        fs::copy(workspace.join("Cargo.lock"), crate_dir.join("Cargo.lock")).unwrap();
    }

    let cargo = env::var_os("CARGO").unwrap_or_else(|| "cargo".into());
    let output = Command::new(cargo)
        .args(["test", "--offline", "--manifest-path"])
        .arg(crate_dir.join("Cargo.toml"))
        .env("CARGO_TARGET_DIR", workspace.join("target/generated-crate"))
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "generated crate failed\n--- stdout\n{}\n--- stderr\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}
