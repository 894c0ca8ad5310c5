use std::path::Path;

use expect_test::expect;
use tether_codegen::{emit, write_artifacts, Artifact, WriteOutcome, WritePolicy};
use tether_resolve::{resolve, ProjectModel};
use tether_source::SourceFile;
use tether_syntax::parse_files;

const HEADER: &str = "import type { NativeModule, Signal } from 'tether-modules';\n\
                      import { NativeModuleRegistry } from 'tether-modules';\n";

fn model(module: &str, body: &str) -> ProjectModel {
    let text = format!("{HEADER}{body}\nexport default NativeModuleRegistry.getEnforcing<Spec>('{module}');\n");
    let file = SourceFile::virtual_file(&format!("src/Native{module}.ts"), text);
    let modules = parse_files(&[file]).expect("schema should parse");
    resolve(&modules).expect("schema should resolve")
}

fn artifacts(model: &ProjectModel) -> Vec<Artifact> {
    emit(model, Path::new("native"), Path::new(".tether")).unwrap()
}

fn file<'a>(artifacts: &'a [Artifact], name: &str) -> &'a str {
    let path = Path::new("native/src").join(name);
    &artifacts.iter().find(|a| a.path == path).unwrap_or_else(|| panic!("no artifact {name}")).content
}

/// Generated content after the two header lines.
fn body(content: &str) -> &str {
    let rest = content
        .strip_prefix("// @generated by tether. Do not edit; run `tether codegen` instead.\n")
        .expect("generated header");
    let (fingerprint, rest) = rest.split_once('\n').expect("fingerprint line");
    assert!(fingerprint.starts_with("// fingerprint: "));
    rest.trim_start_matches('\n')
}

const CALCULATOR: &str = r#"
export interface Spec extends NativeModule {
  add(a: number, b: number): number;
  reset(): void;
  total(): Promise<number>;
  onChange: Signal<number[]>;
}
"#;

const PLOTTER: &str = r#"
export interface Point { x: number; y: number }
export interface Label { type: string; at: Point | null }
export enum Mode { Fast = 'fast', Slow = 'slow' }
export enum Level { Low = 1, High = 2 }

export interface Spec extends NativeModule {
  moveTo(to: Point, mode: Mode): Point | null;
  trace(points: Point[]): Promise<number>;
  annotate(label: Label, level: Level): void;
  onMoved: Signal<Point>;
  onCleared: Signal;
}
"#;

#[test]
fn test_artifact_layout() {
    let model = model("Calculator", CALCULATOR);
    let artifacts = artifacts(&model);
    let layout: Vec<(String, WritePolicy)> =
        artifacts.iter().map(|a| (a.path.display().to_string(), a.policy)).collect();
    assert_eq!(
        layout,
        vec![
            ("native/src/generated.rs".to_string(), WritePolicy::Overwrite),
            ("native/src/bridging.rs".to_string(), WritePolicy::Overwrite),
            ("native/src/host.rs".to_string(), WritePolicy::Overwrite),
            ("native/src/calculator_impl.rs".to_string(), WritePolicy::CreateOnly),
            ("native/src/lib.rs".to_string(), WritePolicy::CreateOnly),
            (".tether/fingerprint.toml".to_string(), WritePolicy::Overwrite),
        ]
    );
}

#[test]
fn test_interface_snapshot() {
    let model = model("Calculator", CALCULATOR);
    let artifacts = artifacts(&model);
    expect![[r#"
        /// Notifications `Calculator` can emit.
        #[derive(Debug, Clone, PartialEq)]
        pub enum CalculatorSignal {
            OnChange(Vec<f64>),
        }

        impl CalculatorSignal {
            /// Name the host subscribes with.
            pub fn name(&self) -> &'static str {
                match self {
                    CalculatorSignal::OnChange(_) => "onChange",
                }
            }

            pub fn into_payload(self) -> tether_rt::Payload {
                match self {
                    CalculatorSignal::OnChange(value) => tether_rt::Payload::NumberArray(value),
                }
            }
        }

        /// Implemented by the `Calculator` module.
        pub trait CalculatorSpec: Sized + Send + 'static {
            fn new(ctx: tether_rt::Context) -> Self;

            fn context(&self) -> &tether_rt::Context;

            fn emit(&self, signal: CalculatorSignal) {
                let name = signal.name();
                self.context().emit(name, signal.into_payload());
            }

            fn add(&mut self, a: f64, b: f64) -> f64;

            fn reset(&mut self);

            fn total(&mut self) -> tether_rt::Promise<f64>;
        }
    "#]]
    .assert_eq(body(file(&artifacts, "generated.rs")));
}

#[test]
fn test_host_snapshot() {
    let model = model("Calculator", CALCULATOR);
    let artifacts = artifacts(&model);
    expect![[r#"
        mod calculator_glue {
            #[allow(unused_imports)]
            use crate::generated::*;
            use crate::calculator_impl::Calculator;

            pub(super) fn add(it_: &mut Calculator, args_: Vec<tether_rt::HostValue>) -> Result<tether_rt::HostValue, tether_rt::MarshalError> {
                let mut args_ = tether_rt::Args::new(args_, 2)?;
                let a: f64 = args_.next("a")?;
                let b: f64 = args_.next("b")?;
                Ok(tether_rt::IntoHost::into_host(<Calculator as CalculatorSpec>::add(it_, a, b)))
            }

            pub(super) fn reset(it_: &mut Calculator, args_: Vec<tether_rt::HostValue>) -> Result<tether_rt::HostValue, tether_rt::MarshalError> {
                tether_rt::Args::new(args_, 0)?;
                <Calculator as CalculatorSpec>::reset(it_);
                Ok(tether_rt::HostValue::Undefined)
            }

            pub(super) fn total(args_: Vec<tether_rt::HostValue>) -> Result<tether_rt::DeferredCall<Calculator>, tether_rt::MarshalError> {
                tether_rt::Args::new(args_, 0)?;
                Ok(Box::new(move |it_: &mut Calculator| tether_rt::promise::settle(<Calculator as CalculatorSpec>::total(it_))))
            }
        }

        static CALCULATOR_METHODS: &[tether_rt::MethodEntry<crate::calculator_impl::Calculator>] = &[
            tether_rt::MethodEntry { name: "add", convention: tether_rt::Convention::Sync(calculator_glue::add) },
            tether_rt::MethodEntry { name: "reset", convention: tether_rt::Convention::Sync(calculator_glue::reset) },
            tether_rt::MethodEntry { name: "total", convention: tether_rt::Convention::Async(calculator_glue::total) },
        ];

        static CALCULATOR_NOTIFICATIONS: &[tether_rt::NotificationEntry] = &[
            tether_rt::NotificationEntry { name: "onChange", kind: tether_rt::PayloadKind::NumberArray },
        ];

        impl tether_rt::BridgedModule for crate::calculator_impl::Calculator {
            const NAME: &'static str = "Calculator";

            fn create(ctx: tether_rt::Context) -> Self {
                <Self as crate::generated::CalculatorSpec>::new(ctx)
            }

            fn methods() -> &'static [tether_rt::MethodEntry<Self>] {
                CALCULATOR_METHODS
            }

            fn notifications() -> &'static [tether_rt::NotificationEntry] {
                CALCULATOR_NOTIFICATIONS
            }

            fn declaration() -> &'static tether_rt::ModuleDecl {
                &crate::bridging::CALCULATOR_MODULE
            }
        }

        /// Register every module in this crate with `bridge`.
        pub fn register(bridge: &tether_rt::Bridge) {
            bridge.register::<crate::calculator_impl::Calculator>();
        }
    "#]]
    .assert_eq(body(file(&artifacts, "host.rs")));
}

#[test]
fn test_skeletons() {
    let model = model("Calculator", CALCULATOR);
    let artifacts = artifacts(&model);
    expect![[r#"
        use crate::generated::*;

        pub struct Calculator {
            ctx: tether_rt::Context,
        }

        impl CalculatorSpec for Calculator {
            fn new(ctx: tether_rt::Context) -> Self {
                Calculator { ctx }
            }

            fn context(&self) -> &tether_rt::Context {
                &self.ctx
            }

            fn add(&mut self, a: f64, b: f64) -> f64 {
                unimplemented!()
            }

            fn reset(&mut self) {
                unimplemented!()
            }

            fn total(&mut self) -> tether_rt::Promise<f64> {
                unimplemented!()
            }
        }
    "#]]
    .assert_eq(file(&artifacts, "calculator_impl.rs"));
    expect![[r#"
        pub mod bridging;
        pub mod generated;
        pub mod host;
        pub mod calculator_impl;

        pub use host::register;
    "#]]
    .assert_eq(file(&artifacts, "lib.rs"));
}

#[test]
fn test_records_and_enums() {
    let model = model("Plotter", PLOTTER);
    let artifacts = artifacts(&model);
    let generated = file(&artifacts, "generated.rs");
    for expected in [
        "#[derive(Debug, Clone, PartialEq)]\npub struct Point {\n    pub x: f64,\n    pub y: f64,\n}\n",
        "pub struct Label {\n    pub r#type: String,\n    pub at: tether_rt::Nullable<Point>,\n}\n",
        "pub enum Mode {\n    Fast,\n    Slow,\n}\n",
        "    pub fn value(&self) -> &'static str {\n        match self {\n            Mode::Fast => \"fast\",\n",
        "    pub fn value(&self) -> i64 {\n        match self {\n            Level::Low => 1,\n",
        "    pub const ALL: &'static [Mode] = &[\n        Mode::Fast,\n        Mode::Slow,\n    ];\n",
        "    OnMoved(Point),\n    OnCleared,\n",
        "PlotterSignal::OnMoved(value) => tether_rt::Payload::Value(tether_rt::IntoHost::into_host(value)),",
        "PlotterSignal::OnCleared => tether_rt::Payload::Unit,",
        "PlotterSignal::OnCleared => \"onCleared\",",
        "fn move_to(&mut self, to: Point, mode: Mode) -> tether_rt::Nullable<Point>;",
        "fn trace(&mut self, points: Vec<Point>) -> tether_rt::Promise<f64>;",
        "fn annotate(&mut self, label: Label, level: Level);",
    ] {
        assert!(generated.contains(expected), "generated.rs lacks:\n{expected}\n---\n{generated}");
    }

    let bridging = file(&artifacts, "bridging.rs");
    for expected in [
        "use crate::generated::*;\n\nstatic TY_POINT: tether_rt::TypeDecl = tether_rt::TypeDecl::Record(&POINT_RECORD);\n",
        "pub static POINT_RECORD: tether_rt::RecordDecl = tether_rt::RecordDecl {\n    name: \"Point\",\n",
        "tether_rt::FieldDecl { name: \"type\", ty: tether_rt::TypeDecl::String },",
        "tether_rt::FieldDecl { name: \"at\", ty: tether_rt::TypeDecl::Nullable(&TY_POINT) },",
        "values: tether_rt::EnumValues::Str(&[\"fast\", \"slow\"]),",
        "values: tether_rt::EnumValues::Int(&[1, 2]),",
        "tether_rt::ParamDecl { name: \"to\", ty: tether_rt::TypeDecl::Record(&POINT_RECORD) },",
        "tether_rt::ParamDecl { name: \"mode\", ty: tether_rt::TypeDecl::Enum(&MODE_ENUM) },",
        "returns: tether_rt::TypeDecl::Nullable(&TY_POINT),",
        "tether_rt::ParamDecl { name: \"points\", ty: tether_rt::TypeDecl::Array(&TY_POINT) },",
        "returns: tether_rt::TypeDecl::Promise(&tether_rt::TypeDecl::Number),",
        "returns: tether_rt::TypeDecl::Void,",
        "tether_rt::NotificationDecl { name: \"onMoved\", payload: Some(tether_rt::TypeDecl::Record(&POINT_RECORD)), kind: tether_rt::PayloadKind::Value },",
        "tether_rt::NotificationDecl { name: \"onCleared\", payload: None, kind: tether_rt::PayloadKind::Unit },",
        "r#type: fields.take(\"type\")?,",
        "(\"type\", tether_rt::IntoHost::into_host(self.r#type)),",
        "\"fast\" => Ok(Mode::Fast),",
        "_ => Err(tether_rt::MarshalError::invalid_enum(\"Mode\", &tag)),",
        "match tether_rt::integral(value)? {\n",
        "2 => Ok(Level::High),",
        "other => Err(tether_rt::MarshalError::invalid_enum(\"Level\", other)),",
        "tether_rt::HostValue::Number(self.value() as f64)",
    ] {
        assert!(bridging.contains(expected), "bridging.rs lacks:\n{expected}\n---\n{bridging}");
    }
    // Hoisted once, however many times it is referenced.
    assert_eq!(bridging.matches("static TY_POINT:").count(), 1);

    let host = file(&artifacts, "host.rs");
    assert!(host.contains("let to: Point = args_.next(\"to\")?;"));
    assert!(host.contains("let points: Vec<Point> = args_.next(\"points\")?;"));
    assert!(host.contains("tether_rt::MethodEntry { name: \"moveTo\", convention: tether_rt::Convention::Sync(plotter_glue::move_to) },"));
}

#[test]
fn test_output_is_deterministic() {
    let first = artifacts(&model("Plotter", PLOTTER));
    let second = artifacts(&model("Plotter", PLOTTER));
    assert_eq!(first, second);
}

#[test]
fn test_header_carries_fingerprint() {
    let model = model("Calculator", CALCULATOR);
    let artifacts = artifacts(&model);
    let fingerprint = tether_codegen::Fingerprint::of(&model).unwrap();
    let generated = file(&artifacts, "generated.rs");
    assert!(generated.contains(&format!("// fingerprint: {}\n", fingerprint.project)));

    let stored = artifacts.iter().find(|a| a.path.ends_with("fingerprint.toml")).unwrap();
    assert!(stored.content.contains(&fingerprint.project));
}

#[test]
fn test_schema_change_changes_fingerprint() {
    let before = tether_codegen::Fingerprint::of(&model("Calculator", CALCULATOR)).unwrap();
    let after = tether_codegen::Fingerprint::of(&model(
        "Calculator",
        &CALCULATOR.replace("reset(): void;", "reset(to: number): void;"),
    ))
    .unwrap();
    assert_ne!(before.project, after.project);
    assert_eq!(before.drift(&after), vec![tether_codegen::Drift::Changed("Calculator".into())]);
}

#[test]
fn test_write_preserves_user_files() {
    let dir = tempfile::tempdir().unwrap();
    let model = model("Calculator", CALCULATOR);
    let artifacts = artifacts(&model);

    let reports = write_artifacts(dir.path(), &artifacts).unwrap();
    assert!(reports.iter().all(|r| r.outcome == WriteOutcome::Written));

    let impl_path = dir.path().join("native/src/calculator_impl.rs");
    std::fs::write(&impl_path, "// mine\n").unwrap();

    let reports = write_artifacts(dir.path(), &artifacts).unwrap();
    let outcomes: Vec<WriteOutcome> = reports.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            WriteOutcome::Unchanged,
            WriteOutcome::Unchanged,
            WriteOutcome::Unchanged,
            WriteOutcome::Preserved,
            WriteOutcome::Preserved,
            WriteOutcome::Unchanged,
        ]
    );
    assert_eq!(std::fs::read_to_string(impl_path).unwrap(), "// mine\n");
}
