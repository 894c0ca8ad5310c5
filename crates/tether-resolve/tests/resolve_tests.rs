use tether_resolve::*;
use tether_source::SourceFile;
use tether_syntax::{parse_files, EnumValue};

const HEADER: &str = "import type { NativeModule, Signal } from 'tether-modules';\n\
                      import { NativeModuleRegistry } from 'tether-modules';\n";

fn schema(module: &str, body: &str) -> SourceFile {
    let text = format!(
        "{HEADER}{body}\nexport default NativeModuleRegistry.getEnforcing<Spec>('{module}');\n"
    );
    SourceFile::virtual_file(&format!("src/Native{module}.ts"), text)
}

fn resolve_files(files: &[SourceFile]) -> ResolveResult<ProjectModel> {
    let modules = parse_files(files).expect("schema should parse");
    resolve(&modules)
}

fn errors(files: &[SourceFile]) -> Vec<ResolveError> {
    resolve_files(files).expect_err("schema should not resolve").errors
}

#[test]
fn test_resolve_module() {
    let model = resolve_files(&[schema(
        "FileStore",
        r#"
export interface Entry { path: string; size: number; meta: Meta | null }
export interface Meta { tags: string[]; kind: EntryKind }
export enum EntryKind { RegularFile = 'file', SymLink = 'symlink' }

export interface Spec extends NativeModule {
  readHTTPHeader(url: string, type: EntryKind): string;
  list(dir: string): Promise<Entry[]>;
  remove(path: string): Promise<void>;
  onChanged: Signal<Entry>;
  onProgress: Signal<number[]>;
  onReset: Signal;
}
"#,
    )])
    .unwrap();

    let module = model.module("FileStore").unwrap();
    assert_eq!(module.name.rust, "FileStore");
    assert_eq!(module.snake, "file_store");
    assert_eq!(module.spec_trait(), "FileStoreSpec");
    assert_eq!(module.signal_enum(), "FileStoreSignal");

    let read = &module.methods[0];
    assert_eq!(read.name.source, "readHTTPHeader");
    assert_eq!(read.name.rust, "read_http_header");
    assert_eq!(read.params[1].name.rust, "r#type");
    assert_eq!(read.params[1].ty, CanonicalType::Enum("EntryKind".into()));
    assert!(!read.is_async);

    let list = &module.methods[1];
    assert!(list.is_async);
    assert_eq!(list.returns.rust_type(), "tether_rt::Promise<Vec<Entry>>");
    assert_eq!(module.methods[2].returns.settled(), &CanonicalType::Void);

    // Meta is contained by Entry, so it comes first.
    let records: Vec<_> = module.records.iter().map(|r| r.name.rust.as_str()).collect();
    assert_eq!(records, vec!["Meta", "Entry"]);

    let kind = &module.enums[0];
    assert_eq!(kind.variants[1].name.rust, "SymLink");
    assert_eq!(kind.variants[1].value, EnumValue::Str("symlink".into()));

    let channels: Vec<_> = module.notifications.iter().map(|n| (n.tag.as_str(), n.channel)).collect();
    assert_eq!(
        channels,
        vec![
            ("OnChanged", Channel::Value),
            ("OnProgress", Channel::NumberArray),
            ("OnReset", Channel::Unit)
        ]
    );
}

#[test]
fn test_casings_collide() {
    let errors = errors(&[schema(
        "Users",
        r#"
export interface Spec extends NativeModule {
  getUserName(): string;
  GetUserName(): string;
  get_user_name(): string;
}
"#,
    )]);
    assert_eq!(errors.len(), 2);
    for (error, second) in errors.iter().zip(["GetUserName", "get_user_name"]) {
        match error {
            ResolveError::NameCollision {
                first,
                second: found,
                canonical,
                ..
            } => {
                assert_eq!(first, "getUserName");
                assert_eq!(found, second);
                assert_eq!(canonical, "get_user_name");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}

#[test]
fn test_notification_collides_with_method() {
    let errors = errors(&[schema(
        "Clock",
        r#"
export interface Spec extends NativeModule {
  onTick(): void;
  on_tick: Signal;
}
"#,
    )]);
    assert!(matches!(&errors[..], [ResolveError::NameCollision { scope, .. }] if scope == "module `Clock`"));
}

#[test]
fn test_record_cycle() {
    let errors = errors(&[schema(
        "Tree",
        r#"
export interface Node { label: string; parent: Parent | null }
export interface Parent { children: Node[] }
export interface Spec extends NativeModule { root(): Node; }
"#,
    )]);
    assert_eq!(
        errors,
        vec![ResolveError::RecordCycle {
            cycle: vec!["Node".into(), "Parent".into(), "Node".into()],
            location: errors[0].location().clone(),
        }]
    );
    assert_eq!(errors[0].location().line, 4);
}

#[test]
fn test_reserved_names() {
    let errors = errors(&[schema(
        "Timer",
        r#"
export interface Context { id: number }
export interface TimerSpec { id: number }
export interface Spec extends NativeModule {
  emit(value: number): void;
  start(ctx: Context, spec: TimerSpec): void;
}
"#,
    )]);
    let names: Vec<_> = errors
        .iter()
        .map(|e| match e {
            ResolveError::ReservedName { name, .. } => name.as_str(),
            other => panic!("unexpected error {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["Context", "TimerSpec", "emit"]);
}

#[test]
fn test_identical_types_are_shared() {
    let point = "export interface Point { x: number; y: number }\n";
    let model = resolve_files(&[
        schema("Canvas", &format!("{point}export interface Spec extends NativeModule {{ draw(p: Point): void; }}")),
        schema("Cursor", &format!("{point}export interface Spec extends NativeModule {{ at(): Point; }}")),
    ])
    .unwrap();
    assert_eq!(model.modules.len(), 2);
    assert_eq!(model.records.len(), 1);
}

#[test]
fn test_different_types_conflict() {
    let errors = errors(&[
        schema(
            "Canvas",
            "export interface Point { x: number; y: number }\n\
             export interface Spec extends NativeModule { draw(p: Point): void; }",
        ),
        schema(
            "Map",
            "export interface Point { lat: number; lng: number }\n\
             export interface Spec extends NativeModule { center(): Point; }",
        ),
    ]);
    assert!(matches!(
        &errors[..],
        [ResolveError::TypeConflict { name, module, other, .. }]
            if name == "Point" && module == "Map" && other == "Canvas"
    ));
}

#[test]
fn test_duplicate_module_across_files() {
    let body = "export interface Spec extends NativeModule { ping(): void; }";
    let first = schema("Pinger", body);
    let second = SourceFile::virtual_file("src/nested/NativePinger.ts", first.contents());
    let errors = errors(&[first, second]);
    match &errors[..] {
        [ResolveError::DuplicateModule { name, previous, location }] => {
            assert_eq!(name, "Pinger");
            assert_eq!(previous.file, "src/NativePinger.ts");
            assert_eq!(location.file, "src/nested/NativePinger.ts");
        }
        other => panic!("unexpected errors {other:?}"),
    }
}

#[test]
fn test_serialized_model_has_no_locations() {
    let model = resolve_files(&[schema(
        "Echo",
        "export interface Spec extends NativeModule { echo(text: string | null): string | null; }",
    )])
    .unwrap();
    let json = serde_json::to_value(&model.modules[0]).unwrap();
    assert!(!json.to_string().contains("location"));
    assert_eq!(
        json["methods"][0]["returns"],
        serde_json::json!({ "kind": "nullable", "of": { "kind": "string" } })
    );
}

#[test]
fn test_errors_follow_source_order() {
    let errors = errors(&[schema(
        "Clock",
        r#"
export interface Spec extends NativeModule {
  onTick: Signal;
  on_tick: Signal;
  getName(): string;
  get_name(): string;
}
"#,
    )]);
    let found: Vec<_> = errors
        .iter()
        .map(|e| match e {
            ResolveError::NameCollision { second, location, .. } => (second.as_str(), location.line),
            other => panic!("unexpected error {other:?}"),
        })
        .collect();
    assert_eq!(found, vec![("on_tick", 6), ("get_name", 8)]);
}
