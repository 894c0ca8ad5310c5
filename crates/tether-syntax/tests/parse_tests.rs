use tether_source::SourceFile;
use tether_syntax::*;

const CALCULATOR: &str = r#"
import type { NativeModule, Signal } from 'tether-modules';
import { NativeModuleRegistry } from 'tether-modules';

export interface ProgressEvent {
  done: number;
  total: number;
  label: string | null;
}

export enum Mode {
  Fast = 'fast',
  Precise = 'precise',
}

export enum Priority {
  Low,
  Normal = 5,
  High,
}

export type Samples = number[];

interface Unused {
  value: boolean;
}

export interface Spec extends NativeModule {
  add(a: number, b: number): number;
  setMode(mode: Mode): void;
  average(values: Samples): number | null;
  compute(input: Array<number>, priority: Priority): Promise<ProgressEvent>;
  reset(): Promise<void>;
  onDone: Signal;
  onProgress: Signal<ProgressEvent>;
}

export default NativeModuleRegistry.getEnforcing<Spec>('Calculator');
"#;

fn file(text: &str) -> SourceFile {
    SourceFile::virtual_file("src/NativeCalculator.ts", text)
}

fn error_kinds(text: &str) -> Vec<SyntaxErrorKind> {
    let err = parse_file(&file(text)).expect_err("schema should be rejected");
    err.errors.into_iter().map(|e| e.kind).collect()
}

#[test]
fn test_parse_calculator_module() {
    let modules = parse_file(&file(CALCULATOR)).unwrap();
    assert_eq!(modules.len(), 1);
    let module = &modules[0];
    assert_eq!(module.name, "Calculator");
    assert_eq!(module.spec_name, "Spec");

    let methods: Vec<_> = module.methods.iter().map(|m| (m.name.as_str(), m.is_async())).collect();
    assert_eq!(
        methods,
        vec![
            ("add", false),
            ("setMode", false),
            ("average", false),
            ("compute", true),
            ("reset", true)
        ]
    );

    assert_eq!(
        module.methods[2].params[0].ty,
        TypeRef::array(TypeRef::Primitive(Primitive::Number)),
        "aliases are expanded"
    );
    assert_eq!(
        module.methods[2].return_type,
        TypeRef::nullable(TypeRef::Primitive(Primitive::Number))
    );
    assert_eq!(
        module.methods[3].return_type,
        TypeRef::deferred(TypeRef::Record("ProgressEvent".into()))
    );
    assert_eq!(module.methods[4].return_type, TypeRef::deferred(TypeRef::Void));

    let notifications: Vec<_> = module
        .notifications
        .iter()
        .map(|n| (n.name.as_str(), n.payload.clone()))
        .collect();
    assert_eq!(
        notifications,
        vec![
            ("onDone", None),
            ("onProgress", Some(TypeRef::Record("ProgressEvent".into())))
        ]
    );

    // `Unused` is declared but not reachable from the module.
    let records: Vec<_> = module.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(records, vec!["ProgressEvent"]);
    let enums: Vec<_> = module.enums.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(enums, vec!["Mode", "Priority"]);
}

#[test]
fn test_enum_values() {
    let modules = parse_file(&file(CALCULATOR)).unwrap();
    let enums = &modules[0].enums;

    assert_eq!(enums[0].kind, EnumKind::StringBacked);
    assert_eq!(enums[0].variants[1].value, EnumValue::Str("precise".into()));

    assert_eq!(enums[1].kind, EnumKind::NumericBacked);
    let values: Vec<_> = enums[1].variants.iter().map(|v| v.value.clone()).collect();
    assert_eq!(values, vec![EnumValue::Int(0), EnumValue::Int(5), EnumValue::Int(6)]);
}

#[test]
fn test_locations_are_one_based() {
    let modules = parse_file(&file(CALCULATOR)).unwrap();
    let add = &modules[0].methods[0];
    assert_eq!(add.location.file, "src/NativeCalculator.ts");
    assert_eq!((add.location.line, add.location.column), (29, 3));
}

#[test]
fn test_unsupported_constructs_are_batched() {
    let kinds = error_kinds(
        r#"
import type { NativeModule } from 'tether-modules';
import { NativeModuleRegistry } from 'tether-modules';

export class Widget { size = 1; }

export interface Shape {
  kind: 'circle' | 'square';
  origin: [number, number];
  onClick: (x: number) => void;
  meta: any;
  extra?: string;
}

export interface Box<T> { value: T }

export interface Spec extends NativeModule {
  pick(a: number | string): void;
  wrap(value: unknown): never;
  draw(shape: Shape): void;
}

export default NativeModuleRegistry.get<Spec>('Shapes');
"#,
    );

    assert_eq!(
        kinds,
        vec![
            SyntaxErrorKind::ClassDeclaration,
            SyntaxErrorKind::UnsupportedUnion,
            SyntaxErrorKind::TupleType,
            SyntaxErrorKind::FunctionType,
            SyntaxErrorKind::PlaceholderType("any".into()),
            SyntaxErrorKind::OptionalProperty("extra".into()),
            SyntaxErrorKind::GenericType("Box".into()),
            SyntaxErrorKind::UnsupportedUnion,
            SyntaxErrorKind::PlaceholderType("unknown".into()),
            SyntaxErrorKind::PlaceholderType("never".into()),
        ]
    );
}

#[test]
fn test_errors_carry_file_line_and_column() {
    let err = parse_file(&file("import { NativeModule } from 'tether-modules';\ninterface A {\n  x: any;\n}\n"))
        .unwrap_err();
    let first = &err.errors[0];
    assert_eq!(first.location.to_string(), "src/NativeCalculator.ts:3:6");
    assert_eq!(first.to_string(), "src/NativeCalculator.ts:3:6: `any` is not supported as a schema type");
}

#[test]
fn test_misplaced_wrappers() {
    let kinds = error_kinds(
        r#"
import type { NativeModule, Signal } from 'tether-modules';
import { NativeModuleRegistry } from 'tether-modules';

type Maybe = number | null;

export interface Holder {
  pending: Promise<number>;
  listener: Signal;
  nothing: void;
}

export interface Spec extends NativeModule {
  a(h: Holder): Promise<number> | null;
  b(): Maybe | null;
  c(): Promise<Promise<number>>;
  d(values: Promise<number>[]): void;
  count: number;
}

export default NativeModuleRegistry.getEnforcing<Spec>('Wrappers');
"#,
    );
    assert_eq!(
        kinds,
        vec![
            // reported where the alias declares its nullable type
            SyntaxErrorKind::NestedNullable,
            SyntaxErrorKind::PromiseNotAllowed,
            SyntaxErrorKind::SignalNotAllowed,
            SyntaxErrorKind::VoidNotAllowed,
            SyntaxErrorKind::NullablePromise,
            SyntaxErrorKind::PromiseNotAllowed,
            SyntaxErrorKind::PromiseNotAllowed,
            SyntaxErrorKind::NotificationProperty("count".into()),
        ]
    );
}

#[test]
fn test_enum_problems() {
    let kinds = error_kinds(
        r#"
export enum Mixed { A = 'a', B = 1 }
export enum Fractional { Half = 0.5 }
export enum Repeated { One = 1, Uno = 1 }
export enum Empty {}
export enum Incomplete { A = 'a', B }
"#,
    );
    assert_eq!(
        kinds,
        vec![
            SyntaxErrorKind::MixedEnum("Mixed".into()),
            SyntaxErrorKind::FloatEnumValue("Half".into()),
            SyntaxErrorKind::DuplicateEnumValue {
                name: "Repeated".into(),
                value: "1".into()
            },
            SyntaxErrorKind::EmptyEnum("Empty".into()),
            SyntaxErrorKind::EnumMemberValue("B".into()),
        ]
    );
}

#[test]
fn test_registration_problems() {
    let kinds = error_kinds(
        r#"
import type { NativeModule } from 'tether-modules';
import { NativeModuleRegistry } from 'tether-modules';

export interface Spec extends NativeModule { ping(): void; }
export interface Other extends NativeModule { pong(): void; }
export interface Plain { x: number }

export const a = NativeModuleRegistry.getEnforcing<Spec>('Ping');
export const b = NativeModuleRegistry.getEnforcing<Spec>('Ping');
export const c = NativeModuleRegistry.getEnforcing<Plain>('Plain');
export const d = Registry.lookup<Spec>('Nope');
"#,
    );
    assert_eq!(kinds.len(), 4, "{kinds:?}");
    assert_eq!(kinds[0], SyntaxErrorKind::SpecNotRegistered("Other".into()));
    assert_eq!(kinds[1], SyntaxErrorKind::DuplicateModule("Ping".into()));
    assert_eq!(kinds[2], SyntaxErrorKind::UnknownSpec("Plain".into()));
    assert!(matches!(kinds[3], SyntaxErrorKind::InvalidRegistration(_)));
}

#[test]
fn test_namespace_and_aliased_imports() {
    let modules = parse_file(&file(
        r#"
import * as TM from 'tether-modules';
import type { Signal as Event } from 'tether-modules';

export interface Spec extends TM.NativeModule {
  ping(): string;
  onPing: Event<string[]>;
}

export default TM.NativeModuleRegistry.getEnforcing<Spec>('Pinger');
"#,
    ))
    .unwrap();
    let module = &modules[0];
    assert_eq!(module.name, "Pinger");
    assert_eq!(
        module.notifications[0].payload,
        Some(TypeRef::array(TypeRef::Primitive(Primitive::String)))
    );
}

#[test]
fn test_parse_files_collects_across_files() {
    let files = vec![
        SourceFile::virtual_file("src/NativeA.ts", "interface A { x: any }"),
        SourceFile::virtual_file("src/NativeB.ts", "interface B { y: unknown }"),
    ];
    let err = parse_files(&files).unwrap_err();
    let files: Vec<_> = err.errors.iter().map(|e| e.location.file.as_str()).collect();
    assert_eq!(files, vec!["src/NativeA.ts", "src/NativeB.ts"]);
}

#[test]
fn test_unused_aliases_are_checked() {
    let kinds = error_kinds(
        r#"
import type { NativeModule } from 'tether-modules';
import { NativeModuleRegistry } from 'tether-modules';

export type U = string | number;
export type F = (x: number) => void;
export type T = [number, string];
export type Pair = [number, number];

export interface Spec extends NativeModule {
  measure(p: Pair): void;
}

export default NativeModuleRegistry.getEnforcing<Spec>('Aliases');
"#,
    );
    // `Pair` is also expanded at its use, but reported once.
    assert_eq!(
        kinds,
        vec![
            SyntaxErrorKind::UnsupportedUnion,
            SyntaxErrorKind::FunctionType,
            SyntaxErrorKind::TupleType,
            SyntaxErrorKind::TupleType,
        ]
    );
}

#[test]
fn test_aliases_of_site_dependent_types_are_accepted() {
    let modules = parse_file(&file(
        r#"
import type { NativeModule, Signal } from 'tether-modules';
import { NativeModuleRegistry } from 'tether-modules';

export type Later = Promise<number>;
export type Nothing = void;
export type Tick = Signal<number>;
export type Unused = Promise<string | null>;

export interface Spec extends NativeModule {
  wait(): Later;
  stop(): Nothing;
  onTick: Tick;
}

export default NativeModuleRegistry.getEnforcing<Spec>('Timer');
"#,
    ))
    .unwrap();
    let module = &modules[0];
    assert!(module.methods[0].is_async());
    assert_eq!(module.methods[1].return_type, TypeRef::Void);
    assert_eq!(
        module.notifications[0].payload,
        Some(TypeRef::Primitive(Primitive::Number))
    );
}
