//! The schema model: what a module looks like once its schema file has been
//! parsed and validated. Plain data; all checks happen while building it.

use std::fmt;

use serde::Serialize;

/// A position in a schema file, 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Primitive {
    Boolean,
    Number,
    String,
    ArrayBuffer,
}

impl Primitive {
    /// Spelling in schema source.
    pub fn source_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Number => "number",
            Primitive::String => "string",
            Primitive::ArrayBuffer => "ArrayBuffer",
        }
    }
}

/// A reference to a type as written in a schema, after alias expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeRef {
    Primitive(Primitive),
    Void,
    /// Name of a [`RecordType`] in the same module.
    Record(String),
    /// Name of an [`EnumType`] in the same module.
    Enum(String),
    Array(Box<TypeRef>),
    Nullable(Box<TypeRef>),
    /// `Promise<T>`; only ever a method return type.
    Deferred(Box<TypeRef>),
    /// `Signal` / `Signal<T>`; only ever a notification declaration.
    Notification(Option<Box<TypeRef>>),
}

impl TypeRef {
    pub fn array(inner: TypeRef) -> Self {
        TypeRef::Array(Box::new(inner))
    }

    pub fn nullable(inner: TypeRef) -> Self {
        TypeRef::Nullable(Box::new(inner))
    }

    pub fn deferred(inner: TypeRef) -> Self {
        TypeRef::Deferred(Box::new(inner))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_))
    }

    /// Calls `f` on every record or enum name this type mentions, outermost first.
    pub fn visit_named(&self, f: &mut impl FnMut(&TypeRef)) {
        match self {
            TypeRef::Record(_) | TypeRef::Enum(_) => f(self),
            TypeRef::Array(inner) | TypeRef::Nullable(inner) | TypeRef::Deferred(inner) => inner.visit_named(f),
            TypeRef::Notification(Some(inner)) => inner.visit_named(f),
            TypeRef::Primitive(_) | TypeRef::Void | TypeRef::Notification(None) => {}
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => f.write_str(p.source_name()),
            TypeRef::Void => f.write_str("void"),
            TypeRef::Record(name) | TypeRef::Enum(name) => f.write_str(name),
            TypeRef::Array(inner) => match **inner {
                TypeRef::Nullable(_) => write!(f, "({inner})[]"),
                _ => write!(f, "{inner}[]"),
            },
            TypeRef::Nullable(inner) => write!(f, "{inner} | null"),
            TypeRef::Deferred(inner) => write!(f, "Promise<{inner}>"),
            TypeRef::Notification(None) => f.write_str("Signal"),
            TypeRef::Notification(Some(inner)) => write!(f, "Signal<{inner}>"),
        }
    }
}

/// One module: everything a single registration in a schema file exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    /// Name the module is registered under.
    pub name: String,
    /// Name of the spec interface in the schema file.
    pub spec_name: String,
    pub methods: Vec<Method>,
    /// Records reachable from the module's methods and notifications, in declaration order.
    pub records: Vec<RecordType>,
    /// Enums reachable from the module's methods and notifications, in declaration order.
    pub enums: Vec<EnumType>,
    pub notifications: Vec<NotificationDef>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: TypeRef,
    pub location: Location,
}

impl Method {
    /// Methods returning `Promise<T>` run on the worker pool.
    pub fn is_async(&self) -> bool {
        matches!(self.return_type, TypeRef::Deferred(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<Field>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EnumKind {
    StringBacked,
    NumericBacked,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum EnumValue {
    Str(String),
    Int(i64),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Str(s) => write!(f, "{s:?}"),
            EnumValue::Int(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub kind: EnumKind,
    pub variants: Vec<Variant>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub label: String,
    pub value: EnumValue,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDef {
    pub name: String,
    /// `None` for a plain `Signal`.
    pub payload: Option<TypeRef>,
    pub location: Location,
}
