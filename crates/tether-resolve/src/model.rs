//! The resolved model handed to the emitter.
//!
//! Source locations are kept for diagnostics but never serialized, so the
//! serialized form only changes when the schema's meaning does.

use serde::Serialize;
use tether_syntax::{EnumKind, EnumValue, Location};

use crate::mapping::{CanonicalType, Channel};

/// A name as written in the schema, and the identifier generated code uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Name {
    /// Spelling used at the calling boundary.
    pub source: String,
    /// Normalized and keyword-escaped Rust identifier.
    pub rust: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectModel {
    pub modules: Vec<ResolvedModule>,
    /// Every record any module uses, once, dependencies first.
    pub records: Vec<ResolvedRecord>,
    /// Every enum any module uses, once.
    pub enums: Vec<ResolvedEnum>,
}

impl ProjectModel {
    pub fn module(&self, name: &str) -> Option<&ResolvedModule> {
        self.modules.iter().find(|m| m.name.source == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedModule {
    /// `source` is the registered module name, `rust` the PascalCase type name.
    pub name: Name,
    /// snake_case stem for file and function names.
    pub snake: String,
    pub methods: Vec<ResolvedMethod>,
    /// Records this module reaches, dependencies first.
    pub records: Vec<ResolvedRecord>,
    pub enums: Vec<ResolvedEnum>,
    pub notifications: Vec<ResolvedNotification>,
    #[serde(skip)]
    pub location: Location,
}

impl ResolvedModule {
    /// Name of the generated trait the implementation provides.
    pub fn spec_trait(&self) -> String {
        format!("{}Spec", self.name.rust)
    }

    /// Name of the generated notification enum.
    pub fn signal_enum(&self) -> String {
        format!("{}Signal", self.name.rust)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMethod {
    pub name: Name,
    pub params: Vec<ResolvedParam>,
    pub returns: CanonicalType,
    pub is_async: bool,
    #[serde(skip)]
    pub location: Location,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedParam {
    pub name: Name,
    pub ty: CanonicalType,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRecord {
    pub name: Name,
    pub fields: Vec<ResolvedField>,
    #[serde(skip)]
    pub location: Location,
}

impl ResolvedRecord {
    /// Same fields, same types, same order; locations are ignored.
    pub fn same_shape(&self, other: &ResolvedRecord) -> bool {
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.name == b.name && a.ty == b.ty)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedField {
    pub name: Name,
    pub ty: CanonicalType,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEnum {
    pub name: Name,
    pub kind: EnumKind,
    pub variants: Vec<ResolvedVariant>,
    #[serde(skip)]
    pub location: Location,
}

impl ResolvedEnum {
    pub fn same_shape(&self, other: &ResolvedEnum) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.variants.len() == other.variants.len()
            && self
                .variants
                .iter()
                .zip(&other.variants)
                .all(|(a, b)| a.name == b.name && a.value == b.value)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedVariant {
    pub name: Name,
    pub value: EnumValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedNotification {
    /// `rust` is the snake_case form; the signal variant uses [`Self::tag`].
    pub name: Name,
    pub tag: String,
    pub payload: Option<CanonicalType>,
    pub channel: Channel,
    #[serde(skip)]
    pub location: Location,
}
