//! Syntax tree of a schema file, before validation.
//!
//! The parser accepts a wider language than the schema model supports so that
//! lowering can name the offending construct instead of failing on a token.

use miette::SourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFile<'a> {
    pub items: Vec<Item<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item<'a> {
    Import(ImportDecl<'a>),
    Interface(InterfaceDecl<'a>),
    TypeAlias(TypeAliasDecl<'a>),
    Enum(EnumDecl<'a>),
    Registration(Registration<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl<'a> {
    pub source: String,
    /// `(imported, local)` pairs from `{ a, b as c }`.
    pub names: Vec<(&'a str, &'a str)>,
    /// Local name of `* as ns`.
    pub namespace: Option<&'a str>,
    /// Local name of a default import.
    pub default: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident<'a> {
    pub name: &'a str,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl<'a> {
    pub name: Ident<'a>,
    pub type_params: Vec<Ident<'a>>,
    pub extends: Vec<TypeExpr<'a>>,
    pub members: Vec<Member<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl<'a> {
    pub name: Ident<'a>,
    pub type_params: Vec<Ident<'a>>,
    pub ty: TypeExpr<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl<'a> {
    pub name: Ident<'a>,
    pub members: Vec<EnumMember<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember<'a> {
    pub name: Ident<'a>,
    pub init: Option<EnumInit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumInit {
    Str(String, SourceSpan),
    Number(f64, SourceSpan),
    /// Anything else, kept only for its span.
    Other(SourceSpan),
}

/// `NativeModuleRegistry.getEnforcing<Spec>('Name')`, as written.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration<'a> {
    /// Dotted callee path, e.g. `["NativeModuleRegistry", "getEnforcing"]`.
    pub callee: Vec<&'a str>,
    pub type_args: Vec<TypeExpr<'a>>,
    pub args: Vec<CallArg>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    Str(String, SourceSpan),
    Other(SourceSpan),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member<'a> {
    Property {
        name: Ident<'a>,
        optional: bool,
        ty: TypeExpr<'a>,
    },
    Method {
        name: Ident<'a>,
        optional: bool,
        type_params: Vec<Ident<'a>>,
        params: Vec<Param<'a>>,
        ret: TypeExpr<'a>,
    },
}

impl<'a> Member<'a> {
    pub fn name(&self) -> &Ident<'a> {
        match self {
            Member::Property { name, .. } | Member::Method { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param<'a> {
    pub name: Ident<'a>,
    pub optional: bool,
    pub ty: TypeExpr<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr<'a> {
    pub kind: TypeExprKind<'a>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind<'a> {
    /// A possibly dotted name with type arguments: `Foo`, `ns.Signal<T>`.
    Named { path: Vec<&'a str>, args: Vec<TypeExpr<'a>> },
    Array(Box<TypeExpr<'a>>),
    Union(Vec<TypeExpr<'a>>),
    Intersection(Vec<TypeExpr<'a>>),
    Tuple(Vec<TypeExpr<'a>>),
    Function,
    Object(Vec<Member<'a>>),
    Literal(&'a str),
}

impl<'a> TypeExprKind<'a> {
    /// The name of a single-segment, argument-free reference.
    pub fn simple_name(&self) -> Option<&'a str> {
        match self {
            TypeExprKind::Named { path, args } if path.len() == 1 && args.is_empty() => Some(path[0]),
            _ => None,
        }
    }
}
