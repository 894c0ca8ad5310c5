use std::fmt;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use thiserror::Error;

use crate::schema::Location;

/// Everything the parser can object to in a schema file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum SyntaxErrorKind {
    #[error("unrecognized token `{0}`")]
    UnrecognizedToken(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("unexpected end of file, expected {0}")]
    UnexpectedEof(String),

    #[error("class declarations are not supported")]
    ClassDeclaration,

    #[error("`{0}` declarations are not supported in schema files")]
    UnsupportedDeclaration(String),

    #[error("computed and index signatures are not supported")]
    ComputedMember,

    #[error("union types only allow a nullable shape (`T | null`)")]
    UnsupportedUnion,

    #[error("intersection types are not supported")]
    IntersectionType,

    #[error("tuple types are not supported")]
    TupleType,

    #[error("function types are not supported")]
    FunctionType,

    #[error("inline type literals are not supported")]
    InlineTypeLiteral,

    #[error("literal type `{0}` is not supported")]
    LiteralType(String),

    #[error("type parameters are not supported (`{0}`)")]
    GenericType(String),

    #[error("`{0}` is not supported as a schema type")]
    PlaceholderType(String),

    #[error("optional property `{0}` is not supported")]
    OptionalProperty(String),

    #[error("optional parameter `{0}` is not supported")]
    OptionalParameter(String),

    #[error("optional method `{0}` is not supported")]
    OptionalMethod(String),

    #[error("method `{0}` is not allowed in a data type")]
    MethodInRecord(String),

    #[error("interface inheritance is not supported (extends `{0}`)")]
    InterfaceExtends(String),

    #[error("nested nullable types are not supported")]
    NestedNullable,

    #[error("a `Promise` result cannot be nullable")]
    NullablePromise,

    #[error("`Promise` is only allowed as a method return type")]
    PromiseNotAllowed,

    #[error("`Signal` is only allowed as a module notification property")]
    SignalNotAllowed,

    #[error("`void` is only allowed as a method return type")]
    VoidNotAllowed,

    #[error("`null` is only allowed in a nullable union (`T | null`)")]
    NullNotAllowed,

    #[error("cannot find type `{0}`")]
    UndefinedType(String),

    #[error("type alias `{0}` refers to itself")]
    AliasCycle(String),

    #[error("`{0}` is declared more than once")]
    DuplicateDeclaration(String),

    #[error("`{name}` takes {expected} type argument(s), found {found}")]
    WrongTypeArgs { name: String, expected: usize, found: usize },

    #[error("property `{0}` in a module spec must be a `Signal`")]
    NotificationProperty(String),

    #[error("enum `{0}` has no members")]
    EmptyEnum(String),

    #[error("enum `{0}` mixes string and numeric members")]
    MixedEnum(String),

    #[error("enum member `{0}` has a non-integer value")]
    FloatEnumValue(String),

    #[error("enum member `{0}` needs a string or integer initializer")]
    EnumMemberValue(String),

    #[error("enum `{name}` uses the value {value} more than once")]
    DuplicateEnumValue { name: String, value: String },

    #[error("module spec `{0}` is never registered")]
    SpecNotRegistered(String),

    #[error("`{0}` is not a module spec declared in this file")]
    UnknownSpec(String),

    #[error("invalid module registration: {0}")]
    InvalidRegistration(String),

    #[error("module `{0}` is registered more than once")]
    DuplicateModule(String),
}

impl SyntaxErrorKind {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        use SyntaxErrorKind::*;
        match self {
            UnrecognizedToken(_) => "tether::syntax::unrecognized_token",
            UnexpectedToken { .. } | UnexpectedEof(_) => "tether::syntax::unexpected_token",
            ClassDeclaration => "tether::syntax::class_declaration",
            UnsupportedDeclaration(_) => "tether::syntax::unsupported_declaration",
            ComputedMember => "tether::syntax::computed_member",
            UnsupportedUnion => "tether::syntax::unsupported_union",
            IntersectionType => "tether::syntax::intersection",
            TupleType => "tether::syntax::tuple",
            FunctionType => "tether::syntax::function_type",
            InlineTypeLiteral => "tether::syntax::type_literal",
            LiteralType(_) => "tether::syntax::literal_type",
            GenericType(_) => "tether::syntax::generic",
            PlaceholderType(_) => "tether::syntax::placeholder_type",
            OptionalProperty(_) | OptionalParameter(_) | OptionalMethod(_) => "tether::syntax::optional",
            MethodInRecord(_) => "tether::syntax::method_in_record",
            InterfaceExtends(_) => "tether::syntax::extends",
            NestedNullable | NullablePromise => "tether::syntax::nullable",
            PromiseNotAllowed | SignalNotAllowed | VoidNotAllowed | NullNotAllowed => "tether::syntax::misplaced_type",
            UndefinedType(_) => "tether::syntax::undefined_type",
            AliasCycle(_) => "tether::syntax::alias_cycle",
            DuplicateDeclaration(_) => "tether::syntax::duplicate_declaration",
            WrongTypeArgs { .. } => "tether::syntax::type_arguments",
            NotificationProperty(_) => "tether::syntax::notification_property",
            EmptyEnum(_) | MixedEnum(_) | FloatEnumValue(_) | EnumMemberValue(_) | DuplicateEnumValue { .. } => {
                "tether::syntax::enum"
            }
            SpecNotRegistered(_) | UnknownSpec(_) | InvalidRegistration(_) | DuplicateModule(_) => {
                "tether::syntax::registration"
            }
        }
    }

    pub fn help(&self) -> Option<&'static str> {
        use SyntaxErrorKind::*;
        match self {
            ClassDeclaration => Some("declare data shapes with `interface` or `type X = { ... }`"),
            UnsupportedUnion => Some("model alternatives as an enum, or use `T | null` for an absent value"),
            TupleType => Some("use an array or a record with named fields"),
            FunctionType | MethodInRecord(_) => Some("callbacks cannot cross the boundary; use a `Signal` notification"),
            InlineTypeLiteral => Some("declare a named interface and reference it"),
            GenericType(_) => Some("declare a concrete type for each instantiation"),
            PlaceholderType(_) => Some("use a concrete type"),
            OptionalProperty(_) | OptionalParameter(_) | OptionalMethod(_) => Some("use `T | null` instead"),
            NullablePromise => Some("make the resolved value nullable instead: `Promise<T | null>`"),
            SpecNotRegistered(_) => Some("add `export default NativeModuleRegistry.getEnforcing<Spec>('Name');`"),
            InvalidRegistration(_) | UnknownSpec(_) => {
                Some("expected `NativeModuleRegistry.getEnforcing<Spec>('Name')` with a spec interface declared in this file")
            }
            _ => None,
        }
    }
}

/// A single problem in a schema file.
#[derive(Debug, Error)]
#[error("{location}: {kind}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub location: Location,
    src: NamedSource<String>,
    span: SourceSpan,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, location: Location, src: NamedSource<String>, span: SourceSpan) -> Self {
        Self { kind, location, src, span }
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }
}

impl Diagnostic for SyntaxError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind.help().map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.kind.to_string()),
            self.span,
        ))))
    }
}

/// Every problem found in one parsing pass, across all files.
#[derive(Debug, Error, Diagnostic)]
#[error("schema validation failed with {} error(s)", .errors.len())]
#[diagnostic(
    code(tether::syntax::schema),
    help("fix the errors above and run `tether codegen` again")
)]
pub struct SchemaErrors {
    #[related]
    pub errors: Vec<SyntaxError>,
}

impl SchemaErrors {
    pub fn kinds(&self) -> Vec<&SyntaxErrorKind> {
        self.errors.iter().map(|e| &e.kind).collect()
    }
}

pub type SyntaxResult<T> = std::result::Result<T, SchemaErrors>;

/// Maps byte offsets to line/column pairs.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    /// 1-based line and column (in characters) of `offset`.
    pub fn line_col(&self, text: &str, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let end = offset.min(text.len());
        let column = text.get(start..end).map_or(0, |s| s.chars().count());
        (line as u32 + 1, column as u32 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index() {
        let text = "ab\ncd\n\nef";
        let index = LineIndex::new(text);
        assert_eq!(index.line_col(text, 0), (1, 1));
        assert_eq!(index.line_col(text, 1), (1, 2));
        assert_eq!(index.line_col(text, 3), (2, 1));
        assert_eq!(index.line_col(text, 7), (4, 1));
        assert_eq!(index.line_col(text, 8), (4, 2));
    }
}
