//! Lowering from the syntax tree to the schema model.
//!
//! This is where every unsupported construct is rejected. Problems are
//! collected, never returned early, so one run reports all of them.

use fxhash::{FxHashMap, FxHashSet};
use miette::SourceSpan;

use crate::ast::*;
use crate::error::{LineIndex, SyntaxErrorKind};
use crate::schema::*;

/// Package providing `NativeModule`, `NativeModuleRegistry` and `Signal`.
pub const MODULE_PACKAGE: &str = "tether-modules";

const PLACEHOLDER_TYPES: &[&str] = &[
    "any", "unknown", "never", "object", "undefined", "bigint", "symbol", "Object", "Function",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    NativeModule,
    NativeModuleRegistry,
    Signal,
}

/// Where a type appears; decides which wrappers are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Param,
    Return,
    Field,
    /// A property of a module spec.
    Member,
    ArrayElement,
    NullableInner,
    PromiseInner,
    Payload,
    /// The body of a type alias, checked where it is declared. Wrappers whose
    /// legality depends on the use site are accepted here.
    Alias,
}

#[derive(Clone, Copy)]
enum Decl<'s, 'a> {
    Record,
    Alias(&'s TypeAliasDecl<'a>),
    Enum,
    Spec,
}

type Lowered = (Vec<ModuleSpec>, Vec<(SyntaxErrorKind, SourceSpan)>);

/// Lower a parsed file. `parse_failed` suppresses diagnostics that would only
/// echo an earlier syntax error.
pub fn lower(file_name: &str, text: &str, ast: &SchemaFile<'_>, parse_failed: bool) -> Lowered {
    Lowerer::new(file_name, text).run(ast, parse_failed)
}

struct Lowerer<'s, 'a> {
    file_name: &'s str,
    text: &'s str,
    index: LineIndex,
    /// local name -> name exported by the module package
    imports: FxHashMap<&'a str, &'a str>,
    /// names imported from any other package
    foreign: FxHashSet<&'a str>,
    namespaces: FxHashSet<&'a str>,
    decls: FxHashMap<&'a str, Decl<'s, 'a>>,
    alias_stack: Vec<&'a str>,
    errors: Vec<(SyntaxErrorKind, SourceSpan)>,
}

impl<'s, 'a> Lowerer<'s, 'a> {
    fn new(file_name: &'s str, text: &'s str) -> Self {
        Self {
            file_name,
            text,
            index: LineIndex::new(text),
            imports: FxHashMap::default(),
            foreign: FxHashSet::default(),
            namespaces: FxHashSet::default(),
            decls: FxHashMap::default(),
            alias_stack: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self, ast: &'s SchemaFile<'a>, parse_failed: bool) -> Lowered {
        for item in &ast.items {
            if let Item::Import(import) = item {
                self.collect_import(import);
            }
        }
        self.collect_declarations(ast);

        // Every declaration is checked, whether or not a module uses it.
        let mut records = Vec::new();
        let mut enums = Vec::new();
        let mut specs: FxHashMap<&'a str, (Vec<Method>, Vec<NotificationDef>)> = FxHashMap::default();
        let mut spec_order = Vec::new();
        let mut lowered: FxHashSet<&'a str> = FxHashSet::default();

        for item in &ast.items {
            match item {
                Item::Enum(decl) if lowered.insert(decl.name.name) => {
                    if let Some(e) = self.lower_enum(decl) {
                        enums.push(e);
                    }
                }
                Item::Interface(decl) if lowered.insert(decl.name.name) => {
                    if matches!(self.decls.get(decl.name.name), Some(Decl::Spec)) {
                        let lowered_spec = self.lower_spec(decl);
                        specs.insert(decl.name.name, lowered_spec);
                        spec_order.push(&decl.name);
                    } else {
                        if let Some(base) = decl.extends.first() {
                            self.report(SyntaxErrorKind::InterfaceExtends(self.snippet(base.span)), base.span);
                        }
                        if let Some(r) = self.lower_record(&decl.name, &decl.type_params, &decl.members) {
                            records.push(r);
                        }
                    }
                }
                Item::TypeAlias(decl) if lowered.insert(decl.name.name) => match &decl.ty.kind {
                    TypeExprKind::Object(members) => {
                        if let Some(r) = self.lower_record(&decl.name, &decl.type_params, members) {
                            records.push(r);
                        }
                    }
                    _ if !decl.type_params.is_empty() => {
                        self.report(SyntaxErrorKind::GenericType(decl.name.name.to_string()), decl.name.span);
                    }
                    _ => {
                        self.lower_type(&decl.ty, Position::Alias);
                    }
                },
                _ => {}
            }
        }

        let mut modules = Vec::new();
        let mut registered: FxHashSet<&'a str> = FxHashSet::default();
        let mut module_names: FxHashSet<String> = FxHashSet::default();
        for item in &ast.items {
            let Item::Registration(registration) = item else {
                continue;
            };
            let Some((name, spec)) = self.lower_registration(registration) else {
                continue;
            };
            registered.insert(spec);
            if !module_names.insert(name.clone()) {
                self.report(SyntaxErrorKind::DuplicateModule(name), registration.span);
                continue;
            }
            let Some((methods, notifications)) = specs.get(spec) else {
                continue;
            };
            let (module_records, module_enums) = reachable(&records, &enums, methods, notifications);
            modules.push(ModuleSpec {
                name,
                spec_name: spec.to_string(),
                methods: methods.clone(),
                records: module_records,
                enums: module_enums,
                notifications: notifications.clone(),
                location: self.location(registration.span),
            });
        }

        if !parse_failed {
            for spec in spec_order {
                if !registered.contains(spec.name) {
                    self.report(SyntaxErrorKind::SpecNotRegistered(spec.name.to_string()), spec.span);
                }
            }
        }

        (modules, self.errors)
    }

    fn report(&mut self, kind: SyntaxErrorKind, span: SourceSpan) {
        self.errors.push((kind, span));
    }

    fn fail<T>(&mut self, kind: SyntaxErrorKind, span: SourceSpan) -> Option<T> {
        self.report(kind, span);
        None
    }

    fn location(&self, span: SourceSpan) -> Location {
        let (line, column) = self.index.line_col(self.text, span.offset());
        Location {
            file: self.file_name.to_string(),
            line,
            column,
        }
    }

    fn snippet(&self, span: SourceSpan) -> String {
        self.text
            .get(span.offset()..span.offset() + span.len())
            .unwrap_or_default()
            .to_string()
    }

    fn collect_import(&mut self, import: &ImportDecl<'a>) {
        let ours = import.source == MODULE_PACKAGE;
        for &(imported, local) in &import.names {
            if ours {
                self.imports.insert(local, imported);
            } else {
                self.foreign.insert(local);
            }
        }
        if let Some(ns) = import.namespace {
            if ours {
                self.namespaces.insert(ns);
            } else {
                self.foreign.insert(ns);
            }
        }
        if let Some(default) = import.default {
            self.foreign.insert(default);
        }
    }

    fn collect_declarations(&mut self, ast: &'s SchemaFile<'a>) {
        for item in &ast.items {
            let (ident, decl) = match item {
                Item::Interface(decl) => {
                    let is_spec = decl.extends.iter().any(|base| match &base.kind {
                        TypeExprKind::Named { path, .. } => self.builtin(path) == Some(Builtin::NativeModule),
                        _ => false,
                    });
                    (&decl.name, if is_spec { Decl::Spec } else { Decl::Record })
                }
                Item::TypeAlias(decl) => match &decl.ty.kind {
                    TypeExprKind::Object(_) => (&decl.name, Decl::Record),
                    _ => (&decl.name, Decl::Alias(decl)),
                },
                Item::Enum(decl) => (&decl.name, Decl::Enum),
                Item::Import(_) | Item::Registration(_) => continue,
            };
            if self.decls.contains_key(ident.name) {
                self.report(SyntaxErrorKind::DuplicateDeclaration(ident.name.to_string()), ident.span);
            } else {
                self.decls.insert(ident.name, decl);
            }
        }
    }

    /// Resolve a path to one of the module package's exports, honouring
    /// import aliases, namespaces and local shadowing.
    fn builtin(&self, path: &[&'a str]) -> Option<Builtin> {
        let name = match path {
            [name] => {
                if self.decls.contains_key(name) || self.foreign.contains(name) {
                    return None;
                }
                self.imports.get(name).copied().unwrap_or(*name)
            }
            [ns, name] if self.namespaces.contains(ns) => *name,
            _ => return None,
        };
        match name {
            "NativeModule" => Some(Builtin::NativeModule),
            "NativeModuleRegistry" => Some(Builtin::NativeModuleRegistry),
            "Signal" => Some(Builtin::Signal),
            _ => None,
        }
    }

    //--------------------------------------------------------------------------
    // Declarations
    //--------------------------------------------------------------------------

    fn lower_record(
        &mut self,
        name: &Ident<'a>,
        type_params: &[Ident<'a>],
        members: &'s [Member<'a>],
    ) -> Option<RecordType> {
        if !type_params.is_empty() {
            return self.fail(SyntaxErrorKind::GenericType(name.name.to_string()), name.span);
        }
        let mut fields = Vec::with_capacity(members.len());
        for member in members {
            match member {
                Member::Method { name, .. } => {
                    self.report(SyntaxErrorKind::MethodInRecord(name.name.to_string()), name.span);
                }
                Member::Property { name, optional, ty } => {
                    if *optional {
                        self.report(SyntaxErrorKind::OptionalProperty(name.name.to_string()), name.span);
                    }
                    if let Some(ty) = self.lower_type(ty, Position::Field) {
                        fields.push(Field {
                            name: name.name.to_string(),
                            ty,
                            location: self.location(name.span),
                        });
                    }
                }
            }
        }
        Some(RecordType {
            name: name.name.to_string(),
            fields,
            location: self.location(name.span),
        })
    }

    fn lower_enum(&mut self, decl: &EnumDecl<'a>) -> Option<EnumType> {
        let enum_name = decl.name.name;
        if decl.members.is_empty() {
            return self.fail(SyntaxErrorKind::EmptyEnum(enum_name.to_string()), decl.name.span);
        }

        let mut kind = None;
        let mut next_int = 0i64;
        let mut mixed_reported = false;
        let mut seen = FxHashSet::default();
        let mut variants = Vec::with_capacity(decl.members.len());

        for member in &decl.members {
            let label = member.name.name;
            let value = match &member.init {
                None if kind == Some(EnumKind::StringBacked) => {
                    self.report(SyntaxErrorKind::EnumMemberValue(label.to_string()), member.name.span);
                    continue;
                }
                None => EnumValue::Int(next_int),
                Some(EnumInit::Str(s, _)) => EnumValue::Str(s.clone()),
                Some(EnumInit::Number(n, span)) => {
                    if n.fract() != 0.0 || !n.is_finite() {
                        self.report(SyntaxErrorKind::FloatEnumValue(label.to_string()), *span);
                        continue;
                    }
                    EnumValue::Int(*n as i64)
                }
                Some(EnumInit::Other(span)) => {
                    self.report(SyntaxErrorKind::EnumMemberValue(label.to_string()), *span);
                    continue;
                }
            };

            let member_kind = match value {
                EnumValue::Str(_) => EnumKind::StringBacked,
                EnumValue::Int(n) => {
                    next_int = n + 1;
                    EnumKind::NumericBacked
                }
            };
            match kind {
                Some(k) if k != member_kind => {
                    if !mixed_reported {
                        self.report(SyntaxErrorKind::MixedEnum(enum_name.to_string()), member.name.span);
                        mixed_reported = true;
                    }
                    continue;
                }
                _ => kind = Some(member_kind),
            }

            if !seen.insert(value.clone()) {
                self.report(
                    SyntaxErrorKind::DuplicateEnumValue {
                        name: enum_name.to_string(),
                        value: value.to_string(),
                    },
                    member.name.span,
                );
                continue;
            }
            variants.push(Variant {
                label: label.to_string(),
                value,
                location: self.location(member.name.span),
            });
        }

        Some(EnumType {
            name: enum_name.to_string(),
            kind: kind.unwrap_or(EnumKind::NumericBacked),
            variants,
            location: self.location(decl.name.span),
        })
    }

    fn lower_spec(&mut self, decl: &'s InterfaceDecl<'a>) -> (Vec<Method>, Vec<NotificationDef>) {
        if !decl.type_params.is_empty() {
            self.report(SyntaxErrorKind::GenericType(decl.name.name.to_string()), decl.name.span);
        }
        for base in &decl.extends {
            let is_native_module = match &base.kind {
                TypeExprKind::Named { path, .. } => self.builtin(path) == Some(Builtin::NativeModule),
                _ => false,
            };
            if !is_native_module {
                self.report(SyntaxErrorKind::InterfaceExtends(self.snippet(base.span)), base.span);
            }
        }

        let mut methods = Vec::new();
        let mut notifications = Vec::new();
        for member in &decl.members {
            match member {
                Member::Method {
                    name,
                    optional,
                    type_params,
                    params,
                    ret,
                } => {
                    if *optional {
                        self.report(SyntaxErrorKind::OptionalMethod(name.name.to_string()), name.span);
                    }
                    if !type_params.is_empty() {
                        self.report(SyntaxErrorKind::GenericType(name.name.to_string()), name.span);
                    }
                    let mut lowered_params = Vec::with_capacity(params.len());
                    let mut complete = true;
                    for param in params {
                        if param.optional {
                            self.report(SyntaxErrorKind::OptionalParameter(param.name.name.to_string()), param.name.span);
                        }
                        match self.lower_type(&param.ty, Position::Param) {
                            Some(ty) => lowered_params.push(Parameter {
                                name: param.name.name.to_string(),
                                ty,
                                location: self.location(param.name.span),
                            }),
                            None => complete = false,
                        }
                    }
                    let return_type = self.lower_type(ret, Position::Return);
                    if let (true, Some(return_type)) = (complete, return_type) {
                        methods.push(Method {
                            name: name.name.to_string(),
                            params: lowered_params,
                            return_type,
                            location: self.location(name.span),
                        });
                    }
                }
                Member::Property { name, optional, ty } => {
                    if *optional {
                        self.report(SyntaxErrorKind::OptionalProperty(name.name.to_string()), name.span);
                    }
                    match self.lower_type(ty, Position::Member) {
                        Some(TypeRef::Notification(payload)) => notifications.push(NotificationDef {
                            name: name.name.to_string(),
                            payload: payload.map(|p| *p),
                            location: self.location(name.span),
                        }),
                        Some(_) => self.report(SyntaxErrorKind::NotificationProperty(name.name.to_string()), ty.span),
                        None => {}
                    }
                }
            }
        }
        (methods, notifications)
    }

    /// Returns the registered module name and the spec interface it binds.
    fn lower_registration(&mut self, registration: &Registration<'a>) -> Option<(String, &'a str)> {
        let span = registration.span;
        let (method, owner) = registration.callee.split_last()?;
        if !matches!(*method, "get" | "getEnforcing") || self.builtin(owner) != Some(Builtin::NativeModuleRegistry) {
            let message = format!(
                "`{}` is not NativeModuleRegistry.get or NativeModuleRegistry.getEnforcing",
                registration.callee.join(".")
            );
            return self.fail(SyntaxErrorKind::InvalidRegistration(message), span);
        }

        let spec = match registration.type_args.as_slice() {
            [arg] => match arg.kind.simple_name() {
                Some(name) if matches!(self.decls.get(name), Some(Decl::Spec)) => name,
                Some(name) => return self.fail(SyntaxErrorKind::UnknownSpec(name.to_string()), arg.span),
                None => {
                    let message = "the spec type argument must name an interface".to_string();
                    return self.fail(SyntaxErrorKind::InvalidRegistration(message), arg.span);
                }
            },
            [] => {
                let message = "missing the spec type argument".to_string();
                return self.fail(SyntaxErrorKind::InvalidRegistration(message), span);
            }
            args => {
                let kind = SyntaxErrorKind::WrongTypeArgs {
                    name: method.to_string(),
                    expected: 1,
                    found: args.len(),
                };
                return self.fail(kind, span);
            }
        };

        match registration.args.as_slice() {
            [CallArg::Str(name, _)] if !name.is_empty() => Some((name.clone(), spec)),
            _ => {
                let message = "expected a single module name string".to_string();
                self.fail(SyntaxErrorKind::InvalidRegistration(message), span)
            }
        }
    }

    //--------------------------------------------------------------------------
    // Types
    //--------------------------------------------------------------------------

    fn lower_type(&mut self, ty: &TypeExpr<'a>, pos: Position) -> Option<TypeRef> {
        match &ty.kind {
            TypeExprKind::Named { path, args } => self.lower_named(ty.span, path, args, pos),
            TypeExprKind::Array(inner) => match pos {
                Position::Member => self.fail(SyntaxErrorKind::NotificationProperty(self.snippet(ty.span)), ty.span),
                _ => self.lower_type(inner, Position::ArrayElement).map(TypeRef::array),
            },
            TypeExprKind::Union(members) => self.lower_union(ty, members, pos),
            TypeExprKind::Intersection(_) => self.fail(SyntaxErrorKind::IntersectionType, ty.span),
            TypeExprKind::Tuple(_) => self.fail(SyntaxErrorKind::TupleType, ty.span),
            TypeExprKind::Function => self.fail(SyntaxErrorKind::FunctionType, ty.span),
            TypeExprKind::Object(_) => self.fail(SyntaxErrorKind::InlineTypeLiteral, ty.span),
            TypeExprKind::Literal(text) => self.fail(SyntaxErrorKind::LiteralType(text.to_string()), ty.span),
        }
    }

    fn lower_named(
        &mut self,
        span: SourceSpan,
        path: &[&'a str],
        args: &[TypeExpr<'a>],
        pos: Position,
    ) -> Option<TypeRef> {
        match self.builtin(path) {
            Some(Builtin::Signal) if matches!(pos, Position::Member | Position::Alias) => {
                return match args {
                    [] => Some(TypeRef::Notification(None)),
                    [payload] => self
                        .lower_type(payload, Position::Payload)
                        .map(|p| TypeRef::Notification(Some(Box::new(p)))),
                    _ => {
                        let kind = SyntaxErrorKind::WrongTypeArgs {
                            name: "Signal".into(),
                            expected: 1,
                            found: args.len(),
                        };
                        self.fail(kind, span)
                    }
                };
            }
            Some(Builtin::Signal) => return self.fail(SyntaxErrorKind::SignalNotAllowed, span),
            Some(_) => return self.fail(SyntaxErrorKind::PlaceholderType(path.join(".")), span),
            None => {}
        }

        let [name] = path else {
            return self.fail(SyntaxErrorKind::UndefinedType(path.join(".")), span);
        };
        let name = *name;

        if let Some(decl) = self.decls.get(name).copied() {
            if !args.is_empty() {
                return self.fail(SyntaxErrorKind::GenericType(name.to_string()), span);
            }
            return match decl {
                Decl::Record => Some(TypeRef::Record(name.to_string())),
                Decl::Enum => Some(TypeRef::Enum(name.to_string())),
                Decl::Alias(alias) => {
                    if self.alias_stack.contains(&name) {
                        return self.fail(SyntaxErrorKind::AliasCycle(name.to_string()), span);
                    }
                    if !alias.type_params.is_empty() {
                        return None;
                    }
                    self.alias_stack.push(name);
                    let lowered = self.lower_type(&alias.ty, pos);
                    self.alias_stack.pop();
                    lowered
                }
                Decl::Spec => self.fail(SyntaxErrorKind::PlaceholderType(name.to_string()), span),
            };
        }

        match name {
            "boolean" | "number" | "string" | "ArrayBuffer" => {
                self.no_type_args(name, args, span)?;
                let primitive = match name {
                    "boolean" => Primitive::Boolean,
                    "number" => Primitive::Number,
                    "string" => Primitive::String,
                    _ => Primitive::ArrayBuffer,
                };
                Some(TypeRef::Primitive(primitive))
            }
            "void" => match pos {
                Position::Return | Position::PromiseInner | Position::Alias => Some(TypeRef::Void),
                _ => self.fail(SyntaxErrorKind::VoidNotAllowed, span),
            },
            "null" => self.fail(SyntaxErrorKind::NullNotAllowed, span),
            "Array" | "ReadonlyArray" => {
                let inner = self.one_type_arg(name, args, span)?;
                self.lower_type(inner, Position::ArrayElement).map(TypeRef::array)
            }
            "Promise" => {
                if !matches!(pos, Position::Return | Position::Alias) {
                    return self.fail(SyntaxErrorKind::PromiseNotAllowed, span);
                }
                let inner = self.one_type_arg(name, args, span)?;
                self.lower_type(inner, Position::PromiseInner).map(TypeRef::deferred)
            }
            _ if PLACEHOLDER_TYPES.iter().any(|p| *p == name) => {
                self.fail(SyntaxErrorKind::PlaceholderType(name.to_string()), span)
            }
            _ if !args.is_empty() => self.fail(SyntaxErrorKind::GenericType(name.to_string()), span),
            _ => self.fail(SyntaxErrorKind::UndefinedType(name.to_string()), span),
        }
    }

    fn lower_union(&mut self, ty: &TypeExpr<'a>, members: &[TypeExpr<'a>], pos: Position) -> Option<TypeRef> {
        let is_null = |m: &TypeExpr<'a>| m.kind.simple_name() == Some("null");
        let nulls = members.iter().filter(|m| is_null(*m)).count();
        let others: Vec<&TypeExpr<'a>> = members.iter().filter(|m| !is_null(*m)).collect();

        let [inner] = others.as_slice() else {
            return self.fail(SyntaxErrorKind::UnsupportedUnion, ty.span);
        };
        if nulls != 1 {
            return self.fail(SyntaxErrorKind::UnsupportedUnion, ty.span);
        }
        if pos == Position::NullableInner {
            return self.fail(SyntaxErrorKind::NestedNullable, ty.span);
        }
        if let TypeExprKind::Named { path, .. } = &inner.kind {
            if path.len() == 1 && path[0] == "Promise" {
                return self.fail(SyntaxErrorKind::NullablePromise, ty.span);
            }
        }
        self.lower_type(inner, Position::NullableInner).map(TypeRef::nullable)
    }

    fn no_type_args(&mut self, name: &str, args: &[TypeExpr<'a>], span: SourceSpan) -> Option<()> {
        if args.is_empty() {
            Some(())
        } else {
            self.fail(SyntaxErrorKind::GenericType(name.to_string()), span)
        }
    }

    fn one_type_arg<'t>(&mut self, name: &str, args: &'t [TypeExpr<'a>], span: SourceSpan) -> Option<&'t TypeExpr<'a>> {
        match args {
            [arg] => Some(arg),
            _ => {
                let kind = SyntaxErrorKind::WrongTypeArgs {
                    name: name.to_string(),
                    expected: 1,
                    found: args.len(),
                };
                self.fail(kind, span)
            }
        }
    }
}

/// Records and enums a module can reach from its methods and notifications,
/// in declaration order.
fn reachable(
    records: &[RecordType],
    enums: &[EnumType],
    methods: &[Method],
    notifications: &[NotificationDef],
) -> (Vec<RecordType>, Vec<EnumType>) {
    let by_name: FxHashMap<&str, &RecordType> = records.iter().map(|r| (r.name.as_str(), r)).collect();
    let mut seen_records: FxHashSet<String> = FxHashSet::default();
    let mut seen_enums: FxHashSet<String> = FxHashSet::default();

    let mut pending: Vec<&TypeRef> = methods
        .iter()
        .flat_map(|m| m.params.iter().map(|p| &p.ty).chain(std::iter::once(&m.return_type)))
        .chain(notifications.iter().filter_map(|n| n.payload.as_ref()))
        .collect();

    while let Some(ty) = pending.pop() {
        let mut named = Vec::new();
        ty.visit_named(&mut |t| named.push(t.clone()));
        for t in named {
            match t {
                TypeRef::Record(name) => {
                    if let Some(record) = by_name.get(name.as_str()) {
                        if seen_records.insert(name) {
                            pending.extend(record.fields.iter().map(|f| &f.ty));
                        }
                    }
                }
                TypeRef::Enum(name) => {
                    seen_enums.insert(name);
                }
                _ => {}
            }
        }
    }

    (
        records.iter().filter(|r| seen_records.contains(&r.name)).cloned().collect(),
        enums.iter().filter(|e| seen_enums.contains(&e.name)).cloned().collect(),
    )
}
