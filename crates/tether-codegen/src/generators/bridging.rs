//! `bridging.rs`: static interface declarations and the value conversions
//! for every record and enum.

use std::collections::BTreeMap;

use tether_resolve::{CanonicalType, ResolvedEnum, ResolvedModule, ResolvedRecord};
use tether_syntax::{EnumKind, EnumValue};

use super::{enum_static, literal, module_static, record_static, screaming, GenContext, Generator};
use crate::artifact::Artifact;
use crate::error::CodegenResult;
use crate::writer::CodeWriter;

pub struct BridgingGenerator;

impl Generator for BridgingGenerator {
    fn name(&self) -> &'static str {
        "bridging"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> CodegenResult<Vec<Artifact>> {
        let mut decls = TypeDecls::default();

        // Declarations are rendered first so every hoisted type is known.
        let mut body = CodeWriter::new();
        for record in &ctx.model.records {
            body.blank();
            emit_record_decl(&mut body, record, &mut decls);
        }
        for enum_ in &ctx.model.enums {
            body.blank();
            emit_enum_decl(&mut body, enum_);
        }
        for module in &ctx.model.modules {
            body.blank();
            emit_module_decl(&mut body, module, &mut decls);
        }
        for record in &ctx.model.records {
            body.blank();
            emit_record_conversions(&mut body, record);
        }
        for enum_ in &ctx.model.enums {
            body.blank();
            emit_enum_conversions(&mut body, enum_);
        }

        let mut w = CodeWriter::new();
        w.line(ctx.header().trim_end());
        w.blank();
        w.line("#[allow(unused_imports)]");
        w.line("use crate::generated::*;");
        if !decls.hoisted.is_empty() {
            w.blank();
        }
        for (name, expr) in &decls.hoisted {
            w.line(format!("static {name}: tether_rt::TypeDecl = {expr};"));
        }

        let mut content = w.finish();
        content.push_str(&body.finish());
        Ok(vec![Artifact::overwrite(ctx.src("bridging.rs"), content)])
    }
}

/// Renders `TypeDecl` expressions usable in a static initializer.
///
/// A reference to a record or enum declaration is not promotable, so any
/// composite type that reaches one is moved into its own static.
#[derive(Default)]
struct TypeDecls {
    hoisted: BTreeMap<String, String>,
}

impl TypeDecls {
    fn expr(&mut self, ty: &CanonicalType) -> String {
        match ty {
            CanonicalType::Boolean => "tether_rt::TypeDecl::Boolean".into(),
            CanonicalType::Number => "tether_rt::TypeDecl::Number".into(),
            CanonicalType::String => "tether_rt::TypeDecl::String".into(),
            CanonicalType::ArrayBuffer => "tether_rt::TypeDecl::ArrayBuffer".into(),
            CanonicalType::Void => "tether_rt::TypeDecl::Void".into(),
            CanonicalType::Record(name) => format!("tether_rt::TypeDecl::Record(&{})", record_static(name)),
            CanonicalType::Enum(name) => format!("tether_rt::TypeDecl::Enum(&{})", enum_static(name)),
            CanonicalType::Array(inner) => format!("tether_rt::TypeDecl::Array({})", self.reference(inner)),
            CanonicalType::Nullable(inner) => format!("tether_rt::TypeDecl::Nullable({})", self.reference(inner)),
            CanonicalType::Promise(inner) => format!("tether_rt::TypeDecl::Promise({})", self.reference(inner)),
        }
    }

    fn reference(&mut self, ty: &CanonicalType) -> String {
        let expr = self.expr(ty);
        if !names_a_type(ty) {
            return format!("&{expr}");
        }
        let name = format!("TY_{}", descriptor(ty));
        self.hoisted.entry(name.clone()).or_insert(expr);
        format!("&{name}")
    }
}

fn names_a_type(ty: &CanonicalType) -> bool {
    match ty {
        CanonicalType::Record(_) | CanonicalType::Enum(_) => true,
        CanonicalType::Array(inner) | CanonicalType::Nullable(inner) | CanonicalType::Promise(inner) => {
            names_a_type(inner)
        }
        _ => false,
    }
}

fn descriptor(ty: &CanonicalType) -> String {
    match ty {
        CanonicalType::Boolean => "BOOLEAN".into(),
        CanonicalType::Number => "NUMBER".into(),
        CanonicalType::String => "STRING".into(),
        CanonicalType::ArrayBuffer => "ARRAY_BUFFER".into(),
        CanonicalType::Void => "VOID".into(),
        CanonicalType::Record(name) | CanonicalType::Enum(name) => screaming(name),
        CanonicalType::Array(inner) => format!("ARRAY_OF_{}", descriptor(inner)),
        CanonicalType::Nullable(inner) => format!("NULLABLE_{}", descriptor(inner)),
        CanonicalType::Promise(inner) => format!("PROMISE_OF_{}", descriptor(inner)),
    }
}

//----------------------------------------------------------------------------
// Declarations
//----------------------------------------------------------------------------

fn emit_record_decl(w: &mut CodeWriter, record: &ResolvedRecord, decls: &mut TypeDecls) {
    w.block_with(
        format!("pub static {}: tether_rt::RecordDecl = tether_rt::RecordDecl {{", record_static(&record.name.rust)),
        "};",
        |w| {
            w.line(format!("name: {},", literal(&record.name.source)));
            if record.fields.is_empty() {
                w.line("fields: &[],");
                return;
            }
            w.block_with("fields: &[", "],", |w| {
                for field in &record.fields {
                    w.line(format!(
                        "tether_rt::FieldDecl {{ name: {}, ty: {} }},",
                        literal(&field.name.source),
                        decls.expr(&field.ty)
                    ));
                }
            });
        },
    );
}

fn emit_enum_decl(w: &mut CodeWriter, enum_: &ResolvedEnum) {
    let values: Vec<String> = enum_
        .variants
        .iter()
        .map(|v| match &v.value {
            EnumValue::Str(s) => literal(s),
            EnumValue::Int(n) => n.to_string(),
        })
        .collect();
    let values = match enum_.kind {
        EnumKind::StringBacked => format!("tether_rt::EnumValues::Str(&[{}])", values.join(", ")),
        EnumKind::NumericBacked => format!("tether_rt::EnumValues::Int(&[{}])", values.join(", ")),
    };
    w.block_with(
        format!("pub static {}: tether_rt::EnumDecl = tether_rt::EnumDecl {{", enum_static(&enum_.name.rust)),
        "};",
        |w| {
            w.line(format!("name: {},", literal(&enum_.name.source)));
            w.line(format!("values: {values},"));
        },
    );
}

fn emit_module_decl(w: &mut CodeWriter, module: &ResolvedModule, decls: &mut TypeDecls) {
    w.line(format!("/// The `{}` interface as the host sees it.", module.name.source));
    w.block_with(
        format!("pub static {}: tether_rt::ModuleDecl = tether_rt::ModuleDecl {{", module_static(module)),
        "};",
        |w| {
            w.line(format!("name: {},", literal(&module.name.source)));
            w.block_with("methods: &[", "],", |w| {
                for method in &module.methods {
                    w.block_with("tether_rt::MethodDecl {", "},", |w| {
                        w.line(format!("name: {},", literal(&method.name.source)));
                        if method.params.is_empty() {
                            w.line("params: &[],");
                        } else {
                            w.block_with("params: &[", "],", |w| {
                                for param in &method.params {
                                    w.line(format!(
                                        "tether_rt::ParamDecl {{ name: {}, ty: {} }},",
                                        literal(&param.name.source),
                                        decls.expr(&param.ty)
                                    ));
                                }
                            });
                        }
                        w.line(format!("returns: {},", decls.expr(&method.returns)));
                    });
                }
            });
            if module.notifications.is_empty() {
                w.line("notifications: &[],");
                return;
            }
            w.block_with("notifications: &[", "],", |w| {
                for notification in &module.notifications {
                    let payload = match &notification.payload {
                        Some(ty) => format!("Some({})", decls.expr(ty)),
                        None => "None".into(),
                    };
                    w.line(format!(
                        "tether_rt::NotificationDecl {{ name: {}, payload: {payload}, kind: tether_rt::PayloadKind::{} }},",
                        literal(&notification.name.source),
                        notification.channel.variant()
                    ));
                }
            });
        },
    );
}

//----------------------------------------------------------------------------
// Conversions
//----------------------------------------------------------------------------

fn emit_record_conversions(w: &mut CodeWriter, record: &ResolvedRecord) {
    let name = &record.name.rust;
    w.block(format!("impl tether_rt::FromHost for {name}"), |w| {
        w.block(
            "fn from_host(value: tether_rt::HostValue) -> Result<Self, tether_rt::MarshalError>",
            |w| {
                if record.fields.is_empty() {
                    w.line("tether_rt::Fields::new(value)?;");
                    w.line(format!("Ok({name} {{}})"));
                    return;
                }
                w.line("let mut fields = tether_rt::Fields::new(value)?;");
                w.block_with(format!("Ok({name} {{"), "})", |w| {
                    for field in &record.fields {
                        w.line(format!("{}: fields.take({})?,", field.name.rust, literal(&field.name.source)));
                    }
                });
            },
        );
    });
    w.blank();
    w.block(format!("impl tether_rt::IntoHost for {name}"), |w| {
        w.block("fn into_host(self) -> tether_rt::HostValue", |w| {
            if record.fields.is_empty() {
                w.line("tether_rt::HostValue::Object(Default::default())");
                return;
            }
            w.block_with("tether_rt::HostValue::object([", "])", |w| {
                for field in &record.fields {
                    w.line(format!(
                        "({}, tether_rt::IntoHost::into_host(self.{})),",
                        literal(&field.name.source),
                        field.name.rust
                    ));
                }
            });
        });
    });
}

fn emit_enum_conversions(w: &mut CodeWriter, enum_: &ResolvedEnum) {
    let name = &enum_.name.rust;
    let source = literal(&enum_.name.source);
    w.block(format!("impl tether_rt::FromHost for {name}"), |w| {
        w.block(
            "fn from_host(value: tether_rt::HostValue) -> Result<Self, tether_rt::MarshalError>",
            |w| match enum_.kind {
                EnumKind::StringBacked => {
                    w.line("let tag = <String as tether_rt::FromHost>::from_host(value)?;");
                    w.block("match tag.as_str()", |w| {
                        for variant in &enum_.variants {
                            w.line(format!("{} => Ok({name}::{}),", variant.value, variant.name.rust));
                        }
                        w.line(format!("_ => Err(tether_rt::MarshalError::invalid_enum({source}, &tag)),"));
                    });
                }
                EnumKind::NumericBacked => {
                    w.block("match tether_rt::integral(value)?", |w| {
                        for variant in &enum_.variants {
                            w.line(format!("{} => Ok({name}::{}),", variant.value, variant.name.rust));
                        }
                        w.line(format!("other => Err(tether_rt::MarshalError::invalid_enum({source}, other)),"));
                    });
                }
            },
        );
    });
    w.blank();
    w.block(format!("impl tether_rt::IntoHost for {name}"), |w| {
        w.block("fn into_host(self) -> tether_rt::HostValue", |w| {
            match enum_.kind {
                EnumKind::StringBacked => w.line("tether_rt::HostValue::String(self.value().to_string())"),
                EnumKind::NumericBacked => w.line("tether_rt::HostValue::Number(self.value() as f64)"),
            };
        });
    });
}
