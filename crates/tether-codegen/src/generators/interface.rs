//! `generated.rs`: the types and traits an implementation is written against.

use tether_resolve::{CanonicalType, Channel, ResolvedEnum, ResolvedMethod, ResolvedModule, ResolvedRecord};
use tether_syntax::{EnumKind, EnumValue};

use super::{literal, GenContext, Generator};
use crate::artifact::Artifact;
use crate::error::CodegenResult;
use crate::writer::CodeWriter;

pub struct InterfaceGenerator;

impl Generator for InterfaceGenerator {
    fn name(&self) -> &'static str {
        "interface"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> CodegenResult<Vec<Artifact>> {
        let mut w = CodeWriter::new();
        w.line(ctx.header().trim_end());

        for record in &ctx.model.records {
            w.blank();
            emit_record(&mut w, record);
        }
        for enum_ in &ctx.model.enums {
            w.blank();
            emit_enum(&mut w, enum_);
        }
        for module in &ctx.model.modules {
            if !module.notifications.is_empty() {
                w.blank();
                emit_signal(&mut w, module);
            }
            w.blank();
            emit_spec(&mut w, module);
        }

        Ok(vec![Artifact::overwrite(ctx.src("generated.rs"), w.finish())])
    }
}

fn emit_record(w: &mut CodeWriter, record: &ResolvedRecord) {
    w.line("#[derive(Debug, Clone, PartialEq)]");
    w.block(format!("pub struct {}", record.name.rust), |w| {
        for field in &record.fields {
            w.line(format!("pub {}: {},", field.name.rust, field.ty.rust_type()));
        }
    });
}

fn emit_enum(w: &mut CodeWriter, enum_: &ResolvedEnum) {
    let name = &enum_.name.rust;
    w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
    w.block(format!("pub enum {name}"), |w| {
        for variant in &enum_.variants {
            w.line(format!("{},", variant.name.rust));
        }
    });
    w.blank();

    let value_type = match enum_.kind {
        EnumKind::StringBacked => "&'static str",
        EnumKind::NumericBacked => "i64",
    };
    w.block(format!("impl {name}"), |w| {
        w.block_with(format!("pub const ALL: &'static [{name}] = &["), "];", |w| {
            for variant in &enum_.variants {
                w.line(format!("{name}::{},", variant.name.rust));
            }
        });
        w.blank();
        w.line("/// The value this member has on the calling side.");
        w.block(format!("pub fn value(&self) -> {value_type}"), |w| {
            w.block("match self", |w| {
                for variant in &enum_.variants {
                    let value = match &variant.value {
                        EnumValue::Str(s) => literal(s),
                        EnumValue::Int(n) => n.to_string(),
                    };
                    w.line(format!("{name}::{} => {value},", variant.name.rust));
                }
            });
        });
    });
}

fn emit_signal(w: &mut CodeWriter, module: &ResolvedModule) {
    let signal = module.signal_enum();
    w.line(format!("/// Notifications `{}` can emit.", module.name.source));
    w.line("#[derive(Debug, Clone, PartialEq)]");
    w.block(format!("pub enum {signal}"), |w| {
        for notification in &module.notifications {
            match &notification.payload {
                Some(payload) => w.line(format!("{}({}),", notification.tag, payload.rust_type())),
                None => w.line(format!("{},", notification.tag)),
            };
        }
    });
    w.blank();

    w.block(format!("impl {signal}"), |w| {
        w.line("/// Name the host subscribes with.");
        w.block("pub fn name(&self) -> &'static str", |w| {
            w.block("match self", |w| {
                for notification in &module.notifications {
                    let pattern = if notification.payload.is_some() { "(_)" } else { "" };
                    w.line(format!(
                        "{signal}::{}{pattern} => {},",
                        notification.tag,
                        literal(&notification.name.source)
                    ));
                }
            });
        });
        w.blank();
        w.block("pub fn into_payload(self) -> tether_rt::Payload", |w| {
            w.block("match self", |w| {
                for notification in &module.notifications {
                    let arm = match notification.channel {
                        Channel::Unit => format!("{signal}::{} => tether_rt::Payload::Unit,", notification.tag),
                        Channel::Value => format!(
                            "{signal}::{}(value) => tether_rt::Payload::Value(tether_rt::IntoHost::into_host(value)),",
                            notification.tag
                        ),
                        Channel::NumberArray => {
                            format!("{signal}::{}(value) => tether_rt::Payload::NumberArray(value),", notification.tag)
                        }
                        Channel::StringArray => {
                            format!("{signal}::{}(value) => tether_rt::Payload::StringArray(value),", notification.tag)
                        }
                        Channel::Bytes => {
                            format!("{signal}::{}(value) => tether_rt::Payload::Bytes(value.into_vec()),", notification.tag)
                        }
                    };
                    w.line(arm);
                }
            });
        });
    });
}

fn emit_spec(w: &mut CodeWriter, module: &ResolvedModule) {
    w.line(format!("/// Implemented by the `{}` module.", module.name.source));
    w.block(format!("pub trait {}: Sized + Send + 'static", module.spec_trait()), |w| {
        w.line("fn new(ctx: tether_rt::Context) -> Self;");
        w.blank();
        w.line("fn context(&self) -> &tether_rt::Context;");
        if !module.notifications.is_empty() {
            w.blank();
            w.block(format!("fn emit(&self, signal: {})", module.signal_enum()), |w| {
                w.line("let name = signal.name();");
                w.line("self.context().emit(name, signal.into_payload());");
            });
        }
        for method in &module.methods {
            w.blank();
            w.line(format!("{};", method_signature(method)));
        }
    });
}

/// `fn name(&mut self, a: T, ...) -> R`, shared with the skeleton.
pub(crate) fn method_signature(method: &ResolvedMethod) -> String {
    let mut sig = format!("fn {}(&mut self", method.name.rust);
    for param in &method.params {
        sig.push_str(&format!(", {}: {}", param.name.rust, param.ty.rust_type()));
    }
    sig.push(')');
    if method.returns != CanonicalType::Void {
        sig.push_str(&format!(" -> {}", method.returns.rust_type()));
    }
    sig
}
