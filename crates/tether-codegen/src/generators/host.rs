//! `host.rs`: argument glue, method tables and registration.

use tether_resolve::{ResolvedMethod, ResolvedModule};

use super::{impl_mod, literal, module_static, screaming, GenContext, Generator};
use crate::artifact::Artifact;
use crate::error::CodegenResult;
use crate::writer::CodeWriter;

pub struct HostGenerator;

impl Generator for HostGenerator {
    fn name(&self) -> &'static str {
        "host"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> CodegenResult<Vec<Artifact>> {
        let mut w = CodeWriter::new();
        w.line(ctx.header().trim_end());

        for module in &ctx.model.modules {
            if !module.methods.is_empty() {
                w.blank();
                emit_glue(&mut w, module);
            }
            w.blank();
            emit_tables(&mut w, module);
            w.blank();
            emit_bridged(&mut w, module);
        }

        w.blank();
        w.line("/// Register every module in this crate with `bridge`.");
        w.block("pub fn register(bridge: &tether_rt::Bridge)", |w| {
            for module in &ctx.model.modules {
                w.line(format!("bridge.register::<{}>();", impl_type(module)));
            }
        });

        Ok(vec![Artifact::overwrite(ctx.src("host.rs"), w.finish())])
    }
}

fn impl_type(module: &ResolvedModule) -> String {
    format!("crate::{}::{}", impl_mod(module), module.name.rust)
}

fn glue_mod(module: &ResolvedModule) -> String {
    format!("{}_glue", module.snake)
}

fn emit_glue(w: &mut CodeWriter, module: &ResolvedModule) {
    w.block(format!("mod {}", glue_mod(module)), |w| {
        w.line("#[allow(unused_imports)]");
        w.line("use crate::generated::*;");
        w.line(format!("use crate::{}::{};", impl_mod(module), module.name.rust));
        for method in &module.methods {
            w.blank();
            if method.is_async {
                emit_async_glue(w, module, method);
            } else {
                emit_sync_glue(w, module, method);
            }
        }
    });
}

/// Decode arguments in order into locals named after the parameters.
fn emit_args(w: &mut CodeWriter, method: &ResolvedMethod) {
    if method.params.is_empty() {
        w.line("tether_rt::Args::new(args_, 0)?;");
        return;
    }
    w.line(format!("let mut args_ = tether_rt::Args::new(args_, {})?;", method.params.len()));
    for param in &method.params {
        w.line(format!(
            "let {}: {} = args_.next({})?;",
            param.name.rust,
            param.ty.rust_type(),
            literal(&param.name.source)
        ));
    }
}

fn call_expr(module: &ResolvedModule, method: &ResolvedMethod) -> String {
    let mut call = format!("<{} as {}>::{}(it_", module.name.rust, module.spec_trait(), method.name.rust);
    for param in &method.params {
        call.push_str(", ");
        call.push_str(&param.name.rust);
    }
    call.push(')');
    call
}

fn emit_sync_glue(w: &mut CodeWriter, module: &ResolvedModule, method: &ResolvedMethod) {
    let signature = format!(
        "pub(super) fn {}(it_: &mut {}, args_: Vec<tether_rt::HostValue>) -> Result<tether_rt::HostValue, tether_rt::MarshalError>",
        method.name.rust, module.name.rust
    );
    w.block(signature, |w| {
        emit_args(w, method);
        if method.returns.is_void() {
            w.line(format!("{};", call_expr(module, method)));
            w.line("Ok(tether_rt::HostValue::Undefined)");
        } else {
            w.line(format!("Ok(tether_rt::IntoHost::into_host({}))", call_expr(module, method)));
        }
    });
}

fn emit_async_glue(w: &mut CodeWriter, module: &ResolvedModule, method: &ResolvedMethod) {
    let signature = format!(
        "pub(super) fn {}(args_: Vec<tether_rt::HostValue>) -> Result<tether_rt::DeferredCall<{}>, tether_rt::MarshalError>",
        method.name.rust, module.name.rust
    );
    w.block(signature, |w| {
        emit_args(w, method);
        w.line(format!(
            "Ok(Box::new(move |it_: &mut {}| tether_rt::promise::settle({})))",
            module.name.rust,
            call_expr(module, method)
        ));
    });
}

fn emit_tables(w: &mut CodeWriter, module: &ResolvedModule) {
    let prefix = screaming(&module.name.rust);
    let glue = glue_mod(module);
    let open = format!("static {prefix}_METHODS: &[tether_rt::MethodEntry<{}>] = &[", impl_type(module));
    if module.methods.is_empty() {
        w.line(format!("{open}];"));
    } else {
        w.block_with(open, "];", |w| {
            for method in &module.methods {
                let convention = if method.is_async { "Async" } else { "Sync" };
                w.line(format!(
                    "tether_rt::MethodEntry {{ name: {}, convention: tether_rt::Convention::{convention}({glue}::{}) }},",
                    literal(&method.name.source),
                    method.name.rust
                ));
            }
        });
    }
    w.blank();

    let open = format!("static {prefix}_NOTIFICATIONS: &[tether_rt::NotificationEntry] = &[");
    if module.notifications.is_empty() {
        w.line(format!("{open}];"));
    } else {
        w.block_with(open, "];", |w| {
            for notification in &module.notifications {
                w.line(format!(
                    "tether_rt::NotificationEntry {{ name: {}, kind: tether_rt::PayloadKind::{} }},",
                    literal(&notification.name.source),
                    notification.channel.variant()
                ));
            }
        });
    }
}

fn emit_bridged(w: &mut CodeWriter, module: &ResolvedModule) {
    let prefix = screaming(&module.name.rust);
    let ty = impl_type(module);
    w.block(format!("impl tether_rt::BridgedModule for {ty}"), |w| {
        w.line(format!("const NAME: &'static str = {};", literal(&module.name.source)));
        w.blank();
        w.block("fn create(ctx: tether_rt::Context) -> Self", |w| {
            w.line(format!("<Self as crate::generated::{}>::new(ctx)", module.spec_trait()));
        });
        w.blank();
        w.block("fn methods() -> &'static [tether_rt::MethodEntry<Self>]", |w| {
            w.line(format!("{prefix}_METHODS"));
        });
        w.blank();
        w.block("fn notifications() -> &'static [tether_rt::NotificationEntry]", |w| {
            w.line(format!("{prefix}_NOTIFICATIONS"));
        });
        w.blank();
        w.block("fn declaration() -> &'static tether_rt::ModuleDecl", |w| {
            w.line(format!("&crate::bridging::{}", module_static(module)));
        });
    });
}
