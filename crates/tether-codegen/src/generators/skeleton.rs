//! Starting points the user owns: one implementation file per module and
//! the crate root. Written once and never touched again.

use tether_resolve::ResolvedModule;

use super::interface::method_signature;
use super::{impl_mod, GenContext, Generator};
use crate::artifact::Artifact;
use crate::error::CodegenResult;
use crate::writer::CodeWriter;

pub struct SkeletonGenerator;

impl Generator for SkeletonGenerator {
    fn name(&self) -> &'static str {
        "skeleton"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> CodegenResult<Vec<Artifact>> {
        let mut artifacts: Vec<Artifact> = ctx
            .model
            .modules
            .iter()
            .map(|module| Artifact::create_only(ctx.src(&format!("{}.rs", impl_mod(module))), implementation(module)))
            .collect();
        artifacts.push(Artifact::create_only(ctx.src("lib.rs"), crate_root(&ctx.model.modules)));
        Ok(artifacts)
    }
}

fn implementation(module: &ResolvedModule) -> String {
    let name = &module.name.rust;
    let mut w = CodeWriter::new();
    w.line("use crate::generated::*;");
    w.blank();
    w.block(format!("pub struct {name}"), |w| {
        w.line("ctx: tether_rt::Context,");
    });
    w.blank();
    w.block(format!("impl {} for {name}", module.spec_trait()), |w| {
        w.block("fn new(ctx: tether_rt::Context) -> Self", |w| {
            w.line(format!("{name} {{ ctx }}"));
        });
        w.blank();
        w.block("fn context(&self) -> &tether_rt::Context", |w| {
            w.line("&self.ctx");
        });
        for method in &module.methods {
            w.blank();
            w.block(method_signature(method), |w| {
                w.line("unimplemented!()");
            });
        }
    });
    w.finish()
}

/// Names of the modules a crate root must declare.
pub fn required_mods(modules: &[ResolvedModule]) -> Vec<String> {
    let mut mods: Vec<String> = ["bridging", "generated", "host"].iter().map(|m| m.to_string()).collect();
    mods.extend(modules.iter().map(impl_mod));
    mods
}

fn crate_root(modules: &[ResolvedModule]) -> String {
    let mut w = CodeWriter::new();
    for name in required_mods(modules) {
        w.line(format!("pub mod {name};"));
    }
    w.blank();
    w.line("pub use host::register;");
    w.finish()
}
