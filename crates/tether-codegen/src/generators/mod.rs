//! The emitters. Each [`Generator`] turns the resolved model into artifacts;
//! [`generate`] runs them in a fixed order.

use std::path::{Path, PathBuf};

use log::debug;
use tether_resolve::naming::to_snake_case;
use tether_resolve::{ProjectModel, ResolvedModule};

use crate::artifact::Artifact;
use crate::error::CodegenResult;
use crate::fingerprint::{Fingerprint, FINGERPRINT_FILE};

mod bridging;
mod host;
mod interface;
mod skeleton;

pub use bridging::BridgingGenerator;
pub use host::HostGenerator;
pub use interface::InterfaceGenerator;
pub use skeleton::{required_mods, SkeletonGenerator};

/// Everything a generator may look at.
#[derive(Debug, Clone, Copy)]
pub struct GenContext<'a> {
    pub model: &'a ProjectModel,
    pub fingerprint: &'a Fingerprint,
    /// Implementation crate directory, relative to the project root.
    pub crate_dir: &'a Path,
    /// Tether's state directory, relative to the project root.
    pub state_dir: &'a Path,
}

impl GenContext<'_> {
    pub(crate) fn src(&self, file: &str) -> PathBuf {
        self.crate_dir.join("src").join(file)
    }

    pub(crate) fn header(&self) -> String {
        format!(
            "// @generated by tether. Do not edit; run `tether codegen` instead.\n// fingerprint: {}\n",
            self.fingerprint.project
        )
    }
}

pub trait Generator {
    fn name(&self) -> &'static str;

    fn generate(&self, ctx: &GenContext<'_>) -> CodegenResult<Vec<Artifact>>;
}

/// Writes the fingerprint the drift check compares against.
pub struct FingerprintGenerator;

impl Generator for FingerprintGenerator {
    fn name(&self) -> &'static str {
        "fingerprint"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> CodegenResult<Vec<Artifact>> {
        Ok(vec![Artifact::overwrite(ctx.state_dir.join(FINGERPRINT_FILE), ctx.fingerprint.to_toml()?)])
    }
}

pub fn generators() -> Vec<Box<dyn Generator>> {
    vec![
        Box::new(InterfaceGenerator),
        Box::new(BridgingGenerator),
        Box::new(HostGenerator),
        Box::new(SkeletonGenerator),
        Box::new(FingerprintGenerator),
    ]
}

/// Run every generator over `ctx`.
pub fn generate(ctx: &GenContext<'_>) -> CodegenResult<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    for generator in generators() {
        let produced = generator.generate(ctx)?;
        debug!("{} generator produced {} artifact(s)", generator.name(), produced.len());
        artifacts.extend(produced);
    }
    Ok(artifacts)
}

//----------------------------------------------------------------------------
// Names shared between generators
//----------------------------------------------------------------------------

fn screaming(name: &str) -> String {
    to_snake_case(name).to_uppercase()
}

pub(crate) fn record_static(name: &str) -> String {
    format!("{}_RECORD", screaming(name))
}

pub(crate) fn enum_static(name: &str) -> String {
    format!("{}_ENUM", screaming(name))
}

pub(crate) fn module_static(module: &ResolvedModule) -> String {
    format!("{}_MODULE", screaming(&module.name.rust))
}

pub(crate) fn impl_mod(module: &ResolvedModule) -> String {
    format!("{}_impl", module.snake)
}

/// Rust literal for a schema string.
pub(crate) fn literal(text: &str) -> String {
    format!("{text:?}")
}
