//! Emitter for the tether interface compiler.
//!
//! Turns a resolved [`ProjectModel`] into the files an implementation crate
//! is built from:
//!
//! * `src/generated.rs`: records, enums, notification enums and one `Spec`
//!   trait per module;
//! * `src/bridging.rs`: static interface declarations and value conversions;
//! * `src/host.rs`: argument glue, method tables and `register`;
//! * `src/<module>_impl.rs` and `src/lib.rs`: skeletons, written only when
//!   missing.
//!
//! Output is a pure function of the model. Each run also records a
//! [`Fingerprint`] of the model so stale bindings can be detected.

pub mod artifact;
pub mod error;
pub mod fingerprint;
pub mod generators;
pub mod writer;

use std::path::Path;

use tether_resolve::ProjectModel;

pub use artifact::{write_artifacts, Artifact, WriteOutcome, WritePolicy, WriteReport};
pub use error::{CodegenError, CodegenResult};
pub use fingerprint::{Drift, Fingerprint, FINGERPRINT_FILE};
pub use generators::{generate, GenContext, Generator};

/// Render every artifact for `model`. Paths are relative to the project root.
pub fn emit(model: &ProjectModel, crate_dir: &Path, state_dir: &Path) -> CodegenResult<Vec<Artifact>> {
    let fingerprint = Fingerprint::of(model)?;
    let ctx = GenContext { model, fingerprint: &fingerprint, crate_dir, state_dir };
    generate(&ctx)
}
