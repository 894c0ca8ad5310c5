//! Type mapping engine for the tether interface compiler.
//!
//! Takes the modules the parser produced and decides how each of them looks in
//! generated Rust: every type reference gets its canonical cross-boundary
//! representation ([`CanonicalType`]), every identifier a normalized name
//! ([`naming`]), and every scope is checked for names that would collide once
//! normalized. The result is a [`ProjectModel`], which is all the emitter
//! ever sees.

pub mod error;
pub mod mapping;
pub mod model;
pub mod naming;
mod resolver;

pub use error::{ResolveError, ResolveErrors, ResolveResult};
pub use mapping::{CanonicalType, Channel};
pub use model::*;
pub use resolver::resolve;
