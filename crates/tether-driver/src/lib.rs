//! The tether compilation pipeline.
//!
//! [`Compiler`] ties the phases together for one project: discover schema
//! files, parse, resolve, emit and persist the fingerprint. Before a native
//! build, [`Compiler::check_drift`] refuses bindings older than the schema.

pub mod compiler;
pub mod error;

pub use compiler::{Compiler, Freshness, GenerateReport};
pub use error::{DriverError, DriverResult};
